// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Progress reporting. The engine owns no logger; it narrates the count
//! through a passed-in observer and rendering is the caller's business.

use crate::contest_metadata::CandidateIndex;
use crate::round_tally::RoundTally;
use crate::tie_resolution::TieBreakDecision;
use crate::transfer_weight::TransferWeight;
use crate::winning_threshold::WinningThreshold;

/// One step of the count, in the order the engine performs them.
#[derive(Debug)]
pub enum TabulationEvent<'a> {
    RoundBegun { round : usize },
    TallyComputed { round : usize, tally : &'a RoundTally },
    ThresholdComputed { threshold : &'a WinningThreshold },
    CandidateElected { round : usize, candidate : CandidateIndex },
    CandidatesEliminated { round : usize, candidates : &'a [CandidateIndex] },
    SurplusTransferred { round : usize, candidate : CandidateIndex, fraction : &'a TransferWeight },
    TieBroken { decision : &'a TieBreakDecision },
    TabulationFinished { rounds : usize, elected : &'a [CandidateIndex] },
}

pub trait TabulationObserver {
    fn handle(&mut self,event:TabulationEvent<'_>);
}

/// Discards every event.
pub struct NoopObserver;

impl TabulationObserver for NoopObserver {
    fn handle(&mut self,_event:TabulationEvent<'_>) {}
}
