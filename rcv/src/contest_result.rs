// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The audit record of a count: what happened in every round, and how it
//! ended. Rendering to summary or interchange formats happens elsewhere; this
//! is the complete in-memory account.

use serde::{Serialize,Deserialize};
use crate::contest_metadata::{CandidateIndex, ContestMetadata};
use crate::errors::BallotError;
use crate::tie_resolution::TieBreakDecision;
use crate::transfer_weight::{TransferWeight, VoteTally};

/// Why votes moved off a candidate.
#[derive(Clone,Debug,Serialize,Deserialize,PartialEq)]
pub enum TransferKind {
    /// An elected candidate's votes above the threshold moved on at this fraction.
    Surplus { fraction : TransferWeight },
    /// An eliminated candidate's votes moved on at full weight.
    Elimination,
}

/// Where one candidate's outgoing votes went.
#[derive(Clone,Debug,Serialize,Deserialize,PartialEq)]
pub struct TransferRecord {
    pub from : CandidateIndex,
    pub kind : TransferKind,
    /// Destination candidates and the votes they received, canonical order.
    pub to : Vec<(CandidateIndex,VoteTally)>,
    /// Votes that found no further continuing candidate.
    pub exhausted : VoteTally,
}

/// Everything that happened in one round.
#[derive(Clone,Debug,Serialize,Deserialize,PartialEq)]
pub struct RoundOutcome {
    /// 1 is the first round.
    pub round : usize,
    /// Tally per candidate in roster order, rounded to the configured decimal places.
    pub tally : Vec<VoteTally>,
    pub exhausted : VoteTally,
    pub overvote : VoteTally,
    pub skipped : VoteTally,
    /// Absent when the mode does not use a threshold.
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub threshold : Option<VoteTally>,
    /// Candidates elected this round, in election order.
    pub elected : Vec<CandidateIndex>,
    /// Candidates eliminated this round, lowest tally first.
    pub eliminated : Vec<CandidateIndex>,
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub transfers : Vec<TransferRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub tie_breaks : Vec<TieBreakDecision>,
}

/// How the count ended.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum Termination {
    /// Every seat was filled by candidates reaching the threshold.
    AllSeatsFilled,
    /// One candidate was left standing and took the seat.
    LastCandidateStanding,
    /// The field was run down to two and the leader took the seat.
    TwoCandidatesRemaining,
    /// As many candidates remained as unfilled seats, so all were elected.
    AllRemainingElected,
    /// The tie-break oracle declined to choose; the record stops at that round.
    Cancelled,
}

/// The complete result of tabulating one contest.
#[derive(Clone,Debug,Serialize,Deserialize,PartialEq)]
pub struct ContestResult {
    pub contest_id : String,
    pub rounds : Vec<RoundOutcome>,
    /// Winners in the order they were elected.
    pub elected_in_order : Vec<CandidateIndex>,
    /// Every tie resolved anywhere in the count, in order.
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub tie_break_log : Vec<TieBreakDecision>,
    /// The tallies at the end of the count, per candidate in roster order.
    pub final_tallies : Vec<VoteTally>,
    pub termination : Termination,
    /// Cast vote records dropped during normalization.
    #[serde(default)]
    pub malformed_ballots : usize,
    /// The first of those, up to the configured cap.
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub ballot_errors : Vec<BallotError>,
    /// Stamped by the caller; the engine itself is a pure function.
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub generated_at : Option<String>,
}

/// A result bundled with the contest it belongs to, the convenient unit to
/// write to disk.
#[derive(Clone,Debug,Serialize,Deserialize)]
pub struct ContestReport {
    pub metadata : ContestMetadata,
    pub result : ContestResult,
}

impl ContestReport {
    pub fn save(&self,path:&std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file,self)?;
        Ok(())
    }

    pub fn load(path:&std::path::Path) -> std::io::Result<ContestReport> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
