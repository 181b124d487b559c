// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The winning threshold. Computed once from the first-round active votes.

use num::{BigInt, BigRational, One};
use crate::config::TabulationConfig;
use crate::contest_metadata::NumberOfSeats;
use crate::transfer_weight::round_to_places;

/// The vote level a candidate must reach to be elected, together with whether
/// reaching it exactly is enough.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct WinningThreshold {
    pub value : BigRational,
    /// true if election needs tally > value, false if tally >= value suffices.
    pub strict : bool,
}

impl WinningThreshold {
    /// Compute the threshold from the total active (non-exhausted) first round
    /// votes.
    ///
    /// * Hare: V/W, met inclusively.
    /// * Droop, integral (the default): floor(V/(W+1))+1 with V first rounded to
    ///   the configured decimal places, met inclusively.
    /// * Droop, fractional: V/(W+1) exactly, met strictly.
    pub fn compute(active_votes:&BigRational,seats:NumberOfSeats,config:&TabulationConfig) -> Self {
        let seats = BigInt::from(seats.0);
        if config.hare_quota {
            WinningThreshold{ value: active_votes/BigRational::from_integer(seats), strict: false }
        } else if config.non_integer_winning_threshold {
            WinningThreshold{ value: active_votes/BigRational::from_integer(seats+BigInt::one()), strict: true }
        } else {
            let rounded = round_to_places(active_votes,config.decimal_places_for_vote_arithmetic,config.round_tallies_half_to_even);
            let quota = (rounded/BigRational::from_integer(seats+BigInt::one())).floor()+BigRational::one();
            WinningThreshold{ value: quota, strict: false }
        }
    }

    /// true iff a tally at this level wins a seat.
    pub fn reached(&self,tally:&BigRational) -> bool {
        if self.strict { tally>&self.value } else { tally>=&self.value }
    }
}
