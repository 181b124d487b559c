// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The errors the tabulation engine can produce. Round-level errors abort the
//! count; per-ballot errors are accumulated and carried in the result.

use serde::{Serialize,Deserialize};
use crate::contest_metadata::CandidateIndex;

/// A fatal, count-aborting error. Everything here is a named variant on the
/// return path; the engine does not use panics for control flow.
#[derive(thiserror::Error,Debug)]
pub enum TabulationError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A tie survived the whole resolution chain with no usable fallback.
    #[error("tie between candidates {tied:?} in round {round} could not be resolved")]
    TieUnresolvable { round : usize, tied : Vec<CandidateIndex> },
    /// The sum-of-weights conservation check failed at a round boundary.
    #[error("vote conservation violated in round {round}: counted {actual}, should be {expected}")]
    InvariantViolation { round : usize, expected : String, actual : String },
    /// The round counter exceeded the number of candidates + 1.
    #[error("round limit of {limit} rounds exceeded; the count is not converging")]
    RoundLimitExceeded { limit : usize },
    /// Malformed ballots were present and the configuration rejects them.
    #[error("{count} malformed ballots rejected")]
    MalformedBallots { count : usize },
}

/// A problem with a single cast vote record, detected during normalization.
#[derive(thiserror::Error,Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub enum BallotError {
    #[error("ballot {ballot_id}: candidate {candidate} is not in the contest")]
    UnknownCandidate { ballot_id : String, candidate : String },
    #[error("ballot {ballot_id}: {rank} is not a valid ranking position")]
    InvalidRank { ballot_id : String, rank : u32 },
}

impl BallotError {
    pub fn ballot_id(&self) -> &str {
        match self {
            BallotError::UnknownCandidate { ballot_id, .. } => ballot_id,
            BallotError::InvalidRank { ballot_id, .. } => ballot_id,
        }
    }
}
