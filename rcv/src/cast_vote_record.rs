// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Information about a single ranked ballot (cast vote record), both the raw
//! form produced by upstream converters and the normalized form the engine
//! consumes.

use serde::{Serialize,Deserialize};
use crate::contest_metadata::{CandidateIndex, ContestMetadata};
use crate::config::TabulationConfig;
use crate::errors::BallotError;

/// The set of candidates marked at one rank position. More than one candidate
/// at the same rank is an overvote.
#[derive(Clone,Debug,Serialize,Deserialize,PartialEq,Eq)]
pub struct RankedSet {
    /// 1 is the most preferred rank. Ranks need not be contiguous on a ballot.
    pub rank : u32,
    pub candidates : Vec<CandidateIndex>,
}

/// A normalized ballot. Immutable for the life of a tabulation; all mutable
/// per-run state lives in the tabulator's parallel ballot-state array.
#[derive(Clone,Debug,Serialize,Deserialize)]
pub struct Ballot {
    /// Stable identifier, used in audit output and error reports.
    pub id : String,
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub precinct : Option<String>,
    /// Rank sets in strictly ascending rank order.
    pub rankings : Vec<RankedSet>,
}

impl Ballot {
    /// Build a ballot from (rank, candidate) marks in any order. Marks sharing
    /// a rank are folded into one overvote set; repeated identical marks collapse.
    pub fn new(id:String,precinct:Option<String>,marks:Vec<(u32,CandidateIndex)>) -> Self {
        let mut rankings : Vec<RankedSet> = Vec::new();
        let mut sorted = marks;
        sorted.sort_by_key(|(rank,candidate)|(*rank,candidate.0));
        for (rank,candidate) in sorted {
            match rankings.last_mut() {
                Some(set) if set.rank==rank => {
                    if !set.candidates.contains(&candidate) { set.candidates.push(candidate); }
                }
                _ => rankings.push(RankedSet{rank,candidates:vec![candidate]}),
            }
        }
        Ballot{id,precinct,rankings}
    }

    /// The candidates marked at a given rank, if any.
    pub fn candidates_at(&self,rank:u32) -> Option<&[CandidateIndex]> {
        self.rankings.iter().find(|set|set.rank==rank).map(|set|set.candidates.as_slice())
    }

    /// The highest rank position marked on this ballot, 0 if none.
    pub fn last_rank(&self) -> u32 {
        self.rankings.last().map(|set|set.rank).unwrap_or(0)
    }

    /// true iff the candidate is marked at some rank strictly before the given one.
    pub fn ranked_before(&self,candidate:CandidateIndex,rank:u32) -> bool {
        self.rankings.iter().take_while(|set|set.rank<rank).any(|set|set.candidates.contains(&candidate))
    }
}

/// One (rank, candidate id) mark on a raw cast vote record. An empty candidate
/// id is a blank mark at that rank.
#[derive(Clone,Debug,Serialize,Deserialize)]
pub struct RawRankEntry {
    pub rank : u32,
    pub candidate : String,
}

/// A cast vote record as produced by an upstream format converter: string ids,
/// marks in arbitrary order, duplicate ranks encoding overvotes.
#[derive(Clone,Debug,Serialize,Deserialize)]
pub struct RawCastVoteRecord {
    pub id : String,
    pub contest_id : String,
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub precinct : Option<String>,
    pub rankings : Vec<RawRankEntry>,
}

/// Resolve raw records against the contest roster. Unknown candidate ids are
/// undeclared write-ins when the contest carries the sentinel, otherwise the
/// ballot is reported as malformed and dropped. Blank marks map to the
/// sentinel only when the configuration asks for it.
pub fn normalize_ballots(raw:&[RawCastVoteRecord],metadata:&ContestMetadata,config:&TabulationConfig) -> (Vec<Ballot>,Vec<BallotError>) {
    let lookup = metadata.get_candidate_id_lookup();
    let mut ballots : Vec<Ballot> = Vec::with_capacity(raw.len());
    let mut errors : Vec<BallotError> = Vec::new();
    for record in raw {
        let mut marks : Vec<(u32,CandidateIndex)> = Vec::with_capacity(record.rankings.len());
        let mut bad : Option<BallotError> = None;
        for entry in &record.rankings {
            if entry.rank==0 {
                bad = Some(BallotError::InvalidRank{ballot_id:record.id.clone(),rank:entry.rank});
                break;
            }
            if entry.candidate.is_empty() {
                if config.treat_blank_as_undeclared_write_in {
                    if let Some(uwi) = metadata.undeclared_write_in { marks.push((entry.rank,uwi)); }
                }
                // an unmapped blank is simply an unmarked rank
                continue;
            }
            match lookup.get(&entry.candidate) {
                Some(&candidate) => marks.push((entry.rank,candidate)),
                None => {
                    if let Some(uwi) = metadata.undeclared_write_in { marks.push((entry.rank,uwi)); }
                    else {
                        bad = Some(BallotError::UnknownCandidate{ballot_id:record.id.clone(),candidate:entry.candidate.clone()});
                        break;
                    }
                }
            }
        }
        match bad {
            Some(error) => { if errors.len()<config.ballot_error_log_cap { errors.push(error); } }
            None => ballots.push(Ballot::new(record.id.clone(),record.precinct.clone(),marks)),
        }
    }
    (ballots,errors)
}

#[cfg(test)]
mod tests {
    use crate::cast_vote_record::{normalize_ballots, Ballot, RawCastVoteRecord, RawRankEntry};
    use crate::config::TabulationConfig;
    use crate::contest_metadata::{Candidate, CandidateIndex, ContestMetadata};
    use crate::errors::BallotError;

    fn metadata(ids:&[&str]) -> ContestMetadata {
        ContestMetadata::new("contest".to_string(),ids.iter().map(|id|Candidate{id:id.to_string(),name:id.to_string(),excluded:false}).collect())
    }

    fn raw(id:&str,marks:&[(u32,&str)]) -> RawCastVoteRecord {
        RawCastVoteRecord{
            id: id.to_string(),
            contest_id: "contest".to_string(),
            precinct: None,
            rankings: marks.iter().map(|(rank,candidate)|RawRankEntry{rank:*rank,candidate:candidate.to_string()}).collect(),
        }
    }

    #[test]
    fn duplicate_ranks_fold_into_an_overvote_set() {
        let ballot = Ballot::new("b1".to_string(),None,vec![(2,CandidateIndex(2)),(1,CandidateIndex(0)),(1,CandidateIndex(1)),(1,CandidateIndex(0))]);
        assert_eq!(Some(&[CandidateIndex(0),CandidateIndex(1)][..]),ballot.candidates_at(1));
        assert_eq!(Some(&[CandidateIndex(2)][..]),ballot.candidates_at(2));
        assert_eq!(2,ballot.last_rank());
        assert!(ballot.ranked_before(CandidateIndex(1),2));
        assert!(!ballot.ranked_before(CandidateIndex(2),2));
    }

    #[test]
    fn unknown_candidate_is_malformed_without_the_sentinel() {
        let metadata = metadata(&["A","B"]);
        let config = TabulationConfig::default();
        let (ballots,errors) = normalize_ballots(&[raw("b1",&[(1,"A"),(2,"Zorro")])],&metadata,&config);
        assert!(ballots.is_empty());
        assert_eq!(vec![BallotError::UnknownCandidate{ballot_id:"b1".to_string(),candidate:"Zorro".to_string()}],errors);
    }

    #[test]
    fn unknown_candidate_becomes_a_write_in_with_the_sentinel() {
        let metadata = metadata(&["A","B"]).with_undeclared_write_in();
        let config = TabulationConfig::default();
        let (ballots,errors) = normalize_ballots(&[raw("b1",&[(1,"A"),(2,"Zorro")])],&metadata,&config);
        assert!(errors.is_empty());
        assert_eq!(Some(&[CandidateIndex(2)][..]),ballots[0].candidates_at(2));
    }

    #[test]
    fn rank_zero_is_malformed() {
        let metadata = metadata(&["A"]);
        let config = TabulationConfig::default();
        let (ballots,errors) = normalize_ballots(&[raw("b1",&[(0,"A")])],&metadata,&config);
        assert!(ballots.is_empty());
        assert_eq!(1,errors.len());
    }
}
