// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Information about the contest, such as candidates.

use serde::{Serialize,Deserialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Sub;

/// a candidate, referred to by position in the contest roster, 0 being first
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CandidateIndex(pub usize);
// type alias really, don't want long display
impl fmt::Display for CandidateIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0) }
}
// type alias really, don't want long display
impl fmt::Debug for CandidateIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Represent a number of seats. E.g. seats to fill, remaining unfilled seats.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NumberOfSeats(pub usize);

// type alias really, don't want long display
impl fmt::Display for NumberOfSeats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0) }
}
// type alias really, don't want long display
impl fmt::Debug for NumberOfSeats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#{}", self.0) }
}

impl Sub for NumberOfSeats {
    type Output = NumberOfSeats;
    fn sub(self, rhs: Self) -> Self::Output { NumberOfSeats(self.0-rhs.0) }
}

/// The reserved candidate id for the undeclared write-in sentinel.
pub const UNDECLARED_WRITE_IN_ID : &str = "UWI";

/// information about a candidate in the contest.
#[derive(Debug,Serialize,Deserialize,Clone)]
pub struct Candidate {
    /// Opaque stable identifier, unique within the contest.
    pub id : String,
    /// Human readable name.
    pub name : String,
    /// true if the candidate is barred from the count before it starts (withdrew, ruled ineligible).
    #[serde(default,skip_serializing_if = "std::ops::Not::not")]
    pub excluded : bool,
}

/// Information about the contest
#[derive(Debug,Serialize,Deserialize,Clone)]
pub struct ContestMetadata {
    pub contest_id : String,
    pub candidates : Vec<Candidate>,
    /// index of the undeclared write-in sentinel, if the contest carries one.
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub undeclared_write_in : Option<CandidateIndex>,
}

impl ContestMetadata {
    /// Make metadata from a candidate roster. If a candidate uses the reserved
    /// [UNDECLARED_WRITE_IN_ID] id, it is taken as the write-in sentinel.
    pub fn new(contest_id:String,candidates:Vec<Candidate>) -> Self {
        let undeclared_write_in = candidates.iter().position(|c|c.id==UNDECLARED_WRITE_IN_ID).map(CandidateIndex);
        ContestMetadata{contest_id,candidates,undeclared_write_in}
    }

    /// Append the undeclared write-in sentinel to the roster, if not already present.
    pub fn with_undeclared_write_in(mut self) -> Self {
        if self.undeclared_write_in.is_none() {
            self.undeclared_write_in = Some(CandidateIndex(self.candidates.len()));
            self.candidates.push(Candidate{
                id: UNDECLARED_WRITE_IN_ID.to_string(),
                name: "Undeclared write-ins".to_string(),
                excluded: false,
            });
        }
        self
    }

    pub fn candidate(&self,index:CandidateIndex) -> &Candidate { &self.candidates[index.0] }
    pub fn num_candidates(&self) -> usize { self.candidates.len() }

    pub fn is_undeclared_write_in(&self,index:CandidateIndex) -> bool {
        self.undeclared_write_in==Some(index)
    }

    /// Get a hashmap going from candidate id to index
    pub fn get_candidate_id_lookup(&self) -> HashMap<String,CandidateIndex> {
        let mut res = HashMap::default();
        for i in 0..self.candidates.len() {
            res.insert(self.candidates[i].id.clone(),CandidateIndex(i));
        }
        res
    }

    /// An iterator over all the candidate indices starting at 0.
    pub fn candidate_indices(&self) -> impl Iterator<Item=CandidateIndex> { (0..self.candidates.len()).map(CandidateIndex) }

    /// All candidate indices, sorted lexicographically by candidate id.
    /// This is the canonical ordering when no permutation is configured.
    pub fn lexicographic_order(&self) -> Vec<CandidateIndex> {
        let mut res : Vec<CandidateIndex> = self.candidate_indices().collect();
        res.sort_by(|a,b|self.candidate(*a).id.cmp(&self.candidate(*b).id));
        res
    }

    /// Candidates that start the count excluded.
    pub fn excluded_candidates(&self) -> Vec<CandidateIndex> {
        self.candidate_indices().filter(|&c|self.candidate(c).excluded).collect()
    }

    pub fn candidate_list_to_string(&self,list : &[CandidateIndex]) -> String {
        list.iter().map(|&c|self.candidate(c).name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use crate::contest_metadata::{Candidate, CandidateIndex, ContestMetadata};

    fn candidate(id:&str) -> Candidate { Candidate{id:id.to_string(),name:id.to_string(),excluded:false} }

    #[test]
    fn lexicographic_order_ignores_roster_order() {
        let metadata = ContestMetadata::new("c".to_string(),vec![candidate("Charlie"),candidate("Alice"),candidate("Bob")]);
        assert_eq!(vec![CandidateIndex(1),CandidateIndex(2),CandidateIndex(0)],metadata.lexicographic_order());
    }

    #[test]
    fn write_in_sentinel_appended_once() {
        let metadata = ContestMetadata::new("c".to_string(),vec![candidate("Alice")]).with_undeclared_write_in().with_undeclared_write_in();
        assert_eq!(2,metadata.num_candidates());
        assert_eq!(Some(CandidateIndex(1)),metadata.undeclared_write_in);
        assert!(metadata.is_undeclared_write_in(CandidateIndex(1)));
    }
}
