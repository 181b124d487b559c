// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Per-round tallies and their inverted, ordered view. Both are rebuilt every
//! round and never mutated in place; the inverted view is what winner and
//! loser selection iterate, so its ordering is canonical rather than whatever
//! a hash map would produce.

use num::{BigRational, Zero};
use std::collections::BTreeMap;
use crate::contest_metadata::CandidateIndex;

/// A snapshot of where every vote sits at a round boundary. Candidate entries
/// are exact; the three buckets hold votes no candidate can receive, split by
/// why the ballot stopped.
#[derive(Clone,Debug,PartialEq)]
pub struct RoundTally {
    /// One entry per candidate in roster order; only continuing candidates
    /// accumulate, elected candidates stay pinned at the threshold.
    pub by_candidate : Vec<BigRational>,
    pub exhausted : BigRational,
    pub overvote : BigRational,
    pub skipped : BigRational,
}

impl RoundTally {
    pub fn tally(&self,candidate:CandidateIndex) -> &BigRational { &self.by_candidate[candidate.0] }

    /// Everything, candidates and buckets. Conserved across rounds.
    pub fn total(&self) -> BigRational {
        self.by_candidate.iter().sum::<BigRational>()+&self.exhausted+&self.overvote+&self.skipped
    }
}

/// The inverted view of a round tally: tally value to the candidates holding
/// it. Candidates are inserted in canonical order, so equal-tally groups come
/// out in a deterministic order ready to hand to tie resolution.
pub struct TallyIndex {
    by_tally : BTreeMap<BigRational,Vec<CandidateIndex>>,
}

impl TallyIndex {
    /// Build from the tallies of the given candidates, which must be supplied
    /// in canonical order.
    pub fn build(tallies:&[BigRational],candidates_in_canonical_order:&[CandidateIndex]) -> Self {
        let mut by_tally : BTreeMap<BigRational,Vec<CandidateIndex>> = BTreeMap::new();
        for &candidate in candidates_in_canonical_order {
            by_tally.entry(tallies[candidate.0].clone()).or_default().push(candidate);
        }
        TallyIndex{by_tally}
    }

    /// Tally groups from lowest to highest, for loser selection.
    pub fn ascending(&self) -> impl Iterator<Item=(&BigRational,&[CandidateIndex])> {
        self.by_tally.iter().map(|(tally,candidates)|(tally,candidates.as_slice()))
    }

    /// Tally groups from highest to lowest, for winner selection.
    pub fn descending(&self) -> impl Iterator<Item=(&BigRational,&[CandidateIndex])> {
        self.by_tally.iter().rev().map(|(tally,candidates)|(tally,candidates.as_slice()))
    }

    /// The candidates on the lowest tally, with that tally.
    pub fn lowest(&self) -> Option<(&BigRational,&[CandidateIndex])> {
        self.by_tally.iter().next().map(|(tally,candidates)|(tally,candidates.as_slice()))
    }

    /// All candidates in ascending tally order, canonical order within a tie.
    pub fn candidates_ascending(&self) -> Vec<CandidateIndex> {
        self.by_tally.values().flatten().copied().collect()
    }
}

impl Default for RoundTally {
    fn default() -> Self {
        RoundTally{
            by_candidate: vec![],
            exhausted: BigRational::zero(),
            overvote: BigRational::zero(),
            skipped: BigRational::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::contest_metadata::CandidateIndex;
    use crate::round_tally::TallyIndex;
    use num::{BigInt, BigRational};

    fn votes(n:i64) -> BigRational { BigRational::from_integer(BigInt::from(n)) }

    #[test]
    fn index_orders_groups_by_tally_and_ties_canonically() {
        let tallies = vec![votes(5),votes(2),votes(5),votes(1)];
        // canonical order deliberately not roster order
        let canonical = vec![CandidateIndex(2),CandidateIndex(0),CandidateIndex(1),CandidateIndex(3)];
        let index = TallyIndex::build(&tallies,&canonical);
        let ascending : Vec<_> = index.ascending().map(|(tally,candidates)|(tally.clone(),candidates.to_vec())).collect();
        assert_eq!(3,ascending.len());
        assert_eq!((votes(1),vec![CandidateIndex(3)]),ascending[0]);
        assert_eq!((votes(2),vec![CandidateIndex(1)]),ascending[1]);
        // within the tie, canonical order puts 2 before 0
        assert_eq!((votes(5),vec![CandidateIndex(2),CandidateIndex(0)]),ascending[2]);
        assert_eq!(Some((&votes(1),&[CandidateIndex(3)][..])),index.lowest());
        assert_eq!(vec![CandidateIndex(3),CandidateIndex(1),CandidateIndex(2),CandidateIndex(0)],index.candidates_ascending());
        let descending : Vec<_> = index.descending().map(|(tally,_)|tally.clone()).collect();
        assert_eq!(vec![votes(5),votes(2),votes(1)],descending);
    }
}
