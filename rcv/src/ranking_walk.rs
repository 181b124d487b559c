// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The ranking walk: given a ballot's rank map and the current candidate
//! statuses, find the candidate the ballot currently supports, applying the
//! configured overvote, skipped-rank and duplicate rules along the way.

use serde::{Serialize,Deserialize};
use crate::cast_vote_record::Ballot;
use crate::config::{DuplicateCandidateRule, OvervoteRule, SkippedRankRule, TabulationConfig};
use crate::contest_metadata::CandidateIndex;
use crate::tabulation::CandidateStatus;

/// Why a ballot stopped supporting anyone. The distinction feeds the separate
/// exhausted / overvote / skipped buckets of the round record.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Hash,Serialize,Deserialize)]
pub enum ExhaustionKind {
    Overvote,
    SkippedRankings,
    DuplicateRanking,
    NoMoreRankings,
}

/// The effective current assignment of a ballot.
#[derive(Copy,Clone,Debug,Eq,PartialEq)]
pub enum Assignment {
    /// The ballot supports this continuing candidate, marked at this rank.
    Candidate { candidate : CandidateIndex, rank : u32 },
    Exhausted(ExhaustionKind),
}

// What looking at a single rank position told us.
enum RankStep {
    Advance,
    Exhaust(ExhaustionKind),
    Consider(CandidateIndex),
}

/// Walk the ballot from rank 1 upwards and return its effective assignment.
/// The walk restarts from the top on every call so that rules which depend on
/// current statuses (such as [OvervoteRule::ExhaustIfMultipleContinuing]) see
/// the state as of this round, not the state when the ballot last moved.
pub fn effective_assignment(ballot:&Ballot,statuses:&[CandidateStatus],config:&TabulationConfig) -> Assignment {
    let limit = match config.max_rankings_allowed {
        Some(max) => ballot.last_rank().min(max),
        None => ballot.last_rank(),
    };
    let mut consecutive_skipped = 0;
    for rank in 1..=limit {
        let step = match ballot.candidates_at(rank) {
            None => {
                match config.skipped_rank_rule {
                    SkippedRankRule::ExhaustOnSkippedRank => RankStep::Exhaust(ExhaustionKind::SkippedRankings),
                    SkippedRankRule::ExhaustOnTwoConsecutive => {
                        consecutive_skipped+=1;
                        if consecutive_skipped>=2 { RankStep::Exhaust(ExhaustionKind::SkippedRankings) } else { RankStep::Advance }
                    }
                    SkippedRankRule::Ignore => RankStep::Advance,
                }
            }
            Some(marks) => {
                consecutive_skipped = 0;
                if marks.len()>1 {
                    match config.overvote_rule {
                        OvervoteRule::ExhaustImmediately => RankStep::Exhaust(ExhaustionKind::Overvote),
                        OvervoteRule::AlwaysSkipToNextRank => RankStep::Advance,
                        OvervoteRule::ExhaustIfMultipleContinuing => {
                            let mut continuing = marks.iter().filter(|c|statuses[c.0].is_continuing());
                            match (continuing.next(),continuing.next()) {
                                (Some(_),Some(_)) => RankStep::Exhaust(ExhaustionKind::Overvote),
                                (Some(&only),None) => RankStep::Consider(only),
                                (None,_) => RankStep::Advance,
                            }
                        }
                    }
                } else { RankStep::Consider(marks[0]) }
            }
        };
        match step {
            RankStep::Advance => {}
            RankStep::Exhaust(kind) => return Assignment::Exhausted(kind),
            RankStep::Consider(candidate) => {
                if ballot.ranked_before(candidate,rank) {
                    match config.duplicate_candidate_rule {
                        DuplicateCandidateRule::Exhaust => return Assignment::Exhausted(ExhaustionKind::DuplicateRanking),
                        DuplicateCandidateRule::SkipToNext => continue,
                        DuplicateCandidateRule::Ignore => {} // a repeat is treated like any other mark
                    }
                }
                if statuses[candidate.0].is_continuing() {
                    return Assignment::Candidate{candidate,rank};
                }
                // elected, eliminated or excluded: this mark is used up.
            }
        }
    }
    Assignment::Exhausted(ExhaustionKind::NoMoreRankings)
}

#[cfg(test)]
mod tests {
    use crate::cast_vote_record::Ballot;
    use crate::config::{DuplicateCandidateRule, OvervoteRule, SkippedRankRule, TabulationConfig};
    use crate::contest_metadata::CandidateIndex;
    use crate::ranking_walk::{effective_assignment, Assignment, ExhaustionKind};
    use crate::tabulation::CandidateStatus;

    const A : CandidateIndex = CandidateIndex(0);
    const B : CandidateIndex = CandidateIndex(1);
    const C : CandidateIndex = CandidateIndex(2);

    fn ballot(marks:&[(u32,CandidateIndex)]) -> Ballot {
        Ballot::new("b".to_string(),None,marks.to_vec())
    }

    fn all_continuing() -> Vec<CandidateStatus> { vec![CandidateStatus::Continuing;3] }

    fn assigned(candidate:CandidateIndex,rank:u32) -> Assignment { Assignment::Candidate{candidate,rank} }

    #[test]
    fn overvote_rules() {
        // ranks: 1:{A,B}, 2:C
        let ballot = ballot(&[(1,A),(1,B),(2,C)]);
        let mut config = TabulationConfig::default();
        config.overvote_rule = OvervoteRule::ExhaustImmediately;
        assert_eq!(Assignment::Exhausted(ExhaustionKind::Overvote),effective_assignment(&ballot,&all_continuing(),&config));
        config.overvote_rule = OvervoteRule::AlwaysSkipToNextRank;
        assert_eq!(assigned(C,2),effective_assignment(&ballot,&all_continuing(),&config));
        config.overvote_rule = OvervoteRule::ExhaustIfMultipleContinuing;
        assert_eq!(Assignment::Exhausted(ExhaustionKind::Overvote),effective_assignment(&ballot,&all_continuing(),&config));
        let mut statuses = all_continuing();
        statuses[A.0] = CandidateStatus::Eliminated{round:1,order:0};
        assert_eq!(assigned(B,1),effective_assignment(&ballot,&statuses,&config));
        statuses[B.0] = CandidateStatus::Eliminated{round:1,order:1};
        assert_eq!(assigned(C,2),effective_assignment(&ballot,&statuses,&config));
    }

    #[test]
    fn skipped_rank_rules() {
        // ranks: 1:A, 4:B with positions 2 and 3 blank
        let two_gaps = ballot(&[(1,A),(4,B)]);
        let one_gap = ballot(&[(1,A),(3,B)]);
        let mut statuses = all_continuing();
        statuses[A.0] = CandidateStatus::Eliminated{round:1,order:0};
        let mut config = TabulationConfig::default();
        config.skipped_rank_rule = SkippedRankRule::Ignore;
        assert_eq!(assigned(B,4),effective_assignment(&two_gaps,&statuses,&config));
        config.skipped_rank_rule = SkippedRankRule::ExhaustOnTwoConsecutive;
        assert_eq!(Assignment::Exhausted(ExhaustionKind::SkippedRankings),effective_assignment(&two_gaps,&statuses,&config));
        // a single blank position does not trip the two-consecutive rule
        assert_eq!(assigned(B,3),effective_assignment(&one_gap,&statuses,&config));
        config.skipped_rank_rule = SkippedRankRule::ExhaustOnSkippedRank;
        assert_eq!(Assignment::Exhausted(ExhaustionKind::SkippedRankings),effective_assignment(&two_gaps,&statuses,&config));
        assert_eq!(Assignment::Exhausted(ExhaustionKind::SkippedRankings),effective_assignment(&one_gap,&statuses,&config));
    }

    #[test]
    fn duplicate_rules() {
        // ranks: 1:A, 2:A, 3:B
        let ballot = ballot(&[(1,A),(2,A),(3,B)]);
        let mut statuses = all_continuing();
        statuses[A.0] = CandidateStatus::Eliminated{round:1,order:0};
        let mut config = TabulationConfig::default();
        config.duplicate_candidate_rule = DuplicateCandidateRule::SkipToNext;
        assert_eq!(assigned(B,3),effective_assignment(&ballot,&statuses,&config));
        config.duplicate_candidate_rule = DuplicateCandidateRule::Exhaust;
        assert_eq!(Assignment::Exhausted(ExhaustionKind::DuplicateRanking),effective_assignment(&ballot,&statuses,&config));
        config.duplicate_candidate_rule = DuplicateCandidateRule::Ignore;
        assert_eq!(assigned(B,3),effective_assignment(&ballot,&statuses,&config));
    }

    #[test]
    fn rankings_past_the_allowed_maximum_are_not_considered() {
        let ballot = ballot(&[(1,A),(2,B),(3,C)]);
        let mut statuses = all_continuing();
        statuses[A.0] = CandidateStatus::Eliminated{round:1,order:0};
        statuses[B.0] = CandidateStatus::Eliminated{round:2,order:0};
        let mut config = TabulationConfig::default();
        assert_eq!(assigned(C,3),effective_assignment(&ballot,&statuses,&config));
        config.max_rankings_allowed = Some(2);
        assert_eq!(Assignment::Exhausted(ExhaustionKind::NoMoreRankings),effective_assignment(&ballot,&statuses,&config));
    }

    #[test]
    fn used_marks_are_walked_past() {
        let ballot = ballot(&[(1,A),(2,B),(3,C)]);
        let mut statuses = all_continuing();
        statuses[A.0] = CandidateStatus::Elected{round:1,order:0};
        assert_eq!(assigned(B,2),effective_assignment(&ballot,&statuses,&TabulationConfig::default()));
        statuses[B.0] = CandidateStatus::Excluded;
        assert_eq!(assigned(C,3),effective_assignment(&ballot,&statuses,&TabulationConfig::default()));
    }
}
