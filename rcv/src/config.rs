// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The knobs that select which member of the RCV rule family is being counted.
//! Unlike jurisdiction-specific codebases that hardcode one statute, every
//! rule variation here is data, validated once before the count starts.

use serde::{Serialize,Deserialize};
use anyhow::anyhow;
use crate::contest_metadata::{CandidateIndex, ContestMetadata, NumberOfSeats};

/// The overall shape of the count.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum TabulationMode {
    /// Classic IRV: eliminate until someone holds a majority of continuing votes.
    SingleWinnerIrv,
    /// Multi-seat STV with fractional surplus transfers against a quota.
    MultiSeatStv,
    /// Eliminate from the bottom until as many candidates remain as seats; no quota.
    BottomsUpMultiSeat,
    /// Fill the seats with successive independent IRV passes, each excluding prior winners.
    SequentialMultiSeat,
    /// Single-winner variant that ignores the threshold and runs the field down to two.
    ContinueUntilTwoRemain,
}

/// What to do when a rank position holds more than one mark.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum OvervoteRule {
    ExhaustImmediately,
    AlwaysSkipToNextRank,
    /// Exhaust only if two or more of the marked candidates are still continuing;
    /// a single continuing candidate among the marks is taken as the vote.
    ExhaustIfMultipleContinuing,
}

/// What to do when a rank position holds no mark.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum SkippedRankRule {
    ExhaustOnTwoConsecutive,
    ExhaustOnSkippedRank,
    Ignore,
}

/// What to do when a ballot ranks the same candidate at more than one position.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum DuplicateCandidateRule {
    Exhaust,
    SkipToNext,
    Ignore,
}

/// How ties for winner or loser selection are resolved. See the tie_resolution module.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum TieBreakMode {
    /// Defer to the operator through the [crate::tie_resolution::TieBreakOracle].
    Interactive,
    /// Deterministic seeded draw among the tied candidates.
    Random,
    /// Use the configured candidate permutation.
    UsePermutation,
    /// Like UsePermutation, but the permutation is derived from the seed at start-up.
    GeneratePermutation,
    /// Prior-round tallies first, falling back to a seeded draw.
    PreviousRoundCountsThenRandom,
    /// Prior-round tallies first, falling back to the operator.
    PreviousRoundCountsThenInteractive,
}

/// Recognized tabulation options and their effects. Field meanings follow the
/// configuration table of the engine documentation; `validate` rejects
/// incoherent combinations before any ballot is touched.
#[derive(Clone,Debug,Serialize,Deserialize)]
pub struct TabulationConfig {
    pub number_of_winners : NumberOfSeats,
    pub tabulation_mode : TabulationMode,
    /// Use the Hare quota (V/W) instead of Droop.
    #[serde(default)]
    pub hare_quota : bool,
    /// Allow a fractional winning threshold; switches the Droop comparison to strict.
    #[serde(default)]
    pub non_integer_winning_threshold : bool,
    /// Decimal places reported tallies are rounded to. 0 to 20.
    #[serde(default = "default_decimal_places")]
    pub decimal_places_for_vote_arithmetic : u32,
    /// Round reported tallies half to even instead of half up.
    #[serde(default)]
    pub round_tallies_half_to_even : bool,
    /// Enable batch elimination of a prefix of candidates whose combined tally
    /// cannot catch the next candidate.
    #[serde(default = "default_true")]
    pub batch_elimination : bool,
    /// Convenience flag for the single-winner run-down-to-two variant; must
    /// agree with the tabulation mode.
    #[serde(default)]
    pub continue_until_two_remain : bool,
    /// Candidates strictly below this many first-round votes are eliminated together
    /// before any other first-round elimination. 0 disables the floor.
    #[serde(default)]
    pub minimum_vote_threshold : u64,
    pub overvote_rule : OvervoteRule,
    pub skipped_rank_rule : SkippedRankRule,
    pub duplicate_candidate_rule : DuplicateCandidateRule,
    pub tie_break_mode : TieBreakMode,
    /// Seed for every seeded tie-break decision. Identical seeds reproduce identical counts.
    #[serde(default)]
    pub random_seed : u64,
    /// Candidate ids in tie-break priority order; required by UsePermutation,
    /// also the canonical candidate ordering when present.
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub candidate_permutation : Vec<String>,
    /// Highest rank position the ranking walk will consider. None considers every rank.
    #[serde(skip_serializing_if = "Option::is_none",default)]
    pub max_rankings_allowed : Option<u32>,
    /// Map blank rank marks to the undeclared write-in sentinel.
    #[serde(default)]
    pub treat_blank_as_undeclared_write_in : bool,
    /// Candidate ids barred from the count before it starts.
    #[serde(skip_serializing_if = "Vec::is_empty",default)]
    pub excluded_candidates : Vec<String>,
    /// Abort the count if any cast vote record fails normalization.
    #[serde(default)]
    pub reject_malformed_ballots : bool,
    /// At most this many per-ballot errors are kept in the result.
    #[serde(default = "default_ballot_error_log_cap")]
    pub ballot_error_log_cap : usize,
}

fn default_decimal_places() -> u32 { 4 }
fn default_true() -> bool { true }
fn default_ballot_error_log_cap() -> usize { 100 }

impl Default for TabulationConfig {
    fn default() -> Self {
        TabulationConfig{
            number_of_winners: NumberOfSeats(1),
            tabulation_mode: TabulationMode::SingleWinnerIrv,
            hare_quota: false,
            non_integer_winning_threshold: false,
            decimal_places_for_vote_arithmetic: default_decimal_places(),
            round_tallies_half_to_even: false,
            batch_elimination: true,
            continue_until_two_remain: false,
            minimum_vote_threshold: 0,
            overvote_rule: OvervoteRule::ExhaustImmediately,
            skipped_rank_rule: SkippedRankRule::ExhaustOnTwoConsecutive,
            duplicate_candidate_rule: DuplicateCandidateRule::SkipToNext,
            tie_break_mode: TieBreakMode::Random,
            random_seed: 0,
            candidate_permutation: vec![],
            max_rankings_allowed: None,
            treat_blank_as_undeclared_write_in: false,
            excluded_candidates: vec![],
            reject_malformed_ballots: false,
            ballot_error_log_cap: default_ballot_error_log_cap(),
        }
    }
}

impl TabulationConfig {
    /// Check internal coherence and coherence against the contest roster.
    pub fn validate(&self,metadata:&ContestMetadata) -> anyhow::Result<()> {
        if self.number_of_winners.0==0 { return Err(anyhow!("at least one seat must be filled")); }
        let single_winner = matches!(self.tabulation_mode,TabulationMode::SingleWinnerIrv|TabulationMode::ContinueUntilTwoRemain);
        if single_winner && self.number_of_winners.0!=1 {
            return Err(anyhow!("{:?} fills exactly one seat, not {}",self.tabulation_mode,self.number_of_winners));
        }
        if self.continue_until_two_remain && self.tabulation_mode!=TabulationMode::ContinueUntilTwoRemain {
            return Err(anyhow!("the continue until two remain flag contradicts tabulation mode {:?}",self.tabulation_mode));
        }
        let electable = metadata.candidate_indices()
            .filter(|&c|!metadata.candidate(c).excluded && !metadata.is_undeclared_write_in(c))
            .filter(|c|!self.excluded_candidates.contains(&metadata.candidate(*c).id))
            .count();
        if self.number_of_winners.0>electable {
            return Err(anyhow!("{} seats cannot be filled by {} electable candidates",self.number_of_winners,electable));
        }
        if self.decimal_places_for_vote_arithmetic>20 {
            return Err(anyhow!("decimal places for vote arithmetic must be 0 to 20, not {}",self.decimal_places_for_vote_arithmetic));
        }
        if self.tie_break_mode==TieBreakMode::UsePermutation && self.candidate_permutation.is_empty() {
            return Err(anyhow!("tie break mode UsePermutation needs a candidate permutation"));
        }
        let lookup = metadata.get_candidate_id_lookup();
        for id in &self.candidate_permutation {
            if !lookup.contains_key(id) { return Err(anyhow!("candidate permutation names {} who is not in the contest",id)); }
        }
        for id in &self.excluded_candidates {
            if !lookup.contains_key(id) { return Err(anyhow!("excluded candidate {} is not in the contest",id)); }
        }
        if self.treat_blank_as_undeclared_write_in && metadata.undeclared_write_in.is_none() {
            return Err(anyhow!("blanks map to undeclared write-ins but the contest has no write-in sentinel"));
        }
        Ok(())
    }

    /// The canonical candidate ordering: the configured permutation when one is
    /// given (candidates it omits follow in lexicographic order), lexicographic
    /// by candidate id otherwise. Every order-sensitive engine structure is
    /// driven by this ordering, never by hash iteration.
    pub fn canonical_order(&self,metadata:&ContestMetadata) -> Vec<CandidateIndex> {
        if self.candidate_permutation.is_empty() {
            metadata.lexicographic_order()
        } else {
            let lookup = metadata.get_candidate_id_lookup();
            let mut res : Vec<CandidateIndex> = self.candidate_permutation.iter().filter_map(|id|lookup.get(id).copied()).collect();
            for candidate in metadata.lexicographic_order() {
                if !res.contains(&candidate) { res.push(candidate); }
            }
            res
        }
    }

    /// The candidates excluded before round 1, combining the configuration list
    /// with exclusions on the roster itself.
    pub fn excluded(&self,metadata:&ContestMetadata) -> Vec<CandidateIndex> {
        let lookup = metadata.get_candidate_id_lookup();
        let mut res = metadata.excluded_candidates();
        for id in &self.excluded_candidates {
            if let Some(&candidate) = lookup.get(id) {
                if !res.contains(&candidate) { res.push(candidate); }
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{TabulationConfig, TabulationMode, TieBreakMode};
    use crate::contest_metadata::{Candidate, CandidateIndex, ContestMetadata, NumberOfSeats};

    fn metadata() -> ContestMetadata {
        ContestMetadata::new("contest".to_string(),["B","A","C"].iter().map(|id|Candidate{id:id.to_string(),name:id.to_string(),excluded:false}).collect())
    }

    #[test]
    fn validation_catches_incoherent_options() {
        let metadata = metadata();
        let mut config = TabulationConfig::default();
        assert!(config.validate(&metadata).is_ok());
        config.number_of_winners = NumberOfSeats(2);
        assert!(config.validate(&metadata).is_err()); // two seats in single winner IRV
        config.tabulation_mode = TabulationMode::MultiSeatStv;
        assert!(config.validate(&metadata).is_ok());
        config.tie_break_mode = TieBreakMode::UsePermutation;
        assert!(config.validate(&metadata).is_err()); // permutation missing
        config.candidate_permutation = vec!["C".to_string(),"Zorro".to_string()];
        assert!(config.validate(&metadata).is_err()); // unknown candidate
        config.candidate_permutation = vec!["C".to_string(),"A".to_string()];
        assert!(config.validate(&metadata).is_ok());
    }

    #[test]
    fn canonical_order_prefers_the_permutation_then_lexicographic() {
        let metadata = metadata();
        let mut config = TabulationConfig::default();
        // roster order B,A,C; lexicographic A,B,C
        assert_eq!(vec![CandidateIndex(1),CandidateIndex(0),CandidateIndex(2)],config.canonical_order(&metadata));
        config.candidate_permutation = vec!["C".to_string()];
        assert_eq!(vec![CandidateIndex(2),CandidateIndex(1),CandidateIndex(0)],config.canonical_order(&metadata));
    }
}
