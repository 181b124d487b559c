// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Tie resolution. Every mode must reproduce exactly for identical inputs and
//! seed, so tied sets are put into a canonical order before any draw, the PRNG
//! is explicitly seeded, and the interactive path goes through an oracle the
//! engine treats as a pure function.

use num::BigRational;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Serialize,Deserialize};
use crate::config::{TabulationConfig, TieBreakMode};
use crate::contest_metadata::{CandidateIndex, ContestMetadata};
use crate::transfer_weight::VoteTally;

/// Whether a tie is being broken to pick someone to eliminate or someone to elect.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Serialize,Deserialize)]
pub enum TieSelection {
    Loser,
    Winner,
}

/// One resolved tie, kept for the audit log.
#[derive(Clone,Debug,PartialEq,Eq,Serialize,Deserialize)]
pub struct TieBreakDecision {
    pub round : usize,
    pub selection : TieSelection,
    /// The tied candidates in canonical order.
    pub tied : Vec<CandidateIndex>,
    pub chosen : CandidateIndex,
    pub explanation : String,
}

/// What the operator said.
#[derive(Copy,Clone,Debug,Eq,PartialEq)]
pub enum OracleDecision {
    Chosen(CandidateIndex),
    Cancelled,
}

/// The interactive tie-break capability. The console lives outside the engine;
/// tests supply deterministic implementations.
pub trait TieBreakOracle {
    fn choose_loser(&self,tied:&[CandidateIndex],round:usize,tally:&VoteTally) -> OracleDecision;
    fn choose_winner(&self,tied:&[CandidateIndex],round:usize,tally:&VoteTally) -> OracleDecision;
}

/// An oracle that refuses every choice. The right oracle for counts whose
/// configuration should never need one.
pub struct NoOracle;

impl TieBreakOracle for NoOracle {
    fn choose_loser(&self,_tied:&[CandidateIndex],_round:usize,_tally:&VoteTally) -> OracleDecision { OracleDecision::Cancelled }
    fn choose_winner(&self,_tied:&[CandidateIndex],_round:usize,_tally:&VoteTally) -> OracleDecision { OracleDecision::Cancelled }
}

/// Why a tie could not be broken.
#[derive(Copy,Clone,Debug,Eq,PartialEq)]
pub enum TieBreakFailure {
    /// The oracle declined to choose; the count stops with a partial result.
    Cancelled,
    /// The resolution chain ran out. Fatal.
    Unresolvable,
}

/// Breaks ties for one tabulation pass. Holds the seeded PRNG and the
/// permutation, so identical configurations replay identical decisions.
pub struct TieBreaker<'a> {
    mode : TieBreakMode,
    seed : u64,
    rng : ChaCha20Rng,
    /// position of each candidate in the tie-break permutation, if one is in force.
    permutation_position : Option<Vec<usize>>,
    /// position of each candidate in lexicographic id order.
    lexicographic_position : Vec<usize>,
    oracle : &'a dyn TieBreakOracle,
}

/// The seed is mapped to the ChaCha key explicitly (little endian into the
/// first 8 bytes) so the stream is stable across platforms.
fn chacha_from_seed(seed:u64) -> ChaCha20Rng {
    let mut seed32 = [0u8;32];
    seed32[..8].copy_from_slice(&seed.to_le_bytes());
    ChaCha20Rng::from_seed(seed32)
}

fn positions(order:&[CandidateIndex],num_candidates:usize) -> Vec<usize> {
    let mut res = vec![usize::MAX;num_candidates];
    for (position,&candidate) in order.iter().enumerate() { res[candidate.0]=position; }
    res
}

impl <'a> TieBreaker<'a> {
    pub fn new(metadata:&ContestMetadata,config:&TabulationConfig,oracle:&'a dyn TieBreakOracle) -> Self {
        let lexicographic = metadata.lexicographic_order();
        let lexicographic_position = positions(&lexicographic,metadata.num_candidates());
        let mut rng = chacha_from_seed(config.random_seed);
        let permutation_position = match config.tie_break_mode {
            TieBreakMode::UsePermutation => Some(positions(&config.canonical_order(metadata),metadata.num_candidates())),
            TieBreakMode::GeneratePermutation => {
                let mut order = lexicographic;
                order.shuffle(&mut rng);
                Some(positions(&order,metadata.num_candidates()))
            }
            _ => None,
        };
        TieBreaker{ mode: config.tie_break_mode, seed: config.random_seed, rng, permutation_position, lexicographic_position, oracle }
    }

    /// Pick the candidate to eliminate from a tied set. `history` holds the
    /// exact tallies of every completed earlier round, round 1 first.
    pub fn select_loser(&mut self,tied:&[CandidateIndex],round:usize,history:&[Vec<BigRational>],tally:&VoteTally) -> Result<TieBreakDecision,TieBreakFailure> {
        self.select(TieSelection::Loser,tied,round,history,tally)
    }

    /// Pick the candidate to elect first from a tied set. Prefers the highest
    /// prior tally where select_loser prefers the lowest; the chain is otherwise
    /// identical.
    pub fn select_winner(&mut self,tied:&[CandidateIndex],round:usize,history:&[Vec<BigRational>],tally:&VoteTally) -> Result<TieBreakDecision,TieBreakFailure> {
        self.select(TieSelection::Winner,tied,round,history,tally)
    }

    fn select(&mut self,selection:TieSelection,tied:&[CandidateIndex],round:usize,history:&[Vec<BigRational>],tally:&VoteTally) -> Result<TieBreakDecision,TieBreakFailure> {
        let mut ordered = tied.to_vec();
        ordered.sort_by_key(|c|self.lexicographic_position[c.0]);
        match self.mode {
            TieBreakMode::Interactive => self.ask_oracle(selection,ordered,round,tally),
            TieBreakMode::Random => Ok(self.random_draw(selection,ordered,round)),
            TieBreakMode::UsePermutation | TieBreakMode::GeneratePermutation => Ok(self.permutation_pick(selection,ordered,round)),
            TieBreakMode::PreviousRoundCountsThenRandom => {
                match narrow_by_prior_rounds(selection,&ordered,history) {
                    (chosen,Some(cited)) if chosen.len()==1 => Ok(decision(selection,ordered,chosen[0],round,prior_round_explanation(selection,cited))),
                    (still_tied,_) => Ok(self.random_draw(selection,still_tied,round)),
                }
            }
            TieBreakMode::PreviousRoundCountsThenInteractive => {
                match narrow_by_prior_rounds(selection,&ordered,history) {
                    (chosen,Some(cited)) if chosen.len()==1 => Ok(decision(selection,ordered,chosen[0],round,prior_round_explanation(selection,cited))),
                    (still_tied,_) => self.ask_oracle(selection,still_tied,round,tally),
                }
            }
        }
    }

    fn ask_oracle(&mut self,selection:TieSelection,tied:Vec<CandidateIndex>,round:usize,tally:&VoteTally) -> Result<TieBreakDecision,TieBreakFailure> {
        let answer = match selection {
            TieSelection::Loser => self.oracle.choose_loser(&tied,round,tally),
            TieSelection::Winner => self.oracle.choose_winner(&tied,round,tally),
        };
        match answer {
            OracleDecision::Chosen(chosen) if tied.contains(&chosen) => Ok(decision(selection,tied,chosen,round,"chosen by the operator".to_string())),
            OracleDecision::Chosen(_) => Err(TieBreakFailure::Unresolvable),
            OracleDecision::Cancelled => Err(TieBreakFailure::Cancelled),
        }
    }

    fn random_draw(&mut self,selection:TieSelection,tied:Vec<CandidateIndex>,round:usize) -> TieBreakDecision {
        let chosen = tied[self.rng.gen_range(0..tied.len())];
        let explanation = format!("random draw with seed {}",self.seed);
        decision(selection,tied,chosen,round,explanation)
    }

    fn permutation_pick(&mut self,selection:TieSelection,tied:Vec<CandidateIndex>,round:usize) -> TieBreakDecision {
        let position = self.permutation_position.as_ref().expect("permutation modes always build a permutation");
        // the loser is the candidate the permutation favours least, the winner the one it favours most.
        let chosen = match selection {
            TieSelection::Loser => *tied.iter().max_by_key(|c|position[c.0]).unwrap(),
            TieSelection::Winner => *tied.iter().min_by_key(|c|position[c.0]).unwrap(),
        };
        let explanation = match selection {
            TieSelection::Loser => "latest of the tied candidates in the permutation".to_string(),
            TieSelection::Winner => "earliest of the tied candidates in the permutation".to_string(),
        };
        decision(selection,tied,chosen,round,explanation)
    }
}

fn decision(selection:TieSelection,tied:Vec<CandidateIndex>,chosen:CandidateIndex,round:usize,explanation:String) -> TieBreakDecision {
    TieBreakDecision{round,selection,tied,chosen,explanation}
}

fn prior_round_explanation(selection:TieSelection,cited:usize) -> String {
    match selection {
        TieSelection::Loser => format!("uniquely lowest tally in round {}",cited),
        TieSelection::Winner => format!("uniquely highest tally in round {}",cited),
    }
}

/// Scan prior rounds from the most recent backwards, at each step restricting
/// the tied set to the candidates with the lowest (or, electing, highest)
/// tally in that round. Returns the narrowed set and the earliest round used.
fn narrow_by_prior_rounds(selection:TieSelection,tied:&[CandidateIndex],history:&[Vec<BigRational>]) -> (Vec<CandidateIndex>,Option<usize>) {
    let mut current = tied.to_vec();
    let mut cited = None;
    for (round_index,tallies) in history.iter().enumerate().rev() {
        let target = match selection {
            TieSelection::Loser => current.iter().map(|c|&tallies[c.0]).min(),
            TieSelection::Winner => current.iter().map(|c|&tallies[c.0]).max(),
        };
        let target = target.expect("tied set is never empty").clone();
        let subset : Vec<CandidateIndex> = current.iter().filter(|c|tallies[c.0]==target).copied().collect();
        if subset.len()<current.len() {
            current = subset;
            cited = Some(round_index+1);
        }
        if current.len()==1 { break; }
    }
    (current,cited)
}
