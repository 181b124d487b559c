// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! The round driver. Each round: tally, check for winners against the
//! threshold, check termination, otherwise pick losers, then move surplus and
//! eliminated votes on to their next continuing candidates. All arithmetic is
//! exact; conservation of votes is checked at every round boundary.

use num::{BigInt, BigRational, Zero};
use crate::cast_vote_record::{normalize_ballots, Ballot, RawCastVoteRecord};
use crate::config::{TabulationConfig, TabulationMode};
use crate::contest_metadata::{CandidateIndex, ContestMetadata, NumberOfSeats};
use crate::contest_result::{ContestResult, RoundOutcome, Termination, TransferKind, TransferRecord};
use crate::errors::TabulationError;
use crate::observer::{TabulationEvent, TabulationObserver};
use crate::ranking_walk::{effective_assignment, Assignment, ExhaustionKind};
use crate::round_tally::{RoundTally, TallyIndex};
use crate::tie_resolution::{TieBreakDecision, TieBreakFailure, TieBreakOracle, TieBreaker};
use crate::transfer_weight::{TransferWeight, VoteTally};
use crate::winning_threshold::WinningThreshold;

/// Where a candidate stands in the count. Transitions only ever go from
/// Continuing to one of the terminal states, and terminal states are sticky.
#[derive(Copy,Clone,Debug,Eq,PartialEq)]
pub enum CandidateStatus {
    Continuing,
    Elected { round : usize, order : usize },
    Eliminated { round : usize, order : usize },
    /// Barred from the count before round 1.
    Excluded,
}

impl CandidateStatus {
    pub fn is_continuing(&self) -> bool { matches!(self,CandidateStatus::Continuing) }
}

/// The mutable per-ballot state of a run, held in an array parallel to the
/// ballot array. Weights only ever shrink.
#[derive(Clone,Debug)]
pub struct BallotState {
    pub weight : BigRational,
    pub assigned : Option<CandidateIndex>,
    pub current_rank : Option<u32>,
    pub exhausted : Option<ExhaustionKind>,
}

impl BallotState {
    fn fresh() -> Self {
        BallotState{ weight: BigRational::from_integer(BigInt::from(1u8)), assigned: None, current_rank: None, exhausted: None }
    }
}

// Why a round could not be completed.
enum RoundAbort {
    // the oracle declined; the partial record is returned as a result.
    Cancelled,
    Fatal(TabulationError),
}

/// The workhorse for one tabulation pass. Sequential multi-seat counts run
/// several of these over the same ballots.
struct Tabulator<'a,'o> {
    metadata : &'a ContestMetadata,
    config : &'a TabulationConfig,
    /// the mode this pass runs under; a sequential count runs IRV passes.
    mode : TabulationMode,
    seats : NumberOfSeats,
    ballots : &'a [Ballot],
    canonical : &'a [CandidateIndex],
    statuses : Vec<CandidateStatus>,
    states : Vec<BallotState>,
    /// current exact tally per candidate. Elected candidates stay pinned at the
    /// threshold, eliminated candidates at zero.
    tallys : Vec<BigRational>,
    exhausted : BigRational,
    overvote : BigRational,
    skipped : BigRational,
    total_weight : BigRational,
    threshold : Option<WinningThreshold>,
    /// exact start-of-round tallies of every completed round this pass,
    /// the input to previous-round tie resolution.
    history : Vec<Vec<BigRational>>,
    rounds : Vec<RoundOutcome>,
    elected : Vec<CandidateIndex>,
    round : usize,
    round_offset : usize,
    tie_breaker : &'a mut TieBreaker<'o>,
    observer : &'a mut dyn TabulationObserver,
}

impl <'a,'o> Tabulator<'a,'o> {
    fn new(metadata:&'a ContestMetadata,config:&'a TabulationConfig,mode:TabulationMode,seats:NumberOfSeats,ballots:&'a [Ballot],canonical:&'a [CandidateIndex],excluded:&[CandidateIndex],round_offset:usize,tie_breaker:&'a mut TieBreaker<'o>,observer:&'a mut dyn TabulationObserver) -> Self {
        let num_candidates = metadata.num_candidates();
        let mut statuses = vec![CandidateStatus::Continuing;num_candidates];
        for &candidate in excluded { statuses[candidate.0]=CandidateStatus::Excluded; }
        Tabulator{
            metadata,
            config,
            mode,
            seats,
            ballots,
            canonical,
            statuses,
            states: vec![BallotState::fresh();ballots.len()],
            tallys: vec![BigRational::zero();num_candidates],
            exhausted: BigRational::zero(),
            overvote: BigRational::zero(),
            skipped: BigRational::zero(),
            total_weight: BigRational::from_integer(BigInt::from(ballots.len())),
            threshold: None,
            history: vec![],
            rounds: vec![],
            elected: vec![],
            round: round_offset,
            round_offset,
            tie_breaker,
            observer,
        }
    }

    fn uses_threshold(&self) -> bool {
        matches!(self.mode,TabulationMode::SingleWinnerIrv|TabulationMode::MultiSeatStv)
    }

    fn rounded(&self,value:&BigRational) -> VoteTally {
        VoteTally::rounded(value,self.config.decimal_places_for_vote_arithmetic,self.config.round_tallies_half_to_even)
    }

    fn bucket_mut(&mut self,kind:ExhaustionKind) -> &mut BigRational {
        match kind {
            ExhaustionKind::Overvote => &mut self.overvote,
            ExhaustionKind::SkippedRankings => &mut self.skipped,
            ExhaustionKind::DuplicateRanking | ExhaustionKind::NoMoreRankings => &mut self.exhausted,
        }
    }

    fn continuing_in_canonical_order(&self) -> Vec<CandidateIndex> {
        self.canonical.iter().copied().filter(|c|self.statuses[c.0].is_continuing()).collect()
    }

    fn unfilled_seats(&self) -> usize { self.seats.0-self.elected.len() }

    /// The fewest candidates any elimination may leave standing.
    fn min_remaining(&self) -> usize {
        match self.mode {
            TabulationMode::ContinueUntilTwoRemain => 2,
            TabulationMode::SingleWinnerIrv | TabulationMode::SequentialMultiSeat => 1,
            TabulationMode::MultiSeatStv | TabulationMode::BottomsUpMultiSeat => self.unfilled_seats().max(1),
        }
    }

    fn snapshot(&self) -> RoundTally {
        RoundTally{
            by_candidate: self.tallys.clone(),
            exhausted: self.exhausted.clone(),
            overvote: self.overvote.clone(),
            skipped: self.skipped.clone(),
        }
    }

    fn distribute_first_preferences(&mut self) {
        for index in 0..self.ballots.len() {
            match effective_assignment(&self.ballots[index],&self.statuses,self.config) {
                Assignment::Candidate{candidate,rank} => {
                    self.states[index].assigned=Some(candidate);
                    self.states[index].current_rank=Some(rank);
                    self.tallys[candidate.0]+=self.states[index].weight.clone();
                }
                Assignment::Exhausted(kind) => {
                    self.states[index].exhausted=Some(kind);
                    let weight = self.states[index].weight.clone();
                    *self.bucket_mut(kind)+=weight;
                }
            }
        }
    }

    fn run(&mut self) -> Result<Termination,TabulationError> {
        let round_limit = self.metadata.num_candidates()+1;
        self.distribute_first_preferences();
        loop {
            if self.rounds.len()>=round_limit {
                return Err(TabulationError::RoundLimitExceeded{limit:round_limit});
            }
            self.round = self.round_offset+self.rounds.len()+1;
            self.observer.handle(TabulationEvent::RoundBegun{round:self.round});
            let snapshot = self.snapshot();
            self.observer.handle(TabulationEvent::TallyComputed{round:self.round,tally:&snapshot});
            if self.uses_threshold() && self.threshold.is_none() {
                let active : BigRational = snapshot.by_candidate.iter().sum();
                let threshold = WinningThreshold::compute(&active,self.seats,self.config);
                self.observer.handle(TabulationEvent::ThresholdComputed{threshold:&threshold});
                self.threshold = Some(threshold);
            }
            let mut outcome = RoundOutcome{
                round: self.round,
                tally: snapshot.by_candidate.iter().map(|t|self.rounded(t)).collect(),
                exhausted: self.rounded(&snapshot.exhausted),
                overvote: self.rounded(&snapshot.overvote),
                skipped: self.rounded(&snapshot.skipped),
                threshold: self.threshold.as_ref().map(|t|self.rounded(&t.value)),
                elected: vec![],
                eliminated: vec![],
                transfers: vec![],
                tie_breaks: vec![],
            };
            let newly_elected = if self.uses_threshold() {
                match self.select_winners(&mut outcome) {
                    Ok(winners) => winners,
                    Err(abort) => return self.abort_round(abort,snapshot,outcome),
                }
            } else { vec![] };
            match self.check_termination(&mut outcome) {
                Ok(Some(termination)) => {
                    self.finish_round(snapshot,outcome);
                    return Ok(termination);
                }
                Ok(None) => {}
                Err(abort) => return self.abort_round(abort,snapshot,outcome),
            }
            let eliminated = if newly_elected.is_empty() {
                match self.select_losers(&mut outcome) {
                    Ok(losers) => losers,
                    Err(abort) => return self.abort_round(abort,snapshot,outcome),
                }
            } else { vec![] };
            self.transfer_surpluses(&newly_elected,&snapshot,&mut outcome);
            self.transfer_eliminated(&eliminated,&mut outcome);
            self.check_conservation()?;
            self.finish_round(snapshot,outcome);
        }
    }

    fn abort_round(&mut self,abort:RoundAbort,snapshot:RoundTally,outcome:RoundOutcome) -> Result<Termination,TabulationError> {
        match abort {
            RoundAbort::Cancelled => {
                self.finish_round(snapshot,outcome);
                Ok(Termination::Cancelled)
            }
            RoundAbort::Fatal(error) => Err(error),
        }
    }

    fn finish_round(&mut self,snapshot:RoundTally,outcome:RoundOutcome) {
        self.history.push(snapshot.by_candidate);
        self.rounds.push(outcome);
    }

    fn declare_elected(&mut self,candidate:CandidateIndex,outcome:&mut RoundOutcome) {
        let order = outcome.elected.len();
        self.statuses[candidate.0]=CandidateStatus::Elected{round:self.round,order};
        self.elected.push(candidate);
        outcome.elected.push(candidate);
        self.observer.handle(TabulationEvent::CandidateElected{round:self.round,candidate});
    }

    fn break_tie(&mut self,selection_is_winner:bool,tied:&[CandidateIndex],tally:&BigRational,outcome:&mut RoundOutcome) -> Result<TieBreakDecision,RoundAbort> {
        let tally = self.rounded(tally);
        let resolved = if selection_is_winner {
            self.tie_breaker.select_winner(tied,self.round,&self.history,&tally)
        } else {
            self.tie_breaker.select_loser(tied,self.round,&self.history,&tally)
        };
        match resolved {
            Ok(decision) => {
                self.observer.handle(TabulationEvent::TieBroken{decision:&decision});
                outcome.tie_breaks.push(decision.clone());
                Ok(decision)
            }
            Err(TieBreakFailure::Cancelled) => Err(RoundAbort::Cancelled),
            Err(TieBreakFailure::Unresolvable) => Err(RoundAbort::Fatal(TabulationError::TieUnresolvable{round:self.round,tied:tied.to_vec()})),
        }
    }

    /// Elect every continuing candidate at or over the threshold, in descending
    /// tally order, ties ordered by the tie breaker. The write-in sentinel can
    /// never be elected.
    fn select_winners(&mut self,outcome:&mut RoundOutcome) -> Result<Vec<CandidateIndex>,RoundAbort> {
        let threshold = self.threshold.clone().expect("winner selection always has a threshold");
        let qualifying : Vec<CandidateIndex> = self.canonical.iter().copied()
            .filter(|&c|self.statuses[c.0].is_continuing() && !self.metadata.is_undeclared_write_in(c) && threshold.reached(&self.tallys[c.0]))
            .collect();
        if qualifying.is_empty() { return Ok(vec![]); }
        let index = TallyIndex::build(&self.tallys,&qualifying);
        let mut in_order : Vec<CandidateIndex> = Vec::with_capacity(qualifying.len());
        for (tally,group) in index.descending() {
            if group.len()==1 { in_order.push(group[0]); }
            else {
                let mut remaining = group.to_vec();
                let tally = tally.clone();
                while remaining.len()>1 {
                    let decision = self.break_tie(true,&remaining,&tally,outcome)?;
                    in_order.push(decision.chosen);
                    remaining.retain(|&c|c!=decision.chosen);
                }
                in_order.push(remaining[0]);
            }
        }
        for &candidate in &in_order { self.declare_elected(candidate,outcome); }
        Ok(in_order)
    }

    /// Elect everyone still standing, highest tally first. Used when the field
    /// has shrunk to the number of unfilled seats.
    fn elect_all_remaining(&mut self,outcome:&mut RoundOutcome) {
        let mut remaining : Vec<CandidateIndex> = self.continuing_in_canonical_order().into_iter()
            .filter(|&c|!self.metadata.is_undeclared_write_in(c)).collect();
        remaining.sort_by(|a,b|self.tallys[b.0].cmp(&self.tallys[a.0]));
        for candidate in remaining { self.declare_elected(candidate,outcome); }
    }

    /// The termination rules, in their order of precedence.
    fn check_termination(&mut self,outcome:&mut RoundOutcome) -> Result<Option<Termination>,RoundAbort> {
        if self.elected.len()==self.seats.0 { return Ok(Some(Termination::AllSeatsFilled)); }
        let continuing = self.continuing_in_canonical_order();
        if continuing.is_empty() {
            // every candidate was elected or eliminated with seats still open;
            // the ballots could not fill the contest.
            return Ok(Some(Termination::AllRemainingElected));
        }
        match self.mode {
            TabulationMode::SingleWinnerIrv | TabulationMode::SequentialMultiSeat => {
                if continuing.len()==1 {
                    let last = continuing[0];
                    if !self.metadata.is_undeclared_write_in(last) { self.declare_elected(last,outcome); }
                    return Ok(Some(Termination::LastCandidateStanding));
                }
            }
            TabulationMode::ContinueUntilTwoRemain => {
                if continuing.len()<=2 {
                    let electable : Vec<CandidateIndex> = continuing.iter().copied().filter(|&c|!self.metadata.is_undeclared_write_in(c)).collect();
                    match electable.as_slice() {
                        [] => {}
                        [only] => { let only = *only; self.declare_elected(only,outcome); }
                        [first,second] => {
                            let (first,second) = (*first,*second);
                            let winner = match self.tallys[first.0].cmp(&self.tallys[second.0]) {
                                std::cmp::Ordering::Greater => first,
                                std::cmp::Ordering::Less => second,
                                std::cmp::Ordering::Equal => {
                                    let tally = self.tallys[first.0].clone();
                                    self.break_tie(true,&[first,second],&tally,outcome)?.chosen
                                }
                            };
                            self.declare_elected(winner,outcome);
                        }
                        _ => unreachable!("at most two candidates remain"),
                    }
                    return Ok(Some(Termination::TwoCandidatesRemaining));
                }
            }
            TabulationMode::BottomsUpMultiSeat => {
                if continuing.len()==self.seats.0 {
                    self.elect_all_remaining(outcome);
                    return Ok(Some(Termination::AllRemainingElected));
                }
            }
            TabulationMode::MultiSeatStv => {
                if continuing.len()==self.unfilled_seats() {
                    self.elect_all_remaining(outcome);
                    return Ok(Some(Termination::AllRemainingElected));
                }
            }
        }
        Ok(None)
    }

    /// The largest prefix of the ascending tally order whose combined votes
    /// cannot catch the next candidate. 0 means no batch is sound.
    fn batch_eliminable_prefix(&self,ascending:&[CandidateIndex]) -> usize {
        let mut best = 0;
        let mut prefix = BigRational::zero();
        for position in 1..ascending.len() {
            prefix += self.tallys[ascending[position-1].0].clone();
            if prefix<self.tallys[ascending[position].0] { best = position; }
        }
        best
    }

    fn mark_eliminated(&mut self,losers:Vec<CandidateIndex>,outcome:&mut RoundOutcome) -> Vec<CandidateIndex> {
        for (order,&candidate) in losers.iter().enumerate() {
            self.statuses[candidate.0]=CandidateStatus::Eliminated{round:self.round,order};
            outcome.eliminated.push(candidate);
        }
        self.observer.handle(TabulationEvent::CandidatesEliminated{round:self.round,candidates:&losers});
        losers
    }

    /// Pick this round's eliminations: the minimum vote floor in round 1, then
    /// batch elimination, then the single lowest candidate with ties resolved.
    fn select_losers(&mut self,outcome:&mut RoundOutcome) -> Result<Vec<CandidateIndex>,RoundAbort> {
        let continuing = self.continuing_in_canonical_order();
        if continuing.len()<=self.min_remaining() { return Ok(vec![]); }
        let max_eliminations = continuing.len()-self.min_remaining();
        if self.rounds.is_empty() && self.config.minimum_vote_threshold>0 {
            let floor = BigRational::from_integer(BigInt::from(self.config.minimum_vote_threshold));
            let mut below : Vec<CandidateIndex> = continuing.iter().copied().filter(|&c|self.tallys[c.0]<floor).collect();
            if !below.is_empty() {
                below.sort_by(|a,b|self.tallys[a.0].cmp(&self.tallys[b.0]));
                below.truncate(max_eliminations);
                return Ok(self.mark_eliminated(below,outcome));
            }
        }
        let index = TallyIndex::build(&self.tallys,&continuing);
        if self.config.batch_elimination {
            let ascending = index.candidates_ascending();
            let prefix = self.batch_eliminable_prefix(&ascending).min(max_eliminations);
            if prefix>0 {
                let losers = ascending[..prefix].to_vec();
                return Ok(self.mark_eliminated(losers,outcome));
            }
        }
        let (tally,group) = index.lowest().expect("there are continuing candidates");
        let loser = if group.len()==1 { group[0] } else {
            let group = group.to_vec();
            let tally = tally.clone();
            self.break_tie(false,&group,&tally,outcome)?.chosen
        };
        Ok(self.mark_eliminated(vec![loser],outcome))
    }

    /// Re-walk every ballot sitting on `from`, scaling its weight first if a
    /// surplus fraction is given, and accumulate where the votes went.
    fn move_ballots_from(&mut self,from:CandidateIndex,fraction:Option<&TransferWeight>) -> (Vec<(CandidateIndex,VoteTally)>,VoteTally) {
        let mut to = vec![BigRational::zero();self.metadata.num_candidates()];
        let mut exhausted_votes = BigRational::zero();
        for index in 0..self.ballots.len() {
            if self.states[index].assigned!=Some(from) { continue; }
            if let Some(fraction) = fraction {
                self.states[index].weight = fraction.times(&self.states[index].weight);
            }
            let weight = self.states[index].weight.clone();
            if weight.is_zero() {
                self.states[index].assigned=None;
                self.states[index].current_rank=None;
                continue;
            }
            match effective_assignment(&self.ballots[index],&self.statuses,self.config) {
                Assignment::Candidate{candidate,rank} => {
                    self.states[index].assigned=Some(candidate);
                    self.states[index].current_rank=Some(rank);
                    self.tallys[candidate.0]+=weight.clone();
                    to[candidate.0]+=weight;
                }
                Assignment::Exhausted(kind) => {
                    self.states[index].assigned=None;
                    self.states[index].current_rank=None;
                    self.states[index].exhausted=Some(kind);
                    *self.bucket_mut(kind)+=weight.clone();
                    exhausted_votes+=weight;
                }
            }
        }
        let destinations : Vec<(CandidateIndex,VoteTally)> = self.canonical.iter().copied()
            .filter(|c|!to[c.0].is_zero())
            .map(|c|{ let amount = self.rounded(&to[c.0]); (c,amount) })
            .collect();
        (destinations,self.rounded(&exhausted_votes))
    }

    /// Move every new winner's surplus on. All fractions come from the
    /// start-of-round state, so simultaneous winners transfer independently.
    fn transfer_surpluses(&mut self,winners:&[CandidateIndex],snapshot:&RoundTally,outcome:&mut RoundOutcome) {
        let threshold_value = match &self.threshold { Some(t)=>t.value.clone(), None=>return };
        let fractions : Vec<(CandidateIndex,TransferWeight)> = winners.iter().copied()
            .filter(|&c|snapshot.tally(c)>&threshold_value)
            .map(|c|(c,TransferWeight::surplus_fraction(snapshot.tally(c),&threshold_value)))
            .collect();
        for (candidate,fraction) in fractions {
            self.observer.handle(TabulationEvent::SurplusTransferred{round:self.round,candidate,fraction:&fraction});
            let (to,exhausted) = self.move_ballots_from(candidate,Some(&fraction));
            self.tallys[candidate.0]=threshold_value.clone();
            outcome.transfers.push(TransferRecord{from:candidate,kind:TransferKind::Surplus{fraction},to,exhausted});
        }
    }

    /// Move every eliminated candidate's votes on at full weight.
    fn transfer_eliminated(&mut self,losers:&[CandidateIndex],outcome:&mut RoundOutcome) {
        for &candidate in losers {
            let (to,exhausted) = self.move_ballots_from(candidate,None);
            self.tallys[candidate.0]=BigRational::zero();
            outcome.transfers.push(TransferRecord{from:candidate,kind:TransferKind::Elimination,to,exhausted});
        }
    }

    fn check_conservation(&self) -> Result<(),TabulationError> {
        let counted = self.tallys.iter().sum::<BigRational>()+&self.exhausted+&self.overvote+&self.skipped;
        if counted!=self.total_weight {
            Err(TabulationError::InvariantViolation{
                round: self.round,
                expected: self.total_weight.to_string(),
                actual: counted.to_string(),
            })
        } else { Ok(()) }
    }
}

/// Tabulate a contest over normalized ballots. Pure apart from the oracle:
/// identical ballots, configuration, seed and oracle behaviour give an
/// identical result.
pub fn tabulate(metadata:&ContestMetadata,ballots:&[Ballot],config:&TabulationConfig,oracle:&dyn TieBreakOracle,observer:&mut dyn TabulationObserver) -> Result<ContestResult,TabulationError> {
    config.validate(metadata).map_err(|e|TabulationError::ConfigInvalid(e.to_string()))?;
    let canonical = config.canonical_order(metadata);
    let excluded = config.excluded(metadata);
    let mut rounds : Vec<RoundOutcome> = vec![];
    let mut elected_in_order : Vec<CandidateIndex> = vec![];
    let mut final_tallies : Vec<VoteTally> = vec![];
    let termination;
    if config.tabulation_mode==TabulationMode::SequentialMultiSeat {
        // one full IRV pass per seat, prior winners excluded from later passes.
        let mut pass_excluded = excluded;
        let mut round_offset = 0;
        let mut ended = Termination::AllSeatsFilled;
        for _seat in 0..config.number_of_winners.0 {
            let mut tie_breaker = TieBreaker::new(metadata,config,oracle);
            let mut pass = Tabulator::new(metadata,config,TabulationMode::SingleWinnerIrv,NumberOfSeats(1),ballots,&canonical,&pass_excluded,round_offset,&mut tie_breaker,observer);
            let pass_ended = pass.run()?;
            round_offset += pass.rounds.len();
            rounds.append(&mut pass.rounds);
            pass_excluded.extend(pass.elected.iter().copied());
            elected_in_order.append(&mut pass.elected);
            final_tallies = pass.tallys.iter().map(|t|VoteTally::rounded(t,config.decimal_places_for_vote_arithmetic,config.round_tallies_half_to_even)).collect();
            if pass_ended==Termination::Cancelled { ended=Termination::Cancelled; break; }
        }
        termination = ended;
    } else {
        let mut tie_breaker = TieBreaker::new(metadata,config,oracle);
        let mut pass = Tabulator::new(metadata,config,config.tabulation_mode,config.number_of_winners,ballots,&canonical,&excluded,0,&mut tie_breaker,observer);
        termination = pass.run()?;
        rounds = std::mem::take(&mut pass.rounds);
        elected_in_order = std::mem::take(&mut pass.elected);
        final_tallies = pass.tallys.iter().map(|t|VoteTally::rounded(t,config.decimal_places_for_vote_arithmetic,config.round_tallies_half_to_even)).collect();
    }
    observer.handle(TabulationEvent::TabulationFinished{rounds:rounds.len(),elected:&elected_in_order});
    let tie_break_log : Vec<TieBreakDecision> = rounds.iter().flat_map(|r|r.tie_breaks.iter().cloned()).collect();
    Ok(ContestResult{
        contest_id: metadata.contest_id.clone(),
        rounds,
        elected_in_order,
        tie_break_log,
        final_tallies,
        termination,
        malformed_ballots: 0,
        ballot_errors: vec![],
        generated_at: None,
    })
}

/// Tabulate straight from raw cast vote records: normalize, apply the
/// malformed-ballot policy, then count.
pub fn tabulate_raw(metadata:&ContestMetadata,raw:&[RawCastVoteRecord],config:&TabulationConfig,oracle:&dyn TieBreakOracle,observer:&mut dyn TabulationObserver) -> Result<ContestResult,TabulationError> {
    let (ballots,errors) = normalize_ballots(raw,metadata,config);
    let malformed = raw.len()-ballots.len();
    if config.reject_malformed_ballots && malformed>0 {
        return Err(TabulationError::MalformedBallots{count:malformed});
    }
    let mut result = tabulate(metadata,&ballots,config,oracle,observer)?;
    result.malformed_ballots = malformed;
    result.ballot_errors = errors;
    Ok(result)
}
