// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.


//! Properties that must hold for every count: conservation of votes,
//! reproducibility, independence from ballot order, and the soundness
//! condition on batch eliminations.

#[cfg(test)]
mod tests {
    use num::{BigRational, Zero};
    use rcv::cast_vote_record::Ballot;
    use rcv::config::{TabulationConfig, TabulationMode, TieBreakMode};
    use rcv::contest_metadata::{Candidate, CandidateIndex, ContestMetadata, NumberOfSeats};
    use rcv::contest_result::ContestResult;
    use rcv::observer::NoopObserver;
    use rcv::tabulation::tabulate;
    use rcv::tie_resolution::NoOracle;

    fn metadata(ids:&[&str]) -> ContestMetadata {
        ContestMetadata::new("test-contest".to_string(),ids.iter().map(|id|Candidate{id:id.to_string(),name:id.to_string(),excluded:false}).collect())
    }

    fn ballots(metadata:&ContestMetadata,groups:&[(usize,&[&str])]) -> Vec<Ballot> {
        let lookup = metadata.get_candidate_id_lookup();
        let mut res = vec![];
        for (group_number,(n,prefs)) in groups.iter().enumerate() {
            for copy in 0..*n {
                let marks : Vec<(u32,CandidateIndex)> = prefs.iter().enumerate().map(|(position,id)|((position+1) as u32,lookup[*id])).collect();
                res.push(Ballot::new(format!("b{}-{}",group_number,copy),None,marks));
            }
        }
        res
    }

    fn count(metadata:&ContestMetadata,ballots:&[Ballot],config:&TabulationConfig) -> ContestResult {
        tabulate(metadata,ballots,config,&NoOracle,&mut NoopObserver).unwrap()
    }

    /// Every recorded round accounts for every ballot: candidate tallies plus
    /// the three exhaustion buckets always sum to the ballots cast.
    fn assert_conserved(result:&ContestResult,cast:usize) {
        let cast = BigRational::from_integer(cast.into());
        for round in &result.rounds {
            let mut sum = round.tally.iter().map(|t|t.0.clone()).sum::<BigRational>();
            sum += round.exhausted.0.clone();
            sum += round.overvote.0.clone();
            sum += round.skipped.0.clone();
            assert_eq!(cast,sum,"conservation failed in round {}",round.round);
        }
    }

    fn stv_config() -> TabulationConfig {
        let mut config = TabulationConfig::default();
        config.tabulation_mode = TabulationMode::MultiSeatStv;
        config.number_of_winners = NumberOfSeats(2);
        config.non_integer_winning_threshold = true;
        config
    }

    fn stv_fixture() -> (ContestMetadata,Vec<Ballot>) {
        let metadata = metadata(&["A","B","C","D","E"]);
        let votes = ballots(&metadata,&[
            (9,&["A","C","B"]),
            (5,&["B","A"]),
            (4,&["C","B","A"]),
            (3,&["D","E"]),
            (3,&["E","D","C"]),
        ]);
        (metadata,votes)
    }

    #[test]
    fn votes_are_conserved_at_every_round_boundary() {
        let (metadata,votes) = stv_fixture();
        let result = count(&metadata,&votes,&stv_config());
        assert_conserved(&result,votes.len());
        assert_eq!(2,result.elected_in_order.len());
    }

    #[test]
    fn tabulating_twice_gives_byte_identical_results() {
        let (metadata,votes) = stv_fixture();
        let config = stv_config();
        let first = serde_json::to_string(&count(&metadata,&votes,&config)).unwrap();
        let second = serde_json::to_string(&count(&metadata,&votes,&config)).unwrap();
        assert_eq!(first,second);
    }

    #[test]
    fn ballot_order_does_not_change_the_result() {
        let (metadata,votes) = stv_fixture();
        let config = stv_config();
        let forward = count(&metadata,&votes,&config);
        let mut reversed = votes.clone();
        reversed.reverse();
        let backward = count(&metadata,&reversed,&config);
        assert_eq!(forward,backward);
    }

    #[test]
    fn seeded_ties_reproduce_and_never_elect_too_many() {
        let metadata = metadata(&["A","B","C","D"]);
        let votes = ballots(&metadata,&[(3,&["A"]),(3,&["B"]),(3,&["C"]),(3,&["D"])]);
        let mut config = TabulationConfig::default();
        config.tie_break_mode = TieBreakMode::Random;
        config.random_seed = 11;
        let first = count(&metadata,&votes,&config);
        let second = count(&metadata,&votes,&config);
        assert_eq!(first,second);
        assert!(first.elected_in_order.len()<=1);
        assert!(!first.tie_break_log.is_empty());
        assert_conserved(&first,votes.len());
    }

    #[test]
    fn batch_eliminations_are_sound() {
        let (metadata,votes) = stv_fixture();
        let result = count(&metadata,&votes,&stv_config());
        for round in &result.rounds {
            if round.eliminated.len()>1 && round.tie_breaks.is_empty() {
                let batch_total : BigRational = round.eliminated.iter().map(|c|round.tally[c.0].0.clone()).sum();
                let lowest_survivor = round.tally.iter().enumerate()
                    .filter(|(i,_)|!round.eliminated.contains(&CandidateIndex(*i)))
                    .map(|(_,t)|t.0.clone())
                    .filter(|t|!t.is_zero())
                    .min();
                if let Some(lowest) = lowest_survivor {
                    assert!(batch_total<lowest,"unsound batch in round {}",round.round);
                }
            }
        }
    }

    #[test]
    fn elected_and_eliminated_are_terminal_and_never_overlap() {
        let (metadata,votes) = stv_fixture();
        let result = count(&metadata,&votes,&stv_config());
        let elected : Vec<_> = result.rounds.iter().flat_map(|r|r.elected.iter().copied()).collect();
        let eliminated : Vec<_> = result.rounds.iter().flat_map(|r|r.eliminated.iter().copied()).collect();
        for candidate in &elected {
            assert_eq!(1,elected.iter().filter(|c|*c==candidate).count());
            assert!(!eliminated.contains(candidate));
        }
        for candidate in &eliminated {
            assert_eq!(1,eliminated.iter().filter(|c|*c==candidate).count());
        }
        assert_eq!(elected,result.elected_in_order);
    }

    #[test]
    fn weights_reported_in_transfers_never_exceed_the_source_tally() {
        let (metadata,votes) = stv_fixture();
        let result = count(&metadata,&votes,&stv_config());
        for round in &result.rounds {
            for transfer in &round.transfers {
                let moved : BigRational = transfer.to.iter().map(|(_,t)|t.0.clone()).sum::<BigRational>()+transfer.exhausted.0.clone();
                assert!(moved<=round.tally[transfer.from.0].0,"transfer in round {} moved more than the candidate held",round.round);
            }
        }
    }
}
