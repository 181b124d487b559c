// Copyright the ConcreteRCV developers.
// This file is part of ConcreteRCV.
// ConcreteRCV is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// ConcreteRCV is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with ConcreteRCV.  If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use log::info;
use serde::{Serialize,Deserialize};
use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use rcv::cast_vote_record::RawCastVoteRecord;
use rcv::config::TabulationConfig;
use rcv::contest_metadata::ContestMetadata;
use rcv::contest_result::ContestReport;
use rcv::observer::{NoopObserver, TabulationEvent, TabulationObserver};
use rcv::tabulation::tabulate_raw;
use rcv::tie_resolution::NoOracle;

/// Count a ranked choice contest from a contest file holding the candidate
/// roster, the tabulation configuration, and the cast vote records.
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// The contest .json file to count.
    contest : PathBuf,

    /// An optional file to store the result in.
    /// If not specified, defaults to the contest file name with a .result.json suffix.
    #[arg(short, long)]
    output : Option<PathBuf>,

    /// Narrate each round of the count to the log.
    #[arg(short, long)]
    verbose : bool,
}

/// Everything needed to count one contest, as produced by the format converters.
#[derive(Serialize,Deserialize)]
struct ContestFile {
    metadata : ContestMetadata,
    config : TabulationConfig,
    ballots : Vec<RawCastVoteRecord>,
}

/// Renders engine events through the logger.
struct LogObserver<'a> {
    metadata : &'a ContestMetadata,
}

impl <'a> TabulationObserver for LogObserver<'a> {
    fn handle(&mut self,event:TabulationEvent<'_>) {
        match event {
            TabulationEvent::RoundBegun{round} => info!("Round {}",round),
            TabulationEvent::TallyComputed{tally,..} => {
                for candidate in self.metadata.candidate_indices() {
                    info!("{:>12} {}",tally.by_candidate[candidate.0].to_string(),self.metadata.candidate(candidate).name);
                }
                info!("{:>12} exhausted, {} overvote, {} skipped",tally.exhausted.to_string(),tally.overvote,tally.skipped);
            }
            TabulationEvent::ThresholdComputed{threshold} => info!("Winning threshold {}{}",threshold.value,if threshold.strict {" (exclusive)"} else {""}),
            TabulationEvent::CandidateElected{candidate,..} => info!("Elected {}",self.metadata.candidate(candidate).name),
            TabulationEvent::CandidatesEliminated{candidates,..} => info!("Eliminated {}",self.metadata.candidate_list_to_string(candidates)),
            TabulationEvent::SurplusTransferred{candidate,fraction,..} => info!("Transferring the surplus of {} at {}",self.metadata.candidate(candidate).name,fraction),
            TabulationEvent::TieBroken{decision} => info!("Tie between {} went against {} ({})",self.metadata.candidate_list_to_string(&decision.tied),self.metadata.candidate(decision.chosen).name,decision.explanation),
            TabulationEvent::TabulationFinished{rounds,elected} => info!("Finished after {} rounds, elected {}",rounds,self.metadata.candidate_list_to_string(elected)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt : Opts = Opts::parse();

    let contest : ContestFile = {
        let file = File::open(&opt.contest)?;
        serde_json::from_reader(file)?
    };

    let mut result = if opt.verbose {
        let mut observer = LogObserver{metadata:&contest.metadata};
        tabulate_raw(&contest.metadata,&contest.ballots,&contest.config,&NoOracle,&mut observer)?
    } else {
        tabulate_raw(&contest.metadata,&contest.ballots,&contest.config,&NoOracle,&mut NoopObserver)?
    };
    result.generated_at = Some(format!("{}",SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs()));

    for (position,candidate) in result.elected_in_order.iter().enumerate() {
        println!("{}. {}",position+1,contest.metadata.candidate(*candidate).name);
    }

    let output_file = match &opt.output {
        None => {
            let name = opt.contest.file_name().map(|o|o.to_string_lossy()).unwrap_or_default();
            let name = name.trim_end_matches(".json");
            opt.contest.with_file_name(name.to_string()+".result.json")
        }
        Some(path) => path.clone(),
    };
    let report = ContestReport{ metadata: contest.metadata, result };
    report.save(&output_file)?;

    Ok(())
}
