use std::{
    path::PathBuf,
    process::ExitCode,
    sync::PoisonError,
};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use votan::{
    election::{Authority, Voter},
    sdk::api::{VotanError, VotanResult},
    token,
};

/// CLI, mostly for demonstrations and local dry runs
#[derive(Parser, Debug)]
#[clap(name = "votan")]
#[clap(about = "A homomorphic e-voting demonstration driver")]
#[clap(version, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the fixed eight-voter election scenario
    Demo(DemoCli),
}

#[derive(Debug, Args)]
struct DemoCli {
    /// Bit width of the safe prime p
    #[clap(short = 'b', long = "bits", default_value_t = 128)]
    bits: u64,
    /// Directory to write the confidential token sheet into
    #[clap(short = 'o', long = "export-tokens")]
    export_dir: Option<PathBuf>,
}

const QUESTION: &str = "¿Está de acuerdo con extender el horario de clases?";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let result = match args.command {
        Commands::Demo(cli) => demo(cli),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("demo failed: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn demo(cli: DemoCli) -> VotanResult<()> {
    let voter_ids: Vec<String> = [
        "Alice_2024",
        "Bob_2024",
        "Carlos_2024",
        "Diana_2024",
        "Elena_2024",
        "Franco_2024",
        "Gloria_2024",
        "Héctor_2024",
    ]
    .iter()
    .map(|id| id.to_string())
    .collect();
    let choices = [true, false, true, true, false, true, false, true];

    let mut authority = Authority::new(cli.bits);
    let public_key = authority.setup_election()?;
    let tokens = authority.register_voters(&voter_ids)?;

    if let Some(dir) = &cli.export_dir {
        let sheet: Vec<_> = voter_ids.iter().map(|id| tokens[id].clone()).collect();
        let path = token::export_tokens(dir, QUESTION, &sheet).map_err(|err| {
            error!("token export failed: {}", err);
            VotanError::Fatal
        })?;
        info!("token sheet written to {}", path.display());
    }

    let mut center = authority.voting_center()?;
    info!("question: {}", QUESTION);
    for (voter_id, choice) in voter_ids.iter().zip(choices) {
        let voter = Voter::new(voter_id.clone(), tokens[voter_id].clone());
        let ballot = voter.cast_vote(choice, &public_key)?;
        let accepted = center.receive_vote(ballot);
        info!(
            "ballot from {}: {}",
            voter_id,
            if accepted { "accepted" } else { "rejected" }
        );
    }

    let stats = center.statistics();
    let tallying = authority.tallying_center()?;
    let (yes, no) = tallying.tally_votes(&center.valid_votes())?;

    info!("result: {} SÍ / {} NO", yes, no);
    info!(
        "registered {}, cast {}, valid {}, rejected {}, participation {:.2}%",
        stats.registered_voters,
        stats.total_votes,
        stats.valid_votes,
        stats.rejected_votes,
        stats.participation_rate
    );

    let audit = authority.audit_log();
    let log = audit.lock().unwrap_or_else(PoisonError::into_inner);
    if !log.verify_integrity() {
        error!("audit chain failed verification");
        return Err(VotanError::IntegrityBroken);
    }
    info!("audit chain intact ({} events)", log.len());

    Ok(())
}
