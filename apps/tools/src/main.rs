use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use storage::VoteLog;

#[derive(Parser, Debug)]
#[command(name = "votes-tools")]
struct Cli {
    #[arg(long, env = "VOTES_LOG_PATH", default_value = "./data/votes-log.jsonl")]
    votes_log: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the log as CSV to stdout or a file.
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Clear the log.
    Reset,
    /// Print how many votes are logged.
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = VoteLog::new(&cli.votes_log);

    match cli.command {
        Command::Export { output } => {
            let csv = log
                .export_csv()
                .await
                .with_context(|| format!("failed to export '{}'", cli.votes_log.display()))?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{csv}"),
            }
        }
        Command::Reset => {
            log.reset()
                .await
                .with_context(|| format!("failed to reset '{}'", cli.votes_log.display()))?;
            println!("cleared {}", cli.votes_log.display());
        }
        Command::Count => {
            let votes = log
                .read_all()
                .await
                .with_context(|| format!("failed to read '{}'", cli.votes_log.display()))?;
            println!("{}", votes.len());
        }
    }

    Ok(())
}
