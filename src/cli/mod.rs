use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod events;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8000")]
        port: String,
    },
    /// List a month of events and print them as JSON
    Events {
        #[arg(long)]
        calendar_id: String,
        #[arg(long)]
        year: i32,
        /// Month of the year, 1-12
        #[arg(long)]
        month: i32,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Events {
            calendar_id,
            year,
            month,
        }) => {
            events::run(&calendar_id, year, month).await?;
        }
        None => {}
    }

    Ok(())
}
