use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};
use crate::logging;

/// Fold daily note files into monthly archive files.
#[derive(Debug, Parser)]
#[command(name = "notefold", version, about)]
struct Cli {
    /// Log at debug level (NOTEFOLD_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Organize notes older than archive.after_days into monthly archives
    Archive {
        /// Delete individual note files after archiving
        #[arg(short = 'x', long)]
        delete: bool,

        /// Do not write archive files (useful for deleting previously archived notes)
        #[arg(short = 'n', long = "no-write", alias = "nowrite")]
        no_write: bool,
    },
    /// Show resolved paths and configuration
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = match cli.command {
        Command::Archive { delete, no_write } => {
            commands::archive::run(&commands::archive::ArchiveOptions { delete, no_write })?
        }
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
