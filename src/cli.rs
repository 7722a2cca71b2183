use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use crate::commands;
use crate::env_loader::{DotenvLoadOutcome, load_dotenv};

#[derive(Debug, Parser)]
#[command(name = "kronos-eye")]
#[command(about = "Full moon and Saturn ingress toasts for Kodi")]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-shot pass: boot wait, moon and Saturn checks, state save.
    Run(RunArgs),
    Status,
    Phase(PhaseArgs),
}

#[derive(Debug, Args, Default)]
pub struct RunArgs {
    #[arg(long)]
    pub boot_wait_secs: Option<u64>,
    /// Log toasts instead of sending them to the host.
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args, Default)]
pub struct PhaseArgs {
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    raw.trim()
        .parse::<NaiveDate>()
        .map_err(|err| format!("expected YYYY-MM-DD, got `{raw}`: {err}"))
}

fn print_report(report: &commands::CommandReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("command: {}", report.command);
    println!("ok: {}", report.ok);
    if !report.details.is_empty() {
        println!("details:");
        for detail in &report.details {
            println!("- {detail}");
        }
    }
    if !report.issues.is_empty() {
        println!("issues:");
        for issue in &report.issues {
            println!("- {issue}");
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let dotenv = load_dotenv();
    crate::logging::init();
    match &dotenv {
        DotenvLoadOutcome::LoadedDefault => info!("loaded .env from working directory"),
        DotenvLoadOutcome::LoadedFallback(path) => info!(path = %path.display(), "loaded env file"),
        DotenvLoadOutcome::Missing => debug!("no env file found"),
    }
    let cli = Cli::parse();

    let report = match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Run(args) => commands::run::run(&commands::run::RunOptions {
            boot_wait_secs: args.boot_wait_secs,
            dry_run: args.dry_run,
            date: args.date,
        })?,
        Command::Status => commands::status::run()?,
        Command::Phase(args) => commands::phase::run(args.date)?,
    };

    print_report(&report, cli.json)?;

    if report.ok {
        Ok(())
    } else {
        std::process::exit(2);
    }
}
