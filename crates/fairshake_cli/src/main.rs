//! `fairshake` command-line entry point.
//!
//! # Responsibility
//! - `ingest [CONFIG]`: run the dbGaP ingestion batch.
//! - `summary <project|rubric|metric> <ID> [CONFIG]`: print score statistics.

use clap::{Parser, Subcommand};
use fairshake_core::db::Connection;
use fairshake_core::ingest::{dbgap_checklist, DirectoryArchive, FtpArchive};
use fairshake_core::{
    default_log_level, init_logging, open_db, single_query, ArchiveKind, FairshakeConfig,
    IngestReport, Ingestor, ScopeKind, SqliteAssessmentRepository, SqliteCatalogRepository,
};
use log::{error, info, warn};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fairshake", version, about = "FAIRshake assessment store utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the dbGaP ingestion batch.
    Ingest {
        /// Config file; falls back to FAIRSHAKE_CONFIG, then defaults.
        config: Option<String>,
    },
    /// Print score statistics for one project, rubric or metric.
    Summary {
        #[arg(value_parser = parse_scope)]
        kind: ScopeKind,
        id: i64,
        config: Option<String>,
    },
}

fn parse_scope(value: &str) -> Result<ScopeKind, String> {
    ScopeKind::parse(value)
        .ok_or_else(|| format!("unknown summary scope `{value}`; expected project|rubric|metric"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    let config_path = match &command {
        Command::Ingest { config } | Command::Summary { config, .. } => config.as_deref(),
    };
    let config = FairshakeConfig::from_sources(config_path).map_err(|err| err.to_string())?;
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(default_log_level());
    init_logging(level, &config.logging.dir, true)?;

    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    match command {
        Command::Ingest { .. } => run_ingest(&config, &conn),
        Command::Summary { kind, id, .. } => run_summary(&conn, kind, id),
    }
}

fn run_ingest(config: &FairshakeConfig, conn: &Connection) -> Result<(), String> {
    let settings = config.ingest.clone();
    let rules = dbgap_checklist().map_err(|err| err.to_string())?;
    let ingestor = Ingestor::new(
        SqliteCatalogRepository::new(conn),
        SqliteAssessmentRepository::new(conn),
        settings.clone(),
        rules,
    );

    let report = match settings.archive {
        ArchiveKind::Ftp => {
            let mut archive =
                FtpArchive::connect(&settings.host, settings.port).map_err(|err| err.to_string())?;
            let report = ingestor.run(&mut archive).map_err(|err| err.to_string())?;
            if let Err(err) = archive.quit() {
                warn!("event=archive_quit module=cli status=error error={err}");
            }
            report
        }
        ArchiveKind::Directory => {
            let root = settings
                .mirror_dir
                .clone()
                .ok_or_else(|| "ingest.mirror_dir is not set".to_string())?;
            let mut archive = DirectoryArchive::new(root).map_err(|err| err.to_string())?;
            ingestor.run(&mut archive).map_err(|err| err.to_string())?
        }
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "run {}: {} studies ingested, {} failed",
        report.run_id,
        report.created.len(),
        report.failures.len()
    );
    for record in &report.created {
        println!(
            "  ok     {} object={} assessment={} answers={}",
            record.study, record.object_id, record.assessment_id, record.answers
        );
    }
    for failure in &report.failures {
        println!(
            "  failed {} stage={} {}",
            failure.study,
            failure.stage.as_str(),
            failure.error
        );
    }
}

fn run_summary(conn: &Connection, kind: ScopeKind, id: i64) -> Result<(), String> {
    let mut stdout = std::io::stdout();
    match single_query(conn, kind, id, &mut stdout).map_err(|err| err.to_string())? {
        Some(report) => {
            let histogram = if report.histogram.is_some() {
                "rendered"
            } else {
                "suppressed"
            };
            info!(
                "event=cli_summary module=cli status=ok scope={} id={} histogram={}",
                kind.as_str(),
                id,
                histogram
            );
        }
        None => println!("No answers recorded for {} {}", kind.as_str(), id),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use fairshake_core::ScopeKind;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("fairshake").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn parses_ingest_with_and_without_config() {
        assert_eq!(parse(&["ingest"]).unwrap(), Command::Ingest { config: None });
        assert_eq!(
            parse(&["ingest", "fairshake.toml"]).unwrap(),
            Command::Ingest {
                config: Some("fairshake.toml".into())
            }
        );
    }

    #[test]
    fn parses_summary_scope_and_id() {
        assert_eq!(
            parse(&["summary", "rubric", "8"]).unwrap(),
            Command::Summary {
                kind: ScopeKind::Rubric,
                id: 8,
                config: None
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["summary", "team", "1"]).is_err());
        assert!(parse(&["summary", "project", "x"]).is_err());
        assert!(parse(&["ingest", "a", "b"]).is_err());
    }
}
