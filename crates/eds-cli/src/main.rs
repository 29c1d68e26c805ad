//! `eds-lookup`: fetch one person from EDS and print the record as JSON.
//!
//! Credentials come from `EDS_URL`, `EDS_USER` and `EDS_PASSWORD`, read from
//! the environment after loading `.env` (or `--env-file`). With `--dsml-file`
//! a saved response is resolved instead and no request is made.
//!
//! The record goes to stdout. Logs and errors go to stderr; errors are
//! rendered as a JSON error response.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use eds_core::error::{ErrorDetail, ErrorResponse};
use eds_core::{EdsConfig, Error};
use eds_user::{DirectoryClient, DirectoryRecord};

const APP_DEBUG: &str = "APP_DEBUG";

/// Look a person up in the Enterprise Directory Service.
#[derive(Parser, Debug)]
#[command(name = "eds-lookup", version, about = "Look a person up in EDS and print the record as JSON")]
struct Cli {
    /// User id (NetID) to look up. Required unless --dsml-file is given.
    user_id: Option<String>,

    /// Return every value of each mapped attribute instead of the first.
    #[arg(long)]
    all_values: bool,

    /// Add or replace a mapping entry; may be repeated.
    #[arg(long = "attr", value_name = "FIELD=ATTRIBUTE", value_parser = parse_mapping_entry)]
    attrs: Vec<(String, String)>,

    /// Resolve a saved DSML response instead of querying EDS.
    #[arg(long, value_name = "PATH", conflicts_with = "user_id")]
    dsml_file: Option<PathBuf>,

    /// Load environment variables from this file instead of ./.env.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

fn parse_mapping_entry(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, attribute)) if !field.trim().is_empty() && !attribute.trim().is_empty() => {
            Ok((field.trim().to_string(), attribute.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=ATTRIBUTE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = load_env(cli.env_file.as_deref()) {
        report(&e, cli.pretty);
        return ExitCode::FAILURE;
    }
    init_logging();

    match run(&cli).await.and_then(|record| render(&record, cli.pretty)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e, cli.pretty);
            ExitCode::FAILURE
        }
    }
}

fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            // A missing ./.env is fine; the process environment may be enough.
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn init_logging() {
    let fallback = if app_debug(std::env::var(APP_DEBUG).ok().as_deref()) {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn app_debug(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
}

async fn run(cli: &Cli) -> Result<DirectoryRecord> {
    let mut client = match &cli.dsml_file {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("failed to read DSML file {}", path.display()))?;
            debug!(path = %path.display(), bytes = raw.len(), "resolving saved DSML response");
            DirectoryClient::from_dsml(raw)?
        }
        None => {
            let user_id = cli
                .user_id
                .as_deref()
                .context("a user id is required unless --dsml-file is given")?;
            let config = EdsConfig::from_env()?;
            let mut client = DirectoryClient::from_config(&config)?;
            client.fetch(user_id).await?;
            client
        }
    };

    client.extend_attributes(cli.attrs.iter().cloned());
    Ok(client.resolve_all(!cli.all_values)?)
}

fn render(record: &DirectoryRecord, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    Ok(json)
}

fn report(e: &anyhow::Error, pretty: bool) {
    let response = error_response(e);
    let rendered = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };
    match rendered {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("Error: {e:#}"),
    }
}

fn error_response(e: &anyhow::Error) -> ErrorResponse {
    match e.downcast_ref::<Error>() {
        Some(eds) => {
            if eds.should_log() {
                error!(code = eds.error_code(), "EDS lookup failed: {eds}");
            }
            eds.clone().into_error_response()
        }
        None => ErrorResponse {
            error: ErrorDetail {
                code: "CLI_ERROR".to_string(),
                message: format!("{e:#}"),
                status: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_lookup_arguments() {
        let cli = Cli::try_parse_from([
            "eds-lookup",
            "--all-values",
            "--attr",
            "status_history=studentStatusHistory",
            "--attr",
            "email = mailAlternateAddress",
            "jdavis",
        ])
        .unwrap();

        assert_eq!(cli.user_id.as_deref(), Some("jdavis"));
        assert!(cli.all_values);
        assert!(!cli.pretty);
        assert_eq!(
            cli.attrs,
            vec![
                ("status_history".to_string(), "studentStatusHistory".to_string()),
                ("email".to_string(), "mailAlternateAddress".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_mapping_entry() {
        assert!(Cli::try_parse_from(["eds-lookup", "--attr", "netid", "jdavis"]).is_err());
        assert!(parse_mapping_entry("=uid").is_err());
        assert!(parse_mapping_entry("netid=").is_err());
    }

    #[test]
    fn app_debug_flag_values() {
        assert!(app_debug(Some("true")));
        assert!(app_debug(Some("TRUE")));
        assert!(app_debug(Some("1")));
        assert!(!app_debug(Some("false")));
        assert!(!app_debug(None));
    }

    #[test]
    fn eds_errors_keep_their_code() {
        let err = anyhow::Error::new(Error::http_status(404, "EDS entry not found"));
        let response = error_response(&err);
        assert_eq!(response.error.code, "TRANSPORT_ERROR");
        assert_eq!(response.error.status, Some(404));
    }

    #[test]
    fn other_errors_are_cli_errors() {
        let err = anyhow::anyhow!("a user id is required unless --dsml-file is given");
        let response = error_response(&err);
        assert_eq!(response.error.code, "CLI_ERROR");
        assert!(response.error.message.contains("user id is required"));
    }

    #[tokio::test]
    async fn resolves_saved_dsml_file() {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../eds-user/tests/fixtures/jdavis.xml");
        let cli = Cli::try_parse_from([
            "eds-lookup",
            "--dsml-file",
            fixture.to_str().unwrap(),
            "--attr",
            "status_history=studentStatusHistory",
        ])
        .unwrap();

        let record = run(&cli).await.unwrap();
        assert_eq!(record.get_str("netid"), Some("jdavis"));
        assert_eq!(record.get_str("status_history"), Some("2004-2F:UGRD"));

        let json = render(&record, false).unwrap();
        assert!(json.starts_with(r#"{"netid":"jdavis""#));
    }

    #[test]
    fn user_id_and_dsml_file_are_exclusive() {
        let err = Cli::try_parse_from(["eds-lookup", "--dsml-file", "saved.xml", "jdavis"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[tokio::test]
    async fn missing_user_id_without_file_fails() {
        let cli = Cli::try_parse_from(["eds-lookup"]).unwrap();
        let err = run(&cli).await.unwrap_err();
        assert!(err.to_string().contains("user id is required"));
    }
}
