//! Import CLI entry point.
//!
//! # Responsibility
//! - Parse the run arguments, bootstrap logging, run one import and
//!   print the run report.
//! - Exit non-zero when the run ends in the failed phase or cannot
//!   start at all.

use gardenkb_core::{
    default_log_level, init_logging, open_db, ImportConfig, ImportService, ImportSources,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: gardenkb <db-path> <data-dir> [--config <file>] [--log-dir <dir>] [--log-level <level>]";

struct Args {
    db_path: PathBuf,
    data_dir: PathBuf,
    config_path: Option<PathBuf>,
    log_dir: Option<String>,
    log_level: Option<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut config_path = None;
    let mut log_dir = None;
    let mut log_level = None;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(
                    raw.next().ok_or("--config requires a file path")?,
                ));
            }
            "--log-dir" => {
                log_dir = Some(raw.next().ok_or("--log-dir requires a directory")?);
            }
            "--log-level" => {
                log_level = Some(raw.next().ok_or("--log-level requires a level")?);
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => {
                return Err(format!("unknown option `{other}`\n{USAGE}"));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let db_path = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("missing <db-path>\n{USAGE}"))?;
    let data_dir = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("missing <data-dir>\n{USAGE}"))?;
    if positional.next().is_some() {
        return Err(format!("too many arguments\n{USAGE}"));
    }

    Ok(Args {
        db_path,
        data_dir,
        config_path,
        log_dir,
        log_level,
    })
}

fn effective_log_level(requested: Option<&str>) -> &str {
    requested.unwrap_or(default_log_level())
}

fn run(args: Args) -> Result<bool, String> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = effective_log_level(args.log_level.as_deref());
        init_logging(level, log_dir)?;
    }

    let config = match args.config_path.as_deref() {
        Some(path) => ImportConfig::load(path).map_err(|err| err.to_string())?,
        None => ImportConfig::default(),
    };

    let sources = ImportSources::load_from_dir(&args.data_dir);
    let mut conn = open_db(&args.db_path).map_err(|err| err.to_string())?;

    let mut service = ImportService::new(&mut conn, config);
    let report = service.run(&sources);
    print!("{report}");

    if !report.succeeded() {
        error!(
            "event=run_failed module=cli status=error phase={}",
            report.phase.as_str()
        );
    }
    Ok(report.succeeded())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("gardenkb: {message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{effective_log_level, parse_args};
    use std::path::Path;

    fn args<'a>(raw: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        raw.iter().map(|arg| arg.to_string())
    }

    #[test]
    fn parse_args_accepts_positionals_and_options() {
        let parsed = parse_args(args(&[
            "garden.db",
            "/data",
            "--config",
            "override.json",
            "--log-level",
            "debug",
        ]))
        .unwrap();

        assert_eq!(parsed.db_path, Path::new("garden.db"));
        assert_eq!(parsed.data_dir, Path::new("/data"));
        assert_eq!(parsed.config_path.as_deref(), Some(Path::new("override.json")));
        assert_eq!(parsed.log_level.as_deref(), Some("debug"));
        assert!(parsed.log_dir.is_none());
    }

    #[test]
    fn parse_args_rejects_missing_positionals_and_unknown_options() {
        assert!(parse_args(args(&["garden.db"])).is_err());
        assert!(parse_args(args(&["garden.db", "/data", "--verbose"])).is_err());
        assert!(parse_args(args(&["garden.db", "/data", "--config"])).is_err());
    }

    #[test]
    fn effective_log_level_prefers_the_requested_level() {
        let requested = Some("warn".to_string());
        assert_eq!(effective_log_level(requested.as_deref()), "warn");
        assert!(!effective_log_level(None).is_empty());
    }
}
