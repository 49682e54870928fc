use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    Ok(match level {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        _ => bail!("unknown log level '{}'", level),
    })
}

/// Installs the global logger: stdout, plus `file` when given.
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let level = parse_level(level)?;

    let is_terminal = io::stdout().is_terminal();
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .debug(Color::Magenta);

    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = humantime::format_rfc3339_millis(SystemTime::now());
            if is_terminal {
                out.finish(format_args!(
                    "{} [{}] {}",
                    now,
                    colors.color(record.level()),
                    message
                ))
            } else {
                out.finish(format_args!("{} [{}] {}", now, record.level(), message))
            }
        })
        .chain(io::stdout());

    let mut dispatch = fern::Dispatch::new()
        // actix and reqwest internals are too chatty at debug level
        .level_for("actix_server", LevelFilter::Info)
        .level_for("actix_http", LevelFilter::Info)
        .level_for("reqwest", LevelFilter::Info)
        .level_for("hyper_util", LevelFilter::Info)
        .level(level)
        .chain(stdout);

    if let Some(path) = file {
        let file = fern::log_file(path)
            .with_context(|| format!("open log file '{}'", path.display()))?;
        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} [{}] {}",
                    humantime::format_rfc3339_millis(SystemTime::now()),
                    record.level(),
                    message
                ))
            })
            .chain(file);
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("init logger")?;
    Ok(())
}
