use crate::infra::output::level_color;
use crossterm::style::Stylize;
use env_logger::Builder;
use log::Level;
use std::fmt::Display;
use std::io::Write;

/// Overrides the `-v` derived filter, e.g. `REPO_PACKER_LOG_LEVEL=walkdir=debug,info`.
pub const LOG_LEVEL_ENV: &str = "REPO_PACKER_LOG_LEVEL";

fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

fn render_line(level: Level, timestamp: impl Display, message: impl Display) -> String {
    let tag = format!("[{}]", level).with(level_color(level));
    format!("{} [{}] {}", tag, timestamp, message)
}

pub fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let env = env_logger::Env::default().filter_or(LOG_LEVEL_ENV, default_filter(verbosity));

    Builder::from_env(env)
        .format(|buf, record| {
            let line = render_line(record.level(), buf.timestamp(), record.args());
            writeln!(buf, "{}", line)
        })
        .format_timestamp_secs()
        .try_init()
}
