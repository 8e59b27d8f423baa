use crate::domain::models::PackReport;
use crossterm::{
    ExecutableCommand,
    style::{Color, ResetColor, SetForegroundColor},
};
use log::Level;
use std::io::{self, Write};

/// Terminal color shared by log lines and user-facing messages of a level.
pub fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Cyan,
        Level::Trace => Color::Magenta,
    }
}

fn write_colored<W: Write>(out: &mut W, color: Color, line: &str) -> io::Result<()> {
    out.execute(SetForegroundColor(color))?;
    writeln!(out, "{}", line)?;
    out.execute(ResetColor)?;
    Ok(())
}

pub fn write_notice<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    write_colored(out, level_color(Level::Warn), message)
}

/// Prints the success line, one warning per skipped file, and a tally.
pub fn write_summary<W: Write>(out: &mut W, report: &PackReport) -> io::Result<()> {
    writeln!(out)?;
    write_colored(
        out,
        level_color(Level::Info),
        &format!(
            "📦 Repository packed successfully into: {}",
            report.output_path.display()
        ),
    )?;

    for skipped in &report.skipped {
        write_colored(
            out,
            level_color(Level::Warn),
            &format!("⚠ Skipped {}: {}", skipped.path.display(), skipped.reason),
        )?;
    }

    writeln!(
        out,
        "{} files packed, {} ignored by extension, {} skipped",
        report.packed.len(),
        report.ignored_count,
        report.skipped.len()
    )?;
    Ok(())
}
