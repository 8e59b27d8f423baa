use crate::domain::models::{PackEvent, PackReport};
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{Clear, ClearType},
};
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Reads a whole regular file as UTF-8 text. Binary or otherwise
/// undecodable content surfaces as an `InvalidData` error; sockets, FIFOs
/// and device nodes are refused with `InvalidInput` without being opened.
pub fn read_file_text(path: &Path) -> io::Result<String> {
    if !path.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }

    debug!("Reading file contents: {}", path.display());
    let contents = fs::read_to_string(path)?;
    debug!("Read {} bytes from file", contents.len());
    Ok(contents)
}

/// True when both paths resolve to the same file on disk.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Live progress line for a packing run.
pub struct PackProgress {
    start_time: Instant,
    update_interval: Duration,
    last_update: Instant,
    visited_count: usize,
    packed_count: usize,
    skipped_count: usize,
}

impl PackProgress {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            update_interval: Duration::from_millis(250),
            last_update: Instant::now(),
            visited_count: 0,
            packed_count: 0,
            skipped_count: 0,
        }
    }

    pub fn record(&mut self, event: PackEvent<'_>) {
        self.visited_count += 1;
        match event {
            PackEvent::Packed(_) => self.packed_count += 1,
            PackEvent::Unreadable(_) => self.skipped_count += 1,
            PackEvent::Ignored(_) => {}
        }
    }

    pub fn update(&mut self, event: PackEvent<'_>) -> io::Result<()> {
        self.record(event);

        let now = Instant::now();
        if now.duration_since(self.last_update) >= self.update_interval {
            self.last_update = now;
            let elapsed = now.duration_since(self.start_time).as_secs_f32();
            let files_per_sec = if elapsed > 0.0 {
                self.visited_count as f32 / elapsed
            } else {
                0.0
            };

            let spinner_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let spinner_idx =
                ((self.start_time.elapsed().as_millis() / 100) % spinner_chars.len() as u128) as usize;

            let mut stdout = io::stdout();
            stdout.execute(cursor::SavePosition)?;
            stdout.execute(Clear(ClearType::CurrentLine))?;
            write!(
                stdout,
                "{} Packing files: {} visited, {} packed, {} skipped ({:.1} files/sec)",
                spinner_chars[spinner_idx],
                self.visited_count,
                self.packed_count,
                self.skipped_count,
                files_per_sec
            )?;
            stdout.flush()?;
            stdout.execute(cursor::RestorePosition)?;
        }
        Ok(())
    }

    pub fn finish(&self, report: &PackReport) -> io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f32();

        let mut stdout = io::stdout();
        stdout.execute(Clear(ClearType::CurrentLine))?;
        writeln!(
            stdout,
            "✓ Pack complete: {} files packed, {} ignored, {} skipped in {:.1}s",
            report.packed.len(),
            report.ignored_count,
            report.skipped.len(),
            elapsed
        )?;
        Ok(())
    }
}

impl Default for PackProgress {
    fn default() -> Self {
        Self::new()
    }
}
