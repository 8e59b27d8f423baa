use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

/// Navigation state of the directory browser, kept free of any terminal
/// handling so it can be driven directly.
pub struct DirBrowser {
    current: PathBuf,
    entries: Vec<PathBuf>,
    state: ListState,
}

impl DirBrowser {
    pub fn new(start: &Path) -> io::Result<Self> {
        let mut browser = Self {
            current: start.to_path_buf(),
            entries: Vec::new(),
            state: ListState::default(),
        };
        browser.reload()?;
        Ok(browser)
    }

    fn reload(&mut self) -> io::Result<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.current)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        entries.sort();
        debug!(
            "Browsing {} ({} subdirectories)",
            self.current.display(),
            entries.len()
        );

        self.entries = entries;
        self.state
            .select(if self.entries.is_empty() { None } else { Some(0) });
        Ok(())
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn highlighted(&self) -> Option<&Path> {
        self.state
            .selected()
            .and_then(|i| self.entries.get(i))
            .map(PathBuf::as_path)
    }

    pub fn next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Descends into the highlighted directory. On a read failure the
    /// browser stays where it was.
    pub fn enter(&mut self) -> io::Result<()> {
        let Some(target) = self.highlighted().map(Path::to_path_buf) else {
            return Ok(());
        };
        let previous = std::mem::replace(&mut self.current, target);
        if let Err(e) = self.reload() {
            self.current = previous;
            self.reload()?;
            return Err(e);
        }
        Ok(())
    }

    /// Moves to the parent directory, highlighting the one just left.
    pub fn leave(&mut self) -> io::Result<()> {
        let Some(parent) = self.current.parent().map(Path::to_path_buf) else {
            return Ok(());
        };
        let left = std::mem::replace(&mut self.current, parent);
        self.reload()?;
        if let Some(pos) = self.entries.iter().position(|p| p == &left) {
            self.state.select(Some(pos));
        }
        Ok(())
    }
}

struct App {
    browser: DirBrowser,
    title: String,
    help_message: String,
    status: String,
}

impl App {
    fn new(browser: DirBrowser, title: String) -> App {
        App {
            browser,
            title,
            help_message: String::from(
                "↑/↓: Navigate | →/Enter: Open | ←/Backspace: Up | Space: Pick highlighted | s: Pick current | q: Cancel",
            ),
            status: String::new(),
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        app.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, chunks[0]);

    let selected_style = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let items: Vec<ListItem> = app
        .browser
        .entries()
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            ListItem::new(Span::styled(
                format!("► {}", name),
                Style::default().fg(Color::Blue),
            ))
        })
        .collect();

    let dir_list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}", app.browser.current().display())),
        )
        .highlight_style(selected_style);

    f.render_stateful_widget(dir_list, chunks[1], &mut app.browser.state);

    let status = Paragraph::new(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::Yellow),
    ));
    f.render_widget(status, chunks[2]);

    let controls = Paragraph::new(Span::styled(
        app.help_message.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(controls, chunks[3]);
}

/// Raw mode plus alternate screen, undone on drop so every exit path
/// (including a failed setup) hands the terminal back intact.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
            warn!("Failed to leave alternate screen: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {}", e);
        }
    }
}

/// Opens the terminal directory chooser starting at `start`. Returns `None`
/// when the user cancels.
pub fn select_folder(start: &Path) -> anyhow::Result<Option<PathBuf>> {
    let browser = DirBrowser::new(start)?;

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(browser, "Select a Repository Folder".to_string());
    let result = run_app(&mut terminal, &mut app);

    drop(guard);
    terminal.show_cursor()?;

    match result {
        Ok(Some(path)) => {
            info!("Selected folder: {}", path.display());
            Ok(Some(path))
        }
        Ok(None) => {
            info!("Folder selection cancelled");
            Ok(None)
        }
        Err(err) => {
            warn!("Error during folder selection: {}", err);
            Err(err)
        }
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<Option<PathBuf>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let moved = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Char(' ') => {
                if let Some(path) = app.browser.highlighted() {
                    return Ok(Some(path.to_path_buf()));
                }
                Ok(())
            }
            KeyCode::Char('s') => return Ok(Some(app.browser.current().to_path_buf())),
            KeyCode::Right | KeyCode::Enter => app.browser.enter(),
            KeyCode::Left | KeyCode::Backspace => app.browser.leave(),
            KeyCode::Down => {
                app.browser.next();
                Ok(())
            }
            KeyCode::Up => {
                app.browser.previous();
                Ok(())
            }
            _ => Ok(()),
        };

        app.status = match moved {
            Ok(()) => String::new(),
            Err(e) => format!("Cannot open directory: {}", e),
        };
    }
}
