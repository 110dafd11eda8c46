//! Terminal dashboard over the `/dump` endpoint
//!
//! One tab per dump table with a per-tab search box, CSV export of the
//! filtered rows and line charts on the two report tabs.

pub mod client;
mod components;
pub mod state;
pub mod table;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event as CrosstermEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, BufWriter, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use client::DumpClient;
pub use state::{Action, DashboardState, Mode};
pub use table::{find_tab, DataTable, TabDef, TABS};

const TICK: Duration = Duration::from_millis(250);

/// Write `table` as CSV into `path`
pub fn write_csv_file(table: &DataTable, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    table.write_csv(BufWriter::new(file))
}

/// Fetch the dump, filter one tab and write it as CSV. Returns the rows written.
pub fn export_tab(
    client: &mut DumpClient,
    key: &str,
    filter: &str,
    output: &Path,
) -> Result<usize> {
    let Some(tab) = find_tab(key) else {
        let keys: Vec<&str> = TABS.iter().map(|t| t.key).collect();
        bail!("Unknown tab: {} (expected one of: {})", key, keys.join(", "));
    };

    let dump = client.fetch()?;
    let table = DataTable::from_path(dump, tab.key).filter(filter);
    write_csv_file(&table, output)?;
    Ok(table.len())
}

/// Interactive dashboard application
pub struct DashboardApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    client: DumpClient,
    state: DashboardState,
    export_dir: PathBuf,
}

impl DashboardApp {
    /// Fetch the first dump, then enter the alternate screen
    pub fn new(mut client: DumpClient, export_dir: PathBuf) -> Result<Self> {
        let state = DashboardState::new(client.fetch()?);

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            client,
            state,
            export_dir,
        })
    }

    /// Run until the user quits
    pub fn run(mut self) -> Result<()> {
        loop {
            if self.client.is_stale() {
                self.refresh();
            }
            self.draw()?;

            if !event::poll(TICK)? {
                continue;
            }
            if let CrosstermEvent::Key(key) = event::read()? {
                match self.state.handle_key(key) {
                    Action::Quit => break,
                    Action::Refresh => {
                        self.client.invalidate();
                        self.refresh();
                    }
                    Action::Export => self.export(),
                    Action::None => {}
                }
            }
        }

        self.restore()
    }

    fn refresh(&mut self) {
        let source = self.client.dump_url();
        self.state.apply_refresh(self.client.fetch(), &source);
    }

    fn export(&mut self) {
        let tab = self.state.current();
        let path = self.export_dir.join(tab.def.csv_file_name());
        let table = tab.visible();

        let message = match write_csv_file(&table, &path) {
            Ok(()) => format!("Exported {} rows to {}", table.len(), path.display()),
            Err(err) => format!("Export failed: {:#}", err),
        };
        self.state.set_status(message);
    }

    fn draw(&mut self) -> Result<()> {
        let state = &self.state;
        self.terminal.draw(|frame| components::draw(frame, state))?;
        Ok(())
    }

    /// Restore the terminal
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        // Best effort cleanup
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}
