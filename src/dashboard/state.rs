//! Dashboard state and key handling, independent of the terminal

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::Value;

use super::client::totals_line;
use super::table::{DataTable, TabDef, TABS};

const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Filter,
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    Export,
}

/// One tab's data plus its own filter term and scroll offset
#[derive(Debug, Clone)]
pub struct TabView {
    pub def: &'static TabDef,
    pub table: DataTable,
    pub filter: String,
    pub offset: usize,
}

impl TabView {
    /// The table after applying this tab's filter
    pub fn visible(&self) -> DataTable {
        self.table.filter(&self.filter)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub tabs: Vec<TabView>,
    pub selected: usize,
    pub mode: Mode,
    pub totals: String,
    pub status: String,
}

impl DashboardState {
    pub fn new(dump: &Value) -> Self {
        let tabs = TABS
            .iter()
            .map(|def| TabView {
                def,
                table: DataTable::from_path(dump, def.key),
                filter: String::new(),
                offset: 0,
            })
            .collect();

        Self {
            tabs,
            selected: 0,
            mode: Mode::Browse,
            totals: totals_line(dump),
            status: String::from("Press / to filter, e to export, r to refresh, q to quit"),
        }
    }

    /// Swap in a newer dump, keeping filters and clamping scroll offsets
    pub fn load(&mut self, dump: &Value) {
        for tab in &mut self.tabs {
            tab.table = DataTable::from_path(dump, tab.def.key);
            let visible = tab.visible().len();
            tab.offset = tab.offset.min(visible.saturating_sub(1));
        }
        self.totals = totals_line(dump);
    }

    /// Apply the outcome of a refresh from `source`.
    ///
    /// A failure only reaches the status line; the previous data stays.
    pub fn apply_refresh(&mut self, outcome: Result<&Value>, source: &str) {
        match outcome {
            Ok(dump) => {
                self.load(dump);
                self.set_status(format!("Loaded {}", source));
            }
            Err(err) => self.set_status(format!("Refresh failed: {:#}", err)),
        }
    }

    pub fn current(&self) -> &TabView {
        &self.tabs[self.selected]
    }

    fn current_mut(&mut self) -> &mut TabView {
        &mut self.tabs[self.selected]
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.mode {
            Mode::Filter => self.handle_filter_key(key.code),
            Mode::Browse => self.handle_browse_key(key.code),
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                let tab = self.current_mut();
                tab.filter.pop();
                tab.offset = 0;
            }
            KeyCode::Char(c) => {
                let tab = self.current_mut();
                tab.filter.push(c);
                tab.offset = 0;
            }
            _ => {}
        }
        Action::None
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Char('e') => return Action::Export,
            KeyCode::Char('/') => self.mode = Mode::Filter,
            KeyCode::Right | KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.tabs.len();
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.selected = (self.selected + self.tabs.len() - 1) % self.tabs.len();
            }
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageDown => self.scroll_by(PAGE),
            KeyCode::Up => self.scroll_back(1),
            KeyCode::PageUp => self.scroll_back(PAGE),
            KeyCode::Home => self.current_mut().offset = 0,
            _ => {}
        }
        Action::None
    }

    fn scroll_by(&mut self, n: usize) {
        let last = self.current().visible().len().saturating_sub(1);
        let tab = self.current_mut();
        tab.offset = (tab.offset + n).min(last);
    }

    fn scroll_back(&mut self, n: usize) {
        let tab = self.current_mut();
        tab.offset = tab.offset.saturating_sub(n);
    }
}
