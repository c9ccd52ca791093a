use std::io;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::screens;
use crate::navigation::{Level, Navigator, ViewState};

pub struct DashboardUI {
    pub navigator: Navigator,
    pub login_input: LoginInput,
    pub current_focus: FocusedWidget,
    pub cursors: [usize; 4],
    pub preview_offset: usize,
    pub form: Option<FormInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub current_field: LoginField,
}

impl LoginInput {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            current_field: LoginField::Username,
        }
    }
}

impl Default for LoginInput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedWidget {
    Level(Level),
    Preview,
}

impl FocusedWidget {
    const ORDER: [FocusedWidget; 5] = [
        FocusedWidget::Level(Level::Warehouse),
        FocusedWidget::Level(Level::Database),
        FocusedWidget::Level(Level::Schema),
        FocusedWidget::Level(Level::Table),
        FocusedWidget::Preview,
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|w| *w == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        let i = Self::ORDER.iter().position(|w| *w == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Columns,
}

/// An open creation form.
pub struct FormInput {
    pub kind: Level,
    pub name: String,
    pub columns: String,
    pub current_field: FormField,
}

impl FormInput {
    pub fn new(kind: Level) -> Self {
        Self {
            kind,
            name: String::new(),
            columns: String::new(),
            current_field: FormField::Name,
        }
    }

    pub fn has_columns(&self) -> bool {
        self.kind == Level::Table
    }

    pub fn active_field(&mut self) -> &mut String {
        match self.current_field {
            FormField::Name => &mut self.name,
            FormField::Columns => &mut self.columns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub(crate) fn level_index(level: Level) -> usize {
    match level {
        Level::Warehouse => 0,
        Level::Database => 1,
        Level::Schema => 2,
        Level::Table => 3,
    }
}

impl DashboardUI {
    pub fn new(navigator: Navigator) -> Self {
        Self {
            navigator,
            login_input: LoginInput::new(),
            current_focus: FocusedWidget::Level(Level::Warehouse),
            cursors: [0; 4],
            preview_offset: 0,
            form: None,
        }
    }

    pub fn cursor(&self, level: Level) -> usize {
        self.cursors[level_index(level)]
    }

    /// Points each list cursor at the selected entry, or keeps it in bounds.
    pub fn sync_cursors(&mut self) {
        let ViewState::LoggedIn(browsing) = self.navigator.state() else {
            self.cursors = [0; 4];
            return;
        };

        for level in Level::ALL {
            let options = browsing.options.get(level);
            let index = level_index(level);
            self.cursors[index] = match browsing.selection.get(level) {
                Some(selected) => options
                    .iter()
                    .position(|name| name == selected)
                    .unwrap_or(0),
                None => self.cursors[index].min(options.len().saturating_sub(1)),
            };
        }

        let rows = browsing.preview.as_ref().map(|p| p.rows().len()).unwrap_or(0);
        self.preview_offset = self.preview_offset.min(rows.saturating_sub(1));
    }

    pub async fn run(&mut self) -> Result<(), io::Error> {
        let _guard = TerminalGuard;
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.ui_loop(&mut terminal).await;

        self.navigator.shutdown().await;
        terminal.show_cursor()?;

        result
    }

    async fn ui_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        loop {
            terminal.draw(|f| screens::draw(f, self))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if self.handle_key(key).await == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}
