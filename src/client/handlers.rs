use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use super::components::{
    level_index, DashboardUI, FocusedWidget, Flow, FormField, FormInput, LoginField,
};
use crate::{
    models::connections::Credentials,
    navigation::{Action, CreateForm, Level, ViewState},
};

impl DashboardUI {
    pub async fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if self.form.is_some() {
            self.handle_form_input(key).await;
            return Flow::Continue;
        }

        if self.navigator.is_logged_in() {
            self.handle_browser_input(key).await
        } else {
            self.handle_login_input(key).await
        }
    }

    pub async fn handle_login_input(&mut self, key: KeyEvent) -> Flow {
        let input = &mut self.login_input;
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                input.current_field = match input.current_field {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Enter => match input.current_field {
                LoginField::Username => input.current_field = LoginField::Password,
                LoginField::Password => {
                    let credentials = Credentials::new(&input.username, &input.password);
                    input.password.clear();
                    self.navigator.dispatch(Action::Login(credentials)).await;
                    self.current_focus = FocusedWidget::Level(Level::Warehouse);
                    self.cursors = [0; 4];
                    self.preview_offset = 0;
                    self.sync_cursors();
                }
            },
            KeyCode::Char(c) => match input.current_field {
                LoginField::Username => input.username.push(c),
                LoginField::Password => input.password.push(c),
            },
            KeyCode::Backspace => {
                match input.current_field {
                    LoginField::Username => input.username.pop(),
                    LoginField::Password => input.password.pop(),
                };
            }
            _ => {}
        }
        Flow::Continue
    }

    pub async fn handle_browser_input(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Tab => self.current_focus = self.current_focus.next(),
            KeyCode::BackTab => self.current_focus = self.current_focus.previous(),
            KeyCode::Up => self.move_selection_up(),
            KeyCode::Down => self.move_selection_down(),
            KeyCode::Enter => self.commit_selection().await,
            KeyCode::Char('r') => {
                self.navigator.dispatch(Action::Refresh).await;
                self.sync_cursors();
            }
            KeyCode::Char('l') => {
                self.navigator.dispatch(Action::Logout).await;
                self.login_input.current_field = LoginField::Username;
                self.sync_cursors();
            }
            KeyCode::Char('w') => self.form = Some(FormInput::new(Level::Warehouse)),
            KeyCode::Char('d') => self.form = Some(FormInput::new(Level::Database)),
            KeyCode::Char('s') => self.form = Some(FormInput::new(Level::Schema)),
            KeyCode::Char('t') => self.form = Some(FormInput::new(Level::Table)),
            _ => {}
        }
        Flow::Continue
    }

    pub async fn handle_form_input(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.form = None,
            KeyCode::Char(c) => form.active_field().push(c),
            KeyCode::Backspace => {
                form.active_field().pop();
            }
            KeyCode::Tab | KeyCode::BackTab if form.has_columns() => {
                form.current_field = match form.current_field {
                    FormField::Name => FormField::Columns,
                    FormField::Columns => FormField::Name,
                };
            }
            KeyCode::Enter if form.has_columns() && form.current_field == FormField::Name => {
                form.current_field = FormField::Columns;
            }
            KeyCode::Enter => {
                let request = CreateForm {
                    kind: form.kind,
                    name: form.name.clone(),
                    columns: form.columns.clone(),
                };
                self.form = None;
                self.navigator.dispatch(Action::Create(request)).await;
                self.sync_cursors();
            }
            _ => {}
        }
    }

    async fn commit_selection(&mut self) {
        let FocusedWidget::Level(level) = self.current_focus else {
            return;
        };
        let ViewState::LoggedIn(browsing) = self.navigator.state() else {
            return;
        };
        let Some(name) = browsing.options.get(level).get(self.cursor(level)).cloned() else {
            debug!("nothing to select at {}", level);
            return;
        };

        self.navigator
            .dispatch(Action::Select(level, name.clone()))
            .await;

        for below in Level::ALL.iter().filter(|l| **l > level) {
            self.cursors[level_index(*below)] = 0;
        }
        self.preview_offset = 0;
        self.sync_cursors();

        if let ViewState::LoggedIn(browsing) = self.navigator.state() {
            if browsing.selection.get(level) == Some(name.as_str()) {
                self.current_focus = match level.child() {
                    Some(child) => FocusedWidget::Level(child),
                    None => FocusedWidget::Preview,
                };
            }
        }
    }

    pub fn move_selection_up(&mut self) {
        match self.current_focus {
            FocusedWidget::Level(level) => {
                let cursor = &mut self.cursors[level_index(level)];
                *cursor = cursor.saturating_sub(1);
            }
            FocusedWidget::Preview => self.preview_offset = self.preview_offset.saturating_sub(1),
        }
    }

    pub fn move_selection_down(&mut self) {
        let ViewState::LoggedIn(browsing) = self.navigator.state() else {
            return;
        };
        match self.current_focus {
            FocusedWidget::Level(level) => {
                let len = browsing.options.get(level).len();
                let cursor = &mut self.cursors[level_index(level)];
                if *cursor + 1 < len {
                    *cursor += 1;
                }
            }
            FocusedWidget::Preview => {
                let rows = browsing.preview.as_ref().map(|p| p.rows().len()).unwrap_or(0);
                if self.preview_offset + 1 < rows {
                    self.preview_offset += 1;
                }
            }
        }
    }
}
