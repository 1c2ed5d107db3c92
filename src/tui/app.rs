use std::sync::mpsc::Sender;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;

use crate::auth::{AuthProvider, AuthSession};
use crate::error::StoreError;
use crate::guard::{Navigator, Route, RouteGuard, HOME_PATH};
use crate::store::StudyStore;
use crate::timer::Ticker;

use super::AppEvent;

#[derive(PartialEq, Debug)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(PartialEq, Debug)]
pub enum InputField {
    None,
    Email,
    Password,
    SessionTitle,
    StopNotes,
}

/// Pages reachable with the number keys, in key order.
pub const MENU: &[(char, Route)] = &[
    ('1', Route::Dashboard),
    ('2', Route::Subjects),
    ('3', Route::Tasks),
    ('4', Route::Plans),
    ('5', Route::Cycles),
    ('6', Route::StudySession),
];

pub struct App {
    pub store: StudyStore,
    pub session: AuthSession,
    provider: Box<dyn AuthProvider>,
    pub navigator: Navigator,
    pub route: Route,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    login_email: String,
    /// Subject picked for the session being started.
    pending_subject: Option<String>,
    pub status: Option<String>,
    events: Option<Sender<AppEvent>>,
    ticker: Option<Ticker>,
    /// Stopwatch ticks seen while the timer was running.
    pub ticks: u64,
}

impl App {
    /// Creates the app and opens the page matching the restored login state.
    pub fn new(store: StudyStore, session: AuthSession, provider: Box<dyn AuthProvider>) -> App {
        let mut app = App {
            store,
            session,
            provider,
            navigator: Navigator::new(RouteGuard::default()),
            route: Route::Login,
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            login_email: String::new(),
            pending_subject: None,
            status: None,
            events: None,
            ticker: None,
            ticks: 0,
        };
        app.navigate(HOME_PATH);
        app
    }

    /// Lets the app schedule stopwatch ticks onto the UI event channel.
    pub fn attach_events(&mut self, events: Sender<AppEvent>) {
        self.events = Some(events);
        self.sync_ticker();
    }

    pub fn navigate(&mut self, path: &str) {
        self.route = self.navigator.navigate(path, &mut self.session);
        self.state.select(if self.row_count() > 0 { Some(0) } else { None });
        if self.route == Route::Login {
            self.begin_input(InputField::Email, String::new());
        } else if self.input_field == InputField::Email || self.input_field == InputField::Password {
            self.cancel_input();
        }
    }

    /// Starts or cancels the one-second stopwatch cadence to match the timer.
    pub fn sync_ticker(&mut self) {
        if !self.store.timer().is_running() {
            if let Some(mut ticker) = self.ticker.take() {
                ticker.cancel();
            }
            return;
        }
        if self.ticker.is_none() {
            if let Some(events) = self.events.clone() {
                self.ticker = Some(Ticker::every(std::time::Duration::from_secs(1), move || {
                    let _ = events.send(AppEvent::Tick);
                }));
            }
        }
    }

    pub fn on_tick(&mut self) {
        if self.store.timer().is_running() {
            self.ticks += 1;
        }
    }

    pub fn row_count(&self) -> usize {
        match self.route {
            Route::Subjects | Route::StudySession => self.store.subjects().len(),
            Route::Tasks => self.store.tasks().len(),
            Route::Plans => self.store.plans().len(),
            Route::Cycles => self.cycle_rows().len(),
            _ => 0,
        }
    }

    /// `(cycle id, cycle subject id)` for every subject slot of every cycle.
    pub fn cycle_rows(&self) -> Vec<(String, String)> {
        self.store
            .cycles()
            .iter()
            .flat_map(|c| c.subjects.iter().map(move |cs| (c.id.clone(), cs.id.clone())))
            .collect()
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn begin_input(&mut self, field: InputField, prefill: String) {
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    fn report(&mut self, result: Result<String, StoreError>) {
        self.status = Some(match result {
            Ok(msg) => msg,
            Err(e) => e.to_string(),
        });
        self.sync_ticker();
        let len = self.row_count();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    /// Handles one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Editing => {
                match key.code {
                    KeyCode::Enter => self.submit_input(),
                    KeyCode::Esc => {
                        // the login form cannot be dismissed
                        if self.route != Route::Login {
                            self.cancel_input();
                        }
                    }
                    KeyCode::Char(c) => self.input_buffer.push(c),
                    KeyCode::Backspace => {
                        self.input_buffer.pop();
                    }
                    _ => {}
                }
                false
            }
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('o') => {
                let next = match self.session.logout() {
                    Ok(path) => path.to_string(),
                    Err(e) => {
                        self.status = Some(e.to_string());
                        return false;
                    }
                };
                self.navigate(&next);
            }
            KeyCode::Char(c) => match MENU.iter().find(|(k, _)| *k == c) {
                Some((_, route)) => self.navigate(route.path()),
                None => self.handle_page_key(code),
            },
            _ => self.handle_page_key(code),
        }
        false
    }

    fn handle_page_key(&mut self, code: KeyCode) {
        let selected = self.state.selected();
        match (self.route, code) {
            (Route::Tasks, KeyCode::Char(' ')) => {
                if let Some(id) = selected.and_then(|i| self.store.tasks().get(i)).map(|t| t.id.clone()) {
                    let result = self.store.toggle_task_complete(&id).map(|done| {
                        format!("Task marked as {}.", if done { "complete" } else { "pending" })
                    });
                    self.report(result);
                }
            }
            (Route::Tasks, KeyCode::Char('d') | KeyCode::Delete) => {
                if let Some(id) = selected.and_then(|i| self.store.tasks().get(i)).map(|t| t.id.clone()) {
                    let result = self.store.delete_task(&id).map(|_| "Task deleted.".to_string());
                    self.report(result);
                }
            }
            (Route::Plans, KeyCode::Enter) => {
                if let Some(id) = selected.and_then(|i| self.store.plans().get(i)).map(|p| p.id.clone()) {
                    let result = self.store.set_active_plan(&id).map(|_| "Plan activated.".to_string());
                    self.report(result);
                }
            }
            (Route::Cycles, KeyCode::Enter) => {
                if let Some((cycle_id, cs_id)) = selected.and_then(|i| self.cycle_rows().get(i).cloned()) {
                    let result = self
                        .store
                        .start_cycle_subject(&cycle_id, &cs_id)
                        .map(|_| "Cycle subject timer started.".to_string());
                    self.report(result);
                }
            }
            (Route::Cycles, KeyCode::Char('a')) => {
                if let Some((cycle_id, _)) = selected.and_then(|i| self.cycle_rows().get(i).cloned()) {
                    let result = self.store.set_active_cycle(&cycle_id).map(|_| "Cycle activated.".to_string());
                    self.report(result);
                }
            }
            (Route::Subjects | Route::StudySession, KeyCode::Char('s')) => {
                if let Some(id) = selected.and_then(|i| self.store.subjects().get(i)).map(|s| s.id.clone()) {
                    self.pending_subject = Some(id);
                    self.begin_input(InputField::SessionTitle, "Study session".into());
                }
            }
            (Route::StudySession | Route::Cycles, KeyCode::Char('p')) => {
                let result = self.store.pause_timer().map(|_| "Timer paused.".to_string());
                self.report(result);
            }
            (Route::StudySession | Route::Cycles, KeyCode::Char('r')) => {
                let result = self.store.resume_timer().map(|_| "Timer resumed.".to_string());
                self.report(result);
            }
            (Route::StudySession | Route::Cycles, KeyCode::Char('x')) => {
                if !self.store.timer().is_idle() {
                    self.begin_input(InputField::StopNotes, String::new());
                }
            }
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        let value = std::mem::take(&mut self.input_buffer);
        match self.input_field {
            InputField::Email => {
                self.login_email = value;
                self.begin_input(InputField::Password, String::new());
            }
            InputField::Password => {
                let email = std::mem::take(&mut self.login_email);
                match self.session.login(self.provider.as_ref(), &email, &value) {
                    Ok(next) => {
                        self.cancel_input();
                        self.status = None;
                        self.navigate(&next);
                    }
                    Err(e) => {
                        self.status = Some(e.to_string());
                        self.begin_input(InputField::Email, email);
                    }
                }
            }
            InputField::SessionTitle => {
                self.cancel_input();
                if let Some(subject_id) = self.pending_subject.take() {
                    let title = if value.trim().is_empty() { "Study session".to_string() } else { value };
                    let result = self
                        .store
                        .start_session(&subject_id, title, None)
                        .map(|_| "Study session started.".to_string());
                    self.report(result);
                }
            }
            InputField::StopNotes => {
                self.cancel_input();
                let notes = if value.trim().is_empty() { None } else { Some(value) };
                let result = self
                    .store
                    .stop_timer(notes)
                    .map(|s| format!("Session recorded: {} minute(s).", s.duration_minutes));
                self.ticks = 0;
                self.report(result);
            }
            InputField::None => self.cancel_input(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FixedCredentialAuth, DEMO_EMAIL, DEMO_PASSWORD};
    use crate::storage::MemoryStore;
    use crate::store::NewSubject;
    use crate::timer::ManualClock;
    use chrono::{TimeZone, Utc};
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;

    fn app() -> App {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()));
        let store = StudyStore::open(Box::new(MemoryStore::new()), clock);
        let session = AuthSession::restore(Box::new(MemoryStore::new()));
        App::new(store, session, Box::new(FixedCredentialAuth::default()))
    }

    fn type_line(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    }

    fn press(app: &mut App, c: char) -> bool {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn anonymous_start_lands_on_login_form() {
        let app = app();
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.input_field, InputField::Email);
        assert_eq!(app.session.return_url(), Some(HOME_PATH));
    }

    #[test]
    fn login_opens_the_dashboard() {
        let mut app = app();
        type_line(&mut app, DEMO_EMAIL);
        type_line(&mut app, DEMO_PASSWORD);
        assert_eq!(app.route, Route::Dashboard);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.navigator.is_loading());
    }

    #[test]
    fn wrong_password_stays_on_login() {
        let mut app = app();
        type_line(&mut app, DEMO_EMAIL);
        type_line(&mut app, "nope");
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.status.as_deref(), Some("Email or password is incorrect"));
        assert_eq!(app.input_buffer, DEMO_EMAIL);
    }

    #[test]
    fn menu_keys_switch_pages_and_logout_returns_to_login() {
        let mut app = app();
        type_line(&mut app, DEMO_EMAIL);
        type_line(&mut app, DEMO_PASSWORD);
        press(&mut app, '3');
        assert_eq!(app.route, Route::Tasks);
        press(&mut app, 'o');
        assert_eq!(app.route, Route::Login);
        assert!(app.session.user().is_none());
        assert!(!press(&mut app, 'q'), "typing into the login form never quits");
    }

    #[test]
    fn session_page_starts_and_stops_the_timer() {
        let mut app = app();
        type_line(&mut app, DEMO_EMAIL);
        type_line(&mut app, DEMO_PASSWORD);
        app.store
            .add_subject(NewSubject { name: "Math".into(), total_hours: 10.0, ..NewSubject::default() })
            .unwrap();
        press(&mut app, '6');
        assert_eq!(app.state.selected(), Some(0));
        press(&mut app, 's');
        type_line(&mut app, "");
        assert!(app.store.timer().is_running());
        press(&mut app, 'x');
        type_line(&mut app, "done");
        assert!(app.store.timer().is_idle());
        assert_eq!(app.store.sessions().len(), 1);
        assert_eq!(app.store.sessions()[0].notes.as_deref(), Some("done"));
    }
}
