use crate::checklist::Checklist;
use crate::clock::Clock;
use crate::routine::{Routine, RoutineError};
use crate::snippets::{Fetched, Snippets};
use crossterm::event::KeyCode;

/// Longest custom time input, `HH:MM:SS`.
const INPUT_MAX: usize = 8;

/// What the run loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refetch,
    CycleRender,
    CycleColor,
    ToggleStatus,
}

/// Board state: everything except the fireworks and the terminal.
pub struct App {
    pub clock: Clock,
    pub routine: Routine,
    pub routine_error: Option<String>,
    pub checklist: Checklist,
    /// `None` when running offline.
    pub snippets: Option<Snippets>,
    /// Minutes since midnight when the trivia answer appears.
    pub trivia_reveal: u32,
    /// Custom time being typed, while in input mode.
    pub input: Option<String>,
    pub notice: Option<String>,
}

impl App {
    pub fn new(
        loaded: Result<Routine, RoutineError>,
        clock: Clock,
        online: bool,
        trivia_reveal: u32,
    ) -> Self {
        let mut app = App {
            clock,
            routine: Routine { items: Vec::new() },
            routine_error: None,
            checklist: Checklist::new(0),
            snippets: online.then(Snippets::default),
            trivia_reveal,
            input: None,
            notice: None,
        };
        app.set_routine(loaded);
        app
    }

    /// Adopt a freshly loaded routine. A failed reload keeps the items
    /// already on screen.
    pub fn set_routine(&mut self, loaded: Result<Routine, RoutineError>) {
        match loaded {
            Ok(routine) => {
                self.checklist.resize(routine.len());
                self.routine = routine;
                self.routine_error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "error loading routine");
                self.routine_error = Some(e.to_string());
            }
        }
    }

    pub fn apply_snippet(&mut self, fetched: Fetched) {
        if let Some(snippets) = self.snippets.as_mut() {
            snippets.apply(fetched);
        }
    }

    /// Completion signal for the fireworks.
    pub fn is_complete(&self) -> bool {
        self.checklist.is_complete()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.input.is_some() {
            self.handle_input_key(code);
            return Action::None;
        }
        self.notice = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.checklist.move_up();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.checklist.move_down();
                Action::None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let checked = self.checklist.toggle();
                tracing::debug!(item = self.checklist.cursor(), checked, "toggled");
                Action::None
            }
            KeyCode::Char('t') => {
                self.input = Some(String::new());
                Action::None
            }
            KeyCode::Char('0') => {
                self.clock.reset();
                self.notice = Some("Back to real time".to_string());
                Action::None
            }
            KeyCode::Char('n') if self.snippets.is_some() => {
                self.snippets = Some(Snippets::default());
                Action::Refetch
            }
            KeyCode::Char('r') => Action::CycleRender,
            KeyCode::Char('c') => Action::CycleColor,
            KeyCode::Char('h') => Action::ToggleStatus,
            _ => Action::None,
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) if (c.is_ascii_digit() || c == ':') && input.len() < INPUT_MAX => {
                input.push(c);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Esc => {
                self.input = None;
            }
            KeyCode::Enter => {
                let text = self.input.take().unwrap_or_default();
                self.notice = Some(match self.clock.set_custom_time(&text) {
                    Ok(()) => format!("Time set to {text}"),
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected custom time");
                        "Invalid time, use HH:MM:SS".to_string()
                    }
                });
            }
            _ => {}
        }
    }
}
