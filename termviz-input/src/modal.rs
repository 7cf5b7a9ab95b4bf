//! Modal state machine for keyboard input

use crate::commands::{Command, Mode};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Shifted digits on a US layout, indexed by slot
const SHIFTED_DIGITS: [char; 9] = ['!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Change in beat sensitivity per key press
pub const SENSITIVITY_STEP: f32 = 0.1;

/// Handles keyboard input and converts to commands
#[derive(Debug, Default)]
pub struct InputHandler {
    mode: Mode,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        // Only presses; Windows terminals also report releases
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Command::Quit),
                KeyCode::Char('s') => Some(Command::Save),
                _ => None,
            };
        }

        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Settings => self.handle_settings_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            // Slot select (1-9), toggle with Shift
            KeyCode::Char(c @ '1'..='9') => {
                let slot = (c as u8 - b'1') as usize;
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    Some(Command::ToggleLayer(slot))
                } else {
                    Some(Command::SelectLayer(slot))
                }
            }
            KeyCode::Char(c) if SHIFTED_DIGITS.contains(&c) => SHIFTED_DIGITS
                .iter()
                .position(|&d| d == c)
                .map(Command::ToggleLayer),

            KeyCode::Left => Some(Command::CycleKind(-1)),
            KeyCode::Right => Some(Command::CycleKind(1)),
            KeyCode::Char('p') => Some(Command::CyclePalette),

            KeyCode::Char('+') | KeyCode::Char('=') => {
                Some(Command::AdjustSensitivity(SENSITIVITY_STEP))
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                Some(Command::AdjustSensitivity(-SENSITIVITY_STEP))
            }

            KeyCode::Char('f') => Some(Command::ToggleFullScreen),

            // Mode switching
            KeyCode::Tab => {
                self.mode = Mode::Settings;
                Some(Command::EnterSettings)
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }

            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        }
    }

    fn handle_settings_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Up => Some(Command::SelectField(-1)),
            KeyCode::Down => Some(Command::SelectField(1)),
            KeyCode::Left => Some(Command::CycleField(-1)),
            KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => Some(Command::CycleField(1)),
            KeyCode::Esc | KeyCode::Tab => {
                self.mode = Mode::Normal;
                Some(Command::ExitSettings)
            }
            _ => None,
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.mode = Mode::Normal;
                Some(Command::ToggleHelp)
            }
            _ => None,
        }
    }
}
