//! Command definitions for termviz

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// Editing fields of the selected layer
    Settings,
    Help,
}

impl Mode {
    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "",
            Mode::Settings => "SETTINGS",
            Mode::Help => "HELP",
        }
    }
}

/// Commands that can be dispatched from input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // Layer slots (0-based)
    SelectLayer(usize),
    ToggleLayer(usize),
    /// Step the selected slot's kind forward (+1) or back (-1)
    CycleKind(i32),
    CyclePalette,

    // Analysis
    AdjustSensitivity(f32),

    // Display
    ToggleFullScreen,
    ToggleHelp,

    // Settings editor
    EnterSettings,
    /// Move the field cursor by the given number of rows
    SelectField(i32),
    /// Cycle the value under the field cursor
    CycleField(i32),
    ExitSettings,

    // Application
    Save,
    Quit,
}
