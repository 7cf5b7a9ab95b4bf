//! Terminal colors - palette mapping and chrome theme

use crossterm::style::Color;
use termviz_library::PaletteColor;

/// Map a palette entry to a terminal color
pub fn to_color(color: PaletteColor) -> Color {
    match color {
        PaletteColor::Indexed(i) => match i % 16 {
            0 => Color::Black,
            1 => Color::DarkRed,
            2 => Color::DarkGreen,
            3 => Color::DarkYellow,
            4 => Color::DarkBlue,
            5 => Color::DarkMagenta,
            6 => Color::DarkCyan,
            7 => Color::Grey,
            8 => Color::DarkGrey,
            9 => Color::Red,
            10 => Color::Green,
            11 => Color::Yellow,
            12 => Color::Blue,
            13 => Color::Magenta,
            14 => Color::Cyan,
            _ => Color::White,
        },
        PaletteColor::Rgb(r, g, b) => Color::Rgb { r, g, b },
    }
}

/// Fixed colors for labels, meters and the header line
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary foreground color (header text)
    pub fg: Color,
    /// Dimmed foreground (labels, scales)
    pub fg_dim: Color,
    /// Highlight color (selected layer, beat indicator)
    pub highlight: Color,
    /// Meter colors by zone
    pub accent: Color,
    pub warning: Color,
    pub danger: Color,
    /// Cleared-cell color
    pub background: Color,
}

impl Theme {
    /// Color for meters/bars based on level (0.0 - 1.0)
    pub fn meter_color(&self, level: f32) -> Color {
        if level > 0.9 {
            self.danger
        } else if level > 0.75 {
            self.warning
        } else {
            self.accent
        }
    }
}

pub const CHROME: Theme = Theme {
    fg: Color::White,
    fg_dim: Color::DarkGrey,
    highlight: Color::Cyan,
    accent: Color::Green,
    warning: Color::Yellow,
    danger: Color::Red,
    background: Color::Reset,
};

impl Default for Theme {
    fn default() -> Self {
        CHROME
    }
}
