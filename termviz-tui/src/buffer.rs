//! Character/color cell grid with row-diff flushing

use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::Command;
use std::fmt;
use std::io;

/// Destination for composed rows
///
/// Receives an absolute terminal row and a line with inline color codes.
/// Implementations own cursor positioning.
pub trait LineWriter {
    fn write_line(&mut self, row: u16, content: &str) -> io::Result<()>;
}

/// A single cell in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            color: Color::Reset,
        }
    }
}

/// Width x height grid that layers render into
///
/// Keeps the last line flushed for each row so unchanged rows are never
/// rewritten.
#[derive(Debug, Default)]
pub struct CellBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    last_flushed: Vec<String>,
    /// Scratch line reused across rows
    line: String,
}

impl CellBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self::default();
        buffer.ensure_size(width, height);
        buffer
    }

    /// Resize the grid; reallocates only when dimensions change
    ///
    /// Returns true if the grid was reallocated.
    pub fn ensure_size(&mut self, width: u16, height: u16) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::default(); width as usize * height as usize];
        self.last_flushed = vec![String::new(); height as usize];
        true
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Reset every cell to a space in `color`
    pub fn clear(&mut self, color: Color) {
        self.cells.fill(Cell { ch: ' ', color });
    }

    /// Set a character at position; no-op outside the grid
    pub fn set(&mut self, x: i32, y: i32, ch: char, color: Color) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let index = y as usize * self.width as usize + x as usize;
            self.cells[index] = Cell { ch, color };
        }
    }

    /// Set a string starting at position, clipped to the grid
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, color: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, color);
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Plain characters of a row, without color codes
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        self.cells[start..start + self.width as usize]
            .iter()
            .map(|c| c.ch)
            .collect()
    }

    /// Forget what was flushed so the next flush rewrites every row
    pub fn invalidate(&mut self) {
        for line in &mut self.last_flushed {
            line.clear();
        }
    }

    /// Write rows that changed since the previous flush
    ///
    /// Row `y` of the grid goes to terminal row `start_row + y`. Returns the
    /// number of rows written.
    pub fn flush_to<W: LineWriter + ?Sized>(
        &mut self,
        writer: &mut W,
        start_row: u16,
    ) -> io::Result<usize> {
        let mut written = 0;
        for y in 0..self.height as usize {
            self.compose_row(y)
                .map_err(|_| io::Error::other("failed to format row"))?;
            if self.line == self.last_flushed[y] {
                continue;
            }
            writer.write_line(start_row + y as u16, &self.line)?;
            std::mem::swap(&mut self.line, &mut self.last_flushed[y]);
            written += 1;
        }
        Ok(written)
    }

    /// Build row `y` into the scratch line, emitting a color code only
    /// where the color changes
    fn compose_row(&mut self, y: usize) -> fmt::Result {
        let width = self.width as usize;
        let row = &self.cells[y * width..(y + 1) * width];
        self.line.clear();

        let mut current: Option<Color> = None;
        for cell in row {
            if current != Some(cell.color) {
                if cell.color == Color::Reset {
                    ResetColor.write_ansi(&mut self.line)?;
                } else {
                    SetForegroundColor(cell.color).write_ansi(&mut self.line)?;
                }
                current = Some(cell.color);
            }
            self.line.push(cell.ch);
        }
        ResetColor.write_ansi(&mut self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        rows: Vec<(u16, String)>,
    }

    impl LineWriter for Recorder {
        fn write_line(&mut self, row: u16, content: &str) -> io::Result<()> {
            self.rows.push((row, content.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_set_out_of_bounds_is_noop() {
        let mut buffer = CellBuffer::new(4, 2);
        buffer.set(-1, 0, 'x', Color::Red);
        buffer.set(4, 0, 'x', Color::Red);
        buffer.set(0, 2, 'x', Color::Red);
        buffer.set(0, -5, 'x', Color::Red);
        assert_eq!(buffer.row_text(0), "    ");
        assert_eq!(buffer.row_text(1), "    ");

        buffer.set_str(2, 1, "abcdef", Color::Red);
        assert_eq!(buffer.row_text(1), "  ab");
    }

    #[test]
    fn test_ensure_size_only_reallocates_on_change() {
        let mut buffer = CellBuffer::new(4, 2);
        buffer.set(1, 1, 'x', Color::Red);
        assert!(!buffer.ensure_size(4, 2));
        assert_eq!(buffer.get(1, 1).map(|c| c.ch), Some('x'));

        assert!(buffer.ensure_size(6, 3));
        assert_eq!(buffer.get(1, 1).map(|c| c.ch), Some(' '));
        assert_eq!(buffer.row_text(2).len(), 6);
    }

    #[test]
    fn test_identical_frame_writes_nothing() {
        let mut buffer = CellBuffer::new(8, 3);
        let mut out = Recorder::default();

        buffer.clear(Color::Reset);
        buffer.set_str(0, 1, "hello", Color::Green);
        assert_eq!(buffer.flush_to(&mut out, 1).unwrap(), 3);

        buffer.clear(Color::Reset);
        buffer.set_str(0, 1, "hello", Color::Green);
        assert_eq!(buffer.flush_to(&mut out, 1).unwrap(), 0);
        assert_eq!(out.rows.len(), 3);
    }

    #[test]
    fn test_only_changed_rows_are_written() {
        let mut buffer = CellBuffer::new(8, 3);
        let mut out = Recorder::default();
        buffer.flush_to(&mut out, 0).unwrap();
        out.rows.clear();

        buffer.set(3, 2, '*', Color::Yellow);
        assert_eq!(buffer.flush_to(&mut out, 5).unwrap(), 1);
        assert_eq!(out.rows[0].0, 7);
        assert!(out.rows[0].1.contains('*'));
    }

    #[test]
    fn test_invalidate_forces_full_flush() {
        let mut buffer = CellBuffer::new(4, 4);
        let mut out = Recorder::default();
        buffer.flush_to(&mut out, 0).unwrap();
        buffer.invalidate();
        assert_eq!(buffer.flush_to(&mut out, 0).unwrap(), 4);
    }

    #[test]
    fn test_color_codes_only_on_change() {
        let mut buffer = CellBuffer::new(4, 1);
        buffer.clear(Color::Red);
        let mut out = Recorder::default();
        buffer.flush_to(&mut out, 0).unwrap();

        let mut expected = String::new();
        SetForegroundColor(Color::Red).write_ansi(&mut expected).unwrap();
        expected.push_str("    ");
        ResetColor.write_ansi(&mut expected).unwrap();
        assert_eq!(out.rows[0].1, expected);
    }
}
