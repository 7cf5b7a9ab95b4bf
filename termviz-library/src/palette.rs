//! Color palettes - built-ins plus user palettes from palettes.json

use crate::config::{SettingsError, DEFAULT_PALETTE_ID};
use crate::layer::LayerSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One palette entry
///
/// Serializes as a bare number (16-color index) or an `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteColor {
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Standard 16-color indices
pub mod ansi {
    pub const BLACK: u8 = 0;
    pub const DARK_RED: u8 = 1;
    pub const DARK_GREEN: u8 = 2;
    pub const DARK_YELLOW: u8 = 3;
    pub const DARK_BLUE: u8 = 4;
    pub const DARK_MAGENTA: u8 = 5;
    pub const DARK_CYAN: u8 = 6;
    pub const GREY: u8 = 7;
    pub const DARK_GREY: u8 = 8;
    pub const RED: u8 = 9;
    pub const GREEN: u8 = 10;
    pub const YELLOW: u8 = 11;
    pub const BLUE: u8 = 12;
    pub const MAGENTA: u8 = 13;
    pub const CYAN: u8 = 14;
    pub const WHITE: u8 = 15;
}

impl PaletteColor {
    /// Indexed colors outside 0-15 are folded back into range
    pub fn normalized(self) -> Self {
        match self {
            PaletteColor::Indexed(i) => PaletteColor::Indexed(i % 16),
            rgb => rgb,
        }
    }
}

impl Default for PaletteColor {
    fn default() -> Self {
        PaletteColor::Indexed(ansi::GREY)
    }
}

/// Ordered list of colors addressed modulo its length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Palette {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub colors: Vec<PaletteColor>,
}

impl Palette {
    pub fn new(id: &str, name: &str, colors: &[u8]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            colors: colors.iter().map(|&c| PaletteColor::Indexed(c)).collect(),
        }
    }

    /// Color at `index`, wrapping; an empty palette yields the default color
    pub fn color(&self, index: usize) -> PaletteColor {
        if self.colors.is_empty() {
            return PaletteColor::default();
        }
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Built-in palettes, dark to bright within each
pub fn builtin_palettes() -> Vec<Palette> {
    use ansi::*;
    vec![
        Palette::new(
            DEFAULT_PALETTE_ID,
            "Default",
            &[DARK_GREEN, GREEN, CYAN, BLUE, MAGENTA, YELLOW, WHITE],
        ),
        Palette::new("fire", "Fire", &[DARK_RED, RED, DARK_YELLOW, YELLOW, WHITE]),
        Palette::new("ice", "Ice", &[DARK_BLUE, BLUE, DARK_CYAN, CYAN, WHITE]),
        Palette::new("neon", "Neon", &[DARK_BLUE, BLUE, MAGENTA, CYAN, WHITE]),
        Palette::new("mono", "Mono", &[DARK_GREY, GREY, WHITE]),
        Palette::new(
            "sunset",
            "Sunset",
            &[DARK_MAGENTA, MAGENTA, RED, DARK_YELLOW, YELLOW],
        ),
    ]
}

/// Palette repository: built-ins merged with user palettes
#[derive(Debug, Clone)]
pub struct PaletteSet {
    palettes: Vec<Palette>,
}

impl Default for PaletteSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PaletteSet {
    pub fn builtin() -> Self {
        Self {
            palettes: builtin_palettes(),
        }
    }

    /// Built-ins plus the user palettes file, if present
    ///
    /// A malformed file is logged and ignored.
    pub fn load() -> Self {
        let mut set = Self::builtin();
        let path = Self::palettes_path();
        if path.exists() {
            if let Err(e) = set.merge_file(&path) {
                tracing::warn!(path = %path.display(), "failed to load palettes: {}", e);
            }
        }
        set
    }

    /// Get the default palettes file path
    pub fn palettes_path() -> PathBuf {
        crate::VisualizerSettings::config_dir().join("palettes.json")
    }

    /// Merge palettes from a JSON array file; returns how many were merged
    pub fn merge_file(&mut self, path: &Path) -> Result<usize, SettingsError> {
        let content = fs::read_to_string(path)?;
        let palettes: Vec<Palette> = serde_json::from_str(&content)?;
        let count = palettes.len();
        for palette in palettes {
            self.insert(palette);
        }
        tracing::debug!(count, "user palettes merged");
        Ok(count)
    }

    /// Add a palette, replacing any with the same id
    ///
    /// Palettes without colors are skipped.
    pub fn insert(&mut self, mut palette: Palette) {
        if palette.colors.is_empty() {
            tracing::warn!(id = %palette.id, "skipping palette without colors");
            return;
        }
        for color in &mut palette.colors {
            *color = color.normalized();
        }
        match self.palettes.iter_mut().find(|p| p.id == palette.id) {
            Some(existing) => *existing = palette,
            None => self.palettes.push(palette),
        }
    }

    /// Palette by id, falling back to the default palette
    pub fn get(&self, id: &str) -> &Palette {
        self.palettes
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.palettes.iter().find(|p| p.id == DEFAULT_PALETTE_ID))
            .unwrap_or(&self.palettes[0])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.palettes.iter().any(|p| p.id == id)
    }

    /// Palette a layer draws with: its own override, else the global one
    pub fn resolve(&self, layer: &LayerSettings, global_id: &str) -> &Palette {
        match layer.palette_id.as_deref() {
            Some(id) if self.contains(id) => self.get(id),
            _ => self.get(global_id),
        }
    }

    /// Id following `id` in repository order (wraps)
    pub fn next_id(&self, id: &str) -> &str {
        let pos = self.palettes.iter().position(|p| p.id == id);
        let next = pos.map_or(0, |p| (p + 1) % self.palettes.len());
        &self.palettes[next].id
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wraps() {
        let palette = Palette::new("t", "T", &[1, 2, 3]);
        assert_eq!(palette.color(4), PaletteColor::Indexed(2));
        assert_eq!(palette.color(usize::MAX), PaletteColor::Indexed(1));
    }

    #[test]
    fn test_empty_palette_color() {
        let palette = Palette::new("empty", "Empty", &[]);
        assert_eq!(palette.color(7), PaletteColor::default());
    }

    #[test]
    fn test_color_json_forms() {
        let colors: Vec<PaletteColor> = serde_json::from_str("[3, [255, 128, 0]]").unwrap();
        assert_eq!(colors[0], PaletteColor::Indexed(3));
        assert_eq!(colors[1], PaletteColor::Rgb(255, 128, 0));
        assert_eq!(serde_json::to_string(&colors).unwrap(), "[3,[255,128,0]]");
    }

    #[test]
    fn test_unknown_id_falls_back_to_default() {
        let set = PaletteSet::builtin();
        assert_eq!(set.get("nope").id, DEFAULT_PALETTE_ID);
        assert_eq!(set.get("fire").id, "fire");
    }

    #[test]
    fn test_resolve_prefers_layer_override() {
        let set = PaletteSet::builtin();
        let mut layer = LayerSettings::default();
        assert_eq!(set.resolve(&layer, "ice").id, "ice");
        layer.palette_id = Some("fire".to_string());
        assert_eq!(set.resolve(&layer, "ice").id, "fire");
        layer.palette_id = Some("missing".to_string());
        assert_eq!(set.resolve(&layer, "ice").id, "ice");
    }

    #[test]
    fn test_next_id_cycles() {
        let set = PaletteSet::builtin();
        let mut id = DEFAULT_PALETTE_ID.to_string();
        for _ in 0..set.len() {
            id = set.next_id(&id).to_string();
        }
        assert_eq!(id, DEFAULT_PALETTE_ID);
        assert_eq!(set.next_id("unknown"), DEFAULT_PALETTE_ID);
    }

    #[test]
    fn test_merge_file_overrides_and_adds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palettes.json");
        fs::write(
            &path,
            r#"[{"Id": "fire", "Name": "Hot", "Colors": [1, 17]},
                {"Id": "ocean", "Colors": [[0, 0, 128], 14]},
                {"Id": "blank", "Colors": []}]"#,
        )
        .unwrap();

        let mut set = PaletteSet::builtin();
        let before = set.len();
        assert_eq!(set.merge_file(&path).unwrap(), 3);
        assert_eq!(set.len(), before + 1);
        assert_eq!(set.get("fire").name, "Hot");
        assert_eq!(set.get("fire").color(1), PaletteColor::Indexed(1));
        assert_eq!(set.get("ocean").color(0), PaletteColor::Rgb(0, 0, 128));
        assert!(!set.contains("blank"));
    }
}
