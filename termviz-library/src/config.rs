//! Settings persistence for termviz
//!
//! Stores the layer list, global palette and beat sensitivity as JSON.

use crate::layer::{default_layers, LayerSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const DEFAULT_PALETTE_ID: &str = "default";
pub const DEFAULT_BEAT_SENSITIVITY: f32 = 1.3;

/// Complete visualizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VisualizerSettings {
    pub layers: Vec<LayerSettings>,
    /// Palette used by layers without their own override
    pub palette_id: String,
    pub beat_sensitivity: f32,
    pub show_header: bool,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            layers: default_layers(),
            palette_id: DEFAULT_PALETTE_ID.to_string(),
            beat_sensitivity: DEFAULT_BEAT_SENSITIVITY,
            show_header: true,
        }
    }
}

impl VisualizerSettings {
    /// Load settings from the default location
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_or_default(&path)
    }

    /// Load settings from `path`, falling back to defaults with a warning
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to load settings: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse settings JSON and sanitize the result
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = serde_json::from_str(content)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Directory holding settings and palette files
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termviz")
    }

    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Clamp values and restore defaults for empty fields
    pub fn sanitize(&mut self) {
        if self.layers.is_empty() {
            self.layers = default_layers();
        }
        for layer in &mut self.layers {
            layer.sanitize();
        }
        if self.palette_id.trim().is_empty() {
            self.palette_id = DEFAULT_PALETTE_ID.to_string();
        }
        if !self.beat_sensitivity.is_finite() {
            self.beat_sensitivity = DEFAULT_BEAT_SENSITIVITY;
        }
        self.beat_sensitivity = self.beat_sensitivity.clamp(0.5, 3.0);
    }

    /// Indices of enabled layers, sorted by z-order (stable for ties)
    pub fn draw_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.enabled)
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| self.layers[i].z_order);
        order
    }

    pub fn layer(&self, index: usize) -> Option<&LayerSettings> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut LayerSettings> {
        self.layers.get_mut(index)
    }
}
