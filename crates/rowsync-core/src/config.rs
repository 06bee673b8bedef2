//! Grid configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! page_size = 50
//!
//! [editing]
//! mode = "inline"
//! autosave = true
//! add_to_bottom = false
//! ```
//!
//! Omitting the `[editing]` table makes the grid read-only.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// How field editors are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Inline,
    Popup,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingConfig {
    pub mode: EditMode,
    /// Request a sync after every add, update and delete
    pub autosave: bool,
    /// Append new rows instead of prepending them
    pub add_to_bottom: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub page_size: usize,
    pub editing: Option<EditingConfig>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            editing: None,
        }
    }
}

impl GridConfig {
    /// An editable configuration with default editing options
    pub fn editable() -> Self {
        Self {
            editing: Some(EditingConfig::default()),
            ..Self::default()
        }
    }

    pub fn with_editing(mut self, editing: EditingConfig) -> Self {
        self.editing = Some(editing);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: GridConfig =
            toml::from_str(s).map_err(|e| GridError::Config(e.to_string()))?;
        if config.page_size == 0 {
            return Err(GridError::Config("page_size must be greater than 0".to_string()));
        }
        Ok(config)
    }

    pub fn is_editable(&self) -> bool {
        self.editing.is_some()
    }

    pub fn autosave(&self) -> bool {
        self.editing.as_ref().is_some_and(|e| e.autosave)
    }

    pub fn add_to_bottom(&self) -> bool {
        self.editing.as_ref().is_some_and(|e| e.add_to_bottom)
    }
}
