//! Configuration for the tree engine
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding `database_path`
pub const DB_PATH_ENV: &str = "ORGTREE_DB_PATH";

/// Palette cycled through by the color assigner, in order
pub const DEFAULT_PALETTE: [&str; 11] = [
    "#F6AF8E", "#C3A5FF", "#B1D0A5", "#F6ED8E", "#8EF4F6", "#C0F68E", "#F68ECB", "#8E97F6",
    "#F68EAB", "#F6CE8E", "#DFF68E",
];

/// Node types that receive a color at creation
pub const DEFAULT_COLOR_BEARING_TYPES: [&str; 2] = ["location", "department"];

/// Configuration for the org tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrgTreeConfig {
    /// Database file location
    pub database_path: PathBuf,

    /// Ordered color palette (`#RRGGBB` entries)
    pub palette: Vec<String>,

    /// Node types that receive a palette color
    pub color_bearing_types: Vec<String>,
}

impl Default for OrgTreeConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            color_bearing_types: DEFAULT_COLOR_BEARING_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl OrgTreeConfig {
    /// Defaults overlaid with `ORGTREE_DB_PATH` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("database_path cannot be empty".to_string());
        }

        if self.palette.is_empty() {
            return Err("palette must contain at least one color".to_string());
        }

        if let Some(bad) = self.palette.iter().find(|c| !is_hex_color(c)) {
            return Err(format!("palette entry '{}' is not a #RRGGBB color", bad));
        }

        if self.color_bearing_types.iter().any(|t| t.trim().is_empty()) {
            return Err("color_bearing_types cannot contain blank entries".to_string());
        }

        Ok(())
    }
}

/// `~/.orgtree/database/orgtree.db`, or a relative path if no home exists
fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".orgtree").join("database"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .join("orgtree.db")
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
