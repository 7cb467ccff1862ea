use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const QUALIFIER: &str = "com";
pub const ORGANIZATION: &str = "sectionsmith";
pub const APPLICATION: &str = "sectionsmith";

pub fn config_root() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map(|p| p.config_dir().to_path_buf())
}

pub fn default_config_path() -> Option<PathBuf> {
    config_root().map(|dir| dir.join("config.toml"))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConvertOptions {
    /// Paragraphs longer than this (in chars) become page-level richtext settings.
    pub paragraph_min_chars: usize,
    pub featured_products: bool,
    pub featured_min_confidence: f64,
    pub structural_groups: bool,
    pub inject_blocks: Vec<String>,
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            paragraph_min_chars: 10,
            featured_products: false,
            featured_min_confidence: 0.6,
            structural_groups: true,
            inject_blocks: Vec::new(),
            custom_patterns: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomPattern {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    pub selector: String,
    #[serde(default = "default_max_instances")]
    pub max_instances: usize,
    #[serde(default = "default_min_instances")]
    pub min_instances: usize,
}

fn default_max_instances() -> usize {
    12
}

fn default_min_instances() -> usize {
    2
}
