//! Startup configuration.
//!
//! Every value has a default matching the stock cube demo. An optional TOML
//! file can override any subset of them; nothing is read from the command line.

use std::{io, path::Path};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "vkcube.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub limits: Limits,
}

impl AppConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Reads `path` if it exists, otherwise falls back to the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(&path) {
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config at {:?}, using defaults", path.as_ref());
                Ok(Self::default())
            }
            res => res,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Test".into(),
            width: 480,
            height: 270,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    /// Clear-only pass, nothing drawn.
    None,
    Triangle,
    #[default]
    Cube,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub app_name: String,
    pub validation: bool,
    pub image_count: u32,
    pub clear_color: [f32; 4],
    /// Binds a per-image uniform block with world/view/projection matrices.
    pub uniform_block: bool,
    pub mesh: MeshKind,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "My Vulkan Test Project".into(),
            validation: cfg!(debug_assertions),
            image_count: 3,
            clear_color: [0.0, 0.0, 0.3, 1.0],
            uniform_block: true,
            mesh: MeshKind::Cube,
            vertex_shader: "data/shaders/cube.vert.spv".into(),
            fragment_shader: "data/shaders/cube.frag.spv".into(),
        }
    }
}

/// Upper bounds on enumerated lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_adapters: usize,
    pub max_queue_families: usize,
    pub max_surface_formats: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_adapters: 10,
            max_queue_families: 128,
            max_surface_formats: 128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [window]
            width = 800

            [renderer]
            uniform_block = false
            mesh = "triangle"
            vertex_shader = "data/shaders/flat.vert.spv"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 270);
        assert_eq!(config.window.title, "Vulkan Test");
        assert!(!config.renderer.uniform_block);
        assert_eq!(config.renderer.mesh, MeshKind::Triangle);
        assert_eq!(config.renderer.vertex_shader, "data/shaders/flat.vert.spv");
        assert_eq!(config.renderer.fragment_shader, "data/shaders/cube.frag.spv");
        assert_eq!(config.renderer.image_count, 3);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml("[renderer]\nimage_cout = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default("definitely/not/here/vkcube.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_limits_match_fixed_capacities() {
        let limits = Limits::default();
        assert_eq!(limits.max_adapters, 10);
        assert_eq!(limits.max_queue_families, 128);
        assert_eq!(limits.max_surface_formats, 128);
    }
}
