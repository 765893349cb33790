//! Configuration management for `sitepack.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                            |
//! |------------|----------------------------------------------------|
//! | `[pack]`   | Build output location                              |
//! | `[inline]` | Which asset kinds get embedded                     |
//! | `[clean]`  | Post-inline deletion of assets and emptied dirs    |
//!
//! The config file is optional; a missing file yields defaults. CLI
//! arguments override file values after load.

mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::utils::path::normalize_path;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitepack.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackConfig {
    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Output location settings
    #[serde(default)]
    pub pack: PackSection,

    /// Asset-kind toggles for the inlining engine
    #[serde(default)]
    pub inline: InlineConfig,

    /// Cleanup behavior after inlining
    #[serde(default)]
    pub clean: CleanConfig,
}

/// `[pack]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackSection {
    /// Build output directory, relative to the config file
    pub output: PathBuf,
}

impl Default for PackSection {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
        }
    }
}

/// `[inline]` section - which asset kinds are embedded
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    /// Inline `<link rel="stylesheet">` references
    pub stylesheets: bool,
    /// Inline `<img>` references as base64 data URIs
    pub images: bool,
    /// Bundle and inline `<script src>` references
    pub scripts: bool,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            stylesheets: true,
            images: true,
            scripts: true,
        }
    }
}

/// `[clean]` section - reclaiming disk space after inlining
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Delete asset files (and adjacent source maps) once inlined
    pub delete_inlined: bool,
    /// Remove directories left empty by asset deletion
    pub remove_empty_dirs: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            delete_inlined: true,
            remove_empty_dirs: true,
        }
    }
}

impl PackConfig {
    /// Load configuration from CLI arguments.
    ///
    /// A missing config file is not an error; defaults apply and the project
    /// root falls back to the current directory.
    pub fn load(cli: &'static Cli) -> Result<Self, ConfigError> {
        let config_path = normalize_path(&cli.config);

        let mut config = if config_path.is_file() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(config_path.clone(), e))?;
            toml::from_str::<Self>(&raw)?
        } else {
            Self::default()
        };

        config.root = config_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.apply_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI overrides on top of file values.
    fn apply_cli(&mut self, cli: &Cli) {
        let Commands::Pack {
            output,
            keep_assets,
            keep_empty_dirs,
        } = &cli.command;

        if let Some(output) = output {
            self.pack.output = output.clone();
        }
        if *keep_assets {
            self.clean.delete_inlined = false;
        }
        if *keep_empty_dirs {
            self.clean.remove_empty_dirs = false;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pack.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "pack.output must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Absolute path of the build output directory.
    pub fn output_dir(&self) -> PathBuf {
        if self.pack.output.is_absolute() {
            self.pack.output.clone()
        } else {
            normalize_path(&self.root.join(&self.pack.output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PackConfig::default();
        assert!(config.inline.stylesheets);
        assert!(config.inline.images);
        assert!(config.inline.scripts);
        assert!(config.clean.delete_inlined);
        assert!(config.clean.remove_empty_dirs);
        assert_eq!(config.pack.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_parse_sections() {
        let config: PackConfig = toml::from_str(
            r#"
            [pack]
            output = "build/public"

            [inline]
            images = false

            [clean]
            remove_empty_dirs = false
            "#,
        )
        .unwrap();

        assert_eq!(config.pack.output, PathBuf::from("build/public"));
        assert!(!config.inline.images);
        assert!(config.inline.stylesheets);
        assert!(config.clean.delete_inlined);
        assert!(!config.clean.remove_empty_dirs);
    }

    #[test]
    fn test_empty_output_rejected() {
        let mut config = PackConfig::default();
        config.pack.output = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
