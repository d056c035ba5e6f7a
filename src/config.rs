pub mod range_types;

use crate::errors::{NavError, NavResult};
use crate::pathfinding::PathfindingConfig;
use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().and_then(|mut path| {
        path.push("navgrid");
        fs::create_dir_all(&path).ok()?;
        path.push("config.toml");
        Some(path)
    })
}

/// Load the user config, falling back to defaults when it is missing or invalid
pub fn load_config() -> PathfindingConfig {
    if let Some(config_path) = get_config_path() {
        if config_path.exists() {
            match load_config_from(&config_path) {
                Ok(config) => return config,
                Err(err) => warn!("Ignoring config at {}: {err}", config_path.display()),
            }
        }
    }
    PathfindingConfig::default()
}

/// Load and validate a config file at an explicit path
pub fn load_config_from<P: AsRef<Path>>(path: P) -> NavResult<PathfindingConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(NavError::ConfigFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path)?;
    let config = toml::from_str::<PathfindingConfig>(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(config: &PathfindingConfig) -> NavResult<()> {
    let config_path = get_config_path().ok_or(NavError::ConfigDirNotFound)?;
    save_config_to(config, config_path)
}

pub fn save_config_to<P: AsRef<Path>>(config: &PathfindingConfig, path: P) -> NavResult<()> {
    validate_config(config)?;
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Field ranges plus the relations between thresholds
pub fn validate_config(config: &PathfindingConfig) -> NavResult<()> {
    config.validate().map_err(|validation_errors| {
        let error_details = validation_errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                format!("{field}: {}", error_msgs.join(", "))
            })
            .collect::<Vec<String>>()
            .join("; ");

        NavError::InvalidConfig {
            reason: error_details,
        }
    })?;

    if config.steep_slope >= config.max_slope {
        return Err(NavError::InvalidConfig {
            reason: format!(
                "steep_slope ({}) must be below max_slope ({})",
                config.steep_slope, config.max_slope
            ),
        });
    }

    if config.inflation_near_radius > config.inflation_far_radius {
        return Err(NavError::InvalidConfig {
            reason: format!(
                "inflation_near_radius ({}) exceeds inflation_far_radius ({})",
                config.inflation_near_radius, config.inflation_far_radius
            ),
        });
    }

    Ok(())
}
