//! # Configuration
//!
//! Runtime settings shared by the tutorial binaries, read from JSON.
//!
//! ## Lookup
//!
//! 1. The path given as the first command line argument.
//! 2. [`DEFAULT_CONFIG_PATH`], when that file exists.
//! 3. Built-in defaults.
//!
//! Every field is optional; missing fields take their defaults. Unknown fields are rejected so
//! typos surface as errors instead of being ignored.
//!
//! ## Example
//!
//! ```json
//! {
//!   "window": { "width": 800, "height": 600 },
//!   "logging": { "filter": "debug" },
//!   "camera": { "fov_y_degrees": 60.0, "clip_depth": "negative_one_to_one" },
//!   "color_seed": 7
//! }
//! ```

use std::path::{Path, PathBuf};

use nalgebra_glm::{vec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::transform::ClipDepth;

/// Configuration file read when no path is passed on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "resources/config/default_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Overrides the tutorial's own window title.
    pub title: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `env_logger` filter directives. `RUST_LOG` is used when absent.
    pub filter: Option<String>,
}

/// The fixed camera of the MVP tutorial and the projection of all tutorials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub clip_depth: ClipDepth,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            eye: vec3(4.0, 3.0, 3.0),
            target: vec3(0.0, 0.0, 0.0),
            up: vec3(0.0, 1.0, 0.0),
            clip_depth: ClipDepth::default(),
        }
    }
}

/// First-person controls of the model tutorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlsConfig {
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Look speed in radians per pixel of mouse motion.
    pub mouse_speed: f32,
    pub position: Vec3,
    /// Yaw in radians; pi looks down negative Z.
    pub horizontal_angle: f32,
    /// Pitch in radians.
    pub vertical_angle: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            mouse_speed: 0.005,
            position: vec3(0.0, 0.0, 5.0),
            horizontal_angle: std::f32::consts::PI,
            vertical_angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    /// OBJ file drawn by the model tutorial.
    pub model_path: PathBuf,
    /// Seed of the per-vertex colors.
    pub color_seed: u64,
    /// Reads the shader files (`simple.vert.wgsl`, `simple.frag.wgsl`, `mvp.vert.wgsl`,
    /// `colored.vert.wgsl`, `colored.frag.wgsl`) from here instead of the embedded copies.
    pub shader_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            logging: LoggingConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            model_path: PathBuf::from("resources/models/cube.obj"),
            color_seed: 0x5eed,
            shader_dir: None,
        }
    }
}

impl Config {
    /// Loads the configuration following the lookup order described in the module docs.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when an explicitly given file cannot be read, or when any chosen file is
    /// not valid configuration JSON.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    log::debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Vertical field of view of the camera in radians.
    pub fn fov_y(&self) -> f32 {
        self.camera.fov_y_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_tutorials() {
        let config = Config::default();
        assert_eq!((config.window.width, config.window.height), (1024, 768));
        assert_eq!(config.camera.fov_y_degrees, 45.0);
        assert_eq!(config.camera.eye, vec3(4.0, 3.0, 3.0));
        assert_eq!(config.controls.position, vec3(0.0, 0.0, 5.0));
        assert_eq!(config.controls.horizontal_angle, std::f32::consts::PI);
        assert_eq!(config.model_path, PathBuf::from("resources/models/cube.obj"));
        assert!(config.shader_dir.is_none());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{
            "window": { "width": 800 },
            "camera": { "fov_y_degrees": 60.0, "clip_depth": "negative_one_to_one" },
            "color_seed": 7
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.camera.clip_depth, ClipDepth::NegativeOneToOne);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.color_seed, 7);
        assert!((config.fov_y() - 60.0_f32.to_radians()).abs() < 1.0e-6);
    }

    #[test]
    fn vectors_are_json_arrays() {
        let json = r#"{ "camera": { "eye": [1.0, 2.0, 3.0] } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.camera.eye, vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "widht": 3 }"#).is_err());
        assert!(serde_json::from_str::<Config>(r#"{ "window": { "widht": 3 } }"#).is_err());
    }

    #[test]
    fn from_file_reports_path_on_failure() {
        let dir = std::env::temp_dir().join(format!("tutorial-core-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        match Config::load(Some(&missing)) {
            Err(ConfigError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }

        let broken = dir.join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Config::load(Some(&broken)),
            Err(ConfigError::Parse { .. })
        ));

        let valid = dir.join("valid.json");
        std::fs::write(&valid, r#"{ "shader_dir": "shaders" }"#).unwrap();
        let config = Config::load(Some(&valid)).unwrap();
        assert_eq!(config.shader_dir, Some(PathBuf::from("shaders")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn shipped_default_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.model_path, Config::default().model_path);
        assert_eq!(config.color_seed, Config::default().color_seed);
    }
}
