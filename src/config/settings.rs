use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::viewer::{OverlayStyle, RemapPolicy};

use super::{ConfigError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub default_width: f32,
    pub default_level: f32,
    /// Width change per pixel of horizontal drag.
    pub width_sensitivity: f32,
    /// Level change per pixel of vertical drag.
    pub level_sensitivity: f32,
    /// Seed the window from the volume's min/max instead of the defaults above.
    pub seed_from_data: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            default_width: 400.0,
            default_level: 40.0,
            width_sensitivity: 2.0,
            level_sensitivity: 1.0,
            seed_from_data: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub wheel_in: f32,
    pub wheel_out: f32,
    pub step_in: f32,
    pub step_out: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            wheel_in: 1.1,
            wheel_out: 0.9,
            step_in: 1.2,
            step_out: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowSettings,
    pub zoom: ZoomSettings,
    /// Depth indices per pixel of vertical scrub.
    pub scrub_sensitivity: f32,
    pub remap: RemapPolicy,
    pub overlay: OverlayStyle,
    /// Initial view size in pixels, `[width, height]`.
    pub container: [f32; 2],
    /// Reader name folded into label file names.
    pub doctor_name: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            zoom: ZoomSettings::default(),
            scrub_sensitivity: 0.5,
            remap: RemapPolicy::default(),
            overlay: OverlayStyle::default(),
            container: [512.0, 512.0],
            doctor_name: None,
        }
    }
}

impl ViewerConfig {
    pub fn container_size(&self) -> egui::Vec2 {
        egui::vec2(self.container[0], self.container[1])
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("window.default_width", self.window.default_width),
            ("window.width_sensitivity", self.window.width_sensitivity),
            ("window.level_sensitivity", self.window.level_sensitivity),
            ("zoom.wheel_in", self.zoom.wheel_in),
            ("zoom.wheel_out", self.zoom.wheel_out),
            ("zoom.step_in", self.zoom.step_in),
            ("zoom.step_out", self.zoom.step_out),
            ("scrub_sensitivity", self.scrub_sensitivity),
            ("container.width", self.container[0]),
            ("container.height", self.container[1]),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` must be a positive number, got {value}"
                )));
            }
        }
        if !self.window.default_level.is_finite() {
            return Err(ConfigError::Invalid(
                "`window.default_level` must be finite".to_string(),
            ));
        }
        if self.zoom.wheel_in <= 1.0 || self.zoom.step_in <= 1.0 {
            return Err(ConfigError::Invalid(
                "zoom-in factors must be greater than 1".to_string(),
            ));
        }
        if self.zoom.wheel_out >= 1.0 || self.zoom.step_out >= 1.0 {
            return Err(ConfigError::Invalid(
                "zoom-out factors must be less than 1".to_string(),
            ));
        }
        if self
            .doctor_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "`doctor_name` must not be blank when set".to_string(),
            ));
        }
        Ok(())
    }
}
