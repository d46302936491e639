use eframe::egui;
use rayon::prelude::*;

/// Narrowest window the mapper accepts.
pub const MIN_WIDTH: f32 = 1.0;

/// Window width/level contrast model with the defaults captured at load time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastWindow {
    width: f32,
    level: f32,
    default_width: f32,
    default_level: f32,
}

impl Default for ContrastWindow {
    fn default() -> Self {
        Self::new(400.0, 40.0)
    }
}

impl ContrastWindow {
    pub fn new(width: f32, level: f32) -> Self {
        let width = floor_width(width);
        Self {
            width,
            level,
            default_width: width,
            default_level: level,
        }
    }

    /// Seeds both the live window and the defaults from an intensity range.
    pub fn seed_from_range(min: f32, max: f32) -> Self {
        Self::new(max - min, (min + max) / 2.0)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn defaults(&self) -> (f32, f32) {
        (self.default_width, self.default_level)
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = floor_width(width);
    }

    pub fn set_level(&mut self, level: f32) {
        if level.is_finite() {
            self.level = level;
        }
    }

    pub fn reset(&mut self) {
        self.width = self.default_width;
        self.level = self.default_level;
    }

    pub fn bounds(&self) -> (f32, f32) {
        (
            self.level - self.width / 2.0,
            self.level + self.width / 2.0,
        )
    }

    pub fn remap(&self, sample: f32) -> f32 {
        let (low, high) = self.bounds();
        if sample <= low {
            0.0
        } else if sample >= high {
            255.0
        } else {
            (sample - low) / (high - low) * 255.0
        }
    }

    pub fn remap_u8(&self, sample: u8) -> u8 {
        self.remap(f32::from(sample)).round() as u8
    }

    pub fn lookup_table(&self) -> [u8; 256] {
        let mut table = [0_u8; 256];
        for (sample, entry) in table.iter_mut().enumerate() {
            *entry = self.remap_u8(sample as u8);
        }
        table
    }

    pub fn remap_buffer(&self, pixels: &mut [u8]) {
        let table = self.lookup_table();
        pixels
            .par_iter_mut()
            .for_each(|pixel| *pixel = table[*pixel as usize]);
    }

    pub fn display_text(&self) -> String {
        format!(
            "Width: {} | Level: {}",
            self.width.round(),
            self.level.round()
        )
    }
}

fn floor_width(width: f32) -> f32 {
    if width.is_finite() {
        width.max(MIN_WIDTH)
    } else {
        MIN_WIDTH
    }
}

/// A contrast drag in progress. Deltas are measured from the press position
/// against the window captured at press time, so nothing accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowDrag {
    origin: egui::Pos2,
    start_width: f32,
    start_level: f32,
}

impl WindowDrag {
    pub fn begin(origin: egui::Pos2, window: &ContrastWindow) -> Self {
        Self {
            origin,
            start_width: window.width(),
            start_level: window.level(),
        }
    }

    pub fn update(
        &self,
        window: &mut ContrastWindow,
        pointer: egui::Pos2,
        width_sensitivity: f32,
        level_sensitivity: f32,
    ) {
        let delta = pointer - self.origin;
        window.set_width(self.start_width + delta.x * width_sensitivity);
        // Dragging down lowers the level, which brightens the image.
        window.set_level(self.start_level - delta.y * level_sensitivity);
    }
}
