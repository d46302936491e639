use eframe::egui;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomStep {
    In,
    Out,
}

/// Zoom factor shared by every axis. Always within `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Default for Zoom {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Zoom {
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(MIN_ZOOM, MAX_ZOOM))
        } else {
            Self::default()
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.0 * factor)
    }
}

/// Where an axis bitmap lands inside its container, in on-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub rect: egui::Rect,
    pub bitmap_size: [usize; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageCoord {
    /// Relative position inside the placed image, both components in `[0, 1]`.
    Inside(egui::Pos2),
    Outside,
}

impl ImageCoord {
    pub fn inside(self) -> Option<egui::Pos2> {
        match self {
            Self::Inside(relative) => Some(relative),
            Self::Outside => None,
        }
    }
}

/// Fits the bitmap into the container, applies the shared zoom, centers it and
/// shifts it by the axis pan offset.
pub fn place(
    container: egui::Vec2,
    bitmap_size: [usize; 2],
    zoom: Zoom,
    pan: egui::Vec2,
) -> Placement {
    let [bitmap_width, bitmap_height] = bitmap_size;
    if bitmap_width == 0 || bitmap_height == 0 || container.x <= 0.0 || container.y <= 0.0 {
        return Placement {
            rect: egui::Rect::from_min_size(egui::Pos2::ZERO, egui::Vec2::ZERO),
            bitmap_size,
        };
    }

    let bitmap = egui::vec2(bitmap_width as f32, bitmap_height as f32);
    let scale = (container.x / bitmap.x).min(container.y / bitmap.y) * zoom.value();
    let scaled = bitmap * scale;
    let origin = ((container - scaled) / 2.0 + pan).to_pos2();
    Placement {
        rect: egui::Rect::from_min_size(origin, scaled),
        bitmap_size,
    }
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.rect.width() <= 0.0 || self.rect.height() <= 0.0
    }

    pub fn to_image_coord(&self, pointer: egui::Pos2) -> ImageCoord {
        if self.is_empty() || !self.rect.contains(pointer) {
            return ImageCoord::Outside;
        }
        let relative = (pointer - self.rect.min) / self.rect.size();
        ImageCoord::Inside(relative.to_pos2())
    }

    pub fn from_relative(&self, relative: egui::Pos2) -> egui::Pos2 {
        self.rect.min + relative.to_vec2() * self.rect.size()
    }

    /// Bitmap pixel under a relative coordinate, clamped to the last row/column.
    pub fn pixel_at(&self, relative: egui::Pos2) -> [usize; 2] {
        let [width, height] = self.bitmap_size;
        let x = (relative.x * width as f32).floor() as usize;
        let y = (relative.y * height as f32).floor() as usize;
        [
            x.min(width.saturating_sub(1)),
            y.min(height.saturating_sub(1)),
        ]
    }

    /// Screen row of a depth index on a cross-sectional view.
    pub fn depth_to_screen_y(&self, z: f32, depth: usize) -> f32 {
        if depth == 0 {
            return self.rect.top();
        }
        self.rect.top() + z / depth as f32 * self.rect.height()
    }

    /// Unclamped depth index under a screen row of a cross-sectional view.
    pub fn screen_y_to_depth(&self, y: f32, depth: usize) -> i64 {
        if self.is_empty() {
            return 0;
        }
        ((y - self.rect.top()) / self.rect.height() * depth as f32).floor() as i64
    }
}
