use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Plain-data packing input: the effective footprint of one sprite
/// (trimmed size when a trim rect is present, raw size otherwise).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteSize {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl SpriteSize {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// One placement inside a bin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackedRect {
    /// Back-reference to the sprite, not ownership.
    pub sprite_id: String,
    pub x: u32,
    pub y: u32,
    /// Footprint width as packed (trimmed width, or trimmed height when rotated).
    pub width: u32,
    pub height: u32,
    /// True if the sprite was rotated 90° clockwise to fit.
    pub rot: bool,
}

impl PackedRect {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// One output atlas surface. `rects` keep placement order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackedBin {
    pub width: u32,
    pub height: u32,
    pub rects: Vec<PackedRect>,
}

impl PackedBin {
    pub fn stats(&self) -> PackStats {
        PackStats::from_bins(std::slice::from_ref(self))
    }

    pub fn find(&self, sprite_id: &str) -> Option<&PackedRect> {
        self.rects.iter().find(|r| r.sprite_id == sprite_id)
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PackStats {
    /// Number of bins; each bin is one texture bind (draw call) at runtime.
    pub num_bins: usize,
    pub num_rects: usize,
    pub total_bin_area: u64,
    pub used_area: u64,
    /// used_area / total_bin_area as a percentage (0.0 to 100.0).
    pub density: f64,
    /// Estimated GPU memory for all bins as RGBA8888.
    pub vram_bytes: u64,
    /// True when every bin has power-of-two width and height.
    pub power_of_two: bool,
    pub num_rotated: usize,
    pub max_bin_width: u32,
    pub max_bin_height: u32,
}

impl PackStats {
    pub fn from_bins(bins: &[PackedBin]) -> Self {
        let mut num_rects = 0;
        let mut total_bin_area = 0u64;
        let mut used_area = 0u64;
        let mut num_rotated = 0;
        let mut max_bin_width = 0u32;
        let mut max_bin_height = 0u32;
        let mut power_of_two = !bins.is_empty();

        for bin in bins {
            total_bin_area += bin.width as u64 * bin.height as u64;
            max_bin_width = max_bin_width.max(bin.width);
            max_bin_height = max_bin_height.max(bin.height);
            power_of_two &= bin.width.is_power_of_two() && bin.height.is_power_of_two();
            for r in &bin.rects {
                num_rects += 1;
                used_area += r.width as u64 * r.height as u64;
                if r.rot {
                    num_rotated += 1;
                }
            }
        }

        let density = if total_bin_area > 0 {
            used_area as f64 / total_bin_area as f64 * 100.0
        } else {
            0.0
        };

        PackStats {
            num_bins: bins.len(),
            num_rects,
            total_bin_area,
            used_area,
            density,
            vram_bytes: total_bin_area * 4,
            power_of_two,
            num_rotated,
            max_bin_width,
            max_bin_height,
        }
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste(&self) -> f64 {
        if self.total_bin_area > 0 {
            100.0 - self.density
        } else {
            0.0
        }
    }

    /// VRAM estimate formatted as KB below one megabyte, MB above.
    pub fn vram_label(&self) -> String {
        let bytes = self.vram_bytes as f64;
        if self.vram_bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes / 1024.0)
        } else {
            format!("{:.1} MB", bytes / (1024.0 * 1024.0))
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Bins: {}, Sprites: {}, Density: {:.2}%, Waste: {:.2}%, VRAM: {}, POT: {}, Rotated: {}",
            self.num_bins,
            self.num_rects,
            self.density,
            self.waste(),
            self.vram_label(),
            if self.power_of_two { "yes" } else { "no" },
            self.num_rotated,
        )
    }
}
