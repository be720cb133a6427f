use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// MaxRects placement heuristics.
/// Every heuristic scores a (free rect, orientation) candidate; lower is better.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    /// Shortest leftover side, then longest leftover side, then leftover area.
    BestShortSideFit,
    BestAreaFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Insertion orders for deterministic packing. Ties always fall back to id order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    MaxSideDesc,
    HeightDesc,
    WidthDesc,
    IdAsc,
    /// Keep the caller's order.
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "width_desc" => Ok(Self::WidthDesc),
            "id_asc" | "name_asc" => Ok(Self::IdAsc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Immutable-per-run packing and export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackingConfig {
    /// Bin width ceiling in pixels.
    pub max_width: u32,
    /// Bin height ceiling in pixels.
    pub max_height: u32,
    /// Gap between adjacent packed rectangles.
    pub padding: u32,
    /// Margin reserved along every bin edge.
    pub border: u32,
    /// Constrain bin dimensions to powers of two.
    pub pot: bool,
    /// Permit 90° rotation when it improves the fit.
    pub allow_rotation: bool,
    /// Run the trimmer before packing.
    pub trim_transparency: bool,
    /// Description format id (see `format::catalog`).
    pub export_format: String,

    #[serde(default = "default_heuristic")]
    pub heuristic: MaxRectsHeuristic,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    /// Collections larger than this are packed on a worker thread.
    #[serde(default = "default_worker_threshold")]
    pub worker_threshold: usize,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            max_width: 512,
            max_height: 512,
            padding: 2,
            border: 0,
            pot: true,
            allow_rotation: false,
            trim_transparency: true,
            export_format: "json".into(),
            heuristic: default_heuristic(),
            sort_order: default_sort_order(),
            worker_threshold: default_worker_threshold(),
        }
    }
}

impl PackingConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Dimensions are zero
    /// - The border leaves no usable space (also after power-of-two flooring)
    /// - Padding is at least the usable size, or overflows the bin size
    /// - `export_format` is not in the format catalog
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpriteForgeError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(SpriteForgeError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        let (cap_w, cap_h) = self.effective_max();
        let total_border = self.border.saturating_mul(2);
        if total_border >= cap_w || total_border >= cap_h {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "border ({}) * 2 leaves no usable space in a {}x{} bin",
                self.border, cap_w, cap_h
            )));
        }

        let (inner_w, inner_h) = (cap_w - total_border, cap_h - total_border);
        if self.padding >= inner_w || self.padding >= inner_h {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "padding ({}) leaves no usable space in a {}x{} area",
                self.padding, inner_w, inner_h
            )));
        }
        if cap_w.checked_add(self.padding).is_none() || cap_h.checked_add(self.padding).is_none() {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "bin size {}x{} plus padding ({}) is out of range",
                cap_w, cap_h, self.padding
            )));
        }

        crate::format::find_format(&self.export_format)?;
        Ok(())
    }

    /// Bin capacity actually usable: the configured maximum, floored to a
    /// power of two when `pot` is set.
    pub fn effective_max(&self) -> (u32, u32) {
        if self.pot {
            (prev_pow2(self.max_width), prev_pow2(self.max_height))
        } else {
            (self.max_width, self.max_height)
        }
    }

    /// Create a fluent builder for `PackingConfig`.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::new()
    }
}

/// Largest power of two `<= v` (0 stays 0).
pub(crate) fn prev_pow2(v: u32) -> u32 {
    if v == 0 { 0 } else { 1 << (31 - v.leading_zeros()) }
}

fn default_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestShortSideFit
}
fn default_sort_order() -> SortOrder {
    SortOrder::AreaDesc
}
fn default_worker_threshold() -> usize {
    50
}

/// Builder for `PackingConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackingConfigBuilder {
    cfg: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackingConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn border(mut self, v: u32) -> Self {
        self.cfg.border = v;
        self
    }
    pub fn pot(mut self, v: bool) -> Self {
        self.cfg.pot = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn trim_transparency(mut self, v: bool) -> Self {
        self.cfg.trim_transparency = v;
        self
    }
    pub fn export_format(mut self, v: impl Into<String>) -> Self {
        self.cfg.export_format = v.into();
        self
    }
    pub fn heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn worker_threshold(mut self, v: usize) -> Self {
        self.cfg.worker_threshold = v;
        self
    }
    pub fn build(self) -> PackingConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpriteForgeError;

    #[test]
    fn defaults_match_editor() {
        let cfg = PackingConfig::default();
        assert_eq!((cfg.max_width, cfg.max_height), (512, 512));
        assert_eq!(cfg.padding, 2);
        assert!(cfg.pot);
        assert!(!cfg.allow_rotation);
        assert!(cfg.trim_transparency);
        assert_eq!(cfg.export_format, "json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn prev_pow2_floors() {
        assert_eq!(prev_pow2(0), 0);
        assert_eq!(prev_pow2(1), 1);
        assert_eq!(prev_pow2(300), 256);
        assert_eq!(prev_pow2(512), 512);
    }

    #[test]
    fn effective_max_respects_pot() {
        let cfg = PackingConfig::builder().with_max_dimensions(300, 180).build();
        assert_eq!(cfg.effective_max(), (256, 128));
        let cfg = PackingConfig::builder()
            .with_max_dimensions(300, 180)
            .pot(false)
            .build();
        assert_eq!(cfg.effective_max(), (300, 180));
    }

    #[test]
    fn rejects_zero_and_oversized_border() {
        let cfg = PackingConfig::builder().with_max_dimensions(0, 64).build();
        assert!(matches!(
            cfg.validate(),
            Err(SpriteForgeError::InvalidDimensions { width: 0, height: 64 })
        ));
        let cfg = PackingConfig::builder().border(32).with_max_dimensions(64, 64).build();
        match cfg.validate() {
            Err(SpriteForgeError::InvalidConfig(msg)) => assert!(msg.contains("border")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn rejects_padding_without_room() {
        let cfg = PackingConfig::builder()
            .with_max_dimensions(64, 64)
            .padding(u32::MAX)
            .build();
        match cfg.validate() {
            Err(SpriteForgeError::InvalidConfig(msg)) => assert!(msg.contains("padding")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
        let cfg = PackingConfig::builder()
            .with_max_dimensions(64, 64)
            .border(8)
            .padding(48)
            .build();
        assert!(matches!(cfg.validate(), Err(SpriteForgeError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_caps_that_overflow_with_padding() {
        let cfg = PackingConfig::builder()
            .with_max_dimensions(u32::MAX, u32::MAX)
            .pot(false)
            .build();
        assert!(matches!(cfg.validate(), Err(SpriteForgeError::InvalidConfig(_))));
        let no_pad = PackingConfig { padding: 0, ..cfg };
        assert!(no_pad.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_format() {
        let cfg = PackingConfig::builder().export_format("unknown-format-xyz").build();
        assert!(matches!(cfg.validate(), Err(SpriteForgeError::UnknownFormat(_))));
    }

    #[test]
    fn parses_enums() {
        assert_eq!("bssf".parse(), Ok(MaxRectsHeuristic::BestShortSideFit));
        assert_eq!("CP".parse(), Ok(MaxRectsHeuristic::ContactPoint));
        assert_eq!("area_desc".parse(), Ok(SortOrder::AreaDesc));
        assert!("diagonal".parse::<SortOrder>().is_err());
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(PackingConfig::default()).expect("json");
        assert_eq!(json["maxWidth"], 512);
        assert_eq!(json["allowRotation"], false);
        assert_eq!(json["exportFormat"], "json");
    }
}
