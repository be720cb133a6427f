use crate::model::{Rect, Size, SpriteSize};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of the trimmer for one sprite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrimStatus {
    /// Not trimmed yet, or trimming disabled.
    #[default]
    Untrimmed,
    Trimmed,
    /// No pixel with alpha > 0; the sprite keeps its raw size.
    FullyTransparent,
    /// Source decoded without an alpha channel; nothing can be trimmed.
    NoAlpha,
}

/// Trim metadata: the opaque bounding box within the raw image and the raw size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrimInfo {
    pub trim_rect: Rect,
    pub source_size: Size,
}

/// A named raster image plus packing metadata.
///
/// Pixel data is shared and never mutated; trimming only replaces the trim fields.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub trimmed: bool,
    pub trim_rect: Option<Rect>,
    pub source_size: Option<Size>,
    pub trim_status: TrimStatus,
    has_alpha: bool,
    pixels: Arc<RgbaImage>,
}

impl Sprite {
    /// Build a sprite from a decoded image. The alpha capability is taken from
    /// the decoded color type before conversion to RGBA.
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: DynamicImage) -> Self {
        let has_alpha = image.color().has_alpha();
        let rgba = image.to_rgba8();
        Self::with_pixels(id.into(), name.into(), rgba, has_alpha)
    }

    /// Build a sprite from RGBA pixels (alpha channel present).
    pub fn from_rgba(id: impl Into<String>, name: impl Into<String>, rgba: RgbaImage) -> Self {
        Self::with_pixels(id.into(), name.into(), rgba, true)
    }

    fn with_pixels(id: String, name: String, rgba: RgbaImage, has_alpha: bool) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            id,
            name,
            width,
            height,
            trimmed: false,
            trim_rect: None,
            source_size: None,
            trim_status: TrimStatus::Untrimmed,
            has_alpha,
            pixels: Arc::new(rgba),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub(crate) fn apply_trim(&mut self, info: TrimInfo) {
        self.trimmed = true;
        self.trim_rect = Some(info.trim_rect);
        self.source_size = Some(info.source_size);
        self.trim_status = TrimStatus::Trimmed;
    }

    /// Drop trim metadata (used when trimming gets disabled).
    pub fn clear_trim(&mut self) {
        self.trimmed = false;
        self.trim_rect = None;
        self.source_size = None;
        self.trim_status = TrimStatus::Untrimmed;
    }

    /// Region of the raw image that gets packed.
    pub fn source_rect(&self) -> Rect {
        match (self.trimmed, self.trim_rect) {
            (true, Some(r)) => r,
            _ => Rect::new(0, 0, self.width, self.height),
        }
    }

    /// Size handed to the packer.
    pub fn packing_size(&self) -> SpriteSize {
        let r = self.source_rect();
        SpriteSize::new(self.id.clone(), r.w, r.h)
    }
}

/// Access to sprite metadata by id, used by serializers.
pub trait SpriteMetaLookup {
    fn sprite_meta(&self, id: &str) -> Option<&Sprite>;
}

/// Access to sprite pixels by id, used by the compositor.
/// Every metadata lookup also carries pixels, so one trait bound covers both.
pub trait SpriteImageLookup: SpriteMetaLookup {
    fn sprite_pixels(&self, id: &str) -> Option<&RgbaImage> {
        self.sprite_meta(id).map(|s| s.pixels())
    }
}

impl SpriteMetaLookup for [Sprite] {
    fn sprite_meta(&self, id: &str) -> Option<&Sprite> {
        self.iter().find(|s| s.id == id)
    }
}

impl SpriteImageLookup for [Sprite] {}

impl SpriteMetaLookup for Vec<Sprite> {
    fn sprite_meta(&self, id: &str) -> Option<&Sprite> {
        self.as_slice().sprite_meta(id)
    }
}

impl SpriteImageLookup for Vec<Sprite> {}

impl SpriteMetaLookup for HashMap<String, Sprite> {
    fn sprite_meta(&self, id: &str) -> Option<&Sprite> {
        self.get(id)
    }
}

impl SpriteImageLookup for HashMap<String, Sprite> {}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn rgb_source_has_no_alpha() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let s = Sprite::new("a", "a", img);
        assert!(!s.has_alpha());
        assert_eq!((s.width, s.height), (4, 4));
        assert_eq!(s.pixels().get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn packing_size_follows_trim() {
        let mut s = Sprite::from_rgba("a", "a", RgbaImage::new(20, 10));
        assert_eq!(s.packing_size(), SpriteSize::new("a", 20, 10));
        s.apply_trim(TrimInfo {
            trim_rect: Rect::new(2, 3, 5, 4),
            source_size: Size::new(20, 10),
        });
        assert_eq!(s.packing_size(), SpriteSize::new("a", 5, 4));
        s.clear_trim();
        assert_eq!(s.packing_size(), SpriteSize::new("a", 20, 10));
        assert_eq!(s.trim_status, TrimStatus::Untrimmed);
    }

    #[test]
    fn lookups_by_id() {
        let sprites = vec![
            Sprite::from_rgba("a", "alpha", RgbaImage::new(1, 1)),
            Sprite::from_rgba("b", "beta", RgbaImage::new(2, 2)),
        ];
        assert_eq!(sprites.sprite_meta("b").map(|s| s.name.as_str()), Some("beta"));
        assert!(sprites.sprite_pixels("zzz").is_none());
        let map: HashMap<String, Sprite> = sprites.into_iter().map(|s| (s.id.clone(), s)).collect();
        assert_eq!(map.sprite_pixels("b").map(|p| p.width()), Some(2));
    }
}
