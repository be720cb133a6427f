use crate::config::PackingConfig;
use crate::model::{Rect, Size};
use crate::sprite::{Sprite, TrimInfo, TrimStatus};
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scan every pixel once and return the tight box around all pixels with alpha > 0.
/// Returns `None` for a fully transparent (or empty) image.
pub fn trim_image(rgba: &RgbaImage) -> Option<TrimInfo> {
    let (w, h) = rgba.dimensions();
    // (min_x, min_y, max_x, max_y), inclusive
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, px) in rgba.enumerate_pixels() {
        if px[3] > 0 {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }

    let (min_x, min_y, max_x, max_y) = bounds?;
    Some(TrimInfo {
        trim_rect: Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
        source_size: Size::new(w, h),
    })
}

/// Trim one sprite in place.
///
/// Idempotent: a sprite that is already trimmed keeps its metadata and the
/// pixels are not scanned again.
pub fn trim_sprite(sprite: &mut Sprite) -> TrimStatus {
    if sprite.trimmed && sprite.trim_rect.is_some() {
        return TrimStatus::Trimmed;
    }
    if sprite.width == 0 || sprite.height == 0 {
        // left at 0x0 so the packer rejects it
        sprite.clear_trim();
        return TrimStatus::Untrimmed;
    }
    if !sprite.has_alpha() {
        sprite.trim_status = TrimStatus::NoAlpha;
        return TrimStatus::NoAlpha;
    }
    match trim_image(sprite.pixels()) {
        Some(info) => {
            sprite.apply_trim(info);
            TrimStatus::Trimmed
        }
        None => {
            debug!(id = %sprite.id, "fully transparent sprite, keeping raw size");
            sprite.clear_trim();
            sprite.trim_status = TrimStatus::FullyTransparent;
            TrimStatus::FullyTransparent
        }
    }
}

/// Per-run summary of the trimming stage.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TrimReport {
    pub trimmed: usize,
    pub fully_transparent: Vec<String>,
    pub no_alpha: usize,
    pub cleared: usize,
}

/// Apply the trimming stage to a whole collection: trim when
/// `trim_transparency` is on, drop stale trim metadata when it is off.
#[instrument(skip_all, fields(count = sprites.len()))]
pub fn prepare_sprites(sprites: &mut [Sprite], cfg: &PackingConfig) -> TrimReport {
    let mut report = TrimReport::default();
    if !cfg.trim_transparency {
        for s in sprites.iter_mut() {
            if s.trimmed {
                report.cleared += 1;
            }
            s.clear_trim();
        }
        return report;
    }

    #[cfg(feature = "parallel")]
    let statuses: Vec<TrimStatus> = sprites.par_iter_mut().map(trim_sprite).collect();
    #[cfg(not(feature = "parallel"))]
    let statuses: Vec<TrimStatus> = sprites.iter_mut().map(trim_sprite).collect();

    for (s, status) in sprites.iter().zip(statuses) {
        match status {
            TrimStatus::Trimmed => report.trimmed += 1,
            TrimStatus::FullyTransparent => report.fully_transparent.push(s.id.clone()),
            TrimStatus::NoAlpha => report.no_alpha += 1,
            TrimStatus::Untrimmed => {}
        }
    }
    debug!(
        trimmed = report.trimmed,
        transparent = report.fully_transparent.len(),
        no_alpha = report.no_alpha,
        "trim stage done"
    );
    report
}
