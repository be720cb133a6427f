use crate::config::{PackingConfig, SortOrder};
use crate::error::{Result, SpriteForgeError};
use crate::model::{PackStats, PackedBin, SpriteSize};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub mod maxrects;

pub use maxrects::MaxRectsBin;
use maxrects::{Fit, Placement};

/// Why a single sprite was left out of a packing run.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PackError {
    #[error(
        "sprite '{id}' ({width}x{height}) does not fit in a {max_width}x{max_height} bin in any orientation"
    )]
    UnpackableSprite {
        id: String,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("sprite '{id}' has zero area")]
    ZeroSizeSprite { id: String },
    #[error("sprite id '{id}' appears more than once")]
    DuplicateSprite { id: String },
}

impl From<PackError> for SpriteForgeError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::UnpackableSprite {
                id,
                width,
                height,
                max_width,
                max_height,
            } => SpriteForgeError::UnpackableSprite {
                id,
                width,
                height,
                max_width,
                max_height,
            },
            PackError::ZeroSizeSprite { id } => SpriteForgeError::ZeroSizeSprite { id },
            PackError::DuplicateSprite { id } => {
                SpriteForgeError::InvalidConfig(format!("duplicate sprite id '{id}'"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rejected {
    pub sprite_id: String,
    pub error: PackError,
}

/// Output of one packing run. Plain data, so it crosses thread boundaries as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackResult {
    pub bins: Vec<PackedBin>,
    pub rejected: Vec<Rejected>,
}

impl PackResult {
    /// True when every input sprite was placed.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.bins.iter().map(|b| b.rects.len()).sum()
    }

    /// Index of the bin holding `sprite_id`.
    pub fn bin_of(&self, sprite_id: &str) -> Option<usize> {
        self.bins.iter().position(|b| b.find(sprite_id).is_some())
    }

    pub fn stats(&self) -> PackStats {
        PackStats::from_bins(&self.bins)
    }

    /// Strict view: the bins, or the first rejection as an error.
    pub fn into_complete(self) -> Result<Vec<PackedBin>> {
        match self.rejected.into_iter().next() {
            Some(r) => Err(r.error.into()),
            None => Ok(self.bins),
        }
    }
}

/// Pack sprite footprints into as few bins as the caps allow.
///
/// Pure: the same inputs always give the same bins, whether called inline or
/// on a worker thread.
#[instrument(skip_all, fields(sprites = sizes.len()))]
pub fn pack(sizes: &[SpriteSize], cfg: &PackingConfig) -> PackResult {
    match run(sizes, cfg, None) {
        Ok(r) => r,
        // unreachable without a cancel flag
        Err(_) => PackResult::default(),
    }
}

/// Like [`pack`], but aborts with [`SpriteForgeError::Cancelled`] once `cancel`
/// is raised. The flag is checked before every placement.
#[instrument(skip_all, fields(sprites = sizes.len()))]
pub fn pack_cancellable(
    sizes: &[SpriteSize],
    cfg: &PackingConfig,
    cancel: &AtomicBool,
) -> Result<PackResult> {
    run(sizes, cfg, Some(cancel))
}

fn run(sizes: &[SpriteSize], cfg: &PackingConfig, cancel: Option<&AtomicBool>) -> Result<PackResult> {
    let (cap_w, cap_h) = cfg.effective_max();
    let new_bin = || {
        MaxRectsBin::new(
            cap_w,
            cap_h,
            cfg.border,
            cfg.padding,
            cfg.pot,
            cfg.allow_rotation,
            cfg.heuristic,
        )
    };
    let probe = new_bin();

    let order = sorted(sizes, cfg.sort_order);
    let mut seen: HashSet<&str> = HashSet::with_capacity(order.len());
    let mut bins: Vec<MaxRectsBin> = Vec::new();
    let mut rejected = Vec::new();

    for s in order {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            debug!("packing run cancelled");
            return Err(SpriteForgeError::Cancelled);
        }
        if !seen.insert(s.id.as_str()) {
            warn!(id = %s.id, "duplicate sprite id skipped");
            rejected.push(reject(s, PackError::DuplicateSprite { id: s.id.clone() }));
            continue;
        }
        if s.width == 0 || s.height == 0 {
            warn!(id = %s.id, "zero-area sprite skipped");
            rejected.push(reject(s, PackError::ZeroSizeSprite { id: s.id.clone() }));
            continue;
        }
        if !probe.fits_capacity(s.width, s.height) {
            warn!(id = %s.id, w = s.width, h = s.height, cap_w, cap_h, "sprite exceeds bin capacity");
            rejected.push(reject(
                s,
                PackError::UnpackableSprite {
                    id: s.id.clone(),
                    width: s.width,
                    height: s.height,
                    max_width: cap_w,
                    max_height: cap_h,
                },
            ));
            continue;
        }

        let (idx, placement) = match choose(&bins, s) {
            Some(found) => found,
            None => {
                let bin = new_bin();
                let Some(p) = bin.find_position(s.width, s.height, Fit::Grow) else {
                    // fits_capacity passed, so an empty bin always has room
                    rejected.push(reject(
                        s,
                        PackError::UnpackableSprite {
                            id: s.id.clone(),
                            width: s.width,
                            height: s.height,
                            max_width: cap_w,
                            max_height: cap_h,
                        },
                    ));
                    continue;
                };
                bins.push(bin);
                debug!(bin = bins.len() - 1, "opened bin");
                (bins.len() - 1, p)
            }
        };
        bins[idx].place(&s.id, placement);
    }

    let bins: Vec<PackedBin> = bins.into_iter().map(MaxRectsBin::into_packed).collect();
    debug!(bins = bins.len(), rejected = rejected.len(), "packing done");
    Ok(PackResult { bins, rejected })
}

/// Best spot within any bin's current size; otherwise grow the active
/// (last) bin. Earlier bins win ties.
fn choose(bins: &[MaxRectsBin], s: &SpriteSize) -> Option<(usize, Placement)> {
    let mut best: Option<(usize, Placement)> = None;
    for (i, bin) in bins.iter().enumerate() {
        if let Some(p) = bin.find_position(s.width, s.height, Fit::Current)
            && best.as_ref().is_none_or(|(_, b)| p.better_than(b))
        {
            best = Some((i, p));
        }
    }
    if best.is_some() {
        return best;
    }
    let last = bins.len().checked_sub(1)?;
    bins[last]
        .find_position(s.width, s.height, Fit::Grow)
        .map(|p| (last, p))
}

fn reject(s: &SpriteSize, error: PackError) -> Rejected {
    Rejected {
        sprite_id: s.id.clone(),
        error,
    }
}

fn sorted(sizes: &[SpriteSize], order: SortOrder) -> Vec<&SpriteSize> {
    let mut v: Vec<&SpriteSize> = sizes.iter().collect();
    match order {
        SortOrder::AreaDesc => {
            v.sort_by(|a, b| {
                let aa = a.width as u64 * a.height as u64;
                let bb = b.width as u64 * b.height as u64;
                bb.cmp(&aa).then_with(|| a.id.cmp(&b.id))
            });
        }
        SortOrder::MaxSideDesc => v.sort_by(|a, b| {
            let ka = (Reverse(a.width.max(a.height)), Reverse(a.width.min(a.height)));
            let kb = (Reverse(b.width.max(b.height)), Reverse(b.width.min(b.height)));
            ka.cmp(&kb).then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::HeightDesc => v.sort_by(|a, b| {
            (Reverse(a.height), Reverse(a.width))
                .cmp(&(Reverse(b.height), Reverse(b.width)))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::WidthDesc => v.sort_by(|a, b| {
            (Reverse(a.width), Reverse(a.height))
                .cmp(&(Reverse(b.width), Reverse(b.height)))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortOrder::IdAsc => v.sort_by(|a, b| a.id.cmp(&b.id)),
        SortOrder::None => {}
    }
    v
}
