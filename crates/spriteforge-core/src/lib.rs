//! Core library for building sprite-sheet atlases.
//!
//! - Trimming: tight opaque bounds per sprite, cached on the sprite
//! - Packing: MaxRects (BSSF/BAF/BLSF/BL/CP) with bin growth, power-of-two sizes, padding, border and rotation
//! - Compositing: per-bin RGBA canvases honoring trim and rotation
//! - Formats: JSON hash/array, PixiJS, Phaser, Godot, Unreal, Cocos2d plist, Unity, CSS, Spine, Starling, XML
//! - Export: single-bin files or a zip for multi-bin atlases
//! - Session: recompute-on-change packing with background offload
//!
//! Quick example:
//! ```ignore
//! use spriteforge_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let img = image::ImageReader::open("hero.png")?.decode()?;
//! let mut sprites = vec![Sprite::new("hero", "hero", img)];
//! let cfg = PackingConfig::builder().with_max_dimensions(1024, 1024).build();
//! prepare_sprites(&mut sprites, &cfg);
//! let sizes: Vec<_> = sprites.iter().map(Sprite::packing_size).collect();
//! let packed = pack(&sizes, &cfg);
//! let bundle = export_atlas(&packed.bins, &sprites, &cfg, "atlas", &ExportOptions::default())?;
//! println!("files: {:?}", bundle.names());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod model;
pub mod packer;
pub mod session;
pub mod snippet;
pub mod splitter;
pub mod sprite;
pub mod trim;

pub use config::*;
pub use error::*;
pub use model::*;

/// Convenience prelude for common types and functions.
/// Importing `spriteforge_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::{composite_bin, draw_watermark};
    pub use crate::config::{MaxRectsHeuristic, PackingConfig, PackingConfigBuilder, SortOrder};
    pub use crate::error::{Result, SpriteForgeError};
    pub use crate::export::{BundleKind, ExportBundle, ExportOptions, NamedBlob, export_atlas};
    pub use crate::format::{FormatDescriptor, SerializedAtlas, catalog, find_format, serialize};
    pub use crate::model::{PackStats, PackedBin, PackedRect, Rect, Size, SpriteSize};
    pub use crate::packer::{PackError, PackResult, Rejected, pack};
    pub use crate::session::{AutoPacker, PackMode, PackOutcome};
    pub use crate::snippet::usage_snippet;
    pub use crate::splitter::{SplitResult, split_sheet};
    pub use crate::sprite::{Sprite, SpriteImageLookup, SpriteMetaLookup, TrimStatus};
    pub use crate::trim::{TrimReport, prepare_sprites, trim_image, trim_sprite};
}
