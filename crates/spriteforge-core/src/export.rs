use crate::compositing::{composite_bin, draw_watermark};
use crate::config::PackingConfig;
use crate::error::{Result, SpriteForgeError};
use crate::format::{find_format, serialize};
use crate::model::PackedBin;
use crate::snippet::usage_snippet;
use crate::sprite::SpriteImageLookup;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use tracing::{debug, info, instrument};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportOptions {
    /// Stamp the "made with" mark on every image.
    pub watermark: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { watermark: true }
    }
}

/// One output file, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// Image, description and usage note as separate files.
    Separate,
    /// A single zip holding every bin's files.
    Zip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub kind: BundleKind,
    pub blobs: Vec<NamedBlob>,
}

impl ExportBundle {
    pub fn names(&self) -> Vec<&str> {
        self.blobs.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Encode an RGBA canvas as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Pack `files` into one deflate-compressed zip named `name`.
pub fn zip_blobs(name: impl Into<String>, files: &[NamedBlob]) -> Result<NamedBlob> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for f in files {
        zip.start_file(f.name.as_str(), options)?;
        zip.write_all(&f.bytes)?;
    }
    let cursor = zip.finish()?;
    Ok(NamedBlob::new(name, cursor.into_inner()))
}

fn render_bin<L>(
    bin: &PackedBin,
    sprites: &L,
    format_id: &str,
    name: &str,
    opts: &ExportOptions,
) -> Result<(NamedBlob, NamedBlob)>
where
    L: SpriteImageLookup + ?Sized,
{
    let mut canvas = composite_bin(bin, sprites)?;
    if opts.watermark {
        draw_watermark(&mut canvas);
    }
    let png = encode_png(&canvas)?;
    let desc = serialize(bin, sprites, format_id, name)?;
    Ok((
        NamedBlob::new(format!("{name}.png"), png),
        NamedBlob::new(format!("{name}.{}", desc.extension), desc.content),
    ))
}

/// Produce the downloadable artifacts for a packed atlas.
///
/// One bin gives `<base>.png`, `<base>.<ext>` and `<base>.usage.txt`.
/// Several bins give a single `<base>.zip` with `<base>-<i>.png`,
/// `<base>-<i>.<ext>` per bin and `<base>.usage.txt`.
#[instrument(skip(bins, sprites, cfg, opts), fields(bins = bins.len(), format = %cfg.export_format))]
pub fn export_atlas<L>(
    bins: &[PackedBin],
    sprites: &L,
    cfg: &PackingConfig,
    base_name: &str,
    opts: &ExportOptions,
) -> Result<ExportBundle>
where
    L: SpriteImageLookup + ?Sized,
{
    if bins.is_empty() {
        return Err(SpriteForgeError::Empty);
    }
    let format_id = find_format(&cfg.export_format)?.id;
    let usage = NamedBlob::new(
        format!("{base_name}.usage.txt"),
        usage_snippet(format_id, base_name),
    );

    if let [bin] = bins {
        let (png, desc) = render_bin(bin, sprites, format_id, base_name, opts)?;
        debug!(w = bin.width, h = bin.height, "single-bin export");
        return Ok(ExportBundle {
            kind: BundleKind::Separate,
            blobs: vec![png, desc, usage],
        });
    }

    let mut files = Vec::with_capacity(bins.len() * 2 + 1);
    for (i, bin) in bins.iter().enumerate() {
        let name = format!("{base_name}-{i}");
        let (png, desc) = render_bin(bin, sprites, format_id, &name, opts)?;
        files.push(png);
        files.push(desc);
    }
    files.push(usage);
    let archive = zip_blobs(format!("{base_name}.zip"), &files)?;
    info!(files = files.len(), bytes = archive.bytes.len(), "multi-bin export zipped");
    Ok(ExportBundle {
        kind: BundleKind::Zip,
        blobs: vec![archive],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let bytes = encode_png(&img).expect("encode");
        let back = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn empty_bins_is_an_error() {
        let sprites: Vec<crate::sprite::Sprite> = Vec::new();
        let err = export_atlas(
            &[],
            &sprites,
            &PackingConfig::default(),
            "s",
            &ExportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SpriteForgeError::Empty));
    }
}
