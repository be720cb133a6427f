use crate::error::{Result, SpriteForgeError};
use crate::model::{PackedBin, Rect};
use crate::sprite::SpriteImageLookup;
use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Copy the `src_rect` region of `src` into `canvas` with its top-left at
/// (dx, dy), optionally rotated 90° clockwise.
///
/// A clockwise turn maps source column `c` to destination row `c` and source
/// row `r` to destination column `sh - 1 - r`; serializers report the same
/// orientation through their `rotated` flag. Pixels falling outside the
/// canvas are dropped.
pub fn blit_rgba(src: &RgbaImage, src_rect: Rect, canvas: &mut RgbaImage, dx: u32, dy: u32, rotated: bool) {
    let (cw, ch) = canvas.dimensions();
    let Rect { x: sx, y: sy, w: sw, h: sh } = src_rect;
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };

    for yy in 0..rh {
        for xx in 0..rw {
            let (ix, iy) = if rotated {
                (sx + yy, sy + (sh - 1 - xx))
            } else {
                (sx + xx, sy + yy)
            };
            if dx + xx < cw && dy + yy < ch {
                let px = *src.get_pixel(ix, iy);
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }
}

/// Render one bin: a transparent canvas of the bin's size with every placed
/// sprite's trimmed region (or whole image) copied to its rectangle.
#[instrument(skip_all, fields(w = bin.width, h = bin.height, rects = bin.rects.len()))]
pub fn composite_bin<L>(bin: &PackedBin, sprites: &L) -> Result<RgbaImage>
where
    L: SpriteImageLookup + ?Sized,
{
    if bin.width == 0 || bin.height == 0 {
        return Err(SpriteForgeError::InvalidDimensions {
            width: bin.width,
            height: bin.height,
        });
    }
    let mut canvas = RgbaImage::new(bin.width, bin.height);
    for r in &bin.rects {
        let sprite = sprites
            .sprite_meta(&r.sprite_id)
            .ok_or_else(|| SpriteForgeError::MissingSprite(r.sprite_id.clone()))?;
        let src_rect = sprite.source_rect();
        let (fw, fh) = if r.rot {
            (src_rect.h, src_rect.w)
        } else {
            (src_rect.w, src_rect.h)
        };
        if (fw, fh) != (r.width, r.height) {
            return Err(SpriteForgeError::InvalidConfig(format!(
                "layout for '{}' is stale: packed {}x{}, sprite footprint {}x{}",
                r.sprite_id, r.width, r.height, fw, fh
            )));
        }
        blit_rgba(sprite.pixels(), src_rect, &mut canvas, r.x, r.y, r.rot);
    }
    debug!("bin composited");
    Ok(canvas)
}

const WATERMARK_TEXT: &str = "MADE WITH SPRITEFORGE";
const WATERMARK_INSET: u32 = 4;
const WATERMARK_ALPHA: f32 = 0.25;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

/// 3x5 glyph rows, most significant of the low three bits is the left column.
fn glyph(c: char) -> [u8; 5] {
    match c {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        _ => [0; 5],
    }
}

/// Blend `src` over `dst` ("source over" compositing, straight alpha).
fn blend_over(dst: Rgba<u8>, src: [u8; 3], alpha: f32) -> Rgba<u8> {
    let da = dst[3] as f32 / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * alpha + d as f32 * da * (1.0 - alpha)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Stamp the "MADE WITH SPRITEFORGE" mark into the bottom-right corner.
/// Returns false (canvas untouched) when the text does not fit.
pub fn draw_watermark(canvas: &mut RgbaImage) -> bool {
    let (cw, ch) = canvas.dimensions();
    let chars = WATERMARK_TEXT.chars().count() as u32;
    let scale = (cw / 256).clamp(1, 4);
    let text_w = (chars * (GLYPH_W + 1) - 1) * scale;
    let text_h = GLYPH_H * scale;
    if text_w + 2 * WATERMARK_INSET > cw || text_h + 2 * WATERMARK_INSET > ch {
        debug!(cw, ch, "canvas too small for watermark");
        return false;
    }
    let ox = cw - WATERMARK_INSET - text_w;
    let oy = ch - WATERMARK_INSET - text_h;

    for (i, c) in WATERMARK_TEXT.chars().enumerate() {
        let gx = ox + i as u32 * (GLYPH_W + 1) * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = gx + col * scale + sx;
                        let py = oy + row as u32 * scale + sy;
                        let dst = *canvas.get_pixel(px, py);
                        canvas.put_pixel(px, py, blend_over(dst, [255, 255, 255], WATERMARK_ALPHA));
                    }
                }
            }
        }
    }
    true
}
