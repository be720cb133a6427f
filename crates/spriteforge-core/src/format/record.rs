use crate::model::{PackedBin, Rect, Size};
use crate::sprite::SpriteMetaLookup;
use serde::{Serialize, Serializer};

pub const APP_NAME: &str = "SpriteForge";
pub const APP_VERSION: &str = "1.0";
pub const APP_URL: &str = "https://spriteforge.dev";
pub const PIXEL_FORMAT: &str = "RGBA8888";

/// Serialize a half-step value: whole numbers without a fractional part,
/// halves as `.5`.
pub fn ser_num<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
    if v.fract() == 0.0 {
        s.serialize_i64(*v as i64)
    } else {
        s.serialize_f64(*v)
    }
}

/// Text rendering of the same rule, for writers that build strings directly.
pub fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Packed footprint plus its half extents.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(serialize_with = "ser_num")]
    pub hw: f64,
    #[serde(serialize_with = "ser_num")]
    pub hh: f64,
}

/// Everything any format needs to know about one placed sprite.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpriteRecord {
    pub name: String,
    /// Name with every char outside `[A-Za-z0-9_-]` replaced by `-`.
    pub css_name: String,
    /// Name safe for attribute values that must not contain separators.
    pub escaped_name: String,
    pub frame: FrameRect,
    /// Trimmed region within the source image, unrotated.
    pub sprite_source_size: Rect,
    pub source_size: Size,
    pub rotated: bool,
    pub trimmed: bool,
    pub first: bool,
    pub last: bool,
    pub index: usize,
    /// Center offset of the trimmed region from the source center, Y up.
    #[serde(serialize_with = "ser_num")]
    pub offset_x: f64,
    #[serde(serialize_with = "ser_num")]
    pub offset_y: f64,
    /// Distance from the bottom of the trimmed region to the bottom of the source.
    pub offset_bottom: u32,
    /// Frame y measured from the bottom of the bin.
    pub mirror_y: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub image_name: String,
    pub width: u32,
    pub height: u32,
    pub format: &'static str,
    pub scale: u32,
    pub app: &'static str,
    pub version: &'static str,
    pub url: &'static str,
}

/// Normalized view of one bin, computed once and shared by all renderers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SheetContext {
    pub rects: Vec<SpriteRecord>,
    pub meta: SheetMeta,
}

impl SheetContext {
    /// Records follow the bin's placement order. A rect whose sprite is not
    /// found falls back to its id as the name and is treated as untrimmed.
    pub fn build<L>(bin: &PackedBin, sprites: &L, image_base: &str) -> Self
    where
        L: SpriteMetaLookup + ?Sized,
    {
        let count = bin.rects.len();
        let rects = bin
            .rects
            .iter()
            .enumerate()
            .map(|(index, r)| {
                let sprite = sprites.sprite_meta(&r.sprite_id);
                let name = sprite.map_or_else(|| r.sprite_id.clone(), |s| s.name.clone());
                // unrotated footprint
                let (uw, uh) = if r.rot {
                    (r.height, r.width)
                } else {
                    (r.width, r.height)
                };
                let (trimmed, sss, ss) = match sprite.and_then(|s| {
                    s.trim_rect.filter(|_| s.trimmed).zip(s.source_size)
                }) {
                    Some((tr, ss)) => (true, tr, ss),
                    None => (false, Rect::new(0, 0, uw, uh), Size::new(uw, uh)),
                };
                let offset_x = sss.x as f64 + sss.w as f64 / 2.0 - ss.w as f64 / 2.0;
                let offset_y = ss.h as f64 / 2.0 - (sss.y as f64 + sss.h as f64 / 2.0);
                SpriteRecord {
                    css_name: css_name(&name),
                    escaped_name: escape_name(&name),
                    name,
                    frame: FrameRect {
                        x: r.x,
                        y: r.y,
                        w: r.width,
                        h: r.height,
                        hw: r.width as f64 / 2.0,
                        hh: r.height as f64 / 2.0,
                    },
                    sprite_source_size: sss,
                    source_size: ss,
                    rotated: r.rot,
                    trimmed,
                    first: index == 0,
                    last: index + 1 == count,
                    index,
                    offset_x,
                    offset_y,
                    offset_bottom: ss.h.saturating_sub(sss.y + sss.h),
                    mirror_y: bin.height.saturating_sub(r.y + r.height),
                }
            })
            .collect();

        SheetContext {
            rects,
            meta: SheetMeta {
                image_name: format!("{image_base}.png"),
                width: bin.width,
                height: bin.height,
                format: PIXEL_FORMAT,
                scale: 1,
                app: APP_NAME,
                version: APP_VERSION,
                url: APP_URL,
            },
        }
    }
}

pub fn css_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            ':' => out.push_str("%3A"),
            ';' => out.push_str("%3B"),
            '\\' | '/' => out.push('-'),
            _ => out.push(c),
        }
    }
    out
}

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackedRect;
    use crate::sprite::{Sprite, TrimInfo};
    use image::RgbaImage;

    #[test]
    fn name_sanitizers() {
        assert_eq!(css_name("walk/01 big.png"), "walk-01-big-png");
        assert_eq!(escape_name("a%b#c:d;e\\f/g"), "a%25b%23c%3Ad%3Be-f-g");
        assert_eq!(xml_escape("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn numbers_drop_whole_fraction() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-2.5), "-2.5");
        assert_eq!(fmt_num(0.0), "0");
    }

    #[test]
    fn record_offsets_and_mirror() {
        let mut s = Sprite::from_rgba("id1", "hero", RgbaImage::new(100, 100));
        s.apply_trim(TrimInfo {
            trim_rect: Rect::new(45, 45, 10, 10),
            source_size: Size::new(100, 100),
        });
        let bin = PackedBin {
            width: 64,
            height: 64,
            rects: vec![PackedRect {
                sprite_id: "id1".into(),
                x: 4,
                y: 6,
                width: 10,
                height: 10,
                rot: false,
            }],
        };
        let ctx = SheetContext::build(&bin, &vec![s], "sheet");
        let r = &ctx.rects[0];
        assert_eq!(r.name, "hero");
        assert!(r.trimmed && r.first && r.last);
        assert_eq!(r.offset_x, 0.0);
        assert_eq!(r.offset_y, 0.0);
        assert_eq!(r.mirror_y, 64 - 6 - 10);
        assert_eq!(r.offset_bottom, 45);
        assert_eq!(ctx.meta.image_name, "sheet.png");
    }

    #[test]
    fn missing_sprite_falls_back_to_id_untrimmed() {
        let bin = PackedBin {
            width: 32,
            height: 32,
            rects: vec![PackedRect {
                sprite_id: "ghost".into(),
                x: 0,
                y: 0,
                width: 8,
                height: 4,
                rot: true,
            }],
        };
        let ctx = SheetContext::build(&bin, &Vec::<Sprite>::new(), "s");
        let r = &ctx.rects[0];
        assert_eq!(r.name, "ghost");
        assert!(!r.trimmed);
        // unrotated size
        assert_eq!(r.sprite_source_size, Rect::new(0, 0, 4, 8));
        assert_eq!(r.source_size, Size::new(4, 8));
        let v = serde_json::to_value(r).expect("json");
        assert_eq!(v["frame"]["hw"], 4);
        assert_eq!(v["offsetX"], 0);
    }
}
