//! JSON-based description formats, built from typed structs so field order is fixed.

use super::record::{SheetContext, SpriteRecord, ser_num};
use crate::error::Result;
use crate::model::{Rect, Size};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct XywhJson {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl From<Rect> for XywhJson {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            w: r.w,
            h: r.h,
        }
    }
}

#[derive(Serialize)]
struct WhJson {
    w: u32,
    h: u32,
}

impl From<Size> for WhJson {
    fn from(s: Size) -> Self {
        Self { w: s.w, h: s.h }
    }
}

#[derive(Serialize)]
struct PointJson {
    #[serde(serialize_with = "ser_num")]
    x: f64,
    #[serde(serialize_with = "ser_num")]
    y: f64,
}

const CENTER: PointJson = PointJson { x: 0.5, y: 0.5 };

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    frame: XywhJson,
    rotated: bool,
    trimmed: bool,
    sprite_source_size: XywhJson,
    source_size: WhJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pivot: Option<PointJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor: Option<PointJson>,
}

fn frame_json(r: &SpriteRecord) -> FrameJson {
    FrameJson {
        filename: None,
        frame: XywhJson {
            x: r.frame.x,
            y: r.frame.y,
            w: r.frame.w,
            h: r.frame.h,
        },
        rotated: r.rotated,
        trimmed: r.trimmed,
        sprite_source_size: r.sprite_source_size.into(),
        source_size: r.source_size.into(),
        pivot: None,
        anchor: None,
    }
}

/// Name-keyed frames in placement order (duplicates are emitted as-is).
struct FrameMap(Vec<(String, FrameJson)>);

impl Serialize for FrameMap {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct MetaJson<'a> {
    app: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    image: &'a str,
    format: &'a str,
    size: WhJson,
    scale: String,
}

fn meta_json<'a>(ctx: &'a SheetContext, target: Option<&'a str>) -> MetaJson<'a> {
    MetaJson {
        app: ctx.meta.url,
        version: ctx.meta.version,
        target,
        image: &ctx.meta.image_name,
        format: ctx.meta.format,
        size: WhJson {
            w: ctx.meta.width,
            h: ctx.meta.height,
        },
        scale: ctx.meta.scale.to_string(),
    }
}

#[derive(Serialize)]
struct HashSheet<'a> {
    frames: FrameMap,
    meta: MetaJson<'a>,
}

#[derive(Serialize)]
struct ArraySheet<'a> {
    frames: Vec<FrameJson>,
    meta: MetaJson<'a>,
}

fn to_string<T: Serialize>(v: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(v)?)
}

/// TexturePacker-style JSON hash: `{ frames: { name: {...} }, meta }`.
pub fn json_hash(ctx: &SheetContext) -> Result<String> {
    let frames = ctx
        .rects
        .iter()
        .map(|r| {
            let mut f = frame_json(r);
            f.pivot = Some(CENTER);
            (r.name.clone(), f)
        })
        .collect();
    to_string(&HashSheet {
        frames: FrameMap(frames),
        meta: meta_json(ctx, None),
    })
}

/// JSON array: `{ frames: [{ filename, ... }], meta }`.
pub fn json_array(ctx: &SheetContext) -> Result<String> {
    let frames = ctx
        .rects
        .iter()
        .map(|r| {
            let mut f = frame_json(r);
            f.filename = Some(r.name.clone());
            f.pivot = Some(CENTER);
            f
        })
        .collect();
    to_string(&ArraySheet {
        frames,
        meta: meta_json(ctx, None),
    })
}

/// PixiJS spritesheet: hash layout with a per-frame `anchor`.
pub fn pixijs(ctx: &SheetContext) -> Result<String> {
    let frames = ctx
        .rects
        .iter()
        .map(|r| {
            let mut f = frame_json(r);
            f.anchor = Some(CENTER);
            (r.name.clone(), f)
        })
        .collect();
    to_string(&HashSheet {
        frames: FrameMap(frames),
        meta: meta_json(ctx, None),
    })
}

/// Unreal Paper2D importer input: hash layout tagged with `target: paper2d`.
pub fn unreal(ctx: &SheetContext) -> Result<String> {
    let frames = ctx
        .rects
        .iter()
        .map(|r| {
            let mut f = frame_json(r);
            f.pivot = Some(CENTER);
            (r.name.clone(), f)
        })
        .collect();
    to_string(&HashSheet {
        frames: FrameMap(frames),
        meta: meta_json(ctx, Some("paper2d")),
    })
}

#[derive(Serialize)]
struct PhaserSheet<'a> {
    textures: Vec<PhaserTexture<'a>>,
    meta: AppMeta<'a>,
}

#[derive(Serialize)]
struct PhaserTexture<'a> {
    image: &'a str,
    format: &'a str,
    size: WhJson,
    scale: u32,
    frames: Vec<FrameJson>,
}

#[derive(Serialize)]
struct AppMeta<'a> {
    app: &'a str,
    version: &'a str,
}

/// Phaser 3 multi-atlas layout: one texture entry per image.
pub fn phaser(ctx: &SheetContext) -> Result<String> {
    let frames = ctx
        .rects
        .iter()
        .map(|r| {
            let mut f = frame_json(r);
            f.filename = Some(r.name.clone());
            f
        })
        .collect();
    to_string(&PhaserSheet {
        textures: vec![PhaserTexture {
            image: &ctx.meta.image_name,
            format: ctx.meta.format,
            size: WhJson {
                w: ctx.meta.width,
                h: ctx.meta.height,
            },
            scale: ctx.meta.scale,
            frames,
        }],
        meta: AppMeta {
            app: ctx.meta.url,
            version: ctx.meta.version,
        },
    })
}

#[derive(Serialize)]
struct TpsheetOutput<'a> {
    textures: Vec<TpTexture<'a>>,
    meta: AppMeta<'a>,
}

#[derive(Serialize)]
struct TpTexture<'a> {
    image: &'a str,
    size: WhJson,
    sprites: Vec<TpSprite>,
}

#[derive(Serialize)]
struct TpSprite {
    filename: String,
    region: XywhJson,
    margin: XywhJson,
}

/// Godot TexturePacker importer (`.tpsheet`): region plus the transparent
/// margin trimmed away on each axis.
pub fn godot(ctx: &SheetContext) -> Result<String> {
    let sprites = ctx
        .rects
        .iter()
        .map(|r| TpSprite {
            filename: r.name.clone(),
            region: XywhJson {
                x: r.frame.x,
                y: r.frame.y,
                w: r.frame.w,
                h: r.frame.h,
            },
            margin: XywhJson {
                x: r.sprite_source_size.x,
                y: r.sprite_source_size.y,
                w: r.source_size.w.saturating_sub(r.sprite_source_size.w),
                h: r.source_size.h.saturating_sub(r.sprite_source_size.h),
            },
        })
        .collect();
    to_string(&TpsheetOutput {
        textures: vec![TpTexture {
            image: &ctx.meta.image_name,
            size: WhJson {
                w: ctx.meta.width,
                h: ctx.meta.height,
            },
            sprites,
        }],
        meta: AppMeta {
            app: ctx.meta.app,
            version: ctx.meta.version,
        },
    })
}
