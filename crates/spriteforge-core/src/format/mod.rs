//! Atlas description formats.
//!
//! Every format renders the same normalized [`SheetContext`]; the catalog maps
//! a format id to its renderer, so adding a format is one new table entry.

use crate::error::{Result, SpriteForgeError};
use crate::model::PackedBin;
use crate::sprite::SpriteMetaLookup;
use serde::Serialize;
use tracing::instrument;

pub mod json;
pub mod plist;
pub mod record;
pub mod template;

pub use record::{SheetContext, SpriteRecord};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum FormatGroup {
    General,
    Web,
    Engines,
}

impl FormatGroup {
    pub fn label(self) -> &'static str {
        match self {
            FormatGroup::General => "General",
            FormatGroup::Web => "Web",
            FormatGroup::Engines => "Engines",
        }
    }
}

/// How a format turns a sheet context into text.
#[derive(Clone, Copy)]
pub enum Renderer {
    Function(fn(&SheetContext) -> Result<String>),
    Template(&'static str),
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Renderer::Function(_) => f.write_str("Function"),
            Renderer::Template(_) => f.write_str("Template"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormatDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub group: FormatGroup,
    pub extension: &'static str,
    #[serde(skip)]
    pub renderer: Renderer,
}

impl FormatDescriptor {
    pub fn render(&self, ctx: &SheetContext) -> Result<String> {
        match self.renderer {
            Renderer::Function(f) => f(ctx),
            Renderer::Template(src) => template::render(src, ctx),
        }
    }
}

static CATALOG: &[FormatDescriptor] = &[
    FormatDescriptor {
        id: "json",
        label: "JSON (hash)",
        group: FormatGroup::General,
        extension: "json",
        renderer: Renderer::Function(json::json_hash),
    },
    FormatDescriptor {
        id: "json-array",
        label: "JSON (array)",
        group: FormatGroup::General,
        extension: "json",
        renderer: Renderer::Function(json::json_array),
    },
    FormatDescriptor {
        id: "xml",
        label: "Generic XML",
        group: FormatGroup::General,
        extension: "xml",
        renderer: Renderer::Template(template::XML),
    },
    FormatDescriptor {
        id: "css",
        label: "CSS",
        group: FormatGroup::Web,
        extension: "css",
        renderer: Renderer::Template(template::CSS),
    },
    FormatDescriptor {
        id: "pixijs",
        label: "PixiJS",
        group: FormatGroup::Web,
        extension: "json",
        renderer: Renderer::Function(json::pixijs),
    },
    FormatDescriptor {
        id: "phaser",
        label: "Phaser 3",
        group: FormatGroup::Web,
        extension: "json",
        renderer: Renderer::Function(json::phaser),
    },
    FormatDescriptor {
        id: "starling",
        label: "Starling / Sparrow XML",
        group: FormatGroup::Web,
        extension: "xml",
        renderer: Renderer::Template(template::STARLING),
    },
    FormatDescriptor {
        id: "godot",
        label: "Godot (tpsheet)",
        group: FormatGroup::Engines,
        extension: "tpsheet",
        renderer: Renderer::Function(json::godot),
    },
    FormatDescriptor {
        id: "unity",
        label: "Unity (tpsheet text)",
        group: FormatGroup::Engines,
        extension: "tpsheet",
        renderer: Renderer::Template(template::UNITY),
    },
    FormatDescriptor {
        id: "cocos2d",
        label: "Cocos2d plist",
        group: FormatGroup::Engines,
        extension: "plist",
        renderer: Renderer::Function(plist::cocos2d),
    },
    FormatDescriptor {
        id: "spine",
        label: "Spine atlas",
        group: FormatGroup::Engines,
        extension: "atlas",
        renderer: Renderer::Template(template::SPINE),
    },
    FormatDescriptor {
        id: "unreal",
        label: "Unreal Paper2D",
        group: FormatGroup::Engines,
        extension: "paper2dsprites",
        renderer: Renderer::Function(json::unreal),
    },
];

/// All registered formats, grouped General, Web, Engines.
pub fn catalog() -> &'static [FormatDescriptor] {
    CATALOG
}

pub fn find_format(id: &str) -> Result<&'static FormatDescriptor> {
    CATALOG
        .iter()
        .find(|f| f.id == id)
        .ok_or_else(|| SpriteForgeError::UnknownFormat(id.to_string()))
}

/// Formats available without a paid tier in the editor.
pub fn free_formats() -> &'static [&'static str] {
    &["json", "css"]
}

pub fn formats_in(group: FormatGroup) -> impl Iterator<Item = &'static FormatDescriptor> {
    CATALOG.iter().filter(move |f| f.group == group)
}

/// Rendered description text plus the file extension it belongs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedAtlas {
    pub format_id: &'static str,
    pub content: String,
    pub extension: &'static str,
}

/// Serialize one bin in the format named `format_id`. The image is referred
/// to as `<image_base>.png`. Unknown ids fail before anything is rendered.
#[instrument(skip(bin, sprites), fields(rects = bin.rects.len()))]
pub fn serialize<L>(
    bin: &PackedBin,
    sprites: &L,
    format_id: &str,
    image_base: &str,
) -> Result<SerializedAtlas>
where
    L: SpriteMetaLookup + ?Sized,
{
    let desc = find_format(format_id)?;
    let ctx = SheetContext::build(bin, sprites, image_base);
    let content = desc.render(&ctx)?;
    Ok(SerializedAtlas {
        format_id: desc.id,
        content,
        extension: desc.extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<&str> = catalog().iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn free_formats_exist() {
        for id in free_formats() {
            assert!(find_format(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn groups_partition_catalog() {
        let n: usize = [FormatGroup::General, FormatGroup::Web, FormatGroup::Engines]
            .into_iter()
            .map(|g| formats_in(g).count())
            .sum();
        assert_eq!(n, catalog().len());
    }

    #[test]
    fn unknown_id_is_rejected() {
        let bin = PackedBin {
            width: 1,
            height: 1,
            rects: vec![],
        };
        let err = serialize(&bin, &Vec::<crate::sprite::Sprite>::new(), "nope", "x").unwrap_err();
        assert!(matches!(err, SpriteForgeError::UnknownFormat(id) if id == "nope"));
    }
}
