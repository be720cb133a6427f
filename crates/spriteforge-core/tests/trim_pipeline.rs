use image::{Rgba, RgbaImage};
use spriteforge_core::prelude::*;

fn sprite_with_block(id: &str, w: u32, h: u32, block: Rect) -> Sprite {
    let mut img = RgbaImage::new(w, h);
    for y in block.y..block.bottom() {
        for x in block.x..block.right() {
            img.put_pixel(x, y, Rgba([200, (x * 7) as u8, (y * 5) as u8, 255]));
        }
    }
    Sprite::from_rgba(id, id, img)
}

#[test]
fn centered_block_round_trips_through_the_atlas() {
    let mut sprites = vec![sprite_with_block("dot", 100, 100, Rect::new(45, 45, 10, 10))];
    let cfg = PackingConfig::builder().padding(0).build();
    let report = prepare_sprites(&mut sprites, &cfg);
    assert_eq!(report.trimmed, 1);
    assert_eq!(sprites[0].trim_rect, Some(Rect::new(45, 45, 10, 10)));
    assert_eq!(sprites[0].source_size, Some(Size::new(100, 100)));

    let sizes: Vec<SpriteSize> = sprites.iter().map(Sprite::packing_size).collect();
    let packed = pack(&sizes, &cfg);
    let bin = &packed.bins[0];
    let r = &bin.rects[0];
    assert_eq!((r.width, r.height), (10, 10));

    // compositing the footprint reproduces the opaque block
    let canvas = composite_bin(bin, &sprites).expect("composite");
    let src = sprites[0].pixels();
    for y in 0..10 {
        for x in 0..10 {
            assert_eq!(canvas.get_pixel(r.x + x, r.y + y), src.get_pixel(45 + x, 45 + y));
        }
    }

    // the serializer reports the same placement, centered
    let out = serialize(bin, &sprites, "json", "sheet").expect("json");
    let v: serde_json::Value = serde_json::from_str(&out.content).expect("valid json");
    let f = &v["frames"]["dot"];
    assert_eq!(f["trimmed"], true);
    assert_eq!(f["spriteSourceSize"], serde_json::json!({"x": 45, "y": 45, "w": 10, "h": 10}));
    assert_eq!(f["sourceSize"], serde_json::json!({"w": 100, "h": 100}));
    assert_eq!(f["frame"]["w"], 10);
}

#[test]
fn trimming_twice_reuses_metadata() {
    let mut s = sprite_with_block("a", 32, 32, Rect::new(4, 8, 6, 6));
    assert_eq!(trim_sprite(&mut s), TrimStatus::Trimmed);
    let first = s.trim_rect;

    // a cached rect is trusted as-is; the pixels are not scanned again
    s.trim_rect = Some(Rect::new(1, 1, 2, 2));
    assert_eq!(trim_sprite(&mut s), TrimStatus::Trimmed);
    assert_eq!(s.trim_rect, Some(Rect::new(1, 1, 2, 2)));
    assert_ne!(first, s.trim_rect);

    let mut fresh = sprite_with_block("b", 32, 32, Rect::new(4, 8, 6, 6));
    trim_sprite(&mut fresh);
    let once = fresh.trim_rect;
    trim_sprite(&mut fresh);
    assert_eq!(fresh.trim_rect, once);
}

#[test]
fn fully_transparent_sprite_packs_at_full_size() {
    let mut sprites = vec![Sprite::from_rgba("ghost", "ghost", RgbaImage::new(50, 50))];
    let cfg = PackingConfig::default();
    let report = prepare_sprites(&mut sprites, &cfg);
    assert_eq!(report.fully_transparent, vec!["ghost".to_string()]);
    assert!(!sprites[0].trimmed);
    assert!(sprites[0].trim_rect.is_none());
    assert_eq!(sprites[0].trim_status, TrimStatus::FullyTransparent);

    let sizes: Vec<SpriteSize> = sprites.iter().map(Sprite::packing_size).collect();
    let packed = pack(&sizes, &cfg);
    let r = &packed.bins[0].rects[0];
    assert_eq!((r.width, r.height), (50, 50));
}

#[test]
fn opaque_rgb_sprite_is_not_trimmed() {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(12, 7));
    let mut sprites = vec![Sprite::new("rgb", "rgb", img)];
    let report = prepare_sprites(&mut sprites, &PackingConfig::default());
    assert_eq!(report.no_alpha, 1);
    assert_eq!(sprites[0].packing_size(), SpriteSize::new("rgb", 12, 7));
}

#[test]
fn empty_image_is_rejected_and_export_still_succeeds() {
    let mut sprites = vec![
        Sprite::from_rgba("empty", "empty", RgbaImage::new(0, 0)),
        Sprite::from_rgba("solid", "solid", RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))),
    ];
    let cfg = PackingConfig::default();
    let report = prepare_sprites(&mut sprites, &cfg);
    assert_eq!(report.trimmed, 1);
    assert!(sprites[0].trim_rect.is_none());

    let sizes: Vec<SpriteSize> = sprites.iter().map(Sprite::packing_size).collect();
    let packed = pack(&sizes, &cfg);
    assert_eq!(packed.placed_count(), 1);
    assert_eq!(packed.rejected.len(), 1);
    assert_eq!(packed.rejected[0].sprite_id, "empty");
    assert!(matches!(packed.rejected[0].error, PackError::ZeroSizeSprite { .. }));

    let bundle = export_atlas(&packed.bins, &sprites, &cfg, "sheet", &ExportOptions::default())
        .expect("export");
    assert_eq!(bundle.names(), ["sheet.png", "sheet.json", "sheet.usage.txt"]);
}
