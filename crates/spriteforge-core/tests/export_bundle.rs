use image::{Rgba, RgbaImage};
use spriteforge_core::prelude::*;
use std::io::{Cursor, Read};

fn opaque(id: &str, w: u32, h: u32) -> Sprite {
    Sprite::from_rgba(id, id, RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])))
}

fn packed(sprites: &[Sprite], cfg: &PackingConfig) -> PackResult {
    let sizes: Vec<SpriteSize> = sprites.iter().map(Sprite::packing_size).collect();
    pack(&sizes, cfg)
}

#[test]
fn single_bin_gives_three_files() {
    let sprites = vec![opaque("a", 16, 16), opaque("b", 8, 24)];
    let cfg = PackingConfig::builder().export_format("phaser").build();
    let result = packed(&sprites, &cfg);
    assert_eq!(result.bins.len(), 1);

    let bundle = export_atlas(&result.bins, &sprites, &cfg, "level1", &ExportOptions::default())
        .expect("export");
    assert_eq!(bundle.kind, BundleKind::Separate);
    assert_eq!(bundle.names(), ["level1.png", "level1.json", "level1.usage.txt"]);

    let png = image::load_from_memory(&bundle.blobs[0].bytes).expect("png").to_rgba8();
    assert_eq!(png.dimensions(), (result.bins[0].width, result.bins[0].height));
    let usage = String::from_utf8(bundle.blobs[2].bytes.clone()).expect("utf8");
    assert!(usage.contains("Phaser 3"));
}

#[test]
fn multi_bin_is_zipped_with_suffixes() {
    let sprites: Vec<Sprite> = (0..3).map(|i| opaque(&format!("big{i}"), 60, 60)).collect();
    let cfg = PackingConfig::builder()
        .with_max_dimensions(64, 64)
        .padding(0)
        .export_format("cocos2d")
        .build();
    let result = packed(&sprites, &cfg);
    assert_eq!(result.bins.len(), 3);

    let bundle = export_atlas(
        &result.bins,
        &sprites,
        &cfg,
        "sheet",
        &ExportOptions { watermark: false },
    )
    .expect("export");
    assert_eq!(bundle.kind, BundleKind::Zip);
    assert_eq!(bundle.names(), ["sheet.zip"]);

    let mut archive = zip::ZipArchive::new(Cursor::new(bundle.blobs[0].bytes.clone())).expect("zip");
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for expected in [
        "sheet-0.png",
        "sheet-0.plist",
        "sheet-1.png",
        "sheet-1.plist",
        "sheet-2.png",
        "sheet-2.plist",
        "sheet.usage.txt",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }
    assert_eq!(names.len(), 7);

    // each description refers to its own image
    let mut plist = String::new();
    archive
        .by_name("sheet-1.plist")
        .expect("entry")
        .read_to_string(&mut plist)
        .expect("read");
    assert!(plist.contains("<string>sheet-1.png</string>"));
}

#[test]
fn watermark_is_optional() {
    let sprites = vec![opaque("a", 200, 40)];
    let cfg = PackingConfig::builder().padding(0).build();
    let result = packed(&sprites, &cfg);
    let decode = |opts: ExportOptions| {
        let b = export_atlas(&result.bins, &sprites, &cfg, "w", &opts).expect("export");
        image::load_from_memory(&b.blobs[0].bytes).expect("png").to_rgba8()
    };
    let plain = decode(ExportOptions { watermark: false });
    let marked = decode(ExportOptions { watermark: true });
    assert_eq!(plain.dimensions(), marked.dimensions());
    assert_ne!(plain, marked);
    // the top-left corner is never touched
    assert_eq!(plain.get_pixel(0, 0), marked.get_pixel(0, 0));
}

#[test]
fn unknown_format_emits_nothing() {
    let sprites = vec![opaque("a", 4, 4)];
    let cfg = PackingConfig::builder().export_format("unknown-format-xyz").build();
    let result = packed(&sprites, &cfg);
    let err = export_atlas(&result.bins, &sprites, &cfg, "x", &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, SpriteForgeError::UnknownFormat(_)));
}
