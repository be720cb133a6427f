use image::{Rgba, RgbaImage};
use spriteforge_core::splitter::{optimal_grid, split_sheet};
use spriteforge_core::SpriteForgeError;

const BG: Rgba<u8> = Rgba([204, 204, 204, 255]);
const INK: Rgba<u8> = Rgba([30, 60, 90, 255]);

fn fill(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, px: Rgba<u8>) {
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, px);
        }
    }
}

/// 2x2 sheet on a light background whose vertical gutter sits at x=54..57
/// instead of the midpoint.
fn offset_gutter_sheet() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(100, 100, BG);
    fill(&mut img, 5, 5, 54, 40, INK);
    fill(&mut img, 57, 5, 95, 40, INK);
    fill(&mut img, 5, 55, 54, 95, INK);
    fill(&mut img, 57, 55, 95, 95, INK);
    img
}

#[test]
fn finds_gutter_near_expected_line() {
    let res = split_sheet(&offset_gutter_sheet(), 4, None).expect("split");
    assert!(res.detected);
    assert_eq!((res.rows, res.cols), (2, 2));
    assert_eq!(res.frames.len(), 4);
    assert_eq!(res.frames[0].dimensions(), (54, 50));
    assert_eq!(res.frames[1].dimensions(), (46, 50));
    // the second frame starts inside the gutter
    assert_eq!(*res.frames[1].get_pixel(0, 10), BG);
    assert_eq!((res.cell_width, res.cell_height), (50, 50));
}

#[test]
fn falls_back_to_equal_cells() {
    let sheet = RgbaImage::from_pixel(90, 60, INK);
    let res = split_sheet(&sheet, 6, None).expect("split");
    assert!(!res.detected);
    assert_eq!((res.rows, res.cols), (2, 3));
    assert_eq!(res.frames.len(), 6);
    assert!(res.frames.iter().all(|f| f.dimensions() == (30, 30)));
}

#[test]
fn stops_at_frame_count_row_major() {
    let mut sheet = RgbaImage::from_pixel(40, 40, INK);
    fill(&mut sheet, 20, 0, 40, 20, Rgba([255, 0, 0, 255]));
    let res = split_sheet(&sheet, 3, Some((2, 2))).expect("split");
    assert_eq!(res.frames.len(), 3);
    // second frame is the top-right cell
    assert_eq!(res.frames[1].get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn rejects_bad_requests() {
    let sheet = RgbaImage::new(4, 4);
    assert!(matches!(split_sheet(&sheet, 0, None), Err(SpriteForgeError::InvalidConfig(_))));
    assert!(matches!(
        split_sheet(&sheet, 4, Some((0, 2))),
        Err(SpriteForgeError::InvalidConfig(_))
    ));
    assert!(matches!(
        split_sheet(&sheet, 25, Some((5, 5))),
        Err(SpriteForgeError::InvalidDimensions { .. })
    ));
}

#[test]
fn grid_for_large_counts() {
    assert_eq!(optimal_grid(12), (3, 4));
    assert_eq!(optimal_grid(13), (4, 4));
}
