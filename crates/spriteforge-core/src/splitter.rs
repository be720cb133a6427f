use crate::error::{Result, SpriteForgeError};
use image::{GenericImageView, Rgba, RgbaImage};
use tracing::{debug, instrument};

/// How far (in pixels) around an expected split line to look for a separator.
const SEARCH_RANGE: u32 = 10;
/// Fraction of background pixels a line needs to count as a separator.
const SEPARATOR_SCORE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    /// Frames in row-major order, at most `frame_count` of them.
    pub frames: Vec<RgbaImage>,
    pub rows: u32,
    pub cols: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    /// True when separator lines were found; false for the equal-grid fallback.
    pub detected: bool,
}

/// Rows x columns used for a generated sheet of `frame_count` frames.
pub fn optimal_grid(frame_count: u32) -> (u32, u32) {
    match frame_count {
        0 | 1 => (1, 1),
        2 => (1, 2),
        3 => (1, 3),
        4 => (2, 2),
        5 | 6 => (2, 3),
        7 | 8 => (2, 4),
        9 => (3, 3),
        10 => (2, 5),
        n => (n.div_ceil(4), 4),
    }
}

/// Light gray or white, the two checkerboard tones behind generated frames.
fn is_background(p: &Rgba<u8>) -> bool {
    let [r, g, b, _] = p.0;
    r > 180 && g > 180 && b > 180 && r.abs_diff(g) < 15 && g.abs_diff(b) < 15
}

fn line_score(img: &RgbaImage, vertical: bool, pos: u32) -> f64 {
    let (w, h) = img.dimensions();
    let len = if vertical { h } else { w };
    if len == 0 {
        return 0.0;
    }
    let bg = (0..len)
        .filter(|&i| {
            let (x, y) = if vertical { (pos, i) } else { (i, pos) };
            is_background(img.get_pixel(x, y))
        })
        .count();
    bg as f64 / len as f64
}

/// Best separator within the search range of `expected`; nearer lines win ties.
fn best_split(img: &RgbaImage, vertical: bool, expected: u32) -> Option<u32> {
    let limit = if vertical { img.width() } else { img.height() };
    let mut best = expected;
    let mut best_score = line_score(img, vertical, expected);
    for offset in 1..=SEARCH_RANGE {
        let candidates = [expected.checked_sub(offset), Some(expected + offset)];
        for pos in candidates.into_iter().flatten() {
            if pos >= limit {
                continue;
            }
            let score = line_score(img, vertical, pos);
            if score > best_score {
                best_score = score;
                best = pos;
            }
        }
    }
    (best_score > SEPARATOR_SCORE).then_some(best)
}

/// `round(i * total / n)` with halves rounded up.
fn grid_line(i: u32, total: u32, n: u32) -> u32 {
    ((2 * i as u64 * total as u64 + n as u64) / (2 * n as u64)) as u32
}

fn equal_lines(total: u32, n: u32) -> Vec<u32> {
    (0..=n).map(|i| grid_line(i, total, n)).collect()
}

fn detect_lines(img: &RgbaImage, vertical: bool, n: u32) -> Option<Vec<u32>> {
    let total = if vertical { img.width() } else { img.height() };
    let mut lines = vec![0];
    for i in 1..n {
        let pos = best_split(img, vertical, grid_line(i, total, n))?;
        // separators must keep every cell non-empty
        if pos <= *lines.last()? {
            return None;
        }
        lines.push(pos);
    }
    if total <= *lines.last()? {
        return None;
    }
    lines.push(total);
    Some(lines)
}

/// Split a generated grid sheet into individual frames.
///
/// `grid` overrides the rows x cols derived from `frame_count`. Separator
/// lines are searched near the equal-split positions; if any line is not
/// found the sheet is cut into equal cells instead.
#[instrument(skip(sheet), fields(w = sheet.width(), h = sheet.height()))]
pub fn split_sheet(sheet: &RgbaImage, frame_count: u32, grid: Option<(u32, u32)>) -> Result<SplitResult> {
    if frame_count == 0 {
        return Err(SpriteForgeError::InvalidConfig("frame count must be at least 1".into()));
    }
    let (rows, cols) = grid.unwrap_or_else(|| optimal_grid(frame_count));
    if rows == 0 || cols == 0 {
        return Err(SpriteForgeError::InvalidConfig(format!("invalid grid {rows}x{cols}")));
    }
    let (w, h) = sheet.dimensions();
    if w < cols || h < rows {
        return Err(SpriteForgeError::InvalidDimensions { width: w, height: h });
    }

    let detected = detect_lines(sheet, true, cols).zip(detect_lines(sheet, false, rows));
    let is_detected = detected.is_some();
    let (xs, ys) = detected.unwrap_or_else(|| (equal_lines(w, cols), equal_lines(h, rows)));
    debug!(rows, cols, detected = is_detected, "grid resolved");

    let mut frames = Vec::new();
    'rows: for r in 0..rows as usize {
        for c in 0..cols as usize {
            if frames.len() >= frame_count as usize {
                break 'rows;
            }
            let (x, y) = (xs[c], ys[r]);
            let view = sheet.view(x, y, xs[c + 1] - x, ys[r + 1] - y);
            frames.push(view.to_image());
        }
    }

    Ok(SplitResult {
        frames,
        rows,
        cols,
        cell_width: grid_line(1, w, cols),
        cell_height: grid_line(1, h, rows),
        detected: is_detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_table() {
        assert_eq!(optimal_grid(1), (1, 1));
        assert_eq!(optimal_grid(4), (2, 2));
        assert_eq!(optimal_grid(6), (2, 3));
        assert_eq!(optimal_grid(10), (2, 5));
        assert_eq!(optimal_grid(11), (3, 4));
        assert_eq!(optimal_grid(16), (4, 4));
    }

    #[test]
    fn equal_lines_round_half_up() {
        assert_eq!(equal_lines(10, 4), vec![0, 3, 5, 8, 10]);
    }

    #[test]
    fn background_test() {
        assert!(is_background(&Rgba([204, 204, 204, 255])));
        assert!(is_background(&Rgba([255, 255, 250, 255])));
        assert!(!is_background(&Rgba([255, 200, 200, 255])));
        assert!(!is_background(&Rgba([100, 100, 100, 255])));
    }
}
