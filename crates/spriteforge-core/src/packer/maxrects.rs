use crate::config::MaxRectsHeuristic;
use crate::model::{PackedBin, PackedRect, Rect};

/// Lexicographic placement score; lower is better.
/// (heuristic primary, heuristic secondary, leftover area, top edge, left edge)
pub(crate) type Score = (i64, i64, i64, u32, u32);

/// Whether a candidate must fit inside the bin's current size or may enlarge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fit {
    Current,
    Grow,
}

/// A chosen position for one rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    /// Reserved slot: footprint inflated by padding on the right and bottom.
    pub slot: Rect,
    /// Footprint size as packed (post-rotation).
    pub w: u32,
    pub h: u32,
    pub rot: bool,
    /// Bin area after placing; zero when fitting within the current size.
    pub grown_area: u64,
    /// Longer bin side after placing; prefers square growth on area ties.
    pub grown_side: u32,
    pub score: Score,
}

impl Placement {
    fn key(&self) -> (u64, u32, Score) {
        (self.grown_area, self.grown_side, self.score)
    }

    pub(crate) fn better_than(&self, other: &Placement) -> bool {
        self.key() < other.key()
    }
}

/// One bin under construction: maximal free rectangles over the full capacity,
/// and a current size that only grows as rectangles are placed.
///
/// Padding is applied by inflating every reserved slot by `padding` and the
/// initial free area by the same amount, so two footprints are always at
/// least `padding` apart while the outermost ones may touch the border.
pub struct MaxRectsBin {
    cap_w: u32,
    cap_h: u32,
    border: u32,
    padding: u32,
    pot: bool,
    allow_rotation: bool,
    heuristic: MaxRectsHeuristic,
    bounds: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    extent_w: u32,
    extent_h: u32,
    width: u32,
    height: u32,
    rects: Vec<PackedRect>,
}

impl MaxRectsBin {
    /// `cap_w`/`cap_h` are the effective bin ceilings (already floored to a
    /// power of two when `pot` is set).
    pub fn new(
        cap_w: u32,
        cap_h: u32,
        border: u32,
        padding: u32,
        pot: bool,
        allow_rotation: bool,
        heuristic: MaxRectsHeuristic,
    ) -> Self {
        // free area may overhang the far edge by `padding`; clamp so edges stay in u32
        let w = cap_w
            .saturating_sub(border.saturating_mul(2))
            .saturating_add(padding)
            .min(u32::MAX - border);
        let h = cap_h
            .saturating_sub(border.saturating_mul(2))
            .saturating_add(padding)
            .min(u32::MAX - border);
        let bounds = Rect::new(border, border, w, h);
        Self {
            cap_w,
            cap_h,
            border,
            padding,
            pot,
            allow_rotation,
            heuristic,
            bounds,
            free: vec![bounds],
            used: Vec::new(),
            extent_w: 0,
            extent_h: 0,
            width: 0,
            height: 0,
            rects: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rects(&self) -> &[PackedRect] {
        &self.rects
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    pub fn into_packed(self) -> PackedBin {
        PackedBin {
            width: self.width,
            height: self.height,
            rects: self.rects,
        }
    }

    /// True if a `w`x`h` footprint fits an empty bin of this capacity.
    pub fn fits_capacity(&self, w: u32, h: u32) -> bool {
        let inner_w = self.cap_w.saturating_sub(self.border.saturating_mul(2));
        let inner_h = self.cap_h.saturating_sub(self.border.saturating_mul(2));
        (w <= inner_w && h <= inner_h) || (self.allow_rotation && h <= inner_w && w <= inner_h)
    }

    fn round(&self, v: u32) -> u32 {
        if self.pot {
            v.max(1).checked_next_power_of_two().unwrap_or(u32::MAX)
        } else {
            v
        }
    }

    /// Bin size after placing a footprint at (x, y).
    fn size_with(&self, x: u32, y: u32, w: u32, h: u32) -> (u32, u32) {
        let ew = self.extent_w.max(x + w);
        let eh = self.extent_h.max(y + h);
        (
            self.round(ew.saturating_add(self.border)).min(self.cap_w).max(self.width),
            self.round(eh.saturating_add(self.border)).min(self.cap_h).max(self.height),
        )
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = fr.w as i64 - w as i64;
        let leftover_v = fr.h as i64 - h as i64;
        let short_fit = leftover_h.abs().min(leftover_v.abs());
        let long_fit = leftover_h.abs().max(leftover_v.abs());
        let area_fit = fr.area() as i64 - (w as i64 * h as i64);
        match self.heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y as i64 + h as i64, fr.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                // maximize contact: negate for minimization
                let contact = self.contact_point_score(fr.x, fr.y, w, h);
                (-(contact.min(i64::MAX as u64) as i64), area_fit)
            }
        }
    }

    fn candidate(&self, fr: &Rect, w: u32, h: u32, rot: bool, fit: Fit) -> Option<Placement> {
        let (Some(sw), Some(sh)) = (w.checked_add(self.padding), h.checked_add(self.padding)) else {
            return None;
        };
        if fr.w < sw || fr.h < sh {
            return None;
        }
        let (x, y) = (fr.x, fr.y);
        let (grown_area, grown_side) = match fit {
            Fit::Current => {
                if (x + w).saturating_add(self.border) > self.width
                    || (y + h).saturating_add(self.border) > self.height
                {
                    return None;
                }
                (0, 0)
            }
            Fit::Grow => {
                let (nw, nh) = self.size_with(x, y, w, h);
                (nw as u64 * nh as u64, nw.max(nh))
            }
        };
        let (s1, s2) = self.score(fr, sw, sh);
        let area_fit = fr.area() as i64 - (sw as i64 * sh as i64);
        Some(Placement {
            slot: Rect::new(x, y, sw, sh),
            w,
            h,
            rot,
            grown_area,
            grown_side,
            score: (s1, s2, area_fit, y + h, x),
        })
    }

    /// Best candidate over all free rectangles and allowed orientations.
    pub(crate) fn find_position(&self, w: u32, h: u32, fit: Fit) -> Option<Placement> {
        let mut best: Option<Placement> = None;
        for fr in &self.free {
            let upright = self.candidate(fr, w, h, false, fit);
            let rotated = if self.allow_rotation && w != h {
                self.candidate(fr, h, w, true, fit)
            } else {
                None
            };
            for cand in [upright, rotated].into_iter().flatten() {
                if best.as_ref().is_none_or(|b| cand.better_than(b)) {
                    best = Some(cand);
                }
            }
        }
        best
    }

    pub(crate) fn place(&mut self, sprite_id: &str, p: Placement) {
        let (width, height) = self.size_with(p.slot.x, p.slot.y, p.w, p.h);
        self.split_free(&p.slot);
        self.used.push(p.slot);
        self.extent_w = self.extent_w.max(p.slot.x + p.w);
        self.extent_h = self.extent_h.max(p.slot.y + p.h);
        self.width = width;
        self.height = height;
        self.rects.push(PackedRect {
            sprite_id: sprite_id.to_string(),
            x: p.slot.x,
            y: p.slot.y,
            width: p.w,
            height: p.h,
            rot: p.rot,
        });
    }

    fn split_free(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::new();
        let mut i = 0usize;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(node) {
                // remove this free rect; its maximal leftovers go to new_free
                self.free.swap_remove(i);
                split_free_node(fr, node, &mut new_free);
            } else {
                i += 1;
            }
        }
        self.prune_new_vs_old(&mut new_free);
        prune_within(&mut new_free);
        self.free.extend(new_free);
        self.prune_free_list();
    }

    fn prune_new_vs_old(&mut self, new_free: &mut Vec<Rect>) {
        // Remove any new rect fully contained in any existing free rect
        new_free.retain(|nr| nr.w > 0 && nr.h > 0 && !self.free.iter().any(|of| of.contains(nr)));
        // Remove any existing free rect fully contained in any remaining new rect
        let mut i = 0;
        while i < self.free.len() {
            if new_free.iter().any(|nr| nr.contains(&self.free[i])) {
                self.free.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            let a = self.free[i];
            let mut remove_i = false;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
        // swap_remove above reorders the list; keep iteration order reproducible
        self.free.sort_by_key(|r| (r.y, r.x, r.w, r.h));
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let node = Rect::new(x, y, w, h);
        let mut score = 0u64;
        if node.x == self.bounds.x {
            score += node.h as u64;
        }
        if node.y == self.bounds.y {
            score += node.w as u64;
        }
        if node.right() == self.bounds.right() {
            score += node.h as u64;
        }
        if node.bottom() == self.bounds.bottom() {
            score += node.w as u64;
        }
        for u in &self.used {
            if node.x == u.right() || u.x == node.right() {
                score += overlap_1d(node.y, node.bottom(), u.y, u.bottom()) as u64;
            }
            if node.y == u.bottom() || u.y == node.bottom() {
                score += overlap_1d(node.x, node.right(), u.x, u.right()) as u64;
            }
        }
        score
    }
}

/// Maximal-rectangles split: every side of `fr` not covered by `node`
/// becomes a free rect spanning the full extent of `fr` along that side.
fn split_free_node(fr: Rect, node: &Rect, out: &mut Vec<Rect>) {
    // left
    if node.x > fr.x && node.x < fr.right() {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // right
    if node.right() < fr.right() {
        out.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
    }
    // top
    if node.y > fr.y && node.y < fr.bottom() {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // bottom
    if node.bottom() < fr.bottom() {
        out.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
    }
}

fn prune_within(v: &mut Vec<Rect>) {
    let mut i = 0;
    while i < v.len() {
        let a = v[i];
        let dominated = v
            .iter()
            .enumerate()
            .any(|(j, b)| j != i && b.contains(&a) && (a != *b || j < i));
        if dominated {
            v.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}
