//! Bounded dirty-region bookkeeping.
//!
//! Two lists are kept: the primary list fed by ordinary invalidation, and the
//! "Ex" list fed by scroll-exposed regions. The Ex list is split at the
//! viewport's bottom edge so that regions belonging to the panel below the
//! viewport can be told apart from map regions while a scroll is in flight.
//! When either list would exceed its capacity the tracker gives up on partial
//! updates and asks for a full refresh instead.

use crate::log_debug;
use crate::rect::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionOutcome {
    Stored(Rect),
    /// Empty after clipping.
    Discarded,
    /// A full refresh is already pending, the region is covered by it.
    Superseded,
    /// The list was full; the tracker degraded to a full refresh.
    Overflowed,
}

/// Fixed-capacity list of rectangles.
#[derive(Clone, Debug)]
pub struct RegionList {
    rects: Vec<Rect>,
    capacity: usize,
}

impl RegionList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rects: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Hands the rect back when the list is full.
    pub fn try_push(&mut self, rect: Rect) -> Result<(), Rect> {
        if self.is_full() {
            return Err(rect);
        }
        self.rects.push(rect);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.rects.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Rect] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

#[derive(Clone, Debug)]
pub struct DirtyRegionTracker {
    screen_width: u32,
    screen_height: u32,
    /// Bottom edge of the scrolling viewport; Ex regions are split here.
    viewport_end_y: u32,
    primary: RegionList,
    extra: RegionList,
    force_full_refresh: bool,
}

impl DirtyRegionTracker {
    pub fn new(screen_width: u32, screen_height: u32, viewport_end_y: u32, capacity: usize) -> Self {
        Self {
            screen_width,
            screen_height,
            viewport_end_y,
            primary: RegionList::with_capacity(capacity),
            extra: RegionList::with_capacity(capacity),
            force_full_refresh: false,
        }
    }

    pub fn force_full_refresh(&self) -> bool {
        self.force_full_refresh
    }

    pub fn primary(&self) -> &[Rect] {
        self.primary.as_slice()
    }

    pub fn extra(&self) -> &[Rect] {
        self.extra.as_slice()
    }

    pub fn capacity(&self) -> usize {
        self.primary.capacity()
    }

    pub fn viewport_end_y(&self) -> u32 {
        self.viewport_end_y
    }

    pub fn is_clean(&self) -> bool {
        !self.force_full_refresh && self.primary.is_empty() && self.extra.is_empty()
    }

    pub fn invalidate_region(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> RegionOutcome {
        if self.force_full_refresh {
            return RegionOutcome::Superseded;
        }
        let Some(rect) = self.clip(left, top, right, bottom) else {
            return RegionOutcome::Discarded;
        };
        match self.primary.try_push(rect) {
            Ok(()) => RegionOutcome::Stored(rect),
            Err(_) => {
                self.degrade_to_full_refresh();
                RegionOutcome::Overflowed
            }
        }
    }

    pub fn invalidate_rect(&mut self, rect: Rect) -> RegionOutcome {
        self.invalidate_region(
            rect.left as i32,
            rect.top as i32,
            rect.right as i32,
            rect.bottom as i32,
        )
    }

    /// Invalidate a scroll-exposed region, split at the viewport bottom edge.
    pub fn invalidate_region_ex(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> Vec<RegionOutcome> {
        let seam = self.viewport_end_y as i32;
        if top <= seam && bottom > seam {
            vec![
                self.add_region_ex(left, top, right, seam),
                self.add_region_ex(left, seam, right, bottom),
            ]
        } else {
            vec![self.add_region_ex(left, top, right, bottom)]
        }
    }

    pub fn add_region_ex(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> RegionOutcome {
        if self.force_full_refresh {
            return RegionOutcome::Superseded;
        }
        let Some(rect) = self.clip(left, top, right, bottom) else {
            return RegionOutcome::Discarded;
        };
        match self.extra.try_push(rect) {
            Ok(()) => RegionOutcome::Stored(rect),
            Err(_) => {
                self.degrade_to_full_refresh();
                RegionOutcome::Overflowed
            }
        }
    }

    /// Caller must own the frame buffer for this tick (never call this while a
    /// refresh is in progress).
    pub fn invalidate_screen(&mut self) {
        self.primary.clear();
        self.extra.clear();
        self.force_full_refresh = true;
    }

    /// Overflow policy: drop every partial region and refresh the whole screen.
    pub fn degrade_to_full_refresh(&mut self) {
        log_debug!(
            "Dirty region overflow ({} + {} regions), forcing full refresh",
            self.primary.len(),
            self.extra.len()
        );
        self.invalidate_screen();
    }

    /// Ex regions that should reach the screen. While a scroll is in flight,
    /// regions lying entirely above the viewport bottom are skipped: the
    /// scroll blit owns that area.
    pub fn presentable_extra(&self, scroll_in_flight: bool) -> impl Iterator<Item = &Rect> + '_ {
        let seam = self.viewport_end_y;
        self.extra
            .as_slice()
            .iter()
            .filter(move |r| !(scroll_in_flight && r.bottom <= seam))
    }

    pub fn clear(&mut self) {
        self.primary.clear();
        self.extra.clear();
        self.force_full_refresh = false;
    }

    fn clip(&self, left: i32, top: i32, right: i32, bottom: i32) -> Option<Rect> {
        Rect::clipped(
            left.into(),
            top.into(),
            right.into(),
            bottom.into(),
            self.screen_width,
            self.screen_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DirtyRegionTracker {
        DirtyRegionTracker::new(640, 480, 360, 128)
    }

    #[test]
    fn stored_rects_are_clipped_and_non_empty() {
        let mut t = tracker();
        let cases = [
            (-100, -100, 50, 50),
            (600, 400, 900, 900),
            (10, 10, 10, 50),
            (30, 40, 20, 50),
            (-10, 470, 650, 490),
            (700, 10, 800, 20),
        ];
        for (l, top, r, b) in cases {
            match t.invalidate_region(l, top, r, b) {
                RegionOutcome::Stored(rect) => {
                    assert!(!rect.is_empty());
                    assert!(rect.right <= 640 && rect.bottom <= 480);
                }
                RegionOutcome::Discarded => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(t.primary().len(), 3);
    }

    #[test]
    fn overflow_degrades_to_full_refresh() {
        let mut t = tracker();
        for x in 0..128 {
            assert!(matches!(t.invalidate_region(x, 0, x + 1, 1), RegionOutcome::Stored(_)));
        }
        t.add_region_ex(0, 400, 10, 410);
        assert_eq!(t.invalidate_region(200, 0, 201, 1), RegionOutcome::Overflowed);
        assert!(t.force_full_refresh());
        assert!(t.primary().is_empty());
        assert!(t.extra().is_empty());
    }

    #[test]
    fn ex_overflow_also_degrades() {
        let mut t = tracker();
        t.invalidate_region(0, 0, 5, 5);
        for x in 0..128 {
            t.add_region_ex(x, 400, x + 1, 401);
        }
        assert_eq!(t.add_region_ex(300, 400, 301, 401), RegionOutcome::Overflowed);
        assert!(t.force_full_refresh());
        assert!(t.primary().is_empty());
    }

    #[test]
    fn invalidate_screen_short_circuits_later_regions() {
        let mut t = tracker();
        t.invalidate_region(0, 0, 10, 10);
        t.invalidate_screen();
        assert_eq!(t.invalidate_region(5, 5, 20, 20), RegionOutcome::Superseded);
        assert_eq!(t.add_region_ex(5, 5, 20, 20), RegionOutcome::Superseded);
        assert!(t.force_full_refresh());
        assert!(t.primary().is_empty() && t.extra().is_empty());
    }

    #[test]
    fn ex_region_straddling_seam_is_split() {
        let mut t = tracker();
        let outcomes = t.invalidate_region_ex(0, 300, 640, 420);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            t.extra(),
            &[Rect::new(0, 300, 640, 360).unwrap(), Rect::new(0, 360, 640, 420).unwrap()]
        );
    }

    #[test]
    fn ex_region_starting_on_seam_drops_empty_top() {
        let mut t = tracker();
        let outcomes = t.invalidate_region_ex(0, 360, 640, 400);
        assert_eq!(outcomes[0], RegionOutcome::Discarded);
        assert_eq!(t.extra(), &[Rect::new(0, 360, 640, 400).unwrap()]);
    }

    #[test]
    fn scroll_hides_ex_regions_above_seam() {
        let mut t = tracker();
        t.invalidate_region_ex(0, 0, 100, 100);
        t.invalidate_region_ex(0, 370, 100, 400);
        assert_eq!(t.presentable_extra(false).count(), 2);
        let visible: Vec<_> = t.presentable_extra(true).copied().collect();
        assert_eq!(visible, vec![Rect::new(0, 370, 100, 400).unwrap()]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut t = tracker();
        t.invalidate_region(0, 0, 1, 1);
        t.invalidate_screen();
        t.clear();
        assert!(t.is_clean());
    }
}
