//! Software mouse cursor drawn on top of the composited screen.
//!
//! Every tick the previous cursor rectangle is restored from the frame buffer
//! before the cursor is drawn again at the current pointer position.

use crate::log_warn;
use crate::rect::Rect;
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferState {
    Ready,
    Dirty,
    Disabled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorProperties {
    pub hotspot_x: i16,
    pub hotspot_y: i16,
    pub width: u16,
    pub height: u16,
}

/// Where the cursor bitmap lands on screen after clipping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorPlacement {
    pub dest: Rect,
    /// Offset into the cursor bitmap matching what was clipped off the
    /// left/top screen edges.
    pub src_x: u32,
    pub src_y: u32,
}

impl CursorPlacement {
    pub fn source_rect(&self) -> Rect {
        Rect {
            left: self.src_x,
            top: self.src_y,
            right: self.src_x + self.dest.width(),
            bottom: self.src_y + self.dest.height(),
        }
    }
}

/// Last presented cursor rectangle, restored before the next draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseCursorBackground {
    pub restore: bool,
    pub rect: Rect,
}

#[derive(Debug)]
pub struct MouseCursorOverlay {
    properties: CursorProperties,
    max_width: u32,
    max_height: u32,
    state: BufferState,
    show: bool,
    background: MouseCursorBackground,
}

impl MouseCursorOverlay {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            properties: CursorProperties::default(),
            max_width,
            max_height,
            state: BufferState::Disabled,
            show: false,
            background: MouseCursorBackground::default(),
        }
    }

    pub fn properties(&self) -> CursorProperties {
        self.properties
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn background(&self) -> MouseCursorBackground {
        self.background
    }

    pub fn set_properties(&mut self, hotspot_x: i16, hotspot_y: i16, width: u16, height: u16) {
        let clamped_w = (width as u32).min(self.max_width) as u16;
        let clamped_h = (height as u32).min(self.max_height) as u16;
        if clamped_w != width || clamped_h != height {
            log_warn!(
                "Cursor {}x{} exceeds cursor surface {}x{}, clamping",
                width,
                height,
                self.max_width,
                self.max_height
            );
        }
        self.properties = CursorProperties {
            hotspot_x,
            hotspot_y,
            width: clamped_w,
            height: clamped_h,
        };
    }

    /// Blank the cursor bitmap without touching overlay state.
    pub fn erase(&self, bitmap: &mut Surface) {
        bitmap.fill(0);
    }

    /// Force a redraw next tick even if the pointer did not move.
    pub fn mark_dirty(&mut self) {
        self.state = BufferState::Dirty;
    }

    pub fn disable(&mut self) {
        self.state = BufferState::Disabled;
    }

    /// Advance the show latch for this tick and report whether to draw.
    pub fn update_visibility(&mut self) -> bool {
        if self.state == BufferState::Dirty {
            self.state = BufferState::Ready;
        }
        self.show = if self.show {
            self.state != BufferState::Disabled
        } else {
            self.state == BufferState::Ready
        };
        self.show
    }

    pub fn is_shown(&self) -> bool {
        self.show
    }

    /// Clip the cursor at `pointer` against the screen. `None` when nothing
    /// of it would be visible.
    pub fn place(&self, pointer: (i32, i32), screen_width: u32, screen_height: u32) -> Option<CursorPlacement> {
        let props = self.properties;
        let left = i64::from(pointer.0) - i64::from(props.hotspot_x);
        let top = i64::from(pointer.1) - i64::from(props.hotspot_y);
        let right = left + i64::from(props.width);
        let bottom = top + i64::from(props.height);

        let dest = Rect::clipped(left, top, right, bottom, screen_width, screen_height)?;
        Some(CursorPlacement {
            dest,
            src_x: (-left).max(0) as u32,
            src_y: (-top).max(0) as u32,
        })
    }

    /// Rectangle to undraw this tick, if the cursor was drawn last tick.
    pub fn take_restore(&mut self) -> Option<Rect> {
        if !self.background.restore {
            return None;
        }
        self.background.restore = false;
        Some(self.background.rect)
    }

    pub fn record_drawn(&mut self, rect: Rect) {
        self.background = MouseCursorBackground { restore: true, rect };
    }

    pub fn clear_restore(&mut self) {
        self.background.restore = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> MouseCursorOverlay {
        let mut o = MouseCursorOverlay::new(64, 64);
        o.set_properties(4, 4, 32, 32);
        o
    }

    #[test]
    fn placement_inside_screen_is_unclipped() {
        let p = overlay().place((100, 100), 640, 480).unwrap();
        assert_eq!(p.dest, Rect::new(96, 96, 128, 128).unwrap());
        assert_eq!((p.src_x, p.src_y), (0, 0));
    }

    #[test]
    fn placement_clips_top_left_and_offsets_source() {
        let p = overlay().place((0, 2), 640, 480).unwrap();
        assert_eq!(p.dest, Rect::new(0, 0, 28, 30).unwrap());
        assert_eq!((p.src_x, p.src_y), (4, 2));
        assert_eq!(p.source_rect(), Rect::new(4, 2, 32, 32).unwrap());
    }

    #[test]
    fn placement_clips_bottom_right() {
        let p = overlay().place((630, 470), 640, 480).unwrap();
        assert_eq!(p.dest, Rect::new(626, 466, 640, 480).unwrap());
        assert_eq!(p.source_rect().width(), 14);
    }

    #[test]
    fn fully_offscreen_cursor_has_no_placement() {
        let o = overlay();
        assert!(o.place((-100, 50), 640, 480).is_none());
        assert!(o.place((50, -40), 640, 480).is_none());
        assert!(o.place((700, 50), 640, 480).is_none());
        assert!(o.place((50, 490), 640, 480).is_none());
    }

    #[test]
    fn extreme_pointer_positions_are_offscreen() {
        let o = overlay();
        for pointer in [(i32::MIN, 0), (0, i32::MIN), (i32::MAX, 0), (0, i32::MAX), (i32::MIN, i32::MAX)] {
            assert!(o.place(pointer, 640, 480).is_none(), "{pointer:?}");
        }
    }

    #[test]
    fn visibility_latch_follows_state() {
        let mut o = overlay();
        assert!(!o.update_visibility());
        o.mark_dirty();
        assert!(o.update_visibility());
        assert_eq!(o.state(), BufferState::Ready);
        assert!(o.update_visibility());
        o.disable();
        assert!(!o.update_visibility());
    }

    #[test]
    fn oversize_properties_are_clamped() {
        let mut o = MouseCursorOverlay::new(16, 16);
        o.set_properties(0, 0, 40, 8);
        assert_eq!(o.properties().width, 16);
        assert_eq!(o.properties().height, 8);
    }

    #[test]
    fn restore_is_one_shot() {
        let mut o = overlay();
        let r = Rect::new(1, 1, 5, 5).unwrap();
        o.record_drawn(r);
        assert_eq!(o.take_restore(), Some(r));
        assert_eq!(o.take_restore(), None);
    }
}
