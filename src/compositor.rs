//! Per-tick composition of the frame buffer onto the visible surface.

use std::time::Instant;

use crate::cursor::BufferState;
use crate::log_debug;
use crate::rect::Rect;
use crate::scroll::{plan_scroll, ScrollCompositor};
use crate::video::{VideoContext, VideoManagerState};

/// What a single refresh did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// False when the manager was not `On` and nothing ran.
    pub composited: bool,
    pub full_refresh: bool,
    pub faded: bool,
    pub rects_blitted: usize,
    pub rects_presented: usize,
    pub cursor: Option<Rect>,
    pub captured: bool,
    pub printed: bool,
}

impl VideoContext {
    pub fn refresh_screen(&mut self) -> RefreshStats {
        self.refresh_screen_at(Instant::now())
    }

    /// Run one composite-and-present pass. `now` drives continuous capture
    /// timing.
    pub fn refresh_screen_at(&mut self, now: Instant) -> RefreshStats {
        let mut stats = RefreshStats::default();
        if self.state != VideoManagerState::On {
            return stats;
        }
        let (Some(surfaces), Some(format)) = (self.surfaces.as_mut(), self.format) else {
            return stats;
        };
        stats.composited = true;

        let undrawn = self.cursor.take_restore();
        if let Some(rect) = undrawn {
            surfaces.screen.blit_rect_from(&surfaces.frame, rect);
        }

        let scroll_in_flight = self.pending_scroll.is_some();
        if self.frame_state == BufferState::Dirty {
            if self.fade.is_active() {
                self.fade.run(&surfaces.frame, &mut surfaces.screen);
                stats.faded = true;
            } else if self.dirty.force_full_refresh() {
                surfaces.screen.blit_rect_from(&surfaces.frame, surfaces.frame.bounds());
                stats.full_refresh = true;
            } else {
                for rect in self.dirty.primary() {
                    surfaces.screen.blit_rect_from(&surfaces.frame, *rect);
                    stats.rects_blitted += 1;
                }
                for rect in self.dirty.presentable_extra(scroll_in_flight) {
                    surfaces.screen.blit_rect_from(&surfaces.frame, *rect);
                    stats.rects_blitted += 1;
                }
            }

            if let Some(request) = self.pending_scroll {
                if let Some(viewport) = self.config.viewport.rect() {
                    let plan = plan_scroll(viewport, &request);
                    let touched = ScrollCompositor::apply(
                        &plan,
                        true,
                        &mut surfaces.frame,
                        &mut surfaces.screen,
                        &mut surfaces.zbuffer,
                        &mut *self.renderer,
                        &mut *self.overlays,
                    );
                    for rect in touched {
                        self.dirty.invalidate_rect(rect);
                    }
                }
            }
            self.frame_state = BufferState::Ready;
        }

        if self.capture.is_due(now) {
            self.capture.snapshot(&surfaces.screen, &format, now);
            stats.captured = true;
        }

        if self.capture.print_requested() {
            stats.printed = self.capture.write_print(&surfaces.screen, &format).is_some();
        }

        if self.cursor.update_visibility() {
            let (width, height) = (surfaces.screen.width(), surfaces.screen.height());
            match self.cursor.place(self.pointer, width, height) {
                Some(placement) => {
                    surfaces.screen.blit_from(
                        &surfaces.cursor,
                        placement.source_rect(),
                        placement.dest.left,
                        placement.dest.top,
                    );
                    self.display.present(&surfaces.screen, &[placement.dest]);
                    self.cursor.record_drawn(placement.dest);
                    stats.cursor = Some(placement.dest);
                }
                None => self.cursor.clear_restore(),
            }
        }

        if self.dirty.force_full_refresh() {
            self.display.present_all(&surfaces.screen);
            stats.full_refresh = true;
        } else {
            let mut rects: Vec<Rect> = self.dirty.primary().to_vec();
            rects.extend(self.dirty.presentable_extra(scroll_in_flight).copied());
            rects.extend(undrawn);
            stats.rects_presented = rects.len();
            self.display.present(&surfaces.screen, &rects);
        }

        self.dirty.clear();
        self.pending_scroll = None;
        self.frames_presented += 1;

        if stats.full_refresh {
            log_debug!("Full screen refresh (frame {})", self.frames_presented);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use crate::config::VideoConfig;
    use crate::display::{HeadlessDisplay, PresentEvent, PresentRecorder};
    use crate::hooks::FadeTransition;
    use crate::rect::Rect;
    use crate::surface::Surface;
    use crate::video::VideoContext;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn context() -> (VideoContext, PresentRecorder) {
        let display = HeadlessDisplay::default();
        let recorder = display.recorder();
        let mut ctx = VideoContext::new(VideoConfig::default(), Box::new(display));
        ctx.initialize().unwrap();
        (ctx, recorder)
    }

    #[test]
    fn first_refresh_is_full_then_idle_presents_nothing() {
        let (mut ctx, recorder) = context();
        let stats = ctx.refresh_screen();
        assert!(stats.full_refresh);
        assert_eq!(recorder.take(), vec![PresentEvent::Full]);

        let stats = ctx.refresh_screen();
        assert!(stats.composited);
        assert_eq!(stats.rects_blitted, 0);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn suspended_refresh_is_a_no_op() {
        let (mut ctx, recorder) = context();
        ctx.suspend().unwrap();
        assert!(!ctx.refresh_screen().composited);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn cursor_is_drawn_then_undrawn_on_move() {
        let (mut ctx, recorder) = context();
        ctx.refresh_screen();
        recorder.clear();

        ctx.set_cursor_properties(0, 0, 4, 4);
        ctx.cursor_buffer_mut().unwrap().fill_rect(Rect::new(0, 0, 4, 4).unwrap(), 0xFFFF);
        ctx.mark_mouse_dirty();
        ctx.set_pointer_position(10, 10);
        let first = Rect::new(10, 10, 14, 14).unwrap();
        assert_eq!(ctx.refresh_screen().cursor, Some(first));
        assert_eq!(ctx.screen().unwrap().pixel(11, 11), Some(0xFFFF));
        assert_eq!(recorder.take(), vec![PresentEvent::Rects(vec![first])]);

        ctx.set_pointer_position(20, 20);
        let second = Rect::new(20, 20, 24, 24).unwrap();
        ctx.refresh_screen();
        assert_eq!(ctx.screen().unwrap().pixel(11, 11), Some(0));
        assert_eq!(
            recorder.take(),
            vec![PresentEvent::Rects(vec![second]), PresentEvent::Rects(vec![first])]
        );
    }

    #[test]
    fn offscreen_cursor_clears_restore() {
        let (mut ctx, _recorder) = context();
        ctx.set_cursor_properties(0, 0, 8, 8);
        ctx.mark_mouse_dirty();
        ctx.set_pointer_position(5, 5);
        ctx.refresh_screen();
        assert!(ctx.cursor().background().restore);

        ctx.set_pointer_position(-50, -50);
        assert_eq!(ctx.refresh_screen().cursor, None);
        assert!(!ctx.cursor().background().restore);
    }

    #[test]
    fn extreme_pointer_only_suppresses_the_cursor() {
        let (mut ctx, _recorder) = context();
        ctx.set_cursor_properties(4, 4, 8, 8);
        ctx.mark_mouse_dirty();
        ctx.set_pointer_position(20, 20);
        ctx.refresh_screen();
        assert!(ctx.cursor().background().restore);

        for (x, y) in [(i32::MIN, 0), (i32::MAX, i32::MAX), (0, i32::MIN)] {
            ctx.set_pointer_position(x, y);
            let stats = ctx.refresh_screen();
            assert!(stats.composited);
            assert_eq!(stats.cursor, None);
            assert!(!ctx.cursor().background().restore);
        }
    }

    struct CountingFade(Arc<Mutex<u32>>);

    impl FadeTransition for CountingFade {
        fn is_active(&self) -> bool {
            true
        }

        fn run(&mut self, _frame: &Surface, screen: &mut Surface) {
            screen.fill(0x0001);
            *self.0.lock() += 1;
        }
    }

    #[test]
    fn active_fade_owns_the_blit() {
        let runs = Arc::new(Mutex::new(0));
        let display = HeadlessDisplay::default();
        let mut ctx = VideoContext::new(VideoConfig::default(), Box::new(display))
            .with_fade(CountingFade(Arc::clone(&runs)));
        ctx.initialize().unwrap();
        ctx.frame_buffer_mut().unwrap().fill(0x7777);

        let stats = ctx.refresh_screen();
        assert!(stats.faded);
        assert_eq!(*runs.lock(), 1);
        assert_eq!(ctx.screen().unwrap().pixel(0, 0), Some(0x0001));
    }
}
