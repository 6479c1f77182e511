use parking_lot::Mutex;
use std::sync::Arc;
use tilescreen::display::{HeadlessDisplay, PresentEvent, PresentRecorder};
use tilescreen::{
    Rect, RegionOutcome, ScrollDirection, ScrollRequest, Surface, VideoConfig, VideoContext, VideoError,
    VideoManagerState, WorldRenderer, ZBuffer,
};

fn started(config: VideoConfig) -> (VideoContext, PresentRecorder) {
    let display = HeadlessDisplay::default();
    let recorder = display.recorder();
    let mut ctx = VideoContext::new(config, Box::new(display));
    ctx.initialize().unwrap();
    ctx.refresh_screen();
    recorder.clear();
    (ctx, recorder)
}

#[test]
fn two_regions_are_blitted_and_presented_without_full_refresh() {
    let (mut ctx, recorder) = started(VideoConfig::default());
    ctx.frame_buffer_mut().unwrap().fill(0x1111);

    ctx.invalidate_region(10, 10, 50, 50);
    ctx.invalidate_region(-5, -5, 700, 40);
    let first = Rect::new(10, 10, 50, 50).unwrap();
    let second = Rect::new(0, 0, 640, 40).unwrap();
    assert_eq!(ctx.dirty_regions().primary(), &[first, second]);

    let stats = ctx.refresh_screen();
    assert!(!stats.full_refresh);
    assert_eq!(stats.rects_blitted, 2);
    assert_eq!(recorder.take(), vec![PresentEvent::Rects(vec![first, second])]);

    let screen = ctx.screen().unwrap();
    assert_eq!(screen.pixel(20, 20), Some(0x1111));
    assert_eq!(screen.pixel(600, 5), Some(0x1111));
    assert_eq!(screen.pixel(100, 100), Some(0));
    assert!(ctx.dirty_regions().is_clean());
}

#[test]
fn overflow_on_the_129th_region_degrades_to_full_refresh() {
    let (mut ctx, recorder) = started(VideoConfig::default());

    for i in 0..128 {
        assert!(matches!(ctx.invalidate_region(i, 0, i + 1, 10), RegionOutcome::Stored(_)));
    }
    assert_eq!(ctx.invalidate_region(128, 0, 129, 10), RegionOutcome::Overflowed);
    assert!(ctx.dirty_regions().force_full_refresh());
    assert!(ctx.dirty_regions().primary().is_empty());
    assert!(ctx.dirty_regions().extra().is_empty());

    let stats = ctx.refresh_screen();
    assert!(stats.full_refresh);
    assert_eq!(recorder.take(), vec![PresentEvent::Full]);
}

#[test]
fn invalidate_screen_short_circuits_later_regions() {
    let (mut ctx, _recorder) = started(VideoConfig::default());
    ctx.invalidate_screen();
    assert_eq!(ctx.invalidate_region(0, 0, 10, 10), RegionOutcome::Superseded);
    assert_eq!(ctx.add_region_ex(0, 0, 10, 10), RegionOutcome::Superseded);
    assert!(ctx.dirty_regions().force_full_refresh());
    assert!(ctx.dirty_regions().primary().is_empty());
    assert!(ctx.dirty_regions().extra().is_empty());
}

#[test]
fn shutdown_is_idempotent_and_restore_needs_suspend() {
    let (mut ctx, _recorder) = started(VideoConfig::default());
    assert!(matches!(
        ctx.restore(),
        Err(VideoError::InvalidTransition { from: VideoManagerState::On, .. })
    ));

    ctx.shutdown();
    let after_first = (ctx.state(), ctx.screen().is_err(), ctx.primary_rgb_masks().is_err());
    ctx.shutdown();
    let after_second = (ctx.state(), ctx.screen().is_err(), ctx.primary_rgb_masks().is_err());
    assert_eq!(after_first, (VideoManagerState::Off, true, true));
    assert_eq!(after_first, after_second);
    assert!(!ctx.refresh_screen().composited);
}

#[test]
fn cursor_moving_offscreen_clears_restore_and_undraws() {
    let (mut ctx, recorder) = started(VideoConfig::default());
    ctx.set_cursor_properties(2, 2, 8, 8);
    ctx.cursor_buffer_mut().unwrap().fill(0xABCD);
    ctx.mark_mouse_dirty();
    ctx.set_pointer_position(1, 1);

    let drawn = ctx.refresh_screen().cursor.unwrap();
    assert_eq!(drawn, Rect::new(0, 0, 7, 7).unwrap());
    assert_eq!(ctx.screen().unwrap().pixel(0, 0), Some(0xABCD));
    assert!(ctx.cursor().background().restore);
    recorder.clear();

    ctx.set_pointer_position(1000, 1000);
    assert_eq!(ctx.refresh_screen().cursor, None);
    assert!(!ctx.cursor().background().restore);
    assert_eq!(ctx.screen().unwrap().pixel(0, 0), Some(0));
    assert_eq!(recorder.take(), vec![PresentEvent::Rects(vec![drawn])]);
}

#[test]
fn disabled_cursor_is_undrawn_once() {
    let (mut ctx, recorder) = started(VideoConfig::default());
    ctx.set_cursor_properties(0, 0, 4, 4);
    ctx.mark_mouse_dirty();
    ctx.set_pointer_position(50, 50);
    let drawn = ctx.refresh_screen().cursor.unwrap();

    ctx.disable_cursor();
    recorder.clear();
    assert_eq!(ctx.refresh_screen().cursor, None);
    assert_eq!(recorder.take(), vec![PresentEvent::Rects(vec![drawn])]);
    assert!(!ctx.cursor().background().restore);

    ctx.refresh_screen();
    assert!(recorder.take().is_empty());
}

#[derive(Clone, Default)]
struct StripLog(Arc<Mutex<Vec<Rect>>>);

impl WorldRenderer for StripLog {
    fn render_static_rect(&mut self, frame: &mut Surface, _zbuffer: &mut ZBuffer, rect: Rect) {
        frame.fill_rect(rect, 0x0F0F);
        self.0.lock().push(rect);
    }
}

#[test]
fn scroll_renders_exposed_strips_and_presents_them() {
    let strips = StripLog::default();
    let display = HeadlessDisplay::default();
    let recorder = display.recorder();
    let mut ctx = VideoContext::new(VideoConfig::default(), Box::new(display)).with_renderer(strips.clone());
    ctx.initialize().unwrap();
    ctx.refresh_screen();
    recorder.clear();

    // An Ex region inside the map is hidden by the scroll blit; one in the
    // panel below the seam still goes out.
    ctx.invalidate_region_ex(0, 100, 10, 110);
    ctx.invalidate_region_ex(0, 400, 10, 410);

    ctx.request_scroll(ScrollRequest {
        direction: ScrollDirection::UpLeft,
        shift_x: 10,
        shift_y: 6,
    });
    let stats = ctx.refresh_screen();
    assert!(!stats.full_refresh);
    assert!(!ctx.scroll_pending());

    let column = Rect::new(0, 0, 10, 360).unwrap();
    let row = Rect::new(10, 0, 640, 6).unwrap();
    assert_eq!(*strips.0.lock(), vec![column, row]);
    assert_eq!(ctx.screen().unwrap().pixel(5, 200), Some(0x0F0F));

    let presented = match recorder.take().as_slice() {
        [PresentEvent::Rects(rects)] => rects.clone(),
        other => panic!("unexpected presents {other:?}"),
    };
    let destination = Rect::new(10, 6, 640, 360).unwrap();
    for expected in [destination, column, row, Rect::new(0, 400, 10, 410).unwrap()] {
        assert!(presented.contains(&expected), "{expected:?} missing from {presented:?}");
    }
    assert!(!presented.contains(&Rect::new(0, 100, 10, 110).unwrap()));
}

#[test]
fn refresh_always_repaints_scrolled_strips() {
    let strips = StripLog::default();
    let mut ctx = VideoContext::new(VideoConfig::default(), Box::new(HeadlessDisplay::default()))
        .with_renderer(strips.clone());
    ctx.initialize().unwrap();
    ctx.refresh_screen();

    ctx.request_scroll(ScrollRequest {
        direction: ScrollDirection::Left,
        shift_x: 10,
        shift_y: 0,
    });
    ctx.refresh_screen();

    let column = Rect::new(0, 0, 10, 360).unwrap();
    assert_eq!(*strips.0.lock(), vec![column]);
    assert_eq!(ctx.screen().unwrap().pixel(5, 200), Some(0x0F0F));
}

#[test]
fn suspended_context_does_nothing_until_restored() {
    let (mut ctx, recorder) = started(VideoConfig::default());
    ctx.suspend().unwrap();
    ctx.invalidate_region(0, 0, 5, 5);
    assert!(!ctx.refresh_screen().composited);
    assert!(recorder.events().is_empty());

    ctx.restore().unwrap();
    assert!(ctx.refresh_screen().full_refresh);
    assert_eq!(recorder.take(), vec![PresentEvent::Full]);
}
