//! The visible surface sink. A real backend wraps a window or framebuffer
//! device; `HeadlessDisplay` records what would have been shown.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{VideoError, VideoResult};
use crate::pixel_format::PixelLayout;
use crate::rect::Rect;
use crate::surface::Surface;

/// Channel masks reported by the display for the mode it opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl From<PixelLayout> for PixelMasks {
    fn from(layout: PixelLayout) -> Self {
        let (red, green, blue) = layout.masks();
        Self { red, green, blue }
    }
}

pub trait Display: Send {
    /// Acquire a visible surface of the given geometry.
    fn open(&mut self, width: u32, height: u32, bit_depth: u8) -> VideoResult<PixelMasks>;

    /// Push the listed rectangles of `screen` to the visible output.
    fn present(&mut self, screen: &Surface, rects: &[Rect]);

    fn present_all(&mut self, screen: &Surface);

    fn close(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresentEvent {
    Full,
    Rects(Vec<Rect>),
}

/// Shared log of presents. Clones observe the same log.
#[derive(Clone, Debug, Default)]
pub struct PresentRecorder {
    events: Arc<Mutex<Vec<PresentEvent>>>,
}

impl PresentRecorder {
    pub fn events(&self) -> Vec<PresentEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<PresentEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: PresentEvent) {
        self.events.lock().push(event);
    }
}

/// Display without an output device. Clones share the present log, the
/// last frame and the open flag.
#[derive(Clone, Debug)]
pub struct HeadlessDisplay {
    masks: PixelMasks,
    fail_open: Option<String>,
    recorder: PresentRecorder,
    last_frame: Arc<Mutex<Option<Surface>>>,
    open: Arc<AtomicBool>,
}

impl HeadlessDisplay {
    pub fn new(layout: PixelLayout) -> Self {
        Self {
            masks: layout.into(),
            fail_open: None,
            recorder: PresentRecorder::default(),
            last_frame: Arc::new(Mutex::new(None)),
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report `masks` from `open` instead of a known layout's.
    pub fn with_masks(mut self, masks: PixelMasks) -> Self {
        self.masks = masks;
        self
    }

    /// Make `open` fail with a mode-set error carrying `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_open = Some(reason.into());
        self
    }

    pub fn recorder(&self) -> PresentRecorder {
        self.recorder.clone()
    }

    /// Handle to the most recently presented screen contents.
    pub fn last_frame(&self) -> Arc<Mutex<Option<Surface>>> {
        Arc::clone(&self.last_frame)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn mirror(&self, screen: &Surface) {
        *self.last_frame.lock() = Some(screen.clone());
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new(PixelLayout::Rgb565)
    }
}

impl Display for HeadlessDisplay {
    fn open(&mut self, width: u32, height: u32, bit_depth: u8) -> VideoResult<PixelMasks> {
        if let Some(reason) = &self.fail_open {
            return Err(VideoError::ModeSet {
                width,
                height,
                bit_depth,
                reason: reason.clone(),
            });
        }
        self.open.store(true, Ordering::Release);
        Ok(self.masks)
    }

    fn present(&mut self, screen: &Surface, rects: &[Rect]) {
        if rects.is_empty() {
            return;
        }
        self.recorder.push(PresentEvent::Rects(rects.to_vec()));
        self.mirror(screen);
    }

    fn present_all(&mut self, screen: &Surface) {
        self.recorder.push(PresentEvent::Full);
        self.mirror(screen);
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_display_reports_mode() {
        let mut d = HeadlessDisplay::default().failing("no such mode");
        match d.open(640, 480, 16) {
            Err(VideoError::ModeSet { width, bit_depth, .. }) => {
                assert_eq!((width, bit_depth), (640, 16));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!d.is_open());
    }

    #[test]
    fn presents_are_recorded_in_order() {
        let mut d = HeadlessDisplay::new(PixelLayout::Rgb555);
        let recorder = d.recorder();
        assert_eq!(d.open(8, 8, 16).unwrap(), PixelMasks { red: 0x7C00, green: 0x03E0, blue: 0x001F });

        let screen = Surface::new(8, 8);
        let r = Rect::new(0, 0, 2, 2).unwrap();
        d.present_all(&screen);
        d.present(&screen, &[]);
        d.present(&screen, &[r]);
        assert_eq!(recorder.take(), vec![PresentEvent::Full, PresentEvent::Rects(vec![r])]);
        assert!(recorder.events().is_empty());
        assert!(d.last_frame().lock().is_some());
    }
}
