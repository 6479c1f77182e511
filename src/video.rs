//! The video manager: owns every surface, the dirty-region tracker, the
//! cursor overlay and the capture service, and gates them behind a small
//! lifecycle state machine.

use std::path::Path;
use std::time::Instant;

use crate::capture::{write_thumbnail, ScreenCaptureService};
use crate::config::VideoConfig;
use crate::cursor::{BufferState, MouseCursorOverlay};
use crate::dirty::{DirtyRegionTracker, RegionOutcome};
use crate::display::Display;
use crate::error::{VideoError, VideoResult};
use crate::hooks::{FadeTransition, NoFade, NoOverlays, NullRenderer, VideoOverlays, WorldRenderer};
use crate::pixel_format::PixelFormat;
use crate::rect::Rect;
use crate::scroll::ScrollRequest;
use crate::surface::{Surface, ZBuffer};
use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoManagerState {
    Off,
    On,
    Suspended,
    ShuttingDown,
}

pub(crate) struct Surfaces {
    pub(crate) frame: Surface,
    pub(crate) screen: Surface,
    pub(crate) cursor: Surface,
    pub(crate) zbuffer: ZBuffer,
}

pub struct VideoContext {
    pub(crate) config: VideoConfig,
    pub(crate) state: VideoManagerState,
    pub(crate) display: Box<dyn Display>,
    pub(crate) surfaces: Option<Surfaces>,
    pub(crate) format: Option<PixelFormat>,
    pub(crate) dirty: DirtyRegionTracker,
    pub(crate) frame_state: BufferState,
    pub(crate) cursor: MouseCursorOverlay,
    pub(crate) pointer: (i32, i32),
    pub(crate) pending_scroll: Option<ScrollRequest>,
    pub(crate) capture: ScreenCaptureService,
    pub(crate) renderer: Box<dyn WorldRenderer>,
    pub(crate) fade: Box<dyn FadeTransition>,
    pub(crate) overlays: Box<dyn VideoOverlays>,
    pub(crate) frames_presented: u64,
}

impl VideoContext {
    /// A context in the `Off` state. Nothing is allocated until `initialize`.
    pub fn new(config: VideoConfig, display: Box<dyn Display>) -> Self {
        let dirty = tracker_for(&config);
        let cursor = MouseCursorOverlay::new(config.max_cursor_width, config.max_cursor_height);
        let capture = ScreenCaptureService::new(
            config.capture.output_dir.clone(),
            config.capture.ring_capacity,
            config.frame_period(),
        );

        Self {
            config,
            state: VideoManagerState::Off,
            display,
            surfaces: None,
            format: None,
            dirty,
            frame_state: BufferState::Ready,
            cursor,
            pointer: (0, 0),
            pending_scroll: None,
            capture,
            renderer: Box::new(NullRenderer),
            fade: Box::new(NoFade),
            overlays: Box::new(NoOverlays),
            frames_presented: 0,
        }
    }

    pub fn with_renderer(mut self, renderer: impl WorldRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_fade(mut self, fade: impl FadeTransition + 'static) -> Self {
        self.fade = Box::new(fade);
        self
    }

    pub fn with_overlays(mut self, overlays: impl VideoOverlays + 'static) -> Self {
        self.overlays = Box::new(overlays);
        self
    }

    pub fn state(&self) -> VideoManagerState {
        self.state
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// Open the visible surface and allocate the off-screen buffers. On
    /// failure the context stays `Off` with nothing allocated.
    pub fn initialize(&mut self) -> VideoResult<()> {
        if self.state != VideoManagerState::Off {
            return Err(VideoError::InvalidTransition {
                from: self.state,
                operation: "initialize",
            });
        }

        match self.bring_up() {
            Ok(()) => {
                self.state = VideoManagerState::On;
                log_info!(
                    "Video manager on: {}x{}x{} ({:?})",
                    self.config.screen_width,
                    self.config.screen_height,
                    self.config.bit_depth,
                    self.format.map(|f| f.layout)
                );
                Ok(())
            }
            Err(e) => {
                log_error!("Video initialization failed: {}", e);
                self.surfaces = None;
                self.format = None;
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> VideoResult<()> {
        self.config
            .validate()
            .map_err(|e| VideoError::InvalidConfig(format!("{:#}", e)))?;
        if self.config.bit_depth != 16 {
            return Err(VideoError::UnsupportedBitDepth(self.config.bit_depth));
        }

        let (width, height) = (self.config.screen_width, self.config.screen_height);
        let masks = self.display.open(width, height, self.config.bit_depth)?;
        let format = match PixelFormat::from_masks(masks.red, masks.green, masks.blue) {
            Ok(format) => format,
            Err(e) => {
                self.display.close();
                return Err(e);
            }
        };

        self.surfaces = Some(Surfaces {
            frame: Surface::new(width, height),
            screen: Surface::new(width, height),
            cursor: Surface::new(self.config.max_cursor_width, self.config.max_cursor_height).with_color_key(0),
            zbuffer: ZBuffer::new(width, height),
        });
        self.format = Some(format);
        self.dirty = tracker_for(&self.config);
        self.dirty.invalidate_screen();
        self.frame_state = BufferState::Dirty;
        self.cursor = MouseCursorOverlay::new(self.config.max_cursor_width, self.config.max_cursor_height);
        self.pending_scroll = None;
        Ok(())
    }

    /// Release everything and return to `Off`. Safe to call repeatedly,
    /// including from within a shutdown already in progress.
    pub fn shutdown(&mut self) {
        if matches!(self.state, VideoManagerState::Off | VideoManagerState::ShuttingDown) {
            return;
        }
        self.state = VideoManagerState::ShuttingDown;

        if let Some(format) = self.format {
            self.capture.disable(&format);
        }
        self.cursor.clear_restore();
        self.cursor.disable();
        self.dirty.clear();
        self.pending_scroll = None;
        self.display.close();
        self.surfaces = None;
        self.format = None;

        self.state = VideoManagerState::Off;
        log_info!("Video manager off after {} presented frames", self.frames_presented);
    }

    pub fn suspend(&mut self) -> VideoResult<()> {
        if self.state != VideoManagerState::On {
            return Err(VideoError::InvalidTransition {
                from: self.state,
                operation: "suspend",
            });
        }
        self.state = VideoManagerState::Suspended;
        self.cursor.clear_restore();
        log_info!("Video manager suspended");
        Ok(())
    }

    /// Back to `On` with the whole screen marked for redraw.
    pub fn restore(&mut self) -> VideoResult<()> {
        if self.state != VideoManagerState::Suspended {
            return Err(VideoError::InvalidTransition {
                from: self.state,
                operation: "restore",
            });
        }
        self.dirty.invalidate_screen();
        self.frame_state = BufferState::Dirty;
        self.cursor.mark_dirty();
        self.state = VideoManagerState::On;
        log_info!("Video manager restored");
        Ok(())
    }

    pub fn invalidate_region(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> RegionOutcome {
        let outcome = self.dirty.invalidate_region(left, top, right, bottom);
        self.note_outcome(outcome);
        outcome
    }

    pub fn invalidate_rect(&mut self, rect: Rect) -> RegionOutcome {
        let outcome = self.dirty.invalidate_rect(rect);
        self.note_outcome(outcome);
        outcome
    }

    pub fn invalidate_region_ex(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> Vec<RegionOutcome> {
        let outcomes = self.dirty.invalidate_region_ex(left, top, right, bottom);
        for outcome in &outcomes {
            self.note_outcome(*outcome);
        }
        outcomes
    }

    pub fn add_region_ex(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> RegionOutcome {
        let outcome = self.dirty.add_region_ex(left, top, right, bottom);
        self.note_outcome(outcome);
        outcome
    }

    /// Only call between refreshes.
    pub fn invalidate_screen(&mut self) {
        self.dirty.invalidate_screen();
        self.frame_state = BufferState::Dirty;
    }

    fn note_outcome(&mut self, outcome: RegionOutcome) {
        if matches!(outcome, RegionOutcome::Stored(_) | RegionOutcome::Overflowed) {
            self.frame_state = BufferState::Dirty;
        }
    }

    pub fn dirty_regions(&self) -> &DirtyRegionTracker {
        &self.dirty
    }

    pub fn frame_buffer_state(&self) -> BufferState {
        self.frame_state
    }

    /// The renderer finished painting; composite on the next refresh.
    pub fn end_frame_render(&mut self) {
        self.frame_state = BufferState::Dirty;
    }

    pub fn set_cursor_properties(&mut self, hotspot_x: i16, hotspot_y: i16, width: u16, height: u16) {
        self.cursor.set_properties(hotspot_x, hotspot_y, width, height);
    }

    pub fn erase_cursor(&mut self) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            self.cursor.erase(&mut surfaces.cursor);
        }
    }

    pub fn mark_mouse_dirty(&mut self) {
        self.cursor.mark_dirty();
    }

    pub fn disable_cursor(&mut self) {
        self.cursor.disable();
    }

    pub fn cursor(&self) -> &MouseCursorOverlay {
        &self.cursor
    }

    pub fn set_pointer_position(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
    }

    pub fn pointer_position(&self) -> (i32, i32) {
        self.pointer
    }

    /// Pan the viewport on the next refresh. A later request in the same
    /// tick replaces an earlier one.
    pub fn request_scroll(&mut self, request: ScrollRequest) {
        self.pending_scroll = Some(request);
        self.frame_state = BufferState::Dirty;
    }

    pub fn scroll_pending(&self) -> bool {
        self.pending_scroll.is_some()
    }

    pub fn print_screen(&mut self) {
        self.capture.request_print();
    }

    /// Returns whether continuous capture is now running.
    pub fn toggle_video_capture(&mut self) -> VideoResult<bool> {
        let format = self.format.ok_or(VideoError::NotInitialized)?;
        Ok(self.capture.toggle(Instant::now(), &format))
    }

    pub fn capture(&self) -> &ScreenCaptureService {
        &self.capture
    }

    pub fn save_thumbnail(&self, path: &Path) -> VideoResult<()> {
        let (surfaces, format) = self.surfaces_and_format()?;
        write_thumbnail(&surfaces.screen, format, path)
    }

    /// Width, height and bit depth of the configured mode.
    pub fn current_video_settings(&self) -> (u32, u32, u8) {
        (self.config.screen_width, self.config.screen_height, self.config.bit_depth)
    }

    pub fn primary_rgb_masks(&self) -> VideoResult<(u32, u32, u32)> {
        self.format.map(|f| f.masks()).ok_or(VideoError::NotInitialized)
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.format
    }

    pub fn frame_buffer(&self) -> VideoResult<&Surface> {
        Ok(&self.surfaces()?.frame)
    }

    pub fn frame_buffer_mut(&mut self) -> VideoResult<&mut Surface> {
        Ok(&mut self.surfaces_mut()?.frame)
    }

    pub fn screen(&self) -> VideoResult<&Surface> {
        Ok(&self.surfaces()?.screen)
    }

    pub fn cursor_buffer_mut(&mut self) -> VideoResult<&mut Surface> {
        Ok(&mut self.surfaces_mut()?.cursor)
    }

    pub fn z_buffer_mut(&mut self) -> VideoResult<&mut ZBuffer> {
        Ok(&mut self.surfaces_mut()?.zbuffer)
    }

    /// Frame buffer and depth buffer together, for renderers that need both.
    pub fn render_targets_mut(&mut self) -> VideoResult<(&mut Surface, &mut ZBuffer)> {
        let surfaces = self.surfaces_mut()?;
        Ok((&mut surfaces.frame, &mut surfaces.zbuffer))
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn surfaces(&self) -> VideoResult<&Surfaces> {
        self.surfaces.as_ref().ok_or(VideoError::NotInitialized)
    }

    fn surfaces_mut(&mut self) -> VideoResult<&mut Surfaces> {
        self.surfaces.as_mut().ok_or(VideoError::NotInitialized)
    }

    fn surfaces_and_format(&self) -> VideoResult<(&Surfaces, &PixelFormat)> {
        match (self.surfaces.as_ref(), self.format.as_ref()) {
            (Some(s), Some(f)) => Ok((s, f)),
            _ => Err(VideoError::NotInitialized),
        }
    }
}

impl Drop for VideoContext {
    fn drop(&mut self) {
        if self.state == VideoManagerState::Suspended {
            log_warn!("Video context dropped while suspended");
        }
        self.shutdown();
    }
}

fn tracker_for(config: &VideoConfig) -> DirtyRegionTracker {
    DirtyRegionTracker::new(
        config.screen_width,
        config.screen_height,
        config.viewport.end_y,
        config.max_dirty_regions,
    )
}
