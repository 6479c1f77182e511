pub mod logger;
pub mod error;
pub mod config;
pub mod rect;
pub mod surface;
pub mod pixel_format;
pub mod dirty;
pub mod cursor;
pub mod scroll;
pub mod hooks;
pub mod display;
pub mod targa;
pub mod capture;
pub mod video;
pub mod compositor;
pub mod shared;
pub mod event_loop;

pub use logger::*;
pub use error::{VideoError, VideoResult};
pub use config::VideoConfig;
pub use rect::Rect;
pub use surface::{Surface, ZBuffer};
pub use pixel_format::{PixelFormat, PixelLayout};
pub use dirty::{DirtyRegionTracker, RegionOutcome};
pub use cursor::{BufferState, MouseCursorOverlay};
pub use scroll::{ScrollDirection, ScrollRequest};
pub use hooks::{FadeTransition, VideoOverlays, WorldRenderer};
pub use display::{Display, HeadlessDisplay, PresentEvent, PresentRecorder};
pub use capture::ScreenCaptureService;
pub use video::{VideoContext, VideoManagerState};
pub use compositor::RefreshStats;
pub use shared::SharedVideo;
pub use event_loop::{EventLoop, GameTick, StepOutcome, VideoEvent};
