use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logger::LogLevel;
use crate::rect::Rect;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u8,

    /// Capacity of each dirty-region list before degrading to a full refresh.
    #[serde(default = "default_max_dirty_regions")]
    pub max_dirty_regions: usize,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default = "default_cursor_size")]
    pub max_cursor_width: u32,
    #[serde(default = "default_cursor_size")]
    pub max_cursor_height: u32,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The scrolling map area. `end_y` is also the seam where scroll-exposed
/// regions are split between the map and the interface panel below it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewportConfig {
    pub start_x: u32,
    pub end_x: u32,
    pub start_y: u32,
    pub end_y: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Frames buffered in memory before continuous capture flushes to disk.
    #[serde(default = "default_capture_frames")]
    pub ring_capacity: usize,
    #[serde(default = "default_capture_fps")]
    pub frames_per_second: u32,
    #[serde(default = "default_capture_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_log_retention")]
    pub retention_count: usize,
    #[serde(default)]
    pub stream_to_stdout: bool,
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_screen_width() -> u32 {
    640
}

fn default_screen_height() -> u32 {
    480
}

fn default_bit_depth() -> u8 {
    16
}

fn default_max_dirty_regions() -> usize {
    128
}

fn default_cursor_size() -> u32 {
    64
}

fn default_capture_frames() -> usize {
    25
}

fn default_capture_fps() -> u32 {
    15
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from("captures")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention() -> usize {
    10
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            start_x: 0,
            end_x: 640,
            start_y: 0,
            end_y: 360,
        }
    }
}

impl ViewportConfig {
    pub fn rect(&self) -> Option<Rect> {
        Rect::new(self.start_x, self.start_y, self.end_x, self.end_y)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_capacity: default_capture_frames(),
            frames_per_second: default_capture_fps(),
            output_dir: default_capture_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            retention_count: default_log_retention(),
            stream_to_stdout: false,
            level: default_log_level(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            bit_depth: default_bit_depth(),
            max_dirty_regions: default_max_dirty_regions(),
            viewport: ViewportConfig::default(),
            max_cursor_width: default_cursor_size(),
            max_cursor_height: default_cursor_size(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl VideoConfig {
    /// Missing file means defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: VideoConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path.as_ref(), content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            anyhow::bail!(
                "Screen size {}x{} must be non-zero",
                self.screen_width,
                self.screen_height
            );
        }
        if self.screen_width > u16::MAX as u32 || self.screen_height > u16::MAX as u32 {
            anyhow::bail!("Screen size exceeds 16-bit image dimensions");
        }
        if self.max_dirty_regions == 0 {
            anyhow::bail!("Dirty region capacity must be at least 1");
        }

        let vp = &self.viewport;
        if vp.rect().is_none() {
            anyhow::bail!(
                "Viewport ({},{})-({},{}) is empty",
                vp.start_x,
                vp.start_y,
                vp.end_x,
                vp.end_y
            );
        }
        if vp.end_x > self.screen_width || vp.end_y > self.screen_height {
            anyhow::bail!("Viewport extends past the screen");
        }

        if self.max_cursor_width == 0 || self.max_cursor_height == 0 {
            anyhow::bail!("Cursor surface must be non-empty");
        }
        if self.capture.ring_capacity == 0 {
            anyhow::bail!("Capture ring capacity must be at least 1");
        }
        if self.capture.frames_per_second == 0 || self.capture.frames_per_second > 1000 {
            anyhow::bail!(
                "Capture rate {} fps out of range [1, 1000]",
                self.capture.frames_per_second
            );
        }

        Ok(())
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(1000 / self.capture.frames_per_second.max(1) as u64)
    }
}
