//! Screen capture: single-shot prints, continuous movie capture into an
//! in-memory ring flushed as numbered TGA files, and PNG thumbnails.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::VideoResult;
use crate::pixel_format::PixelFormat;
use crate::surface::Surface;
use crate::targa::write_tga;
use crate::{log_debug, log_info, log_warn};

struct CapturedFrame {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
}

pub struct ScreenCaptureService {
    output_dir: PathBuf,
    ring_capacity: usize,
    period: Duration,
    enabled: bool,
    last_frame: Option<Instant>,
    frames: Vec<CapturedFrame>,
    print_requested: bool,
    print_index: u32,
    movie_index: u32,
}

impl ScreenCaptureService {
    pub fn new(output_dir: impl Into<PathBuf>, ring_capacity: usize, period: Duration) -> Self {
        Self {
            output_dir: output_dir.into(),
            ring_capacity: ring_capacity.max(1),
            period,
            enabled: false,
            last_frame: None,
            frames: Vec::new(),
            print_requested: false,
            print_index: 0,
            movie_index: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn buffered_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn enable(&mut self, now: Instant) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.last_frame = Some(now);
        self.frames = Vec::with_capacity(self.ring_capacity);
        log_info!(
            "Video capture started ({} frame ring, {} ms period)",
            self.ring_capacity,
            self.period.as_millis()
        );
    }

    /// Flushes whatever is buffered, then releases the ring.
    pub fn disable(&mut self, format: &PixelFormat) {
        if !self.enabled {
            return;
        }
        self.flush(format);
        self.enabled = false;
        self.last_frame = None;
        self.frames = Vec::new();
        log_info!("Video capture stopped");
    }

    /// Returns the new enabled state.
    pub fn toggle(&mut self, now: Instant, format: &PixelFormat) -> bool {
        if self.enabled {
            self.disable(format);
        } else {
            self.enable(now);
        }
        self.enabled
    }

    /// More than one period since the last frame, or the clock went backwards.
    pub fn is_due(&self, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_frame {
            None => true,
            Some(last) => now < last || now.duration_since(last) > self.period,
        }
    }

    /// Copy the screen into the next ring slot. A full ring is flushed to
    /// disk and reset.
    pub fn snapshot(&mut self, screen: &Surface, format: &PixelFormat, now: Instant) {
        if !self.enabled {
            return;
        }
        self.frames.push(CapturedFrame {
            width: screen.width() as u16,
            height: screen.height() as u16,
            pixels: screen.pixels().to_vec(),
        });
        self.last_frame = Some(now);

        if self.frames.len() >= self.ring_capacity {
            self.flush(format);
        }
    }

    /// Write every buffered frame as `captureNNNNN.tga`; returns how many
    /// files were written.
    pub fn flush(&mut self, format: &PixelFormat) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            log_warn!("Cannot create capture directory {}: {}", self.output_dir.display(), e);
        }

        let total = self.frames.len();
        let mut written = 0;
        for frame in self.frames.drain(..) {
            let path = self.output_dir.join(format!("capture{:05}.tga", self.movie_index));
            self.movie_index += 1;
            match write_tga_file(&path, frame.width, frame.height, &frame.pixels, format) {
                Ok(()) => written += 1,
                Err(e) => log_warn!("Failed to write capture frame {}: {}", path.display(), e),
            }
        }
        log_debug!("Flushed {}/{} capture frames", written, total);
        written
    }

    pub fn request_print(&mut self) {
        self.print_requested = true;
    }

    pub fn print_requested(&self) -> bool {
        self.print_requested
    }

    /// Service a pending print request as `screenNNN.tga`. The request is
    /// consumed even when writing fails.
    pub fn write_print(&mut self, screen: &Surface, format: &PixelFormat) -> Option<PathBuf> {
        if !self.print_requested {
            return None;
        }
        self.print_requested = false;

        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            log_warn!("Cannot create capture directory {}: {}", self.output_dir.display(), e);
        }
        let path = self.output_dir.join(format!("screen{:03}.tga", self.print_index));
        self.print_index += 1;

        match write_tga_file(&path, screen.width() as u16, screen.height() as u16, screen.pixels(), format) {
            Ok(()) => {
                log_info!("Saved screenshot {}", path.display());
                Some(path)
            }
            Err(e) => {
                log_warn!("Failed to write screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn write_tga_file(path: &Path, width: u16, height: u16, pixels: &[u16], format: &PixelFormat) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_tga(&mut out, width, height, pixels, format)
}

/// Save a quarter-size RGB preview of `screen` as PNG.
pub fn write_thumbnail(screen: &Surface, format: &PixelFormat, path: &Path) -> VideoResult<()> {
    let full = RgbImage::from_fn(screen.width(), screen.height(), |x, y| {
        let (r, g, b) = format.unpack_rgb(screen.pixel(x, y).unwrap_or(0));
        Rgb([r, g, b])
    });
    let thumb = imageops::resize(
        &full,
        (screen.width() / 4).max(1),
        (screen.height() / 4).max(1),
        FilterType::Triangle,
    );
    thumb.save(path)?;
    Ok(())
}
