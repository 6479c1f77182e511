use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tilescreen::{
    log_info, log_warn, EventLoop, HeadlessDisplay, Rect, ScrollDirection, ScrollRequest, SharedVideo, Surface,
    VideoConfig, VideoContext, VideoEvent, WorldRenderer, ZBuffer,
};

const TILE: u32 = 32;

/// Checkerboard world so scrolled strips are visibly repainted.
struct CheckerRenderer;

impl WorldRenderer for CheckerRenderer {
    fn render_static_rect(&mut self, frame: &mut Surface, zbuffer: &mut ZBuffer, rect: Rect) {
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                let color = if (x / TILE + y / TILE) % 2 == 0 { 0x2945 } else { 0x4A69 };
                frame.set_pixel(x, y, color);
                zbuffer.set(x, y, 1);
            }
        }
    }
}

fn parse_args() -> (bool, PathBuf, u32) {
    let args: Vec<String> = std::env::args().collect();
    let stream_logs = args.contains(&"--stream-logs".to_string());
    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let config_path = value_of("--config").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("tilescreen.json"));
    let ticks = value_of("--ticks").and_then(|v| v.parse().ok()).unwrap_or(120);
    (stream_logs, config_path, ticks)
}

fn main() -> Result<()> {
    let result = run_app();
    let _ = tilescreen::logger::finalize_logs();
    result
}

fn run_app() -> Result<()> {
    let (stream_logs, config_path, ticks) = parse_args();

    let mut config = VideoConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    config.logging.stream_to_stdout |= stream_logs;

    tilescreen::logger::init_logger(
        config.logging.directory.clone(),
        "tilescreen",
        config.logging.retention_count,
        config.logging.stream_to_stdout,
        config.logging.level,
    )?;
    log_info!("tilescreen demo started");
    if let Some(log_path) = tilescreen::logger::get_log_path() {
        log_info!("Log file: {}", log_path.display());
    }

    let viewport = config
        .viewport
        .rect()
        .context("Viewport is empty")?;

    let context = VideoContext::new(config, Box::new(HeadlessDisplay::default())).with_renderer(CheckerRenderer);
    let video = SharedVideo::new(context);
    video
        .with(|ctx| ctx.initialize())
        .context("Failed to initialize video")?;

    video.with(|ctx| -> Result<()> {
        let (frame, zbuffer) = ctx.render_targets_mut()?;
        let bounds = frame.bounds();
        CheckerRenderer.render_static_rect(frame, zbuffer, bounds);

        ctx.set_cursor_properties(0, 0, 12, 12);
        ctx.cursor_buffer_mut()?.fill_rect(Rect::new(0, 0, 12, 12).context("cursor rect")?, 0xFFFF);
        ctx.mark_mouse_dirty();
        ctx.invalidate_screen();
        Ok(())
    })?;

    let (event_tx, event_rx) = bounded(64);
    let feeder = thread::spawn(move || {
        for i in 0..ticks as i32 {
            let event = match i {
                i if i % 40 == 0 => VideoEvent::Scroll(ScrollRequest {
                    direction: ScrollDirection::DownRight,
                    shift_x: 8,
                    shift_y: 4,
                }),
                20 => VideoEvent::PrintScreen,
                _ => VideoEvent::PointerMoved {
                    x: (i * 5) % 640,
                    y: (i * 3) % 480,
                },
            };
            if event_tx.send(event).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let _ = event_tx.send(VideoEvent::Quit);
    });

    let mut pulse = 0u32;
    let game_tick = move |ctx: &mut VideoContext| {
        pulse = pulse.wrapping_add(1);
        let Some(marker) = Rect::from_size(viewport.left + 4, viewport.top + 4, 16, 16) else {
            return;
        };
        if let Ok(frame) = ctx.frame_buffer_mut() {
            frame.fill_rect(marker, if pulse % 30 < 15 { 0xF800 } else { 0x07E0 });
        }
        ctx.invalidate_rect(marker);
    };

    let mut event_loop = EventLoop::new(video.clone(), event_rx, game_tick);
    let frames = event_loop.run();

    if feeder.join().is_err() {
        log_warn!("Event feeder thread panicked");
    }
    log_info!("Demo finished after {} ticks", frames);
    Ok(())
}
