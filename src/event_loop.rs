//! Cooperative main loop: one queued event per step, otherwise one game tick
//! plus one refresh while in the foreground, otherwise block for input.

use crossbeam_channel::{Receiver, TryRecvError};
use std::time::Duration;

use crate::compositor::RefreshStats;
use crate::scroll::ScrollRequest;
use crate::shared::SharedVideo;
use crate::video::VideoContext;
use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub enum VideoEvent {
    PointerMoved { x: i32, y: i32 },
    /// `true` when the application regains the foreground.
    FocusChanged(bool),
    PrintScreen,
    ToggleCapture,
    Scroll(ScrollRequest),
    Quit,
}

/// Game logic run once per foreground tick, before the refresh.
pub trait GameTick: Send {
    fn tick(&mut self, video: &mut VideoContext);
}

impl<F> GameTick for F
where
    F: FnMut(&mut VideoContext) + Send,
{
    fn tick(&mut self, video: &mut VideoContext) {
        self(video)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Handled,
    Ticked(RefreshStats),
    Quit,
}

pub struct EventLoop<G: GameTick> {
    video: SharedVideo,
    events: Receiver<VideoEvent>,
    game: G,
    active: bool,
    quit: bool,
    yield_for: Duration,
}

impl<G: GameTick> EventLoop<G> {
    pub fn new(video: SharedVideo, events: Receiver<VideoEvent>, game: G) -> Self {
        Self {
            video,
            events,
            game,
            active: true,
            quit: false,
            yield_for: Duration::from_millis(1),
        }
    }

    /// Pause after each foreground tick.
    pub fn with_yield(mut self, yield_for: Duration) -> Self {
        self.yield_for = yield_for;
        self
    }

    pub fn video(&self) -> &SharedVideo {
        &self.video
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn step(&mut self) -> StepOutcome {
        if self.quit {
            return StepOutcome::Quit;
        }

        match self.events.try_recv() {
            Ok(event) => return self.handle(event),
            Err(TryRecvError::Disconnected) => return self.stop("event source closed"),
            Err(TryRecvError::Empty) => {}
        }

        if self.active {
            let game = &mut self.game;
            let stats = self.video.with(|ctx| {
                game.tick(ctx);
                ctx.refresh_screen()
            });
            if !self.yield_for.is_zero() {
                spin_sleep::sleep(self.yield_for);
            }
            return StepOutcome::Ticked(stats);
        }

        match self.events.recv() {
            Ok(event) => self.handle(event),
            Err(_) => self.stop("event source closed"),
        }
    }

    /// Step until quit, then shut the video manager down.
    pub fn run(&mut self) -> u64 {
        log_info!("Entering main loop");
        let mut ticks = 0;
        loop {
            match self.step() {
                StepOutcome::Quit => break,
                StepOutcome::Ticked(_) => ticks += 1,
                StepOutcome::Handled => {}
            }
        }
        self.video.shutdown();
        log_info!("Main loop finished after {} ticks", ticks);
        ticks
    }

    fn handle(&mut self, event: VideoEvent) -> StepOutcome {
        match event {
            VideoEvent::PointerMoved { x, y } => {
                self.video.with(|ctx| ctx.set_pointer_position(x, y));
            }
            VideoEvent::FocusChanged(true) => {
                if !self.active {
                    self.active = true;
                    if let Err(e) = self.video.with(|ctx| ctx.restore()) {
                        log_warn!("Could not restore video on focus gain: {}", e);
                    }
                }
            }
            VideoEvent::FocusChanged(false) => {
                if self.active {
                    self.active = false;
                    if let Err(e) = self.video.with(|ctx| ctx.suspend()) {
                        log_warn!("Could not suspend video on focus loss: {}", e);
                    }
                }
            }
            VideoEvent::PrintScreen => {
                self.video.with(|ctx| ctx.print_screen());
            }
            VideoEvent::ToggleCapture => match self.video.with(|ctx| ctx.toggle_video_capture()) {
                Ok(true) => log_info!("Continuous capture on"),
                Ok(false) => log_info!("Continuous capture off"),
                Err(e) => log_warn!("Cannot toggle capture: {}", e),
            },
            VideoEvent::Scroll(request) => {
                self.video.with(|ctx| ctx.request_scroll(request));
            }
            VideoEvent::Quit => return self.stop("quit requested"),
        }
        StepOutcome::Handled
    }

    fn stop(&mut self, reason: &str) -> StepOutcome {
        if !self.quit {
            log_info!("Leaving main loop: {}", reason);
        }
        self.quit = true;
        StepOutcome::Quit
    }
}
