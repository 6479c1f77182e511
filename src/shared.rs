use parking_lot::Mutex;
use std::sync::Arc;

use crate::compositor::RefreshStats;
use crate::video::{VideoContext, VideoManagerState};

/// A `VideoContext` that several threads may touch. One lock covers the
/// whole refresh, so invalidation from another thread always lands either
/// before or after a tick, never inside one.
#[derive(Clone)]
pub struct SharedVideo {
    inner: Arc<Mutex<VideoContext>>,
}

impl SharedVideo {
    pub fn new(context: VideoContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut VideoContext) -> R,
    {
        f(&mut self.inner.lock())
    }

    pub fn refresh_screen(&self) -> RefreshStats {
        self.inner.lock().refresh_screen()
    }

    pub fn state(&self) -> VideoManagerState {
        self.inner.lock().state()
    }

    pub fn shutdown(&self) {
        self.inner.lock().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoConfig;
    use crate::display::{HeadlessDisplay, PresentEvent};
    use std::thread;

    #[test]
    fn invalidations_from_other_threads_reach_the_next_refresh() {
        let display = HeadlessDisplay::default();
        let recorder = display.recorder();
        let video = SharedVideo::new(VideoContext::new(VideoConfig::default(), Box::new(display)));
        video.with(|ctx| ctx.initialize()).unwrap();
        video.refresh_screen();
        recorder.clear();

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let video = video.clone();
                thread::spawn(move || {
                    video.with(|ctx| ctx.invalidate_region(i * 10, 0, i * 10 + 5, 5));
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stats = video.refresh_screen();
        assert_eq!(stats.rects_blitted, 4);
        match recorder.take().as_slice() {
            [PresentEvent::Rects(rects)] => assert_eq!(rects.len(), 4),
            other => panic!("unexpected presents {other:?}"),
        }

        video.shutdown();
        assert_eq!(video.state(), VideoManagerState::Off);
    }
}
