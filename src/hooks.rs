//! Collaborators the video core calls back into. Game code supplies these;
//! the no-op implementations keep the compositor usable on its own.

use crate::rect::Rect;
use crate::surface::{Surface, ZBuffer};

/// Paints world content. Outside of scrolling the renderer draws on its own
/// schedule and invalidates what it touched.
pub trait WorldRenderer: Send {
    /// Repaint `rect` of the static world into the frame buffer.
    fn render_static_rect(&mut self, frame: &mut Surface, zbuffer: &mut ZBuffer, rect: Rect);
}

/// A fade transition that takes over the frame buffer -> screen step while
/// it runs.
pub trait FadeTransition: Send {
    fn is_active(&self) -> bool;
    fn run(&mut self, frame: &Surface, screen: &mut Surface);
}

/// Decals and other overlay content drawn on top of the world, kept in sync
/// with the camera when the screen is scrolled.
pub trait VideoOverlays: Send {
    /// Put back the saved backgrounds, shifted by the scroll delta.
    fn restore_shifted(&mut self, screen: &mut Surface, dx: i32, dy: i32);
    /// Save whatever lies under each overlay at its current position.
    fn save_area(&mut self, screen: &Surface);
    /// Draw every overlay; returns the rectangles touched.
    fn draw(&mut self, screen: &mut Surface) -> Vec<Rect>;
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl WorldRenderer for NullRenderer {
    fn render_static_rect(&mut self, _frame: &mut Surface, _zbuffer: &mut ZBuffer, _rect: Rect) {}
}

#[derive(Debug, Default)]
pub struct NoFade;

impl FadeTransition for NoFade {
    fn is_active(&self) -> bool {
        false
    }

    fn run(&mut self, _frame: &Surface, _screen: &mut Surface) {}
}

#[derive(Debug, Default)]
pub struct NoOverlays;

impl VideoOverlays for NoOverlays {
    fn restore_shifted(&mut self, _screen: &mut Surface, _dx: i32, _dy: i32) {}

    fn save_area(&mut self, _screen: &Surface) {}

    fn draw(&mut self, _screen: &mut Surface) -> Vec<Rect> {
        Vec::new()
    }
}
