//! Camera panning by shifting already composited pixels.
//!
//! Instead of re-rendering the whole viewport, the visible content is moved by
//! the scroll delta and only the exposed L-shaped border is repainted. The
//! border is cut into at most two strips: one full-height column strip for
//! the horizontal component and one row strip covering the remaining width
//! for the vertical component.

use serde::{Deserialize, Serialize};

use crate::hooks::{VideoOverlays, WorldRenderer};
use crate::rect::Rect;
use crate::surface::{Surface, ZBuffer};

/// Direction the camera moves. Content on screen moves the opposite way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollDirection {
    Left,
    Right,
    Up,
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl ScrollDirection {
    pub const ALL: [ScrollDirection; 8] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::UpLeft,
        Self::UpRight,
        Self::DownLeft,
        Self::DownRight,
    ];

    /// -1 for left, 1 for right, 0 for none.
    pub fn horizontal(self) -> i32 {
        match self {
            Self::Left | Self::UpLeft | Self::DownLeft => -1,
            Self::Right | Self::UpRight | Self::DownRight => 1,
            Self::Up | Self::Down => 0,
        }
    }

    /// -1 for up, 1 for down, 0 for none.
    pub fn vertical(self) -> i32 {
        match self {
            Self::Up | Self::UpLeft | Self::UpRight => -1,
            Self::Down | Self::DownLeft | Self::DownRight => 1,
            Self::Left | Self::Right => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub direction: ScrollDirection,
    pub shift_x: u32,
    pub shift_y: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollPlan {
    /// Content that survives the pan; `None` when the shift covers the
    /// whole viewport.
    pub source: Option<Rect>,
    pub dest_x: u32,
    pub dest_y: u32,
    /// How far on-screen content moves.
    pub delta: (i32, i32),
    strips: Vec<Rect>,
}

impl ScrollPlan {
    /// Non-empty exposed strips, horizontal component first.
    pub fn strips(&self) -> &[Rect] {
        &self.strips
    }

    pub fn destination(&self) -> Option<Rect> {
        let src = self.source?;
        Rect::from_size(self.dest_x, self.dest_y, src.width(), src.height())
    }
}

pub fn plan_scroll(viewport: Rect, request: &ScrollRequest) -> ScrollPlan {
    let (w, h) = (viewport.width(), viewport.height());
    let hx = request.direction.horizontal();
    let vy = request.direction.vertical();
    let dx = if hx != 0 { request.shift_x.min(w) } else { 0 };
    let dy = if vy != 0 { request.shift_y.min(h) } else { 0 };

    let (src_x, dest_x) = match hx {
        -1 => (viewport.left, viewport.left + dx),
        1 => (viewport.left + dx, viewport.left),
        _ => (viewport.left, viewport.left),
    };
    let (src_y, dest_y) = match vy {
        -1 => (viewport.top, viewport.top + dy),
        1 => (viewport.top + dy, viewport.top),
        _ => (viewport.top, viewport.top),
    };
    let source = Rect::from_size(src_x, src_y, w - dx, h - dy);

    let column = match hx {
        -1 => Rect::new(viewport.left, viewport.top, viewport.left + dx, viewport.bottom),
        1 => Rect::new(viewport.right - dx, viewport.top, viewport.right, viewport.bottom),
        _ => None,
    };
    let (row_left, row_right) = match hx {
        -1 => (viewport.left + dx, viewport.right),
        1 => (viewport.left, viewport.right - dx),
        _ => (viewport.left, viewport.right),
    };
    let row = match vy {
        -1 => Rect::new(row_left, viewport.top, row_right, viewport.top + dy),
        1 => Rect::new(row_left, viewport.bottom - dy, row_right, viewport.bottom),
        _ => None,
    };

    ScrollPlan {
        source,
        dest_x,
        dest_y,
        delta: (-hx * dx as i32, -vy * dy as i32),
        strips: column.into_iter().chain(row).collect(),
    }
}

pub struct ScrollCompositor;

impl ScrollCompositor {
    /// Pan the screen per `plan` and return every rectangle that now needs
    /// presenting.
    pub fn apply(
        plan: &ScrollPlan,
        render_strips: bool,
        frame: &mut Surface,
        screen: &mut Surface,
        zbuffer: &mut ZBuffer,
        renderer: &mut dyn WorldRenderer,
        overlays: &mut dyn VideoOverlays,
    ) -> Vec<Rect> {
        let mut touched = Vec::with_capacity(4);

        if let Some(source) = plan.source {
            if let Some(dest) = screen.copy_within(source, plan.dest_x, plan.dest_y) {
                touched.push(dest);
            }
        }

        // Stale depth in the exposed area would occlude freshly drawn tiles.
        for strip in plan.strips() {
            zbuffer.clear_rect(*strip);
        }
        touched.extend_from_slice(plan.strips());

        if render_strips {
            for strip in plan.strips() {
                renderer.render_static_rect(frame, zbuffer, *strip);
                screen.blit_rect_from(frame, *strip);
            }

            let (dx, dy) = plan.delta;
            overlays.restore_shifted(screen, dx, dy);
            overlays.save_area(screen);
            touched.extend(overlays.draw(screen));
        }

        touched
    }
}
