//! 16-bit software surfaces and the per-pixel depth buffer the world renderer
//! occludes against.

use crate::rect::Rect;

/// A packed 16-bit truecolor pixel surface (pitch == width).
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
    /// Source pixels equal to the key are skipped by `blit_from`.
    color_key: Option<u16>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            color_key: None,
        }
    }

    pub fn with_color_key(mut self, key: u16) -> Self {
        self.color_key = Some(key);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            left: 0,
            top: 0,
            right: self.width,
            bottom: self.height,
        }
    }

    pub fn color_key(&self) -> Option<u16> {
        self.color_key
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u16] {
        &mut self.pixels
    }

    pub fn row(&self, y: u32) -> &[u16] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: u16) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = value;
        }
    }

    pub fn fill(&mut self, value: u16) {
        self.pixels.fill(value);
    }

    pub fn fill_rect(&mut self, rect: Rect, value: u16) {
        let Some(rect) = rect.intersect(&self.bounds()) else {
            return;
        };
        for y in rect.top..rect.bottom {
            let start = self.index(rect.left, y);
            self.pixels[start..start + rect.width() as usize].fill(value);
        }
    }

    /// Copy `src_rect` of `src` to `(dst_x, dst_y)`, clipped against both surfaces.
    /// Returns the destination rectangle actually written.
    pub fn blit_from(&mut self, src: &Surface, src_rect: Rect, dst_x: u32, dst_y: u32) -> Option<Rect> {
        let src_rect = src_rect.intersect(&src.bounds())?;
        let dst = Rect::from_size(dst_x, dst_y, src_rect.width(), src_rect.height())?
            .intersect(&self.bounds())?;
        let (w, h) = (dst.width() as usize, dst.height());

        for row in 0..h {
            let s = src.index(src_rect.left, src_rect.top + row);
            let d = self.index(dst.left, dst.top + row);
            let src_row = &src.pixels[s..s + w];
            let dst_row = &mut self.pixels[d..d + w];
            match src.color_key {
                None => dst_row.copy_from_slice(src_row),
                Some(key) => {
                    for (out, &px) in dst_row.iter_mut().zip(src_row) {
                        if px != key {
                            *out = px;
                        }
                    }
                }
            }
        }
        Some(dst)
    }

    /// Same-position copy, the common frame buffer -> screen case.
    pub fn blit_rect_from(&mut self, src: &Surface, rect: Rect) -> Option<Rect> {
        self.blit_from(src, rect, rect.left, rect.top)
    }

    /// Move `src_rect` to `(dst_x, dst_y)` inside this surface. Overlapping
    /// source and destination are handled by picking the row order.
    pub fn copy_within(&mut self, src_rect: Rect, dst_x: u32, dst_y: u32) -> Option<Rect> {
        let src_rect = src_rect.intersect(&self.bounds())?;
        let dst = Rect::from_size(dst_x, dst_y, src_rect.width(), src_rect.height())?
            .intersect(&self.bounds())?;
        let (w, h) = (dst.width() as usize, dst.height());

        let mut copy_row = |row: u32| {
            let s = self.index(src_rect.left, src_rect.top + row);
            let d = self.index(dst.left, dst.top + row);
            self.pixels.copy_within(s..s + w, d);
        };
        if dst.top > src_rect.top {
            (0..h).rev().for_each(&mut copy_row);
        } else {
            (0..h).for_each(&mut copy_row);
        }
        Some(dst)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Per-pixel depth values written by the world renderer. Zero never occludes.
#[derive(Clone, Debug)]
pub struct ZBuffer {
    width: u32,
    height: u32,
    depth: Vec<u16>,
}

impl ZBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[y as usize * self.width as usize + x as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, z: u16) {
        if x < self.width && y < self.height {
            self.depth[y as usize * self.width as usize + x as usize] = z;
        }
    }

    pub fn clear_rect(&mut self, rect: Rect) {
        let bounds = Rect {
            left: 0,
            top: 0,
            right: self.width,
            bottom: self.height,
        };
        let Some(rect) = rect.intersect(&bounds) else {
            return;
        };
        for y in rect.top..rect.bottom {
            let start = y as usize * self.width as usize + rect.left as usize;
            self.depth[start..start + rect.width() as usize].fill(0);
        }
    }
}
