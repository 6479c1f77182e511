use crate::error::{VideoError, VideoResult};

pub const RGB555_MASKS: (u32, u32, u32) = (0x7C00, 0x03E0, 0x001F);
pub const RGB565_MASKS: (u32, u32, u32) = (0xF800, 0x07E0, 0x001F);

const TRANSLUCENT_MASK_555: u16 = 0x3DEF;
const TRANSLUCENT_MASK_565: u16 = 0x7BEF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb555,
    Rgb565,
}

impl PixelLayout {
    pub fn masks(self) -> (u32, u32, u32) {
        match self {
            Self::Rgb555 => RGB555_MASKS,
            Self::Rgb565 => RGB565_MASKS,
        }
    }
}

/// Channel masks and shifts of the visible surface. A shift aligns the
/// channel's top bit with bit 7, so `(pixel & mask) >> shift` (negative shifts
/// go left) yields an 8-bit intensity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    pub layout: PixelLayout,
    pub red_mask: u16,
    pub green_mask: u16,
    pub blue_mask: u16,
    pub red_shift: i8,
    pub green_shift: i8,
    pub blue_shift: i8,
    /// Clears the low bit of every channel so two pixels can be averaged with
    /// `((a & m) >> 1) + ((b & m) >> 1)`.
    pub translucent_mask: u16,
}

impl PixelFormat {
    pub fn from_masks(red: u32, green: u32, blue: u32) -> VideoResult<Self> {
        match (red, green, blue) {
            m if m == RGB555_MASKS => Ok(Self::from_layout(PixelLayout::Rgb555)),
            m if m == RGB565_MASKS => Ok(Self::from_layout(PixelLayout::Rgb565)),
            _ => Err(VideoError::UnsupportedPixelFormat { red, green, blue }),
        }
    }

    pub fn from_layout(layout: PixelLayout) -> Self {
        let (red, green, blue) = layout.masks();
        let translucent_mask = match layout {
            PixelLayout::Rgb555 => TRANSLUCENT_MASK_555,
            PixelLayout::Rgb565 => TRANSLUCENT_MASK_565,
        };

        Self {
            layout,
            red_mask: red as u16,
            green_mask: green as u16,
            blue_mask: blue as u16,
            red_shift: channel_shift(red as u16),
            green_shift: channel_shift(green as u16),
            blue_shift: channel_shift(blue as u16),
            translucent_mask,
        }
    }

    pub fn masks(&self) -> (u32, u32, u32) {
        (self.red_mask as u32, self.green_mask as u32, self.blue_mask as u32)
    }

    pub fn is_565(&self) -> bool {
        self.layout == PixelLayout::Rgb565
    }

    pub fn pack_rgb(&self, r: u8, g: u8, b: u8) -> u16 {
        pack_channel(r, self.red_mask, self.red_shift)
            | pack_channel(g, self.green_mask, self.green_shift)
            | pack_channel(b, self.blue_mask, self.blue_shift)
    }

    pub fn unpack_rgb(&self, pixel: u16) -> (u8, u8, u8) {
        (
            unpack_channel(pixel, self.red_mask, self.red_shift),
            unpack_channel(pixel, self.green_mask, self.green_shift),
            unpack_channel(pixel, self.blue_mask, self.blue_shift),
        )
    }

    /// Average two pixels channel-wise.
    pub fn blend_half(&self, a: u16, b: u16) -> u16 {
        ((a >> 1) & self.translucent_mask) + ((b >> 1) & self.translucent_mask)
    }
}

/// Index of the highest set bit scanning down from bit 15, minus 7.
fn channel_shift(mask: u16) -> i8 {
    let mut bit = 0x8000u16;
    let mut shift = 8i8;
    while mask & bit == 0 && bit != 0 {
        bit >>= 1;
        shift -= 1;
    }
    shift
}

fn pack_channel(value: u8, mask: u16, shift: i8) -> u16 {
    let wide = value as u32;
    let placed = if shift >= 0 {
        wide << shift
    } else {
        wide >> (-shift)
    };
    placed as u16 & mask
}

fn unpack_channel(pixel: u16, mask: u16, shift: i8) -> u8 {
    let bits = (pixel & mask) as u32;
    let value = if shift >= 0 {
        bits >> shift
    } else {
        bits << (-shift)
    };
    value as u8
}

/// Drop the low green bit: 5-6-5 -> 5-5-5.
#[inline]
pub fn rgb565_to_555(pixel: u16) -> u16 {
    ((pixel & 0xFFC0) >> 1) | (pixel & 0x001F)
}

pub fn convert_565_to_555(pixels: &mut [u16]) {
    for px in pixels {
        *px = rgb565_to_555(*px);
    }
}
