//! Uncompressed 16-bit Targa (type 2) files: 18-byte header followed by
//! bottom-to-top rows of little-endian 5-5-5 pixels.

use std::io::{self, Read, Write};

use crate::pixel_format::{rgb565_to_555, PixelFormat};

pub const TGA_HEADER_LEN: usize = 18;
const TGA_TRUECOLOR_UNCOMPRESSED: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TgaHeader {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
}

impl TgaHeader {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            bits_per_pixel: 16,
        }
    }

    pub fn encode(&self) -> [u8; TGA_HEADER_LEN] {
        let mut bytes = [0u8; TGA_HEADER_LEN];
        bytes[2] = TGA_TRUECOLOR_UNCOMPRESSED;
        bytes[12..14].copy_from_slice(&self.width.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.height.to_le_bytes());
        bytes[16] = self.bits_per_pixel;
        bytes
    }

    pub fn parse(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < TGA_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("TGA header needs {} bytes, got {}", TGA_HEADER_LEN, bytes.len()),
            ));
        }
        if bytes[2] != TGA_TRUECOLOR_UNCOMPRESSED {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported TGA image type {}", bytes[2]),
            ));
        }
        Ok(Self {
            width: u16::from_le_bytes([bytes[12], bytes[13]]),
            height: u16::from_le_bytes([bytes[14], bytes[15]]),
            bits_per_pixel: bytes[16],
        })
    }
}

/// Write a full image. `pixels` is top-to-bottom with pitch == `width`;
/// 5-6-5 sources are narrowed to 5-5-5.
pub fn write_tga<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    pixels: &[u16],
    format: &PixelFormat,
) -> io::Result<()> {
    let pitch = width as usize;
    if pixels.len() < pitch * height as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} pixels cannot fill a {}x{} image", pixels.len(), width, height),
        ));
    }

    out.write_all(&TgaHeader::new(width, height).encode())?;

    let narrow = format.is_565();
    let mut row_bytes = Vec::with_capacity(pitch * 2);
    for y in (0..height as usize).rev() {
        row_bytes.clear();
        for &px in &pixels[y * pitch..(y + 1) * pitch] {
            let px = if narrow { rgb565_to_555(px) } else { px };
            row_bytes.extend_from_slice(&px.to_le_bytes());
        }
        out.write_all(&row_bytes)?;
    }
    out.flush()
}

/// Read an image written by `write_tga`, rows returned top-to-bottom.
pub fn read_tga<R: Read>(input: &mut R) -> io::Result<(TgaHeader, Vec<u16>)> {
    let mut header_bytes = [0u8; TGA_HEADER_LEN];
    input.read_exact(&mut header_bytes)?;
    let header = TgaHeader::parse(&header_bytes)?;
    if header.bits_per_pixel != 16 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected 16 bpp, got {}", header.bits_per_pixel),
        ));
    }

    let pitch = header.width as usize;
    let mut raw = vec![0u8; pitch * header.height as usize * 2];
    input.read_exact(&mut raw)?;

    let mut pixels = vec![0u16; pitch * header.height as usize];
    for (file_row, chunk) in raw.chunks_exact(pitch * 2).enumerate() {
        let y = header.height as usize - 1 - file_row;
        for (x, px) in chunk.chunks_exact(2).enumerate() {
            pixels[y * pitch + x] = u16::from_le_bytes([px[0], px[1]]);
        }
    }
    Ok((header, pixels))
}
