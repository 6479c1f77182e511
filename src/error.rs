use thiserror::Error;

use crate::video::VideoManagerState;

#[derive(Debug, Error)]
pub enum VideoError {
    /// The display refused to create a visible surface with this geometry.
    #[error("failed to set video mode {width}x{height}x{bit_depth}: {reason}")]
    ModeSet {
        width: u32,
        height: u32,
        bit_depth: u8,
        reason: String,
    },

    #[error("unsupported bit depth {0} (only 16-bit truecolor is supported)")]
    UnsupportedBitDepth(u8),

    #[error("unsupported pixel format: red={red:#06x} green={green:#06x} blue={blue:#06x}")]
    UnsupportedPixelFormat { red: u32, green: u32, blue: u32 },

    #[error("cannot {operation} while video manager is {from:?}")]
    InvalidTransition {
        from: VideoManagerState,
        operation: &'static str,
    },

    #[error("video manager is not initialized")]
    NotInitialized,

    #[error("invalid video configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl VideoError {
    /// Errors that can only surface once, while bringing the subsystem up.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBitDepth(_) | Self::UnsupportedPixelFormat { .. } | Self::InvalidConfig(_)
        )
    }
}

pub type VideoResult<T> = Result<T, VideoError>;
