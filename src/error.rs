use crate::format::FormatSpec;
use std::io;
use std::path::PathBuf;

//===========================================================================//

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, IconError>;

/// Everything that can abort a conversion.  There are no retries: the first
/// error encountered ends the whole conversion.
#[derive(thiserror::Error, Debug)]
pub enum IconError {
    /// A format token didn't match `WIDTH[xHEIGHT] [BPPbpp] [BMP|PNG]`.
    #[error("unknown format {token:?}")]
    MalformedFormatSpec {
        /// The token as given.
        token: String,
    },

    /// A format token asked for a non-square icon.
    #[error("format {token:?} is not square")]
    NonSquareFormat {
        /// The token as given.
        token: String,
    },

    /// A format token asked for a dimension outside the allow-list.
    #[error("format {token:?} has unsupported dimension {dimension}")]
    UnsupportedDimension {
        /// The token as given.
        token: String,
        /// The requested width/height.
        dimension: u32,
    },

    /// A format token asked for a bit depth outside the allow-list.
    #[error("format {token:?} has unsupported bit depth {bits_per_pixel}")]
    UnsupportedBitDepth {
        /// The token as given.
        token: String,
        /// The requested bits-per-pixel.
        bits_per_pixel: u32,
    },

    /// The source image path doesn't exist.
    #[error("source image {0:?} not found")]
    SourceNotFound(PathBuf),

    /// The output path conflicts with the caller's overwrite intent.
    #[error("cannot write {path:?}: {reason}")]
    InvalidTargetState {
        /// The output path.
        path: PathBuf,
        /// Why the path can't be written.
        reason: String,
    },

    /// Neither a PNG nor a BMP encoding was produced for a format.
    #[error("no encoding was produced for format {0}")]
    InternalInvariantViolation(FormatSpec),

    /// Failure while decoding or resampling the source image.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Failure inside the PNG encoder.
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    /// Failure while reading or writing bytes.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IconError {
    pub(crate) fn target(
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> IconError {
        IconError::InvalidTargetState {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

//===========================================================================//


//===========================================================================//
