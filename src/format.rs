use crate::raster::BmpDepth;
use crate::error::{IconError, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//===========================================================================//

/// The widths/heights an icon entry may have.
pub const SUPPORTED_DIMENSIONS: &[u32] = &[16, 32, 48, 64, 128, 256];

const DEFAULT_BITS_PER_PIXEL: u32 = 32;

//===========================================================================//

/// The color depth of a single icon entry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum BitDepth {
    /// 16-color palette
    Four,
    /// 256-color palette
    Eight,
    /// 5 bits per RGB channel, no alpha
    Sixteen,
    /// 8 bits per RGB channel, no alpha
    TwentyFour,
    /// 8 bits per RGBA channel
    ThirtyTwo,
}

impl BitDepth {
    /// Returns the depth with the given bits-per-pixel, if it is one that
    /// icon entries may use.
    pub fn from_bits_per_pixel(bits_per_pixel: u32) -> Option<BitDepth> {
        match bits_per_pixel {
            4 => Some(BitDepth::Four),
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            24 => Some(BitDepth::TwentyFour),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None,
        }
    }

    /// Returns the number of bits used for each pixel.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bmp_depth().bits_per_pixel()
    }

    pub(crate) fn bmp_depth(&self) -> BmpDepth {
        match *self {
            BitDepth::Four => BmpDepth::Four,
            BitDepth::Eight => BmpDepth::Eight,
            BitDepth::Sixteen => BmpDepth::Sixteen,
            BitDepth::TwentyFour => BmpDepth::TwentyFour,
            BitDepth::ThirtyTwo => BmpDepth::ThirtyTwo,
        }
    }
}

//===========================================================================//

/// Which encodings may be embedded for an icon entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Container {
    /// Try both encodings and keep whichever is smaller.
    Any,
    /// Embed a BMP (color data followed by an AND mask).
    Bmp,
    /// Embed a PNG stream.
    Png,
}

impl Container {
    /// True if a BMP encoding should be attempted.
    pub fn allows_bmp(&self) -> bool {
        *self != Container::Png
    }

    /// True if a PNG encoding should be attempted.
    pub fn allows_png(&self) -> bool {
        *self != Container::Bmp
    }
}

//===========================================================================//

/// One requested icon entry: a square size, a color depth, and the allowed
/// encodings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedFormatSpec"))]
pub struct FormatSpec {
    dimension: u32,
    bit_depth: BitDepth,
    container: Container,
}

impl FormatSpec {
    /// Creates a format, checking `dimension` against the allow-list.
    pub fn new(
        dimension: u32,
        bit_depth: BitDepth,
        container: Container,
    ) -> Option<FormatSpec> {
        if SUPPORTED_DIMENSIONS.contains(&dimension) {
            Some(FormatSpec { dimension, bit_depth, container })
        } else {
            None
        }
    }

    /// Returns the width (and height) of the entry, in pixels.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Returns the requested color depth.
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Returns which encodings may be used.
    pub fn container(&self) -> Container {
        self.container
    }

    /// Parses a single format token such as `"64 24bpp BMP"`, `"32x32"`, or
    /// `"16"`.
    pub fn parse(token: &str) -> Result<FormatSpec> {
        let raw = match RawFormat::scan(token.trim()) {
            Some(raw) => raw,
            None => {
                return Err(IconError::MalformedFormatSpec {
                    token: token.to_string(),
                })
            }
        };
        if raw.width != raw.height {
            return Err(IconError::NonSquareFormat { token: token.to_string() });
        }
        if !SUPPORTED_DIMENSIONS.contains(&raw.width) {
            return Err(IconError::UnsupportedDimension {
                token: token.to_string(),
                dimension: raw.width,
            });
        }
        let bit_depth = match BitDepth::from_bits_per_pixel(raw.bits_per_pixel)
        {
            Some(bit_depth) => bit_depth,
            None => {
                return Err(IconError::UnsupportedBitDepth {
                    token: token.to_string(),
                    bits_per_pixel: raw.bits_per_pixel,
                })
            }
        };
        Ok(FormatSpec {
            dimension: raw.width,
            bit_depth,
            container: raw.container,
        })
    }
}

/// The fields of a `FormatSpec` as they arrive from a deserializer, before
/// the dimension has been checked.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct UncheckedFormatSpec {
    dimension: u32,
    bit_depth: BitDepth,
    container: Container,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedFormatSpec> for FormatSpec {
    type Error = IconError;

    fn try_from(raw: UncheckedFormatSpec) -> Result<FormatSpec> {
        FormatSpec::new(raw.dimension, raw.bit_depth, raw.container)
            .ok_or_else(|| IconError::UnsupportedDimension {
                token: raw.dimension.to_string(),
                dimension: raw.dimension,
            })
    }
}

impl FromStr for FormatSpec {
    type Err = IconError;

    fn from_str(token: &str) -> Result<FormatSpec> {
        FormatSpec::parse(token)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}bpp", self.dimension, self.bit_depth.bits_per_pixel())?;
        match self.container {
            Container::Any => Ok(()),
            Container::Bmp => f.write_str(" BMP"),
            Container::Png => f.write_str(" PNG"),
        }
    }
}

/// Parses a list of format tokens, preserving their order.
pub fn parse_formats<'a, I>(tokens: I) -> Result<Vec<FormatSpec>>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens.into_iter().map(FormatSpec::parse).collect()
}

/// Parses a comma-separated list such as `"16x16 PNG, 32x32"`.
pub fn parse_format_list(list: &str) -> Result<Vec<FormatSpec>> {
    parse_formats(list.split(','))
}

//===========================================================================//

/// A token that matched the grammar but hasn't been validated yet.
struct RawFormat {
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    container: Container,
}

impl RawFormat {
    fn scan(token: &str) -> Option<RawFormat> {
        let mut words = token.split_whitespace().peekable();
        let size = words.next()?;
        let (width, height) = match size.split_once('x') {
            Some((width, height)) => (parse_number(width)?, parse_number(height)?),
            None => {
                let width = parse_number(size)?;
                (width, width)
            }
        };
        let mut bits_per_pixel = DEFAULT_BITS_PER_PIXEL;
        if let Some(digits) = words.peek().and_then(|w| w.strip_suffix("bpp")) {
            bits_per_pixel = parse_number(digits)?;
            words.next();
        }
        let container = match words.next() {
            None => Container::Any,
            Some("BMP") => Container::Bmp,
            Some("PNG") => Container::Png,
            Some(_) => return None,
        };
        if words.next().is_some() {
            return None;
        }
        Some(RawFormat { width, height, bits_per_pixel, container })
    }
}

/// Parses a run of ASCII digits.  Values too large for a `u32` saturate, so
/// that they fail the allow-list checks rather than the grammar.
fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}

//===========================================================================//


//===========================================================================//
