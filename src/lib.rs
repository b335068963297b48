//! A library for building multi-resolution ICO files from a single raster
//! image.
//!
//! Each requested format names a square size, a color depth, and which
//! encodings (BMP, PNG, or either) may be embedded:
//!
//! ```no_run
//! let source = image::open("logo.png").unwrap();
//! let icon = mkico::convert_image(
//!     &source,
//!     "16, 32, 48 8bpp BMP, 256 PNG",
//!     mkico::AssemblyOptions::default(),
//! )
//! .unwrap();
//! icon.save("logo.ico").unwrap();
//! ```
//!
//! The source is scaled into a centered square once per distinct size, a
//! 1-bit opacity mask is derived from its alpha channel, and every format is
//! encoded from that shared composite.  When both encodings are allowed the
//! smaller one is kept.

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod bmp;
mod composite;
mod encode;
mod error;
mod format;
mod icondir;
mod mask;
mod pipeline;
mod quantize;
mod raster;
mod target;

pub use crate::bmp::IconBmpInfo;
pub use crate::composite::{square_composite, TRANSPARENT_FILL};
pub use crate::encode::EncodedEntry;
pub use crate::error::{IconError, Result};
pub use crate::format::{
    parse_format_list, parse_formats, BitDepth, Container, FormatSpec,
    SUPPORTED_DIMENSIONS,
};
pub use crate::icondir::{IconDir, IconDirEntry, IconFile};
pub use crate::mask::{inverse_alpha, MaskPolarity};
pub use crate::pipeline::{AssemblyOptions, IconAssembler};
pub use crate::target::{check_source, check_target, default_output_path};

use std::path::Path;

//===========================================================================//

/// Builds an icon from an already decoded image.  `formats` is a
/// comma-separated list such as `"16x16 PNG, 32x32"`.
pub fn convert_image(
    source: &image::DynamicImage,
    formats: &str,
    options: AssemblyOptions,
) -> Result<IconFile> {
    let specs = parse_format_list(formats)?;
    IconAssembler::new(options).assemble(&source.to_rgba8(), &specs)
}

/// Reads the image at `source`, builds an icon from it, and writes it to
/// `output`.  The output file is only created once every entry has been
/// encoded, so a failed conversion never leaves a truncated icon behind.
#[tracing::instrument(level = "info", skip(formats, options))]
pub fn convert_file(
    source: &Path,
    output: &Path,
    formats: &str,
    options: AssemblyOptions,
    overwrite: bool,
) -> Result<IconFile> {
    let specs = parse_format_list(formats)?;
    check_source(source)?;
    check_target(output, overwrite)?;
    let image = image::open(source)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "decoded source"
    );
    let icon = IconAssembler::new(options).assemble(&image.to_rgba8(), &specs)?;
    icon.save(output)?;
    tracing::info!(bytes = icon.encoded_len(), "wrote icon");
    Ok(icon)
}

//===========================================================================//
