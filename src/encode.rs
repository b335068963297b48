use crate::bmp::{
    encode_bmp, BitmapFileHeader, BitmapInfoHeader, FILE_HEADER_LEN,
    INFO_HEADER_LEN,
};
use crate::composite::CompositeSet;
use crate::error::{IconError, Result};
use crate::format::FormatSpec;
use crate::quantize::{self, expand_five_bits};
use crate::raster::{BmpDepth, Raster};
use std::io;

//===========================================================================//

// The signature that all PNG files start with.
pub(crate) const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

//===========================================================================//

/// One encoded icon entry, ready to be written into a container.
#[derive(Clone, Debug)]
pub struct EncodedEntry {
    spec: FormatSpec,
    data: Vec<u8>,
    bits_per_pixel: u16,
    num_colors: usize,
    width: u32,
    height: u32,
}

impl EncodedEntry {
    /// Returns the format this entry was encoded for.
    pub fn spec(&self) -> FormatSpec {
        self.spec
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the bits-per-pixel (color depth) of the image.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the number of color table entries, or zero if the image
    /// doesn't use a color table.
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Returns true if the image is encoded as a PNG, or false if it is
    /// encoded as a BMP.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

//===========================================================================//

/// The encodings produced for one format, before selection.
pub(crate) struct Candidates {
    pub(crate) png: Option<Vec<u8>>,
    pub(crate) bmp: Option<Vec<u8>>,
}

/// Reduces the composite of `set` to the depth of `spec` and encodes it in
/// every container `spec` allows.
pub(crate) fn encode_candidates(
    spec: &FormatSpec,
    set: &CompositeSet,
) -> Result<(Raster, Candidates)> {
    let raster = quantize::reduce(set.composite(), spec.bit_depth());
    let png = if spec.container().allows_png() {
        Some(encode_png(&raster)?)
    } else {
        None
    };
    let bmp = if spec.container().allows_bmp() {
        Some(encode_icon_bmp(&raster, set.mask())?)
    } else {
        None
    };
    Ok((raster, Candidates { png, bmp }))
}

/// Encodes `spec` from its dimension's composite set, keeping the smaller
/// encoding when both are allowed.  On a tie the PNG wins.
#[tracing::instrument(level = "debug", skip_all, fields(spec = %spec))]
pub(crate) fn encode_entry(
    spec: &FormatSpec,
    set: &CompositeSet,
) -> Result<EncodedEntry> {
    let (raster, candidates) = encode_candidates(spec, set)?;
    let data = match (candidates.png, candidates.bmp) {
        (Some(png), Some(bmp)) => {
            tracing::debug!(png = png.len(), bmp = bmp.len(), "candidates");
            if bmp.len() < png.len() {
                bmp
            } else {
                png
            }
        }
        (Some(png), None) => png,
        (None, Some(bmp)) => bmp,
        (None, None) => return Err(IconError::InternalInvariantViolation(*spec)),
    };
    Ok(EncodedEntry {
        spec: *spec,
        data,
        bits_per_pixel: spec.bit_depth().bits_per_pixel(),
        num_colors: raster.palette().len(),
        width: spec.dimension(),
        height: spec.dimension(),
    })
}

//===========================================================================//

/// Encodes `raster` as a PNG stream.
pub(crate) fn encode_png(
    raster: &Raster,
) -> std::result::Result<Vec<u8>, png::EncodingError> {
    let mut data = Vec::new();
    let mut encoder =
        png::Encoder::new(&mut data, raster.width(), raster.height());
    encoder.set_depth(png::BitDepth::Eight);
    match raster.depth() {
        BmpDepth::ThirtyTwo => encoder.set_color(png::ColorType::Rgba),
        BmpDepth::TwentyFour | BmpDepth::Sixteen => {
            encoder.set_color(png::ColorType::Rgb)
        }
        BmpDepth::One | BmpDepth::Four | BmpDepth::Eight => {
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(match raster.depth() {
                BmpDepth::One => png::BitDepth::One,
                BmpDepth::Four => png::BitDepth::Four,
                _ => png::BitDepth::Eight,
            });
            let palette: Vec<u8> =
                raster.palette().iter().flatten().copied().collect();
            encoder.set_palette(palette);
        }
    }
    let mut image_data = Vec::new();
    for y in 0..raster.height() {
        let row = raster.packed_row(y);
        if raster.depth() == BmpDepth::Sixteen {
            // PNG has no 5-bit channels, so widen each back to 8 bits.
            for word in row.chunks_exact(2) {
                let color = u16::from_le_bytes([word[0], word[1]]);
                image_data.push(expand_five_bits((color >> 10) & 0x1f));
                image_data.push(expand_five_bits((color >> 5) & 0x1f));
                image_data.push(expand_five_bits(color & 0x1f));
            }
        } else {
            image_data.extend_from_slice(&row);
        }
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image_data)?;
    writer.finish()?;
    Ok(data)
}

/// Encodes `raster` as a BMP suitable for embedding in an icon: the color
/// data followed by the 1-bit `mask`.
pub(crate) fn encode_icon_bmp(
    raster: &Raster,
    mask: &Raster,
) -> io::Result<Vec<u8>> {
    let color_bmp = encode_bmp(raster)?;
    let mask_bmp = encode_bmp(mask)?;
    embed_bmp(&color_bmp, &mask_bmp)
}

/// Rewrites a standalone BMP file for use inside an icon.  The file header
/// is dropped, the info header's height is doubled to cover the mask rows,
/// and the pixel data of `mask_bmp` is appended after the color data.
pub(crate) fn embed_bmp(
    color_bmp: &[u8],
    mask_bmp: &[u8],
) -> io::Result<Vec<u8>> {
    let (mut info, palette, pixels) = split_bmp(color_bmp)?;
    info.height = 2 * info.width;
    let (mask_info, _, mask_pixels) = split_bmp(mask_bmp)?;
    if mask_info.bits_per_pixel != 1 {
        invalid_data!(
            "Mask must be 1 bpp (was {} bpp)",
            mask_info.bits_per_pixel
        );
    }
    let mut data = Vec::with_capacity(
        INFO_HEADER_LEN as usize
            + palette.len()
            + pixels.len()
            + mask_pixels.len(),
    );
    info.write(&mut data)?;
    data.extend_from_slice(palette);
    data.extend_from_slice(pixels);
    data.extend_from_slice(mask_pixels);
    Ok(data)
}

/// Splits a standalone BMP file into its info header, raw color table, and
/// raw pixel rows.
fn split_bmp(bmp: &[u8]) -> io::Result<(BitmapInfoHeader, &[u8], &[u8])> {
    let mut reader = bmp;
    let file_header = BitmapFileHeader::read(&mut reader)?;
    let info = BitmapInfoHeader::read(&mut reader)?;
    let depth = info.depth()?;
    let palette_start = (FILE_HEADER_LEN + INFO_HEADER_LEN) as usize;
    let palette_end = palette_start + 4 * info.palette_len()?;
    let rows = info.height.unsigned_abs() as usize;
    let pixels_len = depth.row_stride(info.width.max(0) as u32) * rows;
    let pixels_start = file_header.pixel_offset as usize;
    if palette_end > pixels_start || pixels_start + pixels_len > bmp.len() {
        invalid_data!(
            "Truncated BMP data (was {} bytes, but needs {})",
            bmp.len(),
            pixels_start.max(palette_end) + pixels_len
        );
    }
    Ok((
        info,
        &bmp[palette_start..palette_end],
        &bmp[pixels_start..pixels_start + pixels_len],
    ))
}

//===========================================================================//


//===========================================================================//
