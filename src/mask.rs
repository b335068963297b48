use crate::quantize::{nearest_color, MASK_PALETTE};
use crate::raster::{BmpDepth, Raster};
use image::RgbaImage;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

//===========================================================================//

/// Which bit value in the opacity mask marks a transparent pixel.
///
/// ICO consumers treat the mask as an AND mask: a set bit keeps the
/// background, a clear bit shows the icon pixel.  That is what
/// `TransparentSet` produces, and it is the default.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum MaskPolarity {
    /// Transparent pixels get bit 1, opaque pixels bit 0.
    #[default]
    TransparentSet,
    /// Opaque pixels get bit 1, transparent pixels bit 0.
    OpaqueSet,
}

//===========================================================================//

/// The color an alpha value maps to before quantization: gray with value
/// `1 - alpha`, fully opaque.  The original RGB is discarded.
pub fn inverse_alpha(alpha: u8) -> [u8; 4] {
    let value = u8::MAX - alpha;
    [value, value, value, u8::MAX]
}

/// Derives the 1-bit opacity mask of `composite`.
///
/// Each pixel is mapped through [`inverse_alpha`] and then to the nearer of
/// black (index 0) and white (index 1).  Pixels with alpha of 127 or less
/// come out white, i.e. transparent.
pub(crate) fn opacity_mask(
    composite: &RgbaImage,
    polarity: MaskPolarity,
) -> Raster {
    let (width, height) = composite.dimensions();
    let mut bits = Vec::with_capacity((width * height) as usize);
    for pixel in composite.pixels() {
        let [red, green, blue, _] = inverse_alpha(pixel[3]);
        let index = nearest_color(&MASK_PALETTE, [red, green, blue]);
        bits.push(match polarity {
            MaskPolarity::TransparentSet => index,
            MaskPolarity::OpaqueSet => index ^ 1,
        });
    }
    Raster::new(width, height, BmpDepth::One, MASK_PALETTE.to_vec(), bits)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{inverse_alpha, opacity_mask, MaskPolarity};
    use crate::quantize::MASK_PALETTE;
    use image::{Rgba, RgbaImage};

    #[test]
    fn inverse_alpha_discards_color() {
        assert_eq!(inverse_alpha(0), [255, 255, 255, 255]);
        assert_eq!(inverse_alpha(255), [0, 0, 0, 255]);
        assert_eq!(inverse_alpha(100), [155, 155, 155, 255]);
    }

    #[test]
    fn threshold_sits_between_127_and_128() {
        let mut image = RgbaImage::new(4, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 127]));
        image.put_pixel(2, 0, Rgba([0, 0, 255, 128]));
        image.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        let mask = opacity_mask(&image, MaskPolarity::TransparentSet);
        let bits: Vec<u8> = (0..4).map(|x| mask.index_at(x, 0)).collect();
        assert_eq!(bits, vec![1, 1, 0, 0]);
    }

    #[test]
    fn opaque_set_inverts_bits() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(1, 1, Rgba([9, 9, 9, 255]));
        let mask = opacity_mask(&image, MaskPolarity::OpaqueSet);
        assert_eq!(mask.index_at(0, 0), 0);
        assert_eq!(mask.index_at(1, 1), 1);
        assert_eq!(mask.palette(), &MASK_PALETTE[..]);
    }

    #[test]
    fn default_polarity_sets_transparent_bits() {
        assert_eq!(MaskPolarity::default(), MaskPolarity::TransparentSet);
    }
}

//===========================================================================//
