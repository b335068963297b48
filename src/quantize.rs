use crate::format::BitDepth;
use crate::raster::{BmpDepth, Raster};
use image::RgbaImage;
use std::collections::HashMap;

//===========================================================================//

/// The 16-color VGA palette, in index order.
const VGA_PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00],
    [0x80, 0x00, 0x00],
    [0x00, 0x80, 0x00],
    [0x80, 0x80, 0x00],
    [0x00, 0x00, 0x80],
    [0x80, 0x00, 0x80],
    [0x00, 0x80, 0x80],
    [0xc0, 0xc0, 0xc0],
    [0x80, 0x80, 0x80],
    [0xff, 0x00, 0x00],
    [0x00, 0xff, 0x00],
    [0xff, 0xff, 0x00],
    [0x00, 0x00, 0xff],
    [0xff, 0x00, 0xff],
    [0x00, 0xff, 0xff],
    [0xff, 0xff, 0xff],
];

/// Channel levels of the 6x6x6 color cube in the 256-color palette.
const CUBE_LEVELS: [u8; 6] = [0x00, 0x33, 0x66, 0x99, 0xcc, 0xff];

/// The two mask colors; a pixel quantized to white has index 1.
pub(crate) const MASK_PALETTE: [[u8; 3]; 2] =
    [[0x00, 0x00, 0x00], [0xff, 0xff, 0xff]];

//===========================================================================//

/// Converts a full composite to the requested color depth.  Alpha survives
/// only at 32 bpp; every other depth keeps just the RGB channels.
pub(crate) fn reduce(composite: &RgbaImage, depth: BitDepth) -> Raster {
    let (width, height) = composite.dimensions();
    let rgba = composite.as_raw();
    match depth {
        BitDepth::ThirtyTwo => Raster::new(
            width,
            height,
            BmpDepth::ThirtyTwo,
            Vec::new(),
            rgba.clone(),
        ),
        BitDepth::TwentyFour => {
            let mut rgb = Vec::with_capacity((rgba.len() / 4) * 3);
            for pixel in rgba.chunks_exact(4) {
                rgb.extend_from_slice(&pixel[..3]);
            }
            Raster::new(width, height, BmpDepth::TwentyFour, Vec::new(), rgb)
        }
        BitDepth::Sixteen => {
            let mut words = Vec::with_capacity((rgba.len() / 4) * 2);
            for pixel in rgba.chunks_exact(4) {
                let word = rgb555(pixel[0], pixel[1], pixel[2]);
                words.extend_from_slice(&word.to_le_bytes());
            }
            Raster::new(width, height, BmpDepth::Sixteen, Vec::new(), words)
        }
        BitDepth::Eight => {
            index_colors(composite, BmpDepth::Eight, halftone_palette())
        }
        BitDepth::Four => {
            index_colors(composite, BmpDepth::Four, VGA_PALETTE.to_vec())
        }
    }
}

/// Packs an RGB color into a `0RRRRRGGGGGBBBBB` word.
pub(crate) fn rgb555(red: u8, green: u8, blue: u8) -> u16 {
    ((red as u16 >> 3) << 10) | ((green as u16 >> 3) << 5) | (blue as u16 >> 3)
}

/// Expands a five-bit channel back to eight bits.
pub(crate) fn expand_five_bits(value: u16) -> u8 {
    ((value * 255 + 15) / 31) as u8
}

/// Returns the 256-color palette: the VGA colors, a 6x6x6 color cube, then a
/// ramp of grays.
pub(crate) fn halftone_palette() -> Vec<[u8; 3]> {
    let mut palette = Vec::with_capacity(256);
    palette.extend_from_slice(&VGA_PALETTE);
    for &red in CUBE_LEVELS.iter() {
        for &green in CUBE_LEVELS.iter() {
            for &blue in CUBE_LEVELS.iter() {
                palette.push([red, green, blue]);
            }
        }
    }
    for step in 0..24u8 {
        let gray = 8 + 10 * step;
        palette.push([gray, gray, gray]);
    }
    debug_assert_eq!(palette.len(), 256);
    palette
}

/// Returns the index of the palette entry closest to `color`.  Ties go to
/// the lower index.
pub(crate) fn nearest_color(palette: &[[u8; 3]], color: [u8; 3]) -> u8 {
    let mut best_index = 0;
    let mut best_distance = u32::MAX;
    for (index, entry) in palette.iter().enumerate() {
        let distance: u32 = entry
            .iter()
            .zip(color.iter())
            .map(|(&a, &b)| {
                let delta = (a as i32) - (b as i32);
                (delta * delta) as u32
            })
            .sum();
        if distance < best_distance {
            best_index = index;
            best_distance = distance;
        }
    }
    best_index as u8
}

fn index_colors(
    composite: &RgbaImage,
    depth: BmpDepth,
    palette: Vec<[u8; 3]>,
) -> Raster {
    let (width, height) = composite.dimensions();
    let mut lookup = HashMap::<[u8; 3], u8>::new();
    let mut indices = Vec::with_capacity((width * height) as usize);
    for pixel in composite.pixels() {
        let color = [pixel[0], pixel[1], pixel[2]];
        let index = *lookup
            .entry(color)
            .or_insert_with(|| nearest_color(&palette, color));
        indices.push(index);
    }
    Raster::new(width, height, depth, palette, indices)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{
        expand_five_bits, halftone_palette, nearest_color, reduce, rgb555,
        MASK_PALETTE, VGA_PALETTE,
    };
    use crate::raster::BmpDepth;
    use crate::format::BitDepth;
    use image::{Rgba, RgbaImage};

    fn two_pixel_image() -> RgbaImage {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([250, 5, 5, 255]));
        image.put_pixel(1, 0, Rgba([10, 20, 200, 0]));
        image
    }

    #[test]
    fn thirty_two_bits_keeps_alpha() {
        let raster = reduce(&two_pixel_image(), BitDepth::ThirtyTwo);
        assert_eq!(raster.depth(), BmpDepth::ThirtyTwo);
        assert_eq!(raster.row(0), &[250, 5, 5, 255, 10, 20, 200, 0]);
    }

    #[test]
    fn twenty_four_bits_drops_alpha() {
        let raster = reduce(&two_pixel_image(), BitDepth::TwentyFour);
        assert_eq!(raster.depth(), BmpDepth::TwentyFour);
        assert_eq!(raster.row(0), &[250, 5, 5, 10, 20, 200]);
    }

    #[test]
    fn sixteen_bits_packs_555() {
        assert_eq!(rgb555(0xff, 0xff, 0xff), 0x7fff);
        assert_eq!(rgb555(0xff, 0, 0), 0x7c00);
        assert_eq!(rgb555(0, 0x08, 0), 0x0020);
        let raster = reduce(&two_pixel_image(), BitDepth::Sixteen);
        let word = rgb555(250, 5, 5).to_le_bytes();
        assert_eq!(&raster.row(0)[..2], &word);
        assert_eq!(expand_five_bits(31), 255);
        assert_eq!(expand_five_bits(0), 0);
    }

    #[test]
    fn four_bits_uses_vga_palette() {
        let raster = reduce(&two_pixel_image(), BitDepth::Four);
        assert_eq!(raster.depth(), BmpDepth::Four);
        assert_eq!(raster.palette(), &VGA_PALETTE[..]);
        assert_eq!(raster.index_at(0, 0), 9); // red
        assert_eq!(raster.index_at(1, 0), 12); // blue
    }

    #[test]
    fn eight_bits_uses_halftone_palette() {
        let palette = halftone_palette();
        assert_eq!(palette.len(), 256);
        let raster = reduce(&two_pixel_image(), BitDepth::Eight);
        assert_eq!(raster.depth(), BmpDepth::Eight);
        let red = palette[raster.index_at(0, 0) as usize];
        assert_eq!(red, [0xff, 0x00, 0x00]);
    }

    #[test]
    fn nearest_color_prefers_lower_index_on_ties() {
        let palette = [[0, 0, 0], [10, 0, 0], [0, 0, 0]];
        assert_eq!(nearest_color(&palette, [5, 0, 0]), 0);
        assert_eq!(nearest_color(&palette, [9, 0, 0]), 1);
        assert_eq!(nearest_color(&MASK_PALETTE, [128, 128, 128]), 1);
        assert_eq!(nearest_color(&MASK_PALETTE, [127, 127, 127]), 0);
    }
}

//===========================================================================//
