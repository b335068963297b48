//===========================================================================//

/// The pixel layouts a `Raster` can hold, which are also the layouts the BMP
/// encoder writes.  Each discriminant is the layout's bits per pixel; `One`
/// only ever backs opacity masks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u16)]
pub(crate) enum BmpDepth {
    One = 1,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    TwentyFour = 24,
    ThirtyTwo = 32,
}

impl BmpDepth {
    const ALL: [BmpDepth; 6] = [
        BmpDepth::One,
        BmpDepth::Four,
        BmpDepth::Eight,
        BmpDepth::Sixteen,
        BmpDepth::TwentyFour,
        BmpDepth::ThirtyTwo,
    ];

    pub(crate) fn from_bits_per_pixel(
        bits_per_pixel: u16,
    ) -> Option<BmpDepth> {
        BmpDepth::ALL
            .iter()
            .copied()
            .find(|depth| depth.bits_per_pixel() == bits_per_pixel)
    }

    pub(crate) fn bits_per_pixel(self) -> u16 {
        self as u16
    }

    /// Size of the color table: every index an indexed layout can hold, and
    /// none for direct color.
    pub(crate) fn num_colors(self) -> usize {
        match self {
            BmpDepth::One | BmpDepth::Four | BmpDepth::Eight => {
                1 << self.bits_per_pixel()
            }
            _ => 0,
        }
    }

    /// Bytes per row without padding.
    pub(crate) fn row_data_size(self, width: u32) -> usize {
        ((width as usize) * (self.bits_per_pixel() as usize) + 7) / 8
    }

    /// Bytes per row once padded to a multiple of four.
    pub(crate) fn row_stride(self, width: u32) -> usize {
        ((self.row_data_size(width) + 3) / 4) * 4
    }
}

//===========================================================================//

/// A pixel buffer already reduced to one of the BMP pixel layouts.
///
/// Samples are stored row-major from top to bottom, one sample per pixel:
/// a palette index (one byte) for indexed depths, a little-endian `0RRRRRGG
/// GGGBBBBB` word for 16 bpp, RGB bytes for 24 bpp, and RGBA bytes for
/// 32 bpp.
#[derive(Clone, Debug)]
pub(crate) struct Raster {
    width: u32,
    height: u32,
    depth: BmpDepth,
    palette: Vec<[u8; 3]>,
    samples: Vec<u8>,
}

impl Raster {
    /// Panics if `samples` or `palette` don't fit `depth` and the size.
    pub(crate) fn new(
        width: u32,
        height: u32,
        depth: BmpDepth,
        palette: Vec<[u8; 3]>,
        samples: Vec<u8>,
    ) -> Raster {
        let expected_len =
            (width as usize) * (height as usize) * Raster::sample_len(depth);
        if samples.len() != expected_len {
            panic!(
                "Invalid sample length (was {}, but must be {} for {}x{} \
                 at {} bpp)",
                samples.len(),
                expected_len,
                width,
                height,
                depth.bits_per_pixel()
            );
        }
        if palette.len() != depth.num_colors() {
            panic!(
                "Invalid palette length (was {}, but must be {} at {} bpp)",
                palette.len(),
                depth.num_colors(),
                depth.bits_per_pixel()
            );
        }
        Raster { width, height, depth, palette, samples }
    }

    fn sample_len(depth: BmpDepth) -> usize {
        match depth {
            BmpDepth::One | BmpDepth::Four | BmpDepth::Eight => 1,
            BmpDepth::Sixteen => 2,
            BmpDepth::TwentyFour => 3,
            BmpDepth::ThirtyTwo => 4,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn depth(&self) -> BmpDepth {
        self.depth
    }

    pub(crate) fn palette(&self) -> &[[u8; 3]] {
        &self.palette
    }

    /// Returns the samples of row `y`, counting from the top.
    pub(crate) fn row(&self, y: u32) -> &[u8] {
        let len = (self.width as usize) * Raster::sample_len(self.depth);
        &self.samples[(y as usize) * len..][..len]
    }

    /// Returns the palette index of the pixel at `(x, y)`.  Only meaningful
    /// for indexed depths.
    #[cfg(test)]
    pub(crate) fn index_at(&self, x: u32, y: u32) -> u8 {
        debug_assert!(self.depth.num_colors() > 0);
        self.samples[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Returns row `y` with sub-byte indices packed most significant bits
    /// first, as both BMP and PNG store them.  Other layouts are copied
    /// unchanged.
    pub(crate) fn packed_row(&self, y: u32) -> Vec<u8> {
        let row = self.row(y);
        let bits = self.depth.bits_per_pixel() as usize;
        if bits >= 8 {
            return row.to_vec();
        }
        let per_byte = 8 / bits;
        let mut packed = vec![0u8; self.depth.row_data_size(self.width)];
        for (col, &index) in row.iter().enumerate() {
            let shift = 8 - bits * (col % per_byte + 1);
            packed[col / per_byte] |= index << shift;
        }
        packed
    }
}

//===========================================================================//


//===========================================================================//
