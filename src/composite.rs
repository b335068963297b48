use crate::format::FormatSpec;
use crate::mask::opacity_mask;
use crate::pipeline::AssemblyOptions;
use crate::raster::Raster;
use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};
use std::collections::HashMap;

//===========================================================================//

/// Fill color of the square canvas.  Only the zero alpha matters; the
/// magenta makes stray padding easy to spot when debugging.
pub const TRANSPARENT_FILL: Rgba<u8> = Rgba([0xff, 0x00, 0xff, 0x00]);

//===========================================================================//

/// Renders `source` into a `dimension`x`dimension` canvas, scaled to fit
/// with its aspect ratio preserved and centered, leaving transparent
/// padding along the shorter axis.
pub fn square_composite(
    source: &RgbaImage,
    dimension: u32,
    filter: FilterType,
) -> RgbaImage {
    let mut canvas =
        RgbaImage::from_pixel(dimension, dimension, TRANSPARENT_FILL);
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 || dimension == 0 {
        return canvas;
    }
    let size = dimension as u64;
    let (width, height) = (width as u64, height as u64);
    let longest = width.max(height);
    let scaled_width = (size * width / longest).max(1) as u32;
    let scaled_height = (size * height / longest).max(1) as u32;
    let x = size * (longest - width) / (2 * longest);
    let y = size * (longest - height) / (2 * longest);
    let scaled =
        resize_premultiplied(source, scaled_width, scaled_height, filter);
    imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
    canvas
}

/// Resamples with premultiplied alpha so the color of fully transparent
/// pixels never leaks into the edges of opaque ones.
fn resize_premultiplied(
    source: &RgbaImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> RgbaImage {
    let premultiplied =
        Rgba32FImage::from_fn(source.width(), source.height(), |x, y| {
            premultiply(source.get_pixel(x, y))
        });
    let scaled = imageops::resize(&premultiplied, width, height, filter);
    RgbaImage::from_fn(width, height, |x, y| {
        unpremultiply(scaled.get_pixel(x, y))
    })
}

fn premultiply(pixel: &Rgba<u8>) -> Rgba<f32> {
    let alpha = pixel[3] as f32 / 255.0;
    Rgba([
        pixel[0] as f32 / 255.0 * alpha,
        pixel[1] as f32 / 255.0 * alpha,
        pixel[2] as f32 / 255.0 * alpha,
        alpha,
    ])
}

fn unpremultiply(pixel: &Rgba<f32>) -> Rgba<u8> {
    let alpha = pixel[3].clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |value: f32| {
        ((value / alpha).clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Rgba([
        channel(pixel[0]),
        channel(pixel[1]),
        channel(pixel[2]),
        (alpha * 255.0).round() as u8,
    ])
}

//===========================================================================//

/// The composite for one dimension together with its opacity mask.  Every
/// format of that dimension is encoded from this one set.
pub(crate) struct CompositeSet {
    composite: RgbaImage,
    mask: Raster,
}

impl CompositeSet {
    pub(crate) fn build(
        source: &RgbaImage,
        dimension: u32,
        options: &AssemblyOptions,
    ) -> CompositeSet {
        let composite = square_composite(source, dimension, options.filter);
        let mask = opacity_mask(&composite, options.mask_polarity);
        CompositeSet { composite, mask }
    }

    pub(crate) fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    pub(crate) fn mask(&self) -> &Raster {
        &self.mask
    }
}

//===========================================================================//

/// Builds composite sets lazily, one per dimension, and drops each one as
/// soon as the last format that needs it has been released.
pub(crate) struct CompositeCache<'a> {
    source: &'a RgbaImage,
    options: &'a AssemblyOptions,
    pending: HashMap<u32, usize>,
    sets: HashMap<u32, CompositeSet>,
    num_built: usize,
}

impl<'a> CompositeCache<'a> {
    pub(crate) fn new(
        source: &'a RgbaImage,
        options: &'a AssemblyOptions,
        specs: &[FormatSpec],
    ) -> CompositeCache<'a> {
        let mut pending = HashMap::new();
        for spec in specs {
            *pending.entry(spec.dimension()).or_insert(0) += 1;
        }
        CompositeCache {
            source,
            options,
            pending,
            sets: HashMap::new(),
            num_built: 0,
        }
    }

    /// Returns the set for `dimension`, building it on first use.
    pub(crate) fn acquire(&mut self, dimension: u32) -> &CompositeSet {
        let source = self.source;
        let options = self.options;
        let num_built = &mut self.num_built;
        self.sets.entry(dimension).or_insert_with(|| {
            tracing::debug!(dimension, "building composite set");
            *num_built += 1;
            CompositeSet::build(source, dimension, options)
        })
    }

    /// Marks one format of `dimension` as done.  The set is dropped once no
    /// formats of that dimension remain.
    pub(crate) fn release(&mut self, dimension: u32) {
        if let Some(count) = self.pending.get_mut(&dimension) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending.remove(&dimension);
                if self.sets.remove(&dimension).is_some() {
                    tracing::debug!(dimension, "released composite set");
                }
            }
        }
    }

    /// How many sets have been built so far.
    pub(crate) fn num_built(&self) -> usize {
        self.num_built
    }

    /// How many sets are currently held.
    #[cfg(test)]
    pub(crate) fn num_live(&self) -> usize {
        self.sets.len()
    }
}

//===========================================================================//


//===========================================================================//
