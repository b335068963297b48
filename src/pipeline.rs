use crate::composite::CompositeCache;
use crate::encode::encode_entry;
use crate::error::Result;
use crate::format::FormatSpec;
use crate::icondir::IconFile;
use crate::mask::MaskPolarity;
use image::imageops::FilterType;
use image::RgbaImage;

//===========================================================================//

/// Knobs for building icons.
#[derive(Clone, Copy, Debug)]
pub struct AssemblyOptions {
    /// Which mask bit value marks transparent pixels.
    pub mask_polarity: MaskPolarity,
    /// Resampling filter used to scale the source into each composite.
    pub filter: FilterType,
}

impl Default for AssemblyOptions {
    fn default() -> AssemblyOptions {
        AssemblyOptions {
            mask_polarity: MaskPolarity::default(),
            filter: FilterType::Lanczos3,
        }
    }
}

//===========================================================================//

/// Turns a source image and a list of formats into an icon file.
#[derive(Clone, Debug, Default)]
pub struct IconAssembler {
    options: AssemblyOptions,
}

impl IconAssembler {
    /// Creates an assembler with the given options.
    pub fn new(options: AssemblyOptions) -> IconAssembler {
        IconAssembler { options }
    }

    /// Returns the options this assembler was created with.
    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Encodes one entry per format, in order.  Each distinct dimension is
    /// composited once and shared by all formats of that dimension.
    #[tracing::instrument(level = "debug", skip_all, fields(formats = specs.len()))]
    pub fn assemble(
        &self,
        source: &RgbaImage,
        specs: &[FormatSpec],
    ) -> Result<IconFile> {
        let mut cache = CompositeCache::new(source, &self.options, specs);
        let mut icon = IconFile::new();
        for spec in specs.iter() {
            let dimension = spec.dimension();
            let entry = encode_entry(spec, cache.acquire(dimension))?;
            tracing::debug!(
                spec = %spec,
                bytes = entry.data().len(),
                png = entry.is_png(),
                "encoded entry"
            );
            cache.release(dimension);
            icon.add_entry(entry);
        }
        tracing::info!(
            entries = icon.entries().len(),
            composites = cache.num_built(),
            "assembled icon"
        );
        Ok(icon)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{AssemblyOptions, IconAssembler};
    use crate::format::parse_format_list;
    use crate::mask::MaskPolarity;
    use image::imageops::FilterType;
    use image::{Rgba, RgbaImage};

    #[test]
    fn default_options() {
        let options = AssemblyOptions::default();
        assert_eq!(options.mask_polarity, MaskPolarity::TransparentSet);
        assert_eq!(options.filter, FilterType::Lanczos3);
    }

    #[test]
    fn assembler_keeps_its_options() {
        let options = AssemblyOptions {
            mask_polarity: MaskPolarity::OpaqueSet,
            filter: FilterType::Nearest,
        };
        let assembler = IconAssembler::new(options);
        assert_eq!(assembler.options().mask_polarity, MaskPolarity::OpaqueSet);
        assert_eq!(assembler.options().filter, FilterType::Nearest);
        let default_assembler = IconAssembler::default();
        assert_eq!(
            default_assembler.options().mask_polarity,
            MaskPolarity::TransparentSet
        );
    }

    #[test]
    fn entries_follow_request_order() {
        let source = RgbaImage::from_pixel(30, 20, Rgba([0, 0xff, 0, 0xff]));
        let specs =
            parse_format_list("48, 16 BMP, 48 8bpp PNG, 32 24bpp").unwrap();
        let icon = IconAssembler::default().assemble(&source, &specs).unwrap();
        let got: Vec<_> =
            icon.entries().iter().map(|entry| entry.spec()).collect();
        assert_eq!(got, specs);
        assert!(!icon.entries()[1].is_png());
        assert!(icon.entries()[2].is_png());
    }

    #[test]
    fn empty_format_list_gives_empty_icon() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let icon = IconAssembler::default().assemble(&source, &[]).unwrap();
        assert!(icon.entries().is_empty());
        assert_eq!(icon.to_bytes().unwrap(), b"\x00\x00\x01\x00\x00\x00");
    }
}

//===========================================================================//
