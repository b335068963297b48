use crate::raster::{BmpDepth, Raster};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

//===========================================================================//

// The size of a BITMAPFILEHEADER struct, in bytes.
pub(crate) const FILE_HEADER_LEN: u32 = 14;

// The size of a BITMAPINFOHEADER struct, in bytes.
pub(crate) const INFO_HEADER_LEN: u32 = 40;

// "BM", read as a little-endian u16.
const BMP_SIGNATURE: u16 = 0x4d42;

// 96 DPI, expressed in pixels per meter.
const PIXELS_PER_METER: i32 = 3780;

//===========================================================================//

/// The BITMAPFILEHEADER that starts a standalone BMP file.  Icons don't
/// store one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BitmapFileHeader {
    pub(crate) file_size: u32,
    pub(crate) pixel_offset: u32,
}

impl BitmapFileHeader {
    pub(crate) fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let signature = reader.read_u16::<LittleEndian>()?;
        if signature != BMP_SIGNATURE {
            invalid_data!("Invalid BMP signature (was {:#06x})", signature);
        }
        let file_size = reader.read_u32::<LittleEndian>()?;
        let _reserved1 = reader.read_u16::<LittleEndian>()?;
        let _reserved2 = reader.read_u16::<LittleEndian>()?;
        let pixel_offset = reader.read_u32::<LittleEndian>()?;
        Ok(BitmapFileHeader { file_size, pixel_offset })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(BMP_SIGNATURE)?;
        writer.write_u32::<LittleEndian>(self.file_size)?;
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u32::<LittleEndian>(self.pixel_offset)?;
        Ok(())
    }
}

//===========================================================================//

/// The BITMAPINFOHEADER struct.  Within an icon, `height` counts the rows
/// of both the color data and the mask, so it is twice the image height.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BitmapInfoHeader {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) planes: u16,
    pub(crate) bits_per_pixel: u16,
    pub(crate) compression: u32,
    pub(crate) image_size: u32,
    pub(crate) horz_ppm: i32,
    pub(crate) vert_ppm: i32,
    pub(crate) colors_used: u32,
    pub(crate) colors_important: u32,
}

impl BitmapInfoHeader {
    pub(crate) fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let header_size = reader.read_u32::<LittleEndian>()?;
        if header_size != INFO_HEADER_LEN {
            invalid_data!(
                "Invalid BMP header size (was {}, must be {})",
                header_size,
                INFO_HEADER_LEN
            );
        }
        Ok(BitmapInfoHeader {
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            planes: reader.read_u16::<LittleEndian>()?,
            bits_per_pixel: reader.read_u16::<LittleEndian>()?,
            compression: reader.read_u32::<LittleEndian>()?,
            image_size: reader.read_u32::<LittleEndian>()?,
            horz_ppm: reader.read_i32::<LittleEndian>()?,
            vert_ppm: reader.read_i32::<LittleEndian>()?,
            colors_used: reader.read_u32::<LittleEndian>()?,
            colors_important: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(INFO_HEADER_LEN)?;
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.planes)?;
        writer.write_u16::<LittleEndian>(self.bits_per_pixel)?;
        writer.write_u32::<LittleEndian>(self.compression)?;
        writer.write_u32::<LittleEndian>(self.image_size)?;
        writer.write_i32::<LittleEndian>(self.horz_ppm)?;
        writer.write_i32::<LittleEndian>(self.vert_ppm)?;
        writer.write_u32::<LittleEndian>(self.colors_used)?;
        writer.write_u32::<LittleEndian>(self.colors_important)?;
        Ok(())
    }

    /// The pixel layout named by `bits_per_pixel`.
    pub(crate) fn depth(&self) -> io::Result<BmpDepth> {
        match BmpDepth::from_bits_per_pixel(self.bits_per_pixel) {
            Some(depth) => Ok(depth),
            None => invalid_data!(
                "Unsupported BMP bits-per-pixel ({})",
                self.bits_per_pixel
            ),
        }
    }

    /// Number of color table entries following this header.
    pub(crate) fn palette_len(&self) -> io::Result<usize> {
        let depth = self.depth()?;
        if self.colors_used == 0 {
            Ok(depth.num_colors())
        } else {
            Ok(self.colors_used as usize)
        }
    }
}

//===========================================================================//

/// Encodes `raster` as a standalone BMP file: file header, info header,
/// color table, then the rows from the *bottom* up, each padded to a
/// multiple of four bytes.
pub(crate) fn encode_bmp(raster: &Raster) -> io::Result<Vec<u8>> {
    let width = raster.width();
    let height = raster.height();
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        invalid_input!("Image too large for BMP ({}x{})", width, height);
    }
    let depth = raster.depth();
    let palette = raster.palette();
    let row_data_size = depth.row_data_size(width);
    let row_padding = vec![0u8; depth.row_stride(width) - row_data_size];
    let image_size = depth.row_stride(width) * height as usize;
    let pixel_offset = FILE_HEADER_LEN as usize
        + INFO_HEADER_LEN as usize
        + 4 * palette.len();
    let file_size = pixel_offset + image_size;
    let mut data = Vec::<u8>::with_capacity(file_size);

    let file_header = BitmapFileHeader {
        file_size: file_size as u32,
        pixel_offset: pixel_offset as u32,
    };
    file_header.write(&mut data)?;
    let info_header = BitmapInfoHeader {
        width: width as i32,
        height: height as i32,
        planes: 1,
        bits_per_pixel: depth.bits_per_pixel(),
        compression: 0,
        image_size: image_size as u32,
        horz_ppm: PIXELS_PER_METER,
        vert_ppm: PIXELS_PER_METER,
        colors_used: palette.len() as u32,
        colors_important: 0,
    };
    info_header.write(&mut data)?;
    for &[red, green, blue] in palette.iter() {
        data.write_u8(blue)?;
        data.write_u8(green)?;
        data.write_u8(red)?;
        data.write_u8(0)?;
    }

    for row in 0..height {
        let mut packed = raster.packed_row(height - row - 1);
        match depth {
            BmpDepth::TwentyFour => {
                for pixel in packed.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
            }
            BmpDepth::ThirtyTwo => {
                for pixel in packed.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
            }
            _ => {}
        }
        debug_assert_eq!(packed.len(), row_data_size);
        data.write_all(&packed)?;
        data.write_all(&row_padding)?;
    }

    debug_assert_eq!(data.len(), file_size);
    Ok(data)
}

//===========================================================================//

/// Layout of a BMP blob embedded in an icon, as described by its info
/// header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IconBmpInfo {
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    palette_len: usize,
}

impl IconBmpInfo {
    /// Parses the info header at the start of an embedded BMP blob.  The
    /// stored height must be even, since it counts both the color rows and
    /// the mask rows.
    pub fn read(data: &[u8]) -> io::Result<IconBmpInfo> {
        let mut reader = data;
        let header = BitmapInfoHeader::read(&mut reader)?;
        if header.width < 1 {
            invalid_data!(
                "Invalid BMP width (was {}, but must be at least 1)",
                header.width
            );
        }
        if header.height % 2 != 0 || header.height < 2 {
            invalid_data!(
                "Invalid height field in BMP header \
                 (was {}, but must be positive and divisible by 2)",
                header.height
            );
        }
        Ok(IconBmpInfo {
            width: header.width as u32,
            height: (header.height / 2) as u32,
            bits_per_pixel: header.bits_per_pixel,
            palette_len: header.palette_len()?,
        })
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image (half the stored height), in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the bits-per-pixel of the color data.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the number of color table entries.
    pub fn palette_len(&self) -> usize {
        self.palette_len
    }

    /// Returns the byte length of the color rows.
    pub fn color_data_len(&self) -> usize {
        match BmpDepth::from_bits_per_pixel(self.bits_per_pixel) {
            Some(depth) => depth.row_stride(self.width) * self.height as usize,
            None => 0,
        }
    }

    /// Returns the byte length of the 1-bit mask rows.
    pub fn mask_data_len(&self) -> usize {
        BmpDepth::One.row_stride(self.width) * self.height as usize
    }

    /// Returns the total length a well-formed blob with this header has:
    /// header, color table, color rows, and mask rows.
    pub fn expected_len(&self) -> usize {
        INFO_HEADER_LEN as usize
            + 4 * self.palette_len
            + self.color_data_len()
            + self.mask_data_len()
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{
        encode_bmp, BitmapFileHeader, BitmapInfoHeader, IconBmpInfo,
        FILE_HEADER_LEN, INFO_HEADER_LEN,
    };
    use crate::raster::{BmpDepth, Raster};

    #[test]
    fn encode_two_by_two_one_bit() {
        let raster = Raster::new(
            2,
            2,
            BmpDepth::One,
            vec![[0, 0, 0], [255, 255, 255]],
            vec![1, 0, 0, 1],
        );
        let data = encode_bmp(&raster).unwrap();
        let expected: &[u8] = b"\
            BM\x46\x00\x00\x00\x00\x00\x00\x00\x3e\x00\x00\x00\
            \
            \x28\x00\x00\x00\x02\x00\x00\x00\x02\x00\x00\x00\
            \x01\x00\x01\x00\x00\x00\x00\x00\x08\x00\x00\x00\
            \xc4\x0e\x00\x00\xc4\x0e\x00\x00\x02\x00\x00\x00\
            \x00\x00\x00\x00\
            \
            \x00\x00\x00\x00\xff\xff\xff\x00\
            \
            \x40\x00\x00\x00\
            \x80\x00\x00\x00";
        assert_eq!(data.as_slice(), expected);
    }

    #[test]
    fn encode_writes_bgr_bottom_up() {
        let raster = Raster::new(
            1,
            2,
            BmpDepth::TwentyFour,
            Vec::new(),
            vec![1, 2, 3, 4, 5, 6],
        );
        let data = encode_bmp(&raster).unwrap();
        let pixels = &data[(FILE_HEADER_LEN + INFO_HEADER_LEN) as usize..];
        assert_eq!(pixels, &[6, 5, 4, 0, 3, 2, 1, 0]);
    }

    #[test]
    fn encode_writes_bgra() {
        let raster = Raster::new(
            1,
            1,
            BmpDepth::ThirtyTwo,
            Vec::new(),
            vec![1, 2, 3, 4],
        );
        let data = encode_bmp(&raster).unwrap();
        let pixels = &data[(FILE_HEADER_LEN + INFO_HEADER_LEN) as usize..];
        assert_eq!(pixels, &[3, 2, 1, 4]);
    }

    #[test]
    fn headers_round_trip() {
        let raster = Raster::new(
            3,
            5,
            BmpDepth::Four,
            vec![[1, 2, 3]; 16],
            vec![7; 15],
        );
        let data = encode_bmp(&raster).unwrap();
        let mut reader = data.as_slice();
        let file_header = BitmapFileHeader::read(&mut reader).unwrap();
        assert_eq!(file_header.file_size as usize, data.len());
        assert_eq!(file_header.pixel_offset, 14 + 40 + 64);
        let info_header = BitmapInfoHeader::read(&mut reader).unwrap();
        assert_eq!(info_header.width, 3);
        assert_eq!(info_header.height, 5);
        assert_eq!(info_header.bits_per_pixel, 4);
        assert_eq!(info_header.palette_len().unwrap(), 16);
        let mut written = Vec::new();
        info_header.write(&mut written).unwrap();
        assert_eq!(written.as_slice(), &data[14..54]);
    }

    #[test]
    fn reject_bad_signature() {
        let mut input: &[u8] = b"XX\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";
        assert!(BitmapFileHeader::read(&mut input).is_err());
    }

    #[test]
    fn icon_bmp_info_requires_even_height() {
        let mut blob = Vec::new();
        let mut header = BitmapInfoHeader {
            width: 16,
            height: 31,
            planes: 1,
            bits_per_pixel: 8,
            compression: 0,
            image_size: 0,
            horz_ppm: 0,
            vert_ppm: 0,
            colors_used: 0,
            colors_important: 0,
        };
        header.write(&mut blob).unwrap();
        assert!(IconBmpInfo::read(&blob).is_err());
        blob.clear();
        header.height = 32;
        header.write(&mut blob).unwrap();
        let info = IconBmpInfo::read(&blob).unwrap();
        assert_eq!(info.height(), 16);
        assert_eq!(info.palette_len(), 256);
        assert_eq!(info.expected_len(), 40 + 1024 + 16 * 16 + 4 * 16);
    }
}

//===========================================================================//
