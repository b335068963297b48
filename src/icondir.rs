use crate::bmp::IconBmpInfo;
use crate::encode::{EncodedEntry, PNG_SIGNATURE};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

//===========================================================================//

// Resource type number of icons (cursors use 2).
const ICON_RESOURCE_TYPE: u16 = 1;

// The size of the ICONDIR header, in bytes.
const ICONDIR_LEN: u32 = 6;

// The size of each ICONDIRENTRY record, in bytes.
const ICONDIRENTRY_LEN: u32 = 16;

//===========================================================================//

/// The encoded entries of an icon, in directory order.
#[derive(Clone, Debug, Default)]
pub struct IconFile {
    entries: Vec<EncodedEntry>,
}

impl IconFile {
    /// Creates a new, empty icon.
    pub fn new() -> IconFile {
        IconFile { entries: Vec::new() }
    }

    /// Returns the entries in this icon.
    pub fn entries(&self) -> &[EncodedEntry] {
        &self.entries
    }

    /// Appends an entry; it will follow all previously added entries in the
    /// directory.
    pub fn add_entry(&mut self, entry: EncodedEntry) {
        self.entries.push(entry);
    }

    /// Returns the total size of the serialized file, in bytes.
    pub fn encoded_len(&self) -> usize {
        ICONDIR_LEN as usize
            + ICONDIRENTRY_LEN as usize * self.entries.len()
            + self.entries.iter().map(|e| e.data().len()).sum::<usize>()
    }

    /// Writes the ICO file: the header, then every directory record, then
    /// every image blob.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        if self.entries.len() > (u16::MAX as usize) {
            invalid_input!(
                "Too many entries in IconFile (was {}, but max is {})",
                self.entries.len(),
                u16::MAX
            );
        }
        if self.encoded_len() > (u32::MAX as usize) {
            invalid_input!(
                "IconFile too large (was {} bytes, but max is {})",
                self.encoded_len(),
                u32::MAX
            );
        }
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(ICON_RESOURCE_TYPE)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        let mut data_offset =
            ICONDIR_LEN + ICONDIRENTRY_LEN * (self.entries.len() as u32);
        for entry in self.entries.iter() {
            // A width/height byte of zero indicates a size of 256.
            writer.write_u8(entry.width() as u8)?;
            writer.write_u8(entry.height() as u8)?;
            // Likewise a 256-color table is recorded as zero.
            writer.write_u8(entry.num_colors() as u8)?;
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(1)?; // color planes
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel())?;
            let data_size = entry.data().len() as u32;
            writer.write_u32::<LittleEndian>(data_size)?;
            writer.write_u32::<LittleEndian>(data_offset)?;
            data_offset += data_size;
        }
        for entry in self.entries.iter() {
            writer.write_all(entry.data())?;
        }
        Ok(())
    }

    /// Serializes the ICO file into memory.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.encoded_len());
        self.write(&mut data)?;
        Ok(data)
    }

    /// Creates (or truncates) the file at `path` and writes the icon to it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()
    }
}

//===========================================================================//

/// The directory of an ICO file, read back from bytes.
#[derive(Clone, Debug)]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Returns the entries in this directory.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Reads an ICO file into memory.
    pub fn read<R: Read + Seek>(mut reader: R) -> io::Result<IconDir> {
        let reserved = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            invalid_data!(
                "Invalid reserved field value in ICONDIR \
                 (was {}, but must be 0)",
                reserved
            );
        }
        let restype = reader.read_u16::<LittleEndian>()?;
        if restype != ICON_RESOURCE_TYPE {
            invalid_data!("Invalid resource type ({})", restype);
        }
        let num_entries = reader.read_u16::<LittleEndian>()? as usize;
        let mut entries = Vec::<IconDirEntry>::with_capacity(num_entries);
        let mut data_sizes = Vec::<u32>::with_capacity(num_entries);
        for _ in 0..num_entries {
            let width_byte = reader.read_u8()?;
            let height_byte = reader.read_u8()?;
            let num_colors = reader.read_u8()?;
            let reserved = reader.read_u8()?;
            if reserved != 0 {
                invalid_data!(
                    "Invalid reserved field value in ICONDIRENTRY \
                     (was {}, but must be 0)",
                    reserved
                );
            }
            let color_planes = reader.read_u16::<LittleEndian>()?;
            let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
            let data_size = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u32::<LittleEndian>()?;
            entries.push(IconDirEntry {
                width: if width_byte == 0 { 256 } else { width_byte as u32 },
                height: if height_byte == 0 {
                    256
                } else {
                    height_byte as u32
                },
                num_colors,
                color_planes,
                bits_per_pixel,
                data_offset,
                data: Vec::new(),
            });
            data_sizes.push(data_size);
        }
        let stream_len = reader.seek(SeekFrom::End(0))?;
        for (entry, &data_size) in entries.iter_mut().zip(data_sizes.iter()) {
            let end = entry.data_offset as u64 + data_size as u64;
            if end > stream_len {
                invalid_data!(
                    "ICONDIRENTRY data ({} bytes at offset {}) runs past \
                     the end of the file ({} bytes)",
                    data_size,
                    entry.data_offset,
                    stream_len
                );
            }
            entry.data = vec![0u8; data_size as usize];
            reader.seek(SeekFrom::Start(entry.data_offset as u64))?;
            reader.read_exact(&mut entry.data)?;
        }
        Ok(IconDir { entries })
    }
}

//===========================================================================//

/// One directory record of an ICO file, with its image data.
#[derive(Clone, Debug)]
pub struct IconDirEntry {
    width: u32,
    height: u32,
    num_colors: u8,
    color_planes: u16,
    bits_per_pixel: u16,
    data_offset: u32,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Returns the width recorded in the directory (a zero byte reads as
    /// 256).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height recorded in the directory (a zero byte reads as
    /// 256).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the raw color count byte.
    pub fn num_colors(&self) -> u8 {
        self.num_colors
    }

    /// Returns the color planes field.
    pub fn color_planes(&self) -> u16 {
        self.color_planes
    }

    /// Returns the bits-per-pixel field.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the absolute file offset of the image data.
    pub fn data_offset(&self) -> u32 {
        self.data_offset
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the image is encoded as a PNG, or false if it is
    /// encoded as a BMP.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Parses the info header of a BMP entry.  Returns an error for PNG
    /// entries and for malformed BMP data.
    pub fn bmp_info(&self) -> io::Result<IconBmpInfo> {
        if self.is_png() {
            invalid_data!("Entry is a PNG, not a BMP");
        }
        IconBmpInfo::read(&self.data)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{IconDir, IconFile};
    use crate::format::parse_format_list;
    use crate::pipeline::IconAssembler;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn read_empty_icon_set() {
        let input = b"\x00\x00\x01\x00\x00\x00";
        let icondir = IconDir::read(Cursor::new(input)).unwrap();
        assert_eq!(icondir.entries().len(), 0);
    }

    #[test]
    fn reject_cursor_set() {
        let input = b"\x00\x00\x02\x00\x00\x00";
        assert!(IconDir::read(Cursor::new(input)).is_err());
    }

    #[test]
    fn reject_nonzero_reserved_field() {
        let input = b"\x01\x00\x01\x00\x00\x00";
        assert!(IconDir::read(Cursor::new(input)).is_err());
    }

    #[test]
    fn reject_entry_past_end_of_file() {
        // One entry claiming 0xffffffff bytes at offset 22.
        let input: &[u8] = b"\x00\x00\x01\x00\x01\x00\
                             \x10\x10\x00\x00\x01\x00\x20\x00\
                             \xff\xff\xff\xff\x16\x00\x00\x00";
        assert_eq!(input.len(), 22);
        let error = IconDir::read(Cursor::new(input)).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_entry_ending_at_end_of_file() {
        let input: &[u8] = b"\x00\x00\x01\x00\x01\x00\
                             \x10\x10\x00\x00\x01\x00\x20\x00\
                             \x02\x00\x00\x00\x16\x00\x00\x00\
                             \xab\xcd";
        let icondir = IconDir::read(Cursor::new(input)).unwrap();
        assert_eq!(icondir.entries().len(), 1);
        assert_eq!(icondir.entries()[0].data(), &[0xab, 0xcd]);
        assert_eq!(icondir.entries()[0].width(), 16);
    }

    #[test]
    fn write_empty_icon_set() {
        let icon = IconFile::new();
        let mut output = Vec::<u8>::new();
        icon.write(&mut output).unwrap();
        let expected: &[u8] = b"\x00\x00\x01\x00\x00\x00";
        assert_eq!(output.as_slice(), expected);
        assert_eq!(icon.encoded_len(), 6);
    }

    #[test]
    fn write_directory_records() {
        let source = RgbaImage::from_pixel(8, 8, Rgba([0xff, 0, 0, 0xff]));
        let specs = parse_format_list("256 PNG, 16 4bpp BMP").unwrap();
        let icon = IconAssembler::default().assemble(&source, &specs).unwrap();
        let png_len = icon.entries()[0].data().len() as u32;
        let bmp_len = icon.entries()[1].data().len() as u32;
        let data = icon.to_bytes().unwrap();
        assert_eq!(data.len(), 6 + 32 + (png_len + bmp_len) as usize);
        assert_eq!(&data[..6], b"\x00\x00\x01\x00\x02\x00");
        // 256x256 PNG: both size bytes wrap to zero.
        let mut record = b"\x00\x00\x00\x00\x01\x00\x20\x00".to_vec();
        record.extend_from_slice(&png_len.to_le_bytes());
        record.extend_from_slice(&38u32.to_le_bytes());
        assert_eq!(&data[6..22], record.as_slice());
        // 16x16 4bpp BMP with a 16-color table.
        let mut record = b"\x10\x10\x10\x00\x01\x00\x04\x00".to_vec();
        record.extend_from_slice(&bmp_len.to_le_bytes());
        record.extend_from_slice(&(38 + png_len).to_le_bytes());
        assert_eq!(&data[22..38], record.as_slice());
        assert_eq!(&data[38..42], b"\x89PNG");
        assert_eq!(&data[(38 + png_len) as usize..][..4], b"\x28\x00\x00\x00");
    }

    #[test]
    fn read_back_written_icon() {
        let source = RgbaImage::from_pixel(12, 6, Rgba([0, 0, 0xff, 0xff]));
        let specs = parse_format_list("16, 32 8bpp BMP, 48 24bpp").unwrap();
        let icon = IconAssembler::default().assemble(&source, &specs).unwrap();
        let data = icon.to_bytes().unwrap();
        let icondir = IconDir::read(Cursor::new(&data)).unwrap();
        assert_eq!(icondir.entries().len(), 3);
        for (read, written) in icondir.entries().iter().zip(icon.entries()) {
            assert_eq!(read.width(), written.width());
            assert_eq!(read.height(), written.height());
            assert_eq!(read.bits_per_pixel(), written.bits_per_pixel());
            assert_eq!(read.color_planes(), 1);
            assert_eq!(read.data(), written.data());
            assert_eq!(read.is_png(), written.is_png());
        }
        let bmp = icondir.entries()[1].bmp_info().unwrap();
        assert_eq!(bmp.width(), 32);
        assert_eq!(bmp.height(), 32);
        assert_eq!(icondir.entries()[1].num_colors(), 0);
    }
}

//===========================================================================//
