use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::io::{self, Write};
use std::time::SystemTime;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl CompressionMethod {
    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
        }
    }
}

/// Largest value a 32-bit size/offset field can hold before ZIP64 is needed.
pub const ZIP64_LIMIT: u64 = 0xFFFF_FFFF;
/// Largest entry count the classic EOCD can hold.
pub const ZIP64_ENTRY_LIMIT: u64 = 0xFFFF;

/// Version needed to extract: deflate
pub const VERSION_DEFLATE: u16 = 20;
/// Version needed to extract: ZIP64 extensions
pub const VERSION_ZIP64: u16 = 45;

/// General purpose flag bit 11: file name is UTF-8
pub const FLAG_UTF8: u16 = 1 << 11;

/// ZIP64 extended information extra field tag
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

#[cfg(unix)]
const HOST_SYSTEM: u16 = 3;
#[cfg(not(unix))]
const HOST_SYSTEM: u16 = 0;

/// "Version made by": host system in the high byte, spec version in the low byte.
pub fn version_made_by(zip64: bool) -> u16 {
    let version = if zip64 { VERSION_ZIP64 } else { VERSION_DEFLATE };
    (HOST_SYSTEM << 8) | version
}

/// MS-DOS packed date and time, as stored in both file headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable timestamp.
    pub const EPOCH: DosDateTime = DosDateTime {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// Encode a local calendar time. Years outside 1980..=2107 clamp to the
    /// nearest representable value; seconds are stored with 2s resolution.
    pub fn from_local(dt: &DateTime<Local>) -> Self {
        if dt.year() < 1980 {
            return Self::EPOCH;
        }
        if dt.year() > 2107 {
            return DosDateTime {
                time: (23 << 11) | (59 << 5) | 29,
                date: (127 << 9) | (12 << 5) | 31,
            };
        }
        let date = (((dt.year() - 1980) as u16) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
        let time = ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);
        DosDateTime { time, date }
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_local(&DateTime::<Local>::from(time))
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Build the classic EOCD, saturating fields that moved to the ZIP64 record.
    pub fn new(total_entries: u64, cd_size: u64, cd_offset: u64) -> Self {
        let entries = total_entries.min(ZIP64_ENTRY_LIMIT) as u16;
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size: cd_size.min(ZIP64_LIMIT) as u32,
            cd_offset: cd_offset.min(ZIP64_LIMIT) as u32,
            comment_len: 0,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn new(eocd64_offset: u64) -> Self {
        Self {
            disk_with_eocd64: 0,
            eocd64_offset,
            total_disks: 1,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u32::<LittleEndian>(self.disk_with_eocd64)?;
        out.write_u64::<LittleEndian>(self.eocd64_offset)?;
        out.write_u32::<LittleEndian>(self.total_disks)?;
        Ok(())
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn new(total_entries: u64, cd_size: u64, cd_offset: u64) -> Self {
        Self {
            // Size of the remaining record, excluding the signature and this field
            eocd64_size: (Self::MIN_SIZE - 12) as u64,
            version_made_by: version_made_by(true),
            version_needed: VERSION_ZIP64,
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u64::<LittleEndian>(self.eocd64_size)?;
        out.write_u16::<LittleEndian>(self.version_made_by)?;
        out.write_u16::<LittleEndian>(self.version_needed)?;
        out.write_u32::<LittleEndian>(self.disk_number)?;
        out.write_u32::<LittleEndian>(self.disk_with_cd)?;
        out.write_u64::<LittleEndian>(self.disk_entries)?;
        out.write_u64::<LittleEndian>(self.total_entries)?;
        out.write_u64::<LittleEndian>(self.cd_size)?;
        out.write_u64::<LittleEndian>(self.cd_offset)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Offset of the CRC-32 field inside a Local File Header; the compressed and
/// uncompressed sizes follow it directly.
pub const LFH_CRC_OFFSET: u64 = 14;

/// Length of the ZIP64 extra field written into local headers
/// (tag + size + uncompressed + compressed).
pub const LFH_ZIP64_EXTRA_LEN: usize = 20;

/// Metadata of one written entry, kept until the central directory is emitted.
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub modified: DosDateTime,
    pub external_attrs: u32,
    /// Whether the local header was written with a ZIP64 extra field.
    pub zip64_local: bool,
}

impl ZipFileEntry {
    pub fn flags(&self) -> u16 {
        if self.file_name.is_ascii() { 0 } else { FLAG_UTF8 }
    }

    /// Local File Header. CRC and sizes are whatever the entry currently
    /// holds; the writer emits placeholders first and patches them afterwards.
    pub fn write_local_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let name = self.file_name.as_bytes();
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(if self.zip64_local { VERSION_ZIP64 } else { VERSION_DEFLATE })?;
        out.write_u16::<LittleEndian>(self.flags())?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        self.write_crc_and_sizes(out)?;
        out.write_u16::<LittleEndian>(name_len(name)?)?;
        out.write_u16::<LittleEndian>(if self.zip64_local { LFH_ZIP64_EXTRA_LEN as u16 } else { 0 })?;
        out.write_all(name)?;
        if self.zip64_local {
            out.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            out.write_u16::<LittleEndian>(16)?;
            self.write_local_zip64_sizes(out)?;
        }
        Ok(())
    }

    /// The two u64 sizes of the local ZIP64 extra field (uncompressed first).
    pub fn write_local_zip64_sizes<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u64::<LittleEndian>(self.uncompressed_size)?;
        out.write_u64::<LittleEndian>(self.compressed_size)?;
        Ok(())
    }

    /// The 12 bytes at [`LFH_CRC_OFFSET`]: CRC-32, compressed size, uncompressed size.
    pub fn write_crc_and_sizes<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.crc32)?;
        if self.zip64_local {
            out.write_u32::<LittleEndian>(0xFFFFFFFF)?;
            out.write_u32::<LittleEndian>(0xFFFFFFFF)?;
        } else {
            out.write_u32::<LittleEndian>(self.compressed_size as u32)?;
            out.write_u32::<LittleEndian>(self.uncompressed_size as u32)?;
        }
        Ok(())
    }

    /// Offset of the ZIP64 extra payload (the two u64 sizes) relative to the
    /// start of the local header.
    pub fn local_zip64_sizes_offset(&self) -> u64 {
        (LFH_SIZE + self.file_name.len() + 4) as u64
    }

    /// Total length of the local header including name and extra field.
    pub fn local_header_len(&self) -> u64 {
        let extra = if self.zip64_local { LFH_ZIP64_EXTRA_LEN } else { 0 };
        (LFH_SIZE + self.file_name.len() + extra) as u64
    }

    /// Central Directory File Header for this entry.
    pub fn write_central_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let name = self.file_name.as_bytes();

        // Fields that overflow 32 bits move to the ZIP64 extra field, in this order
        let mut zip64_fields = Vec::new();
        let uncompressed = overflow(self.uncompressed_size, &mut zip64_fields);
        let compressed = overflow(self.compressed_size, &mut zip64_fields);
        let offset = overflow(self.lfh_offset, &mut zip64_fields);
        let zip64 = !zip64_fields.is_empty() || self.zip64_local;

        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(version_made_by(zip64))?;
        out.write_u16::<LittleEndian>(if zip64 { VERSION_ZIP64 } else { VERSION_DEFLATE })?;
        out.write_u16::<LittleEndian>(self.flags())?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(compressed)?;
        out.write_u32::<LittleEndian>(uncompressed)?;
        out.write_u16::<LittleEndian>(name_len(name)?)?;
        let extra_len = if zip64_fields.is_empty() { 0 } else { 4 + 8 * zip64_fields.len() };
        out.write_u16::<LittleEndian>(extra_len as u16)?;
        out.write_u16::<LittleEndian>(0)?; // file comment length
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.external_attrs)?;
        out.write_u32::<LittleEndian>(offset)?;
        out.write_all(name)?;
        if !zip64_fields.is_empty() {
            out.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            out.write_u16::<LittleEndian>((8 * zip64_fields.len()) as u16)?;
            for value in zip64_fields {
                out.write_u64::<LittleEndian>(value)?;
            }
        }
        Ok(())
    }
}

/// Returns the 32-bit field value, pushing the real value to `fields` when it
/// does not fit.
fn overflow(value: u64, fields: &mut Vec<u64>) -> u32 {
    if value >= ZIP64_LIMIT {
        fields.push(value);
        0xFFFFFFFF
    } else {
        value as u32
    }
}

fn name_len(name: &[u8]) -> io::Result<u16> {
    u16::try_from(name.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "entry name longer than 65535 bytes")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(name: &str) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Deflate,
            compressed_size: 4,
            uncompressed_size: 2,
            crc32: 0xDEADBEEF,
            lfh_offset: 0,
            modified: DosDateTime::EPOCH,
            external_attrs: 0,
            zip64_local: false,
        }
    }

    #[test]
    fn test_local_header_layout() {
        let e = entry("a.txt");
        let mut buf = Vec::new();
        e.write_local_header(&mut buf).unwrap();

        assert_eq!(buf.len() as u64, e.local_header_len());
        assert_eq!(&buf[0..4], LFH_SIGNATURE);
        assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 8);
        let crc_at = LFH_CRC_OFFSET as usize;
        assert_eq!(&buf[crc_at..crc_at + 4], &0xDEADBEEFu32.to_le_bytes());
        assert_eq!(u16::from_le_bytes([buf[26], buf[27]]), 5);
        assert_eq!(&buf[LFH_SIZE..], b"a.txt");
    }

    #[test]
    fn test_zip64_local_header_carries_sizes_in_extra() {
        let mut e = entry("big.bin");
        e.zip64_local = true;
        e.uncompressed_size = 5 << 30;
        e.compressed_size = 3 << 30;
        let mut buf = Vec::new();
        e.write_local_header(&mut buf).unwrap();

        assert_eq!(buf.len() as u64, e.local_header_len());
        assert_eq!(&buf[18..26], &[0xFF; 8]);
        let at = e.local_zip64_sizes_offset() as usize;
        assert_eq!(u64::from_le_bytes(buf[at..at + 8].try_into().unwrap()), 5 << 30);
        assert_eq!(u64::from_le_bytes(buf[at + 8..at + 16].try_into().unwrap()), 3 << 30);
    }

    #[test]
    fn test_central_header_moves_large_offset_to_extra() {
        let mut e = entry("late.txt");
        e.lfh_offset = 6 << 30;
        let mut buf = Vec::new();
        e.write_central_header(&mut buf).unwrap();

        assert_eq!(&buf[0..4], CDFH_SIGNATURE);
        assert_eq!(buf.len(), CDFH_MIN_SIZE + "late.txt".len() + 12);
        assert_eq!(&buf[42..46], &[0xFF; 4]);
        assert_eq!(u16::from_le_bytes([buf[30], buf[31]]), 12);
    }

    #[test]
    fn test_non_ascii_names_set_utf8_flag() {
        assert_eq!(entry("plain.txt").flags(), 0);
        assert_eq!(entry("café.txt").flags(), FLAG_UTF8);
    }

    #[test]
    fn test_eocd_saturates_for_zip64() {
        let mut buf = Vec::new();
        EndOfCentralDirectory::new(70_000, 10, 20).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        // disk entries, total entries
        assert_eq!(&buf[8..12], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf[12..20], &[10, 0, 0, 0, 20, 0, 0, 0]);

        let mut buf = Vec::new();
        EndOfCentralDirectory::new(2, 10, 20).write_to(&mut buf).unwrap();
        assert_eq!(&buf[8..12], &[2, 0, 2, 0]);

        let mut buf = Vec::new();
        Zip64EOCD::new(70_000, 10, 20).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Zip64EOCD::MIN_SIZE);
        let mut buf = Vec::new();
        Zip64EOCDLocator::new(0).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Zip64EOCDLocator::SIZE);
    }

    #[test]
    fn test_dos_date_time_encoding() {
        let dt = Local.with_ymd_and_hms(2024, 3, 15, 13, 45, 31).unwrap();
        let dos = DosDateTime::from_local(&dt);
        assert_eq!(dos.date >> 9, 44);
        assert_eq!((dos.date >> 5) & 0x0F, 3);
        assert_eq!(dos.date & 0x1F, 15);
        assert_eq!(dos.time >> 11, 13);
        assert_eq!((dos.time >> 5) & 0x3F, 45);
        assert_eq!(dos.time & 0x1F, 15);

        let old = Local.with_ymd_and_hms(1970, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(DosDateTime::from_local(&old), DosDateTime::EPOCH);
    }
}
