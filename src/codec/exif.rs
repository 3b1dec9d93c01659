//! Exif codec
//!
//! Exif is stored as a TIFF structure: an 8-byte header followed by a chain
//! of IFDs. IFD0 holds the `Image` group and points to the `Photo` and
//! `GPSInfo` sub-IFDs; `Photo` points to the `Iop` sub-IFD. IFD1, if present,
//! holds the `Thumbnail` group.
//!
//! Entries of a sub-IFD are stored right after the pointer entry that
//! references them, so the store reads in the same order as the file.

use std::collections::HashSet;

use crate::core::error::{MetaError, MetaResult};
use crate::core::key::ExifKey;
use crate::core::metadata::ExifData;
use crate::core::tags::exif::{
    self as exif_tags, TAG_EXIF_IFD, TAG_GPS_IFD, TAG_IOP_IFD, TAG_JPEG_IF_LENGTH,
    TAG_JPEG_IF_OFFSET,
};
use crate::core::tags::ExifGroup;
use crate::types::value::ValueData;
use crate::types::{CharsetId, Rational, TypeId, Value};

/// TIFF header signatures
const TIFF_SIGNATURE_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00]; // II/42
const TIFF_SIGNATURE_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A]; // MM/42

/// Size of an IFD entry in bytes
const IFD_ENTRY_SIZE: usize = 12;

/// Byte order of a TIFF structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    fn signature(self) -> &'static [u8] {
        match self {
            ByteOrder::LittleEndian => TIFF_SIGNATURE_LE,
            ByteOrder::BigEndian => TIFF_SIGNATURE_BE,
        }
    }

    fn read_u16(self, bytes: &[u8]) -> MetaResult<u16> {
        let b: [u8; 2] = bytes
            .get(..2)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| MetaError::CorruptData("Not enough bytes for u16".to_string()))?;
        Ok(match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        })
    }

    fn read_u32(self, bytes: &[u8]) -> MetaResult<u32> {
        let b: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| MetaError::CorruptData("Not enough bytes for u32".to_string()))?;
        Ok(match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        })
    }

    fn read_u64(self, bytes: &[u8]) -> MetaResult<u64> {
        let b: [u8; 8] = bytes
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| MetaError::CorruptData("Not enough bytes for u64".to_string()))?;
        Ok(match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(b),
            ByteOrder::BigEndian => u64::from_be_bytes(b),
        })
    }

    fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    fn write_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    fn write_u64(self, value: u64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}

/// IFD entry as stored on disk
struct IfdEntry {
    tag: u16,
    type_: u16,
    count: u32,
    /// Raw 4-byte value/offset field
    field: [u8; 4],
}

fn slice(data: &[u8], offset: usize, len: usize) -> MetaResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            MetaError::CorruptData(format!(
                "Offset {} length {} is outside the Exif data",
                offset, len
            ))
        })
}

/// Decode a TIFF structure into an Exif store
///
/// Returns the store and the byte order of the source, which the encoder
/// reuses.
pub fn decode(data: &[u8]) -> MetaResult<(ExifData, ByteOrder)> {
    let header = slice(data, 0, 8)?;
    let byte_order = if header[0..4] == *TIFF_SIGNATURE_LE {
        ByteOrder::LittleEndian
    } else if header[0..4] == *TIFF_SIGNATURE_BE {
        ByteOrder::BigEndian
    } else {
        return Err(MetaError::CorruptData("Not a valid TIFF header".to_string()));
    };

    let mut decoder = Decoder {
        data,
        byte_order,
        visited: HashSet::new(),
        exif: ExifData::new(),
    };

    let ifd0 = byte_order.read_u32(&header[4..8])?;
    let next = decoder.read_ifd(ifd0, ExifGroup::Image)?;
    if next != 0 {
        decoder.read_ifd(next, ExifGroup::Thumbnail)?;
    }

    log::debug!(
        "Decoded {} Exif entries ({:?})",
        decoder.exif.len(),
        byte_order
    );
    Ok((decoder.exif, byte_order))
}

struct Decoder<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    visited: HashSet<u32>,
    exif: ExifData,
}

impl Decoder<'_> {
    /// Read one IFD and its sub-IFDs; returns the next-IFD offset
    fn read_ifd(&mut self, offset: u32, group: ExifGroup) -> MetaResult<u32> {
        if !self.visited.insert(offset) {
            return Err(MetaError::CorruptData(format!(
                "IFD loop detected at offset {}",
                offset
            )));
        }
        log::debug!("Reading {} IFD at offset {}", group, offset);

        let start = offset as usize;
        let entry_count = self.byte_order.read_u16(slice(self.data, start, 2)?)? as usize;
        for i in 0..entry_count {
            let raw = slice(self.data, start + 2 + i * IFD_ENTRY_SIZE, IFD_ENTRY_SIZE)?;
            let entry = IfdEntry {
                tag: self.byte_order.read_u16(&raw[0..2])?,
                type_: self.byte_order.read_u16(&raw[2..4])?,
                count: self.byte_order.read_u32(&raw[4..8])?,
                field: [raw[8], raw[9], raw[10], raw[11]],
            };
            self.read_entry(&entry, group)?;
        }

        let next = slice(self.data, start + 2 + entry_count * IFD_ENTRY_SIZE, 4)?;
        self.byte_order.read_u32(next)
    }

    fn read_entry(&mut self, entry: &IfdEntry, group: ExifGroup) -> MetaResult<()> {
        let Some(type_id) = TypeId::from_tiff_code(entry.type_) else {
            log::debug!(
                "Skipping {} tag 0x{:04x} with unknown type {}",
                group,
                entry.tag,
                entry.type_
            );
            return Ok(());
        };

        let Some(size) = (entry.count as usize).checked_mul(type_id.size()) else {
            log::debug!("Skipping {} tag 0x{:04x}: count overflow", group, entry.tag);
            return Ok(());
        };
        let raw = if size <= 4 {
            &entry.field[..size]
        } else {
            let offset = self.byte_order.read_u32(&entry.field)? as usize;
            match slice(self.data, offset, size) {
                Ok(raw) => raw,
                Err(_) => {
                    log::debug!(
                        "Skipping {} tag 0x{:04x}: data out of bounds",
                        group,
                        entry.tag
                    );
                    return Ok(());
                }
            }
        };

        let value = if type_id == TypeId::Undefined
            && exif_tags::default_type(group, entry.tag) == TypeId::Comment
        {
            decode_comment(raw, self.byte_order)
        } else {
            decode_value(type_id, raw, entry.count as usize, self.byte_order)?
        };
        let sub_ifd = exif_tags::sub_ifd_group(group, entry.tag)
            .and_then(|sub| value.to_long(0).map(|offset| (sub, offset)));

        self.exif.add(ExifKey::new(group, entry.tag), value);

        if let Some((sub, offset)) = sub_ifd {
            let offset = u32::try_from(offset)
                .map_err(|_| MetaError::CorruptData(format!("Bad {} IFD offset", sub)))?;
            self.read_ifd(offset, sub)?;
        }
        Ok(())
    }
}

fn decode_value(
    type_id: TypeId,
    raw: &[u8],
    count: usize,
    byte_order: ByteOrder,
) -> MetaResult<Value> {
    let size = type_id.size();
    let components = || raw.chunks_exact(size).take(count);

    let data = match type_id {
        TypeId::UnsignedByte => ValueData::Ints(raw.iter().map(|b| *b as i64).collect()),
        TypeId::SignedByte => ValueData::Ints(raw.iter().map(|b| *b as i8 as i64).collect()),
        TypeId::Undefined => ValueData::Bytes(raw.to_vec()),
        TypeId::AsciiString => {
            let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
            ValueData::Text(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        TypeId::UnsignedShort => ValueData::Ints(
            components()
                .map(|c| byte_order.read_u16(c).map(|v| v as i64))
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::SignedShort => ValueData::Ints(
            components()
                .map(|c| byte_order.read_u16(c).map(|v| v as i16 as i64))
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::UnsignedLong | TypeId::TiffIfd => ValueData::Ints(
            components()
                .map(|c| byte_order.read_u32(c).map(|v| v as i64))
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::SignedLong => ValueData::Ints(
            components()
                .map(|c| byte_order.read_u32(c).map(|v| v as i32 as i64))
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::UnsignedRational | TypeId::SignedRational => ValueData::Rationals(
            components()
                .map(|c| {
                    Ok(Rational::new(
                        byte_order.read_u32(&c[0..4])? as i32,
                        byte_order.read_u32(&c[4..8])? as i32,
                    ))
                })
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::TiffFloat => ValueData::Floats(
            components()
                .map(|c| byte_order.read_u32(c).map(|v| f32::from_bits(v) as f64))
                .collect::<MetaResult<_>>()?,
        ),
        TypeId::TiffDouble => ValueData::Floats(
            components()
                .map(|c| byte_order.read_u64(c).map(f64::from_bits))
                .collect::<MetaResult<_>>()?,
        ),
        other => {
            return Err(MetaError::InternalError(format!(
                "{} is not a TIFF type",
                other
            )))
        }
    };
    Ok(Value::with_data(type_id, data))
}

/// User comment: 8-byte character code followed by the text
fn decode_comment(raw: &[u8], byte_order: ByteOrder) -> Value {
    let (code, body) = raw.split_at(raw.len().min(8));
    let charset = CharsetId::from_code(code);
    let text = match charset {
        CharsetId::Unicode => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .filter_map(|c| byte_order.read_u16(c).ok())
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(body).into_owned(),
    };
    let text = text.trim_end_matches(['\0', ' ']).to_string();
    Value::with_data(TypeId::Comment, ValueData::Comment(charset, text))
}

/// Encode a value as (TIFF type code, count, bytes)
fn encode_value(value: &Value, byte_order: ByteOrder) -> (u16, u32, Vec<u8>) {
    let type_id = value.type_id();
    let mut out = Vec::new();
    let count = match value.data() {
        ValueData::Empty => 0,
        ValueData::Ints(ints) => {
            for v in ints {
                match type_id.size() {
                    1 => out.push(*v as u8),
                    2 => out.extend_from_slice(&byte_order.write_u16(*v as u16)),
                    _ => out.extend_from_slice(&byte_order.write_u32(*v as u32)),
                }
            }
            ints.len()
        }
        ValueData::Floats(floats) => {
            for v in floats {
                if type_id == TypeId::TiffFloat {
                    out.extend_from_slice(&byte_order.write_u32((*v as f32).to_bits()));
                } else {
                    out.extend_from_slice(&byte_order.write_u64(v.to_bits()));
                }
            }
            floats.len()
        }
        ValueData::Rationals(rationals) => {
            for r in rationals {
                out.extend_from_slice(&byte_order.write_u32(r.numerator as u32));
                out.extend_from_slice(&byte_order.write_u32(r.denominator as u32));
            }
            rationals.len()
        }
        ValueData::Bytes(bytes) => {
            out.extend_from_slice(bytes);
            bytes.len()
        }
        ValueData::Comment(charset, text) => {
            out.extend_from_slice(charset.code());
            if *charset == CharsetId::Unicode {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&byte_order.write_u16(unit));
                }
            } else {
                out.extend_from_slice(text.as_bytes());
            }
            out.len()
        }
        _ => {
            out.extend_from_slice(value.to_string().as_bytes());
            out.push(0);
            out.len()
        }
    };
    (type_id.tiff_code(), count as u32, out)
}

/// Entry ready for layout
struct OutEntry {
    tag: u16,
    type_: u16,
    count: u32,
    bytes: Vec<u8>,
}

impl OutEntry {
    fn pointer(tag: u16) -> Self {
        Self {
            tag,
            type_: TypeId::UnsignedLong.tiff_code(),
            count: 1,
            bytes: vec![0; 4],
        }
    }

    /// Bytes needed outside the entry, padded to even
    fn external_size(&self) -> usize {
        if self.bytes.len() <= 4 {
            0
        } else {
            self.bytes.len() + self.bytes.len() % 2
        }
    }
}

fn ifd_size(entries: &[OutEntry]) -> usize {
    2 + entries.len() * IFD_ENTRY_SIZE
        + 4
        + entries.iter().map(OutEntry::external_size).sum::<usize>()
}

/// Encode an Exif store as a TIFF structure
///
/// Pointer tags are recomputed and thumbnail data tags are dropped. Returns
/// an empty buffer when there is nothing to write.
pub fn encode(exif: &ExifData, byte_order: ByteOrder) -> MetaResult<Vec<u8>> {
    const ORDER: [ExifGroup; 5] = [
        ExifGroup::Image,
        ExifGroup::Photo,
        ExifGroup::Iop,
        ExifGroup::GpsInfo,
        ExifGroup::Thumbnail,
    ];
    let mut ifds: [Vec<OutEntry>; 5] = Default::default();

    for datum in exif {
        let key = datum.key();
        let tag = key.tag();
        let is_pointer = exif_tags::sub_ifd_group(key.group(), tag).is_some();
        let is_thumbnail_data = key.group() == ExifGroup::Thumbnail
            && (tag == TAG_JPEG_IF_OFFSET || tag == TAG_JPEG_IF_LENGTH);
        if is_pointer || is_thumbnail_data {
            continue;
        }
        let (type_, count, bytes) = encode_value(datum.value(), byte_order);
        let slot = ORDER.iter().position(|g| *g == key.group()).unwrap_or(0);
        ifds[slot].push(OutEntry {
            tag,
            type_,
            count,
            bytes,
        });
    }

    if ifds.iter().all(Vec::is_empty) {
        return Ok(Vec::new());
    }
    let [image, photo, iop, gps, _] = &mut ifds;
    if !iop.is_empty() {
        photo.push(OutEntry::pointer(TAG_IOP_IFD));
    }
    if !photo.is_empty() {
        image.push(OutEntry::pointer(TAG_EXIF_IFD));
    }
    if !gps.is_empty() {
        image.push(OutEntry::pointer(TAG_GPS_IFD));
    }
    for ifd in ifds.iter_mut() {
        ifd.sort_by_key(|e| e.tag);
    }

    // Offsets of each IFD; empty sub-IFDs are not written
    let mut offsets = [0usize; 5];
    let mut pos = 8;
    for (i, ifd) in ifds.iter().enumerate() {
        if i == 0 || !ifd.is_empty() {
            offsets[i] = pos;
            pos += ifd_size(ifd);
        }
    }

    let set_pointer = |ifd: &mut Vec<OutEntry>, tag: u16, offset: usize| {
        if let Some(entry) = ifd.iter_mut().find(|e| e.tag == tag) {
            entry.bytes = byte_order.write_u32(offset as u32).to_vec();
        }
    };
    let [o_image, o_photo, o_iop, o_gps, o_thumb] = offsets;
    {
        let [image, photo, _, _, _] = &mut ifds;
        set_pointer(photo, TAG_IOP_IFD, o_iop);
        set_pointer(image, TAG_EXIF_IFD, o_photo);
        set_pointer(image, TAG_GPS_IFD, o_gps);
    }

    let mut out = Vec::with_capacity(pos);
    out.extend_from_slice(byte_order.signature());
    out.extend_from_slice(&byte_order.write_u32(o_image as u32));
    for (i, ifd) in ifds.iter().enumerate() {
        if i != 0 && ifd.is_empty() {
            continue;
        }
        let next = if i == 0 && !ifds[4].is_empty() { o_thumb } else { 0 };
        write_ifd(&mut out, ifd, offsets[i], next, byte_order)?;
    }
    Ok(out)
}

fn write_ifd(
    out: &mut Vec<u8>,
    entries: &[OutEntry],
    offset: usize,
    next: usize,
    byte_order: ByteOrder,
) -> MetaResult<()> {
    if out.len() != offset {
        return Err(MetaError::InternalError(format!(
            "IFD layout mismatch: expected offset {}, at {}",
            offset,
            out.len()
        )));
    }
    let count = u16::try_from(entries.len())
        .map_err(|_| MetaError::SerializationError("Too many Exif entries".to_string()))?;
    out.extend_from_slice(&byte_order.write_u16(count));

    let mut data_offset = offset + 2 + entries.len() * IFD_ENTRY_SIZE + 4;
    let mut external = Vec::new();
    for entry in entries {
        out.extend_from_slice(&byte_order.write_u16(entry.tag));
        out.extend_from_slice(&byte_order.write_u16(entry.type_));
        out.extend_from_slice(&byte_order.write_u32(entry.count));
        if entry.bytes.len() <= 4 {
            let mut field = [0u8; 4];
            field[..entry.bytes.len()].copy_from_slice(&entry.bytes);
            out.extend_from_slice(&field);
        } else {
            out.extend_from_slice(&byte_order.write_u32(data_offset as u32));
            external.extend_from_slice(&entry.bytes);
            if entry.bytes.len() % 2 == 1 {
                external.push(0);
            }
            data_offset += entry.external_size();
        }
    }
    out.extend_from_slice(&byte_order.write_u32(next as u32));
    out.extend_from_slice(&external);
    Ok(())
}
