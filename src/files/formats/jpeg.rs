//! JPEG file format handler
//!
//! JPEG metadata storage:
//! - Exif is stored in an APP1 segment starting with `Exif\0\0`, followed by
//!   a TIFF structure
//! - XMP is stored in an APP1 segment with identifier
//!   `http://ns.adobe.com/xap/1.0/\0`; Extended XMP uses GUID-based chunks in
//!   additional APP1 segments
//! - IPTC is stored in an APP13 segment holding a `Photoshop 3.0` image
//!   resource block
//! - Standard segment size limit: 64KB (65535 bytes including the length)

use crate::codec::iptc::PHOTOSHOP_SIGNATURE;
use crate::core::error::{MetaError, MetaResult};
use crate::files::handler::{FileHandler, RawMetadata};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// JPEG segment markers
const MARKER_SOI: u8 = 0xD8; // Start of Image
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP13: u8 = 0xED;
const MARKER_APP15: u8 = 0xEF;
const MARKER_SOS: u8 = 0xDA; // Start of Scan
const MARKER_EOI: u8 = 0xD9; // End of Image

/// XMP namespace identifier in APP1 segment
const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// Extended XMP namespace identifier
const EXTENDED_XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/ext/\0";

/// Exif signature in APP1 segment
const EXIF_SIGNATURE: &[u8] = b"Exif\0\x00";
const EXIF_SIGNATURE_ALT: &[u8] = b"Exif\0\xFF";
const EXIF_SIGNATURE_LENGTH: usize = 6;

/// Maximum content size of a segment (64KB - 2 bytes for length)
const MAX_SEGMENT_SIZE: usize = 65533;

/// JPEG file handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHandler;

impl FileHandler for JpegHandler {
    /// Check if this is a valid JPEG file:
    /// 1. Check for SOI marker (0xFFD8) at offset 0
    /// 2. Skip any 0xFF padding bytes
    /// 3. Validate the second marker ID
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<bool> {
        let pos = reader.stream_position()?;

        // Read up to 100 bytes for validation
        let mut buffer = [0u8; 100];
        let bytes_read = reader.read(&mut buffer)?;
        reader.seek(SeekFrom::Start(pos))?;

        if bytes_read < 2 {
            return Ok(false);
        }

        // Offset 0 must have the SOI marker (0xFFD8)
        if buffer[0] != 0xFF || buffer[1] != MARKER_SOI {
            return Ok(false);
        }

        // Skip 0xFF padding and high order 0xFF of next marker
        let mut buffer_pos = 2;
        while buffer_pos < bytes_read && buffer[buffer_pos] == 0xFF {
            buffer_pos += 1;
        }

        // Nothing but 0xFF bytes after SOI, close enough
        if buffer_pos >= bytes_read {
            return Ok(true);
        }

        let id = buffer[buffer_pos];
        if id >= 0xDD {
            return Ok(true);
        }

        // Invalid markers: standalone markers (0xD0-0xD7 RST, 0xD8 SOI, 0xDA SOS, 0xDC DNL)
        // and anything below 0xC0
        if id < 0xC0 || (id & 0xF8) == 0xD0 || id == 0xD8 || id == 0xDA || id == 0xDC {
            return Ok(false);
        }

        Ok(true)
    }

    fn read_metadata<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<RawMetadata> {
        Self::read_segments(reader)
    }

    fn write_metadata<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()> {
        Self::write_segments(reader, writer, meta)
    }

    fn format_name(&self) -> &'static str {
        "JPEG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg", "jpeg"]
    }
}

/// Kind of an APP segment, from its marker and signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppSegment {
    Exif,
    Xmp,
    ExtendedXmp,
    Photoshop,
    Other,
}

impl AppSegment {
    fn classify(marker: u8, data: &[u8]) -> Self {
        match marker {
            MARKER_APP1 if data.starts_with(XMP_NAMESPACE) => AppSegment::Xmp,
            MARKER_APP1 if data.starts_with(EXTENDED_XMP_NAMESPACE) => AppSegment::ExtendedXmp,
            MARKER_APP1
                if data.len() >= EXIF_SIGNATURE_LENGTH
                    && (data[..EXIF_SIGNATURE_LENGTH] == *EXIF_SIGNATURE
                        || data[..EXIF_SIGNATURE_LENGTH] == *EXIF_SIGNATURE_ALT) =>
            {
                AppSegment::Exif
            }
            MARKER_APP13 if data.starts_with(PHOTOSHOP_SIGNATURE) => AppSegment::Photoshop,
            _ => AppSegment::Other,
        }
    }
}

fn is_eof(err: &MetaError) -> bool {
    matches!(err, MetaError::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof)
}

impl JpegHandler {
    /// Collect the Exif, IPTC and XMP blocks of a JPEG file
    pub fn read_segments<R: Read + Seek>(reader: &mut R) -> MetaResult<RawMetadata> {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header)?;
        if header[0] != 0xFF || header[1] != MARKER_SOI {
            return Err(MetaError::CorruptData("Not a valid JPEG file".to_string()));
        }

        let mut meta = RawMetadata::default();
        let mut extended_xmp_parts: Vec<(u32, Vec<u8>)> = Vec::new();

        loop {
            let marker = match Self::find_marker(reader) {
                Ok(m) => m,
                Err(e) if is_eof(&e) => break,
                Err(e) => return Err(e),
            };
            if marker == MARKER_EOI || marker == MARKER_SOS {
                break;
            }

            if !(MARKER_APP0..=MARKER_APP15).contains(&marker) {
                // Skip other segments
                let length = Self::read_segment_length(reader)?;
                reader.seek(SeekFrom::Current(length as i64 - 2))?;
                continue;
            }

            let Some(data) = Self::read_app_segment(reader)? else {
                continue;
            };
            let kind = AppSegment::classify(marker, &data);
            log::debug!("JPEG APP{} segment: {:?}, {} bytes", marker - MARKER_APP0, kind, data.len());
            match kind {
                AppSegment::Exif if meta.exif.is_none() => {
                    meta.exif = Some(data[EXIF_SIGNATURE_LENGTH..].to_vec());
                }
                AppSegment::Xmp => {
                    let packet = String::from_utf8(data[XMP_NAMESPACE.len()..].to_vec())
                        .map_err(|e| {
                            MetaError::ParseError(format!("Invalid UTF-8 in XMP: {}", e))
                        })?;
                    meta.xmp = Some(packet);
                }
                AppSegment::ExtendedXmp => {
                    if let Some(part) = Self::extract_extended_xmp_data(&data) {
                        extended_xmp_parts.push(part);
                    }
                }
                AppSegment::Photoshop => match meta.iptc.as_mut() {
                    // Resource blocks may be split over several segments
                    Some(block) => block.extend_from_slice(&data[PHOTOSHOP_SIGNATURE.len()..]),
                    None => meta.iptc = Some(data),
                },
                _ => {}
            }
        }

        if !extended_xmp_parts.is_empty() {
            let packet = String::from_utf8(Self::reconstruct_extended_xmp(extended_xmp_parts))
                .map_err(|e| MetaError::ParseError(format!("Invalid UTF-8 in XMP: {}", e)))?;
            meta.xmp = Some(packet);
        }

        Ok(meta)
    }

    /// Copy a JPEG file, replacing its metadata segments
    ///
    /// New segments are written right after the leading APP0 segments:
    /// Exif first, then XMP, then the Photoshop resource block.
    pub fn write_segments<R: Read + Seek, W: Write>(
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()> {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header)?;
        if header[0] != 0xFF || header[1] != MARKER_SOI {
            return Err(MetaError::CorruptData("Not a valid JPEG file".to_string()));
        }
        writer.write_all(&header)?;

        // Copy any leading APP0 marker segments
        while let Ok(marker) = Self::find_marker(reader) {
            if marker != MARKER_APP0 {
                // Not an APP0 segment, back up to the marker
                reader.seek(SeekFrom::Current(-2))?;
                break;
            }
            Self::copy_segment(reader, writer, marker)?;
        }

        if let Some(exif) = meta.exif.as_deref().filter(|d| !d.is_empty()) {
            Self::write_segment(writer, MARKER_APP1, &[EXIF_SIGNATURE, exif])?;
        }
        if let Some(xmp) = meta.xmp.as_deref().filter(|d| !d.is_empty()) {
            Self::write_segment(writer, MARKER_APP1, &[XMP_NAMESPACE, xmp.as_bytes()])?;
        }
        if let Some(iptc) = meta.iptc.as_deref().filter(|d| !d.is_empty()) {
            Self::write_segment(writer, MARKER_APP13, &[iptc])?;
        }

        // Copy remaining segments, skipping old metadata, until SOS or EOI
        loop {
            let marker = match Self::find_marker(reader) {
                Ok(m) => m,
                Err(e) if is_eof(&e) => break,
                Err(e) => return Err(e),
            };

            // Quit at the first SOS marker or at EOI
            if marker == MARKER_SOS || marker == MARKER_EOI {
                reader.seek(SeekFrom::Current(-2))?;
                break;
            }

            if (MARKER_APP0..=MARKER_APP15).contains(&marker) {
                let length = Self::read_segment_length(reader)?;
                let mut data = vec![0u8; (length as usize).saturating_sub(2)];
                reader.read_exact(&mut data)?;
                if AppSegment::classify(marker, &data) == AppSegment::Other {
                    writer.write_all(&[0xFF, marker])?;
                    writer.write_all(&length.to_be_bytes())?;
                    writer.write_all(&data)?;
                }
            } else {
                Self::copy_segment(reader, writer, marker)?;
            }
        }

        // The remainder holds the SOS segment, scan data and EOI marker
        io::copy(reader, writer)?;
        Ok(())
    }

    fn copy_segment<R: Read, W: Write>(reader: &mut R, writer: &mut W, marker: u8) -> MetaResult<()> {
        writer.write_all(&[0xFF, marker])?;
        let length = Self::read_segment_length(reader)?;
        writer.write_all(&length.to_be_bytes())?;

        let mut buffer = vec![0u8; (length as usize).saturating_sub(2)];
        reader.read_exact(&mut buffer)?;
        writer.write_all(&buffer)?;
        Ok(())
    }

    /// Write one segment whose content is the concatenation of `parts`
    fn write_segment<W: Write>(writer: &mut W, marker: u8, parts: &[&[u8]]) -> MetaResult<()> {
        let content_len: usize = parts.iter().map(|p| p.len()).sum();
        if content_len > MAX_SEGMENT_SIZE {
            return Err(MetaError::NotSupported(format!(
                "JPEG segment of {} bytes exceeds the 64KB limit",
                content_len
            )));
        }
        writer.write_all(&[0xFF, marker])?;
        writer.write_all(&((content_len + 2) as u16).to_be_bytes())?;
        for part in parts {
            writer.write_all(part)?;
        }
        Ok(())
    }

    /// Find the next JPEG marker
    fn find_marker<R: Read>(reader: &mut R) -> MetaResult<u8> {
        let mut buffer = [0u8; 1];
        loop {
            reader.read_exact(&mut buffer)?;
            if buffer[0] == 0xFF {
                reader.read_exact(&mut buffer)?;
                if buffer[0] != 0x00 && buffer[0] != 0xFF {
                    return Ok(buffer[0]);
                }
            }
        }
    }

    /// Read segment length (2 bytes, big-endian)
    fn read_segment_length<R: Read>(reader: &mut R) -> MetaResult<u16> {
        let mut length_bytes = [0u8; 2];
        reader.read_exact(&mut length_bytes)?;
        Ok(u16::from_be_bytes(length_bytes))
    }

    /// Read the content of an APP segment
    fn read_app_segment<R: Read>(reader: &mut R) -> MetaResult<Option<Vec<u8>>> {
        let length = Self::read_segment_length(reader)?;
        if length < 2 {
            return Ok(None);
        }

        let mut data = vec![0u8; length as usize - 2];
        reader.read_exact(&mut data)?;
        Ok(Some(data))
    }

    /// Extract an Extended XMP chunk: 32-byte GUID, offset, total size, data
    fn extract_extended_xmp_data(segment_data: &[u8]) -> Option<(u32, Vec<u8>)> {
        let offset_start = EXTENDED_XMP_NAMESPACE.len() + 32;
        let offset = segment_data.get(offset_start..offset_start + 4)?;
        let offset = u32::from_be_bytes([offset[0], offset[1], offset[2], offset[3]]);
        let data = segment_data.get(offset_start + 8..)?;
        Some((offset, data.to_vec()))
    }

    /// Reconstruct Extended XMP from chunks
    fn reconstruct_extended_xmp(mut chunks: Vec<(u32, Vec<u8>)>) -> Vec<u8> {
        chunks.sort_by_key(|(offset, _)| *offset);
        chunks.into_iter().flat_map(|(_, data)| data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // Minimal valid JPEG file with no metadata (SOI + EOI)
    fn create_minimal_jpeg() -> Vec<u8> {
        vec![0xFF, MARKER_SOI, 0xFF, MARKER_EOI]
    }

    fn segment(marker: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((content.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(content);
        out
    }

    #[test]
    fn test_can_handle() {
        let mut reader = Cursor::new(create_minimal_jpeg());
        assert!(JpegHandler.can_handle(&mut reader).unwrap());
        let mut reader = Cursor::new(vec![0x89, 0x50, 0x4E, 0x47]);
        assert!(!JpegHandler.can_handle(&mut reader).unwrap());
    }

    #[test]
    fn test_read_no_metadata() {
        let mut reader = Cursor::new(create_minimal_jpeg());
        let meta = JpegHandler.read_metadata(&mut reader).unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn test_invalid_jpeg() {
        let mut reader = Cursor::new(vec![0x00, 0x01, 0x02, 0x03]);
        assert!(JpegHandler.read_metadata(&mut reader).is_err());
    }

    #[test]
    fn test_write_replaces_metadata_segments() {
        let mut jpeg = vec![0xFF, MARKER_SOI];
        jpeg.extend(segment(MARKER_APP0, b"JFIF\0\x01\x01"));
        jpeg.extend(segment(MARKER_APP1, b"Exif\0\0old"));
        jpeg.extend(segment(0xE2, b"ICC_PROFILE\0"));
        jpeg.extend(segment(0xDB, &[0u8; 4]));
        jpeg.extend_from_slice(&[0xFF, MARKER_SOS, 0x00, 0x02, 0x12, 0x34, 0xFF, MARKER_EOI]);

        let meta = RawMetadata {
            exif: Some(b"II*\0new".to_vec()),
            iptc: None,
            xmp: Some("<x:xmpmeta/>".to_string()),
        };
        let mut out = Vec::new();
        JpegHandler
            .write_metadata(&mut Cursor::new(jpeg), &mut out, &meta)
            .unwrap();

        let mut expected = vec![0xFF, MARKER_SOI];
        expected.extend(segment(MARKER_APP0, b"JFIF\0\x01\x01"));
        expected.extend(segment(MARKER_APP1, b"Exif\0\0II*\0new"));
        let mut xmp = XMP_NAMESPACE.to_vec();
        xmp.extend_from_slice(b"<x:xmpmeta/>");
        expected.extend(segment(MARKER_APP1, &xmp));
        expected.extend(segment(0xE2, b"ICC_PROFILE\0"));
        expected.extend(segment(0xDB, &[0u8; 4]));
        expected.extend_from_slice(&[0xFF, MARKER_SOS, 0x00, 0x02, 0x12, 0x34, 0xFF, MARKER_EOI]);
        assert_eq!(out, expected);

        let read = JpegHandler.read_metadata(&mut Cursor::new(out)).unwrap();
        assert_eq!(read, meta);
    }

    #[test]
    fn test_photoshop_block() {
        let mut block = PHOTOSHOP_SIGNATURE.to_vec();
        block.extend_from_slice(b"8BIM");
        let mut out = Vec::new();
        let meta = RawMetadata {
            iptc: Some(block.clone()),
            ..Default::default()
        };
        JpegHandler
            .write_metadata(&mut Cursor::new(create_minimal_jpeg()), &mut out, &meta)
            .unwrap();
        let read = JpegHandler.read_metadata(&mut Cursor::new(out)).unwrap();
        assert_eq!(read.iptc, Some(block));
    }

    #[test]
    fn test_oversized_segment() {
        let meta = RawMetadata {
            xmp: Some("x".repeat(MAX_SEGMENT_SIZE)),
            ..Default::default()
        };
        let mut out = Vec::new();
        let result =
            JpegHandler.write_metadata(&mut Cursor::new(create_minimal_jpeg()), &mut out, &meta);
        assert!(matches!(result, Err(MetaError::NotSupported(_))));
    }

    #[test]
    fn test_extended_xmp_chunks() {
        let chunk = |offset: u32, data: &[u8]| {
            let mut seg = EXTENDED_XMP_NAMESPACE.to_vec();
            seg.extend_from_slice(&[b'0'; 32]);
            seg.extend_from_slice(&offset.to_be_bytes());
            seg.extend_from_slice(&6u32.to_be_bytes());
            seg.extend_from_slice(data);
            seg
        };
        let mut jpeg = vec![0xFF, MARKER_SOI];
        jpeg.extend(segment(MARKER_APP1, &chunk(3, b"def")));
        jpeg.extend(segment(MARKER_APP1, &chunk(0, b"abc")));
        jpeg.extend_from_slice(&[0xFF, MARKER_EOI]);

        let meta = JpegHandler.read_metadata(&mut Cursor::new(jpeg)).unwrap();
        assert_eq!(meta.xmp.as_deref(), Some("abcdef"));
    }
}
