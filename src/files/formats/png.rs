//! PNG file format handler
//!
//! PNG metadata storage:
//! - Exif is stored in an eXIf chunk holding a bare TIFF structure
//! - XMP Packet is stored in iTXt chunk with keyword "XML:com.adobe.xmp"
//! - iTXt chunk format: keyword (null-terminated) + compression flag + compression method + language tag + translated keyword + text
//! - For XMP, compression flag is 0 (uncompressed)
//!
//! IPTC has no native PNG chunk and is not written.

use crate::core::error::{MetaError, MetaResult};
use crate::files::handler::{FileHandler, RawMetadata};
use std::io::{Read, Seek, Write};

/// PNG file signature
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// XMP keyword in iTXt chunk
const XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp\0";

const CHUNK_TYPE_IHDR: &[u8; 4] = b"IHDR";
const CHUNK_TYPE_ITXT: &[u8; 4] = b"iTXt";
const CHUNK_TYPE_EXIF: &[u8; 4] = b"eXIf";
const CHUNK_TYPE_IEND: &[u8; 4] = b"IEND";

/// PNG file handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHandler;

impl FileHandler for PngHandler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<bool> {
        let pos = reader.stream_position()?;
        let mut signature = [0u8; 8];
        let matched = reader.read_exact(&mut signature).is_ok() && signature == PNG_SIGNATURE;
        reader.seek(std::io::SeekFrom::Start(pos))?;
        Ok(matched)
    }

    fn read_metadata<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<RawMetadata> {
        Self::read_chunks(reader)
    }

    fn write_metadata<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()> {
        Self::write_chunks(reader, writer, meta)
    }

    fn format_name(&self) -> &'static str {
        "PNG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png"]
    }
}

#[derive(Debug, Clone)]
struct PngChunk {
    chunk_type: [u8; 4],
    data: Vec<u8>,
    crc: u32,
}

impl PngChunk {
    fn write<W: Write>(&self, writer: &mut W) -> MetaResult<()> {
        writer.write_all(&(self.data.len() as u32).to_be_bytes())?;
        writer.write_all(&self.chunk_type)?;
        writer.write_all(&self.data)?;
        writer.write_all(&self.crc.to_be_bytes())?;
        Ok(())
    }
}

impl PngHandler {
    /// Collect the eXIf and XMP iTXt chunks of a PNG file
    pub fn read_chunks<R: Read>(reader: &mut R) -> MetaResult<RawMetadata> {
        Self::check_signature(reader)?;

        let mut meta = RawMetadata::default();
        loop {
            let chunk = match Self::read_chunk(reader) {
                Ok(chunk) => chunk,
                Err(MetaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // End of file reached unexpectedly
                    break;
                }
                Err(e) => return Err(e),
            };

            match &chunk.chunk_type {
                CHUNK_TYPE_IEND => break,
                CHUNK_TYPE_EXIF if meta.exif.is_none() => {
                    log::debug!("PNG eXIf chunk, {} bytes", chunk.data.len());
                    meta.exif = Some(chunk.data);
                }
                CHUNK_TYPE_ITXT => {
                    if let Some(xmp_data) = Self::extract_xmp_from_itxt(&chunk.data)? {
                        let xmp_str = String::from_utf8(xmp_data).map_err(|e| {
                            MetaError::ParseError(format!("Invalid UTF-8 in XMP: {}", e))
                        })?;
                        log::debug!("PNG XMP iTXt chunk, {} bytes", xmp_str.len());
                        meta.xmp = Some(xmp_str);
                    }
                }
                _ => {}
            }
        }

        Ok(meta)
    }

    /// Copy a PNG file, replacing its eXIf and XMP chunks
    ///
    /// The new chunks follow IHDR directly, which keeps them ahead of IDAT.
    pub fn write_chunks<R: Read, W: Write>(
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()> {
        if meta.iptc.as_ref().is_some_and(|block| !block.is_empty()) {
            return Err(MetaError::NotSupported("IPTC in PNG".to_string()));
        }

        Self::check_signature(reader)?;
        writer.write_all(PNG_SIGNATURE)?;

        loop {
            let chunk = Self::read_chunk(reader)?;

            let is_old_metadata = match &chunk.chunk_type {
                CHUNK_TYPE_EXIF => true,
                CHUNK_TYPE_ITXT => Self::is_xmp_itxt(&chunk.data),
                _ => false,
            };
            if !is_old_metadata {
                chunk.write(writer)?;
            }

            if chunk.chunk_type == *CHUNK_TYPE_IHDR {
                if let Some(exif) = meta.exif.as_deref().filter(|d| !d.is_empty()) {
                    Self::write_chunk(writer, CHUNK_TYPE_EXIF, exif)?;
                }
                if let Some(xmp) = meta.xmp.as_deref().filter(|d| !d.is_empty()) {
                    Self::write_xmp_itxt_chunk(writer, xmp.as_bytes())?;
                }
            }

            if chunk.chunk_type == *CHUNK_TYPE_IEND {
                break;
            }
        }

        Ok(())
    }

    fn check_signature<R: Read>(reader: &mut R) -> MetaResult<()> {
        let mut signature = [0u8; 8];
        reader.read_exact(&mut signature)?;
        if signature != PNG_SIGNATURE {
            return Err(MetaError::CorruptData("Not a valid PNG file".to_string()));
        }
        Ok(())
    }

    /// Read a PNG chunk
    fn read_chunk<R: Read>(reader: &mut R) -> MetaResult<PngChunk> {
        // Read chunk length (4 bytes, big-endian)
        let mut length_bytes = [0u8; 4];
        reader.read_exact(&mut length_bytes)?;
        let length = u32::from_be_bytes(length_bytes);

        let mut chunk_type = [0u8; 4];
        reader.read_exact(&mut chunk_type)?;

        let mut data = vec![0u8; length as usize];
        reader.read_exact(&mut data)?;

        let mut crc_bytes = [0u8; 4];
        reader.read_exact(&mut crc_bytes)?;
        let crc = u32::from_be_bytes(crc_bytes);

        Ok(PngChunk {
            chunk_type,
            data,
            crc,
        })
    }

    /// Check if an iTXt chunk contains XMP data
    fn is_xmp_itxt(data: &[u8]) -> bool {
        data.starts_with(XMP_KEYWORD)
    }

    /// Extract XMP data from an iTXt chunk
    fn extract_xmp_from_itxt(data: &[u8]) -> MetaResult<Option<Vec<u8>>> {
        if !Self::is_xmp_itxt(data) {
            return Ok(None);
        }

        let keyword_len = XMP_KEYWORD.len();
        if data.len() < keyword_len + 2 {
            return Ok(None);
        }

        // XMP should be uncompressed
        if data[keyword_len] != 0 {
            return Err(MetaError::NotSupported(
                "Compressed XMP in PNG".to_string(),
            ));
        }

        // Skip language tag and translated keyword, both null-terminated
        let mut text_start = keyword_len + 2;
        for _ in 0..2 {
            match data[text_start..].iter().position(|&b| b == 0) {
                Some(end) => text_start += end + 1,
                None => return Ok(None),
            }
        }

        Ok(Some(data[text_start..].to_vec()))
    }

    /// Write an XMP iTXt chunk
    fn write_xmp_itxt_chunk<W: Write>(writer: &mut W, xmp_data: &[u8]) -> MetaResult<()> {
        let mut chunk_data = Vec::with_capacity(XMP_KEYWORD.len() + 4 + xmp_data.len());
        chunk_data.extend_from_slice(XMP_KEYWORD); // keyword
        chunk_data.push(0); // compression flag (0 = uncompressed)
        chunk_data.push(0); // compression method
        chunk_data.push(0); // language tag (empty, null-terminated)
        chunk_data.push(0); // translated keyword (empty, null-terminated)
        chunk_data.extend_from_slice(xmp_data);
        Self::write_chunk(writer, CHUNK_TYPE_ITXT, &chunk_data)
    }

    fn write_chunk<W: Write>(writer: &mut W, chunk_type: &[u8; 4], data: &[u8]) -> MetaResult<()> {
        let mut crc_data = Vec::with_capacity(4 + data.len());
        crc_data.extend_from_slice(chunk_type);
        crc_data.extend_from_slice(data);

        PngChunk {
            chunk_type: *chunk_type,
            data: data.to_vec(),
            crc: Self::calculate_crc(&crc_data),
        }
        .write(writer)
    }

    /// Calculate PNG CRC-32
    ///
    /// PNG uses CRC-32 with polynomial 0xEDB88320
    fn calculate_crc(data: &[u8]) -> u32 {
        let mut crc = 0xFFFFFFFFu32;
        let table = Self::crc_table();

        for &byte in data {
            let index = ((crc ^ (byte as u32)) & 0xFF) as usize;
            crc = (crc >> 8) ^ table[index];
        }

        crc ^ 0xFFFFFFFF
    }

    /// Generate CRC-32 lookup table
    fn crc_table() -> [u32; 256] {
        let mut table = [0u32; 256];
        let polynomial = 0xEDB88320u32;

        for (i, item) in table.iter_mut().enumerate() {
            let mut crc = i as u32;
            for _ in 0..8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ polynomial;
                } else {
                    crc >>= 1;
                }
            }
            *item = crc;
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn minimal_png() -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        PngHandler::write_chunk(&mut out, CHUNK_TYPE_IHDR, &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0])
            .unwrap();
        PngHandler::write_chunk(&mut out, b"IDAT", &[0x78, 0x9C]).unwrap();
        PngHandler::write_chunk(&mut out, CHUNK_TYPE_IEND, &[]).unwrap();
        out
    }

    #[test]
    fn test_is_xmp_itxt() {
        let mut data = XMP_KEYWORD.to_vec();
        data.extend_from_slice(b"XMP data");
        assert!(PngHandler::is_xmp_itxt(&data));
        assert!(!PngHandler::is_xmp_itxt(b"Other keyword\0"));
    }

    #[test]
    fn test_extract_xmp_from_itxt() {
        let mut data = XMP_KEYWORD.to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"<rdf:RDF>test</rdf:RDF>");

        let extracted = PngHandler::extract_xmp_from_itxt(&data).unwrap();
        assert_eq!(extracted, Some(b"<rdf:RDF>test</rdf:RDF>".to_vec()));
    }

    #[test]
    fn test_crc_calculation() {
        // CRC of an empty IEND chunk is fixed by the format
        assert_eq!(PngHandler::calculate_crc(b"IEND"), 0xAE426082);
    }

    #[test]
    fn test_write_then_read() {
        let meta = RawMetadata {
            exif: Some(b"MM\0*\0\0\0\x08".to_vec()),
            iptc: None,
            xmp: Some("<x:xmpmeta/>".to_string()),
        };
        let mut out = Vec::new();
        PngHandler
            .write_metadata(&mut Cursor::new(minimal_png()), &mut out, &meta)
            .unwrap();

        let read = PngHandler.read_metadata(&mut Cursor::new(out.clone())).unwrap();
        assert_eq!(read, meta);

        // Writing again replaces rather than duplicates
        let mut again = Vec::new();
        PngHandler
            .write_metadata(&mut Cursor::new(out.clone()), &mut again, &meta)
            .unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_iptc_not_supported() {
        let meta = RawMetadata {
            iptc: Some(b"Photoshop 3.0\0".to_vec()),
            ..Default::default()
        };
        let result = PngHandler.write_metadata(&mut Cursor::new(minimal_png()), &mut Vec::new(), &meta);
        assert!(matches!(result, Err(MetaError::NotSupported(_))));
    }

    #[test]
    fn test_can_handle() {
        let mut reader = Cursor::new(minimal_png());
        assert!(PngHandler.can_handle(&mut reader).unwrap());
        assert_eq!(reader.position(), 0);
        assert!(!PngHandler.can_handle(&mut Cursor::new(vec![0xFF, 0xD8])).unwrap());
    }
}
