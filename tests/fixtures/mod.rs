//! Hand-assembled image files for the integration tests
//!
//! The bytes are laid out here directly rather than through the crate's
//! encoders, so the tests read something the crate did not write itself.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

/// Offset of the Exif sub-IFD in [`tiff`]
pub const EXIF_IFD_OFFSET: i64 = 64;
/// Offset of the GPS sub-IFD in [`tiff`]
pub const GPS_IFD_OFFSET: i64 = 106;

pub const XMP_PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/">
      <dc:title>
        <rdf:Alt>
          <rdf:li xml:lang="x-default">Pickled</rdf:li>
        </rdf:Alt>
      </dc:title>
      <dc:description>
        <rdf:Alt>
          <rdf:li xml:lang="x-default">This is a description</rdf:li>
        </rdf:Alt>
      </dc:description>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

fn entry(out: &mut Vec<u8>, tag: u16, type_code: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&type_code.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

/// Little-endian TIFF structure:
///
/// ```text
///   0  header
///   8  IFD0: Software, ExifTag, GPSTag
///  50  "plasq skitch\0" + pad
///  64  Exif IFD: ExifVersion, PixelXDimension, PixelYDimension
/// 106  GPS IFD: GPSLatitude
/// 124  three rationals
/// ```
pub fn tiff() -> Vec<u8> {
    let mut out = b"II\x2A\x00".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());

    out.extend_from_slice(&3u16.to_le_bytes());
    entry(&mut out, 0x0131, 2, 13, 50u32.to_le_bytes());
    entry(&mut out, 0x8769, 4, 1, (EXIF_IFD_OFFSET as u32).to_le_bytes());
    entry(&mut out, 0x8825, 4, 1, (GPS_IFD_OFFSET as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(out.len(), 50);

    out.extend_from_slice(b"plasq skitch\0\0");
    assert_eq!(out.len(), EXIF_IFD_OFFSET as usize);

    out.extend_from_slice(&3u16.to_le_bytes());
    entry(&mut out, 0x9000, 7, 4, *b"0210");
    entry(&mut out, 0xA002, 3, 1, [32, 0, 0, 0]);
    entry(&mut out, 0xA003, 3, 1, [32, 0, 0, 0]);
    out.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(out.len(), GPS_IFD_OFFSET as usize);

    out.extend_from_slice(&1u16.to_le_bytes());
    entry(&mut out, 0x0002, 5, 3, 124u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(out.len(), 124);

    for (n, d) in [(4u32, 1u32), (22, 1), (1, 3)] {
        out.extend_from_slice(&n.to_le_bytes());
        out.extend_from_slice(&d.to_le_bytes());
    }
    out
}

fn dataset(out: &mut Vec<u8>, record: u8, number: u8, data: &[u8]) {
    out.extend_from_slice(&[0x1C, record, number]);
    out.extend_from_slice(&(data.len() as u16).to_be_bytes());
    out.extend_from_slice(data);
}

/// IIM dataset stream
pub fn iim() -> Vec<u8> {
    let mut out = Vec::new();
    dataset(&mut out, 2, 120, b"Rhubarb rhubarb rhubard");
    dataset(&mut out, 2, 25, b"fish");
    dataset(&mut out, 2, 25, b"custard");
    dataset(&mut out, 2, 30, b"24121206");
    dataset(&mut out, 2, 35, b"111111+0000");
    out
}

/// Photoshop resource block holding a copyright flag and the IIM stream
pub fn photoshop_block() -> Vec<u8> {
    let mut out = b"Photoshop 3.0\0".to_vec();

    // Copyright flag resource, kept across rewrites
    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(&0x040Au16.to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&[1, 0]);

    let iim = iim();
    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(&0x0404u16.to_be_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&(iim.len() as u32).to_be_bytes());
    out.extend_from_slice(&iim);
    if iim.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn segment(out: &mut Vec<u8>, marker: u8, parts: &[&[u8]]) {
    let len: usize = parts.iter().map(|p| p.len()).sum::<usize>() + 2;
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&(len as u16).to_be_bytes());
    for part in parts {
        out.extend_from_slice(part);
    }
}

/// Scan data shared by the JPEG fixtures
pub const SCAN: &[u8] = &[0xFF, 0xDA, 0x00, 0x02, 0x12, 0x34, 0x56, 0xFF, 0xD9];

/// JPEG with APP0, Exif, XMP, Photoshop APP13, a quantization table and scan data
pub fn jpeg() -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    segment(&mut out, 0xE0, &[b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"]);
    segment(&mut out, 0xE1, &[b"Exif\0\0", &tiff()]);
    segment(&mut out, 0xE1, &[b"http://ns.adobe.com/xap/1.0/\0", XMP_PACKET.as_bytes()]);
    segment(&mut out, 0xED, &[&photoshop_block()]);
    segment(&mut out, 0xDB, &[&[0u8; 65]]);
    out.extend_from_slice(SCAN);
    out
}

/// JPEG whose only metadata is an APP1 Exif segment holding `tiff`
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    segment(&mut out, 0xE0, &[b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"]);
    segment(&mut out, 0xE1, &[b"Exif\0\0", tiff]);
    segment(&mut out, 0xDB, &[&[0u8; 65]]);
    out.extend_from_slice(SCAN);
    out
}

/// JPEG without any metadata segments
pub fn bare_jpeg() -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    segment(&mut out, 0xE0, &[b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"]);
    segment(&mut out, 0xDB, &[&[0u8; 65]]);
    out.extend_from_slice(SCAN);
    out
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

fn chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// 1x1 PNG with eXIf and an XMP iTXt chunk
pub fn png() -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    chunk(&mut out, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
    chunk(&mut out, b"eXIf", &tiff());
    let mut itxt = b"XML:com.adobe.xmp\0\0\0\0\0".to_vec();
    itxt.extend_from_slice(XMP_PACKET.as_bytes());
    chunk(&mut out, b"iTXt", &itxt);
    chunk(&mut out, b"IDAT", &[0x78, 0x9C, 0x63, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]);
    chunk(&mut out, b"IEND", &[]);
    out
}

/// Write `bytes` to a scratch file with the given suffix
pub fn scratch_file(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create scratch file");
    file.write_all(bytes).expect("write scratch file");
    file.flush().expect("flush scratch file");
    file
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("read back scratch file")
}

/// Install a test logger once; respects `RUST_LOG`
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
