//! Image file API
//!
//! [`ImageFile`] ties a path on disk to a container handler and the three
//! in-memory metadata stores.

use crate::codec::{self, ByteOrder};
use crate::core::error::{MetaError, MetaResult};
use crate::core::metadata::{ExifData, IptcData, XmpData};
use crate::files::handler::{FileHandler, RawMetadata};
use crate::files::registry::{default_registry, Handler};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

/// An image on disk and its decoded metadata
///
/// The stores start out empty. [`ImageFile::read_metadata`] fills them from
/// the file and [`ImageFile::write_metadata`] rewrites the file's metadata
/// segments from them; nothing is written implicitly.
///
/// # Example
///
/// ```rust,no_run
/// use metakit::files::ImageFile;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut image = ImageFile::open("photo.jpg")?;
/// image.read_metadata()?;
/// for datum in image.exif_data() {
///     println!("{} = {}", datum.key(), datum.value());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImageFile {
    path: PathBuf,
    handler: Handler,
    exif: ExifData,
    iptc: IptcData,
    xmp: XmpData,
    /// Byte order of the Exif block last read, reused on write
    exif_byte_order: ByteOrder,
}

impl ImageFile {
    /// Open an image and pick its container handler
    ///
    /// The handler is chosen by content first, then by file extension.
    ///
    /// # Errors
    ///
    /// * [`MetaError::OpenFailed`] if the file cannot be read
    /// * [`MetaError::UnknownImageType`] if no handler recognises it
    pub fn open<P: AsRef<Path>>(path: P) -> MetaResult<Self> {
        let path = path.as_ref();
        let data = Self::load(path)?;

        let handler = default_registry().resolve(path, &data)?;
        log::debug!("Opened {} as {}", path.display(), handler.format_name());

        Ok(Self {
            path: path.to_path_buf(),
            handler,
            exif: ExifData::new(),
            iptc: IptcData::new(),
            xmp: XmpData::new(),
            exif_byte_order: ByteOrder::default(),
        })
    }

    fn load(path: &Path) -> MetaResult<Vec<u8>> {
        fs::read(path).map_err(|source| MetaError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read all three metadata families from the file
    ///
    /// The stores are replaced with the on-disk state.
    pub fn read_metadata(&mut self) -> MetaResult<()> {
        let data = Self::load(&self.path)?;
        let raw = self.handler.read_metadata(&mut Cursor::new(data))?;

        let (exif, byte_order) = match raw.exif.as_deref() {
            Some(tiff) if !tiff.is_empty() => codec::exif::decode(tiff)?,
            _ => (ExifData::new(), ByteOrder::default()),
        };
        let iptc = match raw.iptc.as_deref() {
            Some(block) => match codec::iptc::extract_iim(block)? {
                Some(iim) => codec::iptc::decode(&iim)?,
                None => IptcData::new(),
            },
            None => IptcData::new(),
        };
        let xmp = match raw.xmp.as_deref() {
            Some(packet) if !packet.trim().is_empty() => codec::xmp::decode(packet)?,
            _ => XmpData::new(),
        };

        log::debug!(
            "Read {}: {} Exif, {} IPTC, {} XMP entries",
            self.path.display(),
            exif.len(),
            iptc.len(),
            xmp.len()
        );
        self.exif = exif;
        self.iptc = iptc;
        self.xmp = xmp;
        self.exif_byte_order = byte_order;
        Ok(())
    }

    /// Encode the stores and rewrite the file's metadata segments
    ///
    /// Other Photoshop image resources in the file survive the rewrite.
    pub fn write_metadata(&self) -> MetaResult<()> {
        let original = Self::load(&self.path)?;
        let previous = self.handler.read_metadata(&mut Cursor::new(&original))?;

        let exif = codec::exif::encode(&self.exif, self.exif_byte_order)?;
        let iim = codec::iptc::encode(&self.iptc)?;
        let iptc = codec::iptc::replace_iim(previous.iptc.as_deref(), &iim)?;
        let xmp = codec::xmp::encode(&self.xmp)?;
        let raw = RawMetadata {
            exif: Some(exif).filter(|b| !b.is_empty()),
            iptc: Some(iptc).filter(|b| !b.is_empty()),
            xmp: Some(xmp).filter(|s| !s.is_empty()),
        };

        // The original is only truncated once the full output exists
        let mut output = Vec::with_capacity(original.len());
        self.handler
            .write_metadata(&mut Cursor::new(&original), &mut output, &raw)?;

        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(&output)?;
        writer.flush()?;
        log::debug!("Wrote {} ({} bytes)", self.path.display(), output.len());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the container format, e.g. "JPEG"
    pub fn format_name(&self) -> &'static str {
        self.handler.format_name()
    }

    pub fn exif_data(&self) -> &ExifData {
        &self.exif
    }

    pub fn exif_data_mut(&mut self) -> &mut ExifData {
        &mut self.exif
    }

    pub fn iptc_data(&self) -> &IptcData {
        &self.iptc
    }

    pub fn iptc_data_mut(&mut self) -> &mut IptcData {
        &mut self.iptc
    }

    pub fn xmp_data(&self) -> &XmpData {
        &self.xmp
    }

    pub fn xmp_data_mut(&mut self) -> &mut XmpData {
        &mut self.xmp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::{ExifKey, IptcKey, XmpKey};
    use crate::types::{TypeId, Value};
    use std::io::Write as _;

    fn minimal_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    }

    fn text_value(type_id: TypeId, text: &str) -> Value {
        let mut value = Value::create(type_id);
        value.read(text).unwrap();
        value
    }

    #[test]
    fn test_open_missing_file() {
        let err = ImageFile::open("/nonexistent/photo.jpg").unwrap_err();
        assert!(matches!(err, MetaError::OpenFailed { .. }));
        assert!(err
            .to_string()
            .starts_with("/nonexistent/photo.jpg: Failed to open the data source"));
    }

    #[test]
    fn test_open_unknown_type() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();
        let err = ImageFile::open(file.path()).unwrap_err();
        assert!(matches!(err, MetaError::UnknownImageType(_)));
    }

    #[test]
    fn test_empty_before_read() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&minimal_jpeg()).unwrap();
        let mut image = ImageFile::open(file.path()).unwrap();
        assert_eq!(image.format_name(), "JPEG");
        assert!(image.exif_data().is_empty());
        image.read_metadata().unwrap();
        assert!(image.exif_data().is_empty());
        assert!(image.iptc_data().is_empty());
        assert!(image.xmp_data().is_empty());
    }

    #[test]
    fn test_write_then_reopen() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&minimal_jpeg()).unwrap();

        let mut image = ImageFile::open(file.path()).unwrap();
        image.exif_data_mut().add(
            ExifKey::parse("Exif.Image.Software").unwrap(),
            text_value(TypeId::AsciiString, "metakit"),
        );
        image.iptc_data_mut().add(
            IptcKey::parse("Iptc.Application2.Keywords").unwrap(),
            text_value(TypeId::String, "fish"),
        );
        image.xmp_data_mut().add(
            XmpKey::parse("Xmp.dc.description").unwrap(),
            text_value(TypeId::XmpText, "A description"),
        );
        image.write_metadata().unwrap();

        let mut reopened = ImageFile::open(file.path()).unwrap();
        reopened.read_metadata().unwrap();
        let exif = reopened.exif_data().get(0).unwrap();
        assert_eq!(exif.key().to_string(), "Exif.Image.Software");
        assert_eq!(exif.value().to_string(), "metakit");
        assert_eq!(reopened.iptc_data().get(0).unwrap().value().to_string(), "fish");
        assert_eq!(
            reopened.xmp_data().get(0).unwrap().value().to_string(),
            "A description"
        );
    }

    #[test]
    fn test_clearing_stores_removes_segments() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&minimal_jpeg()).unwrap();

        let mut image = ImageFile::open(file.path()).unwrap();
        image.xmp_data_mut().add(
            XmpKey::parse("Xmp.dc.description").unwrap(),
            text_value(TypeId::XmpText, "gone soon"),
        );
        image.write_metadata().unwrap();
        image.xmp_data_mut().clear();
        image.write_metadata().unwrap();

        assert_eq!(fs::read(file.path()).unwrap(), minimal_jpeg());
    }
}
