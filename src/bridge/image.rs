//! Image handles

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::bridge::container::{ExifData, IptcData, XmpData};
use crate::bridge::error::{meta_error_to_basic_error, BasicError};
use crate::bridge::options::DecodeOptions;
use crate::files::ImageFile;

/// Opens images
///
/// # Example
///
/// ```rust,no_run
/// use metakit::bridge::{ImageFactory, MetadataContainer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let image = ImageFactory::open("photo.jpg")?;
/// image.read_metadata()?;
/// for (key, value) in &image.iptc_data() {
///     println!("{} = {}", key, value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ImageFactory;

impl ImageFactory {
    /// Open an image with default decoding options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Image, BasicError> {
        Self::open_with(path, DecodeOptions::default())
    }

    /// Open an image; `options` apply to every container it hands out
    pub fn open_with<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Image, BasicError> {
        crate::initialize();
        let file = ImageFile::open(path).map_err(meta_error_to_basic_error)?;
        Ok(Image {
            file: Rc::new(RefCell::new(file)),
            options,
        })
    }
}

/// Shared handle to an opened image
///
/// Cloning the handle, or taking a container from it, shares the same
/// underlying file; it is released when the last handle is dropped.
#[derive(Clone)]
pub struct Image {
    file: Rc<RefCell<ImageFile>>,
    options: DecodeOptions,
}

impl Image {
    /// Load all metadata from disk, replacing the in-memory state
    pub fn read_metadata(&self) -> Result<(), BasicError> {
        self.file
            .borrow_mut()
            .read_metadata()
            .map_err(meta_error_to_basic_error)
    }

    /// Write the in-memory metadata back to the file
    pub fn write_metadata(&self) -> Result<(), BasicError> {
        self.file
            .borrow()
            .write_metadata()
            .map_err(meta_error_to_basic_error)
    }

    pub fn exif_data(&self) -> ExifData {
        ExifData::new(self.clone())
    }

    pub fn iptc_data(&self) -> IptcData {
        IptcData::new(self.clone())
    }

    pub fn xmp_data(&self) -> XmpData {
        XmpData::new(self.clone())
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub(crate) fn file(&self) -> &Rc<RefCell<ImageFile>> {
        &self.file
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.borrow();
        f.debug_struct("Image")
            .field("path", &file.path())
            .field("format", &file.format_name())
            .finish()
    }
}
