//! # metakit
//!
//! Pure Rust reading and writing of Exif, IPTC and XMP image metadata.
//!
//! The [`bridge`] module is the dynamic-value front end: open an
//! [`Image`], read its metadata, and work with the Exif, IPTC and XMP
//! containers using canonical string keys and textual values. Everything
//! below it is the typed engine:
//!
//! - [`types`]: type ids, rationals and typed values
//! - [`core`]: keys, tag dictionaries, the namespace registry and the stores
//! - [`codec`]: the Exif (TIFF), IPTC (IIM) and XMP (RDF/XML) codecs
//! - [`files`]: JPEG and PNG container handlers and [`ImageFile`]
//!
//! # Example
//!
//! ```rust,no_run
//! use metakit::{ImageFactory, MetadataContainer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! metakit::initialize();
//!
//! let image = ImageFactory::open("photo.jpg")?;
//! image.read_metadata()?;
//!
//! let iptc = image.iptc_data();
//! iptc.set("Iptc.Application2.Caption", &["A New Caption"])?;
//! println!("{:?}", iptc);
//!
//! image.write_metadata()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Once;

pub mod bridge;
pub mod codec;
pub mod core;
pub mod files;
pub mod types;
pub mod utils;

pub use bridge::{
    BasicError, DecodeOptions, ErrorKind, ExifData, Image, ImageFactory, IptcData,
    MetadataContainer, NativeValue, XmpData,
};
pub use crate::core::error::{MetaError, MetaResult};
pub use crate::core::key::{ExifKey, IptcKey, XmpKey};
pub use crate::core::namespace::register_namespace;
pub use files::ImageFile;
pub use types::{Rational, TypeId, Value};

static INIT: Once = Once::new();

/// Set up process-wide state
///
/// Registers the builtin XMP namespaces and builds the tag lookup tables.
/// Runs once per process; later calls return immediately. Opening an image
/// calls it as well.
pub fn initialize() {
    INIT.call_once(|| {
        crate::core::namespace::ensure_registry();
        crate::core::tags::exif::init();
        let formats = files::default_registry().format_names();
        log::info!("metakit initialized, container formats: {}", formats.join(", "));
    });
}
