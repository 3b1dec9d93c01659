//! Dynamic-value bridge
//!
//! A thin object model over the engine: an [`Image`] opened through
//! [`ImageFactory`], three metadata containers that parse caller text into
//! typed values, and [`NativeValue`] for reading typed values back out.
//!
//! Handles are reference counted and not thread safe; keep an image and
//! its containers on one thread.

pub mod container;
pub mod error;
pub mod image;
pub mod options;
pub mod value;

pub use container::{Entries, ExifData, IptcData, MetadataContainer, XmpData};
pub use error::{BasicError, ErrorKind};
pub use image::{Image, ImageFactory};
pub use options::DecodeOptions;
pub use value::{decode, NativeValue};
