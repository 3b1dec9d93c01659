//! Container file support
//!
//! Handlers move raw metadata blocks in and out of image files, and
//! [`ImageFile`] connects them to the codecs and the in-memory stores.

pub mod formats;
pub mod handler;
pub mod image;
pub mod registry;

#[cfg(feature = "jpeg")]
pub use formats::jpeg::JpegHandler;
#[cfg(feature = "png")]
pub use formats::png::PngHandler;
pub use handler::{FileHandler, RawMetadata};
pub use image::ImageFile;
pub use registry::{default_registry, Handler, HandlerRegistry};
