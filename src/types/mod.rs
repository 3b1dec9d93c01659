//! Metadata value types
//!
//! This module defines the typed values stored in Exif, IPTC and XMP entries.

pub mod rational;
pub mod type_id;
pub mod value;

pub use rational::Rational;
pub use type_id::TypeId;
pub use value::{CharsetId, Value, X_DEFAULT};
