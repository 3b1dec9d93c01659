//! Utility helpers shared by values and codecs

pub mod datetime;
