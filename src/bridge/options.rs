//! Decoding options

/// Options controlling how typed values become [`NativeValue`]s
///
/// # Example
///
/// ```rust
/// use metakit::bridge::DecodeOptions;
///
/// let options = DecodeOptions::default().rational_as_float();
/// assert!(options.rational_as_float);
/// ```
///
/// [`NativeValue`]: crate::bridge::NativeValue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode rationals as `Float(n / d)` instead of `Rational(n, d)`
    pub rational_as_float: bool,
}

impl DecodeOptions {
    /// Decode rationals as floating point numbers.
    pub fn rational_as_float(mut self) -> Self {
        self.rational_as_float = true;
        self
    }
}
