//! Metadata value type identifiers

use std::fmt;

/// Type tag carried by every [`Value`](crate::types::Value)
///
/// The first thirteen variants mirror the TIFF field types and keep their
/// on-disk codes; the rest are engine-level types for IPTC and XMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TypeId {
    UnsignedByte,
    AsciiString,
    UnsignedShort,
    UnsignedLong,
    UnsignedRational,
    SignedByte,
    Undefined,
    SignedShort,
    SignedLong,
    SignedRational,
    TiffFloat,
    TiffDouble,
    TiffIfd,
    /// IPTC string
    String,
    /// IPTC date (`YYYYMMDD`)
    Date,
    /// IPTC time (`HHMMSS±HHMM`)
    Time,
    /// Exif user comment with charset prefix
    Comment,
    XmpText,
    XmpAlt,
    XmpBag,
    XmpSeq,
    LangAlt,
    Invalid,
}

impl TypeId {
    /// Map a TIFF field type code to a type id
    pub fn from_tiff_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => TypeId::UnsignedByte,
            2 => TypeId::AsciiString,
            3 => TypeId::UnsignedShort,
            4 => TypeId::UnsignedLong,
            5 => TypeId::UnsignedRational,
            6 => TypeId::SignedByte,
            7 => TypeId::Undefined,
            8 => TypeId::SignedShort,
            9 => TypeId::SignedLong,
            10 => TypeId::SignedRational,
            11 => TypeId::TiffFloat,
            12 => TypeId::TiffDouble,
            13 => TypeId::TiffIfd,
            _ => return None,
        })
    }

    /// TIFF field type code used when this type is written to an IFD
    ///
    /// Engine-level types are stored the way Exif expects them: comments as
    /// UNDEFINED, text-like types as ASCII.
    pub fn tiff_code(self) -> u16 {
        match self {
            TypeId::UnsignedByte => 1,
            TypeId::AsciiString => 2,
            TypeId::UnsignedShort => 3,
            TypeId::UnsignedLong => 4,
            TypeId::UnsignedRational => 5,
            TypeId::SignedByte => 6,
            TypeId::Undefined | TypeId::Comment => 7,
            TypeId::SignedShort => 8,
            TypeId::SignedLong => 9,
            TypeId::SignedRational => 10,
            TypeId::TiffFloat => 11,
            TypeId::TiffDouble => 12,
            TypeId::TiffIfd => 13,
            _ => 2,
        }
    }

    /// Size in bytes of one component in TIFF encoding
    pub fn size(self) -> usize {
        match self {
            TypeId::UnsignedByte
            | TypeId::AsciiString
            | TypeId::SignedByte
            | TypeId::Undefined
            | TypeId::Comment => 1,
            TypeId::UnsignedShort | TypeId::SignedShort => 2,
            TypeId::UnsignedLong | TypeId::SignedLong | TypeId::TiffFloat | TypeId::TiffIfd => 4,
            TypeId::UnsignedRational | TypeId::SignedRational | TypeId::TiffDouble => 8,
            _ => 1,
        }
    }

    /// Whether values of this type decode to integers
    pub fn is_integer_family(self) -> bool {
        matches!(
            self,
            TypeId::UnsignedByte
                | TypeId::UnsignedShort
                | TypeId::UnsignedLong
                | TypeId::SignedByte
                | TypeId::SignedShort
                | TypeId::SignedLong
                | TypeId::TiffFloat
                | TypeId::TiffDouble
                | TypeId::TiffIfd
        )
    }

    /// Whether values of this type decode to rationals
    pub fn is_rational(self) -> bool {
        matches!(self, TypeId::UnsignedRational | TypeId::SignedRational)
    }

    /// Whether this is one of the XMP array types
    pub fn is_xmp_array(self) -> bool {
        matches!(self, TypeId::XmpBag | TypeId::XmpSeq | TypeId::XmpAlt)
    }

    /// Canonical type name
    pub fn name(self) -> &'static str {
        match self {
            TypeId::UnsignedByte => "Byte",
            TypeId::AsciiString => "Ascii",
            TypeId::UnsignedShort => "Short",
            TypeId::UnsignedLong => "Long",
            TypeId::UnsignedRational => "Rational",
            TypeId::SignedByte => "SByte",
            TypeId::Undefined => "Undefined",
            TypeId::SignedShort => "SShort",
            TypeId::SignedLong => "SLong",
            TypeId::SignedRational => "SRational",
            TypeId::TiffFloat => "Float",
            TypeId::TiffDouble => "Double",
            TypeId::TiffIfd => "Ifd",
            TypeId::String => "String",
            TypeId::Date => "Date",
            TypeId::Time => "Time",
            TypeId::Comment => "Comment",
            TypeId::XmpText => "XmpText",
            TypeId::XmpAlt => "XmpAlt",
            TypeId::XmpBag => "XmpBag",
            TypeId::XmpSeq => "XmpSeq",
            TypeId::LangAlt => "LangAlt",
            TypeId::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
