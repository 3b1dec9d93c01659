//! Exif tag dictionary
//!
//! A curated subset of the TIFF/Exif 2.32 tags, grouped by the IFD they
//! live in. The group and tag name form the key `Exif.<Group>.<Tag>`.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::types::TypeId;

/// IFD group of an Exif tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExifGroup {
    /// IFD0
    Image,
    /// Exif sub-IFD
    Photo,
    /// GPS sub-IFD
    GpsInfo,
    /// Interoperability sub-IFD
    Iop,
    /// IFD1
    Thumbnail,
}

impl ExifGroup {
    pub fn name(self) -> &'static str {
        match self {
            ExifGroup::Image => "Image",
            ExifGroup::Photo => "Photo",
            ExifGroup::GpsInfo => "GPSInfo",
            ExifGroup::Iop => "Iop",
            ExifGroup::Thumbnail => "Thumbnail",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Image" => Some(ExifGroup::Image),
            "Photo" => Some(ExifGroup::Photo),
            "GPSInfo" => Some(ExifGroup::GpsInfo),
            "Iop" => Some(ExifGroup::Iop),
            "Thumbnail" => Some(ExifGroup::Thumbnail),
            _ => None,
        }
    }

    /// IFD1 shares the IFD0 tag table
    fn table(self) -> &'static [TagInfo] {
        match self {
            ExifGroup::Image | ExifGroup::Thumbnail => IMAGE_TAGS,
            ExifGroup::Photo => PHOTO_TAGS,
            ExifGroup::GpsInfo => GPS_TAGS,
            ExifGroup::Iop => IOP_TAGS,
        }
    }
}

impl fmt::Display for ExifGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One dictionary entry
#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub tag: u16,
    pub name: &'static str,
    pub type_id: TypeId,
}

const fn t(tag: u16, name: &'static str, type_id: TypeId) -> TagInfo {
    TagInfo { tag, name, type_id }
}

/// Pointer to the Exif sub-IFD
pub const TAG_EXIF_IFD: u16 = 0x8769;
/// Pointer to the GPS sub-IFD
pub const TAG_GPS_IFD: u16 = 0x8825;
/// Pointer to the Interoperability sub-IFD
pub const TAG_IOP_IFD: u16 = 0xa005;
/// Thumbnail data offset in IFD1
pub const TAG_JPEG_IF_OFFSET: u16 = 0x0201;
/// Thumbnail data length in IFD1
pub const TAG_JPEG_IF_LENGTH: u16 = 0x0202;

use TypeId::{
    AsciiString as Ascii, Comment, SignedRational as SRational, UnsignedByte as Byte,
    UnsignedLong as Long, UnsignedRational as Rational, UnsignedShort as Short, Undefined,
};

static IMAGE_TAGS: &[TagInfo] = &[
    t(0x00fe, "NewSubfileType", Long),
    t(0x0100, "ImageWidth", Long),
    t(0x0101, "ImageLength", Long),
    t(0x0102, "BitsPerSample", Short),
    t(0x0103, "Compression", Short),
    t(0x0106, "PhotometricInterpretation", Short),
    t(0x010e, "ImageDescription", Ascii),
    t(0x010f, "Make", Ascii),
    t(0x0110, "Model", Ascii),
    t(0x0111, "StripOffsets", Long),
    t(0x0112, "Orientation", Short),
    t(0x0115, "SamplesPerPixel", Short),
    t(0x0116, "RowsPerStrip", Long),
    t(0x0117, "StripByteCounts", Long),
    t(0x011a, "XResolution", Rational),
    t(0x011b, "YResolution", Rational),
    t(0x011c, "PlanarConfiguration", Short),
    t(0x0128, "ResolutionUnit", Short),
    t(0x012d, "TransferFunction", Short),
    t(0x0131, "Software", Ascii),
    t(0x0132, "DateTime", Ascii),
    t(0x013b, "Artist", Ascii),
    t(0x013e, "WhitePoint", Rational),
    t(0x013f, "PrimaryChromaticities", Rational),
    t(TAG_JPEG_IF_OFFSET, "JPEGInterchangeFormat", Long),
    t(TAG_JPEG_IF_LENGTH, "JPEGInterchangeFormatLength", Long),
    t(0x0211, "YCbCrCoefficients", Rational),
    t(0x0213, "YCbCrPositioning", Short),
    t(0x0214, "ReferenceBlackWhite", Rational),
    t(0x02bc, "XMLPacket", Byte),
    t(0x8298, "Copyright", Ascii),
    t(0x83bb, "IPTCNAA", Long),
    t(TAG_EXIF_IFD, "ExifTag", Long),
    t(TAG_GPS_IFD, "GPSTag", Long),
    t(0x9c9b, "XPTitle", Byte),
    t(0x9c9c, "XPComment", Byte),
    t(0x9c9d, "XPAuthor", Byte),
    t(0x9c9e, "XPKeywords", Byte),
    t(0x9c9f, "XPSubject", Byte),
    t(0xc4a5, "PrintImageMatching", Undefined),
];

static PHOTO_TAGS: &[TagInfo] = &[
    t(0x829a, "ExposureTime", Rational),
    t(0x829d, "FNumber", Rational),
    t(0x8822, "ExposureProgram", Short),
    t(0x8824, "SpectralSensitivity", Ascii),
    t(0x8827, "ISOSpeedRatings", Short),
    t(0x8830, "SensitivityType", Short),
    t(0x9000, "ExifVersion", Undefined),
    t(0x9003, "DateTimeOriginal", Ascii),
    t(0x9004, "DateTimeDigitized", Ascii),
    t(0x9010, "OffsetTime", Ascii),
    t(0x9011, "OffsetTimeOriginal", Ascii),
    t(0x9012, "OffsetTimeDigitized", Ascii),
    t(0x9101, "ComponentsConfiguration", Undefined),
    t(0x9102, "CompressedBitsPerPixel", Rational),
    t(0x9201, "ShutterSpeedValue", SRational),
    t(0x9202, "ApertureValue", Rational),
    t(0x9203, "BrightnessValue", SRational),
    t(0x9204, "ExposureBiasValue", SRational),
    t(0x9205, "MaxApertureValue", Rational),
    t(0x9206, "SubjectDistance", Rational),
    t(0x9207, "MeteringMode", Short),
    t(0x9208, "LightSource", Short),
    t(0x9209, "Flash", Short),
    t(0x920a, "FocalLength", Rational),
    t(0x9214, "SubjectArea", Short),
    t(0x927c, "MakerNote", Undefined),
    t(0x9286, "UserComment", Comment),
    t(0x9290, "SubSecTime", Ascii),
    t(0x9291, "SubSecTimeOriginal", Ascii),
    t(0x9292, "SubSecTimeDigitized", Ascii),
    t(0xa000, "FlashpixVersion", Undefined),
    t(0xa001, "ColorSpace", Short),
    t(0xa002, "PixelXDimension", Long),
    t(0xa003, "PixelYDimension", Long),
    t(0xa004, "RelatedSoundFile", Ascii),
    t(TAG_IOP_IFD, "InteroperabilityTag", Long),
    t(0xa20e, "FocalPlaneXResolution", Rational),
    t(0xa20f, "FocalPlaneYResolution", Rational),
    t(0xa210, "FocalPlaneResolutionUnit", Short),
    t(0xa215, "ExposureIndex", Rational),
    t(0xa217, "SensingMethod", Short),
    t(0xa300, "FileSource", Undefined),
    t(0xa301, "SceneType", Undefined),
    t(0xa302, "CFAPattern", Undefined),
    t(0xa401, "CustomRendered", Short),
    t(0xa402, "ExposureMode", Short),
    t(0xa403, "WhiteBalance", Short),
    t(0xa404, "DigitalZoomRatio", Rational),
    t(0xa405, "FocalLengthIn35mmFilm", Short),
    t(0xa406, "SceneCaptureType", Short),
    t(0xa407, "GainControl", Short),
    t(0xa408, "Contrast", Short),
    t(0xa409, "Saturation", Short),
    t(0xa40a, "Sharpness", Short),
    t(0xa40c, "SubjectDistanceRange", Short),
    t(0xa420, "ImageUniqueID", Ascii),
    t(0xa430, "CameraOwnerName", Ascii),
    t(0xa431, "BodySerialNumber", Ascii),
    t(0xa432, "LensSpecification", Rational),
    t(0xa433, "LensMake", Ascii),
    t(0xa434, "LensModel", Ascii),
    t(0xa435, "LensSerialNumber", Ascii),
];

static GPS_TAGS: &[TagInfo] = &[
    t(0x0000, "GPSVersionID", Byte),
    t(0x0001, "GPSLatitudeRef", Ascii),
    t(0x0002, "GPSLatitude", Rational),
    t(0x0003, "GPSLongitudeRef", Ascii),
    t(0x0004, "GPSLongitude", Rational),
    t(0x0005, "GPSAltitudeRef", Byte),
    t(0x0006, "GPSAltitude", Rational),
    t(0x0007, "GPSTimeStamp", Rational),
    t(0x0008, "GPSSatellites", Ascii),
    t(0x0009, "GPSStatus", Ascii),
    t(0x000a, "GPSMeasureMode", Ascii),
    t(0x000b, "GPSDOP", Rational),
    t(0x000c, "GPSSpeedRef", Ascii),
    t(0x000d, "GPSSpeed", Rational),
    t(0x000e, "GPSTrackRef", Ascii),
    t(0x000f, "GPSTrack", Rational),
    t(0x0010, "GPSImgDirectionRef", Ascii),
    t(0x0011, "GPSImgDirection", Rational),
    t(0x0012, "GPSMapDatum", Ascii),
    t(0x001d, "GPSDateStamp", Ascii),
    t(0x001e, "GPSDifferential", Short),
];

static IOP_TAGS: &[TagInfo] = &[
    t(0x0001, "InteroperabilityIndex", Ascii),
    t(0x0002, "InteroperabilityVersion", Undefined),
    t(0x1000, "RelatedImageFileFormat", Ascii),
    t(0x1001, "RelatedImageWidth", Long),
    t(0x1002, "RelatedImageLength", Long),
];

type NameIndex = HashMap<(ExifGroup, &'static str), &'static TagInfo>;

static NAME_INDEX: OnceLock<NameIndex> = OnceLock::new();

fn name_index() -> &'static NameIndex {
    NAME_INDEX.get_or_init(|| {
        let groups = [
            ExifGroup::Image,
            ExifGroup::Photo,
            ExifGroup::GpsInfo,
            ExifGroup::Iop,
            ExifGroup::Thumbnail,
        ];
        groups
            .iter()
            .flat_map(|group| group.table().iter().map(move |info| ((*group, info.name), info)))
            .collect()
    })
}

/// Look up a tag by number
pub fn tag_info(group: ExifGroup, tag: u16) -> Option<&'static TagInfo> {
    group.table().iter().find(|info| info.tag == tag)
}

/// Look up a tag by name
pub fn tag_by_name(group: ExifGroup, name: &str) -> Option<&'static TagInfo> {
    name_index().get(&(group, name)).copied()
}

/// Default type of a tag; unknown tags are `Undefined`
pub fn default_type(group: ExifGroup, tag: u16) -> TypeId {
    tag_info(group, tag)
        .map(|info| info.type_id)
        .unwrap_or(TypeId::Undefined)
}

/// Which sub-IFD a pointer tag in `group` leads to
pub fn sub_ifd_group(group: ExifGroup, tag: u16) -> Option<ExifGroup> {
    match (group, tag) {
        (ExifGroup::Image, TAG_EXIF_IFD) => Some(ExifGroup::Photo),
        (ExifGroup::Image, TAG_GPS_IFD) => Some(ExifGroup::GpsInfo),
        (ExifGroup::Photo, TAG_IOP_IFD) => Some(ExifGroup::Iop),
        _ => None,
    }
}

pub(crate) fn init() {
    let _ = name_index();
}
