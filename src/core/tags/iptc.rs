//! IPTC IIM dataset dictionary
//!
//! Covers the Envelope (1) and Application (2) records. Keys take the form
//! `Iptc.<Record>.<DataSet>`.

use crate::types::TypeId;

/// Envelope record number
pub const ENVELOPE: u16 = 1;
/// Application record number
pub const APPLICATION2: u16 = 2;

/// One dataset definition
#[derive(Debug, Clone, Copy)]
pub struct DataSetInfo {
    pub number: u16,
    pub name: &'static str,
    pub type_id: TypeId,
    pub repeatable: bool,
    /// Maximum byte length accepted by the encoder
    pub max_len: usize,
}

const fn d(
    number: u16,
    name: &'static str,
    type_id: TypeId,
    repeatable: bool,
    max_len: usize,
) -> DataSetInfo {
    DataSetInfo {
        number,
        name,
        type_id,
        repeatable,
        max_len,
    }
}

use TypeId::{Date, String as Str, Time, Undefined, UnsignedShort as Short};

static ENVELOPE_DATASETS: &[DataSetInfo] = &[
    d(0, "ModelVersion", Short, false, 2),
    d(5, "Destination", Str, true, 1024),
    d(20, "FileFormat", Short, false, 2),
    d(22, "FileVersion", Short, false, 2),
    d(30, "ServiceId", Str, false, 10),
    d(40, "EnvelopeNumber", Str, false, 8),
    d(50, "ProductId", Str, true, 32),
    d(60, "EnvelopePriority", Str, false, 1),
    d(70, "DateSent", Date, false, 8),
    d(80, "TimeSent", Time, false, 11),
    d(90, "CharacterSet", Undefined, false, 32),
    d(100, "UNO", Str, false, 80),
    d(120, "ARMId", Short, false, 2),
    d(122, "ARMVersion", Short, false, 2),
];

static APPLICATION2_DATASETS: &[DataSetInfo] = &[
    d(0, "RecordVersion", Short, false, 2),
    d(3, "ObjectType", Str, false, 67),
    d(4, "ObjectAttribute", Str, true, 68),
    d(5, "ObjectName", Str, false, 64),
    d(7, "EditStatus", Str, false, 64),
    d(10, "Urgency", Str, false, 1),
    d(12, "Subject", Str, true, 236),
    d(15, "Category", Str, false, 3),
    d(20, "SuppCategory", Str, true, 32),
    d(22, "FixtureId", Str, false, 32),
    d(25, "Keywords", Str, true, 64),
    d(26, "LocationCode", Str, true, 3),
    d(27, "LocationName", Str, true, 64),
    d(30, "ReleaseDate", Date, false, 8),
    d(35, "ReleaseTime", Time, false, 11),
    d(37, "ExpirationDate", Date, false, 8),
    d(38, "ExpirationTime", Time, false, 11),
    d(40, "SpecialInstructions", Str, false, 256),
    d(42, "ActionAdvised", Str, false, 2),
    d(45, "ReferenceService", Str, true, 10),
    d(47, "ReferenceDate", Date, true, 8),
    d(50, "ReferenceNumber", Str, true, 8),
    d(55, "DateCreated", Date, false, 8),
    d(60, "TimeCreated", Time, false, 11),
    d(62, "DigitizationDate", Date, false, 8),
    d(63, "DigitizationTime", Time, false, 11),
    d(65, "Program", Str, false, 32),
    d(70, "ProgramVersion", Str, false, 10),
    d(75, "ObjectCycle", Str, false, 1),
    d(80, "Byline", Str, true, 32),
    d(85, "BylineTitle", Str, true, 32),
    d(90, "City", Str, false, 32),
    d(92, "SubLocation", Str, false, 32),
    d(95, "ProvinceState", Str, false, 32),
    d(100, "CountryCode", Str, false, 3),
    d(101, "CountryName", Str, false, 64),
    d(103, "TransmissionReference", Str, false, 32),
    d(105, "Headline", Str, false, 256),
    d(110, "Credit", Str, false, 32),
    d(115, "Source", Str, false, 32),
    d(116, "Copyright", Str, false, 128),
    d(118, "Contact", Str, true, 128),
    d(120, "Caption", Str, false, 2000),
    d(122, "Writer", Str, true, 32),
    d(125, "RasterizedCaption", Undefined, false, 7360),
    d(130, "ImageType", Str, false, 2),
    d(131, "ImageOrientation", Str, false, 1),
    d(135, "Language", Str, false, 3),
    d(150, "AudioType", Str, false, 2),
];

fn record_table(record: u16) -> &'static [DataSetInfo] {
    match record {
        ENVELOPE => ENVELOPE_DATASETS,
        APPLICATION2 => APPLICATION2_DATASETS,
        _ => &[],
    }
}

/// Record name used in keys
pub fn record_name(record: u16) -> Option<&'static str> {
    match record {
        ENVELOPE => Some("Envelope"),
        APPLICATION2 => Some("Application2"),
        _ => None,
    }
}

/// Record number for a key record name
pub fn record_id(name: &str) -> Option<u16> {
    match name {
        "Envelope" => Some(ENVELOPE),
        "Application2" => Some(APPLICATION2),
        _ => None,
    }
}

pub fn dataset_info(number: u16, record: u16) -> Option<&'static DataSetInfo> {
    record_table(record).iter().find(|info| info.number == number)
}

pub fn dataset_by_name(name: &str, record: u16) -> Option<&'static DataSetInfo> {
    record_table(record).iter().find(|info| info.name == name)
}

/// Value type of a dataset; unknown datasets are strings
pub fn dataset_type(number: u16, record: u16) -> TypeId {
    dataset_info(number, record)
        .map(|info| info.type_id)
        .unwrap_or(TypeId::String)
}

/// Whether a dataset may occur more than once; unknown datasets may
pub fn is_repeatable(number: u16, record: u16) -> bool {
    dataset_info(number, record)
        .map(|info| info.repeatable)
        .unwrap_or(true)
}
