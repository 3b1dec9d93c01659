//! IPTC codec
//!
//! IPTC IIM datasets are stored as `0x1C record dataset length data`. In
//! JPEG files the dataset stream lives in the Photoshop image resource block
//! (APP13), as the 8BIM resource with ID 0x0404.
//!
//! Image resource format:
//! - Type: "8BIM" (4 bytes)
//! - ID: 2 bytes
//! - Name: Pascal string (length byte + chars, padded to even)
//! - Size: 4 bytes
//! - Data: variable (padded to even)

use crate::core::error::{MetaError, MetaResult};
use crate::core::key::IptcKey;
use crate::core::metadata::{IptcData, ADDED};
use crate::core::tags::iptc as iptc_datasets;
use crate::types::value::ValueData;
use crate::types::{TypeId, Value};
use crate::utils::datetime::{DateValue, TimeValue};

/// Header of a Photoshop image resource block in APP13
pub const PHOTOSHOP_SIGNATURE: &[u8] = b"Photoshop 3.0\0";

const PSIR_SIGNATURE: &[u8; 4] = b"8BIM";

/// Image resource ID of the IPTC-NAA record
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// IIM tag marker
const IIM_MARKER: u8 = 0x1C;

/// Largest dataset length accepted from either length form
const MAX_DATASET_LEN: usize = 0x7FFF;

/// One image resource
#[derive(Debug, Clone, PartialEq)]
struct Resource {
    id: u16,
    /// Pascal name including its length byte
    name: Vec<u8>,
    data: Vec<u8>,
}

fn read_u16_be(data: &[u8], pos: usize) -> MetaResult<u16> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| MetaError::CorruptData("Truncated IPTC data".to_string()))
}

fn read_u32_be(data: &[u8], pos: usize) -> MetaResult<u32> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| MetaError::CorruptData("Truncated image resource".to_string()))
}

fn strip_signature(block: &[u8]) -> &[u8] {
    block.strip_prefix(PHOTOSHOP_SIGNATURE).unwrap_or(block)
}

fn parse_resources(block: &[u8]) -> MetaResult<Vec<Resource>> {
    let data = strip_signature(block);
    let mut resources = Vec::new();
    let mut pos = 0;

    while pos + 4 <= data.len() {
        if &data[pos..pos + 4] != PSIR_SIGNATURE {
            log::debug!("Stopping at non-8BIM data at offset {}", pos);
            break;
        }
        let id = read_u16_be(data, pos + 4)?;
        let name_len = *data
            .get(pos + 6)
            .ok_or_else(|| MetaError::CorruptData("Truncated image resource".to_string()))?
            as usize;
        // Name is padded to make (length byte + chars) even
        let name_padded_len = if (1 + name_len) % 2 == 0 {
            1 + name_len
        } else {
            2 + name_len
        };
        let name = data
            .get(pos + 6..pos + 6 + name_padded_len)
            .ok_or_else(|| MetaError::CorruptData("Truncated image resource".to_string()))?
            .to_vec();
        let size_pos = pos + 6 + name_padded_len;
        let size = read_u32_be(data, size_pos)? as usize;
        let data_start = size_pos + 4;
        let body = data
            .get(data_start..data_start + size)
            .ok_or_else(|| MetaError::CorruptData("Truncated image resource".to_string()))?;

        resources.push(Resource {
            id,
            name,
            data: body.to_vec(),
        });
        pos = data_start + size + size % 2;
    }
    Ok(resources)
}

fn write_resources(resources: &[Resource]) -> Vec<u8> {
    let mut out = PHOTOSHOP_SIGNATURE.to_vec();
    for resource in resources {
        out.extend_from_slice(PSIR_SIGNATURE);
        out.extend_from_slice(&resource.id.to_be_bytes());
        out.extend_from_slice(&resource.name);
        out.extend_from_slice(&(resource.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&resource.data);
        if resource.data.len() % 2 == 1 {
            out.push(0);
        }
    }
    out
}

/// IIM data of the IPTC resource in a Photoshop resource block
pub fn extract_iim(block: &[u8]) -> MetaResult<Option<Vec<u8>>> {
    Ok(parse_resources(block)?
        .into_iter()
        .find(|r| r.id == IPTC_RESOURCE_ID)
        .map(|r| r.data))
}

/// Replace the IPTC resource of a Photoshop resource block
///
/// Other resources are kept in place. An empty `iim` removes the IPTC
/// resource; the result is empty when no resources remain.
pub fn replace_iim(block: Option<&[u8]>, iim: &[u8]) -> MetaResult<Vec<u8>> {
    let mut resources = match block {
        Some(block) => parse_resources(block)?,
        None => Vec::new(),
    };

    let position = resources.iter().position(|r| r.id == IPTC_RESOURCE_ID);
    match (position, iim.is_empty()) {
        (Some(i), true) => {
            resources.remove(i);
        }
        (Some(i), false) => resources[i].data = iim.to_vec(),
        (None, false) => resources.push(Resource {
            id: IPTC_RESOURCE_ID,
            name: vec![0, 0],
            data: iim.to_vec(),
        }),
        (None, true) => {}
    }

    if resources.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(write_resources(&resources))
    }
}

/// Decode an IIM dataset stream
pub fn decode(data: &[u8]) -> MetaResult<IptcData> {
    let mut iptc = IptcData::new();
    let mut pos = 0;

    while pos < data.len() {
        if data[pos] != IIM_MARKER {
            pos += 1;
            continue;
        }
        let header = data
            .get(pos + 1..pos + 5)
            .ok_or_else(|| MetaError::CorruptData("Truncated IPTC dataset header".to_string()))?;
        let record = header[0] as u16;
        let dataset = header[1] as u16;
        let short_len = u16::from_be_bytes([header[2], header[3]]) as usize;
        pos += 5;

        let len = if short_len & 0x8000 != 0 {
            // Extended form: low bits give the size of the length field
            let field = short_len & 0x7FFF;
            let bytes = data
                .get(pos..pos + field)
                .filter(|_| field <= 4)
                .ok_or_else(|| MetaError::CorruptData("Bad IPTC extended length".to_string()))?;
            pos += field;
            bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize)
        } else {
            short_len
        };
        if len > MAX_DATASET_LEN {
            return Err(MetaError::CorruptData(format!(
                "IPTC dataset {}:{} is too large ({} bytes)",
                record, dataset, len
            )));
        }

        let body = data
            .get(pos..pos + len)
            .ok_or_else(|| MetaError::CorruptData("Truncated IPTC dataset".to_string()))?;
        pos += len;

        let key = IptcKey::new(dataset, record);
        if iptc.add(key, decode_value(key.type_id(), body)) != ADDED {
            log::debug!("Dropping duplicate non-repeatable dataset {}", key);
        }
    }

    log::debug!("Decoded {} IPTC datasets", iptc.len());
    Ok(iptc)
}

fn decode_value(type_id: TypeId, body: &[u8]) -> Value {
    let text = || String::from_utf8_lossy(body).trim_end_matches('\0').to_string();
    let data = match type_id {
        TypeId::UnsignedShort if body.len() == 2 => {
            ValueData::Ints(vec![u16::from_be_bytes([body[0], body[1]]) as i64])
        }
        TypeId::Undefined => ValueData::Bytes(body.to_vec()),
        TypeId::Date => match DateValue::parse(&text()) {
            Ok(date) => ValueData::Date(date),
            Err(_) => return fallback_text(type_id, text()),
        },
        TypeId::Time => match TimeValue::parse(&text()) {
            Ok(time) => ValueData::Time(time),
            Err(_) => return fallback_text(type_id, text()),
        },
        _ => return Value::with_data(TypeId::String, ValueData::Text(text())),
    };
    Value::with_data(type_id, data)
}

fn fallback_text(type_id: TypeId, text: String) -> Value {
    log::debug!("Keeping malformed IPTC {} '{}' as text", type_id, text);
    Value::with_data(TypeId::String, ValueData::Text(text))
}

fn encode_value(value: &Value) -> Vec<u8> {
    match value.data() {
        ValueData::Ints(ints) if value.type_id() == TypeId::UnsignedShort => ints
            .iter()
            .flat_map(|v| (*v as u16).to_be_bytes())
            .collect(),
        ValueData::Bytes(bytes) => bytes.clone(),
        ValueData::Date(date) => date.to_iptc_string().into_bytes(),
        ValueData::Time(time) => time.to_iptc_string().into_bytes(),
        _ => value.to_string().into_bytes(),
    }
}

/// Encode a store as an IIM dataset stream, records in ascending order
pub fn encode(iptc: &IptcData) -> MetaResult<Vec<u8>> {
    let mut sorted = iptc.clone();
    sorted.sort_by_key();

    let mut out = Vec::new();
    for datum in &sorted {
        let key = datum.key();
        let record = u8::try_from(key.record())
            .map_err(|_| MetaError::SerializationError(format!("Bad IPTC record in {}", key)))?;
        let dataset = u8::try_from(key.tag())
            .map_err(|_| MetaError::SerializationError(format!("Bad IPTC dataset in {}", key)))?;
        let body = encode_value(datum.value());

        if let Some(info) = iptc_datasets::dataset_info(key.tag(), key.record()) {
            if body.len() > info.max_len {
                log::debug!(
                    "{} exceeds its maximum length ({} > {})",
                    key,
                    body.len(),
                    info.max_len
                );
            }
        }

        out.extend_from_slice(&[IIM_MARKER, record, dataset]);
        if body.len() <= MAX_DATASET_LEN {
            out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        } else {
            out.extend_from_slice(&0x8004u16.to_be_bytes());
            out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&body);
    }
    Ok(out)
}
