//! JSON encoding helpers for queue messages and record payloads.

use domain::report::error::ReportError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) fn encode<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>, ReportError> {
    serde_json::to_vec(value).map_err(|e| ReportError::Encode {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn encode_string<T: Serialize>(value: &T, what: &str) -> Result<String, ReportError> {
    serde_json::to_string(value).map_err(|e| ReportError::Encode {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

/// Decode an inbound queue message.
pub(crate) fn decode_message<T: DeserializeOwned>(
    payload: &[u8],
    what: &str,
) -> Result<T, ReportError> {
    serde_json::from_slice(payload).map_err(|e| ReportError::Decode {
        what: what.to_string(),
        reason: format!("{e} (data: {})", String::from_utf8_lossy(payload)),
    })
}

/// Decode a stored row; failures carry the raw row.
pub(crate) fn decode_record<T: DeserializeOwned>(
    data: &str,
    what: &'static str,
) -> Result<T, ReportError> {
    serde_json::from_str(data).map_err(|e| ReportError::CorruptRecord {
        what,
        reason: e.to_string(),
        data: data.to_string(),
    })
}
