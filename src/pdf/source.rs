//! Document source resolution
//!
//! Turns the string handed to the viewer into something an engine can
//! open: either a reference (URL or path) or the raw bytes embedded in a
//! `data:` URI.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::ViewerError;

const DATA_PREFIX: &str = "data:";

/// Accepts padded and unpadded payloads, the way browsers decode data URIs
const DATA_URI_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Source descriptor consumed by a rendering engine
#[derive(Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Reference to be fetched or opened by the engine
    Url(String),
    /// Document bytes decoded from a data URI
    Data(Vec<u8>),
}

impl std::fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Data(bytes) => write!(f, "Data({} bytes)", bytes.len()),
        }
    }
}

/// Checks whether a string is a data URI
#[must_use]
pub fn is_data_uri(input: &str) -> bool {
    input.starts_with(DATA_PREFIX)
}

/// Resolve a URL or data URI into a document source
pub fn resolve_source(input: &str) -> Result<DocumentSource, ViewerError> {
    if is_data_uri(input) {
        decode_data_uri(input).map(DocumentSource::Data)
    } else {
        Ok(DocumentSource::Url(input.to_string()))
    }
}

/// Decode the payload of a data URI into bytes
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ViewerError> {
    let Some(rest) = uri.strip_prefix(DATA_PREFIX) else {
        return Err(ViewerError::source_resolution("not a data URI"));
    };

    let Some((header, payload)) = rest.split_once(',') else {
        return Err(ViewerError::source_resolution(
            "data URI has no ',' separating header and payload",
        ));
    };

    if header.contains("base64") {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        DATA_URI_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| ViewerError::source_resolution(format!("invalid base64 payload: {e}")))
    } else {
        unescape(payload)
    }
}

/// Percent-unescape a payload into bytes.
///
/// Handles `%XX` and `%uXXXX`; every resulting code unit keeps only its
/// low byte.
fn unescape(payload: &str) -> Result<Vec<u8>, ViewerError> {
    let units: Vec<u16> = payload.encode_utf16().collect();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;

    while i < units.len() {
        if units[i] != u16::from(b'%') {
            out.push(units[i] as u8);
            i += 1;
            continue;
        }

        let (digits, consumed) = if units.get(i + 1) == Some(&u16::from(b'u')) {
            (units.get(i + 2..i + 6), 6)
        } else {
            (units.get(i + 1..i + 3), 3)
        };

        let value = digits.and_then(parse_hex_units).ok_or_else(|| {
            ViewerError::source_resolution(format!("invalid escape sequence at offset {i}"))
        })?;
        out.push(value as u8);
        i += consumed;
    }

    Ok(out)
}

fn parse_hex_units(units: &[u16]) -> Option<u32> {
    units.iter().try_fold(0u32, |acc, &unit| {
        let c = char::from_u32(u32::from(unit))?;
        Some(acc * 16 + c.to_digit(16)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_urls_pass_through() {
        let source = resolve_source("https://example.com/guide.pdf").unwrap();
        assert_eq!(
            source,
            DocumentSource::Url("https://example.com/guide.pdf".to_string())
        );
    }

    #[test]
    fn base64_data_uri_decodes_to_bytes() {
        let source = resolve_source("data:application/pdf;base64,JVBERi0xLjQ=").unwrap();
        assert_eq!(source, DocumentSource::Data(b"%PDF-1.4".to_vec()));
    }

    #[test]
    fn base64_without_padding_is_accepted() {
        let bytes = decode_data_uri("data:application/pdf;base64,JVBERi0xLjQ").unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[test]
    fn percent_encoded_data_uri_is_unescaped() {
        let bytes = decode_data_uri("data:application/pdf,%25PDF%2D1.4%u0041").unwrap();
        assert_eq!(bytes, b"%PDF-1.4A");
    }

    #[test]
    fn missing_comma_is_malformed() {
        let err = resolve_source("data:not-valid").unwrap_err();
        assert!(matches!(err, ViewerError::SourceResolution { .. }));
    }

    #[test]
    fn bad_base64_is_malformed() {
        let err = resolve_source("data:application/pdf;base64,!!!").unwrap_err();
        assert!(matches!(err, ViewerError::SourceResolution { .. }));
    }

    #[test]
    fn truncated_escape_is_malformed() {
        let err = decode_data_uri("data:,abc%4").unwrap_err();
        assert!(matches!(err, ViewerError::SourceResolution { .. }));
    }

    #[test]
    fn debug_hides_payload() {
        let source = DocumentSource::Data(vec![0; 42]);
        assert_eq!(format!("{source:?}"), "Data(42 bytes)");
    }
}
