//! Identifier encoding rules.
//!
//! Two encodings are in play:
//!
//! - Source submodel URNs are percent-encoded into a single path segment
//!   (`urn:ag.em:sm:train.1:pcf:1.0.0` → `urn%3Aag.em%3Asm%3Atrain.1%3Apcf%3A1.0.0`)
//! - Submodel ids referenced from registry descriptors are base64url-encoded
//!   without padding, per AAS Part 2

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters.
const URN_SEGMENT_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Derive the decoded submodel URN for an asset.
///
/// # Examples
///
/// ```
/// use sm_migrate_adapter_aas::submodel_urn;
///
/// let urn = submodel_urn("urn:ag.em:sm:", "train.1", ":pcf:1.0.0");
/// assert_eq!(urn, "urn:ag.em:sm:train.1:pcf:1.0.0");
/// ```
#[must_use]
pub fn submodel_urn(prefix: &str, asset: &str, suffix: &str) -> String {
    format!("{prefix}{asset}{suffix}")
}

/// Percent-encode a submodel URN for use as one URL path segment.
///
/// The asset part is encoded along with the prefix and suffix, so an asset
/// name containing `/`, `?` or `#` cannot split the segment.
///
/// # Examples
///
/// ```
/// use sm_migrate_adapter_aas::encode_submodel_id;
///
/// let encoded = encode_submodel_id("urn:ag.em:sm:train.1:pcf:1.0.0");
/// assert_eq!(encoded, "urn%3Aag.em%3Asm%3Atrain.1%3Apcf%3A1.0.0");
/// ```
#[must_use]
pub fn encode_submodel_id(urn: &str) -> String {
    utf8_percent_encode(urn, URN_SEGMENT_ESCAPE).to_string()
}

/// Decode a percent-encoded submodel URN.
///
/// # Errors
///
/// Returns error if the input contains invalid UTF-8 sequences.
pub fn decode_submodel_id(encoded: &str) -> Result<String, EncodingError> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| EncodingError::Utf8Decode(e.to_string()))
}

/// Encode an AAS identifier using base64url without padding.
///
/// # Examples
///
/// ```
/// use sm_migrate_adapter_aas::encode_id_base64url;
///
/// let encoded = encode_id_base64url("urn:ag.em:sm:train.1:pcf:1.0.0");
/// assert!(!encoded.contains('='));
/// assert!(!encoded.contains('+'));
/// assert!(!encoded.contains('/'));
/// ```
#[must_use]
pub fn encode_id_base64url(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Decode a base64url-encoded AAS identifier.
///
/// # Errors
///
/// Returns error if the input is not valid base64url or not UTF-8.
///
/// # Examples
///
/// ```
/// use sm_migrate_adapter_aas::{decode_id_base64url, encode_id_base64url};
///
/// let encoded = encode_id_base64url("sm-1");
/// assert_eq!(decode_id_base64url(&encoded).unwrap(), "sm-1");
/// ```
pub fn decode_id_base64url(encoded: &str) -> Result<String, EncodingError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| EncodingError::Base64Decode(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| EncodingError::Utf8Decode(e.to_string()))
}

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// Base64 decoding failed
    #[error("base64 decode error: {0}")]
    Base64Decode(String),
    /// UTF-8 decoding failed
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(String),
}
