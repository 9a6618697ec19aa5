// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portable session token codec: `<marker>:~<base64 json>`.

use base64::engine::general_purpose::{GeneralPurpose, PAD, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::{Engine, alphabet};

use vortex_core::{SessionCredentials, VortexError};

/// Separator between the marker and the base64 payload.
pub const TOKEN_SEPARATOR: &str = ":~";

/// Standard alphabet that accepts payloads with or without `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes and decodes session tokens for one marker.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    prefix: String,
}

impl SessionCodec {
    pub fn new(marker: &str) -> Self {
        Self {
            prefix: format!("{marker}{TOKEN_SEPARATOR}"),
        }
    }

    /// The full prefix a token must start with, e.g. `kc:~`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Decodes a token to the exact JSON text it carries.
    ///
    /// The text is returned untouched so it can be written to the credential
    /// file verbatim; it is only checked to be a JSON object.
    pub fn decode_json(&self, token: &str) -> Result<String, VortexError> {
        let payload = token.trim().strip_prefix(&self.prefix).ok_or_else(|| {
            VortexError::InvalidFormat(format!("token must start with `{}`", self.prefix))
        })?;

        let bytes = LENIENT
            .decode(payload)
            .map_err(|e| VortexError::InvalidFormat(format!("payload is not base64: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|_| VortexError::InvalidFormat("payload is not UTF-8".to_string()))?;

        serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&json).map_err(
            |e| VortexError::InvalidFormat(format!("payload is not a JSON object: {e}")),
        )?;

        Ok(json)
    }

    pub fn decode(&self, token: &str) -> Result<SessionCredentials, VortexError> {
        let json = self.decode_json(token)?;
        SessionCredentials::from_json(&json)
            .map_err(|e| VortexError::InvalidFormat(format!("payload is not a JSON object: {e}")))
    }

    pub fn encode(&self, credentials: &SessionCredentials) -> String {
        format!("{}{}", self.prefix, STANDARD.encode(credentials.as_json()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> SessionCodec {
        SessionCodec::new("kc")
    }

    #[test]
    fn unpadded_payloads_decode() {
        let json = r#"{"registered":true,"me":{"id":"1@s.whatsapp.net"}}"#;
        let padded = STANDARD.encode(json);
        assert!(padded.ends_with('='));
        let token = format!("kc:~{}", padded.trim_end_matches('='));
        assert_eq!(codec().decode_json(&token).unwrap(), json);
    }

    #[test]
    fn decodes_marker_token() {
        let token = format!("kc:~{}", STANDARD.encode(r#"{"registered":true}"#));
        let creds = codec().decode(&token).unwrap();
        assert!(creds.is_registered());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let token = format!("  kc:~{}\n", STANDARD.encode("{}"));
        assert_eq!(codec().decode_json(&token).unwrap(), "{}");
    }

    #[test]
    fn missing_marker_is_invalid_format() {
        let token = STANDARD.encode("{}");
        assert!(matches!(
            codec().decode(&token),
            Err(VortexError::InvalidFormat(_))
        ));
        assert!(matches!(
            codec().decode(&format!("xx:~{token}")),
            Err(VortexError::InvalidFormat(_))
        ));
    }

    #[test]
    fn bad_base64_is_invalid_format() {
        assert!(matches!(
            codec().decode("kc:~***not base64***"),
            Err(VortexError::InvalidFormat(_))
        ));
    }

    #[test]
    fn non_json_payload_is_invalid_format() {
        let token = format!("kc:~{}", STANDARD.encode("hello"));
        assert!(matches!(
            codec().decode(&token),
            Err(VortexError::InvalidFormat(_))
        ));
        let array = format!("kc:~{}", STANDARD.encode("[1]"));
        assert!(codec().decode(&array).is_err());
    }

    #[test]
    fn decoded_text_is_verbatim() {
        let json = "{ \"noiseKey\" : {\"public\": \"AAA=\"},\n  \"registered\": false }";
        let token = format!("kc:~{}", STANDARD.encode(json));
        assert_eq!(codec().decode_json(&token).unwrap(), json);
    }

    #[test]
    fn custom_marker() {
        let codec = SessionCodec::new("vx");
        assert_eq!(codec.prefix(), "vx:~");
        let token = codec.encode(&SessionCredentials::fresh());
        assert_eq!(token, "vx:~e30=");
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(
            entries in proptest::collection::btree_map("[a-zA-Z]{1,12}", "[ -~]{0,24}", 0..8),
            registered in any::<bool>(),
        ) {
            let mut document = serde_json::Map::new();
            for (k, v) in entries {
                document.insert(k, serde_json::Value::String(v));
            }
            document.insert("registered".into(), serde_json::Value::Bool(registered));
            let creds = SessionCredentials::from_document(document);

            let token = codec().encode(&creds);
            let decoded = codec().decode(&token).unwrap();
            prop_assert_eq!(&decoded, &creds);
            prop_assert_eq!(codec().encode(&decoded), token);
        }
    }
}
