// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque session credential document handed to the transport.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The credential set a transport needs to resume a login.
///
/// The document is opaque to Vortex except for the `registered` flag and the
/// `me.id` identity. The exact JSON text it was built from is kept alongside
/// the parsed form so that writing it back out is byte-for-byte faithful.
#[derive(Clone)]
pub struct SessionCredentials {
    document: Map<String, Value>,
    raw: String,
}

impl SessionCredentials {
    /// Parses a JSON object, keeping the original text verbatim.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let document: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self {
            document,
            raw: raw.to_string(),
        })
    }

    /// Builds credentials from an already-parsed document (credential rotation).
    pub fn from_document(document: Map<String, Value>) -> Self {
        let raw = Value::Object(document.clone()).to_string();
        Self { document, raw }
    }

    /// Empty credentials for a brand-new login that still has to be paired.
    pub fn fresh() -> Self {
        Self::from_document(Map::new())
    }

    /// The exact JSON text of this document.
    pub fn as_json(&self) -> &str {
        &self.raw
    }

    /// The parsed document.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Whether the transport has completed pairing for these credentials.
    pub fn is_registered(&self) -> bool {
        self.document
            .get("registered")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The account identity recorded in the document, if any.
    pub fn me_id(&self) -> Option<&str> {
        self.document.get("me")?.get("id")?.as_str()
    }
}

impl PartialEq for SessionCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Eq for SessionCredentials {}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SessionCredentials")
            .field("fields", &self.document.len())
            .field("registered", &self.is_registered())
            .field("me", &self.me_id())
            .finish()
    }
}

impl Serialize for SessionCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SessionCredentials {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_document)
    }
}
