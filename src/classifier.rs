//! Document classification.
//!
//! Decides whether a raw JSON payload is a single STAC object or an API
//! list envelope, and which object type an entry declares. Pure inspection,
//! no I/O.

use serde_json::Value;

use crate::types::ObjectType;

/// Shape of a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// `/collections` style envelope; entries live in `collections`.
    CollectionList(&'a [Value]),
    /// `/collections/{id}/items` style envelope; entries live in `features`.
    ItemList(&'a [Value]),
    /// A single STAC object.
    Single(&'a Value),
}

impl Payload<'_> {
    pub fn is_api_list(&self) -> bool {
        !matches!(self, Payload::Single(_))
    }
}

/// Classify a payload as an API list envelope or a single object.
///
/// An object with an array-valued `collections` property wins over one with
/// an array-valued `features` property; anything else is a single document.
pub fn classify_payload(data: &Value) -> Payload<'_> {
    if let Some(collections) = data.get("collections").and_then(Value::as_array) {
        Payload::CollectionList(collections)
    } else if let Some(features) = data.get("features").and_then(Value::as_array) {
        Payload::ItemList(features)
    } else {
        Payload::Single(data)
    }
}

/// Outcome of classifying one entry's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    /// A type this crate validates.
    Supported(ObjectType),
    /// `FeatureCollection`: explicitly skipped, never an error.
    Unsupported,
    /// Missing or unrecognized `type` value.
    Unknown,
}

/// Classify one entry by its declared `type`.
pub fn classify_type(data: &Value) -> TypeOutcome {
    match data.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => TypeOutcome::Unsupported,
        Some(value) => match ObjectType::from_type_field(value) {
            Some(object_type) => TypeOutcome::Supported(object_type),
            None => TypeOutcome::Unknown,
        },
        None => TypeOutcome::Unknown,
    }
}
