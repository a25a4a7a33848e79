use crate::rule::FieldRule;
use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Bson, Document};

/// Raw byte width of an object id.
const OBJECT_ID_LEN: usize = 12;

/// Normalizes every object id in a record tree to its lowercase hex string.
///
/// Walks documents and arrays recursively, so reference fields nested in
/// sub-documents (a message's `to`/`from`) are normalized along with
/// top-level ids. Scalar leaves are never descended into, and a binary
/// value that is not identifier-shaped is left untouched rather than
/// failing the whole record. Applying the walk twice is the same as
/// applying it once.
pub fn normalize_ids(data: Bson) -> Bson {
    match data {
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(key, value)| (key, normalize_value(value)))
                .collect(),
        ),
        Bson::Array(items) => Bson::Array(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

fn normalize_value(value: Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::Binary(binary) => match binary_identifier_hex(&binary) {
            Some(hex) => Bson::String(hex),
            None => Bson::Binary(binary),
        },
        Bson::Document(_) | Bson::Array(_) => normalize_ids(value),
        other => other,
    }
}

fn binary_identifier_hex(binary: &bson::Binary) -> Option<String> {
    if binary.subtype != BinarySubtype::Generic {
        return None;
    }
    let raw: [u8; OBJECT_ID_LEN] = binary.bytes.as_slice().try_into().ok()?;
    Some(ObjectId::from_bytes(raw).to_hex())
}

/// Returns the canonical string form of an id value, if it has one.
///
/// Object ids and identifier-shaped binaries map to lowercase hex; strings
/// pass through via [`canonical_id_str`]. Anything else is not an id.
pub fn canonical_id(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::Binary(binary) => binary_identifier_hex(binary),
        Bson::String(value) => Some(canonical_id_str(value)),
        _ => None,
    }
}

/// Canonicalizes an id already in string form.
///
/// Hex object ids are re-emitted lowercase; any other string is returned
/// as supplied.
pub fn canonical_id_str(value: &str) -> String {
    match ObjectId::parse_str(value) {
        Ok(oid) => oid.to_hex(),
        Err(_) => value.to_string(),
    }
}

/// Normalizes ids, then projects the record down to the allowed fields.
pub(crate) fn apply(rule: &FieldRule, data: Bson) -> Bson {
    project(rule, normalize_ids(data))
}

fn project(rule: &FieldRule, data: Bson) -> Bson {
    match data {
        Bson::Document(doc) => Bson::Document(project_document(rule, doc)),
        Bson::Array(items) => {
            Bson::Array(items.into_iter().map(|item| project(rule, item)).collect())
        }
        other => other,
    }
}

fn project_document(rule: &FieldRule, doc: Document) -> Document {
    doc.into_iter()
        .filter(|(key, _)| rule.allows(key))
        .collect()
}
