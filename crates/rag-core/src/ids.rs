//! Canonical document identity.
//!
//! A canonical id is a fresh random 128-bit identifier (a UUIDv4) rendered
//! in its standard hyphenated textual form. Anything else ingested as an
//! `id` — a legacy millisecond-timestamp id like `doc_1754900000000`, a
//! short slug, an id from some prior schema — is non-canonical and is
//! carried as a `legacy_id` instead (see [`crate::Document`]).

use uuid::Uuid;

/// Generates a fresh canonical id.
pub fn new_canonical_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns whether `id` parses as a canonical (UUID) identifier.
pub fn is_canonical_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}
