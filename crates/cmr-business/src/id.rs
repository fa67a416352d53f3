//! Instance id derivation
//!
//! Application and business transaction ids are derived from the pair
//! `(name, definition_id)`. The derivation is pure and reproducible across
//! process restarts, so ids computed from persisted definitions always match
//! the ids handed out earlier.
//!
//! # Mixing function
//!
//! ```text
//! derive(name, 0)  = 0
//! derive(name, id) = 31 * (31 * 1 + hash(name)) + id      (wrapping i32)
//! hash(s)          = fold(0, |h, u| 31 * h + u)            (u: UTF-16 code units, wrapping i32)
//! ```

/// Derived identifier of an application or business transaction
pub type InstanceId = i32;

/// Identifier of an application or business transaction definition
pub type DefinitionId = i32;

/// Id reserved for the default application / default business transaction
pub const DEFAULT_INSTANCE_ID: InstanceId = 0;

const PRIME: i32 = 31;

/// Stable polynomial hash of a string
///
/// Iterates UTF-16 code units so the value does not depend on the host's
/// hasher seed or on the in-memory string encoding.
#[must_use]
pub fn string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |h, unit| PRIME.wrapping_mul(h).wrapping_add(i32::from(unit)))
}

/// Derive the instance id for `(name, definition_id)`
///
/// A `definition_id` of zero denotes the default definition and always maps
/// to [`DEFAULT_INSTANCE_ID`], whatever the name.
#[must_use]
pub fn derive_instance_id(name: &str, definition_id: DefinitionId) -> InstanceId {
    if definition_id == 0 {
        return DEFAULT_INSTANCE_ID;
    }

    let mut result: i32 = 1;
    result = PRIME.wrapping_mul(result).wrapping_add(string_hash(name));
    result = PRIME.wrapping_mul(result).wrapping_add(definition_id);
    result
}
