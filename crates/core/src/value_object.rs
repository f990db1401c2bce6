//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Two value objects with the same attributes are the same value. A batch key
/// (`lot`, `expiration`) is a value object; an inventory record is an entity,
/// because two rows with identical attributes are still two distinct batches.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
