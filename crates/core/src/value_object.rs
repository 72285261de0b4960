//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances with
/// the same attribute values are interchangeable. `Measure` (quantity + weight)
/// is the central one in this domain.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
