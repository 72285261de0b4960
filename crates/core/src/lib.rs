//! `bonded-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod measure;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CargoItemId, HoldId, ReleaseId, ShipmentId, TransferId, WarehouseId};
pub use measure::{round_to, Measure};
pub use value_object::ValueObject;
