//! `rwportal-core` — domain building blocks shared by the portal crates.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP, no storage).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::NodeId;
pub use value_object::ValueObject;
