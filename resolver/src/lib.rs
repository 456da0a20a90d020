//! # Resolver
//!
//! Device-identifier and product-family resolution: extracts a model/part
//! identifier from free text, fuzzy-matches it against a per-family device
//! registry, and classifies free text into a product family and sub-family
//! through an ordered pattern table.

pub mod device;
pub mod product;
pub mod registry;

pub use device::DeviceResolver;
pub use product::ProductClassifier;
pub use registry::{DeviceRegistry, RegistryError};
