//! # Units
//!
//! Extraction of measurement values/units from retrieved manual text and
//! unit conversion driven by conversational context. Extraction dispatches
//! on the specification-key category; conversion uses fixed unit-family
//! tables with temperature as the single affine case.

pub mod convert;
pub mod extract;

pub use convert::{convert, unit_family, UnitError, UnitFamily};
pub use extract::{ExtractedValue, SpecCategory, ValueExtractor, ValueKind};
