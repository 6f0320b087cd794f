//! Catalog entity types: units, conversion edges, items

pub mod edge;
pub mod item;
pub mod unit;

pub use edge::ConversionEdge;
pub use item::Item;
pub use unit::{CodeParseError, Dimension, Unit, UnitCode};
