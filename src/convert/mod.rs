//! Conversion engine: affine transforms, per-dimension graphs,
//! cached resolution

pub mod cache;
pub mod graph;
pub mod resolver;
pub mod transform;

pub use cache::{TransformCache, TransformCacheStats};
pub use graph::DimensionGraph;
pub use resolver::{ConvertError, Converter, ItemConversion};
pub use transform::Affine;
