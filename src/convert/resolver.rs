//! Conversion resolution
//!
//! `Converter` ties the catalog store, the per-dimension graph, and
//! the transform cache together. Resolution order: validate both
//! units, guard dimensions, check the cache, then fall back to a BFS
//! over the active edge snapshot. A resolved transform is cached for
//! its direction only; the reverse resolves on its own first request.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::unit::{Dimension, UnitCode};
use crate::convert::cache::TransformCache;
use crate::convert::graph::DimensionGraph;
use crate::convert::transform::Affine;
use crate::core::store::{CatalogDb, StoreError};

/// Errors from conversion resolution
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("cannot convert '{from}' ({from_dim}) to '{to}' ({to_dim}): different dimensions")]
    DimensionMismatch {
        from: String,
        from_dim: Dimension,
        to: String,
        to_dim: Dimension,
    },

    #[error("no conversion path from '{from}' to '{to}' in dimension '{dimension}'")]
    NoConversionPath {
        from: String,
        to: String,
        dimension: Dimension,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an item-aware conversion
///
/// `base_qty` is the quantity expressed in the item's base unit, the
/// pivot of the two-hop path; `qty` is the final requested target.
#[derive(Debug, Clone)]
pub struct ItemConversion {
    pub item_code: String,
    pub base_unit: UnitCode,
    pub base_qty: Decimal,
    pub qty: Decimal,
    pub from: UnitCode,
    pub to: UnitCode,
}

/// Resolves and applies unit conversions against a catalog snapshot
pub struct Converter<'a> {
    db: &'a CatalogDb,
    cache: &'a TransformCache,
}

impl<'a> Converter<'a> {
    pub fn new(db: &'a CatalogDb, cache: &'a TransformCache) -> Self {
        Self { db, cache }
    }

    /// Resolve the net transform from one unit to another
    ///
    /// Identity conversions short-circuit without touching the cache.
    pub fn resolve(&self, from: &UnitCode, to: &UnitCode) -> Result<Affine, ConvertError> {
        let from_unit = self
            .db
            .find_unit(from)?
            .ok_or_else(|| ConvertError::UnknownUnit(from.to_string()))?;
        let to_unit = self
            .db
            .find_unit(to)?
            .ok_or_else(|| ConvertError::UnknownUnit(to.to_string()))?;

        if from_unit.dimension != to_unit.dimension {
            return Err(ConvertError::DimensionMismatch {
                from: from.to_string(),
                from_dim: from_unit.dimension,
                to: to.to_string(),
                to_dim: to_unit.dimension,
            });
        }
        if from == to {
            return Ok(Affine::IDENTITY);
        }

        if let Some(cached) = self.cache.get(from, to) {
            return Ok(cached);
        }

        let edges = self.db.active_edges(&from_unit.dimension)?;
        let graph = DimensionGraph::build(&edges);
        match graph.compose_path(from, to) {
            Some(transform) => {
                self.cache.put(from, to, transform);
                Ok(transform)
            }
            None => Err(ConvertError::NoConversionPath {
                from: from.to_string(),
                to: to.to_string(),
                dimension: from_unit.dimension,
            }),
        }
    }

    /// Convert a quantity between two units
    pub fn convert(
        &self,
        quantity: Decimal,
        from: &UnitCode,
        to: &UnitCode,
    ) -> Result<Decimal, ConvertError> {
        Ok(self.resolve(from, to)?.apply(quantity))
    }

    /// Convert a quantity in the context of an item's base unit
    ///
    /// The path always pivots through the item's base unit so the
    /// base-unit quantity is available for stock bookkeeping. When
    /// either end already is the base unit, the pivot hop is identity.
    pub fn convert_for_item(
        &self,
        item_code: &str,
        quantity: Decimal,
        from: &UnitCode,
        to: &UnitCode,
    ) -> Result<ItemConversion, ConvertError> {
        let item = self.db.require_item(item_code)?;
        let base = &item.base_unit_code;

        let base_qty = self.convert(quantity, from, base)?;
        let qty = if to == base {
            base_qty
        } else {
            self.convert(base_qty, base, to)?
        };

        Ok(ItemConversion {
            item_code: item.code,
            base_unit: base.clone(),
            base_qty,
            qty,
            from: from.clone(),
            to: to.clone(),
        })
    }
}
