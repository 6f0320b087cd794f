//! ConversionEdge entity type - an admin-defined affine rule between two units

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::unit::UnitCode;
use crate::convert::transform::Affine;
use crate::core::identity::{EntityId, EntityPrefix};

/// A directed conversion rule: `to = factor * from + offset`
///
/// The ordered pair `(from_code, to_code)` is unique in the catalog.
/// Edges are soft-deleted so an upsert of the same pair revives the
/// row instead of creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionEdge {
    /// Unique identifier
    pub id: EntityId,

    /// Source unit code
    pub from_code: UnitCode,

    /// Target unit code (same dimension as the source)
    pub to_code: UnitCode,

    /// Multiplicative factor (positive)
    #[serde(with = "rust_decimal::serde::str")]
    pub factor: Decimal,

    /// Additive offset (zero for factor-only conversions)
    #[serde(with = "rust_decimal::serde::str")]
    pub offset: Decimal,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Last update timestamp
    pub updated: DateTime<Utc>,

    /// Soft-delete timestamp; `None` means active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Author (who created this rule)
    pub author: String,
}

impl ConversionEdge {
    /// Create a new active edge
    pub fn new(
        from_code: UnitCode,
        to_code: UnitCode,
        factor: Decimal,
        offset: Decimal,
        author: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Conv),
            from_code,
            to_code,
            factor,
            offset,
            created: now,
            updated: now,
            deleted_at: None,
            author,
        }
    }

    /// The affine transform this edge stores, in its forward direction
    pub fn transform(&self) -> Affine {
        Affine::new(self.factor, self.offset)
    }

    /// Whether the edge is active (not soft-deleted)
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
