//! Item entity type - an inventory part bound to a canonical base unit
//!
//! Items store on-hand quantities in exactly one base unit. The
//! conversion engine only ever reads `base_unit_code`; all stock
//! movements must be expressible against it even when a caller
//! supplies a different unit (receive in "box", store in "ea").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::unit::UnitCode;
use crate::core::identity::{EntityId, EntityPrefix};

/// An Item entity - inventory part with its base-unit binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: EntityId,

    /// Unique item code (normalized lowercase)
    pub code: String,

    /// Display name
    pub name: String,

    /// Unit in which this item's stock quantity is canonically stored
    pub base_unit_code: UnitCode,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this item)
    pub author: String,
}

impl Item {
    /// Create a new item with the given base unit
    pub fn new(code: &str, name: String, base_unit_code: UnitCode, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Item),
            code: code.trim().to_lowercase(),
            name,
            base_unit_code,
            created: Utc::now(),
            author,
        }
    }
}
