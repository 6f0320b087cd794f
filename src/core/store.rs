//! SQLite-backed catalog store
//!
//! Persists the unit catalog, the conversion edge set, and item
//! base-unit bindings in `.metron/catalog.db`. All referential
//! integrity lives here: deletes are guarded, never cascaded, and a
//! unit's dimension is locked once conversion rules reference it.
//!
//! Conversion edges are soft-deleted; the `(from_code, to_code)` pair
//! stays unique across live and deleted rows so an upsert of the same
//! pair revives the row in place.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::edge::ConversionEdge;
use crate::catalog::item::Item;
use crate::catalog::unit::{Dimension, Unit, UnitCode};

/// Current schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// One page of a cursor-paginated listing
#[derive(Debug)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Cursor to pass back for the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

/// Optional filters for listing units
#[derive(Debug, Default)]
pub struct UnitFilter {
    pub dimension: Option<Dimension>,
}

/// Optional filters for listing conversion edges
#[derive(Debug, Default)]
pub struct EdgeFilter {
    pub from_code: Option<UnitCode>,
    pub to_code: Option<UnitCode>,
    pub dimension: Option<Dimension>,
    pub include_deleted: bool,
}

/// Fields that can change on an existing unit
#[derive(Debug, Default)]
pub struct UnitPatch {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub dimension: Option<Dimension>,
    pub is_si_base: Option<bool>,
}

impl UnitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.symbol.is_none()
            && self.dimension.is_none()
            && self.is_si_base.is_none()
    }
}

/// Catalog store statistics
#[derive(Debug, Default)]
pub struct StoreStats {
    pub units: usize,
    pub active_edges: usize,
    pub deleted_edges: usize,
    pub items: usize,
    pub units_by_dimension: HashMap<String, usize>,
}

/// Errors from the catalog store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("unit '{0}' already exists")]
    DuplicateUnit(String),

    #[error("dimension '{dimension}' already has SI base unit '{existing}'")]
    DuplicateSiBase {
        dimension: Dimension,
        existing: String,
    },

    #[error("cannot delete unit '{code}': {reason}")]
    UnitInUse { code: String, reason: String },

    #[error("cannot change dimension of '{code}': {edges} conversion rule(s) reference it")]
    DimensionLocked { code: String, edges: usize },

    #[error("conversion factor must be positive, got {0}")]
    InvalidFactor(Decimal),

    #[error("conversion from '{0}' to itself is not allowed")]
    SelfConversion(String),

    #[error("units '{from}' ({from_dim}) and '{to}' ({to_dim}) are in different dimensions")]
    DimensionMismatch {
        from: String,
        from_dim: Dimension,
        to: String,
        to_dim: Dimension,
    },

    #[error("no conversion rule from '{0}' to '{1}'")]
    UnknownEdge(String, String),

    #[error("unknown item: '{0}'")]
    UnknownItem(String),

    #[error("item '{0}' already exists")]
    DuplicateItem(String),

    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The catalog database
pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open or create the catalog database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // WAL for better behavior when a reader overlaps an admin edit
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory catalog (tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version for migrations
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Unit catalog
            CREATE TABLE IF NOT EXISTS units (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                symbol TEXT,
                dimension TEXT NOT NULL,
                is_si_base INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                author TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_units_dimension ON units(dimension);

            -- Pairwise conversion rules (soft-deleted, pair unique)
            CREATE TABLE IF NOT EXISTS conversion_edges (
                id TEXT PRIMARY KEY,
                from_code TEXT NOT NULL,
                to_code TEXT NOT NULL,
                factor TEXT NOT NULL,
                offset TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                deleted_at TEXT,
                author TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_edges_pair
                ON conversion_edges(from_code, to_code);
            CREATE INDEX IF NOT EXISTS idx_edges_from ON conversion_edges(from_code);
            CREATE INDEX IF NOT EXISTS idx_edges_to ON conversion_edges(to_code);

            -- Inventory items with their base-unit binding
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                base_unit_code TEXT NOT NULL,
                created TEXT NOT NULL,
                author TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_items_base_unit ON items(base_unit_code);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Insert a new unit, enforcing code uniqueness and the
    /// one-SI-base-per-dimension invariant
    pub fn insert_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        if self.find_unit(&unit.code)?.is_some() {
            return Err(StoreError::DuplicateUnit(unit.code.to_string()));
        }
        if unit.is_si_base {
            self.check_si_base_free(&unit.dimension, None)?;
        }

        self.conn.execute(
            r#"INSERT INTO units (id, code, name, symbol, dimension, is_si_base, created, updated, author)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                unit.id.to_string(),
                unit.code.as_str(),
                unit.name,
                unit.symbol,
                unit.dimension.as_str(),
                unit.is_si_base as i32,
                unit.created.to_rfc3339(),
                unit.updated.to_rfc3339(),
                unit.author,
            ],
        )?;

        Ok(())
    }

    /// Look up a unit by code
    pub fn find_unit(&self, code: &UnitCode) -> Result<Option<Unit>, StoreError> {
        let unit = self
            .conn
            .query_row(
                "SELECT id, code, name, symbol, dimension, is_si_base, created, updated, author
                 FROM units WHERE code = ?1",
                params![code.as_str()],
                unit_from_row,
            )
            .optional()?;
        Ok(unit)
    }

    /// Look up a unit by code, failing with `UnknownUnit` when absent
    pub fn require_unit(&self, code: &UnitCode) -> Result<Unit, StoreError> {
        self.find_unit(code)?
            .ok_or_else(|| StoreError::UnknownUnit(code.to_string()))
    }

    /// Dimension of a unit (`UnknownUnit` when the code is absent)
    pub fn dimension_of(&self, code: &UnitCode) -> Result<Dimension, StoreError> {
        Ok(self.require_unit(code)?.dimension)
    }

    /// List units with optional dimension filter and cursor pagination
    /// (keyset on code, ascending)
    pub fn list_units(
        &self,
        filter: &UnitFilter,
        cursor: Option<&str>,
        per_page: usize,
    ) -> Result<Page<Unit>, StoreError> {
        let mut sql = String::from(
            "SELECT id, code, name, symbol, dimension, is_si_base, created, updated, author
             FROM units",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(dim) = &filter.dimension {
            clauses.push("dimension = ?");
            binds.push(dim.to_string());
        }
        if let Some(cursor) = cursor {
            clauses.push("code > ?");
            binds.push(cursor.to_string());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY code LIMIT {}", per_page + 1));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows: Vec<Unit> = stmt
            .query_map(params_from_iter(&binds), unit_from_row)?
            .collect::<Result<_, _>>()?;

        let next_cursor = if rows.len() > per_page {
            rows.truncate(per_page);
            rows.last().map(|u| u.code.to_string())
        } else {
            None
        };

        Ok(Page { rows, next_cursor })
    }

    /// Apply a partial update to a unit, returning (before, after)
    pub fn update_unit(
        &self,
        code: &UnitCode,
        patch: &UnitPatch,
    ) -> Result<(Unit, Unit), StoreError> {
        let before = self.require_unit(code)?;
        let mut after = before.clone();

        if let Some(name) = &patch.name {
            after.name = name.clone();
        }
        if let Some(symbol) = &patch.symbol {
            after.symbol = Some(symbol.clone());
        }
        if let Some(dimension) = &patch.dimension {
            if *dimension != before.dimension {
                let edges = self.edge_refs(code)?;
                if edges > 0 {
                    return Err(StoreError::DimensionLocked {
                        code: code.to_string(),
                        edges,
                    });
                }
                after.dimension = dimension.clone();
            }
        }
        if let Some(is_si_base) = patch.is_si_base {
            after.is_si_base = is_si_base;
        }
        if after.is_si_base {
            self.check_si_base_free(&after.dimension, Some(code))?;
        }
        after.updated = Utc::now();

        self.conn.execute(
            r#"UPDATE units
               SET name = ?1, symbol = ?2, dimension = ?3, is_si_base = ?4, updated = ?5
               WHERE code = ?6"#,
            params![
                after.name,
                after.symbol,
                after.dimension.as_str(),
                after.is_si_base as i32,
                after.updated.to_rfc3339(),
                code.as_str(),
            ],
        )?;

        Ok((before, after))
    }

    /// Delete a unit, rejecting when it is the SI base or referenced
    /// by any active conversion rule or any item's base unit
    pub fn delete_unit(&self, code: &UnitCode) -> Result<Unit, StoreError> {
        let unit = self.require_unit(code)?;

        if let Some(reason) = self.delete_block_reason(&unit)? {
            return Err(StoreError::UnitInUse {
                code: code.to_string(),
                reason,
            });
        }

        self.conn
            .execute("DELETE FROM units WHERE code = ?1", params![code.as_str()])?;
        Ok(unit)
    }

    /// Whether a unit could be deleted right now
    pub fn can_delete_unit(&self, code: &UnitCode) -> Result<bool, StoreError> {
        let unit = self.require_unit(code)?;
        Ok(self.delete_block_reason(&unit)?.is_none())
    }

    fn delete_block_reason(&self, unit: &Unit) -> Result<Option<String>, StoreError> {
        if unit.is_si_base {
            return Ok(Some(format!(
                "it is the SI base unit for dimension '{}'",
                unit.dimension
            )));
        }
        let edges = self.edge_refs(&unit.code)?;
        if edges > 0 {
            return Ok(Some(format!(
                "{} active conversion rule(s) reference it",
                edges
            )));
        }
        let items = self.item_refs(&unit.code)?;
        if items > 0 {
            return Ok(Some(format!("{} item(s) store stock in it", items)));
        }
        Ok(None)
    }

    /// Count of active edges touching a unit
    fn edge_refs(&self, code: &UnitCode) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM conversion_edges
             WHERE deleted_at IS NULL AND (from_code = ?1 OR to_code = ?1)",
            params![code.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Count of items whose base unit is this code
    fn item_refs(&self, code: &UnitCode) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE base_unit_code = ?1",
            params![code.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Reject when another unit already claims SI base for a dimension
    fn check_si_base_free(
        &self,
        dimension: &Dimension,
        except: Option<&UnitCode>,
    ) -> Result<(), StoreError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT code FROM units WHERE dimension = ?1 AND is_si_base = 1",
                params![dimension.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing) = existing {
            if except.map(|c| c.as_str()) != Some(existing.as_str()) {
                return Err(StoreError::DuplicateSiBase {
                    dimension: dimension.clone(),
                    existing,
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversion edges
    // ------------------------------------------------------------------

    /// Create or revive the rule for an ordered pair, returning the
    /// edge and whether it was newly created
    pub fn upsert_edge(
        &self,
        from: &UnitCode,
        to: &UnitCode,
        factor: Decimal,
        offset: Decimal,
        author: &str,
    ) -> Result<(ConversionEdge, bool), StoreError> {
        if factor <= Decimal::ZERO {
            return Err(StoreError::InvalidFactor(factor));
        }
        if from == to {
            return Err(StoreError::SelfConversion(from.to_string()));
        }
        let from_unit = self.require_unit(from)?;
        let to_unit = self.require_unit(to)?;
        if from_unit.dimension != to_unit.dimension {
            return Err(StoreError::DimensionMismatch {
                from: from.to_string(),
                from_dim: from_unit.dimension,
                to: to.to_string(),
                to_dim: to_unit.dimension,
            });
        }

        match self.find_edge(from, to, true)? {
            Some(mut edge) => {
                let now = Utc::now();
                self.conn.execute(
                    r#"UPDATE conversion_edges
                       SET factor = ?1, offset = ?2, updated = ?3, deleted_at = NULL
                       WHERE from_code = ?4 AND to_code = ?5"#,
                    params![
                        factor.to_string(),
                        offset.to_string(),
                        now.to_rfc3339(),
                        from.as_str(),
                        to.as_str(),
                    ],
                )?;
                edge.factor = factor;
                edge.offset = offset;
                edge.updated = now;
                edge.deleted_at = None;
                Ok((edge, false))
            }
            None => {
                let edge = ConversionEdge::new(
                    from.clone(),
                    to.clone(),
                    factor,
                    offset,
                    author.to_string(),
                );
                self.conn.execute(
                    r#"INSERT INTO conversion_edges
                       (id, from_code, to_code, factor, offset, created, updated, deleted_at, author)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)"#,
                    params![
                        edge.id.to_string(),
                        edge.from_code.as_str(),
                        edge.to_code.as_str(),
                        edge.factor.to_string(),
                        edge.offset.to_string(),
                        edge.created.to_rfc3339(),
                        edge.updated.to_rfc3339(),
                        edge.author,
                    ],
                )?;
                Ok((edge, true))
            }
        }
    }

    /// Look up the rule for an ordered pair
    pub fn find_edge(
        &self,
        from: &UnitCode,
        to: &UnitCode,
        include_deleted: bool,
    ) -> Result<Option<ConversionEdge>, StoreError> {
        let mut sql = String::from(
            "SELECT id, from_code, to_code, factor, offset, created, updated, deleted_at, author
             FROM conversion_edges WHERE from_code = ?1 AND to_code = ?2",
        );
        if !include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        let edge = self
            .conn
            .query_row(&sql, params![from.as_str(), to.as_str()], edge_from_row)
            .optional()?;
        Ok(edge)
    }

    /// Soft-delete the active rule for an ordered pair
    pub fn soft_delete_edge(
        &self,
        from: &UnitCode,
        to: &UnitCode,
    ) -> Result<ConversionEdge, StoreError> {
        let mut edge = self
            .find_edge(from, to, false)?
            .ok_or_else(|| StoreError::UnknownEdge(from.to_string(), to.to_string()))?;

        let now = Utc::now();
        self.conn.execute(
            "UPDATE conversion_edges SET deleted_at = ?1, updated = ?2
             WHERE from_code = ?3 AND to_code = ?4",
            params![
                now.to_rfc3339(),
                now.to_rfc3339(),
                from.as_str(),
                to.as_str(),
            ],
        )?;
        edge.deleted_at = Some(now);
        edge.updated = now;
        Ok(edge)
    }

    /// List edges with optional filters, ordered by creation (ULID)
    pub fn list_edges(&self, filter: &EdgeFilter) -> Result<Vec<ConversionEdge>, StoreError> {
        let mut sql = String::from(
            "SELECT e.id, e.from_code, e.to_code, e.factor, e.offset, e.created, e.updated,
                    e.deleted_at, e.author
             FROM conversion_edges e JOIN units u ON u.code = e.from_code",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(from) = &filter.from_code {
            clauses.push("e.from_code = ?");
            binds.push(from.to_string());
        }
        if let Some(to) = &filter.to_code {
            clauses.push("e.to_code = ?");
            binds.push(to.to_string());
        }
        if let Some(dim) = &filter.dimension {
            clauses.push("u.dimension = ?");
            binds.push(dim.to_string());
        }
        if !filter.include_deleted {
            clauses.push("e.deleted_at IS NULL");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY e.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let edges = stmt
            .query_map(params_from_iter(&binds), edge_from_row)?
            .collect::<Result<_, _>>()?;
        Ok(edges)
    }

    /// Active-edge snapshot for one dimension, in creation order
    /// (creation order is the BFS tie-break between equal-length paths)
    pub fn active_edges(&self, dimension: &Dimension) -> Result<Vec<ConversionEdge>, StoreError> {
        self.list_edges(&EdgeFilter {
            dimension: Some(dimension.clone()),
            ..EdgeFilter::default()
        })
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Insert a new item; its base unit must exist
    pub fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        if self.find_item(&item.code)?.is_some() {
            return Err(StoreError::DuplicateItem(item.code.clone()));
        }
        self.require_unit(&item.base_unit_code)?;

        self.conn.execute(
            r#"INSERT INTO items (id, code, name, base_unit_code, created, author)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                item.id.to_string(),
                item.code,
                item.name,
                item.base_unit_code.as_str(),
                item.created.to_rfc3339(),
                item.author,
            ],
        )?;
        Ok(())
    }

    /// Look up an item by code
    pub fn find_item(&self, code: &str) -> Result<Option<Item>, StoreError> {
        let normalized = code.trim().to_lowercase();
        let item = self
            .conn
            .query_row(
                "SELECT id, code, name, base_unit_code, created, author
                 FROM items WHERE code = ?1",
                params![normalized],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Look up an item, failing with `UnknownItem` when absent
    pub fn require_item(&self, code: &str) -> Result<Item, StoreError> {
        self.find_item(code)?
            .ok_or_else(|| StoreError::UnknownItem(code.trim().to_lowercase()))
    }

    /// List all items, ordered by code
    pub fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, name, base_unit_code, created, author
             FROM items ORDER BY code",
        )?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<Result<_, _>>()?;
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    pub fn statistics(&self) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();

        stats.units = self
            .conn
            .query_row("SELECT COUNT(*) FROM units", [], |r| r.get::<_, i64>(0))?
            as usize;
        stats.active_edges = self.conn.query_row(
            "SELECT COUNT(*) FROM conversion_edges WHERE deleted_at IS NULL",
            [],
            |r| r.get::<_, i64>(0),
        )? as usize;
        stats.deleted_edges = self.conn.query_row(
            "SELECT COUNT(*) FROM conversion_edges WHERE deleted_at IS NOT NULL",
            [],
            |r| r.get::<_, i64>(0),
        )? as usize;
        stats.items = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |r| r.get::<_, i64>(0))?
            as usize;

        let mut stmt = self
            .conn
            .prepare("SELECT dimension, COUNT(*) FROM units GROUP BY dimension")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (dimension, count) = row?;
            stats.units_by_dimension.insert(dimension, count as usize);
        }

        Ok(stats)
    }
}

// ----------------------------------------------------------------------
// Row mapping
// ----------------------------------------------------------------------

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_datetime(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parse_decimal(idx: usize, raw: String) -> rusqlite::Result<Decimal> {
    raw.parse::<Decimal>().map_err(|e| conversion_failure(idx, e))
}

fn unit_from_row(row: &Row) -> rusqlite::Result<Unit> {
    let id: String = row.get(0)?;
    let code: String = row.get(1)?;
    let dimension: String = row.get(4)?;
    let created: String = row.get(6)?;
    let updated: String = row.get(7)?;

    Ok(Unit {
        id: id.parse().map_err(|e| conversion_failure(0, e))?,
        code: code.parse().map_err(|e| conversion_failure(1, e))?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        dimension: dimension.parse().map_err(|e| conversion_failure(4, e))?,
        is_si_base: row.get::<_, i64>(5)? != 0,
        created: parse_datetime(6, created)?,
        updated: parse_datetime(7, updated)?,
        author: row.get(8)?,
    })
}

fn edge_from_row(row: &Row) -> rusqlite::Result<ConversionEdge> {
    let id: String = row.get(0)?;
    let from_code: String = row.get(1)?;
    let to_code: String = row.get(2)?;
    let factor: String = row.get(3)?;
    let offset: String = row.get(4)?;
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;
    let deleted_at: Option<String> = row.get(7)?;

    Ok(ConversionEdge {
        id: id.parse().map_err(|e| conversion_failure(0, e))?,
        from_code: from_code.parse().map_err(|e| conversion_failure(1, e))?,
        to_code: to_code.parse().map_err(|e| conversion_failure(2, e))?,
        factor: parse_decimal(3, factor)?,
        offset: parse_decimal(4, offset)?,
        created: parse_datetime(5, created)?,
        updated: parse_datetime(6, updated)?,
        deleted_at: deleted_at.map(|raw| parse_datetime(7, raw)).transpose()?,
        author: row.get(8)?,
    })
}

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    let id: String = row.get(0)?;
    let base_unit_code: String = row.get(3)?;
    let created: String = row.get(4)?;

    Ok(Item {
        id: id.parse().map_err(|e| conversion_failure(0, e))?,
        code: row.get(1)?,
        name: row.get(2)?,
        base_unit_code: base_unit_code
            .parse()
            .map_err(|e| conversion_failure(3, e))?,
        created: parse_datetime(4, created)?,
        author: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    fn dim(s: &str) -> Dimension {
        Dimension::new(s).unwrap()
    }

    fn unit(c: &str, d: &str, si: bool) -> Unit {
        Unit::new(code(c), c.to_string(), dim(d), si, "test".to_string())
    }

    fn seed_length(db: &CatalogDb) {
        db.insert_unit(&unit("m", "length", true)).unwrap();
        db.insert_unit(&unit("cm", "length", false)).unwrap();
        db.insert_unit(&unit("km", "length", false)).unwrap();
        db.upsert_edge(&code("cm"), &code("m"), dec!(0.01), Decimal::ZERO, "test")
            .unwrap();
    }

    #[test]
    fn test_insert_and_find_unit() {
        let db = CatalogDb::open_in_memory().unwrap();
        db.insert_unit(&unit("m", "length", true)).unwrap();

        let found = db.find_unit(&code("m")).unwrap().unwrap();
        assert_eq!(found.code.as_str(), "m");
        assert!(found.is_si_base);
        assert_eq!(found.dimension, dim("length"));
        assert!(db.find_unit(&code("kg")).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let db = CatalogDb::open_in_memory().unwrap();
        db.insert_unit(&unit("m", "length", true)).unwrap();
        let err = db.insert_unit(&unit("m", "length", false)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUnit(_)));
    }

    #[test]
    fn test_single_si_base_per_dimension() {
        let db = CatalogDb::open_in_memory().unwrap();
        db.insert_unit(&unit("m", "length", true)).unwrap();
        let err = db.insert_unit(&unit("ft", "length", true)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSiBase { .. }));

        // A second dimension may of course have its own base
        db.insert_unit(&unit("kg", "mass", true)).unwrap();
    }

    #[test]
    fn test_delete_si_base_rejected() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let err = db.delete_unit(&code("m")).unwrap_err();
        assert!(matches!(err, StoreError::UnitInUse { .. }));
        assert!(!db.can_delete_unit(&code("m")).unwrap());
    }

    #[test]
    fn test_delete_edge_referenced_unit_rejected() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let err = db.delete_unit(&code("cm")).unwrap_err();
        assert!(matches!(err, StoreError::UnitInUse { .. }));
    }

    #[test]
    fn test_delete_item_referenced_unit_rejected() {
        let db = CatalogDb::open_in_memory().unwrap();
        db.insert_unit(&unit("ea", "count", true)).unwrap();
        db.insert_unit(&unit("box", "count", false)).unwrap();
        let item = Item::new(
            "widget",
            "Widget".to_string(),
            code("box"),
            "test".to_string(),
        );
        db.insert_item(&item).unwrap();

        let err = db.delete_unit(&code("box")).unwrap_err();
        assert!(matches!(err, StoreError::UnitInUse { .. }));
    }

    #[test]
    fn test_delete_orphan_unit_succeeds() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        // km has no edges, no items, not the base
        assert!(db.can_delete_unit(&code("km")).unwrap());
        db.delete_unit(&code("km")).unwrap();
        assert!(db.find_unit(&code("km")).unwrap().is_none());
    }

    #[test]
    fn test_soft_deleted_edge_releases_unit() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        db.soft_delete_edge(&code("cm"), &code("m")).unwrap();
        db.delete_unit(&code("cm")).unwrap();
    }

    #[test]
    fn test_dimension_locked_by_edges() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let patch = UnitPatch {
            dimension: Some(dim("mass")),
            ..UnitPatch::default()
        };
        let err = db.update_unit(&code("cm"), &patch).unwrap_err();
        assert!(matches!(err, StoreError::DimensionLocked { .. }));

        // km has no edges, so its dimension may still change
        db.update_unit(&code("km"), &patch).unwrap();
    }

    #[test]
    fn test_update_unit_fields() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let patch = UnitPatch {
            name: Some("centimeter".to_string()),
            symbol: Some("cm".to_string()),
            ..UnitPatch::default()
        };
        let (before, after) = db.update_unit(&code("cm"), &patch).unwrap();
        assert_eq!(before.name, "cm");
        assert_eq!(after.name, "centimeter");
        assert_eq!(after.symbol.as_deref(), Some("cm"));
    }

    #[test]
    fn test_upsert_edge_requires_same_dimension() {
        let db = CatalogDb::open_in_memory().unwrap();
        db.insert_unit(&unit("m", "length", true)).unwrap();
        db.insert_unit(&unit("kg", "mass", true)).unwrap();

        let err = db
            .upsert_edge(&code("m"), &code("kg"), dec!(1), Decimal::ZERO, "test")
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_upsert_edge_rejects_bad_factor() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let err = db
            .upsert_edge(&code("km"), &code("m"), Decimal::ZERO, Decimal::ZERO, "test")
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidFactor(_)));
    }

    #[test]
    fn test_upsert_updates_existing_pair() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        let (edge, created) = db
            .upsert_edge(&code("cm"), &code("m"), dec!(0.02), Decimal::ZERO, "test")
            .unwrap();
        assert!(!created);
        assert_eq!(edge.factor, dec!(0.02));
        assert_eq!(db.list_edges(&EdgeFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_revives_soft_deleted_pair() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        db.soft_delete_edge(&code("cm"), &code("m")).unwrap();
        assert!(db.active_edges(&dim("length")).unwrap().is_empty());

        let (edge, created) = db
            .upsert_edge(&code("cm"), &code("m"), dec!(0.01), Decimal::ZERO, "test")
            .unwrap();
        assert!(!created);
        assert!(edge.is_active());
        assert_eq!(db.active_edges(&dim("length")).unwrap().len(), 1);
    }

    #[test]
    fn test_list_units_pagination() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        db.insert_unit(&unit("kg", "mass", true)).unwrap();

        let filter = UnitFilter::default();
        let page1 = db.list_units(&filter, None, 2).unwrap();
        assert_eq!(page1.rows.len(), 2);
        let cursor = page1.next_cursor.clone().unwrap();

        let page2 = db.list_units(&filter, Some(&cursor), 2).unwrap();
        assert_eq!(page2.rows.len(), 2);
        assert!(page2.next_cursor.is_none());

        // No overlap across pages
        let mut codes: Vec<String> = page1
            .rows
            .iter()
            .chain(page2.rows.iter())
            .map(|u| u.code.to_string())
            .collect();
        codes.dedup();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_list_units_dimension_filter() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        db.insert_unit(&unit("kg", "mass", true)).unwrap();

        let filter = UnitFilter {
            dimension: Some(dim("mass")),
        };
        let page = db.list_units(&filter, None, 50).unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].code.as_str(), "kg");
    }

    #[test]
    fn test_item_requires_existing_base_unit() {
        let db = CatalogDb::open_in_memory().unwrap();
        let item = Item::new(
            "widget",
            "Widget".to_string(),
            code("ea"),
            "test".to_string(),
        );
        let err = db.insert_item(&item).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUnit(_)));
    }

    #[test]
    fn test_statistics() {
        let db = CatalogDb::open_in_memory().unwrap();
        seed_length(&db);
        db.soft_delete_edge(&code("cm"), &code("m")).unwrap();
        db.upsert_edge(&code("km"), &code("m"), dec!(1000), Decimal::ZERO, "test")
            .unwrap();

        let stats = db.statistics().unwrap();
        assert_eq!(stats.units, 3);
        assert_eq!(stats.active_edges, 1);
        assert_eq!(stats.deleted_edges, 1);
        assert_eq!(stats.units_by_dimension.get("length"), Some(&3));
    }
}
