//! Catalog service - orchestrates store, cache, and audit
//!
//! All admin mutations go through here so the transform cache and the
//! audit trail stay consistent with the store. Unit and edge edits
//! reset the cache wholesale; item edits don't, since an item binding
//! never changes any transform.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::catalog::edge::ConversionEdge;
use crate::catalog::item::Item;
use crate::catalog::unit::{Dimension, Unit, UnitCode};
use crate::convert::cache::TransformCache;
use crate::convert::graph::DimensionGraph;
use crate::convert::resolver::Converter;
use crate::convert::transform::Affine;
use crate::core::audit::{AuditRecord, AuditSink, JsonlAuditLog};
use crate::core::store::{CatalogDb, StoreError, UnitPatch};
use crate::core::Project;

/// Tolerance for the alternative-path consistency check
const CONSISTENCY_EPS: Decimal = dec!(0.000000001);

/// An upserted edge disagrees with an existing path between the same
/// units. The edit is accepted; the caller decides how loudly to warn.
#[derive(Debug, Clone)]
pub struct ConsistencyWarning {
    pub from: UnitCode,
    pub to: UnitCode,
    pub direct: Affine,
    pub alternative: Affine,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule {} -> {} (factor {}, offset {}) disagrees with the existing path \
             (factor {}, offset {})",
            self.from,
            self.to,
            self.direct.factor,
            self.direct.offset,
            self.alternative.factor,
            self.alternative.offset,
        )
    }
}

/// Outcome of an edge upsert
#[derive(Debug)]
pub struct EdgeUpsert {
    pub edge: ConversionEdge,
    pub created: bool,
    pub warning: Option<ConsistencyWarning>,
}

/// The catalog service
pub struct CatalogService {
    db: CatalogDb,
    cache: TransformCache,
    audit: Box<dyn AuditSink>,
    author: String,
}

impl CatalogService {
    /// Open the service for a project on disk
    pub fn open(project: &Project, author: String) -> Result<Self, StoreError> {
        let db = CatalogDb::open(&project.db_path())?;
        let audit = Box::new(JsonlAuditLog::new(project.audit_path()));
        Ok(Self::new(db, audit, author))
    }

    /// Assemble the service from parts (tests use an in-memory store)
    pub fn new(db: CatalogDb, audit: Box<dyn AuditSink>, author: String) -> Self {
        Self {
            db,
            cache: TransformCache::new(),
            audit,
            author,
        }
    }

    pub fn db(&self) -> &CatalogDb {
        &self.db
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// A converter over this service's store and cache
    pub fn converter(&self) -> Converter<'_> {
        Converter::new(&self.db, &self.cache)
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    pub fn create_unit(
        &self,
        code: UnitCode,
        name: String,
        symbol: Option<String>,
        dimension: Dimension,
        is_si_base: bool,
    ) -> Result<Unit, StoreError> {
        let mut unit = Unit::new(code, name, dimension, is_si_base, self.author.clone());
        unit.symbol = symbol;
        self.db.insert_unit(&unit)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "unit.create",
            unit.code.as_str(),
            None,
            serde_json::to_value(&unit).ok(),
        ));
        self.cache.reset();
        Ok(unit)
    }

    pub fn update_unit(&self, code: &UnitCode, patch: &UnitPatch) -> Result<Unit, StoreError> {
        let (before, after) = self.db.update_unit(code, patch)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "unit.update",
            code.as_str(),
            serde_json::to_value(&before).ok(),
            serde_json::to_value(&after).ok(),
        ));
        self.cache.reset();
        Ok(after)
    }

    pub fn delete_unit(&self, code: &UnitCode) -> Result<Unit, StoreError> {
        let unit = self.db.delete_unit(code)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "unit.delete",
            code.as_str(),
            serde_json::to_value(&unit).ok(),
            None,
        ));
        self.cache.reset();
        Ok(unit)
    }

    // ------------------------------------------------------------------
    // Conversion edges
    // ------------------------------------------------------------------

    /// Create or revive a conversion rule
    ///
    /// After the upsert, any alternative path between the same units is
    /// checked against the new rule. Divergence beyond tolerance is
    /// reported as a warning, not a rejection: the admin may be in the
    /// middle of correcting several related rules.
    pub fn upsert_edge(
        &self,
        from: &UnitCode,
        to: &UnitCode,
        factor: Decimal,
        offset: Decimal,
    ) -> Result<EdgeUpsert, StoreError> {
        let before = self.db.find_edge(from, to, true)?;
        let (edge, created) = self.db.upsert_edge(from, to, factor, offset, &self.author)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "edge.upsert",
            &format!("{}->{}", from, to),
            before.as_ref().and_then(|e| serde_json::to_value(e).ok()),
            serde_json::to_value(&edge).ok(),
        ));
        self.cache.reset();

        let warning = self.check_consistency(&edge)?;
        Ok(EdgeUpsert {
            edge,
            created,
            warning,
        })
    }

    pub fn delete_edge(&self, from: &UnitCode, to: &UnitCode) -> Result<ConversionEdge, StoreError> {
        let before = self.db.find_edge(from, to, false)?;
        let edge = self.db.soft_delete_edge(from, to)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "edge.delete",
            &format!("{}->{}", from, to),
            before.as_ref().and_then(|e| serde_json::to_value(e).ok()),
            serde_json::to_value(&edge).ok(),
        ));
        self.cache.reset();
        Ok(edge)
    }

    /// Compare a rule against the shortest alternative path between
    /// the same units, with the rule itself excluded from the graph
    fn check_consistency(
        &self,
        edge: &ConversionEdge,
    ) -> Result<Option<ConsistencyWarning>, StoreError> {
        let dimension = self.db.dimension_of(&edge.from_code)?;
        let others: Vec<ConversionEdge> = self
            .db
            .active_edges(&dimension)?
            .into_iter()
            .filter(|e| e.id != edge.id)
            .collect();

        let graph = DimensionGraph::build(&others);
        let direct = edge.transform();
        match graph.compose_path(&edge.from_code, &edge.to_code) {
            Some(alternative) if !alternative.approx_eq(&direct, CONSISTENCY_EPS) => {
                Ok(Some(ConsistencyWarning {
                    from: edge.from_code.clone(),
                    to: edge.to_code.clone(),
                    direct,
                    alternative,
                }))
            }
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    pub fn create_item(
        &self,
        code: &str,
        name: String,
        base_unit_code: UnitCode,
    ) -> Result<Item, StoreError> {
        let item = Item::new(code, name, base_unit_code, self.author.clone());
        self.db.insert_item(&item)?;

        self.audit.record(&AuditRecord::new(
            &self.author,
            "item.create",
            &item.code,
            None,
            serde_json::to_value(&item).ok(),
        ));
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::NullAudit;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    fn dim(s: &str) -> Dimension {
        Dimension::new(s).unwrap()
    }

    fn service() -> CatalogService {
        let db = CatalogDb::open_in_memory().unwrap();
        CatalogService::new(db, Box::new(NullAudit), "test".to_string())
    }

    fn seed_length(svc: &CatalogService) {
        svc.create_unit(code("m"), "meter".to_string(), None, dim("length"), true)
            .unwrap();
        svc.create_unit(code("cm"), "centimeter".to_string(), None, dim("length"), false)
            .unwrap();
        svc.create_unit(code("km"), "kilometer".to_string(), None, dim("length"), false)
            .unwrap();
        svc.upsert_edge(&code("cm"), &code("m"), dec!(0.01), Decimal::ZERO)
            .unwrap();
    }

    #[test]
    fn test_edge_upsert_resets_cache() {
        let svc = service();
        seed_length(&svc);

        svc.converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .unwrap();
        assert_eq!(svc.cache().len(), 1);

        svc.upsert_edge(&code("cm"), &code("m"), dec!(0.02), Decimal::ZERO)
            .unwrap();
        assert!(svc.cache().is_empty());

        // Resolution now sees the new factor
        let result = svc
            .converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .unwrap();
        assert_eq!(result, dec!(2.00));
    }

    #[test]
    fn test_edge_delete_resets_cache() {
        let svc = service();
        seed_length(&svc);

        svc.converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .unwrap();
        svc.delete_edge(&code("cm"), &code("m")).unwrap();
        assert!(svc.cache().is_empty());
        assert!(svc
            .converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .is_err());
    }

    #[test]
    fn test_unit_update_resets_cache() {
        let svc = service();
        seed_length(&svc);

        svc.converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .unwrap();
        let patch = UnitPatch {
            name: Some("metre".to_string()),
            ..UnitPatch::default()
        };
        svc.update_unit(&code("m"), &patch).unwrap();
        assert!(svc.cache().is_empty());
    }

    #[test]
    fn test_item_create_leaves_cache_alone() {
        let svc = service();
        seed_length(&svc);
        svc.create_unit(code("ea"), "each".to_string(), None, dim("count"), true)
            .unwrap();

        svc.converter()
            .convert(dec!(100), &code("cm"), &code("m"))
            .unwrap();
        svc.create_item("widget", "Widget".to_string(), code("ea"))
            .unwrap();
        assert_eq!(svc.cache().len(), 1);
    }

    #[test]
    fn test_consistent_edge_no_warning() {
        let svc = service();
        seed_length(&svc);
        svc.upsert_edge(&code("km"), &code("m"), dec!(1000), Decimal::ZERO)
            .unwrap();

        // km -> cm agrees with km -> m -> cm
        let result = svc
            .upsert_edge(&code("km"), &code("cm"), dec!(100000), Decimal::ZERO)
            .unwrap();
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_divergent_edge_warns_but_persists() {
        let svc = service();
        seed_length(&svc);
        svc.upsert_edge(&code("km"), &code("m"), dec!(1000), Decimal::ZERO)
            .unwrap();

        // Disagrees with the km -> m -> cm path by a factor of ten
        let result = svc
            .upsert_edge(&code("km"), &code("cm"), dec!(10000), Decimal::ZERO)
            .unwrap();
        let warning = result.warning.expect("expected consistency warning");
        assert_eq!(warning.from, code("km"));
        assert_eq!(warning.alternative.factor, dec!(100000));

        // The rule is stored regardless
        assert!(svc
            .db()
            .find_edge(&code("km"), &code("cm"), false)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_first_edge_in_dimension_no_warning() {
        let svc = service();
        svc.create_unit(code("kg"), "kilogram".to_string(), None, dim("mass"), true)
            .unwrap();
        svc.create_unit(code("g"), "gram".to_string(), None, dim("mass"), false)
            .unwrap();

        let result = svc
            .upsert_edge(&code("g"), &code("kg"), dec!(0.001), Decimal::ZERO)
            .unwrap();
        assert!(result.created);
        assert!(result.warning.is_none());
    }
}
