//! Core infrastructure: identity, project, config, store, service, audit

pub mod audit;
pub mod config;
pub mod identity;
pub mod project;
pub mod service;
pub mod store;

pub use audit::{AuditRecord, AuditSink, JsonlAuditLog, NullAudit};
pub use config::Config;
pub use identity::{EntityId, EntityPrefix};
pub use project::{Project, ProjectError};
pub use service::{CatalogService, ConsistencyWarning, EdgeUpsert};
pub use store::{CatalogDb, EdgeFilter, Page, StoreError, UnitFilter, UnitPatch};
