//! Versioned Schema Registry
//!
//! Edge firmware and the ingest server agree on a schema by its versioned
//! key, `raw_seismic_event_v1`. Keys are split into a family
//! (`raw_seismic_event`) and a version number so the newest revision of a
//! family can be looked up without knowing its number.

use apache_avro::Schema;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::SchemaError;

/// What the registry knows about one schema revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMetadata {
    /// Family name, `raw_seismic_event`
    pub name: String,

    /// Revision, `v1`
    pub version: String,

    /// Lookup key, `raw_seismic_event_v1`
    pub qualified_name: String,

    /// Avro namespace of the record
    pub namespace: String,

    /// Superseded revisions stay resolvable but are flagged
    pub deprecated: bool,

    /// Key of the revision to move to
    pub replacement: Option<String>,
}

struct Revision {
    number: u32,
    schema: Schema,
    metadata: SchemaMetadata,
}

/// Registry of Avro schemas grouped by family, safe to share between threads
#[derive(Default)]
pub struct SchemaRegistry {
    families: RwLock<BTreeMap<String, Vec<Revision>>>,
}

/// Split `name_vN` into (`name`, N); keys without a suffix are revision 1
fn split_key(key: &str) -> (&str, u32) {
    key.rsplit_once("_v")
        .and_then(|(family, rev)| match rev.parse() {
            Ok(n) if !family.is_empty() && rev.bytes().all(|b| b.is_ascii_digit()) => Some((family, n)),
            _ => None,
        })
        .unwrap_or((key, 1))
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Vec<Revision>>>, SchemaError> {
        self.families
            .read()
            .map_err(|_| SchemaError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Vec<Revision>>>, SchemaError> {
        self.families
            .write()
            .map_err(|_| SchemaError::LockPoisoned)
    }

    fn with_revision<T>(&self, key: &str, f: impl FnOnce(&Revision) -> T) -> Result<T, SchemaError> {
        let families = self.read()?;
        families
            .values()
            .flatten()
            .find(|r| r.metadata.qualified_name == key)
            .map(f)
            .ok_or_else(|| SchemaError::NotFound(key.to_string()))
    }

    /// Add a schema under `key`; re-registering a key is an error
    pub fn register(&self, key: &str, schema: Schema) -> Result<(), SchemaError> {
        let (family, number) = split_key(key);
        let namespace = schema
            .name()
            .and_then(|n| n.namespace.clone())
            .unwrap_or_else(|| "io.quakesense".to_string());

        let mut families = self.write()?;
        let revisions = families.entry(family.to_string()).or_default();
        if revisions.iter().any(|r| r.metadata.qualified_name == key) {
            return Err(SchemaError::ValidationError(format!("{} is already registered", key)));
        }

        log::debug!("registered schema {} (family {}, revision {})", key, family, number);
        revisions.push(Revision {
            number,
            schema,
            metadata: SchemaMetadata {
                name: family.to_string(),
                version: format!("v{}", number),
                qualified_name: key.to_string(),
                namespace,
                deprecated: false,
                replacement: None,
            },
        });
        revisions.sort_by_key(|r| r.number);
        Ok(())
    }

    /// Schema registered under `key`
    pub fn get(&self, key: &str) -> Result<Schema, SchemaError> {
        self.with_revision(key, |r| r.schema.clone())
    }

    /// Highest-numbered revision of `family`
    pub fn get_latest(&self, family: &str) -> Result<Schema, SchemaError> {
        let families = self.read()?;
        families
            .get(family)
            .and_then(|revisions| revisions.last())
            .map(|r| r.schema.clone())
            .ok_or_else(|| SchemaError::NotFound(format!("no revisions of {}", family)))
    }

    /// Revisions of `family`, oldest first; empty for an unknown family
    pub fn get_versions(&self, family: &str) -> Result<Vec<String>, SchemaError> {
        let families = self.read()?;
        Ok(families
            .get(family)
            .map(|revisions| revisions.iter().map(|r| r.metadata.version.clone()).collect())
            .unwrap_or_default())
    }

    /// Metadata for `key`
    pub fn get_metadata(&self, key: &str) -> Result<SchemaMetadata, SchemaError> {
        self.with_revision(key, |r| r.metadata.clone())
    }

    /// Flag `key` as superseded, optionally naming its successor
    pub fn deprecate(&self, key: &str, replacement: Option<String>) -> Result<(), SchemaError> {
        let mut families = self.write()?;
        let revision = families
            .values_mut()
            .flatten()
            .find(|r| r.metadata.qualified_name == key)
            .ok_or_else(|| SchemaError::NotFound(key.to_string()))?;

        revision.metadata.deprecated = true;
        revision.metadata.replacement = replacement;
        Ok(())
    }

    /// Register the event and classification schemas
    pub fn load_defaults(&self) -> Result<(), SchemaError> {
        use crate::schemas;

        self.register("raw_seismic_event_v1", schemas::raw_seismic_event_v1()?)?;
        self.register("classification_result_v1", schemas::classification_result_v1()?)
    }
}

lazy_static::lazy_static! {
    /// Process-wide registry preloaded with the QuakeSense schemas
    pub static ref GLOBAL_REGISTRY: SchemaRegistry = {
        let registry = SchemaRegistry::new();
        if let Err(e) = registry.load_defaults() {
            log::error!("default schemas failed to load: {}", e);
        }
        registry
    };
}
