//! Typed access to the metadata log.

use serde::{de::DeserializeOwned, Serialize};

use super::{MetadataStore, RecordKind, StoreError, StoreResult, StoreStats};
use crate::model::{Prejoin, Sample, Stat};

/// Best-effort cache of statistics, prejoins, and samples.
///
/// Store and decoding failures are logged and read as "not found", so callers
/// fall back to recomputing.
pub struct Meta<'a> {
    store: Box<dyn MetadataStore + 'a>,
}

impl<'a> Meta<'a> {
    pub fn new(store: impl MetadataStore + 'a) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.store.as_ref()
    }

    fn put<T: Serialize>(&self, kind: RecordKind, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|json| self.store.put(kind, key, &json));
        if let Err(e) = result {
            tracing::warn!(%kind, key, error = %e, "failed to write metadata record");
        }
    }

    fn get<T: DeserializeOwned>(&self, kind: RecordKind, key: &str) -> Option<T> {
        match self.store.get(kind, key) {
            Ok(Some(json)) => decode(kind, key, &json),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%kind, key, error = %e, "failed to read metadata record");
                None
            }
        }
    }

    fn list<T: DeserializeOwned>(&self, kind: RecordKind, prefix: &str) -> Vec<T> {
        match self.store.list_by_prefix(kind, prefix) {
            Ok(rows) => rows
                .iter()
                .filter_map(|(key, json)| decode(kind, key, json))
                .collect(),
            Err(e) => {
                tracing::warn!(%kind, prefix, error = %e, "failed to list metadata records");
                Vec::new()
            }
        }
    }

    fn delete(&self, kind: RecordKind, key: &str) {
        if let Err(e) = self.store.delete(kind, key) {
            tracing::warn!(%kind, key, error = %e, "failed to delete metadata record");
        }
    }

    pub fn save_stat(&self, stat: &Stat) {
        self.put(
            RecordKind::Stat,
            &Stat::key(&stat.database, &stat.query_name),
            stat,
        );
    }

    pub fn load_stat(&self, database: &str, query_name: &str) -> Option<Stat> {
        self.get(RecordKind::Stat, &Stat::key(database, query_name))
    }

    pub fn add_prejoin(&self, prejoin: &Prejoin) {
        self.put(RecordKind::Prejoin, &prejoin.key(), prejoin);
    }

    /// Soft-delete a prejoin; it stops appearing in [`Meta::prejoins`].
    pub fn remove_prejoin(&self, prejoin: &Prejoin) {
        self.delete(RecordKind::Prejoin, &prejoin.key());
    }

    /// Every live prejoin of `database`.
    pub fn prejoins(&self, database: &str) -> Vec<Prejoin> {
        self.list::<Prejoin>(RecordKind::Prejoin, &Prejoin::key_prefix(database))
            .into_iter()
            .filter(|p| p.database == database)
            .collect()
    }

    pub fn add_sample(&self, sample: &Sample) {
        self.put(RecordKind::Sample, &sample.key(), sample);
    }

    pub fn remove_sample(&self, database: &str, name: &str) {
        self.delete(RecordKind::Sample, &Sample::key_for(database, name));
    }

    /// Every live sample of `database`, ordered by name.
    pub fn samples(&self, database: &str) -> Vec<Sample> {
        self.list::<Sample>(RecordKind::Sample, &Sample::key_prefix(database))
            .into_iter()
            .filter(|s| s.database == database)
            .collect()
    }

    pub fn sample(&self, database: &str, name: &str) -> Option<Sample> {
        self.get(RecordKind::Sample, &Sample::key_for(database, name))
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        self.store.stats()
    }
}

fn decode<T: DeserializeOwned>(kind: RecordKind, key: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%kind, key, error = %e, "undecodable metadata record, ignoring");
            None
        }
    }
}
