use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::vector_index::{
    BoxFuture, IndexDescription, IndexSpec, VectorIndex, VectorIndexError, VectorRecord,
};

struct StoredRecord {
    values: Vec<f32>,
    metadata: HashMap<String, serde_json::Value>,
}

struct InMemoryIndexData {
    description: IndexDescription,
    pending_polls: usize,
    namespaces: HashMap<String, HashMap<String, StoredRecord>>,
}

#[derive(Default)]
struct CallCounts {
    list: AtomicUsize,
    create: AtomicUsize,
    describe: AtomicUsize,
    upsert: AtomicUsize,
}

/// Process-local [`VectorIndex`] that enforces index dimensions like a hosted store.
pub struct InMemoryIndex {
    indexes: RwLock<HashMap<String, InMemoryIndexData>>,
    calls: CallCounts,
    unavailable: bool,
    ready_after: usize,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            calls: CallCounts::default(),
            unavailable: false,
            ready_after: 0,
        }
    }

    /// Newly created indexes report ready only on the `polls`-th describe call.
    #[must_use]
    pub fn with_ready_after(mut self, polls: usize) -> Self {
        self.ready_after = polls;
        self
    }

    /// A store whose every call fails with a connection error.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    /// Number of `create_index` calls received, including failed ones.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.calls.create.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn describe_calls(&self) -> usize {
        self.calls.describe.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.calls.upsert.load(Ordering::SeqCst)
    }

    /// Total calls of any kind; zero means the store was never contacted.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.create_calls() + self.describe_calls() + self.upsert_calls()
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indexes.read().map_or(0, |idx| idx.len())
    }

    #[must_use]
    pub fn record_count(&self, index: &str, namespace: &str) -> usize {
        self.indexes.read().map_or(0, |idx| {
            idx.get(index)
                .and_then(|data| data.namespaces.get(namespace))
                .map_or(0, HashMap::len)
        })
    }

    /// Stored metadata for a record, if present.
    #[must_use]
    pub fn record_metadata(
        &self,
        index: &str,
        namespace: &str,
        id: &str,
    ) -> Option<HashMap<String, serde_json::Value>> {
        let indexes = self.indexes.read().ok()?;
        indexes
            .get(index)?
            .namespaces
            .get(namespace)?
            .get(id)
            .map(|r| r.metadata.clone())
    }

    /// Stored vector for a record, if present.
    #[must_use]
    pub fn record_values(&self, index: &str, namespace: &str, id: &str) -> Option<Vec<f32>> {
        let indexes = self.indexes.read().ok()?;
        indexes
            .get(index)?
            .namespaces
            .get(namespace)?
            .get(id)
            .map(|r| r.values.clone())
    }

    fn check_available(&self) -> Result<(), VectorIndexError> {
        if self.unavailable {
            return Err(VectorIndexError::Connection(
                "in-memory index marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

impl VectorIndex for InMemoryIndex {
    fn list_indexes(&self) -> BoxFuture<'_, Result<Vec<IndexDescription>, VectorIndexError>> {
        Box::pin(async move {
            self.calls.list.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            let indexes = self
                .indexes
                .read()
                .map_err(|e| VectorIndexError::List(e.to_string()))?;
            let mut list: Vec<IndexDescription> =
                indexes.values().map(|d| d.description.clone()).collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(list)
        })
    }

    fn create_index(
        &self,
        spec: &IndexSpec,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>> {
        let spec = spec.clone();
        Box::pin(async move {
            self.calls.create.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            let mut indexes = self
                .indexes
                .write()
                .map_err(|e| VectorIndexError::Create(e.to_string()))?;
            if indexes.contains_key(&spec.name) {
                return Err(VectorIndexError::Create(format!(
                    "index {} already exists",
                    spec.name
                )));
            }
            let description = IndexDescription {
                name: spec.name.clone(),
                dimension: spec.dimension,
                metric: spec.metric,
                host: Some(format!("memory://{}", spec.name)),
                ready: self.ready_after == 0,
            };
            indexes.insert(
                spec.name,
                InMemoryIndexData {
                    description: description.clone(),
                    pending_polls: self.ready_after,
                    namespaces: HashMap::new(),
                },
            );
            Ok(description)
        })
    }

    fn describe_index(
        &self,
        name: &str,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>> {
        let name = name.to_owned();
        Box::pin(async move {
            self.calls.describe.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            let mut indexes = self
                .indexes
                .write()
                .map_err(|e| VectorIndexError::Describe(e.to_string()))?;
            let data = indexes
                .get_mut(&name)
                .ok_or_else(|| VectorIndexError::Describe(format!("index {name} not found")))?;
            if data.pending_polls > 0 {
                data.pending_polls -= 1;
                data.description.ready = data.pending_polls == 0;
            }
            Ok(data.description.clone())
        })
    }

    fn upsert(
        &self,
        index: &str,
        namespace: &str,
        records: Vec<VectorRecord>,
    ) -> BoxFuture<'_, Result<usize, VectorIndexError>> {
        let index = index.to_owned();
        let namespace = namespace.to_owned();
        Box::pin(async move {
            self.calls.upsert.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;
            let mut indexes = self
                .indexes
                .write()
                .map_err(|e| VectorIndexError::Upsert(e.to_string()))?;
            let data = indexes
                .get_mut(&index)
                .ok_or_else(|| VectorIndexError::Upsert(format!("index {index} not found")))?;

            let dimension = data.description.dimension;
            if let Some(bad) = records.iter().find(|r| r.values.len() != dimension) {
                return Err(VectorIndexError::Upsert(format!(
                    "vector dimension {} does not match the dimension of the index {dimension}",
                    bad.values.len()
                )));
            }

            let count = records.len();
            let ns = data.namespaces.entry(namespace).or_default();
            for r in records {
                ns.insert(
                    r.id,
                    StoredRecord {
                        values: r.values,
                        metadata: r.metadata,
                    },
                );
            }
            Ok(count)
        })
    }
}
