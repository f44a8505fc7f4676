use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SEGMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("segments");
const EMBEDDINGS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("embeddings");

/// File name of the database inside a user's index directory.
const STORE_FILE: &str = "index.redb";

/// One indexed text segment with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub text: String,
    /// Base name of the originating file.
    pub source: String,
    /// 1-based page number within the originating file.
    pub page: usize,
    pub total_pages: usize,
}

/// The persisted per-user vector index.
///
/// Lives inside the user's `chroma/` directory. Segment metadata is stored
/// as JSON; embeddings as raw little-endian f32 slices keyed by the same
/// segment id.
pub struct SegmentStore {
    db: Database,
}

impl SegmentStore {
    /// Create a fresh store, creating the index directory if needed.
    /// Opens the existing database if one is already present.
    pub fn create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        let db = Database::create(index_dir.join(STORE_FILE))?;

        let txn = db.begin_write()?;
        txn.open_table(SEGMENTS)?;
        txn.open_table(EMBEDDINGS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Open an existing store. Fails if nothing has been persisted at this
    /// location.
    pub fn open(index_dir: &Path) -> Result<Self> {
        if !index_dir.join(STORE_FILE).exists() {
            return Err(Error::Index(format!(
                "no persisted index at {}",
                index_dir.display()
            )));
        }
        Self::create(index_dir)
    }

    /// Append segments with their embeddings in a single transaction.
    ///
    /// Ids are assigned sequentially after the current maximum, so existing
    /// segments are never touched. Returns the number of segments added.
    pub fn add(&self, entries: &[(SegmentRecord, Vec<f32>)]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin_write()?;
        {
            let mut segments = txn.open_table(SEGMENTS)?;
            let mut embeddings = txn.open_table(EMBEDDINGS)?;

            let mut next_id = segments
                .last()?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(0);

            for (record, embedding) in entries {
                let meta = serde_json::to_vec(record).map_err(|e| {
                    Error::Index(format!("failed to encode segment: {e}"))
                })?;
                segments.insert(next_id, meta.as_slice())?;
                let bytes: &[u8] = bytemuck::cast_slice(embedding);
                embeddings.insert(next_id, bytes)?;
                next_id += 1;
            }
        }
        txn.commit()?;
        Ok(entries.len())
    }

    /// Load every segment id and embedding, for retrieval scoring.
    pub fn all_embeddings(&self) -> Result<Vec<(u64, Vec<f32>)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(EMBEDDINGS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            // pod_collect_to_vec tolerates the unaligned byte slices redb
            // hands back.
            result.push((k.value(), bytemuck::pod_collect_to_vec(v.value())));
        }
        Ok(result)
    }

    /// Fetch a single segment record by id.
    pub fn segment(&self, id: u64) -> Result<Option<SegmentRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SEGMENTS)?;
        let Some(guard) = table.get(id)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(guard.value()).map_err(|e| {
            Error::Index(format!("failed to decode segment {id}: {e}"))
        })?;
        Ok(Some(record))
    }

    /// Number of stored segments.
    pub fn len(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SEGMENTS)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Distinct source file names present in the store, sorted.
    pub fn sources(&self) -> Result<Vec<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SEGMENTS)?;
        let mut sources = std::collections::BTreeSet::new();
        for entry in table.iter()? {
            let (_, v) = entry?;
            let record: SegmentRecord = serde_json::from_slice(v.value())
                .map_err(|e| {
                    Error::Index(format!("failed to decode segment: {e}"))
                })?;
            sources.insert(record.source);
        }
        Ok(sources.into_iter().collect())
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore").finish_non_exhaustive()
    }
}
