//! The document-index collaborator: builds, loads, and incrementally
//! extends a user's persisted vector index.

use std::path::{Path, PathBuf};

use crate::{
    chunking::{self, SplitPolicy},
    embedding::Embedder,
    error::Result,
    extract,
    store::{SegmentRecord, SegmentStore},
};

/// Operations the session manager needs from a persisted index.
///
/// `extend_with_files` is the performance-critical one: it must only
/// process the files it is given, never re-embed what is already indexed.
pub trait DocumentIndex {
    type Handle;

    /// Build a brand-new persisted index at `persist_dir` from the files.
    fn build_from_files(
        &self,
        files: &[PathBuf],
        persist_dir: &Path,
    ) -> Result<Self::Handle>;

    /// Load an existing persisted index unchanged.
    fn load(&self, persist_dir: &Path) -> Result<Self::Handle>;

    /// Mutate the persisted index in place, adding only these files.
    fn extend_with_files(
        &self,
        handle: &mut Self::Handle,
        files: &[PathBuf],
    ) -> Result<()>;
}

/// The production index: extract text per page, split into segments under
/// the per-document policy, embed, and persist to a [`SegmentStore`].
#[derive(Debug, Default)]
pub struct EmbeddingIndex<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    fn segments_for(
        &self,
        files: &[PathBuf],
    ) -> Result<Vec<(SegmentRecord, Vec<f32>)>> {
        let extracted = extract::extract_batch(files)?;

        let mut records = Vec::new();
        for (source, pages) in &extracted {
            // One policy per document, chosen from its full text.
            let full_text: String = pages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let policy = SplitPolicy::detect(&full_text);
            tracing::debug!(source = %source, ?policy, "splitting document");

            for page in pages {
                for text in chunking::split_text(&page.text, policy) {
                    records.push(SegmentRecord {
                        text,
                        source: source.clone(),
                        page: page.page,
                        total_pages: page.total_pages,
                    });
                }
            }
        }

        let texts: Vec<String> =
            records.iter().map(|r| r.text.clone()).collect();
        let vectors = self.embedder.embed(&texts)?;

        Ok(records.into_iter().zip(vectors).collect())
    }
}

impl<E: Embedder> DocumentIndex for EmbeddingIndex<E> {
    type Handle = SegmentStore;

    fn build_from_files(
        &self,
        files: &[PathBuf],
        persist_dir: &Path,
    ) -> Result<SegmentStore> {
        let entries = self.segments_for(files)?;
        let store = SegmentStore::create(persist_dir)?;
        let added = store.add(&entries)?;
        tracing::info!(
            files = files.len(),
            segments = added,
            "built new index"
        );
        Ok(store)
    }

    fn load(&self, persist_dir: &Path) -> Result<SegmentStore> {
        SegmentStore::open(persist_dir)
    }

    fn extend_with_files(
        &self,
        handle: &mut SegmentStore,
        files: &[PathBuf],
    ) -> Result<()> {
        let entries = self.segments_for(files)?;
        let added = handle.add(&entries)?;
        tracing::info!(
            files = files.len(),
            segments = added,
            "extended index"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::embedding::test_util::HashEmbedder;

    /// Test index that skips the extraction pipeline entirely: each file's
    /// raw content becomes one stored segment, regardless of extension, so
    /// fixtures can use any file name. Records which base names each
    /// operation was fed, so tests can assert the incremental-extension
    /// invariant.
    #[derive(Debug, Default)]
    pub(crate) struct FakeIndex {
        built: RefCell<Vec<String>>,
        extended: RefCell<Vec<String>>,
    }

    impl FakeIndex {
        pub(crate) fn built_from(&self) -> Vec<String> {
            self.built.borrow().clone()
        }

        pub(crate) fn extended_with(&self) -> Vec<String> {
            self.extended.borrow().clone()
        }
    }

    fn base_names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn synthetic_entries(
        files: &[PathBuf],
    ) -> Result<Vec<(SegmentRecord, Vec<f32>)>> {
        files
            .iter()
            .zip(base_names(files))
            .map(|(path, source)| {
                let text = std::fs::read_to_string(path)?;
                let embedding = HashEmbedder::vector(&text);
                Ok((
                    SegmentRecord {
                        text,
                        source,
                        page: 1,
                        total_pages: 1,
                    },
                    embedding,
                ))
            })
            .collect()
    }

    impl DocumentIndex for FakeIndex {
        type Handle = SegmentStore;

        fn build_from_files(
            &self,
            files: &[PathBuf],
            persist_dir: &Path,
        ) -> Result<SegmentStore> {
            self.built.borrow_mut().extend(base_names(files));
            let store = SegmentStore::create(persist_dir)?;
            store.add(&synthetic_entries(files)?)?;
            Ok(store)
        }

        fn load(&self, persist_dir: &Path) -> Result<SegmentStore> {
            SegmentStore::open(persist_dir)
        }

        fn extend_with_files(
            &self,
            handle: &mut SegmentStore,
            files: &[PathBuf],
        ) -> Result<()> {
            self.extended.borrow_mut().extend(base_names(files));
            handle.add(&synthetic_entries(files)?)?;
            Ok(())
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn build_indexes_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.txt", "Rust is a systems language.");
        let b = write(tmp.path(), "b.txt", "Ownership keeps memory safe.");

        let index = EmbeddingIndex::new(HashEmbedder);
        let store = index
            .build_from_files(&[a, b], &tmp.path().join("chroma"))
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.sources().unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn extend_adds_without_touching_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.txt", "First document.");
        let c = write(tmp.path(), "c.txt", "Third document.");
        let chroma = tmp.path().join("chroma");

        let index = EmbeddingIndex::new(HashEmbedder);
        index.build_from_files(&[a], &chroma).unwrap();

        let mut store = index.load(&chroma).unwrap();
        index.extend_with_files(&mut store, &[c]).unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.segment(0).unwrap().unwrap().source, "a.txt");
        assert_eq!(store.segment(1).unwrap().unwrap().source, "c.txt");
    }

    #[test]
    fn load_without_build_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let index = EmbeddingIndex::new(HashEmbedder);
        assert!(index.load(&tmp.path().join("chroma")).is_err());
    }

    #[test]
    fn long_documents_produce_multiple_segments() {
        let tmp = tempfile::tempdir().unwrap();
        let text = "retrieval augmented generation ".repeat(200);
        let big = write(tmp.path(), "big.txt", &text);

        let index = EmbeddingIndex::new(HashEmbedder);
        let store = index
            .build_from_files(&[big], &tmp.path().join("chroma"))
            .unwrap();

        assert!(store.len().unwrap() > 1);
    }
}
