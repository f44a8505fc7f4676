//! A user's on-disk workspace: the document directory, the manifest, and
//! the decision of when to build, load, or extend the persisted index.

use std::path::{Path, PathBuf};

use crate::{
    data_dir::DataDir,
    error::{Error, Result},
    index::DocumentIndex,
    manifest,
    user_id::UserId,
};

/// A file handed in by the UI layer: a name plus raw content.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// The base file name with any path component stripped.
    fn base_name(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// What an ingest pass accepted and rejected.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Base names of newly persisted files, in input order.
    pub accepted: Vec<String>,
    /// Per-file rejection messages; never aborts the batch.
    pub rejected: Vec<String>,
    /// Manifest contents before this pass.
    pub previous: Vec<String>,
    /// Whether the workspace existed on disk before this pass.
    pub existed_before: bool,
}

#[derive(Debug)]
pub struct UserWorkspace {
    user: UserId,
    dirs: DataDir,
}

impl UserWorkspace {
    pub fn new(dirs: DataDir, user: UserId) -> Self {
        Self { user, dirs }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn exists(&self) -> bool {
        self.dirs.user_dir(&self.user).exists()
    }

    /// Current manifest contents, repairing corruption if found.
    pub fn manifest<I: DocumentIndex>(&self, index: &I) -> Result<Vec<String>> {
        manifest::load(&self.dirs, &self.user, index)
    }

    /// Persist incoming files and update the manifest.
    ///
    /// A file whose base name is already in the manifest (or appeared
    /// earlier in this batch) is rejected without overwriting anything;
    /// the existing index stays valid. The manifest is rewritten as
    /// accepted-then-previous, newest first.
    pub fn ingest<I: DocumentIndex>(
        &self,
        incoming: &[IncomingFile],
        index: &I,
    ) -> Result<IngestOutcome> {
        let existed_before = self.exists();
        let previous = self.manifest(index)?;

        let mut outcome = IngestOutcome {
            previous: previous.clone(),
            existed_before,
            ..Default::default()
        };

        if incoming.is_empty() {
            return Ok(outcome);
        }

        let docs_dir = self.dirs.docs_dir(&self.user);
        std::fs::create_dir_all(&docs_dir)?;

        for file in incoming {
            let name = file.base_name();
            if previous.contains(&name) || outcome.accepted.contains(&name) {
                outcome
                    .rejected
                    .push(format!("File '{name}' already exists."));
                continue;
            }
            std::fs::write(docs_dir.join(&name), &file.content)?;
            outcome.accepted.push(name);
        }

        let mut names = outcome.accepted.clone();
        names.extend(previous);
        manifest::save(&self.dirs.manifest_path(&self.user), &names)?;

        tracing::info!(
            user = %self.user,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "ingested files"
        );

        Ok(outcome)
    }

    /// Produce the index handle for this workspace after an ingest pass.
    ///
    /// Brand-new workspace: requires accepted files and builds from
    /// exactly those. Existing workspace with nothing new: loads the
    /// persisted index unchanged. Existing workspace with accepted files:
    /// loads and extends with only the new files, never re-embedding what
    /// is already indexed.
    pub fn resolve_index<I: DocumentIndex>(
        &self,
        index: &I,
        outcome: &IngestOutcome,
    ) -> Result<I::Handle> {
        let index_dir = self.dirs.index_dir(&self.user);

        if !outcome.existed_before {
            if outcome.accepted.is_empty() {
                return Err(Error::NoFilesProvided(self.user.to_string()));
            }
            return index
                .build_from_files(&self.doc_paths(&outcome.accepted), &index_dir);
        }

        let mut handle = index.load(&index_dir)?;
        if !outcome.accepted.is_empty() {
            index.extend_with_files(
                &mut handle,
                &self.doc_paths(&outcome.accepted),
            )?;
        }
        Ok(handle)
    }

    /// Irreversibly remove all on-disk state for this user.
    ///
    /// `active` is the user bound to the current conversation, if any;
    /// deleting that user is refused so the live session never points at
    /// missing storage. Returns false if there was nothing to delete.
    pub fn delete(&self, active: Option<&UserId>) -> Result<bool> {
        if active == Some(&self.user) {
            return Err(Error::UserIsActive(self.user.to_string()));
        }
        if !self.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(self.dirs.user_dir(&self.user))?;
        tracing::info!(user = %self.user, "deleted workspace");
        Ok(true)
    }

    fn doc_paths(&self, names: &[String]) -> Vec<PathBuf> {
        let docs_dir = self.dirs.docs_dir(&self.user);
        names.iter().map(|n| docs_dir.join(n)).collect()
    }
}
