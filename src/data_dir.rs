use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    user_id::UserId,
};

/// Name of the per-user manifest file listing indexed document names.
pub const MANIFEST_FILE: &str = "file_list.txt";

/// Name of the per-user persisted vector index directory.
pub const INDEX_DIR: &str = "chroma";

/// Name of the per-user raw document directory.
pub const DOCS_DIR: &str = "docs";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the storage root from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The DOCCHAT_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/docchat/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("DOCCHAT_DATA_DIR") {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("docchat")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        std::fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The top-level directory holding all of a user's state.
    pub fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join(user.as_str())
    }

    /// Where the user's raw uploaded files live.
    pub fn docs_dir(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(DOCS_DIR)
    }

    /// The manifest recording which file names are indexed for the user.
    pub fn manifest_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(MANIFEST_FILE)
    }

    /// The persisted vector index directory for the user.
    pub fn index_dir(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(INDEX_DIR)
    }

    /// List user ids that have a workspace directory on disk, sorted.
    pub fn list_users(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                users.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        users.sort();
        Ok(users)
    }
}
