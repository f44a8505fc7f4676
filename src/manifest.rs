//! The per-user file manifest: a durable, ordered list of document base
//! names believed to be covered by the user's persisted index.
//!
//! Stored as `{root}/{user}/file_list.txt`, one base name per line. The
//! manifest is the source of truth for duplicate detection; when it goes
//! missing while documents still exist on disk, [`load`] rebuilds both the
//! manifest and the vector index from whatever is actually present.

use std::{io::ErrorKind, path::Path};

use crate::{
    data_dir::DataDir,
    error::Result,
    index::DocumentIndex,
    user_id::UserId,
};

/// Outcome of inspecting the on-disk manifest state for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestState {
    /// No workspace directory, or an empty one: a legitimately new user.
    NewUser,
    /// Manifest read cleanly.
    Intact(Vec<String>),
    /// Manifest missing or unreadable while documents exist on disk.
    /// Carries the file names enumerated from the document directory.
    Corrupted(Vec<String>),
}

/// Classify the manifest state without repairing anything.
///
/// "Record not found" is only corruption if documents are actually present;
/// an absent workspace or an empty document directory means a new user.
/// Read failures other than not-found surface as I/O errors.
pub fn inspect(dirs: &DataDir, user: &UserId) -> Result<ManifestState> {
    if !dirs.user_dir(user).exists() {
        return Ok(ManifestState::NewUser);
    }

    match std::fs::read_to_string(dirs.manifest_path(user)) {
        Ok(contents) => Ok(ManifestState::Intact(parse(&contents))),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::InvalidData) => {
            let on_disk = docs_on_disk(&dirs.docs_dir(user))?;
            if on_disk.is_empty() {
                Ok(ManifestState::NewUser)
            } else {
                Ok(ManifestState::Corrupted(on_disk))
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Load the manifest for a user, repairing it if corrupted.
///
/// Repair discards the old persisted index entirely (it can no longer be
/// trusted to match the manifest), rebuilds it from the files found in the
/// document directory, and writes a fresh manifest naming exactly those
/// files. Runs lazily, on first access after the corruption happened.
pub fn load<I: DocumentIndex>(
    dirs: &DataDir,
    user: &UserId,
    index: &I,
) -> Result<Vec<String>> {
    match inspect(dirs, user)? {
        ManifestState::NewUser => Ok(Vec::new()),
        ManifestState::Intact(names) => Ok(names),
        ManifestState::Corrupted(names) => {
            tracing::warn!(
                user = %user,
                files = names.len(),
                "manifest missing but documents exist; rebuilding index"
            );

            let index_dir = dirs.index_dir(user);
            if index_dir.exists() {
                std::fs::remove_dir_all(&index_dir)?;
            }

            let docs_dir = dirs.docs_dir(user);
            let files: Vec<_> =
                names.iter().map(|n| docs_dir.join(n)).collect();
            index.build_from_files(&files, &index_dir)?;

            save(&dirs.manifest_path(user), &names)?;
            Ok(names)
        }
    }
}

/// Overwrite the manifest atomically with the given ordered names.
///
/// Duplicates are dropped, keeping the first occurrence.
pub fn save(path: &Path, names: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    let deduped: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| seen.insert(*n))
        .collect();

    let tmp = path.with_extension("txt.tmp");
    std::fs::write(&tmp, deduped.join("\n"))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Enumerate file base names currently present in the document directory,
/// sorted for determinism.
pub fn docs_on_disk(docs_dir: &Path) -> Result<Vec<String>> {
    if !docs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(docs_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn parse(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::FakeIndex;

    fn setup() -> (tempfile::TempDir, DataDir, UserId) {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = DataDir::resolve(Some(tmp.path())).unwrap();
        let user = UserId::new("u1").unwrap();
        (tmp, dirs, user)
    }

    #[test]
    fn missing_workspace_is_new_user() {
        let (_tmp, dirs, user) = setup();
        assert_eq!(inspect(&dirs, &user).unwrap(), ManifestState::NewUser);
    }

    #[test]
    fn empty_workspace_is_new_user() {
        let (_tmp, dirs, user) = setup();
        std::fs::create_dir_all(dirs.docs_dir(&user)).unwrap();
        assert_eq!(inspect(&dirs, &user).unwrap(), ManifestState::NewUser);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_tmp, dirs, user) = setup();
        std::fs::create_dir_all(dirs.user_dir(&user)).unwrap();

        let names = vec!["b.pdf".to_string(), "a.pdf".to_string()];
        save(&dirs.manifest_path(&user), &names).unwrap();

        assert_eq!(
            inspect(&dirs, &user).unwrap(),
            ManifestState::Intact(names)
        );
    }

    #[test]
    fn save_drops_duplicates_keeps_order() {
        let (_tmp, dirs, user) = setup();
        std::fs::create_dir_all(dirs.user_dir(&user)).unwrap();

        let names = vec![
            "a.pdf".to_string(),
            "b.pdf".to_string(),
            "a.pdf".to_string(),
        ];
        save(&dirs.manifest_path(&user), &names).unwrap();

        assert_eq!(
            inspect(&dirs, &user).unwrap(),
            ManifestState::Intact(vec![
                "a.pdf".to_string(),
                "b.pdf".to_string()
            ])
        );
    }

    #[test]
    fn missing_manifest_with_docs_is_corrupted() {
        let (_tmp, dirs, user) = setup();
        let docs = dirs.docs_dir(&user);
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("b.pdf"), "two").unwrap();
        std::fs::write(docs.join("a.pdf"), "one").unwrap();

        assert_eq!(
            inspect(&dirs, &user).unwrap(),
            ManifestState::Corrupted(vec![
                "a.pdf".to_string(),
                "b.pdf".to_string()
            ])
        );
    }

    #[test]
    fn load_repairs_corruption() {
        let (_tmp, dirs, user) = setup();
        let docs = dirs.docs_dir(&user);
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.pdf"), "one").unwrap();
        std::fs::write(docs.join("b.pdf"), "two").unwrap();

        // A stale index left behind by the lost manifest.
        let index_dir = dirs.index_dir(&user);
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join("stale"), "old").unwrap();

        let index = FakeIndex::default();
        let names = load(&dirs, &user, &index).unwrap();
        assert_eq!(names, vec!["a.pdf".to_string(), "b.pdf".to_string()]);

        // Stale index contents were discarded before the rebuild.
        assert!(!index_dir.join("stale").exists());
        assert_eq!(index.built_from(), vec!["a.pdf", "b.pdf"]);

        // Fresh manifest was written; a second load is a plain read.
        assert_eq!(
            inspect(&dirs, &user).unwrap(),
            ManifestState::Intact(names)
        );
    }

    #[test]
    fn load_for_new_user_is_empty() {
        let (_tmp, dirs, user) = setup();
        let index = FakeIndex::default();
        assert!(load(&dirs, &user, &index).unwrap().is_empty());
        assert!(index.built_from().is_empty());
    }
}
