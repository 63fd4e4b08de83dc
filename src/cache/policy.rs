use std::path::Path;

/// Decides whether an existing cache file may satisfy a lookup.
///
/// The default policy, [`FileExists`], treats the presence of the file as
/// the only hit signal: entries are never expired or revalidated, which
/// matches the publish-once nature of the datasets this crate mirrors.
/// Alternative policies are mostly useful in tests, where forcing the hit
/// or miss path makes the fetch flow deterministic.
pub trait CachePolicy: Send + Sync {
    /// Returns `true` when the file at `path` should be used without
    /// refetching.
    fn is_hit(&self, path: &Path) -> bool;
}

/// The default policy: a cache entry is valid iff its file exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExists;

impl CachePolicy for FileExists {
    fn is_hit(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_exists_policy_tracks_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry.csv");
        assert!(!FileExists.is_hit(&path));
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(FileExists.is_hit(&path));
    }
}
