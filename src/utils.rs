use log::info;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable overriding the root cache directory.
pub const CACHE_DIR_ENV_VAR: &str = "STORMDATA_CACHE_DIR";

pub(crate) const DEFAULT_CACHE_SUBDIR: &str = "stormdata_cache";

/// Resolves the cache root: the environment override wins verbatim,
/// otherwise the platform cache directory joined with `default_subdir`.
pub fn resolve_cache_dir(env_var: &str, default_subdir: &str) -> io::Result<PathBuf> {
    if let Some(dir) = env::var_os(env_var) {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir()
        .map(|base| base.join(default_subdir))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine a cache directory for this platform",
            )
        })
}

/// Creates the directory (and any missing parents) if absent; succeeds
/// idempotently when it already exists. A non-directory at the path is an
/// error.
pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "cache path exists but is not a directory: {}",
                path.display()
            ),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory {}", path.display());
            fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        env::set_var("STORMDATA_TEST_CACHE_OVERRIDE", dir.path());

        let resolved = resolve_cache_dir("STORMDATA_TEST_CACHE_OVERRIDE", "unused").unwrap();

        assert_eq!(resolved, dir.path());
        env::remove_var("STORMDATA_TEST_CACHE_OVERRIDE");
    }

    #[test]
    fn default_appends_subdir_to_platform_cache() {
        if dirs::cache_dir().is_none() {
            return;
        }
        let resolved =
            resolve_cache_dir("STORMDATA_TEST_CACHE_UNSET", "stormdata_test_subdir").unwrap();
        assert!(resolved.ends_with("stormdata_test_subdir"));
    }

    #[tokio::test]
    async fn ensure_creates_nested_directories_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        ensure_cache_dir_exists(&nested).await.unwrap();
        ensure_cache_dir_exists(&nested).await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn ensure_rejects_a_file_at_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();

        assert!(ensure_cache_dir_exists(&file).await.is_err());
    }
}
