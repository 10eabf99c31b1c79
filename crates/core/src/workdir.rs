//! Per-pack working directories.
//!
//! Every media pack gets a scoped directory under the configured base,
//! named by a generated pack id, and fully removed once the pack has been
//! published or abandoned. Nothing under the base directory outlives its
//! pack.

use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Generates a pack identifier: timestamp plus a short random suffix.
pub fn generate_pack_id() -> String {
    let ts = Local::now().format("%Y%m%d-%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("RP-{}-{}", ts, &suffix[..6])
}

/// Creates a fresh working directory for one pack under `base`.
pub async fn create_pack_dir(base: &Path) -> io::Result<PathBuf> {
    let dir = base.join(generate_pack_id());
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Removes a pack directory, best-effort. Deletion failure is never a
/// pipeline failure.
pub async fn purge_pack_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        debug!(dir = %dir.display(), error = %e, "Pack dir cleanup failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_id_shape() {
        let id = generate_pack_id();
        assert!(id.starts_with("RP-"));
        // RP- + 15 timestamp chars + - + 6 suffix chars
        assert_eq!(id.len(), 3 + 15 + 1 + 6);
    }

    #[test]
    fn test_pack_ids_unique() {
        let a = generate_pack_id();
        let b = generate_pack_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_and_purge() {
        let base = tempfile::tempdir().unwrap();
        let dir = create_pack_dir(base.path()).await.unwrap();
        assert!(dir.exists());

        purge_pack_dir(&dir).await;
        assert!(!dir.exists());

        // Purging a missing dir is a no-op.
        purge_pack_dir(&dir).await;
    }
}
