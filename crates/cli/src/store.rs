//! File-backed cart ID store.
//!
//! The CLI keeps the held cart ID in a small JSON file so consecutive
//! invocations keep adding to the same cart:
//!
//! ```json
//! {"cart_id": "c1"}
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the cart file, so readers see either the old ID or the new one. A
//! file that cannot be parsed anyway is discarded and treated as "no cart";
//! the next add starts a fresh one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tienda_core::CartId;
use tienda_storefront::cart_session::{CartIdStore, StoreError};

/// Default location of the cart file, relative to the working directory.
pub const DEFAULT_CART_FILE: &str = ".tienda/cart.json";

#[derive(Debug, Serialize, Deserialize)]
struct CartFile {
    cart_id: CartId,
}

/// Stores the cart ID in a JSON file. A missing file means no cart.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the cart file lives in.
    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl CartIdStore for FileCartStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<CartFile>(&contents) {
            Ok(file) => Ok(Some(file.cart_id)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable cart file"
                );
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), StoreError> {
        let dir = self.dir();
        tokio::fs::create_dir_all(&dir).await?;

        let contents = serde_json::to_vec(&CartFile {
            cart_id: cart_id.clone(),
        })?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &contents))
            .await
            .map_err(std::io::Error::other)??;

        debug!(path = %self.path.display(), %cart_id, "Saved cart ID");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `contents` to a temp file in `dir`, sync it, and rename it to `path`.
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_means_no_cart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartStore::new(dir.path().join("cart.json"));

        assert_eq!(store.load().await.unwrap(), None);
        // Clearing an absent file is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.json");
        let store = FileCartStore::new(&path);

        store.save(&CartId::new("c1")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CartId::new("c1")));

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(raw, r#"{"cart_id":"c1"}"#);

        store.save(&CartId::new("c2")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CartId::new("c2")));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCartStore::new(dir.path().join("cart.json"));

        store.save(&CartId::new("c1")).await.unwrap();
        store.save(&CartId::new("c2")).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["cart.json"]);
    }

    #[tokio::test]
    async fn test_truncated_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        tokio::fs::write(&path, r#"{"cart_id":"c1"#).await.unwrap();
        let store = FileCartStore::new(&path);

        assert_eq!(store.load().await.unwrap(), None);
        assert!(!path.exists());

        // The store is usable again straight away
        store.save(&CartId::new("c2")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(CartId::new("c2")));
    }

    #[tokio::test]
    async fn test_binary_garbage_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        tokio::fs::write(&path, [0xff, 0xfe, 0x00]).await.unwrap();

        assert_eq!(FileCartStore::new(&path).load().await.unwrap(), None);
        assert!(!path.exists());
    }
}
