use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::AvatarConfig;
use crate::error::StorageError;

/// Object prefix every avatar lives under.
pub const AVATAR_PREFIX: &str = "avatars";

/// Filesystem-backed object store for profile pictures.
///
/// Objects are written to `<root>/avatars/<user_id>-<uuid>.<ext>` and served
/// at `<public_base_url>/avatars/<user_id>-<uuid>.<ext>`.
pub struct AvatarStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
    allowed_extensions: Vec<String>,
}

impl AvatarStore {
    pub fn new(config: &AvatarConfig) -> Self {
        Self {
            root: config.directory.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an avatar for `user_id` and returns its public URL.
    pub fn upload(
        &self,
        user_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<String, StorageError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&ext) {
            return Err(StorageError::UnsupportedExtension(ext));
        }
        if content.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: content.len(),
                limit: self.max_bytes,
            });
        }

        let dir = self.root.join(AVATAR_PREFIX);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;

        let object_name = format!("{}-{}.{}", user_id, uuid::Uuid::new_v4(), ext);
        let path = dir.join(&object_name);

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;
        file.write_all(content)
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        log::debug!("Stored avatar object {}", object_name);

        Ok(self.public_url(&format!("{}/{}", AVATAR_PREFIX, object_name)))
    }

    /// Public URL for an object path such as `avatars/u1-<uuid>.png`.
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}", self.public_base_url, object_path)
    }

    /// Removes the avatar behind `avatar_url`. Only objects named after
    /// `user_id` may be removed; a missing object is not an error.
    pub fn delete(&self, user_id: &str, avatar_url: &str) -> Result<(), StorageError> {
        let object_name = object_name_from_url(avatar_url)?;
        if !object_name.starts_with(&format!("{}-", user_id)) {
            return Err(StorageError::NotOwner);
        }

        let path = self.root.join(AVATAR_PREFIX).join(object_name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Deleted avatar object {}", object_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Avatar object {} already gone", object_name);
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFile { path, source: e }),
        }
    }
}

/// The last path segment of an avatar URL, rejecting anything that could
/// escape the avatar directory.
pub fn object_name_from_url(url: &str) -> Result<&str, StorageError> {
    let name = url
        .split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').next())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }
    Ok(name)
}
