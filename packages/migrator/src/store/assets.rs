use std::fs;
use std::path::{Path, PathBuf};

use super::AssetStore;
use crate::error::AssetError;

const AVATAR_DIR: &str = "avatars";
const UPLOAD_DIR: &str = "files";

/// Local-disk asset storage rooted at the target forum's asset directory.
///
/// Mirrors the target layout: avatars under `avatars/`, uploads under
/// `files/`, both created on demand.
pub struct DirAssets {
    avatar_dir: PathBuf,
    upload_dir: PathBuf,
    base_url: String,
}

impl DirAssets {
    pub fn new(assets_dir: &Path, base_url: &str) -> Self {
        Self {
            avatar_dir: assets_dir.join(AVATAR_DIR),
            upload_dir: assets_dir.join(UPLOAD_DIR),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn copy_into(src: &Path, dest: &Path) -> Result<(), AssetError> {
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).map_err(|source| AssetError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::copy(src, dest).map_err(|source| AssetError::Copy {
            path: src.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

impl AssetStore for DirAssets {
    fn store_avatar(&self, src: &Path, file_name: &str) -> Result<(), AssetError> {
        Self::copy_into(src, &self.avatar_dir.join(file_name))
    }

    fn store_upload(&self, src: &Path, dest_rel: &str) -> Result<(), AssetError> {
        Self::copy_into(src, &self.upload_dir.join(dest_rel))
    }

    fn upload_url(&self, dest_rel: &str) -> String {
        format!("{}/assets/{}/{}", self.base_url, UPLOAD_DIR, dest_rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_urls_are_rooted_at_the_asset_path() {
        let assets = DirAssets::new(Path::new("/tmp/forum-assets"), "http://forum.test/");
        assert_eq!(
            assets.upload_url("old/5report.pdf"),
            "http://forum.test/assets/files/old/5report.pdf"
        );
    }

    #[test]
    fn missing_source_files_fail_the_copy_not_the_process() {
        let dir = std::env::temp_dir().join("migrator-assets-test");
        let assets = DirAssets::new(&dir, "http://forum.test");
        let err = assets
            .store_avatar(Path::new("/nonexistent/avatar.png"), "avatar.png")
            .unwrap_err();
        assert!(matches!(err, AssetError::Copy { .. }));
    }
}
