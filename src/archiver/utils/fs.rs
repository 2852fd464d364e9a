//! File system helpers for artifact publication.
//!
//! Copies create destination parent directories as needed and preserve
//! symlinks inside copied bundles (.xcarchive and dSYM bundles contain
//! them on macOS).

use std::io;
use std::path::Path;

use tokio::fs;

/// Copies a regular file, creating destination parents as necessary.
pub async fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(from, to).await?;
    Ok(())
}

/// Recursively copies a directory, creating destination parents as
/// necessary and preserving symlinks.
pub async fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Blocking traversal is offloaded to the dedicated thread pool
    tokio::task::spawn_blocking(move || {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry.map_err(io::Error::other)?;
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(io::Error::other)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                #[cfg(unix)]
                std::os::unix::fs::symlink(&target, &dest_path)?;
                #[cfg(windows)]
                {
                    if entry.path().is_dir() {
                        std::os::windows::fs::symlink_dir(&target, &dest_path)?;
                    } else {
                        std::os::windows::fs::symlink_file(&target, &dest_path)?;
                    }
                }
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| io::Error::other(format!("directory copy task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_file_creates_parent_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.log");
        let dst = tmp.path().join("nested/deep/dst.log");
        std::fs::write(&src, "contents").expect("write src");

        copy_file(&src, &dst).await.expect("copy");
        assert_eq!(std::fs::read_to_string(&dst).expect("read dst"), "contents");
    }

    #[tokio::test]
    async fn copy_dir_replicates_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("bundle");
        std::fs::create_dir_all(src.join("inner")).expect("mkdir");
        std::fs::write(src.join("inner/file.txt"), "x").expect("write");

        let dst = tmp.path().join("out/bundle");
        copy_dir(&src, &dst).await.expect("copy");
        assert!(dst.join("inner/file.txt").is_file());
    }
}
