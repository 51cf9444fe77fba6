//! Filesystem-backed channel for a collector and server in separate processes.
//!
//! The channel is a regular file holding the newest record. Publishing writes
//! a sibling temp file and renames it over the channel path, so readers see
//! either the previous record or the new one, never a partial write, and the
//! publisher never waits for a reader.

use super::{decode_latest, encode_record, ChannelError, SnapshotChannel};
use crate::metrics::Snapshot;
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Permission bits for the channel: any local user may read it.
#[cfg(unix)]
const CHANNEL_MODE: u32 = 0o666;

const TEMP_SUFFIX: &str = ".tmp";

/// Handle on a channel file at a fixed path.
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    /// Reader-side handle. Never creates or removes the file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the channel file for a collector and tie its lifetime to the guard.
    ///
    /// Content left behind by a previous collector that did not shut down
    /// cleanly is discarded so readers get 503 rather than a stale snapshot.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<ChannelGuard, ChannelError> {
        let channel = Self::open(path);

        if let Some(parent) = channel.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if channel.path.exists() {
            warn!(
                "Found existing channel at {}, clearing stale content",
                channel.path.display()
            );
        }
        fs::File::create(&channel.path)?;
        set_world_accessible(&channel.path)?;

        info!("Created metrics channel at {}", channel.path.display());
        Ok(ChannelGuard {
            channel: Arc::new(channel),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prefix shared by every temp file this channel writes: `.<name>.`
    fn temp_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "channel".to_string());
        format!(".{}.", name)
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_file_name(format!(
            "{}{}{}",
            self.temp_prefix(),
            uuid::Uuid::new_v4(),
            TEMP_SUFFIX
        ))
    }

    /// Remove temp files left by a publish that was cancelled before its rename.
    fn remove_stale_temps(&self) {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        let prefix = self.temp_prefix();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(TEMP_SUFFIX) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => debug!("Removed stale temp file {}", entry.path().display()),
                    Err(e) => warn!(
                        "Failed to remove temp file {}: {}",
                        entry.path().display(),
                        e
                    ),
                }
            }
        }
    }
}

#[async_trait]
impl SnapshotChannel for FileChannel {
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), ChannelError> {
        let record = encode_record(snapshot)?;
        let temp = self.temp_path();

        let written = async {
            tokio::fs::write(&temp, record.as_bytes()).await?;
            set_world_accessible(&temp)?;
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!("Published snapshot to {}", self.path.display());
        Ok(())
    }

    async fn latest(&self) -> Result<Snapshot, ChannelError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ChannelError::Absent {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        decode_latest(&text)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Owns the channel file for the lifetime of a collector; removes it on drop.
#[derive(Debug)]
pub struct ChannelGuard {
    channel: Arc<FileChannel>,
}

impl ChannelGuard {
    /// Shared handle for publishing through the guarded channel.
    pub fn channel(&self) -> Arc<FileChannel> {
        Arc::clone(&self.channel)
    }

    pub fn path(&self) -> &Path {
        self.channel.path()
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.channel.remove_stale_temps();
        match fs::remove_file(self.channel.path()) {
            Ok(()) => info!("Removed metrics channel at {}", self.channel.path().display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove metrics channel at {}: {}",
                self.channel.path().display(),
                e
            ),
        }
    }
}

#[cfg(unix)]
fn set_world_accessible(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(CHANNEL_MODE))
}

#[cfg(not(unix))]
fn set_world_accessible(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
