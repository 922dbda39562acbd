use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::StatValues;

/// Last-seen stat values per app, one `latest_<appid>.json` file each.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, appid: &str) -> PathBuf {
        self.dir.join(format!("latest_{appid}.json"))
    }

    /// Read the snapshot for `appid`. `Ok(None)` means the app has never been
    /// observed; any other failure is an error.
    pub async fn read(&self, appid: &str) -> Result<Option<StatValues>> {
        let path = self.path_for(appid);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Io { path, source }),
        };
        let values = serde_json::from_slice(&bytes)
            .map_err(|source| Error::SnapshotCorrupt { path: path.clone(), source })?;
        debug!("Read snapshot {}", path.display());
        Ok(Some(values))
    }

    /// Replace the snapshot for `appid` with `values`.
    ///
    /// Each write goes to its own temp file in the snapshot dir, which is then
    /// renamed over the old snapshot. Readers see either the previous snapshot
    /// or the new one, and concurrent writers for the same app never share a
    /// temp file.
    pub async fn write(&self, appid: &str, values: &StatValues) -> Result<()> {
        let path = self.path_for(appid);

        let mut bytes = serde_json::to_vec(values)
            .map_err(|source| Error::SnapshotCorrupt { path: path.clone(), source })?;
        bytes.push(b'\n');

        let dir = self.dir.clone();
        let target = path.clone();
        let prefix = format!(".latest_{appid}.");
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Io {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|source| Error::Io { path: path.clone(), source })?;

        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}
