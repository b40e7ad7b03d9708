//! Vision vault
//!
//! One JSON document per submitted vision, stored as `vision_<id>.json` under
//! the vault root, where `<id>` is the first 16 hex characters of
//! SHA3-256(content).
//!
//! All mutations hold the vault's write lock. Records are written to a
//! temp file and renamed into place; a purge swaps the whole directory for an
//! empty one. Readers holding the read lock therefore never see a partial
//! record or a missing root.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{VaultError, VaultResult};

const RECORD_PREFIX: &str = "vision_";
const RECORD_SUFFIX: &str = ".json";
const ID_LEN: usize = 16;

/// Content-addressed vision identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisionId(String);

impl VisionId {
    pub fn from_content(content: &str) -> Self {
        let digest = hex::encode(Sha3_256::digest(content.as_bytes()));
        Self(digest[..ID_LEN].to_string())
    }

    pub fn parse(raw: &str) -> VaultResult<Self> {
        let valid = raw.len() == ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(VaultError::InvalidVisionId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{RECORD_PREFIX}{}{RECORD_SUFFIX}", self.0)
    }
}

impl fmt::Display for VisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored document: the submitted body plus the oracle's raw assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionRecord {
    pub metadata: serde_json::Value,
    pub ai_assessment: String,
}

/// Acknowledgement of a completed purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeAck {
    /// Directory entries erased by this purge.
    pub removed: usize,
}

#[derive(Debug)]
pub struct VisionVault {
    root: PathBuf,
    lock: RwLock<()>,
}

impl VisionVault {
    /// Open the vault, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| VaultError::io("create", &root, e))?;
        debug!(root = %root.display(), "Vision vault opened");
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a vision under its content-derived id. Same content, same file.
    pub async fn store_vision(
        &self,
        content: &str,
        metadata: serde_json::Value,
        ai_assessment: String,
    ) -> VaultResult<VisionId> {
        let id = VisionId::from_content(content);
        let record = VisionRecord {
            metadata,
            ai_assessment,
        };
        self.store(&id, &record).await?;
        Ok(id)
    }

    pub async fn store(&self, id: &VisionId, record: &VisionRecord) -> VaultResult<PathBuf> {
        let bytes = serde_json::to_vec(record)?;
        let _guard = self.lock.write().await;

        let target = self.root.join(id.file_name());
        let tmp = self
            .root
            .join(format!(".{}.{}.tmp", id, Uuid::new_v4().simple()));

        write_then_rename(&tmp, &target, &bytes).await?;

        debug!(vision_id = %id, "Vision stored");
        Ok(target)
    }

    pub async fn get(&self, id: &VisionId) -> VaultResult<Option<VisionRecord>> {
        let _guard = self.lock.read().await;
        let path = self.root.join(id.file_name());
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::io("read", path, e)),
        }
    }

    /// Stored vision ids, sorted.
    pub async fn list(&self) -> VaultResult<Vec<VisionId>> {
        let _guard = self.lock.read().await;
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| VaultError::io("list", &self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VaultError::io("list", &self.root, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(raw) = name
                .strip_prefix(RECORD_PREFIX)
                .and_then(|rest| rest.strip_suffix(RECORD_SUFFIX))
            {
                if let Ok(id) = VisionId::parse(raw) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn len(&self) -> VaultResult<usize> {
        Ok(self.list().await?.len())
    }

    pub async fn is_empty(&self) -> VaultResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Irreversibly erase every stored vision, leaving the root present and
    /// empty.
    ///
    /// An empty staging directory is swapped in for the live root, then the
    /// retired tree is deleted. If the swap fails the old root is put back and
    /// the error is returned. If the retired tree cannot be deleted the purge
    /// is reported as incomplete.
    pub async fn purge(&self) -> VaultResult<PurgeAck> {
        let _guard = self.lock.write().await;

        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                VaultError::PurgeIncomplete(format!(
                    "vault root {} has no directory name",
                    self.root.display()
                ))
            })?
            .to_string();
        let parent = match self.root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let nonce = Uuid::new_v4().simple();
        let staging = parent.join(format!(".{name}.staging-{nonce}"));
        let retired = parent.join(format!(".{name}.retired-{nonce}"));

        let removed = count_entries(&self.root).await?;

        tokio::fs::create_dir(&staging)
            .await
            .map_err(|e| VaultError::io("stage", &staging, e))?;

        let had_root = match tokio::fs::rename(&self.root, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                let _ = tokio::fs::remove_dir(&staging).await;
                return Err(VaultError::io("retire", &self.root, e));
            }
        };

        if let Err(e) = tokio::fs::rename(&staging, &self.root).await {
            if had_root {
                if let Err(restore) = tokio::fs::rename(&retired, &self.root).await {
                    error!(
                        root = %self.root.display(),
                        retired = %retired.display(),
                        "Vault root could not be restored after failed purge: {}",
                        restore
                    );
                }
            }
            let _ = tokio::fs::remove_dir(&staging).await;
            return Err(VaultError::io("recreate", &self.root, e));
        }

        if had_root {
            if let Err(e) = tokio::fs::remove_dir_all(&retired).await {
                warn!(retired = %retired.display(), "Retired vault tree survived purge: {}", e);
                return Err(VaultError::PurgeIncomplete(format!(
                    "retired tree {} could not be removed: {}",
                    retired.display(),
                    e
                )));
            }
        }

        // Trees left behind by earlier incomplete purges
        let swept = sweep_retired(&parent, &name).await?;
        if swept > 0 {
            warn!(swept, "Removed retired vault trees from earlier purges");
        }

        info!(removed, "Vision vault sanitized");
        Ok(PurgeAck { removed })
    }
}

/// Write `bytes` to `tmp`, then rename over `target`. The temp file never
/// outlives a failure.
async fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> VaultResult<()> {
    if let Err(e) = tokio::fs::write(tmp, bytes).await {
        let _ = tokio::fs::remove_file(tmp).await;
        return Err(VaultError::io("write", tmp, e));
    }
    if let Err(e) = tokio::fs::rename(tmp, target).await {
        let _ = tokio::fs::remove_file(tmp).await;
        return Err(VaultError::io("commit", target, e));
    }
    Ok(())
}

/// Delete every `.<name>.retired-*` sibling of the vault root.
async fn sweep_retired(parent: &Path, name: &str) -> VaultResult<usize> {
    let prefix = format!(".{name}.retired-");
    let mut entries = tokio::fs::read_dir(parent)
        .await
        .map_err(|e| VaultError::io("list", parent, e))?;
    let mut swept = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| VaultError::io("list", parent, e))?
    {
        let is_retired = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(&prefix));
        if !is_retired {
            continue;
        }
        let path = entry.path();
        tokio::fs::remove_dir_all(&path).await.map_err(|e| {
            VaultError::PurgeIncomplete(format!(
                "retired tree {} could not be removed: {}",
                path.display(),
                e
            ))
        })?;
        swept += 1;
    }
    Ok(swept)
}

async fn count_entries(dir: &Path) -> VaultResult<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(VaultError::io("list", dir, e)),
    };
    let mut count = 0;
    while entries
        .next_entry()
        .await
        .map_err(|e| VaultError::io("list", dir, e))?
        .is_some()
    {
        count += 1;
    }
    Ok(count)
}
