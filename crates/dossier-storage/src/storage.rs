//! [`Storage`]: the per-tag operator registry and its read/write contract.

use std::collections::HashMap;

use bytes::Bytes;
use dossier_core::document::{BackendTag, StoredContent};
use opendal::{ErrorKind, Operator, services};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  config::{S3Config, StorageConfig},
  error::{Result, StorageError},
  mime,
};

/// Whether a registered backend may accept new files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteReadiness {
  Ready,
  /// Reads keep working; writes fail with this reason.
  Unavailable(String),
}

struct Backend {
  operator:  Operator,
  readiness: WriteReadiness,
}

/// Uniform access to every configured backend, selected per call by tag.
#[derive(Default)]
pub struct Storage {
  backends: HashMap<BackendTag, Backend>,
}

impl Storage {
  /// An empty registry. Every operation fails with `BackendUnavailable`
  /// until backends are added with [`Storage::with_backend`].
  pub fn new() -> Self { Self::default() }

  /// Build operators for the local root and, when a section exists, for S3.
  ///
  /// An incomplete S3 section is not an error here: the backend is
  /// registered for reads if an operator can be built at all, and marked
  /// unavailable for writes.
  pub fn from_config(config: &StorageConfig) -> Result<Self> {
    let root = config.local.root.to_str().ok_or_else(|| {
      StorageError::unavailable(BackendTag::Local, "local root is not valid UTF-8")
    })?;
    let local = Operator::new(services::Fs::default().root(root))
      .map_err(|e| StorageError::unavailable(BackendTag::Local, e.to_string()))?
      .finish();

    let mut storage = Self::new().with_backend(BackendTag::Local, local, WriteReadiness::Ready);

    if let Some(s3) = &config.s3 {
      let missing = s3.missing_fields();
      let readiness = if missing.is_empty() {
        WriteReadiness::Ready
      } else {
        WriteReadiness::Unavailable(format!(
          "incomplete s3 configuration, missing: {}",
          missing.join(", ")
        ))
      };

      match s3_operator(s3) {
        Ok(operator) => {
          if let WriteReadiness::Unavailable(reason) = &readiness {
            tracing::warn!(%reason, "s3 backend registered read-only");
          }
          storage = storage.with_backend(BackendTag::S3, operator, readiness);
        }
        Err(e) => {
          tracing::warn!(error = %e, "s3 backend could not be initialised");
        }
      }
    }

    Ok(storage)
  }

  /// Register (or replace) the operator behind `tag`.
  pub fn with_backend(
    mut self,
    tag: BackendTag,
    operator: Operator,
    readiness: WriteReadiness,
  ) -> Self {
    self.backends.insert(tag, Backend { operator, readiness });
    self
  }

  /// A registry with a separate in-memory backend under every tag.
  pub fn in_memory() -> Result<Self> {
    let mut storage = Self::new();
    for tag in [BackendTag::Local, BackendTag::S3] {
      let operator = Operator::new(services::Memory::default())?.finish();
      storage = storage.with_backend(tag, operator, WriteReadiness::Ready);
    }
    Ok(storage)
  }

  fn backend(&self, tag: BackendTag) -> Result<&Backend> {
    self
      .backends
      .get(&tag)
      .ok_or_else(|| StorageError::unavailable(tag, "backend is not configured"))
  }

  /// Whether `path` exists on `tag`. Any failure to ask counts as absent.
  pub async fn exists(&self, tag: BackendTag, path: &str) -> bool {
    let Ok(backend) = self.backend(tag) else {
      return false;
    };
    match backend.operator.stat(path).await {
      Ok(_) => true,
      Err(e) if e.kind() == ErrorKind::NotFound => false,
      Err(e) => {
        tracing::debug!(backend = %tag, path, error = %e, "stat failed");
        false
      }
    }
  }

  /// Read the whole file.
  pub async fn read(&self, tag: BackendTag, path: &str) -> Result<Bytes> {
    let backend = self.backend(tag)?;
    let buffer = backend.operator.read(path).await.map_err(|e| {
      if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound { path: path.to_owned() }
      } else {
        StorageError::from(e)
      }
    })?;
    Ok(buffer.to_bytes())
  }

  /// Store `bytes` under `{prefix}/{uuid}.{ext}` on `tag`, where the
  /// extension is taken from `suggested_name`.
  ///
  /// Configuration is checked before any bytes are sent. The returned
  /// content is only produced once the backend has confirmed the write.
  pub async fn write(
    &self,
    prefix: &str,
    suggested_name: &str,
    tag: BackendTag,
    bytes: Bytes,
  ) -> Result<StoredContent> {
    let backend = self.backend(tag)?;
    if let WriteReadiness::Unavailable(reason) = &backend.readiness {
      return Err(StorageError::unavailable(tag, reason.clone()));
    }

    let path = storage_path(prefix, suggested_name);
    let size_bytes = bytes.len() as u64;
    let content_hash = hex::encode(Sha256::digest(&bytes));

    if let Err(e) = backend.operator.write(&path, bytes).await {
      tracing::warn!(backend = %tag, %path, error = %e, "write failed");
      // Whatever landed is unusable without a record pointing at it.
      if let Err(cleanup) = backend.operator.delete(&path).await {
        tracing::warn!(backend = %tag, %path, error = %cleanup, "could not remove partial write");
      }
      return Err(StorageError::unavailable(tag, e.to_string()));
    }

    tracing::debug!(backend = %tag, %path, size_bytes, "stored file");
    Ok(StoredContent { storage_path: path, backend: tag, size_bytes, content_hash })
  }

  /// Remove a file. Used to clean up after a write whose record could not
  /// be committed.
  pub async fn delete(&self, tag: BackendTag, path: &str) -> Result<()> {
    let backend = self.backend(tag)?;
    backend.operator.delete(path).await?;
    Ok(())
  }

  pub fn mime_type(&self, path: &str) -> &'static str { mime::mime_type(path) }
}

fn s3_operator(cfg: &S3Config) -> Result<Operator, opendal::Error> {
  let mut builder = services::S3::default()
    .bucket(&cfg.bucket)
    .region(&cfg.region)
    .access_key_id(&cfg.access_key_id)
    .secret_access_key(&cfg.secret_access_key);
  if let Some(endpoint) = &cfg.endpoint {
    builder = builder.endpoint(endpoint);
  }
  Ok(Operator::new(builder)?.finish())
}

/// `{prefix}/{uuid}.{ext}`, with the extension lowercased and reduced to
/// ASCII alphanumerics.
fn storage_path(prefix: &str, suggested_name: &str) -> String {
  let prefix = prefix.trim_matches('/');
  let ext: Option<String> = mime::extension(suggested_name)
    .map(|e| e.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
    .filter(|e| !e.is_empty())
    .map(|e| e.to_ascii_lowercase());

  let file = match ext {
    Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
    None => Uuid::new_v4().to_string(),
  };
  if prefix.is_empty() { file } else { format!("{prefix}/{file}") }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LocalConfig;

  fn memory() -> Operator {
    Operator::new(services::Memory::default())
      .expect("memory operator")
      .finish()
  }

  #[test]
  fn storage_path_keeps_only_the_extension() {
    let path = storage_path("documents", "Quarterly Report.PDF");
    assert!(path.starts_with("documents/"));
    assert!(path.ends_with(".pdf"));
    assert!(!path.contains("Quarterly"));

    let bare = storage_path("/documents/", "README");
    assert_eq!(bare.matches('.').count(), 0);
    assert!(bare.starts_with("documents/"));
  }

  #[tokio::test]
  async fn write_then_read_round_trips_with_hash_and_size() {
    let storage = Storage::in_memory().unwrap();
    let stored = storage
      .write("documents", "memo.txt", BackendTag::Local, Bytes::from_static(b"hello world"))
      .await
      .unwrap();

    assert_eq!(stored.size_bytes, 11);
    assert_eq!(
      stored.content_hash,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert!(storage.exists(BackendTag::Local, &stored.storage_path).await);

    let bytes = storage.read(BackendTag::Local, &stored.storage_path).await.unwrap();
    assert_eq!(&bytes[..], b"hello world");
    assert_eq!(storage.mime_type(&stored.storage_path), "text/plain");
  }

  #[tokio::test]
  async fn missing_file_is_not_found() {
    let storage = Storage::in_memory().unwrap();
    assert!(!storage.exists(BackendTag::Local, "documents/nope.pdf").await);
    let err = storage.read(BackendTag::Local, "documents/nope.pdf").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
  }

  #[tokio::test]
  async fn unconfigured_backend_is_unavailable() {
    let storage = Storage::new().with_backend(BackendTag::Local, memory(), WriteReadiness::Ready);

    let err = storage
      .write("documents", "a.pdf", BackendTag::S3, Bytes::from_static(b"x"))
      .await
      .unwrap_err();
    assert!(matches!(err, StorageError::BackendUnavailable { backend: BackendTag::S3, .. }));

    let err = storage.read(BackendTag::S3, "documents/a.pdf").await.unwrap_err();
    assert!(matches!(err, StorageError::BackendUnavailable { .. }));
  }

  #[tokio::test]
  async fn unready_backend_refuses_writes_but_serves_existing_files() {
    let operator = memory();
    operator.write("documents/old.pdf", b"legacy".to_vec()).await.unwrap();

    let storage = Storage::new().with_backend(
      BackendTag::S3,
      operator.clone(),
      WriteReadiness::Unavailable("missing secret_access_key".into()),
    );

    let err = storage
      .write("documents", "new.pdf", BackendTag::S3, Bytes::from_static(b"x"))
      .await
      .unwrap_err();
    assert!(matches!(err, StorageError::BackendUnavailable { .. }));

    // Nothing was sent.
    let listed = operator.list("documents/").await.unwrap();
    assert_eq!(listed.iter().filter(|e| e.path().ends_with(".pdf")).count(), 1);

    let bytes = storage.read(BackendTag::S3, "documents/old.pdf").await.unwrap();
    assert_eq!(&bytes[..], b"legacy");
  }

  #[tokio::test]
  async fn local_backend_writes_under_the_configured_root() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::from_config(&StorageConfig {
      local: LocalConfig { root: dir.path().to_path_buf() },
      s3:    None,
    })
    .unwrap();

    let stored = storage
      .write("documents", "scan.png", BackendTag::Local, Bytes::from_static(b"\x89PNG"))
      .await
      .unwrap();
    assert!(dir.path().join(&stored.storage_path).exists());

    storage.delete(BackendTag::Local, &stored.storage_path).await.unwrap();
    assert!(!storage.exists(BackendTag::Local, &stored.storage_path).await);
  }

  #[tokio::test]
  async fn incomplete_s3_section_blocks_writes() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::from_config(&StorageConfig {
      local: LocalConfig { root: dir.path().to_path_buf() },
      s3:    Some(S3Config {
        bucket: "docs".into(),
        region: "us-east-1".into(),
        ..Default::default()
      }),
    })
    .unwrap();

    let err = storage
      .write("documents", "a.pdf", BackendTag::S3, Bytes::from_static(b"x"))
      .await
      .unwrap_err();
    assert!(matches!(err, StorageError::BackendUnavailable { backend: BackendTag::S3, .. }));
  }

  #[tokio::test]
  async fn failed_local_write_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    // A plain file where the prefix directory should be.
    std::fs::write(dir.path().join("documents"), b"").unwrap();
    let storage = Storage::from_config(&StorageConfig {
      local: LocalConfig { root: dir.path().to_path_buf() },
      s3:    None,
    })
    .unwrap();

    let err = storage
      .write("documents", "a.pdf", BackendTag::Local, Bytes::from_static(b"x"))
      .await
      .unwrap_err();
    assert!(matches!(err, StorageError::BackendUnavailable { backend: BackendTag::Local, .. }));
    assert!(dir.path().join("documents").is_file());
  }
}
