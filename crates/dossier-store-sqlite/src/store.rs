//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use dossier_core::{
  Error as CoreError,
  classification::ClassificationAssignment,
  comment::{DocumentComment, NewComment},
  document::{
    Document, DocumentPatch, DocumentQuery, DocumentVersion, NewDocument,
    NewVersion,
  },
  file_request::{FileRequestDocument, NewFileRequestDocument},
  grant::{Grantee, NewGrant, PermissionGrant},
  link::{NewShareLink, ShareableLink, generate_code},
  position::{NewPosition, Position},
  status::{DocumentStatus, NewStatus, StatusPatch},
  store::DocumentStore,
};

use crate::{
  encode::{
    COMMENT_COLUMNS, DOCUMENT_COLUMNS, FILE_REQUEST_COLUMNS, GrantTable,
    LINK_COLUMNS, POSITION_COLUMNS, RawAssignment, RawComment, RawDocument,
    RawFileRequest, RawGrant, RawLink, RawPosition, RawStatus, RawVersion,
    STATUS_COLUMNS, VERSION_COLUMNS, encode_dt, encode_size, encode_uuid,
    grant_columns,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dossier document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What a guarded write found once it looked at the database.
enum WriteOutcome<T> {
  Done(T),
  Missing,
  Duplicate,
  InUse,
  HasChildren,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Whether a document row exists, archived or not.
  async fn document_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM documents WHERE document_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn require_document(&self, id: Uuid) -> Result<()> {
    if self.document_exists(id).await? {
      Ok(())
    } else {
      Err(CoreError::DocumentNotFound(id).into())
    }
  }

  async fn require_status(&self, id: Uuid) -> Result<()> {
    if self.get_status(id).await?.is_some() {
      Ok(())
    } else {
      Err(CoreError::StatusNotFound(id).into())
    }
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Positions ─────────────────────────────────────────────────────────────

  async fn create_position(&self, input: NewPosition) -> Result<Position> {
    let position = Position {
      position_id: Uuid::new_v4(),
      name:        input.name,
      parent_id:   input.parent_id,
      created_at:  Utc::now(),
    };

    let id_str     = encode_uuid(position.position_id);
    let name       = position.name.clone();
    let parent_str = position.parent_id.map(encode_uuid);
    let at_str     = encode_dt(position.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(parent) = &parent_str {
          let parent_exists = tx
            .query_row(
              "SELECT 1 FROM positions WHERE position_id = ?1",
              rusqlite::params![parent],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !parent_exists {
            return Ok(WriteOutcome::Missing);
          }
        }

        // `IS` so that two roots with the same name also collide.
        let duplicate = tx
          .query_row(
            "SELECT 1 FROM positions WHERE name = ?1 AND parent_id IS ?2",
            rusqlite::params![name, parent_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if duplicate {
          return Ok(WriteOutcome::Duplicate);
        }

        tx.execute(
          "INSERT INTO positions (position_id, name, parent_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, parent_str, at_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(position),
      WriteOutcome::Duplicate => {
        Err(CoreError::DuplicatePosition(position.name).into())
      }
      _ => Err(
        CoreError::PositionNotFound(position.parent_id.unwrap_or_default())
          .into(),
      ),
    }
  }

  async fn get_position(&self, id: Uuid) -> Result<Option<Position>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPosition> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {POSITION_COLUMNS} FROM positions WHERE position_id = ?1"
              ),
              rusqlite::params![id_str],
              RawPosition::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPosition::into_position).transpose()
  }

  async fn list_positions(&self) -> Result<Vec<Position>> {
    let raws: Vec<RawPosition> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POSITION_COLUMNS} FROM positions ORDER BY name, created_at"
        ))?;
        let rows = stmt
          .query_map([], RawPosition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPosition::into_position).collect()
  }

  async fn list_child_positions(
    &self,
    parent: Option<Uuid>,
  ) -> Result<Vec<Position>> {
    let parent_str = parent.map(encode_uuid);

    let raws: Vec<RawPosition> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POSITION_COLUMNS} FROM positions
           WHERE parent_id IS ?1
           ORDER BY name, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![parent_str], RawPosition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPosition::into_position).collect()
  }

  async fn find_position_by_name(&self, name: &str) -> Result<Option<Position>> {
    let name = name.to_owned();

    let raw: Option<RawPosition> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {POSITION_COLUMNS} FROM positions
                 WHERE name = ?1
                 ORDER BY created_at
                 LIMIT 1"
              ),
              rusqlite::params![name],
              RawPosition::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPosition::into_position).transpose()
  }

  async fn delete_position(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM positions WHERE position_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(WriteOutcome::Missing);
        }

        let in_use: i64 = tx.query_row(
          "SELECT COUNT(*) FROM documents WHERE category_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if in_use > 0 {
          return Ok(WriteOutcome::InUse);
        }

        let children: i64 = tx.query_row(
          "SELECT COUNT(*) FROM positions WHERE parent_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if children > 0 {
          return Ok(WriteOutcome::HasChildren);
        }

        tx.execute(
          "UPDATE classification_assignments SET position_id = NULL
           WHERE position_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM positions WHERE position_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(()),
      WriteOutcome::InUse => Err(CoreError::PositionInUse(id).into()),
      WriteOutcome::HasChildren => Err(CoreError::PositionHasChildren(id).into()),
      _ => Err(CoreError::PositionNotFound(id).into()),
    }
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn create_document(&self, input: NewDocument) -> Result<Document> {
    let document = Document {
      document_id:     Uuid::new_v4(),
      name:            input.name,
      content:         input.content,
      category_id:     input.category_id,
      client_id:       input.client_id,
      status_id:       input.status_id,
      created_by:      input.created_by,
      created_at:      Utc::now(),
      soft_deleted_at: None,
    };

    if let Some(category) = document.category_id {
      if self.get_position(category).await?.is_none() {
        return Err(CoreError::PositionNotFound(category).into());
      }
    }
    if let Some(status) = document.status_id {
      self.require_status(status).await?;
    }

    let id_str       = encode_uuid(document.document_id);
    let name         = document.name.clone();
    let path         = document.content.storage_path.clone();
    let backend      = document.content.backend.to_string();
    let size         = encode_size(document.content.size_bytes);
    let hash         = document.content.content_hash.clone();
    let category_str = document.category_id.map(encode_uuid);
    let client_str   = document.client_id.map(encode_uuid);
    let status_str   = document.status_id.map(encode_uuid);
    let by_str       = encode_uuid(document.created_by);
    let at_str       = encode_dt(document.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (
             document_id, name, storage_path, backend, size_bytes,
             content_hash, category_id, client_id, status_id, created_by,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            name,
            path,
            backend,
            size,
            hash,
            category_str,
            client_str,
            status_str,
            by_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  async fn get_document(
    &self,
    id: Uuid,
    include_archived: bool,
  ) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents
                 WHERE document_id = ?1
                   AND (?2 = 1 OR soft_deleted_at IS NULL)"
              ),
              rusqlite::params![id_str, include_archived],
              RawDocument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
    let pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| format!("%{}%", escape_like(t)));
    let category_str     = query.category_id.map(encode_uuid);
    let include_archived = query.include_archived;
    // SQLite treats a negative LIMIT as "no limit".
    let limit  = query.limit.and_then(|l| i64::try_from(l).ok()).unwrap_or(-1);
    let offset = query.offset.and_then(|o| i64::try_from(o).ok()).unwrap_or(0);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents
           WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')
             AND (?2 IS NULL OR category_id = ?2)
             AND (?3 = 1 OR soft_deleted_at IS NULL)
           ORDER BY created_at DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              pattern,
              category_str,
              include_archived,
              limit,
              offset
            ],
            RawDocument::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn update_document(
    &self,
    id: Uuid,
    patch: DocumentPatch,
  ) -> Result<Document> {
    let Some(current) = self.get_document(id, true).await? else {
      return Err(CoreError::DocumentNotFound(id).into());
    };

    let name     = patch.name.unwrap_or_else(|| current.name.clone());
    let category = patch.category_id.or(current.category_id);
    let status   = patch.status_id.or(current.status_id);

    if let Some(category) = category {
      if category_changed(current.category_id, category)
        && self.get_position(category).await?.is_none()
      {
        return Err(CoreError::PositionNotFound(category).into());
      }
    }
    if let Some(status) = patch.status_id {
      if current.status_id != Some(status) {
        self.require_status(status).await?;
      }
    }

    let id_str       = encode_uuid(id);
    let name_sql     = name.clone();
    let category_str = category.map(encode_uuid);
    let status_str   = status.map(encode_uuid);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let duplicate = tx
          .query_row(
            "SELECT 1 FROM documents
             WHERE name = ?1
               AND category_id IS ?2
               AND document_id != ?3
               AND soft_deleted_at IS NULL",
            rusqlite::params![name_sql, category_str, id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if duplicate {
          return Ok(WriteOutcome::Duplicate);
        }

        tx.execute(
          "UPDATE documents SET name = ?1, category_id = ?2, status_id = ?3
           WHERE document_id = ?4",
          rusqlite::params![name_sql, category_str, status_str, id_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(Document {
        name,
        category_id: category,
        status_id: status,
        ..current
      }),
      _ => Err(CoreError::DuplicateDocument(name).into()),
    }
  }

  async fn archive_document(&self, id: Uuid) -> Result<Document> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE documents SET soft_deleted_at = COALESCE(soft_deleted_at, ?1)
           WHERE document_id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(CoreError::DocumentNotFound(id).into());
    }
    self
      .get_document(id, true)
      .await?
      .ok_or_else(|| CoreError::DocumentNotFound(id).into())
  }

  // ── Versions ──────────────────────────────────────────────────────────────

  async fn add_version(&self, input: NewVersion) -> Result<DocumentVersion> {
    self.require_document(input.document_id).await?;

    let version = DocumentVersion {
      version_id:      Uuid::new_v4(),
      document_id:     input.document_id,
      content:         input.content,
      created_by:      input.created_by,
      created_at:      Utc::now(),
      soft_deleted_at: None,
    };

    let id_str  = encode_uuid(version.version_id);
    let doc_str = encode_uuid(version.document_id);
    let path    = version.content.storage_path.clone();
    let backend = version.content.backend.to_string();
    let size    = encode_size(version.content.size_bytes);
    let hash    = version.content.content_hash.clone();
    let by_str  = encode_uuid(version.created_by);
    let at_str  = encode_dt(version.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO document_versions (
             version_id, document_id, storage_path, backend, size_bytes,
             content_hash, created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, doc_str, path, backend, size, hash, by_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(version)
  }

  async fn get_version(
    &self,
    id: Uuid,
    include_archived: bool,
  ) -> Result<Option<DocumentVersion>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {VERSION_COLUMNS} FROM document_versions
                 WHERE version_id = ?1
                   AND (?2 = 1 OR soft_deleted_at IS NULL)"
              ),
              rusqlite::params![id_str, include_archived],
              RawVersion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_version).transpose()
  }

  async fn list_versions(
    &self,
    document_id: Uuid,
    include_archived: bool,
  ) -> Result<Vec<DocumentVersion>> {
    let doc_str = encode_uuid(document_id);

    let raws: Vec<RawVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VERSION_COLUMNS} FROM document_versions
           WHERE document_id = ?1
             AND (?2 = 1 OR soft_deleted_at IS NULL)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![doc_str, include_archived],
            RawVersion::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVersion::into_version).collect()
  }

  async fn archive_version(&self, id: Uuid) -> Result<DocumentVersion> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE document_versions
           SET soft_deleted_at = COALESCE(soft_deleted_at, ?1)
           WHERE version_id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(CoreError::VersionNotFound(id).into());
    }
    self
      .get_version(id, true)
      .await?
      .ok_or_else(|| CoreError::VersionNotFound(id).into())
  }

  // ── Grants ────────────────────────────────────────────────────────────────

  async fn add_grant(&self, input: NewGrant) -> Result<PermissionGrant> {
    self.require_document(input.document_id).await?;

    let grant = PermissionGrant {
      grant_id:       Uuid::new_v4(),
      document_id:    input.document_id,
      grantee:        input.grantee,
      window:         input.window,
      allow_download: input.allow_download,
      created_at:     Utc::now(),
    };

    let (table, grantee_id) = GrantTable::of(&grant.grantee);
    let sql = format!(
      "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      table.table(),
      grant_columns(table.grantee_column()),
    );

    let id_str        = encode_uuid(grant.grant_id);
    let doc_str       = encode_uuid(grant.document_id);
    let grantee_str   = encode_uuid(grantee_id);
    let is_time_bound = grant.window.is_time_bound;
    let start_str     = grant.window.start_date.map(encode_dt);
    let end_str       = grant.window.end_date.map(encode_dt);
    let allow         = grant.allow_download;
    let at_str        = encode_dt(grant.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &sql,
          rusqlite::params![
            id_str,
            doc_str,
            grantee_str,
            is_time_bound,
            start_str,
            end_str,
            allow,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(grant)
  }

  async fn list_grants(&self, document_id: Uuid) -> Result<Vec<PermissionGrant>> {
    let doc_str = encode_uuid(document_id);

    let raws: Vec<RawGrant> = self
      .conn
      .call(move |conn| {
        let mut out = Vec::new();
        for table in [GrantTable::User, GrantTable::Role] {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE document_id = ?1 ORDER BY created_at",
            grant_columns(table.grantee_column()),
            table.table(),
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![doc_str], |row| {
              RawGrant::from_row(table, row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          out.extend(rows);
        }
        Ok(out)
      })
      .await?;

    raws.into_iter().map(RawGrant::into_grant).collect()
  }

  async fn grants_for_caller(
    &self,
    document_id: Uuid,
    user_id: Uuid,
    role_ids: &[Uuid],
  ) -> Result<Vec<PermissionGrant>> {
    let doc_str  = encode_uuid(document_id);
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawGrant> = self
      .conn
      .call(move |conn| {
        let mut out = Vec::new();

        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM document_user_permissions
           WHERE document_id = ?1 AND user_id = ?2",
          grant_columns("user_id"),
        ))?;
        out.extend(
          stmt
            .query_map(rusqlite::params![doc_str, user_str], |row| {
              RawGrant::from_row(GrantTable::User, row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        );

        // Role membership is filtered after decoding; a document rarely
        // carries more than a handful of role grants.
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM document_role_permissions WHERE document_id = ?1",
          grant_columns("role_id"),
        ))?;
        out.extend(
          stmt
            .query_map(rusqlite::params![doc_str], |row| {
              RawGrant::from_row(GrantTable::Role, row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        );
        Ok(out)
      })
      .await?;

    let grants = raws
      .into_iter()
      .map(RawGrant::into_grant)
      .collect::<Result<Vec<_>>>()?;

    Ok(
      grants
        .into_iter()
        .filter(|g| match g.grantee {
          Grantee::User(_) => true,
          Grantee::Role(role) => role_ids.contains(&role),
        })
        .collect(),
    )
  }

  // ── Share links ───────────────────────────────────────────────────────────

  async fn create_share_link(&self, input: NewShareLink) -> Result<ShareableLink> {
    self.require_document(input.document_id).await?;

    let link = ShareableLink {
      code:           generate_code(),
      document_id:    input.document_id,
      password_hash:  input.password_hash,
      allow_download: input.allow_download,
      expires_at:     input.expires_at,
      is_active:      true,
      created_by:     input.created_by,
      created_at:     Utc::now(),
    };

    let code        = link.code.clone();
    let doc_str     = encode_uuid(link.document_id);
    let hash        = link.password_hash.clone();
    let allow       = link.allow_download;
    let expires_str = link.expires_at.map(encode_dt);
    let by_str      = encode_uuid(link.created_by);
    let at_str      = encode_dt(link.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO shareable_links ({LINK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)"
          ),
          rusqlite::params![
            code, doc_str, hash, allow, expires_str, by_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  async fn get_share_link(&self, code: &str) -> Result<Option<ShareableLink>> {
    let code = code.to_owned();

    let raw: Option<RawLink> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {LINK_COLUMNS} FROM shareable_links WHERE code = ?1"),
              rusqlite::params![code],
              RawLink::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLink::into_link).transpose()
  }

  async fn deactivate_share_link(&self, code: &str) -> Result<bool> {
    let code = code.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shareable_links SET is_active = 0 WHERE code = ?1",
          rusqlite::params![code],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── File requests ─────────────────────────────────────────────────────────

  async fn add_file_request_document(
    &self,
    input: NewFileRequestDocument,
  ) -> Result<FileRequestDocument> {
    let doc = FileRequestDocument {
      file_request_document_id: Uuid::new_v4(),
      name:                     input.name,
      content:                  input.content,
      created_at:               Utc::now(),
    };

    let id_str  = encode_uuid(doc.file_request_document_id);
    let name    = doc.name.clone();
    let path    = doc.content.storage_path.clone();
    let backend = doc.content.backend.to_string();
    let size    = encode_size(doc.content.size_bytes);
    let hash    = doc.content.content_hash.clone();
    let at_str  = encode_dt(doc.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO file_request_documents ({FILE_REQUEST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          rusqlite::params![id_str, name, path, backend, size, hash, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(doc)
  }

  async fn get_file_request_document(
    &self,
    id: Uuid,
  ) -> Result<Option<FileRequestDocument>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFileRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {FILE_REQUEST_COLUMNS} FROM file_request_documents
                 WHERE file_request_document_id = ?1"
              ),
              rusqlite::params![id_str],
              RawFileRequest::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFileRequest::into_file_request).transpose()
  }

  // ── Classification ────────────────────────────────────────────────────────

  async fn record_classification(
    &self,
    assignment: ClassificationAssignment,
  ) -> Result<()> {
    self.require_document(assignment.document_id).await?;

    let doc_str      = encode_uuid(assignment.document_id);
    let position_str = assignment.position_id.map(encode_uuid);
    let label        = assignment.source_label;
    let at_str       = encode_dt(assignment.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(position) = &position_str {
          let exists = tx
            .query_row(
              "SELECT 1 FROM positions WHERE position_id = ?1",
              rusqlite::params![position],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(WriteOutcome::Missing);
          }
        }

        tx.execute(
          "INSERT INTO classification_assignments
             (document_id, position_id, source_label, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(document_id) DO UPDATE SET
             position_id  = excluded.position_id,
             source_label = excluded.source_label,
             created_at   = excluded.created_at",
          rusqlite::params![doc_str, position_str, label, at_str],
        )?;

        if let Some(position) = &position_str {
          tx.execute(
            "UPDATE documents SET category_id = ?1 WHERE document_id = ?2",
            rusqlite::params![position, doc_str],
          )?;
        }

        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(()),
      _ => Err(
        CoreError::PositionNotFound(assignment.position_id.unwrap_or_default())
          .into(),
      ),
    }
  }

  async fn get_classification(
    &self,
    document_id: Uuid,
  ) -> Result<Option<ClassificationAssignment>> {
    let doc_str = encode_uuid(document_id);

    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document_id, position_id, source_label, created_at
               FROM classification_assignments WHERE document_id = ?1",
              rusqlite::params![doc_str],
              |row| {
                Ok(RawAssignment {
                  document_id:  row.get(0)?,
                  position_id:  row.get(1)?,
                  source_label: row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssignment::into_assignment).transpose()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<DocumentComment> {
    self.require_document(input.document_id).await?;
    if let Some(status) = input.status_id {
      self.require_status(status).await?;
    }

    let comment = DocumentComment {
      comment_id:  Uuid::new_v4(),
      document_id: input.document_id,
      author_id:   input.author_id,
      body:        input.body,
      status_id:   input.status_id,
      created_at:  Utc::now(),
    };

    let id_str     = encode_uuid(comment.comment_id);
    let doc_str    = encode_uuid(comment.document_id);
    let author_str = encode_uuid(comment.author_id);
    let body       = comment.body.clone();
    let status_str = comment.status_id.map(encode_uuid);
    let at_str     = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO document_comments
             (comment_id, document_id, author_id, body, status_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, doc_str, author_str, body, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<DocumentComment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {COMMENT_COLUMNS} FROM document_comments WHERE comment_id = ?1"
              ),
              rusqlite::params![id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(&self, document_id: Uuid) -> Result<Vec<DocumentComment>> {
    self.require_document(document_id).await?;
    let doc_str = encode_uuid(document_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM document_comments
           WHERE document_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![doc_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn delete_comment(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM document_comments WHERE comment_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(CoreError::CommentNotFound(id).into());
    }
    Ok(())
  }

  // ── Statuses ──────────────────────────────────────────────────────────────

  async fn create_status(&self, input: NewStatus) -> Result<DocumentStatus> {
    let status = DocumentStatus {
      status_id:  Uuid::new_v4(),
      name:       input.name,
      color_code: input.color_code,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(status.status_id);
    let name   = status.name.clone();
    let color  = status.color_code.clone();
    let at_str = encode_dt(status.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let duplicate = tx
          .query_row(
            "SELECT 1 FROM document_statuses WHERE name = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if duplicate {
          return Ok(WriteOutcome::Duplicate);
        }

        tx.execute(
          "INSERT INTO document_statuses (status_id, name, color_code, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, color, at_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(status),
      _ => Err(CoreError::DuplicateStatus(status.name).into()),
    }
  }

  async fn get_status(&self, id: Uuid) -> Result<Option<DocumentStatus>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStatus> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {STATUS_COLUMNS} FROM document_statuses WHERE status_id = ?1"
              ),
              rusqlite::params![id_str],
              RawStatus::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStatus::into_status).transpose()
  }

  async fn list_statuses(&self) -> Result<Vec<DocumentStatus>> {
    let raws: Vec<RawStatus> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STATUS_COLUMNS} FROM document_statuses ORDER BY created_at, name"
        ))?;
        let rows = stmt
          .query_map([], RawStatus::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatus::into_status).collect()
  }

  async fn update_status(&self, id: Uuid, patch: StatusPatch) -> Result<DocumentStatus> {
    let Some(current) = self.get_status(id).await? else {
      return Err(CoreError::StatusNotFound(id).into());
    };

    let name  = patch.name.unwrap_or_else(|| current.name.clone());
    let color = patch.color_code.or_else(|| current.color_code.clone());

    let id_str    = encode_uuid(id);
    let name_sql  = name.clone();
    let color_sql = color.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let duplicate = tx
          .query_row(
            "SELECT 1 FROM document_statuses WHERE name = ?1 AND status_id != ?2",
            rusqlite::params![name_sql, id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if duplicate {
          return Ok(WriteOutcome::Duplicate);
        }

        tx.execute(
          "UPDATE document_statuses SET name = ?1, color_code = ?2 WHERE status_id = ?3",
          rusqlite::params![name_sql, color_sql, id_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(DocumentStatus { name, color_code: color, ..current }),
      _ => Err(CoreError::DuplicateStatus(name).into()),
    }
  }

  async fn delete_status(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM document_statuses WHERE status_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(WriteOutcome::Missing);
        }

        let in_use: i64 = tx.query_row(
          "SELECT COUNT(*) FROM documents WHERE status_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if in_use > 0 {
          return Ok(WriteOutcome::InUse);
        }

        tx.execute(
          "UPDATE document_comments SET status_id = NULL WHERE status_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM document_statuses WHERE status_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(WriteOutcome::Done(()))
      })
      .await?;

    match outcome {
      WriteOutcome::Done(()) => Ok(()),
      WriteOutcome::InUse => Err(CoreError::StatusInUse(id).into()),
      _ => Err(CoreError::StatusNotFound(id).into()),
    }
  }
}

fn category_changed(current: Option<Uuid>, next: Uuid) -> bool {
  current != Some(next)
}

/// Escape LIKE wildcards so search text matches literally. Pairs with
/// `ESCAPE '\'` in the query.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
impl SqliteStore {
  /// Row count of `classification_assignments` for one document.
  pub(crate) async fn classification_row_count(&self, document_id: Uuid) -> Result<i64> {
    let doc_str = encode_uuid(document_id);
    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM classification_assignments WHERE document_id = ?1",
          rusqlite::params![doc_str],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count)
  }
}
