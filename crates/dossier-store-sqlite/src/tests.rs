//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use dossier_core::{
  Error as CoreError,
  access::{AccessBasis, Caller},
  classification::ClassificationAssignment,
  comment::NewComment,
  document::{BackendTag, DocumentPatch, DocumentQuery, NewDocument, NewVersion, StoredContent},
  file_request::NewFileRequestDocument,
  grant::{GrantWindow, Grantee, NewGrant},
  link::{NewShareLink, hash_password},
  position::NewPosition,
  resolve::{Authorization, Locator, ResolveError, authorize, resolve},
  status::{NewStatus, StatusPatch},
  store::DocumentStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn content(ext: &str) -> StoredContent {
  StoredContent {
    storage_path: format!("documents/{}.{ext}", Uuid::new_v4()),
    backend:      BackendTag::Local,
    size_bytes:   11,
    content_hash: "ab".repeat(32),
  }
}

fn new_document(name: &str, owner: Uuid) -> NewDocument {
  NewDocument {
    name:        name.into(),
    content:     content("pdf"),
    category_id: None,
    client_id:   None,
    status_id:   None,
    created_by:  owner,
  }
}

fn core_err(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

// ─── Positions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_positions() {
  let s = store().await;
  let root = s
    .create_position(NewPosition { name: "Finance".into(), parent_id: None })
    .await
    .unwrap();
  let child = s
    .create_position(NewPosition { name: "Payroll".into(), parent_id: Some(root.position_id) })
    .await
    .unwrap();

  assert_eq!(s.list_positions().await.unwrap().len(), 2);

  let roots = s.list_child_positions(None).await.unwrap();
  assert_eq!(roots.len(), 1);
  assert_eq!(roots[0].position_id, root.position_id);

  let children = s.list_child_positions(Some(root.position_id)).await.unwrap();
  assert_eq!(children.len(), 1);
  assert_eq!(children[0].position_id, child.position_id);
}

#[tokio::test]
async fn duplicate_sibling_names_are_rejected() {
  let s = store().await;
  s.create_position(NewPosition { name: "Legal".into(), parent_id: None })
    .await
    .unwrap();

  let err = s
    .create_position(NewPosition { name: "Legal".into(), parent_id: None })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicatePosition(n) if n == "Legal"));
}

#[tokio::test]
async fn same_name_under_different_parents_is_allowed() {
  let s = store().await;
  let a = s.create_position(NewPosition { name: "A".into(), parent_id: None }).await.unwrap();
  let b = s.create_position(NewPosition { name: "B".into(), parent_id: None }).await.unwrap();

  s.create_position(NewPosition { name: "Ops".into(), parent_id: Some(a.position_id) })
    .await
    .unwrap();
  s.create_position(NewPosition { name: "Ops".into(), parent_id: Some(b.position_id) })
    .await
    .unwrap();
}

#[tokio::test]
async fn position_with_missing_parent_is_rejected() {
  let s = store().await;
  let err = s
    .create_position(NewPosition { name: "Orphan".into(), parent_id: Some(Uuid::new_v4()) })
    .await
    .unwrap_err();
  assert!(core_err(err).is_not_found());
}

#[tokio::test]
async fn find_position_by_name_is_exact() {
  let s = store().await;
  let hr = s
    .create_position(NewPosition { name: "Human Resources".into(), parent_id: None })
    .await
    .unwrap();

  let found = s.find_position_by_name("Human Resources").await.unwrap();
  assert_eq!(found.map(|p| p.position_id), Some(hr.position_id));
  assert!(s.find_position_by_name("human resources").await.unwrap().is_none());
  assert!(s.find_position_by_name("Human").await.unwrap().is_none());
}

#[tokio::test]
async fn position_in_use_cannot_be_deleted() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let pos = s.create_position(NewPosition { name: "Tax".into(), parent_id: None }).await.unwrap();

  let mut input = new_document("Return", owner);
  input.category_id = Some(pos.position_id);
  let doc = s.create_document(input).await.unwrap();

  let err = s.delete_position(pos.position_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::PositionInUse(_)));

  // Archived documents still pin the category.
  s.archive_document(doc.document_id).await.unwrap();
  let err = s.delete_position(pos.position_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::PositionInUse(_)));
}

#[tokio::test]
async fn position_with_children_cannot_be_deleted() {
  let s = store().await;
  let root = s.create_position(NewPosition { name: "Root".into(), parent_id: None }).await.unwrap();
  let leaf = s
    .create_position(NewPosition { name: "Leaf".into(), parent_id: Some(root.position_id) })
    .await
    .unwrap();

  let err = s.delete_position(root.position_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::PositionHasChildren(_)));

  s.delete_position(leaf.position_id).await.unwrap();
  s.delete_position(root.position_id).await.unwrap();
  assert!(s.get_position(root.position_id).await.unwrap().is_none());
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_document() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let doc = s.create_document(new_document("Contract", owner)).await.unwrap();

  let fetched = s.get_document(doc.document_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Contract");
  assert_eq!(fetched.created_by, owner);
  assert_eq!(fetched.content, doc.content);
  assert!(!fetched.is_archived());
}

#[tokio::test]
async fn create_document_with_unknown_category_fails() {
  let s = store().await;
  let mut input = new_document("Stray", Uuid::new_v4());
  input.category_id = Some(Uuid::new_v4());
  let err = s.create_document(input).await.unwrap_err();
  assert!(core_err(err).is_not_found());
}

#[tokio::test]
async fn archived_document_is_hidden_from_listing_but_reachable_by_id() {
  let s = store().await;
  let doc = s.create_document(new_document("Old memo", Uuid::new_v4())).await.unwrap();
  s.create_document(new_document("New memo", Uuid::new_v4())).await.unwrap();

  let archived = s.archive_document(doc.document_id).await.unwrap();
  assert!(archived.is_archived());

  let listed = s.list_documents(&DocumentQuery::default()).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].name, "New memo");

  let all = s
    .list_documents(&DocumentQuery { include_archived: true, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  assert!(s.get_document(doc.document_id, false).await.unwrap().is_none());
  assert!(s.get_document(doc.document_id, true).await.unwrap().is_some());

  let target = resolve(&s, Locator::Document(doc.document_id), Utc::now()).await.unwrap();
  assert_eq!(target.storage_path(), doc.content.storage_path);
}

#[tokio::test]
async fn archiving_twice_keeps_the_first_timestamp() {
  let s = store().await;
  let doc = s.create_document(new_document("Memo", Uuid::new_v4())).await.unwrap();

  let first = s.archive_document(doc.document_id).await.unwrap();
  let second = s.archive_document(doc.document_id).await.unwrap();
  assert_eq!(first.soft_deleted_at, second.soft_deleted_at);
}

#[tokio::test]
async fn archiving_a_missing_document_fails() {
  let s = store().await;
  let err = s.archive_document(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::DocumentNotFound(_)));
}

#[tokio::test]
async fn list_documents_filters_by_name_and_category() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let pos = s.create_position(NewPosition { name: "Sales".into(), parent_id: None }).await.unwrap();

  let mut q1 = new_document("Quarterly report", owner);
  q1.category_id = Some(pos.position_id);
  s.create_document(q1).await.unwrap();
  s.create_document(new_document("Annual report", owner)).await.unwrap();
  s.create_document(new_document("Invoice", owner)).await.unwrap();

  let reports = s
    .list_documents(&DocumentQuery { text: Some("report".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(reports.len(), 2);

  let sales = s
    .list_documents(&DocumentQuery { category_id: Some(pos.position_id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(sales.len(), 1);
  assert_eq!(sales[0].name, "Quarterly report");

  let page = s
    .list_documents(&DocumentQuery { limit: Some(2), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn search_text_wildcards_match_literally() {
  let s = store().await;
  let owner = Uuid::new_v4();
  s.create_document(new_document("500 report", owner)).await.unwrap();
  s.create_document(new_document("50% report", owner)).await.unwrap();
  s.create_document(new_document("tax_2024", owner)).await.unwrap();
  s.create_document(new_document("tax-2024", owner)).await.unwrap();

  let percent = s
    .list_documents(&DocumentQuery { text: Some("50%".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(percent.len(), 1);
  assert_eq!(percent[0].name, "50% report");

  let underscore = s
    .list_documents(&DocumentQuery { text: Some("tax_".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(underscore.len(), 1);
  assert_eq!(underscore[0].name, "tax_2024");
}

#[tokio::test]
async fn update_document_changes_metadata_only() {
  let s = store().await;
  let doc = s.create_document(new_document("Draft", Uuid::new_v4())).await.unwrap();

  let updated = s
    .update_document(
      doc.document_id,
      DocumentPatch { name: Some("Final".into()), ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(updated.name, "Final");
  assert_eq!(updated.content, doc.content);

  let fetched = s.get_document(doc.document_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Final");
  assert_eq!(fetched.content.storage_path, doc.content.storage_path);
}

#[tokio::test]
async fn update_document_rejects_duplicate_name_in_category() {
  let s = store().await;
  let owner = Uuid::new_v4();
  s.create_document(new_document("Agenda", owner)).await.unwrap();
  let other = s.create_document(new_document("Minutes", owner)).await.unwrap();

  let err = s
    .update_document(
      other.document_id,
      DocumentPatch { name: Some("Agenda".into()), ..Default::default() },
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicateDocument(n) if n == "Agenda"));
}

// ─── Versions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn versions_are_listed_and_archived() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let doc = s.create_document(new_document("Plan", owner)).await.unwrap();

  let v1 = s
    .add_version(NewVersion { document_id: doc.document_id, content: content("pdf"), created_by: owner })
    .await
    .unwrap();
  s.add_version(NewVersion { document_id: doc.document_id, content: content("pdf"), created_by: owner })
    .await
    .unwrap();

  assert_eq!(s.list_versions(doc.document_id, false).await.unwrap().len(), 2);

  s.archive_version(v1.version_id).await.unwrap();
  assert_eq!(s.list_versions(doc.document_id, false).await.unwrap().len(), 1);
  assert_eq!(s.list_versions(doc.document_id, true).await.unwrap().len(), 2);

  let target = resolve(&s, Locator::Version(v1.version_id), Utc::now()).await.unwrap();
  assert!(target.is_version());
  assert_eq!(target.display_filename(), "Plan.pdf");
  assert_eq!(target.document_id(), Some(doc.document_id));
}

#[tokio::test]
async fn version_of_missing_document_is_rejected() {
  let s = store().await;
  let err = s
    .add_version(NewVersion {
      document_id: Uuid::new_v4(),
      content:     content("txt"),
      created_by:  Uuid::new_v4(),
    })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DocumentNotFound(_)));
}

// ─── Grants & authorisation ──────────────────────────────────────────────────

#[tokio::test]
async fn grants_for_caller_filters_by_user_and_role() {
  let s = store().await;
  let doc = s.create_document(new_document("Budget", Uuid::new_v4())).await.unwrap();
  let user = Uuid::new_v4();
  let role = Uuid::new_v4();

  for grantee in [Grantee::User(user), Grantee::User(Uuid::new_v4()), Grantee::Role(role), Grantee::Role(Uuid::new_v4())] {
    s.add_grant(NewGrant {
      document_id:    doc.document_id,
      grantee,
      window:         GrantWindow::unbounded(),
      allow_download: false,
    })
    .await
    .unwrap();
  }

  assert_eq!(s.list_grants(doc.document_id).await.unwrap().len(), 4);

  let mine = s.grants_for_caller(doc.document_id, user, &[role]).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().any(|g| g.grantee == Grantee::User(user)));
  assert!(mine.iter().any(|g| g.grantee == Grantee::Role(role)));
}

#[tokio::test]
async fn time_bound_window_round_trips() {
  let s = store().await;
  let doc = s.create_document(new_document("Lease", Uuid::new_v4())).await.unwrap();
  let start = Utc::now() - Duration::days(1);
  let end = Utc::now() + Duration::days(1);

  let grant = s
    .add_grant(NewGrant {
      document_id:    doc.document_id,
      grantee:        Grantee::User(Uuid::new_v4()),
      window:         GrantWindow::between(start, end),
      allow_download: true,
    })
    .await
    .unwrap();

  let stored = s.list_grants(doc.document_id).await.unwrap();
  assert_eq!(stored, vec![grant]);
}

#[tokio::test]
async fn authorize_applies_grants_from_the_store() {
  let s = store().await;
  let doc = s.create_document(new_document("Report", Uuid::new_v4())).await.unwrap();
  let user = Uuid::new_v4();
  let now = Utc::now();

  s.add_grant(NewGrant {
    document_id:    doc.document_id,
    grantee:        Grantee::User(user),
    window:         GrantWindow::between(now - Duration::days(1), now + Duration::days(1)),
    allow_download: false,
  })
  .await
  .unwrap();

  let target = resolve(&s, Locator::Document(doc.document_id), now).await.unwrap();

  let Authorization::Decided(decision) =
    authorize(&s, &target, Some(&Caller::new(user)), now).await.unwrap()
  else {
    panic!("expected a decision");
  };
  assert!(decision.can_view);
  assert!(!decision.can_download);
  assert_eq!(decision.basis, AccessBasis::Grants);

  let Authorization::Decided(stranger) =
    authorize(&s, &target, Some(&Caller::new(Uuid::new_v4())), now).await.unwrap()
  else {
    panic!("expected a decision");
  };
  assert!(!stranger.can_view);

  assert_eq!(
    authorize(&s, &target, None, now).await.unwrap(),
    Authorization::IdentityRequired
  );
}

// ─── Share links ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn share_code_resolution_checks_liveness_and_password() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let doc = s.create_document(new_document("Brochure", owner)).await.unwrap();
  let now = Utc::now();

  let link = s
    .create_share_link(NewShareLink {
      document_id:    doc.document_id,
      password_hash:  Some(hash_password("s3cret").unwrap()),
      allow_download: false,
      expires_at:     None,
      created_by:     owner,
    })
    .await
    .unwrap();
  assert_eq!(link.code.len(), 32);

  let unknown = resolve(
    &s,
    Locator::ShareCode { code: "0".repeat(32), password: None },
    now,
  )
  .await
  .unwrap_err();
  assert!(matches!(unknown, ResolveError::LinkExpired));

  let wrong = resolve(
    &s,
    Locator::ShareCode { code: link.code.clone(), password: Some("guess".into()) },
    now,
  )
  .await
  .unwrap_err();
  assert!(matches!(wrong, ResolveError::PasswordIncorrect));

  let target = resolve(
    &s,
    Locator::ShareCode { code: link.code.clone(), password: Some("s3cret".into()) },
    now,
  )
  .await
  .unwrap();
  assert_eq!(target.document_id(), Some(doc.document_id));

  let Authorization::Decided(decision) = authorize(&s, &target, None, now).await.unwrap() else {
    panic!("expected a decision");
  };
  assert!(decision.can_view);
  assert!(!decision.can_download);
  assert_eq!(decision.basis, AccessBasis::Link);

  assert!(s.deactivate_share_link(&link.code).await.unwrap());
  let gone = resolve(
    &s,
    Locator::ShareCode { code: link.code.clone(), password: Some("s3cret".into()) },
    now,
  )
  .await
  .unwrap_err();
  assert!(matches!(gone, ResolveError::LinkExpired));
}

#[tokio::test]
async fn expired_share_link_does_not_resolve() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let doc = s.create_document(new_document("Flyer", owner)).await.unwrap();
  let link = s
    .create_share_link(NewShareLink {
      document_id:    doc.document_id,
      password_hash:  None,
      allow_download: true,
      expires_at:     Some(Utc::now() - Duration::hours(1)),
      created_by:     owner,
    })
    .await
    .unwrap();

  let err = resolve(&s, Locator::ShareCode { code: link.code, password: None }, Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(err, ResolveError::LinkExpired));
}

#[tokio::test]
async fn deactivating_an_unknown_code_reports_false() {
  let s = store().await;
  assert!(!s.deactivate_share_link("feedface").await.unwrap());
}

// ─── File requests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn file_request_documents_are_open_by_id() {
  let s = store().await;
  let file = s
    .add_file_request_document(NewFileRequestDocument {
      name:    "Signed form".into(),
      content: content("pdf"),
    })
    .await
    .unwrap();

  let now = Utc::now();
  let target = resolve(&s, Locator::FileRequest(file.file_request_document_id), now)
    .await
    .unwrap();
  assert_eq!(target.backend(), BackendTag::Local);
  assert_eq!(target.display_filename(), "Signed form.pdf");

  let Authorization::Decided(decision) = authorize(&s, &target, None, now).await.unwrap() else {
    panic!("expected a decision");
  };
  assert!(decision.can_download);

  let missing = resolve(&s, Locator::FileRequest(Uuid::new_v4()), now).await.unwrap_err();
  assert!(matches!(missing, ResolveError::NotFound));
}

// ─── Classification ──────────────────────────────────────────────────────────

#[tokio::test]
async fn resolved_classification_sets_the_category() {
  let s = store().await;
  let pos = s.create_position(NewPosition { name: "Audit".into(), parent_id: None }).await.unwrap();
  let doc = s.create_document(new_document("Ledger", Uuid::new_v4())).await.unwrap();

  s.record_classification(ClassificationAssignment {
    document_id:  doc.document_id,
    position_id:  Some(pos.position_id),
    source_label: Some("Audit".into()),
    created_at:   Utc::now(),
  })
  .await
  .unwrap();

  let fetched = s.get_document(doc.document_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.category_id, Some(pos.position_id));

  let assignment = s.get_classification(doc.document_id).await.unwrap().unwrap();
  assert_eq!(assignment.position_id, Some(pos.position_id));
}

#[tokio::test]
async fn unresolved_classification_replaces_the_row_without_touching_category() {
  let s = store().await;
  let pos = s.create_position(NewPosition { name: "Audit".into(), parent_id: None }).await.unwrap();
  let doc = s.create_document(new_document("Ledger", Uuid::new_v4())).await.unwrap();

  s.record_classification(ClassificationAssignment {
    document_id:  doc.document_id,
    position_id:  Some(pos.position_id),
    source_label: Some("Audit".into()),
    created_at:   Utc::now(),
  })
  .await
  .unwrap();
  s.record_classification(ClassificationAssignment {
    document_id:  doc.document_id,
    position_id:  None,
    source_label: Some("Marketing".into()),
    created_at:   Utc::now(),
  })
  .await
  .unwrap();

  let assignment = s.get_classification(doc.document_id).await.unwrap().unwrap();
  assert_eq!(assignment.position_id, None);
  assert_eq!(assignment.source_label.as_deref(), Some("Marketing"));

  let fetched = s.get_document(doc.document_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.category_id, Some(pos.position_id));
}

#[tokio::test]
async fn classification_for_missing_document_fails() {
  let s = store().await;
  let err = s
    .record_classification(ClassificationAssignment {
      document_id:  Uuid::new_v4(),
      position_id:  None,
      source_label: None,
      created_at:   Utc::now(),
    })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DocumentNotFound(_)));
}

#[tokio::test]
async fn concurrent_classifications_leave_one_row() {
  let s = store().await;
  let audit = s.create_position(NewPosition { name: "Audit".into(), parent_id: None }).await.unwrap();
  let legal = s.create_position(NewPosition { name: "Legal".into(), parent_id: None }).await.unwrap();
  let doc = s.create_document(new_document("Ledger", Uuid::new_v4())).await.unwrap();

  let assign = |position: &dossier_core::position::Position| ClassificationAssignment {
    document_id:  doc.document_id,
    position_id:  Some(position.position_id),
    source_label: Some(position.name.clone()),
    created_at:   Utc::now(),
  };
  let (first, second) = tokio::join!(
    s.record_classification(assign(&audit)),
    s.record_classification(assign(&legal)),
  );
  first.unwrap();
  second.unwrap();

  assert_eq!(s.classification_row_count(doc.document_id).await.unwrap(), 1);

  let row = s.get_classification(doc.document_id).await.unwrap().unwrap();
  let winner = [&audit, &legal]
    .into_iter()
    .find(|p| row.position_id == Some(p.position_id))
    .expect("row matches one of the inputs");
  assert_eq!(row.source_label.as_deref(), Some(winner.name.as_str()));

  let fetched = s.get_document(doc.document_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.category_id, Some(winner.position_id));
}

// ─── Statuses ────────────────────────────────────────────────────────────────

fn new_status(name: &str) -> NewStatus {
  NewStatus { name: name.into(), color_code: Some("#2e7d32".into()) }
}

#[tokio::test]
async fn statuses_are_created_listed_and_renamed() {
  let s = store().await;
  let draft = s.create_status(new_status("Draft")).await.unwrap();
  let approved = s.create_status(new_status("Approved")).await.unwrap();

  let listed = s.list_statuses().await.unwrap();
  assert_eq!(
    listed.iter().map(|st| st.status_id).collect::<Vec<_>>(),
    vec![draft.status_id, approved.status_id]
  );

  let renamed = s
    .update_status(draft.status_id, StatusPatch { name: Some("In review".into()), color_code: None })
    .await
    .unwrap();
  assert_eq!(renamed.name, "In review");
  assert_eq!(renamed.color_code.as_deref(), Some("#2e7d32"));
  assert_eq!(s.get_status(draft.status_id).await.unwrap().unwrap().name, "In review");
}

#[tokio::test]
async fn duplicate_status_names_are_rejected() {
  let s = store().await;
  s.create_status(new_status("Draft")).await.unwrap();
  let other = s.create_status(new_status("Final")).await.unwrap();

  let err = s.create_status(new_status("Draft")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicateStatus(_)));

  let err = s
    .update_status(other.status_id, StatusPatch { name: Some("Draft".into()), color_code: None })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DuplicateStatus(_)));
}

#[tokio::test]
async fn update_document_validates_the_status() {
  let s = store().await;
  let doc = s.create_document(new_document("Contract", Uuid::new_v4())).await.unwrap();

  let unknown = Uuid::new_v4();
  let err = s
    .update_document(doc.document_id, DocumentPatch { status_id: Some(unknown), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::StatusNotFound(id) if id == unknown));

  let draft = s.create_status(new_status("Draft")).await.unwrap();
  let updated = s
    .update_document(
      doc.document_id,
      DocumentPatch { status_id: Some(draft.status_id), ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(updated.status_id, Some(draft.status_id));
}

#[tokio::test]
async fn create_document_with_unknown_status_fails() {
  let s = store().await;
  let mut input = new_document("Contract", Uuid::new_v4());
  input.status_id = Some(Uuid::new_v4());
  let err = s.create_document(input).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::StatusNotFound(_)));
}

#[tokio::test]
async fn status_in_use_cannot_be_deleted() {
  let s = store().await;
  let draft = s.create_status(new_status("Draft")).await.unwrap();
  let mut input = new_document("Contract", Uuid::new_v4());
  input.status_id = Some(draft.status_id);
  s.create_document(input).await.unwrap();

  let err = s.delete_status(draft.status_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::StatusInUse(_)));

  let spare = s.create_status(new_status("Spare")).await.unwrap();
  s.delete_status(spare.status_id).await.unwrap();
  assert!(s.get_status(spare.status_id).await.unwrap().is_none());

  let err = s.delete_status(spare.status_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::StatusNotFound(_)));
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_are_listed_newest_first_and_deleted() {
  let s = store().await;
  let author = Uuid::new_v4();
  let doc = s.create_document(new_document("Contract", author)).await.unwrap();

  let first = s
    .add_comment(NewComment {
      document_id: doc.document_id,
      author_id:   author,
      body:        "first pass".into(),
      status_id:   None,
    })
    .await
    .unwrap();
  let second = s
    .add_comment(NewComment {
      document_id: doc.document_id,
      author_id:   author,
      body:        "second pass".into(),
      status_id:   None,
    })
    .await
    .unwrap();

  let listed = s.list_comments(doc.document_id).await.unwrap();
  assert_eq!(
    listed.iter().map(|c| c.comment_id).collect::<Vec<_>>(),
    vec![second.comment_id, first.comment_id]
  );

  s.delete_comment(first.comment_id).await.unwrap();
  assert!(s.get_comment(first.comment_id).await.unwrap().is_none());
  assert_eq!(s.list_comments(doc.document_id).await.unwrap().len(), 1);

  let err = s.delete_comment(first.comment_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::CommentNotFound(_)));
}

#[tokio::test]
async fn comment_requires_document_and_known_status() {
  let s = store().await;
  let err = s
    .add_comment(NewComment {
      document_id: Uuid::new_v4(),
      author_id:   Uuid::new_v4(),
      body:        "orphan".into(),
      status_id:   None,
    })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::DocumentNotFound(_)));

  let doc = s.create_document(new_document("Contract", Uuid::new_v4())).await.unwrap();
  let err = s
    .add_comment(NewComment {
      document_id: doc.document_id,
      author_id:   Uuid::new_v4(),
      body:        "tagged".into(),
      status_id:   Some(Uuid::new_v4()),
    })
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::StatusNotFound(_)));
}

#[tokio::test]
async fn deleting_a_status_clears_it_from_comments() {
  let s = store().await;
  let doc = s.create_document(new_document("Contract", Uuid::new_v4())).await.unwrap();
  let review = s.create_status(new_status("Review")).await.unwrap();
  let comment = s
    .add_comment(NewComment {
      document_id: doc.document_id,
      author_id:   Uuid::new_v4(),
      body:        "needs review".into(),
      status_id:   Some(review.status_id),
    })
    .await
    .unwrap();

  s.delete_status(review.status_id).await.unwrap();
  let fetched = s.get_comment(comment.comment_id).await.unwrap().unwrap();
  assert_eq!(fetched.status_id, None);
}
