//! The background classification task.

use std::sync::Arc;

use dossier_core::{
  classification::ClassificationOutcome, store::DocumentStore,
};
use dossier_storage::Storage;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
  client::{Classifier, ClassifyRequest},
  reply,
};

/// Classifies uploaded documents and records the result.
///
/// Cheap to clone; every task holds its own handles to the shared store,
/// storage and classifier.
pub struct ClassificationPipeline<S, C> {
  store:      Arc<S>,
  storage:    Arc<Storage>,
  classifier: Arc<C>,
}

impl<S, C> Clone for ClassificationPipeline<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      storage:    Arc::clone(&self.storage),
      classifier: Arc::clone(&self.classifier),
    }
  }
}

impl<S, C> ClassificationPipeline<S, C>
where
  S: DocumentStore + 'static,
  C: Classifier + 'static,
{
  pub fn new(store: Arc<S>, storage: Arc<Storage>, classifier: Arc<C>) -> Self {
    Self { store, storage, classifier }
  }

  /// Run [`Self::run`] on the runtime without waiting for it. The handle is
  /// returned for callers that do want to wait, such as tests.
  pub fn spawn(&self, document_id: Uuid) -> JoinHandle<ClassificationOutcome> {
    let pipeline = self.clone();
    tokio::spawn(async move { pipeline.run(document_id).await })
  }

  /// Classify one document and persist the assignment.
  ///
  /// Never fails: every problem ends up in the returned outcome and the
  /// log. Transient failures leave any previous assignment in place.
  pub async fn run(&self, document_id: Uuid) -> ClassificationOutcome {
    let outcome = match self.classify(document_id).await {
      Ok(outcome) => outcome,
      Err(reason) => ClassificationOutcome::TransientFailure { reason },
    };

    let outcome = match outcome.assignment(document_id) {
      Some(assignment) => match self.store.record_classification(assignment).await {
        Ok(()) => outcome,
        Err(e) => ClassificationOutcome::TransientFailure {
          reason: format!("recording assignment failed: {e}"),
        },
      },
      None => outcome,
    };

    match &outcome {
      ClassificationOutcome::Resolved { position_id, label } => {
        tracing::info!(%document_id, %position_id, %label, "document classified");
      }
      ClassificationOutcome::Unresolved { label } => {
        tracing::info!(%document_id, label = ?label, "classification unresolved");
      }
      ClassificationOutcome::TransientFailure { reason } => {
        tracing::warn!(%document_id, %reason, "classification failed");
      }
    }
    outcome
  }

  /// Everything up to (not including) persisting the result. `Err` carries
  /// the reason for a transient failure.
  async fn classify(&self, document_id: Uuid) -> Result<ClassificationOutcome, String> {
    let positions = self
      .store
      .list_positions()
      .await
      .map_err(|e| format!("loading positions failed: {e}"))?;
    let labels: Vec<String> = positions.iter().map(|p| p.name.clone()).collect();

    let document = self
      .store
      .get_document(document_id, true)
      .await
      .map_err(|e| format!("loading document failed: {e}"))?
      .ok_or_else(|| format!("document {document_id} not found"))?;

    let path = &document.content.storage_path;
    let content = self
      .storage
      .read(document.content.backend, path)
      .await
      .map_err(|e| format!("reading content failed: {e}"))?;

    let request = ClassifyRequest {
      mime_type: self.storage.mime_type(path).to_owned(),
      content,
      labels,
    };
    let text = self
      .classifier
      .classify(request)
      .await
      .map_err(|e| e.to_string())?;

    let Some(label) = reply::top_label(&text) else {
      tracing::debug!(%document_id, reply = %text, "unparseable classifier reply");
      return Ok(ClassificationOutcome::Unresolved { label: None });
    };

    // Exact, case-sensitive match on the trimmed label.
    let position = self
      .store
      .find_position_by_name(&label)
      .await
      .map_err(|e| format!("matching position failed: {e}"))?;

    Ok(match position {
      Some(p) => ClassificationOutcome::Resolved { position_id: p.position_id, label },
      None => ClassificationOutcome::Unresolved { label: Some(label) },
    })
  }
}
