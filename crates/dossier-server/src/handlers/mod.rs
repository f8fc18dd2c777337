//! Entry-point handlers. Retrieval lives in [`download`], ingestion in
//! [`upload`].

pub mod download;
pub mod upload;
