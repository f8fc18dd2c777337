//! Core types and trait definitions for the Dossier document store.
//!
//! This crate is deliberately free of HTTP, storage and database
//! dependencies. It owns the domain records, the [`store::DocumentStore`]
//! contract, the permission evaluator and the identifier resolver. Every
//! other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod classification;
pub mod comment;
pub mod document;
pub mod error;
pub mod file_request;
pub mod grant;
pub mod link;
pub mod position;
pub mod resolve;
pub mod status;
pub mod store;

pub use error::{DomainError, Error, Result};
