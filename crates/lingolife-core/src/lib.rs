//! lingolife-core — Data model, traits, and the review session engine.
//!
//! This crate defines the vocabulary data model, the store and dictionary
//! traits every backend implements, and the review logic that decides which
//! words a user sees today.

pub mod error;
pub mod kv;
pub mod model;
pub mod review;
pub mod review_log;
pub mod statistics;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use model::{PublicUser, User, UserId, Word, WordDraft};
