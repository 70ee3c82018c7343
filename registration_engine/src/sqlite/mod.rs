//! SQLite backend for the candidate store.
//!
//! Low-level query functions live in [`mod@candidates`] and accept a `&mut SqliteConnection`, so they can run
//! against a pooled connection or inside a transaction unchanged. [`SqliteCandidateStore`] owns the pool and
//! implements the [`crate::traits::CandidateStore`] contract on top of them.
pub mod candidates;
pub mod db;
mod store_impl;

pub use store_impl::SqliteCandidateStore;
