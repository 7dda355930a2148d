//! Core business logic for Murmur.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and orchestration live here.
//!
//! # Modules
//!
//! - `post` - Post mutation engine: atomic post + attachment persistence
//! - `reaction` - Idempotent reaction toggling
//! - `storage` - Blob store adapter for attachment payloads

pub mod post;
pub mod reaction;
pub mod storage;
