//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one use-case oriented contract per record kind.
//! - Isolate SQLite query details from callers.
//!
//! # Invariants
//! - Write paths validate input before any SQL runs.
//! - Every public write runs in exactly one transaction: resolve, check and
//!   mutate all see the same state, and any failure rolls back.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`,
//!   `InvalidReference`, `MalformedInput`) in addition to DB transport errors.

pub mod activity_repo;
pub mod cca_repo;
pub mod class_repo;
pub mod error;
pub mod store;
pub mod student_repo;
pub mod subject_repo;
