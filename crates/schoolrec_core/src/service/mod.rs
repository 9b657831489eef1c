//! Use-case services layered over the repositories.
//!
//! # Responsibility
//! - Orchestrate repository calls into multi-record workflows.
//! - Keep presentation layers decoupled from storage details.

pub mod import_service;
