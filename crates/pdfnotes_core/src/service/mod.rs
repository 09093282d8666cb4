//! Workflow services.
//!
//! # Responsibility
//! - Orchestrate backend calls into the ingestion and export use-cases.
//! - Resolve every failure into an outcome value plus a display message.

pub mod export_service;
pub mod ingestion_service;
