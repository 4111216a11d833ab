//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for resources outside the database, currently file storage.

pub mod storage;
