//! Common test utilities for statemap.
//!
//! This module provides shared fixtures and helpers for the integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod tile_sources;
