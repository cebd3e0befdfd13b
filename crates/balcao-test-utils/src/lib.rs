// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Balcao integration tests.
//!
//! Provides a scripted backend double and fixture builders for fast,
//! deterministic, CI-runnable tests without a desk server.
//!
//! # Components
//!
//! - [`MockBackend`] - Scripted `Backend` with failure injection and a call log
//! - [`fixtures`] - Builders for domain values with sensible defaults

pub mod fixtures;
pub mod mock_backend;

pub use mock_backend::{BackendCall, CallKind, MockBackend};
