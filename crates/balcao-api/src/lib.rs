// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP backend for the desk API.
//!
//! This crate turns the [`balcao_core::Backend`] trait into real HTTP
//! traffic against a desk server: bearer-token auth, JSON codecs for every
//! endpoint payload, multipart uploads, and retry of transient failures.
//!
//! ```no_run
//! use balcao_api::{ClientOptions, HttpBackend};
//! use balcao_core::Backend;
//!
//! # async fn run() -> Result<(), balcao_core::BalcaoError> {
//! let backend = HttpBackend::new(
//!     "https://desk.example.com/api/v1",
//!     Some("my-token"),
//!     &ClientOptions::default(),
//! )?;
//! let counts = backend.conversation_counts().await?;
//! println!("unassigned: {}", counts.unassigned);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod wire;

pub use client::{ClientOptions, HttpBackend};
