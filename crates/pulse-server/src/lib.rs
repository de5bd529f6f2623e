// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulse analytics ingestion server.
//!
//! This crate wires the ingestion pipeline into an HTTP server backed by a
//! SQLite database, and provides the administrative commands used to
//! register organizations and projects.

pub mod admin;
pub mod api;
pub mod routes;

pub use admin::AdminError;
pub use api::{create_app_state, create_router, AppState};
pub use pulse_server_config::ServerConfig;
