// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the Pulse server: pool setup, schema migrations and
//! the organization/project directory.

pub mod directory;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod testing;

pub use directory::DirectoryRepository;
pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::{check_connection, create_pool};
