// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for SALT roles and proposal permissions.
//!
//! [`SqlitePermissionRepository`] implements
//! [`PermissionStore`](salt_server_auth::PermissionStore) over the PIPT tables.
//! The schema itself is owned by the proposal database; [`testing`] recreates
//! the subset these queries touch.

pub mod error;
pub mod permission;
pub mod pool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{DbError, Result};
pub use permission::SqlitePermissionRepository;
pub use pool::{create_pool, create_pool_from_config};
