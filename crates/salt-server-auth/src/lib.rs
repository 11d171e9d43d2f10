// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles and proposal permissions for users of the Southern African Large
//! Telescope.
//!
//! This crate decides what a user may do; it does not authenticate anyone
//! beyond a username/password check. It provides:
//! - [`SaltUser`]: a resolved user with role predicates (administrator, Board
//!   member, TAC member/chair, investigator, PI, PC) and view/edit decisions
//!   for proposals and blocks
//! - [`PermissionStore`]: the lookups those decisions need, implemented by the
//!   database layer
//! - [`verify_credentials`] and [`hash_password`]: password handling
//!
//! # Usage
//!
//! ```ignore
//! let user = SaltUser::resolve_by_username("jdoe", store.clone()).await?;
//! if user.may_edit_block(block_id).await? {
//!     // ...
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod store;
pub mod types;
pub mod user;

#[cfg(test)]
mod testing;

pub use credentials::{hash_password, verify_credentials};
pub use error::{AccessError, BoxError, DataAccessError, MissingRecord, Result};
pub use store::{PermissionStore, StoreResult, StoredCredentials, VisibilityQuery};
pub use types::{BlockId, ContactRole, PartnerCode, ProposalCode, RoleSetting, UserId};
pub use user::{SaltUser, UserIdentity};
