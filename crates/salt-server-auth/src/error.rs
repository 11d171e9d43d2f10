// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for role and permission checks.

use std::fmt;

use thiserror::Error;

use crate::types::{BlockId, UserId};

/// Boxed error produced by a [`PermissionStore`](crate::PermissionStore) backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of the underlying data store (connectivity, malformed query, ...).
///
/// Propagated unchanged by permission checks; retrying is up to the caller.
#[derive(Debug, Error)]
#[error("data access failed: {source}")]
pub struct DataAccessError {
	#[source]
	source: BoxError,
}

impl DataAccessError {
	pub fn new(source: impl Into<BoxError>) -> Self {
		Self {
			source: source.into(),
		}
	}
}

/// The record a lookup failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingRecord {
	User(UserId),
	Username(String),
	Block(BlockId),
}

impl fmt::Display for MissingRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MissingRecord::User(id) => write!(f, "user with id {id}"),
			MissingRecord::Username(username) => write!(f, "user with username {username}"),
			MissingRecord::Block(id) => write!(f, "block with id {id}"),
		}
	}
}

/// Errors returned by user resolution, permission checks and credential
/// verification.
#[derive(Debug, Error)]
pub enum AccessError {
	#[error("not found: {0}")]
	NotFound(MissingRecord),

	/// Usernames are unique; several matches point at a data integrity problem.
	#[error("username {username} matches {matches} users")]
	AmbiguousIdentity { username: String, matches: usize },

	#[error("invalid username or password")]
	InvalidCredentials,

	#[error("password hashing failed: {0}")]
	PasswordHash(String),

	#[error(transparent)]
	DataAccess(#[from] DataAccessError),
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_not_found_messages() {
		let err = AccessError::NotFound(MissingRecord::User(UserId::new(999999999)));
		assert_eq!(err.to_string(), "not found: user with id 999999999");

		let err = AccessError::NotFound(MissingRecord::Block(BlockId::new(7)));
		assert_eq!(err.to_string(), "not found: block with id 7");
	}

	#[test]
	fn test_data_access_error_keeps_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err = AccessError::from(DataAccessError::new(io));
		assert!(err.to_string().contains("refused"));
		assert!(std::error::Error::source(&err).is_some());
	}
}
