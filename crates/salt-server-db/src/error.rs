// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use salt_server_auth::DataAccessError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Internal: {0}")]
	Internal(String),
}

impl From<DbError> for DataAccessError {
	fn from(err: DbError) -> Self {
		DataAccessError::new(err)
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
