// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Username and password verification.
//!
//! Passwords are stored as Argon2id PHC strings in the PIPT user table. An
//! unknown username and a wrong password produce the same
//! [`AccessError::InvalidCredentials`] so callers cannot probe for usernames.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{instrument, warn};

use crate::error::{AccessError, Result};
use crate::store::PermissionStore;
use crate::types::UserId;

/// Argon2id with the crate defaults in production and 1 MiB, one pass in unit
/// tests. Verification reads the parameters from the stored hash.
fn hasher() -> Argon2<'static> {
	#[cfg(test)]
	{
		use argon2::{Algorithm, Params, Version};

		let params = Params::new(1024, 1, 1, None).expect("test Argon2 params");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

/// Hash a password for storage.
///
/// # Errors
/// Returns `AccessError::PasswordHash` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
	let salt = SaltString::generate(&mut OsRng);
	hasher()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| AccessError::PasswordHash(e.to_string()))
}

/// Verify that a username-password combination is valid.
///
/// # Returns
/// The id of the user the credentials belong to.
///
/// # Errors
/// - `AccessError::InvalidCredentials` if the username is unknown, the
///   password is wrong or the stored hash is unreadable.
/// - `AccessError::AmbiguousIdentity` if several users share the username.
/// - `AccessError::DataAccess` if the store query fails.
#[instrument(skip(password, store))]
pub async fn verify_credentials(
	username: &str,
	password: &str,
	store: &dyn PermissionStore,
) -> Result<UserId> {
	let mut candidates = store.find_credentials(username).await?;
	if candidates.len() > 1 {
		warn!(matches = candidates.len(), "username is not unique");
		return Err(AccessError::AmbiguousIdentity {
			username: username.to_string(),
			matches: candidates.len(),
		});
	}
	let Some(credentials) = candidates.pop() else {
		warn!("credential check for unknown username");
		return Err(AccessError::InvalidCredentials);
	};

	let parsed = PasswordHash::new(&credentials.password_hash).map_err(|e| {
		warn!(user_id = %credentials.user_id, error = %e, "stored password hash is malformed");
		AccessError::InvalidCredentials
	})?;

	hasher()
		.verify_password(password.as_bytes(), &parsed)
		.map_err(|_| {
			warn!(user_id = %credentials.user_id, "password mismatch");
			AccessError::InvalidCredentials
		})?;

	Ok(credentials.user_id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeStore;
	use proptest::prelude::*;

	fn store_with_password(password: &str) -> FakeStore {
		let store = FakeStore::new();
		store.add_user(1, "jdoe", "Jane", "Doe", "jdoe@example.org");
		store.set_password_hash(1, &hash_password(password).unwrap());
		store
	}

	#[test]
	fn test_hash_is_phc_string() {
		let hash = hash_password("secret").unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(!hash.contains("secret"));
	}

	#[test]
	fn test_hashes_are_salted() {
		assert_ne!(hash_password("secret").unwrap(), hash_password("secret").unwrap());
	}

	#[tokio::test]
	async fn test_valid_credentials_return_user_id() {
		let store = store_with_password("correct horse");
		let user_id = verify_credentials("jdoe", "correct horse", &store)
			.await
			.unwrap();
		assert_eq!(user_id, UserId::new(1));
	}

	#[tokio::test]
	async fn test_wrong_password_is_rejected() {
		let store = store_with_password("correct horse");
		let err = verify_credentials("jdoe", "battery staple", &store)
			.await
			.unwrap_err();
		assert!(matches!(err, AccessError::InvalidCredentials));
	}

	#[tokio::test]
	async fn test_unknown_username_is_rejected_the_same_way() {
		let store = store_with_password("correct horse");
		let err = verify_credentials("nobody", "correct horse", &store)
			.await
			.unwrap_err();
		assert!(matches!(err, AccessError::InvalidCredentials));
	}

	#[tokio::test]
	async fn test_malformed_stored_hash_is_rejected() {
		let store = FakeStore::new();
		store.add_user(1, "legacy", "Lee", "Gacy", "lee@example.org");
		store.set_password_hash(1, "5f4dcc3b5aa765d61d8327deb882cf99");

		let err = verify_credentials("legacy", "password", &store)
			.await
			.unwrap_err();
		assert!(matches!(err, AccessError::InvalidCredentials));
	}

	#[tokio::test]
	async fn test_duplicate_username_is_ambiguous() {
		let store = store_with_password("correct horse");
		store.add_user(2, "jdoe", "John", "Doe", "john@example.org");
		store.set_password_hash(2, &hash_password("other").unwrap());

		let err = verify_credentials("jdoe", "correct horse", &store)
			.await
			.unwrap_err();
		assert!(matches!(err, AccessError::AmbiguousIdentity { matches: 2, .. }));
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(16))]

		#[test]
		fn prop_password_verifies_only_itself(password in "[ -~]{1,32}", other in "[ -~]{1,32}") {
			let store = store_with_password(&password);

			let accepted = tokio_test::block_on(verify_credentials("jdoe", &password, &store));
			prop_assert_eq!(accepted.unwrap(), UserId::new(1));

			let rejected = tokio_test::block_on(verify_credentials("jdoe", &other, &store));
			prop_assert_eq!(rejected.is_ok(), password == other);
		}
	}
}
