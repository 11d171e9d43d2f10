// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for SALT roles and permissions.
//!
//! - **Numeric ID newtypes**: [`UserId`] and [`BlockId`], wrapping the integer
//!   primary keys used by the proposal database
//! - **Code newtypes**: [`PartnerCode`] and [`ProposalCode`], wrapping the
//!   human-readable string identifiers
//! - **Role enums**: the role settings ([`RoleSetting`]) and proposal contact
//!   roles ([`ContactRole`]) consulted by permission checks
//!
//! Code types implement `Borrow<str>`, so sets of codes can be probed with a
//! plain string slice.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// =============================================================================
// Numeric ID Newtypes
// =============================================================================

macro_rules! define_numeric_id {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(i64);

		impl $name {
			/// Create a new ID from its database value.
			pub fn new(id: i64) -> Self {
				Self(id)
			}

			/// Get the database value.
			pub fn get(self) -> i64 {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<i64> for $name {
			fn from(id: i64) -> Self {
				Self(id)
			}
		}

		impl From<$name> for i64 {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_numeric_id!(UserId, "Unique identifier for a PIPT user.");
define_numeric_id!(BlockId, "Unique identifier for an observation block.");

// =============================================================================
// Code Newtypes
// =============================================================================

macro_rules! define_code_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create a new code.
			pub fn new(code: impl Into<String>) -> Self {
				Self(code.into())
			}

			/// Get the code as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Consume the code, returning the inner string.
			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(code: &str) -> Self {
				Self(code.to_string())
			}
		}

		impl From<String> for $name {
			fn from(code: String) -> Self {
				Self(code)
			}
		}

		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
	};
}

define_code_type!(
	PartnerCode,
	"Short code of a SALT partner, such as `RSA` or `UW`."
);
define_code_type!(
	ProposalCode,
	"Human-readable proposal identifier, such as `2023-1-SCI-042`."
);

// =============================================================================
// Roles
// =============================================================================

/// Per-user role settings stored in the PIPT settings table.
///
/// A setting grants its right when the stored value is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleSetting {
	/// Administrator rights over all proposals.
	RightAdmin,
	/// SALT Board membership.
	RightBoard,
}

impl RoleSetting {
	/// Returns the setting name as stored in the database.
	pub fn setting_name(&self) -> &'static str {
		match self {
			RoleSetting::RightAdmin => "RightAdmin",
			RoleSetting::RightBoard => "RightBoard",
		}
	}
}

impl fmt::Display for RoleSetting {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.setting_name())
	}
}

/// The two leadership roles recorded for every proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
	/// The Principal Investigator.
	Leader,
	/// The Principal Contact.
	Contact,
}

impl fmt::Display for ContactRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ContactRole::Leader => write!(f, "leader"),
			ContactRole::Contact => write!(f, "contact"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn test_user_id_roundtrip() {
		let id = UserId::new(42);
		assert_eq!(id.get(), 42);
		assert_eq!(i64::from(id), 42);
		assert_eq!(UserId::from(42), id);
		assert_eq!(id.to_string(), "42");
	}

	#[test]
	fn test_code_set_lookup_by_str() {
		let partners: HashSet<PartnerCode> = ["RSA", "UW"].into_iter().map(PartnerCode::from).collect();
		assert!(partners.contains("RSA"));
		assert!(!partners.contains("rsa"));
	}

	#[test]
	fn test_code_serializes_transparently() {
		let code = ProposalCode::new("2023-1-SCI-042");
		let json = serde_json::to_string(&code).unwrap();
		assert_eq!(json, "\"2023-1-SCI-042\"");
	}

	#[test]
	fn test_role_setting_names() {
		assert_eq!(RoleSetting::RightAdmin.setting_name(), "RightAdmin");
		assert_eq!(RoleSetting::RightBoard.to_string(), "RightBoard");
	}

	#[test]
	fn test_contact_role_display() {
		assert_eq!(ContactRole::Leader.to_string(), "leader");
		assert_eq!(ContactRole::Contact.to_string(), "contact");
	}
}
