// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The lookups permission checks need from the proposal database.
//!
//! [`PermissionStore`] is implemented by the database layer. Every method is a
//! single read query with bound parameters, returning typed values rather than
//! raw rows.

use async_trait::async_trait;

use crate::error::DataAccessError;
use crate::types::{BlockId, ContactRole, PartnerCode, ProposalCode, RoleSetting, UserId};
use crate::user::UserIdentity;

pub type StoreResult<T> = std::result::Result<T, DataAccessError>;

/// A user id together with the stored password hash (a PHC string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
	pub user_id: UserId,
	pub password_hash: String,
}

/// Inputs of the visible-proposal query.
///
/// A proposal is visible if the user is one of its investigators, if one of
/// `tac_partners` requests time for it in the proposal's semester, or
/// unconditionally when `is_admin` or `is_board_member` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityQuery {
	pub user_id: UserId,
	pub tac_partners: Vec<PartnerCode>,
	pub is_admin: bool,
	pub is_board_member: bool,
}

impl VisibilityQuery {
	/// Returns true if the query degenerates to "all proposals".
	pub fn sees_everything(&self) -> bool {
		self.is_admin || self.is_board_member
	}
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
	/// The user joined with their investigator record, if both exist.
	async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserIdentity>>;
	async fn find_user_ids_by_username(&self, username: &str) -> StoreResult<Vec<UserId>>;
	async fn find_credentials(&self, username: &str) -> StoreResult<Vec<StoredCredentials>>;
	/// The largest value stored for the setting, `None` if the user has none.
	async fn role_setting_value(
		&self,
		user_id: UserId,
		setting: RoleSetting,
	) -> StoreResult<Option<i64>>;
	async fn tac_member_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>>;
	async fn tac_chair_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>>;
	async fn investigator_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
	) -> StoreResult<i64>;
	async fn contact_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
		role: ContactRole,
	) -> StoreResult<i64>;
	/// Partners represented among the proposal's investigators, via their institutes.
	async fn proposal_partners(&self, proposal_code: &ProposalCode)
		-> StoreResult<Vec<PartnerCode>>;
	async fn visible_proposals(&self, query: &VisibilityQuery) -> StoreResult<Vec<ProposalCode>>;
	async fn proposal_code_of_block(&self, block_id: BlockId) -> StoreResult<Option<ProposalCode>>;
}
