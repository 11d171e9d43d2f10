// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SALT users and their permissions.
//!
//! This module provides:
//! - [`UserIdentity`] - the resolved name and email of a PIPT user
//! - [`SaltUser`] - a user together with the roles and proposal permissions
//!   derived from the proposal database
//!
//! A [`SaltUser`] is meant to live for a single request. Role facts that are
//! expensive to derive are cached on the instance and never refreshed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::error::{AccessError, MissingRecord, Result};
use crate::store::{PermissionStore, VisibilityQuery};
use crate::types::{BlockId, ContactRole, PartnerCode, ProposalCode, RoleSetting, UserId};

/// The identity of a PIPT user, as recorded in the user and investigator
/// tables.
///
/// # PII Handling
///
/// Names and email are PII and are never recorded in tracing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
	pub user_id: UserId,
	pub given_name: String,
	pub family_name: String,
	pub email: String,
}

/// A user of the Southern African Large Telescope with roles and permissions.
///
/// This is the permission evaluator: it answers which roles the user holds and
/// which proposals and blocks they may view or edit. It performs no
/// authentication; see [`verify_credentials`](crate::verify_credentials).
///
/// Construction fails unless the user exists. The partners on whose Time
/// Allocation Committees (TACs) the user serves are loaded eagerly. Board
/// membership and the set of viewable proposals are loaded on first use and
/// cached for the lifetime of the instance; concurrent first calls populate
/// each cache at most once.
pub struct SaltUser {
	store: Arc<dyn PermissionStore>,
	identity: UserIdentity,
	tac_member_partners: HashSet<PartnerCode>,
	tac_chair_partners: HashSet<PartnerCode>,
	board_member: OnceCell<bool>,
	viewable_proposals: OnceCell<HashSet<ProposalCode>>,
}

impl fmt::Debug for SaltUser {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SaltUser")
			.field("user_id", &self.identity.user_id)
			.field("tac_member_partners", &self.tac_member_partners)
			.field("tac_chair_partners", &self.tac_chair_partners)
			.finish_non_exhaustive()
	}
}

impl SaltUser {
	// =========================================================================
	// Construction
	// =========================================================================

	/// Resolve the user with the given id.
	///
	/// # Errors
	/// - `AccessError::NotFound` if there is no user with an investigator record
	///   for this id.
	/// - `AccessError::DataAccess` if a store query fails.
	#[instrument(skip(store), fields(user_id = %user_id))]
	pub async fn resolve(user_id: UserId, store: Arc<dyn PermissionStore>) -> Result<Self> {
		let identity = store
			.find_user(user_id)
			.await?
			.ok_or(AccessError::NotFound(MissingRecord::User(user_id)))?;

		let tac_member_partners: HashSet<PartnerCode> =
			store.tac_member_partners(user_id).await?.into_iter().collect();
		let tac_chair_partners: HashSet<PartnerCode> =
			store.tac_chair_partners(user_id).await?.into_iter().collect();

		debug!(
			tac_memberships = tac_member_partners.len(),
			tac_chairs = tac_chair_partners.len(),
			"user resolved"
		);

		Ok(Self {
			store,
			identity,
			tac_member_partners,
			tac_chair_partners,
			board_member: OnceCell::new(),
			viewable_proposals: OnceCell::new(),
		})
	}

	/// Resolve the user with the given username.
	///
	/// # Errors
	/// - `AccessError::NotFound` if no user has this username.
	/// - `AccessError::AmbiguousIdentity` if more than one user has it.
	/// - `AccessError::DataAccess` if a store query fails.
	#[instrument(skip(store))]
	pub async fn resolve_by_username(
		username: &str,
		store: Arc<dyn PermissionStore>,
	) -> Result<Self> {
		let user_ids = store.find_user_ids_by_username(username).await?;
		match user_ids.as_slice() {
			[] => Err(AccessError::NotFound(MissingRecord::Username(
				username.to_string(),
			))),
			[user_id] => Self::resolve(*user_id, store).await,
			_ => {
				warn!(matches = user_ids.len(), "username is not unique");
				Err(AccessError::AmbiguousIdentity {
					username: username.to_string(),
					matches: user_ids.len(),
				})
			}
		}
	}

	// =========================================================================
	// Identity
	// =========================================================================

	pub fn user_id(&self) -> UserId {
		self.identity.user_id
	}

	/// The user's given name(s).
	pub fn given_name(&self) -> &str {
		&self.identity.given_name
	}

	pub fn family_name(&self) -> &str {
		&self.identity.family_name
	}

	pub fn email(&self) -> &str {
		&self.identity.email
	}

	pub fn identity(&self) -> &UserIdentity {
		&self.identity
	}

	/// The partners on whose TACs the user serves.
	pub fn tacs(&self) -> &HashSet<PartnerCode> {
		&self.tac_member_partners
	}

	// =========================================================================
	// Roles
	// =========================================================================

	/// Check whether the user is an administrator.
	///
	/// Unlike board membership this is queried afresh on every call, so a
	/// revoked admin right takes effect immediately even on a long-lived
	/// instance. The viewable proposal set is the exception: it captures the
	/// admin flag once, when it is first populated.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id))]
	pub async fn is_admin(&self) -> Result<bool> {
		let value = self
			.store
			.role_setting_value(self.identity.user_id, RoleSetting::RightAdmin)
			.await?;
		Ok(value.is_some_and(|v| v > 0))
	}

	/// Check whether the user is a SALT Board member. Cached after the first call.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id))]
	pub async fn is_board_member(&self) -> Result<bool> {
		let is_board_member = self
			.board_member
			.get_or_try_init(|| async {
				let value = self
					.store
					.role_setting_value(self.identity.user_id, RoleSetting::RightBoard)
					.await?;
				let is_board_member = value.is_some_and(|v| v > 0);
				debug!(is_board_member, "board membership cached");
				Ok::<_, AccessError>(is_board_member)
			})
			.await?;
		Ok(*is_board_member)
	}

	/// Check whether the user is an investigator on the proposal.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id, proposal_code = %proposal_code))]
	pub async fn is_investigator(&self, proposal_code: &ProposalCode) -> Result<bool> {
		let count = self
			.store
			.investigator_count(proposal_code, self.identity.user_id)
			.await?;
		Ok(count > 0)
	}

	/// Check whether the user is the Principal Investigator of the proposal.
	pub async fn is_principal_investigator(&self, proposal_code: &ProposalCode) -> Result<bool> {
		self.holds_contact_role(proposal_code, ContactRole::Leader).await
	}

	/// Check whether the user is the Principal Contact of the proposal.
	pub async fn is_principal_contact(&self, proposal_code: &ProposalCode) -> Result<bool> {
		self.holds_contact_role(proposal_code, ContactRole::Contact).await
	}

	#[instrument(skip(self), fields(user_id = %self.identity.user_id, proposal_code = %proposal_code))]
	async fn holds_contact_role(&self, proposal_code: &ProposalCode, role: ContactRole) -> Result<bool> {
		let count = self
			.store
			.contact_count(proposal_code, self.identity.user_id, role)
			.await?;
		Ok(count > 0)
	}

	/// Check whether the user is a member of the partner's TAC.
	pub fn is_tac_member(&self, partner_code: &str) -> bool {
		self.tac_member_partners.contains(partner_code)
	}

	/// Check whether the user chairs the partner's TAC.
	pub fn is_tac_chair(&self, partner_code: &str) -> bool {
		self.tac_chair_partners.contains(partner_code)
	}

	/// Check whether the user is on the TAC of a partner represented among the
	/// proposal's investigators.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id, proposal_code = %proposal_code))]
	pub async fn is_proposal_tac_member(&self, proposal_code: &ProposalCode) -> Result<bool> {
		if self.tac_member_partners.is_empty() {
			return Ok(false);
		}

		let partners = self.store.proposal_partners(proposal_code).await?;
		Ok(partners
			.iter()
			.any(|partner| self.tac_member_partners.contains(partner)))
	}

	// =========================================================================
	// Proposal and block permissions
	// =========================================================================

	/// The proposals the user may view.
	///
	/// These are the proposals the user is an investigator on, the proposals
	/// for which a partner whose TAC the user serves on requests time, and, for
	/// administrators and Board members, all proposals. The set is queried once
	/// and cached for the lifetime of the instance.
	pub async fn viewable_proposals(&self) -> Result<&HashSet<ProposalCode>> {
		self
			.viewable_proposals
			.get_or_try_init(|| async {
				let mut tac_partners: Vec<PartnerCode> =
					self.tac_member_partners.iter().cloned().collect();
				tac_partners.sort();

				let query = VisibilityQuery {
					user_id: self.identity.user_id,
					tac_partners,
					is_admin: self.is_admin().await?,
					is_board_member: self.is_board_member().await?,
				};
				let proposals: HashSet<ProposalCode> = self
					.store
					.visible_proposals(&query)
					.await?
					.into_iter()
					.collect();

				debug!(
					user_id = %self.identity.user_id,
					sees_everything = query.sees_everything(),
					count = proposals.len(),
					"viewable proposals cached"
				);
				Ok::<_, AccessError>(proposals)
			})
			.await
	}

	/// Check whether the user may view the proposal.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id, proposal_code = %proposal_code))]
	pub async fn may_view_proposal(&self, proposal_code: &ProposalCode) -> Result<bool> {
		let allowed = self.viewable_proposals().await?.contains(proposal_code);
		debug!(allowed, "proposal view decision");
		Ok(allowed)
	}

	/// Check whether the user may edit the proposal.
	///
	/// Principal Investigators, Principal Contacts and administrators may edit.
	#[instrument(skip(self), fields(user_id = %self.identity.user_id, proposal_code = %proposal_code))]
	pub async fn may_edit_proposal(&self, proposal_code: &ProposalCode) -> Result<bool> {
		let allowed = self.is_principal_investigator(proposal_code).await?
			|| self.is_principal_contact(proposal_code).await?
			|| self.is_admin().await?;
		debug!(allowed, "proposal edit decision");
		Ok(allowed)
	}

	/// Check whether the user may view the block.
	///
	/// # Errors
	/// Returns `AccessError::NotFound` if there is no block with this id.
	pub async fn may_view_block(&self, block_id: BlockId) -> Result<bool> {
		let proposal_code = self.proposal_code_of_block(block_id).await?;
		self.may_view_proposal(&proposal_code).await
	}

	/// Check whether the user may edit the block.
	///
	/// # Errors
	/// Returns `AccessError::NotFound` if there is no block with this id.
	pub async fn may_edit_block(&self, block_id: BlockId) -> Result<bool> {
		let proposal_code = self.proposal_code_of_block(block_id).await?;
		self.may_edit_proposal(&proposal_code).await
	}

	#[instrument(skip(self), fields(block_id = %block_id))]
	async fn proposal_code_of_block(&self, block_id: BlockId) -> Result<ProposalCode> {
		self
			.store
			.proposal_code_of_block(block_id)
			.await?
			.ok_or(AccessError::NotFound(MissingRecord::Block(block_id)))
	}
}
