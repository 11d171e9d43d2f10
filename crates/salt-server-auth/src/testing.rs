// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`PermissionStore`] for unit tests.
//!
//! The store can be mutated between calls and counts the queries it serves,
//! which lets tests observe caching.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DataAccessError;
use crate::store::{PermissionStore, StoreResult, StoredCredentials, VisibilityQuery};
use crate::types::{BlockId, ContactRole, PartnerCode, ProposalCode, RoleSetting, UserId};
use crate::user::UserIdentity;

#[derive(Default)]
struct State {
	users: Vec<(String, UserIdentity)>,
	password_hashes: HashMap<UserId, String>,
	settings: HashMap<(UserId, RoleSetting), i64>,
	tacs: Vec<(UserId, PartnerCode, bool)>,
	proposals: BTreeSet<ProposalCode>,
	investigators: Vec<(ProposalCode, UserId, PartnerCode)>,
	contacts: HashMap<ProposalCode, (Option<UserId>, Option<UserId>)>,
	time_requests: Vec<(ProposalCode, PartnerCode, i64)>,
	blocks: HashMap<BlockId, ProposalCode>,
}

#[derive(Default)]
pub(crate) struct FakeStore {
	state: Mutex<State>,
	failing: AtomicBool,
	queries: AtomicUsize,
	visibility_queries: AtomicUsize,
}

impl FakeStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_user(&self, id: i64, username: &str, given: &str, family: &str, email: &str) {
		self.state.lock().unwrap().users.push((
			username.to_string(),
			UserIdentity {
				user_id: UserId::new(id),
				given_name: given.to_string(),
				family_name: family.to_string(),
				email: email.to_string(),
			},
		));
	}

	pub fn set_password_hash(&self, id: i64, hash: &str) {
		self
			.state
			.lock()
			.unwrap()
			.password_hashes
			.insert(UserId::new(id), hash.to_string());
	}

	pub fn set_role(&self, id: i64, setting: RoleSetting, value: i64) {
		self
			.state
			.lock()
			.unwrap()
			.settings
			.insert((UserId::new(id), setting), value);
	}

	pub fn add_tac(&self, id: i64, partner: &str, chair: bool) {
		self
			.state
			.lock()
			.unwrap()
			.tacs
			.push((UserId::new(id), PartnerCode::from(partner), chair));
	}

	pub fn add_proposal(&self, proposal: &str) {
		self
			.state
			.lock()
			.unwrap()
			.proposals
			.insert(ProposalCode::from(proposal));
	}

	pub fn add_investigator(&self, proposal: &str, id: i64, partner: &str) {
		let mut state = self.state.lock().unwrap();
		state.proposals.insert(ProposalCode::from(proposal));
		state.investigators.push((
			ProposalCode::from(proposal),
			UserId::new(id),
			PartnerCode::from(partner),
		));
	}

	pub fn set_contacts(&self, proposal: &str, leader: Option<i64>, contact: Option<i64>) {
		self.state.lock().unwrap().contacts.insert(
			ProposalCode::from(proposal),
			(leader.map(UserId::new), contact.map(UserId::new)),
		);
	}

	pub fn add_time_request(&self, proposal: &str, partner: &str, seconds: i64) {
		self.state.lock().unwrap().time_requests.push((
			ProposalCode::from(proposal),
			PartnerCode::from(partner),
			seconds,
		));
	}

	pub fn add_block(&self, id: i64, proposal: &str) {
		self
			.state
			.lock()
			.unwrap()
			.blocks
			.insert(BlockId::new(id), ProposalCode::from(proposal));
	}

	pub fn fail_queries(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn query_count(&self) -> usize {
		self.queries.load(Ordering::SeqCst)
	}

	pub fn visibility_query_count(&self) -> usize {
		self.visibility_queries.load(Ordering::SeqCst)
	}

	fn begin_query(&self) -> StoreResult<std::sync::MutexGuard<'_, State>> {
		self.queries.fetch_add(1, Ordering::SeqCst);
		if self.failing.load(Ordering::SeqCst) {
			return Err(DataAccessError::new("connection refused"));
		}
		Ok(self.state.lock().unwrap())
	}
}

#[async_trait]
impl PermissionStore for FakeStore {
	async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserIdentity>> {
		let state = self.begin_query()?;
		Ok(state
			.users
			.iter()
			.find(|(_, identity)| identity.user_id == user_id)
			.map(|(_, identity)| identity.clone()))
	}

	async fn find_user_ids_by_username(&self, username: &str) -> StoreResult<Vec<UserId>> {
		let state = self.begin_query()?;
		Ok(state
			.users
			.iter()
			.filter(|(name, _)| name == username)
			.map(|(_, identity)| identity.user_id)
			.collect())
	}

	async fn find_credentials(&self, username: &str) -> StoreResult<Vec<StoredCredentials>> {
		let state = self.begin_query()?;
		Ok(state
			.users
			.iter()
			.filter(|(name, _)| name == username)
			.filter_map(|(_, identity)| {
				state
					.password_hashes
					.get(&identity.user_id)
					.map(|hash| StoredCredentials {
						user_id: identity.user_id,
						password_hash: hash.clone(),
					})
			})
			.collect())
	}

	async fn role_setting_value(
		&self,
		user_id: UserId,
		setting: RoleSetting,
	) -> StoreResult<Option<i64>> {
		let state = self.begin_query()?;
		Ok(state.settings.get(&(user_id, setting)).copied())
	}

	async fn tac_member_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>> {
		let state = self.begin_query()?;
		Ok(state
			.tacs
			.iter()
			.filter(|(id, _, _)| *id == user_id)
			.map(|(_, partner, _)| partner.clone())
			.collect())
	}

	async fn tac_chair_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>> {
		let state = self.begin_query()?;
		Ok(state
			.tacs
			.iter()
			.filter(|(id, _, chair)| *id == user_id && *chair)
			.map(|(_, partner, _)| partner.clone())
			.collect())
	}

	async fn investigator_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
	) -> StoreResult<i64> {
		let state = self.begin_query()?;
		let count = state
			.investigators
			.iter()
			.filter(|(proposal, id, _)| proposal == proposal_code && *id == user_id)
			.count();
		Ok(count as i64)
	}

	async fn contact_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
		role: ContactRole,
	) -> StoreResult<i64> {
		let state = self.begin_query()?;
		let holder = state
			.contacts
			.get(proposal_code)
			.and_then(|(leader, contact)| match role {
				ContactRole::Leader => *leader,
				ContactRole::Contact => *contact,
			});
		Ok(i64::from(holder == Some(user_id)))
	}

	async fn proposal_partners(
		&self,
		proposal_code: &ProposalCode,
	) -> StoreResult<Vec<PartnerCode>> {
		let state = self.begin_query()?;
		let partners: BTreeSet<PartnerCode> = state
			.investigators
			.iter()
			.filter(|(proposal, _, _)| proposal == proposal_code)
			.map(|(_, _, partner)| partner.clone())
			.collect();
		Ok(partners.into_iter().collect())
	}

	async fn visible_proposals(&self, query: &VisibilityQuery) -> StoreResult<Vec<ProposalCode>> {
		self.visibility_queries.fetch_add(1, Ordering::SeqCst);
		let state = self.begin_query()?;
		Ok(state
			.proposals
			.iter()
			.filter(|proposal| {
				query.sees_everything()
					|| state
						.investigators
						.iter()
						.any(|(p, id, _)| p == *proposal && *id == query.user_id)
					|| state.time_requests.iter().any(|(p, partner, seconds)| {
						p == *proposal && *seconds > 0 && query.tac_partners.contains(partner)
					})
			})
			.cloned()
			.collect())
	}

	async fn proposal_code_of_block(&self, block_id: BlockId) -> StoreResult<Option<ProposalCode>> {
		let state = self.begin_query()?;
		Ok(state.blocks.get(&block_id).cloned())
	}
}
