// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission repository for database operations.
//!
//! This module answers the lookups behind SALT role and permission checks:
//! - User existence, usernames and stored password hashes
//! - Role settings (`RightAdmin`, `RightBoard`) and TAC memberships
//! - Proposal investigators, contacts and represented partners
//! - The set of proposals a user may view
//! - The proposal a block belongs to
//!
//! All queries are read-only and bind every parameter.

use async_trait::async_trait;
use salt_server_auth::{
	BlockId, ContactRole, PartnerCode, PermissionStore, ProposalCode, RoleSetting, StoreResult,
	StoredCredentials, UserId, UserIdentity, VisibilityQuery,
};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};

use crate::error::DbError;

// Database row structs for mapping
#[derive(sqlx::FromRow)]
struct UserRow {
	pipt_user_id: i64,
	first_name: String,
	surname: String,
	email: String,
}

impl From<UserRow> for UserIdentity {
	fn from(row: UserRow) -> Self {
		UserIdentity {
			user_id: UserId::new(row.pipt_user_id),
			given_name: row.first_name,
			family_name: row.surname,
			email: row.email,
		}
	}
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
	pipt_user_id: i64,
	password: String,
}

impl From<CredentialsRow> for StoredCredentials {
	fn from(row: CredentialsRow) -> Self {
		StoredCredentials {
			user_id: UserId::new(row.pipt_user_id),
			password_hash: row.password,
		}
	}
}

const TAC_PARTNERS_SQL: &str = r#"
	SELECT p.partner_code
	FROM pipt_user_tac AS put
	JOIN partner AS p ON put.partner_id = p.partner_id
	WHERE put.pipt_user_id = ?
	ORDER BY p.partner_code
"#;

const TAC_CHAIR_PARTNERS_SQL: &str = r#"
	SELECT p.partner_code
	FROM pipt_user_tac AS put
	JOIN partner AS p ON put.partner_id = p.partner_id
	WHERE put.pipt_user_id = ? AND put.chair = 1
	ORDER BY p.partner_code
"#;

const LEADER_COUNT_SQL: &str = r#"
	SELECT COUNT(*)
	FROM proposal_contact AS pco
	JOIN investigator AS i ON pco.leader_id = i.investigator_id
	JOIN proposal_code AS pc ON pco.proposal_code_id = pc.proposal_code_id
	WHERE pc.proposal_code = ? AND i.pipt_user_id = ?
"#;

const CONTACT_COUNT_SQL: &str = r#"
	SELECT COUNT(*)
	FROM proposal_contact AS pco
	JOIN investigator AS i ON pco.contact_id = i.investigator_id
	JOIN proposal_code AS pc ON pco.proposal_code_id = pc.proposal_code_id
	WHERE pc.proposal_code = ? AND i.pipt_user_id = ?
"#;

/// Repository for permission lookups against the PIPT tables.
#[derive(Clone)]
pub struct SqlitePermissionRepository {
	pool: SqlitePool,
}

impl SqlitePermissionRepository {
	/// Create a new repository with the given pool.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Get a user joined with their investigator record.
	///
	/// # Returns
	/// `None` if the user does not exist or has no investigator record.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn find_user(&self, user_id: UserId) -> Result<Option<UserIdentity>, DbError> {
		let row = sqlx::query_as::<_, UserRow>(
			r#"
			SELECT pu.pipt_user_id, i.first_name, i.surname, i.email
			FROM pipt_user AS pu
			JOIN investigator AS i ON pu.investigator_id = i.investigator_id
			WHERE pu.pipt_user_id = ?
			"#,
		)
		.bind(user_id.get())
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(UserIdentity::from))
	}

	/// Get the ids of all users with the given username.
	///
	/// More than one id means the username is not unique, which callers treat
	/// as an error.
	#[tracing::instrument(skip(self))]
	pub async fn find_user_ids_by_username(&self, username: &str) -> Result<Vec<UserId>, DbError> {
		let ids = sqlx::query_scalar::<_, i64>(
			"SELECT pipt_user_id FROM pipt_user WHERE username = ? ORDER BY pipt_user_id",
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await?;

		Ok(ids.into_iter().map(UserId::new).collect())
	}

	/// Get the stored password hashes for a username.
	#[tracing::instrument(skip(self))]
	pub async fn find_credentials(&self, username: &str) -> Result<Vec<StoredCredentials>, DbError> {
		let rows = sqlx::query_as::<_, CredentialsRow>(
			"SELECT pipt_user_id, password FROM pipt_user WHERE username = ? ORDER BY pipt_user_id",
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(StoredCredentials::from).collect())
	}

	/// Get the largest value of a role setting for a user.
	///
	/// # Returns
	/// `None` if the user has no row for the setting.
	#[tracing::instrument(skip(self), fields(user_id = %user_id, setting = %setting))]
	pub async fn role_setting_value(
		&self,
		user_id: UserId,
		setting: RoleSetting,
	) -> Result<Option<i64>, DbError> {
		let value = sqlx::query_scalar::<_, Option<i64>>(
			r#"
			SELECT MAX(CAST(pus.value AS INTEGER))
			FROM pipt_user_setting AS pus
			JOIN pipt_setting AS ps ON pus.pipt_setting_id = ps.pipt_setting_id
			WHERE pus.pipt_user_id = ? AND ps.pipt_setting_name = ?
			"#,
		)
		.bind(user_id.get())
		.bind(setting.setting_name())
		.fetch_one(&self.pool)
		.await?;

		Ok(value)
	}

	/// Get the partners on whose TACs the user serves.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn tac_member_partners(&self, user_id: UserId) -> Result<Vec<PartnerCode>, DbError> {
		self.partner_codes(TAC_PARTNERS_SQL, user_id).await
	}

	/// Get the partners whose TACs the user chairs.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn tac_chair_partners(&self, user_id: UserId) -> Result<Vec<PartnerCode>, DbError> {
		self.partner_codes(TAC_CHAIR_PARTNERS_SQL, user_id).await
	}

	async fn partner_codes(&self, sql: &str, user_id: UserId) -> Result<Vec<PartnerCode>, DbError> {
		let codes = sqlx::query_scalar::<_, String>(sql)
			.bind(user_id.get())
			.fetch_all(&self.pool)
			.await?;

		Ok(codes.into_iter().map(PartnerCode::from).collect())
	}

	/// Count the user's investigator entries on a proposal.
	#[tracing::instrument(skip(self), fields(proposal_code = %proposal_code, user_id = %user_id))]
	pub async fn investigator_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
	) -> Result<i64, DbError> {
		let count = sqlx::query_scalar::<_, i64>(
			r#"
			SELECT COUNT(*)
			FROM proposal_code AS pc
			JOIN proposal_investigator AS pi ON pc.proposal_code_id = pi.proposal_code_id
			JOIN investigator AS i ON pi.investigator_id = i.investigator_id
			WHERE pc.proposal_code = ? AND i.pipt_user_id = ?
			"#,
		)
		.bind(proposal_code.as_str())
		.bind(user_id.get())
		.fetch_one(&self.pool)
		.await?;

		Ok(count)
	}

	/// Count the proposal contact rows naming the user in the given role.
	#[tracing::instrument(skip(self), fields(proposal_code = %proposal_code, user_id = %user_id, role = %role))]
	pub async fn contact_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
		role: ContactRole,
	) -> Result<i64, DbError> {
		let sql = match role {
			ContactRole::Leader => LEADER_COUNT_SQL,
			ContactRole::Contact => CONTACT_COUNT_SQL,
		};
		let count = sqlx::query_scalar::<_, i64>(sql)
			.bind(proposal_code.as_str())
			.bind(user_id.get())
			.fetch_one(&self.pool)
			.await?;

		Ok(count)
	}

	/// Get the partners represented among a proposal's investigators.
	#[tracing::instrument(skip(self), fields(proposal_code = %proposal_code))]
	pub async fn proposal_partners(
		&self,
		proposal_code: &ProposalCode,
	) -> Result<Vec<PartnerCode>, DbError> {
		let codes = sqlx::query_scalar::<_, String>(
			r#"
			SELECT DISTINCT p.partner_code
			FROM partner AS p
			JOIN institute AS ins ON p.partner_id = ins.partner_id
			JOIN investigator AS i ON ins.institute_id = i.institute_id
			JOIN proposal_investigator AS pi ON i.investigator_id = pi.investigator_id
			JOIN proposal_code AS pc ON pi.proposal_code_id = pc.proposal_code_id
			WHERE pc.proposal_code = ?
			ORDER BY p.partner_code
			"#,
		)
		.bind(proposal_code.as_str())
		.fetch_all(&self.pool)
		.await?;

		Ok(codes.into_iter().map(PartnerCode::from).collect())
	}

	/// Get the proposals visible under the given query.
	///
	/// A proposal is included if the user is one of its investigators, if one
	/// of the TAC partners requests a positive amount of time for it in the
	/// proposal's semester, or if the admin or board flag is set. Without TAC
	/// partners the time-request condition is left out entirely.
	#[tracing::instrument(
		skip(self, query),
		fields(
			user_id = %query.user_id,
			tac_partners = query.tac_partners.len(),
			is_admin = query.is_admin,
			is_board_member = query.is_board_member,
		)
	)]
	pub async fn visible_proposals(
		&self,
		query: &VisibilityQuery,
	) -> Result<Vec<ProposalCode>, DbError> {
		let mut builder = QueryBuilder::<Sqlite>::new(
			r#"
			SELECT pc.proposal_code
			FROM proposal_code AS pc
			WHERE EXISTS (
				SELECT 1
				FROM proposal_investigator AS pi
				JOIN investigator AS i ON pi.investigator_id = i.investigator_id
				WHERE pi.proposal_code_id = pc.proposal_code_id AND i.pipt_user_id = "#,
		);
		builder.push_bind(query.user_id.get());
		builder.push(")");

		if !query.tac_partners.is_empty() {
			builder.push(
				r#"
			OR EXISTS (
				SELECT 1
				FROM proposal AS p
				JOIN multi_partner AS mp
					ON p.proposal_code_id = mp.proposal_code_id AND p.semester_id = mp.semester_id
				JOIN partner AS pa ON mp.partner_id = pa.partner_id
				WHERE p.proposal_code_id = pc.proposal_code_id
					AND mp.req_time_amount > 0
					AND pa.partner_code IN ("#,
			);
			let mut partners = builder.separated(", ");
			for partner in &query.tac_partners {
				partners.push_bind(partner.as_str());
			}
			partners.push_unseparated("))");
		}

		builder.push(" OR 1 = ");
		builder.push_bind(query.is_admin as i32);
		builder.push(" OR 1 = ");
		builder.push_bind(query.is_board_member as i32);
		builder.push(" ORDER BY pc.proposal_code");

		let codes = builder
			.build_query_scalar::<String>()
			.fetch_all(&self.pool)
			.await?;

		tracing::debug!(count = codes.len(), "visible proposals loaded");
		Ok(codes.into_iter().map(ProposalCode::from).collect())
	}

	/// Get the code of the proposal a block belongs to.
	///
	/// # Returns
	/// `None` if no block exists with this id.
	#[tracing::instrument(skip(self), fields(block_id = %block_id))]
	pub async fn proposal_code_of_block(
		&self,
		block_id: BlockId,
	) -> Result<Option<ProposalCode>, DbError> {
		let code = sqlx::query_scalar::<_, String>(
			r#"
			SELECT pc.proposal_code
			FROM proposal_code AS pc
			JOIN block AS b ON pc.proposal_code_id = b.proposal_code_id
			WHERE b.block_id = ?
			"#,
		)
		.bind(block_id.get())
		.fetch_optional(&self.pool)
		.await?;

		Ok(code.map(ProposalCode::from))
	}
}

#[async_trait]
impl PermissionStore for SqlitePermissionRepository {
	async fn find_user(&self, user_id: UserId) -> StoreResult<Option<UserIdentity>> {
		Ok(self.find_user(user_id).await?)
	}

	async fn find_user_ids_by_username(&self, username: &str) -> StoreResult<Vec<UserId>> {
		Ok(self.find_user_ids_by_username(username).await?)
	}

	async fn find_credentials(&self, username: &str) -> StoreResult<Vec<StoredCredentials>> {
		Ok(self.find_credentials(username).await?)
	}

	async fn role_setting_value(
		&self,
		user_id: UserId,
		setting: RoleSetting,
	) -> StoreResult<Option<i64>> {
		Ok(self.role_setting_value(user_id, setting).await?)
	}

	async fn tac_member_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>> {
		Ok(self.tac_member_partners(user_id).await?)
	}

	async fn tac_chair_partners(&self, user_id: UserId) -> StoreResult<Vec<PartnerCode>> {
		Ok(self.tac_chair_partners(user_id).await?)
	}

	async fn investigator_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
	) -> StoreResult<i64> {
		Ok(self.investigator_count(proposal_code, user_id).await?)
	}

	async fn contact_count(
		&self,
		proposal_code: &ProposalCode,
		user_id: UserId,
		role: ContactRole,
	) -> StoreResult<i64> {
		Ok(self.contact_count(proposal_code, user_id, role).await?)
	}

	async fn proposal_partners(
		&self,
		proposal_code: &ProposalCode,
	) -> StoreResult<Vec<PartnerCode>> {
		Ok(self.proposal_partners(proposal_code).await?)
	}

	async fn visible_proposals(&self, query: &VisibilityQuery) -> StoreResult<Vec<ProposalCode>> {
		Ok(self.visible_proposals(query).await?)
	}

	async fn proposal_code_of_block(&self, block_id: BlockId) -> StoreResult<Option<ProposalCode>> {
		Ok(self.proposal_code_of_block(block_id).await?)
	}
}
