// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema and fixtures for tests against an in-memory SQLite database.
//!
//! The tables mirror the parts of the PIPT schema the permission queries read.
//! Every user gets an investigator record with the same id.

use std::str::FromStr;

use salt_server_auth::RoleSetting;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS partner (
		partner_id INTEGER PRIMARY KEY,
		partner_code TEXT NOT NULL UNIQUE
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS institute (
		institute_id INTEGER PRIMARY KEY,
		partner_id INTEGER NOT NULL REFERENCES partner(partner_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS investigator (
		investigator_id INTEGER PRIMARY KEY,
		pipt_user_id INTEGER,
		institute_id INTEGER REFERENCES institute(institute_id),
		first_name TEXT NOT NULL,
		surname TEXT NOT NULL,
		email TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS pipt_user (
		pipt_user_id INTEGER PRIMARY KEY,
		username TEXT NOT NULL,
		password TEXT NOT NULL DEFAULT '',
		investigator_id INTEGER REFERENCES investigator(investigator_id)
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_pipt_user_username ON pipt_user(username)",
	r#"
	CREATE TABLE IF NOT EXISTS pipt_setting (
		pipt_setting_id INTEGER PRIMARY KEY,
		pipt_setting_name TEXT NOT NULL UNIQUE
	)
	"#,
	r#"
	INSERT OR IGNORE INTO pipt_setting (pipt_setting_id, pipt_setting_name)
	VALUES (1, 'RightAdmin'), (2, 'RightBoard'), (3, 'RightAstronomer')
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS pipt_user_setting (
		pipt_user_id INTEGER NOT NULL REFERENCES pipt_user(pipt_user_id),
		pipt_setting_id INTEGER NOT NULL REFERENCES pipt_setting(pipt_setting_id),
		value INTEGER NOT NULL,
		PRIMARY KEY (pipt_user_id, pipt_setting_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS pipt_user_tac (
		pipt_user_id INTEGER NOT NULL REFERENCES pipt_user(pipt_user_id),
		partner_id INTEGER NOT NULL REFERENCES partner(partner_id),
		chair INTEGER NOT NULL DEFAULT 0,
		PRIMARY KEY (pipt_user_id, partner_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS proposal_code (
		proposal_code_id INTEGER PRIMARY KEY,
		proposal_code TEXT NOT NULL UNIQUE
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS proposal (
		proposal_id INTEGER PRIMARY KEY,
		proposal_code_id INTEGER NOT NULL REFERENCES proposal_code(proposal_code_id),
		semester_id INTEGER NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS proposal_investigator (
		proposal_code_id INTEGER NOT NULL REFERENCES proposal_code(proposal_code_id),
		investigator_id INTEGER NOT NULL REFERENCES investigator(investigator_id),
		PRIMARY KEY (proposal_code_id, investigator_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS proposal_contact (
		proposal_code_id INTEGER PRIMARY KEY REFERENCES proposal_code(proposal_code_id),
		leader_id INTEGER REFERENCES investigator(investigator_id),
		contact_id INTEGER REFERENCES investigator(investigator_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS multi_partner (
		proposal_code_id INTEGER NOT NULL REFERENCES proposal_code(proposal_code_id),
		semester_id INTEGER NOT NULL,
		partner_id INTEGER NOT NULL REFERENCES partner(partner_id),
		req_time_amount INTEGER NOT NULL DEFAULT 0,
		PRIMARY KEY (proposal_code_id, semester_id, partner_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS block (
		block_id INTEGER PRIMARY KEY,
		proposal_code_id INTEGER NOT NULL REFERENCES proposal_code(proposal_code_id)
	)
	"#,
];

/// Semester used when a fixture does not name one.
pub const CURRENT_SEMESTER: i64 = 20231;

pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:").unwrap();

	// One connection that is never recycled, so the in-memory database lives
	// as long as the pool.
	SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await
		.expect("Failed to create test pool")
}

pub async fn create_permission_tables(pool: &SqlitePool) {
	for statement in SCHEMA {
		sqlx::query(statement).execute(pool).await.unwrap();
	}
}

pub async fn create_permission_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_permission_tables(&pool).await;
	pool
}

/// Seeds PIPT rows for permission tests.
#[derive(Clone)]
pub struct PermissionFixtures {
	pool: SqlitePool,
}

impl PermissionFixtures {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Add a partner and an institute belonging to it.
	pub async fn add_partner(&self, partner_code: &str) {
		sqlx::query("INSERT OR IGNORE INTO partner (partner_code) VALUES (?)")
			.bind(partner_code)
			.execute(&self.pool)
			.await
			.unwrap();
		sqlx::query(
			r#"
			INSERT OR IGNORE INTO institute (institute_id, partner_id)
			SELECT partner_id, partner_id FROM partner WHERE partner_code = ?
			"#,
		)
		.bind(partner_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	/// Add a user whose investigator record (same id) belongs to an institute
	/// of the given partner.
	pub async fn add_user(
		&self,
		user_id: i64,
		username: &str,
		given_name: &str,
		family_name: &str,
		email: &str,
		partner_code: &str,
	) {
		self.add_partner(partner_code).await;
		sqlx::query(
			r#"
			INSERT INTO investigator (investigator_id, pipt_user_id, institute_id, first_name, surname, email)
			SELECT ?, ?, ins.institute_id, ?, ?, ?
			FROM institute AS ins
			JOIN partner AS p ON ins.partner_id = p.partner_id
			WHERE p.partner_code = ?
			"#,
		)
		.bind(user_id)
		.bind(user_id)
		.bind(given_name)
		.bind(family_name)
		.bind(email)
		.bind(partner_code)
		.execute(&self.pool)
		.await
		.unwrap();
		sqlx::query("INSERT INTO pipt_user (pipt_user_id, username, investigator_id) VALUES (?, ?, ?)")
			.bind(user_id)
			.bind(username)
			.bind(user_id)
			.execute(&self.pool)
			.await
			.unwrap();
	}

	/// Add a user row without an investigator record.
	pub async fn add_orphan_user(&self, user_id: i64, username: &str) {
		sqlx::query("INSERT INTO pipt_user (pipt_user_id, username) VALUES (?, ?)")
			.bind(user_id)
			.bind(username)
			.execute(&self.pool)
			.await
			.unwrap();
	}

	pub async fn set_password_hash(&self, user_id: i64, password_hash: &str) {
		sqlx::query("UPDATE pipt_user SET password = ? WHERE pipt_user_id = ?")
			.bind(password_hash)
			.bind(user_id)
			.execute(&self.pool)
			.await
			.unwrap();
	}

	pub async fn set_role(&self, user_id: i64, setting: RoleSetting, value: i64) {
		sqlx::query(
			r#"
			INSERT OR REPLACE INTO pipt_user_setting (pipt_user_id, pipt_setting_id, value)
			SELECT ?, pipt_setting_id, ? FROM pipt_setting WHERE pipt_setting_name = ?
			"#,
		)
		.bind(user_id)
		.bind(value)
		.bind(setting.setting_name())
		.execute(&self.pool)
		.await
		.unwrap();
	}

	pub async fn add_tac(&self, user_id: i64, partner_code: &str, chair: bool) {
		self.add_partner(partner_code).await;
		sqlx::query(
			r#"
			INSERT OR REPLACE INTO pipt_user_tac (pipt_user_id, partner_id, chair)
			SELECT ?, partner_id, ? FROM partner WHERE partner_code = ?
			"#,
		)
		.bind(user_id)
		.bind(chair as i32)
		.bind(partner_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	pub async fn add_proposal(&self, proposal_code: &str) {
		self
			.add_proposal_in_semester(proposal_code, CURRENT_SEMESTER)
			.await;
	}

	pub async fn add_proposal_in_semester(&self, proposal_code: &str, semester_id: i64) {
		sqlx::query("INSERT INTO proposal_code (proposal_code) VALUES (?)")
			.bind(proposal_code)
			.execute(&self.pool)
			.await
			.unwrap();
		sqlx::query(
			r#"
			INSERT INTO proposal (proposal_code_id, semester_id)
			SELECT proposal_code_id, ? FROM proposal_code WHERE proposal_code = ?
			"#,
		)
		.bind(semester_id)
		.bind(proposal_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	pub async fn add_investigator(&self, proposal_code: &str, user_id: i64) {
		sqlx::query(
			r#"
			INSERT INTO proposal_investigator (proposal_code_id, investigator_id)
			SELECT pc.proposal_code_id, pu.investigator_id
			FROM proposal_code AS pc, pipt_user AS pu
			WHERE pc.proposal_code = ? AND pu.pipt_user_id = ?
			"#,
		)
		.bind(proposal_code)
		.bind(user_id)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	pub async fn set_contacts(&self, proposal_code: &str, leader: Option<i64>, contact: Option<i64>) {
		sqlx::query(
			r#"
			INSERT OR REPLACE INTO proposal_contact (proposal_code_id, leader_id, contact_id)
			SELECT
				pc.proposal_code_id,
				(SELECT investigator_id FROM pipt_user WHERE pipt_user_id = ?),
				(SELECT investigator_id FROM pipt_user WHERE pipt_user_id = ?)
			FROM proposal_code AS pc
			WHERE pc.proposal_code = ?
			"#,
		)
		.bind(leader)
		.bind(contact)
		.bind(proposal_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	/// Record a partner's time request for the proposal's own semester.
	pub async fn add_time_request(&self, proposal_code: &str, partner_code: &str, seconds: i64) {
		self.add_partner(partner_code).await;
		sqlx::query(
			r#"
			INSERT INTO multi_partner (proposal_code_id, semester_id, partner_id, req_time_amount)
			SELECT p.proposal_code_id, p.semester_id, pa.partner_id, ?
			FROM proposal AS p
			JOIN proposal_code AS pc ON p.proposal_code_id = pc.proposal_code_id
			JOIN partner AS pa ON pa.partner_code = ?
			WHERE pc.proposal_code = ?
			"#,
		)
		.bind(seconds)
		.bind(partner_code)
		.bind(proposal_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	/// Record a partner's time request for an explicit semester.
	pub async fn add_time_request_in_semester(
		&self,
		proposal_code: &str,
		semester_id: i64,
		partner_code: &str,
		seconds: i64,
	) {
		self.add_partner(partner_code).await;
		sqlx::query(
			r#"
			INSERT INTO multi_partner (proposal_code_id, semester_id, partner_id, req_time_amount)
			SELECT pc.proposal_code_id, ?, pa.partner_id, ?
			FROM proposal_code AS pc, partner AS pa
			WHERE pc.proposal_code = ? AND pa.partner_code = ?
			"#,
		)
		.bind(semester_id)
		.bind(seconds)
		.bind(proposal_code)
		.bind(partner_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}

	pub async fn add_block(&self, block_id: i64, proposal_code: &str) {
		sqlx::query(
			r#"
			INSERT INTO block (block_id, proposal_code_id)
			SELECT ?, proposal_code_id FROM proposal_code WHERE proposal_code = ?
			"#,
		)
		.bind(block_id)
		.bind(proposal_code)
		.execute(&self.pool)
		.await
		.unwrap();
	}
}
