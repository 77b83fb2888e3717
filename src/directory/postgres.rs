//! Postgres-backed directory used by the server wiring.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{
    Account, AccountKind, CreateOutcome, InstituteProfile, NewStudent, StudentProfile,
    UserDirectory,
};

const ACCOUNT_COLUMNS: &str = "a.id, a.email, a.kind, a.password_hash, a.is_active, a.is_staff, \
                               a.is_superuser, a.date_joined";

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let kind: String = row.get("kind");
    let kind = AccountKind::parse(&kind).ok_or_else(|| anyhow!("unknown account kind: {kind}"))?;
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        kind,
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        date_joined: row.get("date_joined"),
    })
}

fn student_from_row(row: &PgRow) -> Result<StudentProfile> {
    Ok(StudentProfile {
        account: account_from_row(row)?,
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        email_verified: row.get("email_verified"),
        phone_number_verified: row.get("phone_number_verified"),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.email = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up account by email")?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up account by id")?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_student_by_phone(&self, phone_number: &str) -> Result<Option<StudentProfile>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS}, s.full_name, s.phone_number, s.email_verified, \
             s.phone_number_verified \
             FROM student_profiles s JOIN accounts a ON a.id = s.account_id \
             WHERE s.phone_number = $1"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up student by phone")?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn student_profile(&self, account_id: Uuid) -> Result<Option<StudentProfile>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS}, s.full_name, s.phone_number, s.email_verified, \
             s.phone_number_verified \
             FROM student_profiles s JOIN accounts a ON a.id = s.account_id \
             WHERE s.account_id = $1"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load student profile")?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn institute_profile(&self, account_id: Uuid) -> Result<Option<InstituteProfile>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS}, i.display_name, i.description \
             FROM institute_profiles i JOIN accounts a ON a.id = i.account_id \
             WHERE i.account_id = $1"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load institute profile")?;
        row.map(|row| {
            Ok(InstituteProfile {
                account: account_from_row(&row)?,
                display_name: row.get("display_name"),
                description: row.get("description"),
            })
        })
        .transpose()
    }

    async fn create_student(&self, new_student: NewStudent) -> Result<CreateOutcome> {
        // Account and profile rows land together or not at all.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin registration transaction")?;

        let query = "INSERT INTO accounts (email, kind, password_hash) VALUES ($1, $2, $3) \
                     RETURNING id, date_joined";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&new_student.email)
            .bind(AccountKind::Student.as_str())
            .bind(&new_student.password_hash)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await;

        let (account_id, date_joined) = match row {
            Ok(row) => (row.get::<Uuid, _>("id"), row.get("date_joined")),
            Err(err) if is_unique_violation(&err) => {
                let _ = tx.rollback().await;
                return Ok(CreateOutcome::DuplicateEmail);
            }
            Err(err) => return Err(err).context("failed to insert account"),
        };

        let query = "INSERT INTO student_profiles (account_id, full_name, phone_number) \
                     VALUES ($1, $2, $3)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let inserted = sqlx::query(query)
            .bind(account_id)
            .bind(&new_student.full_name)
            .bind(&new_student.phone_number)
            .execute(&mut *tx)
            .instrument(span)
            .await;

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                let _ = tx.rollback().await;
                return Ok(CreateOutcome::DuplicatePhone);
            }
            Err(err) => return Err(err).context("failed to insert student profile"),
        }

        tx.commit()
            .await
            .context("failed to commit registration transaction")?;

        Ok(CreateOutcome::Created(StudentProfile {
            account: Account {
                id: account_id,
                email: new_student.email,
                kind: AccountKind::Student,
                password_hash: new_student.password_hash,
                is_active: true,
                is_staff: false,
                is_superuser: false,
                date_joined,
            },
            full_name: new_student.full_name,
            phone_number: new_student.phone_number,
            email_verified: false,
            phone_number_verified: false,
        }))
    }

    async fn set_password_hash(&self, account_id: Uuid, password_hash: &str) -> Result<()> {
        let query = "UPDATE accounts SET password_hash = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password hash")?;
        Ok(())
    }

    async fn set_email_verified(&self, account_id: Uuid) -> Result<()> {
        let query = "UPDATE student_profiles SET email_verified = TRUE WHERE account_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to set email verified")?;
        Ok(())
    }

    async fn set_phone_number_verified(&self, account_id: Uuid) -> Result<()> {
        let query = "UPDATE student_profiles SET phone_number_verified = TRUE WHERE account_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account_id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to set phone number verified")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_matches_sqlstate_only() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
