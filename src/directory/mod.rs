//! User directory: the identity store the verification flows read and write.
//!
//! The account is the ownership root; each account owns exactly one subtype
//! profile row (student or institute admin) selected by its kind tag.
//! Verification flows only touch single fields (password hash, verified
//! flags), so writes are last-write-wins with no cross-flow locking.

mod memory;
mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account kind tag. Immutable once the subtype row exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountKind {
    Student,
    InstituteAdmin,
}

impl AccountKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::InstituteAdmin => "INSTITUTE_ADMIN",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STUDENT" => Some(Self::Student),
            "INSTITUTE_ADMIN" => Some(Self::InstituteAdmin),
            _ => None,
        }
    }
}

/// Identity root shared by all user kinds.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub kind: AccountKind,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// Student extension, 1:1 with its account.
#[derive(Clone, Debug)]
pub struct StudentProfile {
    pub account: Account,
    pub full_name: String,
    pub phone_number: String,
    pub email_verified: bool,
    pub phone_number_verified: bool,
}

/// Institute admin extension, 1:1 with its account.
#[derive(Clone, Debug)]
pub struct InstituteProfile {
    pub account: Account,
    pub display_name: String,
    pub description: String,
}

/// Input for student registration. Email and phone are already normalized
/// and the password already hashed by the caller.
#[derive(Clone, Debug)]
pub struct NewStudent {
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub password_hash: String,
}

/// Outcome of a student creation attempt.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(StudentProfile),
    DuplicateEmail,
    DuplicatePhone,
}

/// The richest identity view available for a request.
///
/// `Account` is the graceful fallback when the kind tag points at a subtype
/// row that does not exist; callers must treat it as "no subtype fields".
#[derive(Clone, Debug)]
pub enum Identity {
    Student(StudentProfile),
    Institute(InstituteProfile),
    Account(Account),
}

impl Identity {
    #[must_use]
    pub fn account(&self) -> &Account {
        match self {
            Self::Student(profile) => &profile.account,
            Self::Institute(profile) => &profile.account,
            Self::Account(account) => account,
        }
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        matches!(self, Self::Student(_))
    }

    #[must_use]
    pub fn is_institute(&self) -> bool {
        matches!(self, Self::Institute(_))
    }

    #[must_use]
    pub fn email_verified(&self) -> bool {
        match self {
            Self::Student(profile) => profile.email_verified,
            _ => false,
        }
    }

    #[must_use]
    pub fn phone_number_verified(&self) -> bool {
        match self {
            Self::Student(profile) => profile.phone_number_verified,
            _ => false,
        }
    }
}

/// Identity store consumed by the verification flows.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> Result<()>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_student_by_phone(&self, phone_number: &str) -> Result<Option<StudentProfile>>;

    async fn student_profile(&self, account_id: Uuid) -> Result<Option<StudentProfile>>;

    async fn institute_profile(&self, account_id: Uuid) -> Result<Option<InstituteProfile>>;

    async fn create_student(&self, new_student: NewStudent) -> Result<CreateOutcome>;

    async fn set_password_hash(&self, account_id: Uuid, password_hash: &str) -> Result<()>;

    async fn set_email_verified(&self, account_id: Uuid) -> Result<()>;

    async fn set_phone_number_verified(&self, account_id: Uuid) -> Result<()>;
}

/// Resolve an account to its concrete subtype by kind tag.
///
/// A missing subtype row (data inconsistency) falls back to the bare account
/// rather than failing; only storage errors propagate.
pub async fn resolve(directory: &dyn UserDirectory, account: Account) -> Result<Identity> {
    match account.kind {
        AccountKind::Student => Ok(match directory.student_profile(account.id).await? {
            Some(profile) => Identity::Student(profile),
            None => Identity::Account(account),
        }),
        AccountKind::InstituteAdmin => Ok(match directory.institute_profile(account.id).await? {
            Some(profile) => Identity::Institute(profile),
            None => Identity::Account(account),
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Account, AccountKind};
    use chrono::Utc;
    use uuid::Uuid;

    pub fn account(email: &str, kind: AccountKind) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            kind,
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }
}
