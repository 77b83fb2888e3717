//! In-memory directory for local development and handler tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Account, AccountKind, CreateOutcome, InstituteProfile, NewStudent, StudentProfile,
    UserDirectory,
};

#[derive(Clone, Debug, Default)]
struct StudentFields {
    full_name: String,
    phone_number: String,
    email_verified: bool,
    phone_number_verified: bool,
}

#[derive(Clone, Debug, Default)]
struct InstituteFields {
    display_name: String,
    description: String,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    students: HashMap<Uuid, StudentFields>,
    institutes: HashMap<Uuid, InstituteFields>,
}

/// Directory backed by process memory. Keeps the same semantics as the
/// Postgres implementation (unique email/phone, 1:1 subtype rows) without
/// needing a database.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: RwLock<Inner>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bare account, with or without a subtype row.
    pub async fn insert_account(&self, account: Account) {
        let mut inner = self.inner.write().await;
        inner.accounts.insert(account.id, account);
    }

    /// Seed a student profile together with its account.
    pub async fn insert_student(&self, profile: StudentProfile) {
        let mut inner = self.inner.write().await;
        inner.students.insert(
            profile.account.id,
            StudentFields {
                full_name: profile.full_name,
                phone_number: profile.phone_number,
                email_verified: profile.email_verified,
                phone_number_verified: profile.phone_number_verified,
            },
        );
        inner.accounts.insert(profile.account.id, profile.account);
    }

    /// Seed an institute profile together with its account.
    pub async fn insert_institute(&self, profile: InstituteProfile) {
        let mut inner = self.inner.write().await;
        inner.institutes.insert(
            profile.account.id,
            InstituteFields {
                display_name: profile.display_name,
                description: profile.description,
            },
        );
        inner.accounts.insert(profile.account.id, profile.account);
    }
}

impl Inner {
    fn student(&self, account_id: Uuid) -> Option<StudentProfile> {
        let account = self.accounts.get(&account_id)?;
        let fields = self.students.get(&account_id)?;
        Some(StudentProfile {
            account: account.clone(),
            full_name: fields.full_name.clone(),
            phone_number: fields.phone_number.clone(),
            email_verified: fields.email_verified,
            phone_number_verified: fields.phone_number_verified,
        })
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn find_student_by_phone(&self, phone_number: &str) -> Result<Option<StudentProfile>> {
        let inner = self.inner.read().await;
        let account_id = inner
            .students
            .iter()
            .find(|(_, fields)| fields.phone_number == phone_number)
            .map(|(id, _)| *id);
        Ok(account_id.and_then(|id| inner.student(id)))
    }

    async fn student_profile(&self, account_id: Uuid) -> Result<Option<StudentProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.student(account_id))
    }

    async fn institute_profile(&self, account_id: Uuid) -> Result<Option<InstituteProfile>> {
        let inner = self.inner.read().await;
        let Some(account) = inner.accounts.get(&account_id) else {
            return Ok(None);
        };
        Ok(inner.institutes.get(&account_id).map(|fields| {
            InstituteProfile {
                account: account.clone(),
                display_name: fields.display_name.clone(),
                description: fields.description.clone(),
            }
        }))
    }

    async fn create_student(&self, new_student: NewStudent) -> Result<CreateOutcome> {
        let mut inner = self.inner.write().await;
        if inner
            .accounts
            .values()
            .any(|account| account.email == new_student.email)
        {
            return Ok(CreateOutcome::DuplicateEmail);
        }
        if inner
            .students
            .values()
            .any(|fields| fields.phone_number == new_student.phone_number)
        {
            return Ok(CreateOutcome::DuplicatePhone);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: new_student.email,
            kind: AccountKind::Student,
            password_hash: new_student.password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        };
        inner.students.insert(
            account.id,
            StudentFields {
                full_name: new_student.full_name,
                phone_number: new_student.phone_number,
                ..StudentFields::default()
            },
        );
        inner.accounts.insert(account.id, account.clone());

        let profile = inner
            .student(account.id)
            .ok_or_else(|| anyhow::anyhow!("student row vanished after insert"))?;
        Ok(CreateOutcome::Created(profile))
    }

    async fn set_password_hash(&self, account_id: Uuid, password_hash: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(account) = inner.accounts.get_mut(&account_id) {
            account.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_email_verified(&self, account_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(fields) = inner.students.get_mut(&account_id) {
            fields.email_verified = true;
        }
        Ok(())
    }

    async fn set_phone_number_verified(&self, account_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(fields) = inner.students.get_mut(&account_id) {
            fields.phone_number_verified = true;
        }
        Ok(())
    }
}
