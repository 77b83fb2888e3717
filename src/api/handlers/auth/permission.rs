//! Role gates guarding flow entry points.
//!
//! An unauthenticated request never reaches a gate (`require_auth` returns
//! 401 first). Superuser and staff accounts pass every gate; everyone else
//! must match the gate's kind or flag.

use axum::http::StatusCode;

use crate::directory::Identity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleGate {
    Student,
    InstituteAdmin,
    EmailVerified,
    PhoneVerified,
}

impl RoleGate {
    #[must_use]
    pub fn allows(self, identity: &Identity) -> bool {
        let account = identity.account();
        if account.is_superuser || account.is_staff {
            return true;
        }
        match self {
            Self::Student => identity.is_student(),
            Self::InstituteAdmin => identity.is_institute(),
            Self::EmailVerified => identity.is_student() && identity.email_verified(),
            Self::PhoneVerified => identity.is_student() && identity.phone_number_verified(),
        }
    }
}

/// Gate check as a handler precondition.
pub fn require_role(identity: &Identity, gate: RoleGate) -> Result<(), StatusCode> {
    if gate.allows(identity) {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_support::account;
    use crate::directory::{AccountKind, Identity, InstituteProfile, StudentProfile};

    fn student(email_verified: bool, phone_verified: bool) -> Identity {
        Identity::Student(StudentProfile {
            account: account("student@example.com", AccountKind::Student),
            full_name: "Student".to_string(),
            phone_number: "+919999999999".to_string(),
            email_verified,
            phone_number_verified: phone_verified,
        })
    }

    fn institute() -> Identity {
        Identity::Institute(InstituteProfile {
            account: account("admin@institute.example", AccountKind::InstituteAdmin),
            display_name: "Institute".to_string(),
            description: String::new(),
        })
    }

    #[test]
    fn student_gate_matches_kind() {
        assert!(RoleGate::Student.allows(&student(false, false)));
        assert!(!RoleGate::Student.allows(&institute()));
        assert!(!RoleGate::InstituteAdmin.allows(&student(false, false)));
        assert!(RoleGate::InstituteAdmin.allows(&institute()));
    }

    #[test]
    fn verified_gates_need_the_flag() {
        assert!(!RoleGate::EmailVerified.allows(&student(false, false)));
        assert!(RoleGate::EmailVerified.allows(&student(true, false)));
        assert!(!RoleGate::PhoneVerified.allows(&student(true, false)));
        assert!(RoleGate::PhoneVerified.allows(&student(false, true)));
    }

    #[test]
    fn superuser_passes_every_gate() {
        let mut root = account("root@example.com", AccountKind::InstituteAdmin);
        root.is_superuser = true;
        let identity = Identity::Account(root);

        assert!(RoleGate::Student.allows(&identity));
        assert!(RoleGate::InstituteAdmin.allows(&identity));
        assert!(RoleGate::EmailVerified.allows(&identity));
        assert!(RoleGate::PhoneVerified.allows(&identity));
    }

    #[test]
    fn bare_account_without_privileges_fails_all_gates() {
        let identity = Identity::Account(account("ghost@example.com", AccountKind::Student));
        assert!(!RoleGate::Student.allows(&identity));
        assert!(require_role(&identity, RoleGate::Student).is_err());
    }
}
