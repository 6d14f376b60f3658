//! Mocks and fixtures shared by the domain unit tests.

use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use mockall::mock;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::errors::NotificationError;
use crate::domain::identity::models::Admin;
use crate::domain::identity::models::AdminRole;
use crate::domain::identity::models::Branch;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::EnrollmentYear;
use crate::domain::identity::models::Faculty;
use crate::domain::identity::models::NewAdmin;
use crate::domain::identity::models::NewFaculty;
use crate::domain::identity::models::NewStudent;
use crate::domain::identity::models::PasswordResetNotice;
use crate::domain::identity::models::PasswordResetToken;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::PrincipalKind;
use crate::domain::identity::models::RollNumber;
use crate::domain::identity::models::Student;
use crate::domain::identity::ports::PrincipalRepository;
use crate::domain::identity::ports::ResetNotifier;
use crate::domain::identity::ports::ResetTokenRepository;

mock! {
    pub TestPrincipalRepository {}

    #[async_trait]
    impl PrincipalRepository for TestPrincipalRepository {
        async fn find_by_email(&self, kind: PrincipalKind, email: &EmailAddress) -> Result<Option<Principal>, AuthError>;
        async fn find_by_id(&self, kind: PrincipalKind, id: PrincipalId) -> Result<Option<Principal>, AuthError>;
        async fn create_student(&self, student: NewStudent) -> Result<Student, AuthError>;
        async fn create_faculty(&self, faculty: NewFaculty) -> Result<Faculty, AuthError>;
        async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AuthError>;
        async fn update_password(&self, kind: PrincipalKind, id: PrincipalId, password_hash: &str) -> Result<(), AuthError>;
        async fn next_roll_sequence(&self, branch: &Branch, enrollment_year: EnrollmentYear) -> Result<u32, AuthError>;
    }
}

mock! {
    pub TestResetTokenRepository {}

    #[async_trait]
    impl ResetTokenRepository for TestResetTokenRepository {
        async fn create(&self, token: PasswordResetToken) -> Result<(), AuthError>;
        async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AuthError>;
        async fn redeem(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> Result<(), AuthError>;
        async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
    }
}

mock! {
    pub TestResetNotifier {}

    #[async_trait]
    impl ResetNotifier for TestResetNotifier {
        async fn deliver(&self, notice: &PasswordResetNotice) -> Result<(), NotificationError>;
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap()
}

pub fn student(id: i64, email: &str, password_hash: &str) -> Student {
    let branch = Branch::new("CSE".to_string()).unwrap();
    let year = EnrollmentYear::new(2024).unwrap();
    Student {
        id: PrincipalId(id),
        name: "Rahul Sharma".to_string(),
        email: EmailAddress::new(email.to_string()).unwrap(),
        phone: "9876543210".to_string(),
        password_hash: password_hash.to_string(),
        roll_number: RollNumber::new(&branch, year, id as u32),
        branch,
        enrollment_year: year,
        semester: 1,
        created_at: fixed_now(),
    }
}

pub fn faculty(id: i64, email: &str, password_hash: &str) -> Faculty {
    Faculty {
        id: PrincipalId(id),
        name: "Dr. Meera Iyer".to_string(),
        email: EmailAddress::new(email.to_string()).unwrap(),
        phone: "9123456780".to_string(),
        password_hash: password_hash.to_string(),
        department: "Computer Science".to_string(),
        designation: "Professor".to_string(),
        created_at: fixed_now(),
    }
}

pub fn admin(id: i64, email: &str, password_hash: &str, role: &str) -> Admin {
    Admin {
        id: PrincipalId(id),
        name: "Anita Rao".to_string(),
        email: EmailAddress::new(email.to_string()).unwrap(),
        phone: "9000000001".to_string(),
        password_hash: password_hash.to_string(),
        role: AdminRole::new(role.to_string()).unwrap(),
        created_at: fixed_now(),
    }
}
