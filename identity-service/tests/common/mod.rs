#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::Clock;
use auth::ManualClock;
use auth::PasswordHasher;
use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use identity_service::domain::identity::errors::AuthError;
use identity_service::domain::identity::errors::NotificationError;
use identity_service::domain::identity::models::Admin;
use identity_service::domain::identity::models::Branch;
use identity_service::domain::identity::models::EmailAddress;
use identity_service::domain::identity::models::EnrollmentYear;
use identity_service::domain::identity::models::Faculty;
use identity_service::domain::identity::models::NewAdmin;
use identity_service::domain::identity::models::NewFaculty;
use identity_service::domain::identity::models::NewStudent;
use identity_service::domain::identity::models::PasswordResetNotice;
use identity_service::domain::identity::models::PasswordResetToken;
use identity_service::domain::identity::models::Principal;
use identity_service::domain::identity::models::PrincipalId;
use identity_service::domain::identity::models::PrincipalKind;
use identity_service::domain::identity::models::Student;
use identity_service::domain::identity::ports::AuthServicePort;
use identity_service::domain::identity::ports::PrincipalRepository;
use identity_service::domain::identity::ports::ResetNotifier;
use identity_service::domain::identity::ports::ResetTokenRepository;
use identity_service::domain::identity::service::AuthService;
use identity_service::domain::identity::service::PasswordResetSettings;
use identity_service::inbound::http::router::create_router;
use serde_json::json;
use serde_json::Value;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const RESET_LINK_BASE: &str = "http://localhost:3000/reset-password";

/// In-memory stand-in for the Postgres stores.
///
/// One lock covers every table so `redeem` is atomic the same way the
/// database transaction is.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    students: Vec<Student>,
    faculty: Vec<Faculty>,
    admins: Vec<Admin>,
    roll_sequences: HashMap<(String, i32), u32>,
    reset_tokens: Vec<PasswordResetToken>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> PrincipalId {
        self.next_id += 1;
        PrincipalId(self.next_id)
    }

    fn find(
        &self,
        kind: PrincipalKind,
        matches: impl Fn(PrincipalId, &EmailAddress) -> bool,
    ) -> Option<Principal> {
        match kind {
            PrincipalKind::Student => self
                .students
                .iter()
                .find(|s| matches(s.id, &s.email))
                .cloned()
                .map(Principal::Student),
            PrincipalKind::Faculty => self
                .faculty
                .iter()
                .find(|f| matches(f.id, &f.email))
                .cloned()
                .map(Principal::Faculty),
            PrincipalKind::Admin => self
                .admins
                .iter()
                .find(|a| matches(a.id, &a.email))
                .cloned()
                .map(Principal::Admin),
        }
    }

    fn set_password(
        &mut self,
        kind: PrincipalKind,
        matches: impl Fn(PrincipalId, &EmailAddress) -> bool,
        password_hash: &str,
    ) -> bool {
        let slot = match kind {
            PrincipalKind::Student => self
                .students
                .iter_mut()
                .find(|s| matches(s.id, &s.email))
                .map(|s| &mut s.password_hash),
            PrincipalKind::Faculty => self
                .faculty
                .iter_mut()
                .find(|f| matches(f.id, &f.email))
                .map(|f| &mut f.password_hash),
            PrincipalKind::Admin => self
                .admins
                .iter_mut()
                .find(|a| matches(a.id, &a.email))
                .map(|a| &mut a.password_hash),
        };

        match slot {
            Some(hash) => {
                *hash = password_hash.to_string();
                true
            }
            None => false,
        }
    }
}

impl InMemoryStore {
    pub fn reset_tokens(&self) -> Vec<PasswordResetToken> {
        self.tables.lock().unwrap().reset_tokens.clone()
    }

    fn duplicate(kind: PrincipalKind, email: &EmailAddress) -> AuthError {
        AuthError::DuplicateEmail {
            kind,
            email: email.to_string(),
        }
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryStore {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &EmailAddress,
    ) -> Result<Option<Principal>, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.find(kind, |_, e| e == email))
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
    ) -> Result<Option<Principal>, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.find(kind, |i, _| i == id))
    }

    async fn create_student(&self, student: NewStudent) -> Result<Student, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.students.iter().any(|s| s.email == student.email) {
            return Err(Self::duplicate(PrincipalKind::Student, &student.email));
        }
        let created = Student {
            id: tables.next_id(),
            name: student.name,
            email: student.email,
            phone: student.phone,
            password_hash: student.password_hash,
            branch: student.branch,
            enrollment_year: student.enrollment_year,
            roll_number: student.roll_number,
            semester: student.semester,
            created_at: student.created_at,
        };
        tables.students.push(created.clone());
        Ok(created)
    }

    async fn create_faculty(&self, faculty: NewFaculty) -> Result<Faculty, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.faculty.iter().any(|f| f.email == faculty.email) {
            return Err(Self::duplicate(PrincipalKind::Faculty, &faculty.email));
        }
        let created = Faculty {
            id: tables.next_id(),
            name: faculty.name,
            email: faculty.email,
            phone: faculty.phone,
            password_hash: faculty.password_hash,
            department: faculty.department,
            designation: faculty.designation,
            created_at: faculty.created_at,
        };
        tables.faculty.push(created.clone());
        Ok(created)
    }

    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.admins.iter().any(|a| a.email == admin.email) {
            return Err(Self::duplicate(PrincipalKind::Admin, &admin.email));
        }
        let created = Admin {
            id: tables.next_id(),
            name: admin.name,
            email: admin.email,
            phone: admin.phone,
            password_hash: admin.password_hash,
            role: admin.role,
            created_at: admin.created_at,
        };
        tables.admins.push(created.clone());
        Ok(created)
    }

    async fn update_password(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.set_password(kind, |i, _| i == id, password_hash) {
            Ok(())
        } else {
            Err(AuthError::NotFound(format!("{} {}", kind, id)))
        }
    }

    async fn next_roll_sequence(
        &self,
        branch: &Branch,
        enrollment_year: EnrollmentYear,
    ) -> Result<u32, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        let counter = tables
            .roll_sequences
            .entry((branch.as_str().to_string(), enrollment_year.value()))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[async_trait]
impl ResetTokenRepository for InMemoryStore {
    async fn create(&self, token: PasswordResetToken) -> Result<(), AuthError> {
        self.tables.lock().unwrap().reset_tokens.push(token);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AuthError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.reset_tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut tables = self.tables.lock().unwrap();

        let Some(index) = tables
            .reset_tokens
            .iter()
            .position(|t| t.token == token && t.is_consumable(now))
        else {
            return Err(AuthError::InvalidToken);
        };

        let email = tables.reset_tokens[index].email.clone();
        let kind = tables.reset_tokens[index].user_type;
        if !tables.set_password(kind, |_, e| *e == email, password_hash) {
            return Err(AuthError::NotFound(format!("{} {}", kind, email)));
        }
        tables.reset_tokens[index].used = true;

        Ok(())
    }

    async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.reset_tokens.len();
        tables
            .reset_tokens
            .retain(|t| t.used || t.expiry_date > now);
        Ok((before - tables.reset_tokens.len()) as u64)
    }
}

/// Notifier that keeps every notice so tests can read the reset token.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<PasswordResetNotice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<PasswordResetNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last_token(&self) -> Option<String> {
        self.notices.lock().unwrap().last().map(|n| n.token.clone())
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn deliver(&self, notice: &PasswordResetNotice) -> Result<(), NotificationError> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(start_time()));

        // Cheap hashing parameters keep the suite fast
        let authenticator = Arc::new(
            Authenticator::new(JWT_SECRET, Duration::hours(24))
                .with_password_hasher(PasswordHasher::with_cost(1024, 1, 1).unwrap()),
        );

        let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&authenticator),
            clock.clone(),
            PasswordResetSettings {
                token_lifetime: Duration::minutes(30),
                link_base_url: RESET_LINK_BASE.to_string(),
            },
        ));

        let admin_roles: HashSet<String> = ["SuperAdmin", "Admin", "Accountant"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let router = create_router(
            auth_service,
            Arc::clone(&authenticator),
            clock.clone(),
            admin_roles,
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            store,
            notifier,
            clock,
            authenticator,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    pub async fn register_student(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/student/register")
            .json(&json!({
                "name": "Alice",
                "email": email,
                "phone": "9876543210",
                "password": password,
                "branch": "CSE",
                "enrollment_year": 2024
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn register_faculty(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/faculty/register")
            .json(&json!({
                "name": "Meera Iyer",
                "email": email,
                "phone": "9123456780",
                "password": password,
                "department": "Computer Science",
                "designation": "Professor"
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn register_admin(
        &self,
        email: &str,
        password: &str,
        role: &str,
    ) -> reqwest::Response {
        self.post("/api/auth/admin/register")
            .json(&json!({
                "name": "Anita Rao",
                "email": email,
                "phone": "9000000001",
                "password": password,
                "role": role
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, path: &str, email: &str, password: &str) -> reqwest::Response {
        self.post(path)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the bearer token, panicking on failure
    pub async fn token_for(&self, path: &str, email: &str, password: &str) -> String {
        let response = self.login(path, email, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    pub async fn forgot_password(&self, email: &str) -> reqwest::Response {
        self.post("/api/auth/forgot-password")
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> reqwest::Response {
        self.post("/api/auth/reset-password")
            .json(&json!({ "token": token, "new_password": new_password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
