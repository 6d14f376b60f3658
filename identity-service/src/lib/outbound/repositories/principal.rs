use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::Admin;
use crate::domain::identity::models::AdminRole;
use crate::domain::identity::models::Branch;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::EnrollmentYear;
use crate::domain::identity::models::Faculty;
use crate::domain::identity::models::NewAdmin;
use crate::domain::identity::models::NewFaculty;
use crate::domain::identity::models::NewStudent;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::PrincipalKind;
use crate::domain::identity::models::RollNumber;
use crate::domain::identity::models::Student;
use crate::domain::identity::ports::PrincipalRepository;

const STUDENT_COLUMNS: &str = "id, name, email, phone, password_hash, branch, enrollment_year, \
                               roll_number, semester, created_at";
const FACULTY_COLUMNS: &str =
    "id, name, email, phone, password_hash, department, designation, created_at";
const ADMIN_COLUMNS: &str = "id, name, email, phone, password_hash, role, created_at";

/// Postgres adapter over the `students`, `faculty` and `admins` tables.
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select_sql(kind: PrincipalKind, filter: &str) -> String {
        let (columns, table) = match kind {
            PrincipalKind::Student => (STUDENT_COLUMNS, "students"),
            PrincipalKind::Faculty => (FACULTY_COLUMNS, "faculty"),
            PrincipalKind::Admin => (ADMIN_COLUMNS, "admins"),
        };
        format!("SELECT {} FROM {} WHERE {} = $1", columns, table, filter)
    }

    fn row_to_student(row: &PgRow) -> Result<Student, AuthError> {
        Ok(Student {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: row.try_get("name").map_err(database_error)?,
            email: EmailAddress::new(row.try_get("email").map_err(database_error)?)?,
            phone: row.try_get("phone").map_err(database_error)?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            branch: Branch::new(row.try_get("branch").map_err(database_error)?)?,
            enrollment_year: EnrollmentYear::new(
                row.try_get("enrollment_year").map_err(database_error)?,
            )?,
            roll_number: RollNumber::from_stored(
                row.try_get("roll_number").map_err(database_error)?,
            ),
            semester: row.try_get("semester").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
        })
    }

    fn row_to_faculty(row: &PgRow) -> Result<Faculty, AuthError> {
        Ok(Faculty {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: row.try_get("name").map_err(database_error)?,
            email: EmailAddress::new(row.try_get("email").map_err(database_error)?)?,
            phone: row.try_get("phone").map_err(database_error)?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            department: row.try_get("department").map_err(database_error)?,
            designation: row.try_get("designation").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
        })
    }

    fn row_to_admin(row: &PgRow) -> Result<Admin, AuthError> {
        Ok(Admin {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: row.try_get("name").map_err(database_error)?,
            email: EmailAddress::new(row.try_get("email").map_err(database_error)?)?,
            phone: row.try_get("phone").map_err(database_error)?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            role: AdminRole::new(row.try_get("role").map_err(database_error)?)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
        })
    }

    fn row_to_principal(kind: PrincipalKind, row: &PgRow) -> Result<Principal, AuthError> {
        match kind {
            PrincipalKind::Student => Self::row_to_student(row).map(Principal::Student),
            PrincipalKind::Faculty => Self::row_to_faculty(row).map(Principal::Faculty),
            PrincipalKind::Admin => Self::row_to_admin(row).map(Principal::Admin),
        }
    }
}

pub(crate) fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::DatabaseError(e.to_string())
}

/// Map an insert failure, turning the per-store email constraint into
/// `DuplicateEmail` so a lost check-then-insert race reads the same as a
/// pre-check hit.
fn insert_error(e: sqlx::Error, kind: PrincipalKind, email: &EmailAddress) -> AuthError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let email_constraint = match kind {
                PrincipalKind::Student => "students_email_key",
                PrincipalKind::Faculty => "faculty_email_key",
                PrincipalKind::Admin => "admins_email_key",
            };
            if db_err.constraint() == Some(email_constraint) {
                return AuthError::DuplicateEmail {
                    kind,
                    email: email.to_string(),
                };
            }
        }
    }
    database_error(e)
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &EmailAddress,
    ) -> Result<Option<Principal>, AuthError> {
        let row = sqlx::query(&Self::select_sql(kind, "email"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(|r| Self::row_to_principal(kind, &r)).transpose()
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
    ) -> Result<Option<Principal>, AuthError> {
        let row = sqlx::query(&Self::select_sql(kind, "id"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(|r| Self::row_to_principal(kind, &r)).transpose()
    }

    async fn create_student(&self, student: NewStudent) -> Result<Student, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO students
                (name, email, phone, password_hash, branch, enrollment_year,
                 roll_number, semester, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&student.name)
        .bind(student.email.as_str())
        .bind(&student.phone)
        .bind(&student.password_hash)
        .bind(student.branch.as_str())
        .bind(student.enrollment_year.value())
        .bind(student.roll_number.as_str())
        .bind(student.semester)
        .bind(student.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, PrincipalKind::Student, &student.email))?;

        Ok(Student {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: student.name,
            email: student.email,
            phone: student.phone,
            password_hash: student.password_hash,
            branch: student.branch,
            enrollment_year: student.enrollment_year,
            roll_number: student.roll_number,
            semester: student.semester,
            created_at: student.created_at,
        })
    }

    async fn create_faculty(&self, faculty: NewFaculty) -> Result<Faculty, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO faculty
                (name, email, phone, password_hash, department, designation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&faculty.name)
        .bind(faculty.email.as_str())
        .bind(&faculty.phone)
        .bind(&faculty.password_hash)
        .bind(&faculty.department)
        .bind(&faculty.designation)
        .bind(faculty.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, PrincipalKind::Faculty, &faculty.email))?;

        Ok(Faculty {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: faculty.name,
            email: faculty.email,
            phone: faculty.phone,
            password_hash: faculty.password_hash,
            department: faculty.department,
            designation: faculty.designation,
            created_at: faculty.created_at,
        })
    }

    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO admins (name, email, phone, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&admin.name)
        .bind(admin.email.as_str())
        .bind(&admin.phone)
        .bind(&admin.password_hash)
        .bind(admin.role.as_str())
        .bind(admin.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, PrincipalKind::Admin, &admin.email))?;

        Ok(Admin {
            id: PrincipalId(row.try_get("id").map_err(database_error)?),
            name: admin.name,
            email: admin.email,
            phone: admin.phone,
            password_hash: admin.password_hash,
            role: admin.role,
            created_at: admin.created_at,
        })
    }

    async fn update_password(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(&update_password_sql(kind, "id"))
            .bind(password_hash)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("{} {}", kind, id)));
        }

        Ok(())
    }

    async fn next_roll_sequence(
        &self,
        branch: &Branch,
        enrollment_year: EnrollmentYear,
    ) -> Result<u32, AuthError> {
        // The counter row is locked by the upsert, so concurrent registrations
        // for the same branch and year are serialized here.
        let row = sqlx::query(
            r#"
            INSERT INTO roll_number_sequences (branch, enrollment_year, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (branch, enrollment_year)
            DO UPDATE SET last_value = roll_number_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(branch.as_str())
        .bind(enrollment_year.value())
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        let value: i32 = row.try_get("last_value").map_err(database_error)?;
        u32::try_from(value)
            .map_err(|_| AuthError::DatabaseError(format!("Invalid roll sequence: {}", value)))
    }
}

/// `UPDATE` of one store's password column; `$1` is the hash, `$2` the key.
pub(crate) fn update_password_sql(kind: PrincipalKind, key: &str) -> String {
    let table = match kind {
        PrincipalKind::Student => "students",
        PrincipalKind::Faculty => "faculty",
        PrincipalKind::Admin => "admins",
    };
    format!("UPDATE {} SET password_hash = $1 WHERE {} = $2", table, key)
}
