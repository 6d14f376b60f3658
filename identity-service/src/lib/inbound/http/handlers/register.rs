use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::AdminRole;
use crate::domain::identity::models::Branch;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::EnrollmentYear;
use crate::domain::identity::models::NewPassword;
use crate::domain::identity::models::RegisterAdminCommand;
use crate::domain::identity::models::RegisterFacultyCommand;
use crate::domain::identity::models::RegisterStudentCommand;
use crate::domain::identity::models::RegistrationReceipt;
use crate::domain::identity::models::RequiredText;
use crate::inbound::http::router::AppState;

pub async fn register_student(
    State(state): State<AppState>,
    Json(body): Json<RegisterStudentRequest>,
) -> Result<ApiSuccess<RegistrationResponseData>, ApiError> {
    state
        .auth_service
        .register_student(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref receipt| ApiSuccess::new(StatusCode::CREATED, receipt.into()))
}

pub async fn register_faculty(
    State(state): State<AppState>,
    Json(body): Json<RegisterFacultyRequest>,
) -> Result<ApiSuccess<RegistrationResponseData>, ApiError> {
    state
        .auth_service
        .register_faculty(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref receipt| ApiSuccess::new(StatusCode::CREATED, receipt.into()))
}

pub async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<RegisterAdminRequest>,
) -> Result<ApiSuccess<RegistrationResponseData>, ApiError> {
    state
        .auth_service
        .register_admin(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref receipt| ApiSuccess::new(StatusCode::CREATED, receipt.into()))
}

/// HTTP request body for registering a student (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterStudentRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
    branch: String,
    enrollment_year: i32,
}

impl RegisterStudentRequest {
    fn try_into_command(self) -> Result<RegisterStudentCommand, AuthError> {
        Ok(RegisterStudentCommand {
            name: RequiredText::new("name", self.name, RequiredText::TEXT_MAX_LENGTH)?,
            email: EmailAddress::new(self.email)?,
            phone: RequiredText::new("phone", self.phone, RequiredText::PHONE_MAX_LENGTH)?,
            password: NewPassword::new(self.password)?,
            branch: Branch::new(self.branch)?,
            enrollment_year: EnrollmentYear::new(self.enrollment_year)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterFacultyRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
    department: String,
    designation: String,
}

impl RegisterFacultyRequest {
    fn try_into_command(self) -> Result<RegisterFacultyCommand, AuthError> {
        Ok(RegisterFacultyCommand {
            name: RequiredText::new("name", self.name, RequiredText::TEXT_MAX_LENGTH)?,
            email: EmailAddress::new(self.email)?,
            phone: RequiredText::new("phone", self.phone, RequiredText::PHONE_MAX_LENGTH)?,
            password: NewPassword::new(self.password)?,
            department: RequiredText::new(
                "department",
                self.department,
                RequiredText::TEXT_MAX_LENGTH,
            )?,
            designation: RequiredText::new(
                "designation",
                self.designation,
                RequiredText::TEXT_MAX_LENGTH,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterAdminRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
    role: String,
}

impl RegisterAdminRequest {
    fn try_into_command(self) -> Result<RegisterAdminCommand, AuthError> {
        Ok(RegisterAdminCommand {
            name: RequiredText::new("name", self.name, RequiredText::TEXT_MAX_LENGTH)?,
            email: EmailAddress::new(self.email)?,
            phone: RequiredText::new("phone", self.phone, RequiredText::PHONE_MAX_LENGTH)?,
            password: NewPassword::new(self.password)?,
            role: AdminRole::new(self.role)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationResponseData {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    pub message: String,
}

impl From<&RegistrationReceipt> for RegistrationResponseData {
    fn from(receipt: &RegistrationReceipt) -> Self {
        Self {
            id: receipt.id.0,
            name: receipt.name.clone(),
            email: receipt.email.as_str().to_string(),
            role: receipt.role.as_str().to_string(),
            roll_number: receipt.roll_number.as_ref().map(|r| r.as_str().to_string()),
            message: RegistrationReceipt::MESSAGE.to_string(),
        }
    }
}
