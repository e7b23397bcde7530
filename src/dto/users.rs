use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

/// Fields a user may change on their own profile.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}
