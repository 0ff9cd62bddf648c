use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Role, User};

/// Payload for both create and update; `password` is required on create and
/// optional on update, which the service enforces.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreUserRequest {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix_name: Option<String>,
    pub age: i32,
    pub gender: String,
    pub contact: String,
    pub address: String,
    pub role_id: Uuid,
    pub email: String,
    pub password: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserWithRole>,
}
