use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Role;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreRoleRequest {
    pub role_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleList {
    pub roles: Vec<Role>,
}
