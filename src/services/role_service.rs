use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::roles::{RoleList, StoreRoleRequest},
    entity::{
        roles::{ActiveModel as RoleActive, Column as RoleCol, Entity as Roles},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
    response::{ApiResponse, Meta},
    services::user_service::role_from_entity,
    state::AppState,
};

fn validate(payload: &StoreRoleRequest) -> AppResult<()> {
    let mut errors = BTreeMap::new();
    if payload.role_name.trim().is_empty() {
        errors.insert("roleName".into(), "The role name field is required".into());
    } else if payload.role_name.len() > 55 {
        errors.insert(
            "roleName".into(),
            "The role name must not exceed 55 characters".into(),
        );
    }
    if let Some(desc) = &payload.description {
        if desc.len() > 255 {
            errors.insert(
                "description".into(),
                "The description must not exceed 255 characters".into(),
            );
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list_roles(state: &AppState) -> AppResult<ApiResponse<RoleList>> {
    let roles: Vec<Role> = Roles::find()
        .order_by_asc(RoleCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(role_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Roles",
        RoleList { roles },
        Some(Meta::empty()),
    ))
}

pub async fn store_role(
    state: &AppState,
    user: &AuthUser,
    payload: StoreRoleRequest,
) -> AppResult<ApiResponse<Role>> {
    validate(&payload)?;

    let taken = Roles::find()
        .filter(RoleCol::Name.eq(payload.role_name.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::field("roleName", "The role name is already taken"));
    }

    let role = RoleActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.role_name),
        description: Set(payload.description),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "role_create",
        Some("roles"),
        Some(serde_json::json!({ "role_id": role.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Role created successfully",
        role_from_entity(role),
        Some(Meta::empty()),
    ))
}

pub async fn update_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: StoreRoleRequest,
) -> AppResult<ApiResponse<Role>> {
    validate(&payload)?;

    let existing = Roles::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let taken = Roles::find()
        .filter(RoleCol::Name.eq(payload.role_name.as_str()))
        .filter(RoleCol::Id.ne(id))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::field("roleName", "The role name is already taken"));
    }

    let mut active: RoleActive = existing.into();
    active.name = Set(payload.role_name);
    active.description = Set(payload.description);
    active.updated_at = Set(Utc::now().into());
    let role = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "role_update",
        Some("roles"),
        Some(serde_json::json!({ "role_id": role.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Role updated successfully",
        role_from_entity(role),
        Some(Meta::empty()),
    ))
}

pub async fn delete_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let role = Roles::find_by_id(id).one(&state.orm).await?;
    let role = match role {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let users_with_role = Users::find()
        .filter(UserCol::RoleId.eq(id))
        .count(&state.orm)
        .await?;
    if users_with_role > 0 {
        return Err(AppError::Conflict(
            "Cannot delete role because it has associated users".into(),
        ));
    }

    Roles::delete_by_id(role.id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "role_delete",
        Some("roles"),
        Some(serde_json::json!({ "role_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Role deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
