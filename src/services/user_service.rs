use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::users::{StoreUserRequest, UserList, UserWithRole},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        roles::{Entity as Roles, Model as RoleModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

const GENDERS: [&str; 3] = ["female", "male", "others"];

async fn validate(
    state: &AppState,
    payload: &StoreUserRequest,
    existing_id: Option<Uuid>,
) -> AppResult<()> {
    let mut errors = BTreeMap::new();

    if payload.first_name.trim().is_empty() {
        errors.insert("firstName".into(), "The first name field is required".into());
    }
    if payload.last_name.trim().is_empty() {
        errors.insert("lastName".into(), "The last name field is required".into());
    }
    if payload.age <= 0 {
        errors.insert("age".into(), "The age must be a positive number".into());
    }
    if !GENDERS.contains(&payload.gender.as_str()) {
        errors.insert("gender".into(), "The selected gender is invalid".into());
    }
    if payload.contact.trim().is_empty() {
        errors.insert("contact".into(), "The contact field is required".into());
    }
    if payload.address.trim().is_empty() {
        errors.insert("address".into(), "The address field is required".into());
    }
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        errors.insert("email".into(), "The email must be a valid email address".into());
    }
    match &payload.password {
        Some(password) if password.len() < 8 => {
            errors.insert(
                "password".into(),
                "The password must be at least 8 characters".into(),
            );
        }
        // Required on create, optional on update.
        None if existing_id.is_none() => {
            errors.insert("password".into(), "The password field is required".into());
        }
        _ => {}
    }

    let role = Roles::find_by_id(payload.role_id).one(&state.orm).await?;
    if role.is_none() {
        errors.insert("roleId".into(), "The selected role is invalid".into());
    }

    let mut email_query = Users::find().filter(UserCol::Email.eq(payload.email.as_str()));
    if let Some(id) = existing_id {
        email_query = email_query.filter(UserCol::Id.ne(id));
    }
    if email_query.one(&state.orm).await?.is_some() {
        errors.insert("email".into(), "The email has already been taken".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let users = Users::find()
        .find_also_related(Roles)
        .order_by_asc(UserCol::LastName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(user, role)| UserWithRole {
            user: user_from_entity(user),
            role: role.map(role_from_entity),
        })
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { users },
        Some(Meta::empty()),
    ))
}

pub async fn store_user(
    state: &AppState,
    caller: &AuthUser,
    payload: StoreUserRequest,
) -> AppResult<ApiResponse<User>> {
    validate(state, &payload, None).await?;

    let password = payload.password.as_deref().unwrap_or_default();
    let password_hash = hash_password(password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.first_name),
        middle_name: Set(payload.middle_name),
        last_name: Set(payload.last_name),
        suffix_name: Set(payload.suffix_name),
        age: Set(payload.age),
        gender: Set(payload.gender),
        contact: Set(payload.contact),
        address: Set(payload.address),
        role_id: Set(payload.role_id),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        profile_image: Set(payload.profile_image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(caller.user_id),
        "user_create",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User created successfully",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    caller: &AuthUser,
    id: Uuid,
    payload: StoreUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    validate(state, &payload, Some(id)).await?;

    let mut active: UserActive = existing.into();
    active.first_name = Set(payload.first_name);
    active.middle_name = Set(payload.middle_name);
    active.last_name = Set(payload.last_name);
    active.suffix_name = Set(payload.suffix_name);
    active.age = Set(payload.age);
    active.gender = Set(payload.gender);
    active.contact = Set(payload.contact);
    active.address = Set(payload.address);
    active.role_id = Set(payload.role_id);
    active.email = Set(payload.email);
    if let Some(image) = payload.profile_image {
        active.profile_image = Set(Some(image));
    }
    // Only rotate the hash when a new password was provided.
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password(password)?);
    }
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(caller.user_id),
        "user_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User updated successfully",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    caller: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find_by_id(id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let order_count = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .count(&state.orm)
        .await?;
    if order_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete user because they have associated orders".into(),
        ));
    }

    Users::delete_by_id(user.id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(caller.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        first_name: model.first_name,
        middle_name: model.middle_name,
        last_name: model.last_name,
        suffix_name: model.suffix_name,
        age: model.age,
        gender: model.gender,
        contact: model.contact,
        address: model.address,
        role_id: model.role_id,
        email: model.email,
        profile_image: model.profile_image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn role_from_entity(model: RoleModel) -> Role {
    Role {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
