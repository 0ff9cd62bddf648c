use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{ProductList, StoreProductRequest},
    entity::products::{
        ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

fn validate(payload: &StoreProductRequest) -> AppResult<()> {
    let mut errors = BTreeMap::new();
    if payload.product_name.trim().is_empty() {
        errors.insert(
            "productName".into(),
            "The product name field is required".into(),
        );
    } else if payload.product_name.len() > 255 {
        errors.insert(
            "productName".into(),
            "The product name must not exceed 255 characters".into(),
        );
    }
    if payload.price < 0 {
        errors.insert("price".into(), "The price must be at least 0".into());
    }
    if payload.quantity < 0 {
        errors.insert("quantity".into(), "The quantity must be at least 0".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(ProdCol::Name.contains(q.as_str()));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { products },
        Some(meta),
    ))
}

pub async fn store_product(
    state: &AppState,
    user: &AuthUser,
    payload: StoreProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate(&payload)?;

    let taken = Products::find()
        .filter(ProdCol::Name.eq(payload.product_name.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::field(
            "productName",
            "The product name is already taken",
        ));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.product_name),
        price: Set(payload.price),
        stock: Set(payload.quantity),
        image_path: Set(payload.product_image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created successfully",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: StoreProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate(&payload)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    active.name = Set(payload.product_name);
    active.price = Set(payload.price);
    active.stock = Set(payload.quantity);
    if let Some(image) = payload.product_image {
        active.image_path = Set(Some(image));
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product updated successfully",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        stock: model.stock,
        image_path: model.image_path,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
