use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    access::NavItem,
    dto::{
        auth::{LoginRequest, LoginResponse},
        feedbacks::{FeedbackList, FeedbackWithOrder, StoreFeedbackRequest},
        orders::{OrderItemWithProduct, OrderList, OrderWithItems, StoreOrderRequest},
        products::{ProductList, StoreProductRequest},
        roles::{RoleList, StoreRoleRequest},
        users::{StoreUserRequest, UserList, UserWithRole},
    },
    models::{Feedback, Order, OrderItem, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{auth, feedbacks, health, orders, params, products, roles, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::logout,
        auth::whoami,
        auth::navigation,
        roles::load_roles,
        roles::store_role,
        roles::update_role,
        roles::delete_role,
        users::load_users,
        users::store_user,
        users::update_user,
        users::delete_user,
        products::load_products,
        products::store_product,
        products::update_product,
        products::delete_product,
        orders::load_orders,
        orders::store_order,
        orders::get_order,
        orders::cancel_order,
        feedbacks::store_feedback,
        feedbacks::load_feedbacks,
    ),
    components(
        schemas(
            Role,
            User,
            Product,
            Order,
            OrderItem,
            Feedback,
            NavItem,
            auth::NavigationData,
            LoginRequest,
            LoginResponse,
            StoreRoleRequest,
            RoleList,
            StoreUserRequest,
            UserWithRole,
            UserList,
            StoreProductRequest,
            ProductList,
            StoreOrderRequest,
            OrderItemWithProduct,
            OrderWithItems,
            OrderList,
            StoreFeedbackRequest,
            FeedbackWithOrder,
            FeedbackList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<UserList>,
            ApiResponse<RoleList>,
            ApiResponse<FeedbackList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and session endpoints"),
        (name = "Roles", description = "Role administration"),
        (name = "Users", description = "User administration"),
        (name = "Products", description = "Product and stock administration"),
        (name = "Orders", description = "POS checkout and order history"),
        (name = "Feedbacks", description = "Customer feedback"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
