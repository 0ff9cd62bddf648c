pub mod auth;
pub mod feedbacks;
pub mod orders;
pub mod products;
pub mod roles;
pub mod users;
