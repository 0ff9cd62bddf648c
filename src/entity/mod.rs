pub mod audit_logs;
pub mod feedbacks;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod roles;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use feedbacks::Entity as Feedbacks;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use roles::Entity as Roles;
pub use users::Entity as Users;
