use sea_orm::{ActiveValue, Value};

pub mod audit_logs;
pub mod categories;
pub mod favorites;
pub mod menu_items;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod recipes;
pub mod restaurants;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use menu_items::Entity as MenuItems;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use recipes::Entity as Recipes;
pub use restaurants::Entity as Restaurants;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;

/// Value an active field will hold after save, if it holds one at all.
pub(crate) fn current_value<V>(value: &ActiveValue<V>) -> Option<V>
where
    V: Into<Value> + Clone,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}
