pub mod hub;
pub mod ws;

use uuid::Uuid;

pub fn restaurant_room(restaurant_id: Uuid) -> String {
    format!("restaurant_{restaurant_id}")
}

pub fn user_room(user_id: Uuid) -> String {
    format!("user_{user_id}")
}
