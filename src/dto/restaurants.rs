use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRestaurantRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: String,
    pub cuisine: Option<String>,
    #[validate(length(min = 5, max = 20, message = "Please provide a valid phone number"))]
    pub phone: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(range(min = 0, message = "Delivery fee cannot be negative"))]
    pub delivery_fee: Option<i64>,
    #[validate(range(min = 0, message = "Minimum order cannot be negative"))]
    pub minimum_order: Option<i64>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateRestaurantRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub cuisine: Option<String>,
    #[validate(length(min = 5, max = 20, message = "Please provide a valid phone number"))]
    pub phone: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: Option<String>,
    #[validate(range(min = 0, message = "Delivery fee cannot be negative"))]
    pub delivery_fee: Option<i64>,
    #[validate(range(min = 0, message = "Minimum order cannot be negative"))]
    pub minimum_order: Option<i64>,
    pub is_open: Option<bool>,
}
