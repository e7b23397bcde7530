use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{DeliveryAddress, Order, OrderItem, OrderStatus, PaymentMethod};

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct OrderLineRequest {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    pub quantity: i32,
    #[validate(length(max = 200))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeliveryAddressRequest {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    pub zip_code: Option<String>,
}

impl From<DeliveryAddressRequest> for DeliveryAddress {
    fn from(req: DeliveryAddressRequest) -> Self {
        Self {
            address: req.address,
            city: req.city,
            state: req.state,
            country: req.country,
            zip_code: req.zip_code,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderLineRequest>,
    #[validate(nested)]
    pub delivery_address: DeliveryAddressRequest,
    #[validate(length(max = 500))]
    pub delivery_instructions: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(range(min = 0, message = "Tax cannot be negative"))]
    pub tax: Option<i64>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Payload of the `orderStatusUpdate` room event.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEvent {
    pub order_id: Uuid,
    pub status: OrderStatus,
}
