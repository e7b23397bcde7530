use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    dto::orders::{CreateOrderRequest, OrderStatusEvent, OrderWithItems},
    entity::{MenuItems, OrderItems, Orders, menu_items, order_items, orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{DeliveryAddress, NotificationType, Order, OrderItem, OrderStatus, PaymentStatus, RelatedEntity, RelatedKind},
    pricing::{OrderTotals, PricedLine},
    realtime::restaurant_room,
    response::Meta,
    routes::params::{OrderListQuery, SortOrder, paginate},
    services::{
        fetch_page, from_json,
        notification_service::{NewNotification, create_notification},
        restaurant_service::find_restaurant,
        to_json,
    },
    state::AppState,
};

pub const ORDER_STATUS_EVENT: &str = "orderStatusUpdate";

pub fn order_from_entity(model: orders::Model) -> AppResult<Order> {
    let delivery_address: DeliveryAddress = from_json(model.delivery_address)?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        restaurant_id: model.restaurant_id,
        status: model.status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        delivery_address,
        delivery_instructions: model.delivery_instructions,
        subtotal: model.subtotal,
        delivery_fee: model.delivery_fee,
        tax: model.tax,
        total: model.total,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_item_from_entity(model: order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        menu_item_id: model.menu_item_id,
        quantity: model.quantity,
        price: model.price,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<orders::Model> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<orders::Model> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .order_by_asc(order_items::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(items.into_iter().map(order_item_from_entity).collect())
}

/// Prices the basket from the menu, then writes the order and its lines in
/// one transaction. The restaurant owner is notified after commit.
pub async fn create_order(
    state: &AppState,
    customer: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<OrderWithItems> {
    payload.validate()?;

    let restaurant = find_restaurant(&state.orm, payload.restaurant_id).await?;
    if !restaurant.is_open {
        return Err(AppError::BadRequest("Restaurant is currently closed".into()));
    }

    let ids: Vec<Uuid> = payload.items.iter().map(|line| line.menu_item_id).collect();
    let menu: HashMap<Uuid, menu_items::Model> = MenuItems::find()
        .filter(menu_items::Column::Id.is_in(ids))
        .filter(menu_items::Column::RestaurantId.eq(restaurant.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut priced = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = menu.get(&line.menu_item_id).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Menu item {} is not on this restaurant's menu",
                line.menu_item_id
            ))
        })?;
        if !item.is_available {
            return Err(AppError::BadRequest(format!(
                "{} is currently unavailable",
                item.name
            )));
        }
        priced.push(PricedLine {
            unit_price: item.price,
            quantity: line.quantity,
        });
    }

    let totals = OrderTotals::compute(&priced, restaurant.delivery_fee, payload.tax.unwrap_or(0))?;
    if totals.subtotal < restaurant.minimum_order {
        return Err(AppError::BadRequest(format!(
            "Minimum order amount is {}",
            restaurant.minimum_order
        )));
    }

    let delivery_address = to_json(&DeliveryAddress::from(payload.delivery_address))?;

    let txn = state.orm.begin().await?;
    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.user_id),
        restaurant_id: Set(restaurant.id),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(payload.payment_method.unwrap_or_default()),
        delivery_address: Set(delivery_address),
        delivery_instructions: Set(payload.delivery_instructions),
        subtotal: Set(totals.subtotal),
        delivery_fee: Set(totals.delivery_fee),
        tax: Set(totals.tax),
        total: Set(totals.total),
        notes: Set(payload.notes),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for (line, price) in payload.items.into_iter().zip(&priced) {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(line.menu_item_id),
            quantity: Set(line.quantity),
            price: Set(price.unit_price),
            notes: Set(line.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }
    txn.commit().await?;

    tracing::info!(order_id = %order.id, restaurant_id = %restaurant.id, total = order.total, "order created");

    let notice = NewNotification::new(
        restaurant.owner_id,
        NotificationType::OrderReceived,
        "New order received",
        format!("You have received a new order #{}.", short_id(order.id)),
    )
    .related(RelatedEntity {
        kind: RelatedKind::Order,
        id: order.id,
    })
    .metadata(json!({ "orderId": order.id, "total": order.total }));
    if let Err(err) = create_notification(state, notice).await {
        tracing::warn!(order_id = %order.id, error = %err, "owner notification failed");
    }

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(customer.user_id),
            "order_create",
            "orders",
            json!({ "order_id": order.id, "total": order.total }),
        ),
    )
    .await;

    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
    })
}

/// Customers see their own orders; admins see everything.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Orders::find();
    if !user.is_admin() {
        finder = finder.filter(orders::Column::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status {
        finder = finder.filter(orders::Column::Status.eq(status));
    }
    if let Some(restaurant_id) = query.restaurant_id {
        finder = finder.filter(orders::Column::RestaurantId.eq(restaurant_id));
    }
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(orders::Column::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(orders::Column::CreatedAt),
    };

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items = rows
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn list_restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    query: OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    let restaurant = find_restaurant(&state.orm, restaurant_id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;

    let (page, limit, offset) = paginate(query.page, query.limit);
    let mut finder = Orders::find().filter(orders::Column::RestaurantId.eq(restaurant_id));
    if let Some(status) = query.status {
        finder = finder.filter(orders::Column::Status.eq(status));
    }
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(orders::Column::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(orders::Column::CreatedAt),
    };

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items = rows
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

/// Visible to the customer who placed it, the restaurant owner and admins.
pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderWithItems> {
    let order = find_order(&state.orm, id).await?;
    if order.user_id != user.user_id {
        let restaurant = find_restaurant(&state.orm, order.restaurant_id).await?;
        ensure_owner_or_admin(restaurant.owner_id, user)?;
    }
    let items = load_items(&state.orm, order.id).await?;
    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
    })
}

async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
    next: OrderStatus,
) -> AppResult<orders::Model> {
    if !order.status.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: next,
        });
    }
    let mut active: orders::ActiveModel = order.into();
    active.status = Set(next);
    Ok(active.update(conn).await?)
}

/// Room event plus customer notification for a committed status change.
/// Failures here are logged; the status change itself already stands.
async fn announce_status_change(state: &AppState, order: &orders::Model) {
    let event = OrderStatusEvent {
        order_id: order.id,
        status: order.status,
    };
    if let Err(err) = state
        .hub
        .emit(&restaurant_room(order.restaurant_id), ORDER_STATUS_EVENT, event)
    {
        tracing::warn!(order_id = %order.id, error = %err, "status event failed");
    }

    let Some((kind, message)) = order.status.customer_notification() else {
        return;
    };
    let notice = NewNotification::new(
        order.user_id,
        kind,
        format!("Order #{} {}", short_id(order.id), order.status),
        message,
    )
    .related(RelatedEntity {
        kind: RelatedKind::Order,
        id: order.id,
    })
    .metadata(json!({ "orderId": order.id, "status": order.status }));
    if let Err(err) = create_notification(state, notice).await {
        tracing::warn!(order_id = %order.id, error = %err, "customer notification failed");
    }
}

/// Moves an order along its lifecycle. Only the restaurant owner or an admin
/// may do this; the row stays locked from read to write.
pub async fn update_order_status(
    state: &AppState,
    actor: &AuthUser,
    order_id: Uuid,
    next: OrderStatus,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    let restaurant = find_restaurant(&txn, order.restaurant_id).await?;
    ensure_owner_or_admin(restaurant.owner_id, actor)?;

    let from = order.status;
    let updated = apply_transition(&txn, order, next).await?;
    txn.commit().await?;

    tracing::info!(%order_id, %from, to = %next, actor = %actor.user_id, "order status changed");
    announce_status_change(state, &updated).await;
    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(actor.user_id),
            "order_status_update",
            "orders",
            json!({ "order_id": order_id, "from": from, "to": next }),
        ),
    )
    .await;

    order_from_entity(updated)
}

/// Lets the customer withdraw an order the restaurant has not confirmed yet.
pub async fn cancel_order(state: &AppState, customer: &AuthUser, order_id: Uuid) -> AppResult<Order> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    if order.user_id != customer.user_id {
        return Err(AppError::forbidden("You can only cancel your own orders"));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(
            "Orders can only be cancelled while pending".into(),
        ));
    }

    let updated = apply_transition(&txn, order, OrderStatus::Cancelled).await?;
    txn.commit().await?;

    tracing::info!(%order_id, "order cancelled by customer");
    announce_status_change(state, &updated).await;
    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(customer.user_id),
            "order_cancel",
            "orders",
            json!({ "order_id": order_id }),
        ),
    )
    .await;

    order_from_entity(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_eight_uppercase_hex_chars() {
        let id = Uuid::parse_str("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0").unwrap();
        assert_eq!(short_id(id), "0F1E2D3C");
    }
}
