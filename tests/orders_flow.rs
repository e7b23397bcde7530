use food_platform_api::{
    dto::orders::{CreateOrderRequest, DeliveryAddressRequest, OrderLineRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::{NotificationType, OrderStatus, Role},
    realtime::{restaurant_room, user_room, ws::authorize_room},
    routes::params::NotificationQuery,
    services::{menu_service, notification_service, order_service, restaurant_service},
    state::AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

mod common;

fn order_request(restaurant_id: Uuid, lines: &[(Uuid, i32)], tax: Option<i64>) -> CreateOrderRequest {
    CreateOrderRequest {
        restaurant_id,
        items: lines
            .iter()
            .map(|(menu_item_id, quantity)| OrderLineRequest {
                menu_item_id: *menu_item_id,
                quantity: *quantity,
                notes: None,
            })
            .collect(),
        delivery_address: DeliveryAddressRequest {
            address: "42 Harbour Road".into(),
            city: "Lisbon".into(),
            state: None,
            country: "PT".into(),
            zip_code: Some("1100-001".into()),
        },
        delivery_instructions: None,
        payment_method: None,
        tax,
        notes: None,
    }
}

struct Fixture {
    state: AppState,
    owner: AuthUser,
    customer: AuthUser,
    restaurant_id: Uuid,
    item_id: Uuid,
}

async fn fixture(database_url: &str, delivery_fee: i64, minimum_order: i64) -> anyhow::Result<Fixture> {
    let state = common::setup_state(database_url).await?;
    let owner = common::create_user(&state, Role::RestaurantOwner).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let restaurant = common::create_restaurant(&state, &owner, delivery_fee, minimum_order).await?;
    let item = common::create_menu_item(&state, &owner, restaurant.id, "Dumplings", 10).await?;
    Ok(Fixture {
        state,
        owner,
        customer,
        restaurant_id: restaurant.id,
        item_id: item.id,
    })
}

#[tokio::test]
async fn owner_confirmation_emits_exactly_one_room_event() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let room = restaurant_room(f.restaurant_id);
    f.state.hub.join(&room, f.state.hub.next_connection_id(), tx);

    let created = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 2)], None),
    )
    .await?;
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.order.subtotal, 20);
    assert_eq!(created.order.total, 20);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].price, 10);

    let confirmed =
        order_service::update_order_status(&f.state, &f.owner, created.order.id, OrderStatus::Confirmed)
            .await?;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let frame = rx.try_recv().expect("status event");
    let frame: serde_json::Value = serde_json::from_str(&frame)?;
    assert_eq!(frame["event"], "orderStatusUpdate");
    assert_eq!(frame["data"]["orderId"], created.order.id.to_string());
    assert_eq!(frame["data"]["status"], "confirmed");
    assert!(rx.try_recv().is_err(), "only one event per transition");
    Ok(())
}

#[tokio::test]
async fn total_includes_delivery_fee_and_tax() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 299, 0).await?;
    let side = common::create_menu_item(&f.state, &f.owner, f.restaurant_id, "Pickles", 450).await?;

    let created = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 3), (side.id, 1)], Some(50)),
    )
    .await?;
    assert_eq!(created.order.subtotal, 30 + 450);
    assert_eq!(created.order.delivery_fee, 299);
    assert_eq!(created.order.tax, 50);
    assert_eq!(created.order.total, 480 + 299 + 50);
    Ok(())
}

#[tokio::test]
async fn orders_below_the_minimum_are_rejected() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 1000).await?;

    let result = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn other_owners_cannot_change_status() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;
    let stranger = common::create_user(&f.state, Role::RestaurantOwner).await?;

    let created = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await?;

    let result =
        order_service::update_order_status(&f.state, &stranger, created.order.id, OrderStatus::Confirmed)
            .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result =
        order_service::update_order_status(&f.state, &f.customer, created.order.id, OrderStatus::Confirmed)
            .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let reloaded = order_service::get_order(&f.state, &f.owner, created.order.id).await?;
    assert_eq!(reloaded.order.status, OrderStatus::Pending);

    let visible = order_service::get_order(&f.state, &stranger, created.order.id).await;
    assert!(matches!(visible, Err(AppError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn terminal_orders_cannot_move_backwards() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;

    let delivered = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await?
    .order
    .id;
    for next in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ] {
        order_service::update_order_status(&f.state, &f.owner, delivered, next).await?;
    }
    let result =
        order_service::update_order_status(&f.state, &f.owner, delivered, OrderStatus::Pending).await;
    assert!(matches!(
        result,
        Err(AppError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending
        })
    ));

    let cancelled = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await?
    .order
    .id;
    let order = order_service::cancel_order(&f.state, &f.customer, cancelled).await?;
    assert_eq!(order.status, OrderStatus::Cancelled);

    let result =
        order_service::update_order_status(&f.state, &f.owner, cancelled, OrderStatus::Pending).await;
    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));

    let again = order_service::cancel_order(&f.state, &f.customer, cancelled).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn referenced_restaurants_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;
    order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await?;

    let result = restaurant_service::delete_restaurant(&f.state, &f.owner, f.restaurant_id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn status_change_notifies_the_customer() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;

    let created = order_service::create_order(
        &f.state,
        &f.customer,
        order_request(f.restaurant_id, &[(f.item_id, 1)], None),
    )
    .await?;
    assert_eq!(notification_service::unread_count(&f.state, &f.customer).await?, 0);

    let (tx, mut rx) = mpsc::unbounded_channel();
    f.state
        .hub
        .join(&user_room(f.customer.user_id), f.state.hub.next_connection_id(), tx);

    order_service::update_order_status(&f.state, &f.owner, created.order.id, OrderStatus::Confirmed)
        .await?;

    let (listed, _) =
        notification_service::list_notifications(&f.state, &f.customer, NotificationQuery::default())
            .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].kind, NotificationType::OrderConfirmed);
    assert_eq!(listed[0].related_entity.as_ref().map(|r| r.id), Some(created.order.id));
    assert_eq!(notification_service::unread_count(&f.state, &f.customer).await?, 1);

    let frame: serde_json::Value = serde_json::from_str(&rx.try_recv()?)?;
    assert_eq!(frame["event"], "newNotification");
    assert_eq!(frame["data"]["unreadCount"], 1);
    assert_eq!(frame["data"]["notification"]["type"], "order_confirmed");
    Ok(())
}

#[tokio::test]
async fn rooms_are_limited_to_their_owner() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;
    let admin = common::create_user(&f.state, Role::Admin).await?;
    let restaurant = restaurant_room(f.restaurant_id);

    authorize_room(&f.state, &f.customer, &user_room(f.customer.user_id)).await?;
    authorize_room(&f.state, &f.owner, &restaurant).await?;
    authorize_room(&f.state, &admin, &restaurant).await?;

    let result = authorize_room(&f.state, &f.owner, &user_room(f.customer.user_id)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    let result = authorize_room(&f.state, &admin, &user_room(f.customer.user_id)).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    let result = authorize_room(&f.state, &f.customer, &restaurant).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = authorize_room(&f.state, &f.owner, &restaurant_room(Uuid::new_v4())).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    let result = authorize_room(&f.state, &f.owner, "lobby").await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn owner_restaurant_list_is_private_and_menu_items_are_public() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let f = fixture(&url, 0, 0).await?;
    let admin = common::create_user(&f.state, Role::Admin).await?;

    let own = restaurant_service::list_owner_restaurants(&f.state, &f.owner, f.owner.user_id).await?;
    assert_eq!(own.iter().map(|r| r.id).collect::<Vec<_>>(), vec![f.restaurant_id]);
    let seen = restaurant_service::list_owner_restaurants(&f.state, &admin, f.owner.user_id).await?;
    assert_eq!(seen.len(), 1);
    let denied =
        restaurant_service::list_owner_restaurants(&f.state, &f.customer, f.owner.user_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let item = menu_service::get_menu_item(&f.state, f.item_id).await?;
    assert_eq!(item.restaurant_id, f.restaurant_id);
    assert_eq!(item.price, 10);
    let missing = menu_service::get_menu_item(&f.state, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}
