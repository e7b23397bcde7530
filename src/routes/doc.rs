use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest},
        categories::{CategoryWithChildren, CreateCategoryRequest, UpdateCategoryRequest},
        favorites::{AddFavoriteRequest, FavoriteCheck},
        menu::{CreateMenuItemRequest, UpdateMenuItemRequest},
        notifications::{NewNotificationEvent, SendNotificationRequest, UnreadCount},
        orders::{
            CreateOrderRequest, DeliveryAddressRequest, OrderLineRequest, OrderStatusEvent,
            OrderWithItems, UpdateOrderStatusRequest,
        },
        recipes::{CreateRecipeRequest, UpdateRecipeRequest},
        restaurants::{CreateRestaurantRequest, UpdateRestaurantRequest},
        reviews::{CreateReviewRequest, UpdateReviewRequest},
        search::{SearchHit, SearchHitType},
        users::{AdminUpdateUserRequest, UpdateMeRequest},
    },
    error::ErrorBody,
    models::{
        Category, CategoryType, DeliveryAddress, Difficulty, Favorite, FavoriteType, Ingredient,
        Instruction, MenuItem, Notification, NotificationType, Order, OrderItem, OrderStatus,
        PaymentMethod, PaymentStatus, Recipe, RelatedEntity, RelatedKind, Restaurant, Review,
        Role, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, favorites, health, menu, notifications, orders, params, recipes,
        restaurants, reviews, search, users,
    },
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
        auth::signup,
        auth::login,
        auth::me,
        auth::logout,
        auth::update_password,
        users::get_me,
        users::update_me,
        users::delete_me,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        restaurants::list_restaurants,
        restaurants::create_restaurant,
        restaurants::get_restaurant,
        restaurants::list_owner_restaurants,
        restaurants::update_restaurant,
        restaurants::delete_restaurant,
        restaurants::list_menu,
        restaurants::create_menu_item,
        restaurants::list_restaurant_orders,
        restaurants::recompute_rating,
        menu::get_menu_item,
        menu::update_menu_item,
        menu::delete_menu_item,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        reviews::list_reviews,
        reviews::create_review,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::check_favorite,
        favorites::remove_favorite,
        notifications::list_notifications,
        notifications::send_notification,
        notifications::unread_count,
        notifications::mark_all_as_read,
        notifications::mark_as_read,
        notifications::delete_notification,
        recipes::list_recipes,
        recipes::create_recipe,
        recipes::get_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        search::search
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            NotificationType,
            RelatedKind,
            FavoriteType,
            Difficulty,
            CategoryType,
            User,
            Category,
            Restaurant,
            MenuItem,
            DeliveryAddress,
            Order,
            OrderItem,
            Review,
            RelatedEntity,
            Notification,
            Favorite,
            Ingredient,
            Instruction,
            Recipe,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            UpdatePasswordRequest,
            UpdateMeRequest,
            AdminUpdateUserRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryWithChildren,
            SearchHit,
            SearchHitType,
            CreateRestaurantRequest,
            UpdateRestaurantRequest,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            OrderLineRequest,
            DeliveryAddressRequest,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderStatusEvent,
            CreateReviewRequest,
            UpdateReviewRequest,
            AddFavoriteRequest,
            FavoriteCheck,
            SendNotificationRequest,
            UnreadCount,
            NewNotificationEvent,
            notifications::MarkedRead,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            params::SortOrder,
            params::RestaurantSortBy,
            params::ReviewSort,
            params::CategorySort,
            params::SearchType,
            Meta,
            ErrorBody,
            ApiResponse<User>,
            ApiResponse<Restaurant>,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<Notification>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup, login, logout and password changes"),
        (name = "Users", description = "Own profile and admin user management"),
        (name = "Categories", description = "Category tree, admin-managed"),
        (name = "Restaurants", description = "Restaurant endpoints"),
        (name = "Menu", description = "Menu item endpoints"),
        (name = "Orders", description = "Order placement and lifecycle"),
        (name = "Reviews", description = "Restaurant reviews"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Recipes", description = "Recipe endpoints"),
        (name = "Search", description = "Search over recipes and restaurants"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
