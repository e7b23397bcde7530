use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    dto::categories::{CategoryWithChildren, CreateCategoryRequest, UpdateCategoryRequest},
    entity::{Categories, categories},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::Meta,
    routes::params::{CategoryQuery, CategorySort, paginate},
    services::fetch_page,
    state::AppState,
};

pub fn category_from_entity(model: categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        kind: model.kind,
        icon: model.icon,
        parent_id: model.parent_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

async fn find_category<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))
}

async fn find_parent<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Parent category"))
}

/// Walks up from `parent_id` and fails if `category_id` shows up on the way,
/// which would close a cycle.
async fn ensure_not_descendant<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
    parent_id: Uuid,
) -> AppResult<()> {
    let mut cursor = Some(parent_id);
    while let Some(id) = cursor {
        if id == category_id {
            return Err(AppError::BadRequest(
                "A category cannot be its own parent or a child of its descendants".into(),
            ));
        }
        cursor = find_parent(conn, id).await?.parent_id;
    }
    Ok(())
}

pub async fn list_categories(
    state: &AppState,
    query: CategoryQuery,
) -> AppResult<(Vec<Category>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Categories::find();
    if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        finder = finder.filter(Expr::col(categories::Column::Name).ilike(format!("%{name}%")));
    }
    if let Some(kind) = query.kind {
        finder = finder.filter(categories::Column::Kind.eq(kind));
    }
    if let Some(parent_id) = query.parent_id {
        finder = finder.filter(categories::Column::ParentId.eq(parent_id));
    }
    finder = match query.sort.unwrap_or(CategorySort::NameAsc) {
        CategorySort::NameAsc => finder.order_by_asc(categories::Column::Name),
        CategorySort::NameDesc => finder.order_by_desc(categories::Column::Name),
        CategorySort::Newest => finder.order_by_desc(categories::Column::CreatedAt),
    };

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<Category> = rows.into_iter().map(category_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<CategoryWithChildren> {
    let category = find_category(&state.orm, id).await?;
    let children = Categories::find()
        .filter(categories::Column::ParentId.eq(id))
        .order_by_asc(categories::Column::Name)
        .all(&state.orm)
        .await?;
    Ok(CategoryWithChildren {
        category: category_from_entity(category),
        children: children.into_iter().map(category_from_entity).collect(),
    })
}

pub async fn create_category(
    state: &AppState,
    admin: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<Category> {
    ensure_admin(admin)?;
    payload.validate()?;
    if let Some(parent_id) = payload.parent_id {
        find_parent(&state.orm, parent_id).await?;
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        kind: Set(payload.kind),
        icon: Set(payload.icon),
        parent_id: Set(payload.parent_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(admin.user_id),
            "category_create",
            "categories",
            json!({ "category_id": category.id }),
        ),
    )
    .await;
    Ok(category_from_entity(category))
}

pub async fn update_category(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<Category> {
    ensure_admin(admin)?;
    payload.validate()?;
    let category = find_category(&state.orm, id).await?;
    if let Some(Some(parent_id)) = payload.parent_id {
        ensure_not_descendant(&state.orm, id, parent_id).await?;
    }

    let mut model: categories::ActiveModel = category.into();
    if let Some(name) = payload.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        model.description = Set(Some(description));
    }
    if let Some(kind) = payload.kind {
        model.kind = Set(kind);
    }
    if let Some(icon) = payload.icon {
        model.icon = Set(Some(icon));
    }
    if let Some(parent_id) = payload.parent_id {
        model.parent_id = Set(parent_id);
    }
    model.updated_at = Set(Utc::now().into());
    let updated = model.update(&state.orm).await?;
    Ok(category_from_entity(updated))
}

/// Removes the category; the foreign key cascades to every descendant.
pub async fn delete_category(state: &AppState, admin: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(admin)?;
    find_category(&state.orm, id).await?;
    Categories::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(admin.user_id),
            "category_delete",
            "categories",
            json!({ "category_id": id }),
        ),
    )
    .await;
    Ok(())
}
