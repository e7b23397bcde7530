use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, extension::postgres::PgExpr},
};

use crate::{
    dto::search::{SearchHit, SearchHitType},
    entity::{Recipes, Restaurants, recipes, restaurants},
    error::{AppError, AppResult},
    response::Meta,
    routes::params::{SearchQuery, SearchType, paginate},
    services::fetch_page,
    state::AppState,
};

fn recipe_hit(model: recipes::Model) -> SearchHit {
    SearchHit {
        kind: SearchHitType::Recipe,
        id: model.id,
        name: model.title,
        description: Some(model.description),
        rating: None,
    }
}

fn restaurant_hit(model: restaurants::Model) -> SearchHit {
    SearchHit {
        kind: SearchHitType::Restaurant,
        id: model.id,
        name: model.name,
        description: Some(model.description),
        rating: Some(model.rating),
    }
}

/// Case-insensitive substring search over published recipes and restaurants.
/// Without a `type` filter each kind is paged with the same page and limit.
pub async fn search(state: &AppState, query: SearchQuery) -> AppResult<(Vec<SearchHit>, Meta)> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".into()))?;
    let pattern = format!("%{term}%");
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut hits = Vec::new();
    let mut total = 0;

    if query.kind.is_none_or(|kind| kind == SearchType::Recipe) {
        let finder = Recipes::find()
            .filter(recipes::Column::IsPublished.eq(true))
            .filter(Expr::col(recipes::Column::Title).ilike(pattern.clone()))
            .order_by_asc(recipes::Column::Title);
        let (rows, count) = fetch_page(finder, &state.orm, limit, offset).await?;
        total += count;
        hits.extend(rows.into_iter().map(recipe_hit));
    }
    if query.kind.is_none_or(|kind| kind == SearchType::Restaurant) {
        let finder = Restaurants::find()
            .filter(Expr::col(restaurants::Column::Name).ilike(pattern))
            .order_by_desc(restaurants::Column::Rating);
        let (rows, count) = fetch_page(finder, &state.orm, limit, offset).await?;
        total += count;
        hits.extend(rows.into_iter().map(restaurant_hit));
    }

    let meta = Meta::paged(hits.len(), total, page, limit);
    Ok((hits, meta))
}
