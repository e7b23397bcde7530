use food_platform_api::{
    dto::recipes::{CreateRecipeRequest, UpdateRecipeRequest},
    error::AppError,
    middleware::auth::AuthUser,
    models::{Difficulty, Ingredient, Instruction, Recipe, Role},
    routes::params::{RecipeQuery, SearchQuery, SearchType},
    services::{recipe_service, search_service},
    state::AppState,
};
use uuid::Uuid;

mod common;

async fn recipe(
    state: &AppState,
    author: &AuthUser,
    title: &str,
    is_published: bool,
) -> anyhow::Result<Recipe> {
    let recipe = recipe_service::create_recipe(
        state,
        author,
        CreateRecipeRequest {
            title: title.into(),
            description: "Weeknight dinner".into(),
            ingredients: vec![Ingredient {
                name: "Rice".into(),
                quantity: "200".into(),
                unit: Some("g".into()),
            }],
            instructions: vec![Instruction {
                step: 1,
                description: "Boil it".into(),
            }],
            prep_time_minutes: 5,
            cook_time_minutes: 20,
            servings: 2,
            difficulty: Difficulty::Easy,
            cuisine: None,
            is_published: Some(is_published),
        },
    )
    .await?;
    Ok(recipe)
}

fn titled(tag: &str) -> RecipeQuery {
    RecipeQuery {
        q: Some(tag.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn drafts_are_only_visible_to_author_and_admins() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let author = common::create_user(&state, Role::Customer).await?;
    let reader = common::create_user(&state, Role::Customer).await?;
    let admin = common::create_user(&state, Role::Admin).await?;

    let tag = Uuid::new_v4().simple().to_string();
    let draft = recipe(&state, &author, &format!("Draft {tag}"), false).await?;
    let published = recipe(&state, &author, &format!("Published {tag}"), true).await?;

    let hidden = recipe_service::get_recipe(&state, Some(&reader), draft.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));
    let hidden = recipe_service::get_recipe(&state, None, draft.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));

    assert_eq!(recipe_service::get_recipe(&state, Some(&author), draft.id).await?.id, draft.id);
    assert_eq!(recipe_service::get_recipe(&state, Some(&admin), draft.id).await?.id, draft.id);

    let (listed, meta) = recipe_service::list_recipes(&state, Some(&reader), titled(&tag)).await?;
    assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![published.id]);
    assert_eq!(meta.total, Some(1));

    let (listed, _) = recipe_service::list_recipes(&state, None, titled(&tag)).await?;
    assert_eq!(listed.len(), 1);

    let (listed, _) = recipe_service::list_recipes(&state, Some(&author), titled(&tag)).await?;
    assert_eq!(listed.len(), 2);
    let (listed, _) = recipe_service::list_recipes(&state, Some(&admin), titled(&tag)).await?;
    assert_eq!(listed.len(), 2);

    let updated = recipe_service::update_recipe(
        &state,
        &author,
        draft.id,
        UpdateRecipeRequest {
            is_published: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert!(updated.is_published);
    assert_eq!(recipe_service::get_recipe(&state, Some(&reader), draft.id).await?.id, draft.id);
    Ok(())
}

#[tokio::test]
async fn only_the_author_edits_a_recipe() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let author = common::create_user(&state, Role::Customer).await?;
    let other = common::create_user(&state, Role::Customer).await?;
    let created = recipe(&state, &author, "Tomato soup", true).await?;

    let denied = recipe_service::update_recipe(
        &state,
        &other,
        created.id,
        UpdateRecipeRequest {
            title: Some("Stolen soup".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let denied = recipe_service::delete_recipe(&state, &other, created.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    recipe_service::delete_recipe(&state, &author, created.id).await?;
    let gone = recipe_service::get_recipe(&state, Some(&author), created.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn search_skips_drafts() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let author = common::create_user(&state, Role::Customer).await?;

    let tag = Uuid::new_v4().simple().to_string();
    recipe(&state, &author, &format!("Hidden {tag}"), false).await?;
    let published = recipe(&state, &author, &format!("Shown {tag}"), true).await?;

    let (hits, _) = search_service::search(
        &state,
        SearchQuery {
            q: Some(tag.clone()),
            kind: Some(SearchType::Recipe),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, published.id);

    let missing = search_service::search(&state, SearchQuery::default()).await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));
    Ok(())
}
