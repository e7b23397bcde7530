use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Difficulty, Ingredient, Instruction};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one ingredient is required"))]
    pub ingredients: Vec<Ingredient>,
    #[validate(length(min = 1, message = "At least one instruction is required"))]
    pub instructions: Vec<Instruction>,
    #[validate(range(min = 0))]
    pub prep_time_minutes: i32,
    #[validate(range(min = 0))]
    pub cook_time_minutes: i32,
    #[validate(range(min = 1, message = "Servings must be at least 1"))]
    pub servings: i32,
    pub difficulty: Difficulty,
    pub cuisine: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "At least one ingredient is required"))]
    pub ingredients: Option<Vec<Ingredient>>,
    #[validate(length(min = 1, message = "At least one instruction is required"))]
    pub instructions: Option<Vec<Instruction>>,
    #[validate(range(min = 0))]
    pub prep_time_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub cook_time_minutes: Option<i32>,
    #[validate(range(min = 1, message = "Servings must be at least 1"))]
    pub servings: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub cuisine: Option<String>,
    pub is_published: Option<bool>,
}
