//! Recipebook demo entry point.
//!
//! # Responsibility
//! - Exercise every recipe repository operation against a configured store.
//! - Print each intermediate state so a run doubles as a smoke check.
//!
//! Settings come from `RECIPEBOOK_*` environment variables; with none set the
//! demo runs against an in-memory database.

use anyhow::{Context, Result};
use log::info;
use recipebook_core::db::{open_db, open_db_in_memory};
use recipebook_core::{
    init_logging, DocumentRecipeRepository, OpContext, Recipe, RecipeRepository,
    RecipebookConfig, SqliteCollection,
};
use std::time::Duration;

const DEMO_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let config = RecipebookConfig::from_env().context("failed to read configuration")?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = match &config.db_path {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };
    let collection = SqliteCollection::try_new(&conn, config.collection.as_str())
        .with_context(|| format!("failed to bind collection `{}`", config.collection))?;
    let repo = DocumentRecipeRepository::new(collection);

    info!(
        "event=demo_start module=cli status=start version={}",
        recipebook_core::core_version()
    );
    run_demo(&repo, &OpContext::background().with_timeout(DEMO_TIMEOUT))?;
    info!("event=demo_finish module=cli status=ok");
    Ok(())
}

fn run_demo(repo: &impl RecipeRepository, ctx: &OpContext) -> Result<()> {
    let mut created = Vec::new();
    for (index, recipe) in sample_recipes().into_iter().enumerate() {
        let recipe = repo.create(ctx, recipe).context("failed to create recipe")?;
        println!("Created Recipe {}:\n{recipe}", index + 1);
        created.push(recipe);
    }

    println!("All Recipes:");
    for recipe in repo.get_all(ctx).context("failed to list recipes")? {
        println!("{recipe}");
    }

    let first = repo
        .get(ctx, &created[0].id)
        .context("failed to get recipe by id")?;
    println!("Recipe by ID:\n{first}");

    let mut to_update = first;
    to_update.favorite = false;
    repo.update(ctx, &to_update)
        .context("failed to update recipe")?;
    println!("Updated Recipe");

    repo.delete(ctx, &created[2].id)
        .context("failed to delete recipe")?;
    println!("Deleted Recipe 3");

    println!("All Recipes after deletion:");
    for recipe in repo.get_all(ctx).context("failed to list recipes")? {
        println!("{recipe}");
    }

    Ok(())
}

fn sample_recipes() -> Vec<Recipe> {
    vec![
        Recipe::new("Pasta Carbonara")
            .with_description(
                "Classic Italian pasta dish with eggs, cheese, pancetta, and black pepper.",
            )
            .with_favorite(true)
            .with_ingredient(200.0, "g", "Spaghetti")
            .with_ingredient(100.0, "g", "Pancetta")
            .with_ingredient(2.0, "", "Eggs")
            .with_ingredient(50.0, "g", "Parmesan Cheese")
            .with_ingredient(50.0, "g", "Pecorino Cheese")
            .with_ingredient(1.0, "", "Black Pepper")
            .with_step(1, "Boil spaghetti until al dente.")
            .with_step(2, "Fry pancetta until crispy.")
            .with_step(3, "Mix eggs with grated cheeses.")
            .with_step(4, "Combine everything and add black pepper."),
        Recipe::new("Caprese Salad")
            .with_description(
                "Simple and delicious salad with fresh tomatoes, mozzarella, and basil.",
            )
            .with_ingredient(4.0, "", "Tomatoes")
            .with_ingredient(1.0, "", "Mozzarella")
            .with_ingredient(1.0, "bunch", "Basil")
            .with_ingredient(2.0, "tbsp", "Olive Oil")
            .with_ingredient(1.0, "tbsp", "Balsamic Vinegar")
            .with_step(1, "Slice tomatoes and mozzarella.")
            .with_step(2, "Arrange slices on a plate with basil leaves.")
            .with_step(3, "Drizzle with olive oil and balsamic vinegar."),
        Recipe::new("Chocolate Cake")
            .with_description("Decadent chocolate cake with rich frosting.")
            .with_favorite(true)
            .with_ingredient(200.0, "g", "Flour")
            .with_ingredient(50.0, "g", "Cocoa Powder")
            .with_ingredient(200.0, "g", "Sugar")
            .with_ingredient(200.0, "g", "Butter")
            .with_ingredient(4.0, "", "Eggs")
            .with_step(1, "Mix dry ingredients (flour, cocoa powder, sugar).")
            .with_step(2, "Cream butter and sugar, then add eggs one by one.")
            .with_step(3, "Fold in the dry ingredients.")
            .with_step(4, "Bake in preheated oven."),
    ]
}
