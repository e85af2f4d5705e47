//! Recipe aggregate model.
//!
//! # Responsibility
//! - Define the recipe aggregate and its nested value types.
//! - Render human-readable diagnostic blocks for each type.
//!
//! # Invariants
//! - `Recipe::id` is empty until storage assigns one, then never changes.
//! - `ingredients` and `directions` keep caller order; they have no identity
//!   outside their owning recipe.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Aggregate root persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Storage-assigned identifier in 24-char hex form, empty when transient.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub favorite: bool,
    /// Ordered ingredient list.
    pub ingredients: Vec<Ingredient>,
    /// Ordered procedure steps.
    pub directions: Vec<Step>,
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Quantity, may be fractional.
    pub qty: f64,
    /// Free-text unit, empty for countable items.
    pub unit: String,
    pub name: String,
}

/// One step of the recipe procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Caller-assigned position; not checked for gaps or duplicates.
    pub order: i64,
    pub description: String,
}

impl Recipe {
    /// Creates a transient recipe with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_ingredient(
        mut self,
        qty: f64,
        unit: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.ingredients.push(Ingredient::new(qty, unit, name));
        self
    }

    pub fn with_step(mut self, order: i64, description: impl Into<String>) -> Self {
        self.directions.push(Step::new(order, description));
        self
    }

    /// Returns whether storage has assigned an id to this recipe.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

impl Ingredient {
    pub fn new(qty: f64, unit: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qty,
            unit: unit.into(),
            name: name.into(),
        }
    }
}

impl Step {
    pub fn new(order: i64, description: impl Into<String>) -> Self {
        Self {
            order,
            description: description.into(),
        }
    }
}

impl Display for Recipe {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Recipe ID: {}", self.id)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Favorite: {}", self.favorite)?;
        writeln!(f, "Ingredients:")?;
        for ingredient in &self.ingredients {
            writeln!(f, "  - {ingredient}")?;
        }
        writeln!(f, "Directions:")?;
        for step in &self.directions {
            writeln!(f, "  - {step}")?;
        }
        Ok(())
    }
}

impl Display for Ingredient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Qty: {:.6} {}, Name: {}", self.qty, self.unit, self.name)
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order: {}, Description: {}", self.order, self.description)
    }
}
