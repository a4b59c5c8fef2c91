//! Dish index by allergen
//!
//! The board owns the catalogs and the normalization engine, and answers
//! "which dishes trigger allergen X" from an index built once up front.
//!
//! Invariant: after `build_dish_index_by_allergen`, every allergen in the
//! catalog must map to at least one dish. A violation is a configuration
//! error, reported by `throw_if_any_allergen_has_no_dishes`.

use std::collections::HashMap;

use crate::catalog::{AllergenDescriptor, Catalogs, Dish};
use crate::error::{Error, Result};
use crate::normalize::NormalizationEngine;

/// Catalog owner plus allergen -> dishes index
#[derive(Debug, Clone)]
pub struct Board {
    catalogs: Catalogs,
    engine: NormalizationEngine,
    index: HashMap<String, Vec<Dish>>,
}

impl Board {
    /// Create a board. The index is empty until `build_dish_index_by_allergen`.
    pub fn new(catalogs: Catalogs, engine: NormalizationEngine) -> Self {
        Self {
            catalogs,
            engine,
            index: HashMap::new(),
        }
    }

    /// Compile the catalog's rules, build the index and check the invariant
    pub fn from_catalogs(catalogs: Catalogs) -> Result<Self> {
        let engine = NormalizationEngine::new(&catalogs.rules)?;
        let mut board = Self::new(catalogs, engine);
        board.build_dish_index_by_allergen();
        board.throw_if_any_allergen_has_no_dishes()?;
        Ok(board)
    }

    /// Rebuild the index from scratch; a dish lands in every bucket it triggers
    pub fn build_dish_index_by_allergen(&mut self) {
        let mut index: HashMap<String, Vec<Dish>> = HashMap::new();
        for dish in &self.catalogs.dishes {
            for token in self.engine.tokens_for_dish_ingredients(&dish.ingredients) {
                index.entry(token).or_default().push(dish.clone());
            }
        }
        log::info!(
            "Indexed {} dishes under {} allergen tokens",
            self.catalogs.dishes.len(),
            index.len()
        );
        self.index = index;
    }

    /// Fail with every allergen token whose bucket is empty
    pub fn throw_if_any_allergen_has_no_dishes(&self) -> Result<()> {
        let missing: Vec<String> = self
            .catalogs
            .allergens
            .iter()
            .filter(|a| self.dishes_for_allergen(&a.token).is_empty())
            .map(|a| a.token.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            log::error!("Allergens without dishes: {:?}", missing);
            Err(Error::AllergensWithoutDishes(missing))
        }
    }

    /// Dishes triggering `token`; empty for unknown tokens
    pub fn dishes_for_allergen(&self, token: &str) -> &[Dish] {
        self.index.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Display label of a dish (name, title, label, id, else empty)
    pub fn dish_label<'a>(&self, dish: &'a Dish) -> &'a str {
        dish.display_label()
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn engine(&self) -> &NormalizationEngine {
        &self.engine
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.catalogs.dishes
    }

    pub fn allergens(&self) -> &[AllergenDescriptor] {
        &self.catalogs.allergens
    }
}
