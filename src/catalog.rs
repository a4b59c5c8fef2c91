//! Catalog data model and JSON loading
//!
//! Catalogs are read-only once loaded. The four core catalogs (allergens,
//! dishes, normalization rules, ingredients) must be non-empty arrays; the
//! countries catalog is optional and degrades to an empty lookup.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An allergen the player can pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenDescriptor {
    /// Stable id shared with normalization rules
    pub token: String,
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// A dish that can land on the wheel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl Dish {
    /// Display text: first non-empty of name, title, label, id
    pub fn display_label(&self) -> &str {
        [&self.name, &self.title, &self.label]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .chain(std::iter::once(self.id.as_str()))
            .find(|s| !s.trim().is_empty())
            .unwrap_or("")
    }
}

/// Ingredient -> allergen classification rule (regex source + JS-style flags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationRule {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub token: String,
}

/// Emoji lookup entry for an ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDescriptor {
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Flag lookup entry for a cuisine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDescriptor {
    #[serde(alias = "name")]
    pub cuisine: String,
    pub flag: String,
}

/// Raw JSON text for each catalog
#[derive(Debug, Clone, Copy)]
pub struct CatalogSources<'a> {
    pub allergens: &'a str,
    pub dishes: &'a str,
    pub normalization: &'a str,
    pub ingredients: &'a str,
    pub countries: Option<&'a str>,
}

impl CatalogSources<'static> {
    /// Catalogs shipped with the crate under `data/`
    pub fn bundled() -> Self {
        Self {
            allergens: include_str!("../data/allergens.json"),
            dishes: include_str!("../data/dishes.json"),
            normalization: include_str!("../data/normalization.json"),
            ingredients: include_str!("../data/ingredients.json"),
            countries: Some(include_str!("../data/countries.json")),
        }
    }
}

/// All loaded catalogs plus derived lookups
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub allergens: Vec<AllergenDescriptor>,
    pub dishes: Vec<Dish>,
    pub rules: Vec<NormalizationRule>,
    pub ingredients: Vec<IngredientDescriptor>,
    pub countries: Vec<CountryDescriptor>,
    ingredient_emoji: HashMap<String, String>,
    cuisine_flags: HashMap<String, String>,
}

impl Catalogs {
    /// Parse and validate catalogs from JSON text
    pub fn from_json(sources: &CatalogSources<'_>) -> Result<Self> {
        let allergens = parse_required("allergens", sources.allergens)?;
        let dishes = parse_required("dishes", sources.dishes)?;
        let rules = parse_required("normalization", sources.normalization)?;
        let ingredients = parse_required("ingredients", sources.ingredients)?;

        let countries = match sources.countries {
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed countries catalog: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(Self::new(allergens, dishes, rules, ingredients, countries))
    }

    /// Bundled sample catalogs
    pub fn bundled() -> Result<Self> {
        Self::from_json(&CatalogSources::bundled())
    }

    /// Build from already-parsed catalogs (no emptiness checks)
    pub fn new(
        allergens: Vec<AllergenDescriptor>,
        dishes: Vec<Dish>,
        rules: Vec<NormalizationRule>,
        ingredients: Vec<IngredientDescriptor>,
        countries: Vec<CountryDescriptor>,
    ) -> Self {
        let ingredient_emoji = ingredients
            .iter()
            .filter_map(|i| Some((i.name.to_lowercase(), i.emoji.clone()?)))
            .collect();
        let cuisine_flags = countries
            .iter()
            .map(|c| (c.cuisine.to_lowercase(), c.flag.clone()))
            .collect();

        log::info!(
            "Catalogs loaded: {} allergens, {} dishes, {} rules, {} ingredients, {} countries",
            allergens.len(),
            dishes.len(),
            rules.len(),
            ingredients.len(),
            countries.len()
        );

        Self {
            allergens,
            dishes,
            rules,
            ingredients,
            countries,
            ingredient_emoji,
            cuisine_flags,
        }
    }

    /// Look up an allergen by token
    pub fn allergen(&self, token: &str) -> Option<&AllergenDescriptor> {
        self.allergens.iter().find(|a| a.token == token)
    }

    /// Emoji for an ingredient name (case-insensitive)
    pub fn ingredient_emoji(&self, name: &str) -> Option<&str> {
        self.ingredient_emoji
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Flag for a cuisine (case-insensitive)
    pub fn cuisine_flag(&self, cuisine: &str) -> Option<&str> {
        self.cuisine_flags
            .get(&cuisine.trim().to_lowercase())
            .map(String::as_str)
    }
}

fn parse_required<T: DeserializeOwned>(name: &'static str, json: &str) -> Result<Vec<T>> {
    let items: Vec<T> =
        serde_json::from_str(json).map_err(|source| Error::MalformedCatalog { name, source })?;
    if items.is_empty() {
        return Err(Error::EmptyCatalog { name });
    }
    Ok(items)
}
