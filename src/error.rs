//! Crate-wide error type
//!
//! Catalog and rule problems are startup-class failures: they are surfaced once
//! as a load error and never retried.

use thiserror::Error;

/// Errors raised while loading catalogs or running a round
#[derive(Debug, Error)]
pub enum Error {
    /// A required catalog was an empty array
    #[error("catalog `{name}` is missing or empty")]
    EmptyCatalog { name: &'static str },

    /// A catalog failed to parse
    #[error("catalog `{name}` is malformed: {source}")]
    MalformedCatalog {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A normalization rule pattern failed to compile
    #[error("invalid normalization pattern `{pattern}` for token `{token}`: {source}")]
    InvalidPattern {
        pattern: String,
        token: String,
        #[source]
        source: regex::Error,
    },

    /// A normalization rule carried a flag we cannot honour
    #[error("unsupported regex flag `{flag}` for token `{token}`")]
    UnsupportedFlag { flag: char, token: String },

    /// Allergens in the catalog that no dish triggers
    #[error("allergens without any matching dish: {}", .0.join(", "))]
    AllergensWithoutDishes(Vec<String>),

    /// The selected allergen cannot be resolved on the board
    #[error("allergen `{0}` has no dishes on the board")]
    UnknownAllergen(String),

    #[error("no allergen selected")]
    NoAllergenSelected,

    #[error("the game is over; restart to play again")]
    GameOver,

    #[error("no spin has been prepared")]
    NoSpinPrepared,

    #[error("winning segment {index} is out of range for {len} segments")]
    SegmentOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
