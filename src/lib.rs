//! Allergy Wheel - a spin-the-wheel allergen awareness game
//!
//! Core modules:
//! - `catalog`: Allergen/dish/rule data model and JSON loading
//! - `normalize`: Ingredient text -> allergen token classification
//! - `board`: Dish index by allergen with data-integrity checks
//! - `distribution`: Allergen/safe segment split and dish selection per spin
//! - `wheel`: Spin physics state machine and canvas rendering
//! - `game`: Session state and round orchestration

pub mod board;
pub mod catalog;
pub mod distribution;
pub mod error;
pub mod game;
pub mod normalize;
pub mod settings;
pub mod wheel;

pub use board::Board;
pub use catalog::{AllergenDescriptor, Catalogs, Dish, NormalizationRule};
pub use error::{Error, Result};
pub use game::{GameController, GamePresenter, GameSession};
pub use normalize::NormalizationEngine;
pub use settings::Preferences;
pub use wheel::{Wheel, WheelLabelDescriptor};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Segments on the wheel
    pub const SEGMENT_COUNT: usize = 8;
    /// Allergen segments at the lowest heart count
    pub const MIN_ALLERGEN_SEGMENTS: usize = 1;
    /// Allergen segments at the highest heart count
    pub const MAX_ALLERGEN_SEGMENTS: usize = 7;

    /// Heart range used by the difficulty ramp
    pub const MIN_HEARTS: u32 = 1;
    pub const MAX_HEARTS: u32 = 9;

    /// Hearts at the start of a game
    pub const STARTING_HEARTS: u32 = 3;
    /// Reaching this many hearts wins the game
    pub const WINNING_HEARTS: u32 = 10;

    /// Label shown when no dish could be placed on the wheel
    pub const NO_MATCHES_LABEL: &str = "No matches";
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}
