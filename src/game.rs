//! Game session and round orchestration
//!
//! A round: the player picks an allergen, `prepare_spin` fills the wheel,
//! the wheel comes to rest, and `resolve_spin` maps the winning segment back
//! to its dish and decides whether it was safe.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use crate::board::Board;
use crate::catalog::{AllergenDescriptor, Catalogs, Dish};
use crate::consts::*;
use crate::distribution::{WheelCandidates, build_wheel_candidates};
use crate::error::{Error, Result};
use crate::settings::Preferences;
use crate::wheel::WheelLabelDescriptor;

/// Where the game stands after a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Continue,
    Won,
    Lost,
}

/// One ingredient of the revealed dish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedIngredient {
    pub name: String,
    pub emoji: Option<String>,
    /// Triggers the selected allergen
    pub triggers: bool,
}

/// What the wheel landed on and what it did to the player
#[derive(Debug, Clone)]
pub struct SpinOutcome {
    pub segment: usize,
    pub dish: Option<Dish>,
    pub label: String,
    pub allergen: String,
    /// Dish contains the selected allergen
    pub triggered: bool,
    /// Every allergen token the dish triggers
    pub tokens: BTreeSet<String>,
    pub ingredients: Vec<RevealedIngredient>,
    pub cuisine_flag: Option<String>,
    pub hearts: u32,
    pub status: RoundStatus,
}

/// Mutable state of one game, passed around explicitly
#[derive(Debug, Clone)]
pub struct GameSession {
    pub hearts: u32,
    pub selected_allergen: Option<String>,
    pub candidates: Option<WheelCandidates>,
    pub preferences: Preferences,
    pub rounds_played: u32,
    pub status: RoundStatus,
    seed: u64,
    rng: Pcg32,
}

impl GameSession {
    pub fn initialize(preferences: Preferences, seed: u64) -> Self {
        let hearts = preferences.starting_hearts.clamp(1, WINNING_HEARTS - 1);
        Self {
            hearts,
            selected_allergen: None,
            candidates: None,
            preferences,
            rounds_played: 0,
            status: RoundStatus::Continue,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Drop per-round state; preferences survive
    pub fn dispose(&mut self) {
        self.selected_allergen = None;
        self.candidates = None;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn is_over(&self) -> bool {
        self.status != RoundStatus::Continue
    }

    /// Apply a round result to the heart count
    fn record_round(&mut self, triggered: bool) -> RoundStatus {
        self.rounds_played += 1;
        self.hearts = if triggered {
            self.hearts.saturating_sub(1)
        } else {
            (self.hearts + 1).min(WINNING_HEARTS)
        };
        self.status = if self.hearts == 0 {
            RoundStatus::Lost
        } else if self.hearts >= WINNING_HEARTS {
            RoundStatus::Won
        } else {
            RoundStatus::Continue
        };
        self.status
    }
}

/// UI side of the game. Every method is required.
pub trait GamePresenter {
    fn show_wheel(&mut self, labels: &[WheelLabelDescriptor]);
    fn show_outcome(&mut self, outcome: &SpinOutcome);
    fn show_hearts(&mut self, hearts: u32);
    fn show_game_over(&mut self, status: RoundStatus, rounds: u32);
    fn show_load_error(&mut self, error: &Error);
}

/// Presenter that only logs (headless runs)
#[derive(Debug, Default)]
pub struct LogPresenter;

impl GamePresenter for LogPresenter {
    fn show_wheel(&mut self, labels: &[WheelLabelDescriptor]) {
        let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        log::info!("Wheel: {}", names.join(" | "));
    }

    fn show_outcome(&mut self, outcome: &SpinOutcome) {
        let verdict = if outcome.triggered { "contains" } else { "is safe from" };
        log::info!("Landed on {} - it {} {}", outcome.label, verdict, outcome.allergen);
    }

    fn show_hearts(&mut self, hearts: u32) {
        log::info!("Hearts: {}", "❤".repeat(hearts as usize));
    }

    fn show_game_over(&mut self, status: RoundStatus, rounds: u32) {
        log::info!("Game over after {} rounds: {:?}", rounds, status);
    }

    fn show_load_error(&mut self, error: &Error) {
        log::error!("Failed to load game data: {}", error);
    }
}

/// Owns the board and the session, and runs rounds
#[derive(Debug, Clone)]
pub struct GameController {
    board: Board,
    session: GameSession,
}

impl GameController {
    /// Build the board from catalogs; fails on any data-integrity problem
    pub fn new(catalogs: Catalogs, preferences: Preferences, seed: u64) -> Result<Self> {
        let board = Board::from_catalogs(catalogs)?;
        Ok(Self {
            board,
            session: GameSession::initialize(preferences, seed),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn allergens(&self) -> &[AllergenDescriptor] {
        self.board.allergens()
    }

    /// Choose the allergen for the coming spins
    pub fn select_allergen(&mut self, token: &str) -> Result<&AllergenDescriptor> {
        let known = self.board.catalogs().allergen(token).is_some();
        if !known || self.board.dishes_for_allergen(token).is_empty() {
            return Err(Error::UnknownAllergen(token.to_string()));
        }
        self.session.selected_allergen = Some(token.to_string());
        self.session.candidates = None;
        log::info!("Selected allergen `{}`", token);
        self.board
            .catalogs()
            .allergen(token)
            .ok_or_else(|| Error::UnknownAllergen(token.to_string()))
    }

    /// Select the first catalog allergen that has dishes, which is what a
    /// freshly filled picker shows
    pub fn select_default_allergen(&mut self) -> Result<&AllergenDescriptor> {
        let token = self
            .board
            .allergens()
            .iter()
            .map(|a| a.token.as_str())
            .find(|t| !self.board.dishes_for_allergen(t).is_empty())
            .map(str::to_string)
            .ok_or(Error::NoAllergenSelected)?;
        self.select_allergen(&token)
    }

    /// Fill the wheel for the next spin and remember which dish is where
    pub fn prepare_spin(&mut self) -> Result<Vec<WheelLabelDescriptor>> {
        if self.session.is_over() {
            return Err(Error::GameOver);
        }
        let allergen = self
            .session
            .selected_allergen
            .clone()
            .ok_or(Error::NoAllergenSelected)?;
        let hearts = self.session.hearts;
        let candidates =
            build_wheel_candidates(&self.board, &allergen, hearts, self.session.rng_mut())?;
        let labels = candidates.labels();
        self.session.candidates = Some(candidates);
        Ok(labels)
    }

    /// Resolve the winning segment of the prepared spin. Each prepared spin
    /// resolves once.
    pub fn resolve_spin(&mut self, winner: usize) -> Result<SpinOutcome> {
        let len = self
            .session
            .candidates
            .as_ref()
            .map(WheelCandidates::len)
            .ok_or(Error::NoSpinPrepared)?;
        if winner >= len {
            return Err(Error::SegmentOutOfRange { index: winner, len });
        }
        let candidates = self.session.candidates.take().ok_or(Error::NoSpinPrepared)?;
        let segment = candidates
            .segments
            .into_iter()
            .nth(winner)
            .ok_or(Error::SegmentOutOfRange { index: winner, len })?;
        let allergen = candidates.allergen;

        let engine = self.board.engine();
        let catalogs = self.board.catalogs();
        let (tokens, ingredients, cuisine_flag) = match &segment.dish {
            Some(dish) => (
                engine.tokens_for_dish_ingredients(&dish.ingredients),
                dish.ingredients
                    .iter()
                    .map(|name| RevealedIngredient {
                        name: name.clone(),
                        emoji: catalogs.ingredient_emoji(name).map(str::to_string),
                        triggers: engine.ingredient_triggers(name, &allergen),
                    })
                    .collect(),
                dish.cuisine
                    .as_deref()
                    .and_then(|c| catalogs.cuisine_flag(c))
                    .map(str::to_string),
            ),
            None => (BTreeSet::new(), Vec::new(), None),
        };
        let triggered = tokens.contains(&allergen);

        let status = if segment.dish.is_some() {
            self.session.record_round(triggered)
        } else {
            self.session.status
        };
        if status != RoundStatus::Continue {
            log::info!(
                "Game {:?} after {} rounds",
                status,
                self.session.rounds_played
            );
        }

        Ok(SpinOutcome {
            segment: winner,
            label: segment.label.label,
            dish: segment.dish,
            allergen,
            triggered,
            tokens,
            ingredients,
            cuisine_flag,
            hearts: self.session.hearts,
            status,
        })
    }

    /// Prepare a spin and hand the labels to the presenter
    pub fn begin_spin(
        &mut self,
        presenter: &mut dyn GamePresenter,
    ) -> Result<Vec<WheelLabelDescriptor>> {
        let labels = self.prepare_spin()?;
        presenter.show_wheel(&labels);
        Ok(labels)
    }

    /// Resolve a spin and report it through the presenter
    pub fn finish_spin(
        &mut self,
        winner: usize,
        presenter: &mut dyn GamePresenter,
    ) -> Result<SpinOutcome> {
        let outcome = self.resolve_spin(winner)?;
        presenter.show_outcome(&outcome);
        presenter.show_hearts(outcome.hearts);
        if outcome.status != RoundStatus::Continue {
            presenter.show_game_over(outcome.status, self.session.rounds_played);
        }
        Ok(outcome)
    }

    /// New game with the same catalogs and preferences
    pub fn restart(&mut self) {
        let preferences = self.session.preferences.clone();
        let seed = self.session.seed().wrapping_add(1);
        self.session.dispose();
        self.session = GameSession::initialize(preferences, seed);
        log::info!("Game restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{IngredientDescriptor, NormalizationRule};
    use crate::distribution::SegmentSource;
    use crate::wheel::{ManualScheduler, SpinListener, Wheel, WheelTuning};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingPresenter {
        wheels: usize,
        outcomes: Vec<(String, bool)>,
        hearts: Vec<u32>,
        game_over: Option<RoundStatus>,
    }

    impl GamePresenter for RecordingPresenter {
        fn show_wheel(&mut self, _labels: &[WheelLabelDescriptor]) {
            self.wheels += 1;
        }
        fn show_outcome(&mut self, outcome: &SpinOutcome) {
            self.outcomes.push((outcome.label.clone(), outcome.triggered));
        }
        fn show_hearts(&mut self, hearts: u32) {
            self.hearts.push(hearts);
        }
        fn show_game_over(&mut self, status: RoundStatus, _rounds: u32) {
            self.game_over = Some(status);
        }
        fn show_load_error(&mut self, _error: &Error) {}
    }

    fn bundled(seed: u64) -> GameController {
        GameController::new(Catalogs::bundled().unwrap(), Preferences::default(), seed).unwrap()
    }

    fn segment_with(c: &GameController, source: SegmentSource) -> Option<usize> {
        c.session()
            .candidates
            .as_ref()?
            .segments
            .iter()
            .position(|s| s.source == source)
    }

    #[test]
    fn test_spin_requires_allergen() {
        let mut c = bundled(1);
        assert!(matches!(c.prepare_spin(), Err(Error::NoAllergenSelected)));
        assert!(matches!(c.resolve_spin(0), Err(Error::NoSpinPrepared)));
    }

    #[test]
    fn test_default_allergen_makes_first_spin_work() {
        let mut c = bundled(1);
        let first = c.allergens()[0].token.clone();
        assert_eq!(c.select_default_allergen().unwrap().token, first);
        assert_eq!(c.session().selected_allergen.as_deref(), Some(first.as_str()));
        assert_eq!(c.prepare_spin().unwrap().len(), SEGMENT_COUNT);
    }

    #[test]
    fn test_unknown_allergen_rejected() {
        let mut c = bundled(1);
        assert!(matches!(c.select_allergen("kryptonite"), Err(Error::UnknownAllergen(_))));
        assert!(c.session().selected_allergen.is_none());
    }

    #[test]
    fn test_prepare_spin_fills_wheel() {
        let mut c = bundled(2);
        c.select_allergen("peanuts").unwrap();
        let labels = c.prepare_spin().unwrap();
        assert_eq!(labels.len(), SEGMENT_COUNT);
        assert!(labels.iter().all(|l| !l.label.is_empty()));
    }

    #[test]
    fn test_trap_costs_a_heart_and_reveals_ingredients() {
        let mut c = bundled(3);
        c.select_allergen("peanuts").unwrap();
        c.prepare_spin().unwrap();
        let trap = segment_with(&c, SegmentSource::Allergen).unwrap();

        let outcome = c.resolve_spin(trap).unwrap();
        assert!(outcome.triggered);
        assert!(outcome.tokens.contains("peanuts"));
        assert!(outcome.ingredients.iter().any(|i| i.triggers));
        assert_eq!(outcome.hearts, STARTING_HEARTS - 1);
        assert_eq!(outcome.status, RoundStatus::Continue);
        assert!(outcome.cuisine_flag.is_some());
    }

    #[test]
    fn test_safe_dish_gains_a_heart() {
        let mut c = bundled(4);
        c.select_allergen("peanuts").unwrap();
        c.prepare_spin().unwrap();
        let safe = segment_with(&c, SegmentSource::Safe).unwrap();

        let outcome = c.resolve_spin(safe).unwrap();
        assert!(!outcome.triggered);
        assert!(outcome.ingredients.iter().all(|i| !i.triggers));
        assert_eq!(outcome.hearts, STARTING_HEARTS + 1);
    }

    #[test]
    fn test_spin_resolves_once() {
        let mut c = bundled(5);
        c.select_allergen("dairy").unwrap();
        c.prepare_spin().unwrap();
        assert!(matches!(
            c.resolve_spin(SEGMENT_COUNT),
            Err(Error::SegmentOutOfRange { .. })
        ));
        c.resolve_spin(0).unwrap();
        assert!(matches!(c.resolve_spin(0), Err(Error::NoSpinPrepared)));
    }

    #[test]
    fn test_losing_ends_game() {
        let mut prefs = Preferences::default();
        prefs.starting_hearts = 1;
        let mut c = GameController::new(Catalogs::bundled().unwrap(), prefs, 6).unwrap();
        let mut presenter = RecordingPresenter::default();
        c.select_allergen("gluten").unwrap();
        c.begin_spin(&mut presenter).unwrap();
        let trap = segment_with(&c, SegmentSource::Allergen).unwrap();

        let outcome = c.finish_spin(trap, &mut presenter).unwrap();
        assert_eq!(outcome.status, RoundStatus::Lost);
        assert_eq!(presenter.wheels, 1);
        assert_eq!(presenter.hearts, vec![0]);
        assert_eq!(presenter.game_over, Some(RoundStatus::Lost));
        assert!(matches!(c.prepare_spin(), Err(Error::GameOver)));

        c.restart();
        assert_eq!(c.session().hearts, 1);
        assert!(c.session().selected_allergen.is_none());
    }

    #[test]
    fn test_winning_at_max_hearts() {
        let mut prefs = Preferences::default();
        prefs.starting_hearts = WINNING_HEARTS - 1;
        let mut c = GameController::new(Catalogs::bundled().unwrap(), prefs, 7).unwrap();
        c.select_allergen("sesame").unwrap();
        c.prepare_spin().unwrap();
        let safe = segment_with(&c, SegmentSource::Safe).unwrap();
        assert_eq!(c.resolve_spin(safe).unwrap().status, RoundStatus::Won);
    }

    #[test]
    fn test_placeholder_segment_leaves_hearts_alone() {
        let catalogs = Catalogs::new(
            vec![AllergenDescriptor {
                token: "peanuts".into(),
                label: "Peanuts".into(),
                emoji: None,
            }],
            vec![Dish {
                id: "".into(),
                name: None,
                title: None,
                label: None,
                emoji: None,
                cuisine: None,
                ingredients: vec!["peanuts".into()],
            }],
            vec![NormalizationRule {
                pattern: "peanut".into(),
                flags: None,
                token: "peanuts".into(),
            }],
            vec![IngredientDescriptor {
                name: "peanuts".into(),
                emoji: None,
            }],
            Vec::new(),
        );
        let mut c = GameController::new(catalogs, Preferences::default(), 8).unwrap();
        c.select_allergen("peanuts").unwrap();
        let labels = c.prepare_spin().unwrap();
        assert_eq!(labels, vec![WheelLabelDescriptor::new(NO_MATCHES_LABEL)]);

        let outcome = c.resolve_spin(0).unwrap();
        assert!(outcome.dish.is_none());
        assert!(!outcome.triggered);
        assert_eq!(outcome.hearts, STARTING_HEARTS);
        assert_eq!(c.session().rounds_played, 0);
    }

    #[test]
    fn test_invalid_catalog_fails_construction() {
        let mut catalogs = Catalogs::bundled().unwrap();
        catalogs.dishes.retain(|d| d.id != "hummus" && d.id != "fried-rice");
        let err = GameController::new(catalogs, Preferences::default(), 0).unwrap_err();
        assert!(matches!(err, Error::AllergensWithoutDishes(t) if t == vec!["sesame".to_string()]));
    }

    struct WinnerSlot(Rc<RefCell<Vec<usize>>>);

    impl SpinListener for WinnerSlot {
        fn on_tick(&mut self, _index: usize) {}
        fn on_stop(&mut self, winner: usize) {
            self.0.borrow_mut().push(winner);
        }
    }

    #[test]
    fn test_full_game_with_wheel() {
        let mut c = bundled(2024);
        let mut presenter = RecordingPresenter::default();
        let winners = Rc::new(RefCell::new(Vec::new()));
        let mut wheel = Wheel::new(ManualScheduler::default(), WheelTuning::default(), 2024);
        wheel.register_spin_callbacks(Box::new(WinnerSlot(winners.clone())));
        wheel.set_spin_duration(400.0);
        wheel.set_revolutions(1.0);
        c.select_allergen("egg").unwrap();

        let mut rounds = 0;
        while !c.session().is_over() && rounds < 500 {
            let labels = c.begin_spin(&mut presenter).unwrap();
            wheel.set_labels(labels);
            wheel.spin(None);
            wheel.pump(100_000);

            let winner = winners.borrow_mut().pop().expect("wheel stopped");
            let outcome = c.finish_spin(winner, &mut presenter).unwrap();
            assert_eq!(outcome.label, wheel.labels()[winner].label);
            rounds += 1;
        }

        assert!(c.session().is_over());
        assert_eq!(presenter.outcomes.len(), rounds);
        assert!(presenter.game_over.is_some());
    }
}
