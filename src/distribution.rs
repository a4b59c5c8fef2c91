//! Allergen/safe segment split and dish selection for each spin
//!
//! The number of trap segments ramps with hearts: near death the wheel is
//! forgiving, near victory it is mostly traps. Selection always fills all
//! `SEGMENT_COUNT` segments, whatever the catalog size.
//!
//! Safe shortfall fallback order is fixed: unique safe dishes, then any
//! catalog dish not yet on the wheel, then repeats of triggering dishes.
//! The last step can place a triggering dish in a "safe" slot; that is part
//! of the game balance and is kept on purpose.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::board::Board;
use crate::catalog::Dish;
use crate::consts::*;
use crate::error::{Error, Result};
use crate::wheel::WheelLabelDescriptor;

/// How many segments are traps vs. safe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    pub allergen: usize,
    pub safe: usize,
}

impl SegmentPlan {
    pub fn for_hearts(hearts: u32) -> Self {
        let allergen = allergen_segment_count(hearts);
        Self {
            allergen,
            safe: SEGMENT_COUNT - allergen,
        }
    }
}

/// Linear ramp from MIN_ALLERGEN_SEGMENTS at MIN_HEARTS to
/// MAX_ALLERGEN_SEGMENTS at MAX_HEARTS, floor division
pub fn allergen_segment_count(hearts: u32) -> usize {
    let h = hearts.clamp(MIN_HEARTS, MAX_HEARTS) as usize;
    let span = MAX_ALLERGEN_SEGMENTS - MIN_ALLERGEN_SEGMENTS;
    let steps = (MAX_HEARTS - MIN_HEARTS) as usize;
    let count = MIN_ALLERGEN_SEGMENTS + (h - MIN_HEARTS as usize) * span / steps;
    count.clamp(1, SEGMENT_COUNT)
}

/// Where a segment's dish came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource {
    /// Unique pick from the triggering dishes
    Allergen,
    /// Repeat of a triggering dish when there were too few unique ones
    AllergenPadding,
    /// Unique pick from dishes that do not trigger
    Safe,
    /// Any catalog dish not yet placed, used when safe dishes run out
    Leftover,
    /// Triggering dish used as a last resort for a safe slot
    AllergenFallback,
    /// "No matches" placeholder
    Placeholder,
}

/// One wheel segment with the dish it resolves to
#[derive(Debug, Clone)]
pub struct WheelSegment {
    pub dish: Option<Dish>,
    pub label: WheelLabelDescriptor,
    pub source: SegmentSource,
}

/// The segments for one spin; index = wheel segment index
#[derive(Debug, Clone, Default)]
pub struct WheelCandidates {
    pub allergen: String,
    pub segments: Vec<WheelSegment>,
}

impl WheelCandidates {
    pub fn labels(&self) -> Vec<WheelLabelDescriptor> {
        self.segments.iter().map(|s| s.label.clone()).collect()
    }

    pub fn dish_at(&self, index: usize) -> Option<&Dish> {
        self.segments.get(index).and_then(|s| s.dish.as_ref())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Up to `count` distinct items, uniformly at random
pub fn pick_unique<T: Clone, R: Rng + ?Sized>(items: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let mut pool: Vec<&T> = items.iter().collect();
    pool.shuffle(rng);
    pool.into_iter().take(count).cloned().collect()
}

/// Build the wheel for `allergen` at the given heart count
pub fn build_wheel_candidates<R: Rng + ?Sized>(
    board: &Board,
    allergen: &str,
    hearts: u32,
    rng: &mut R,
) -> Result<WheelCandidates> {
    let triggering = board.dishes_for_allergen(allergen);
    if triggering.is_empty() {
        return Err(Error::UnknownAllergen(allergen.to_string()));
    }

    let plan = SegmentPlan::for_hearts(hearts);
    log::debug!(
        "Spin plan for `{}` at {} hearts: {} allergen / {} safe",
        allergen,
        hearts,
        plan.allergen,
        plan.safe
    );

    let mut picks: Vec<(Dish, SegmentSource)> = pick_unique(triggering, plan.allergen, rng)
        .into_iter()
        .map(|d| (d, SegmentSource::Allergen))
        .collect();
    if picks.len() < plan.allergen {
        log::warn!(
            "Only {} dishes trigger `{}`, repeating to fill {} segments",
            triggering.len(),
            allergen,
            plan.allergen
        );
    }
    fill_from(triggering, plan.allergen, SegmentSource::AllergenPadding, &mut picks, rng);

    let triggering_ids: HashSet<&str> = triggering.iter().map(|d| d.id.as_str()).collect();
    let safe_pool: Vec<Dish> = board
        .dishes()
        .iter()
        .filter(|d| !triggering_ids.contains(d.id.as_str()))
        .cloned()
        .collect();
    picks.extend(
        pick_unique(&safe_pool, plan.safe, rng)
            .into_iter()
            .map(|d| (d, SegmentSource::Safe)),
    );

    if picks.len() < SEGMENT_COUNT {
        log::warn!(
            "Only {} safe dishes for `{}`, falling back to leftover catalog dishes",
            safe_pool.len(),
            allergen
        );
        let placed: HashSet<&str> = picks.iter().map(|(d, _)| d.id.as_str()).collect();
        let mut seen = HashSet::new();
        let leftover: Vec<Dish> = board
            .dishes()
            .iter()
            .filter(|d| !placed.contains(d.id.as_str()) && seen.insert(d.id.as_str()))
            .cloned()
            .collect();
        let needed = SEGMENT_COUNT - picks.len();
        picks.extend(
            pick_unique(&leftover, needed, rng)
                .into_iter()
                .map(|d| (d, SegmentSource::Leftover)),
        );
    }
    fill_from(triggering, SEGMENT_COUNT, SegmentSource::AllergenFallback, &mut picks, rng);

    picks.shuffle(rng);
    picks.truncate(SEGMENT_COUNT);
    while picks.len() < SEGMENT_COUNT {
        let Some(extra) = picks.choose(rng).cloned() else {
            break;
        };
        picks.push(extra);
    }

    let mut segments: Vec<WheelSegment> = picks
        .into_iter()
        .filter_map(|(dish, source)| {
            let label = board.dish_label(&dish).to_string();
            if label.is_empty() {
                return None;
            }
            Some(WheelSegment {
                label: WheelLabelDescriptor {
                    label,
                    emoji: dish.emoji.clone(),
                },
                dish: Some(dish),
                source,
            })
        })
        .collect();

    if segments.is_empty() {
        segments.push(WheelSegment {
            dish: None,
            label: WheelLabelDescriptor::new(NO_MATCHES_LABEL),
            source: SegmentSource::Placeholder,
        });
    }

    Ok(WheelCandidates {
        allergen: allergen.to_string(),
        segments,
    })
}

/// Repeat random picks from `pool` until `picks` reaches `target`
fn fill_from<R: Rng + ?Sized>(
    pool: &[Dish],
    target: usize,
    source: SegmentSource,
    picks: &mut Vec<(Dish, SegmentSource)>,
    rng: &mut R,
) {
    while picks.len() < target {
        let Some(dish) = pool.choose(rng) else {
            return;
        };
        picks.push((dish.clone(), source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AllergenDescriptor, Catalogs, IngredientDescriptor, NormalizationRule};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn dish(id: &str, ingredients: &[&str]) -> Dish {
        Dish {
            id: id.to_string(),
            name: Some(id.to_string()),
            title: None,
            label: None,
            emoji: Some("🍽️".to_string()),
            cuisine: None,
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn board_with(dishes: Vec<Dish>) -> Board {
        let catalogs = Catalogs::new(
            vec![AllergenDescriptor {
                token: "peanuts".into(),
                label: "Peanuts".into(),
                emoji: None,
            }],
            dishes,
            vec![NormalizationRule {
                pattern: "peanut".into(),
                flags: Some("i".into()),
                token: "peanuts".into(),
            }],
            vec![IngredientDescriptor {
                name: "peanuts".into(),
                emoji: None,
            }],
            Vec::new(),
        );
        Board::from_catalogs(catalogs).unwrap()
    }

    fn count(c: &WheelCandidates, source: SegmentSource) -> usize {
        c.segments.iter().filter(|s| s.source == source).count()
    }

    #[test]
    fn test_plan_examples() {
        assert_eq!(SegmentPlan::for_hearts(1), SegmentPlan { allergen: 1, safe: 7 });
        assert_eq!(SegmentPlan::for_hearts(5), SegmentPlan { allergen: 4, safe: 4 });
        assert_eq!(SegmentPlan::for_hearts(9), SegmentPlan { allergen: 7, safe: 1 });
        // Out-of-range hearts are clamped
        assert_eq!(allergen_segment_count(0), 1);
        assert_eq!(allergen_segment_count(42), 7);
    }

    #[test]
    fn test_plan_is_monotonic() {
        let counts: Vec<usize> = (MIN_HEARTS..=MAX_HEARTS).map(allergen_segment_count).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(counts.first(), Some(&MIN_ALLERGEN_SEGMENTS));
        assert_eq!(counts.last(), Some(&MAX_ALLERGEN_SEGMENTS));
    }

    #[test]
    fn test_roomy_catalog_uses_unique_dishes() {
        let mut dishes: Vec<Dish> = (0..6)
            .map(|i| dish(&format!("nutty-{i}"), &["peanut"]))
            .collect();
        dishes.extend((0..10).map(|i| dish(&format!("plain-{i}"), &["rice"])));
        let board = board_with(dishes);
        let mut rng = Pcg32::seed_from_u64(7);

        let c = build_wheel_candidates(&board, "peanuts", 5, &mut rng).unwrap();
        assert_eq!(c.len(), SEGMENT_COUNT);
        assert_eq!(count(&c, SegmentSource::Allergen), 4);
        assert_eq!(count(&c, SegmentSource::Safe), 4);

        let ids: HashSet<&str> = c.segments.iter().filter_map(|s| s.dish.as_ref()).map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), SEGMENT_COUNT);
        for s in &c.segments {
            let d = s.dish.as_ref().unwrap();
            let triggers = d.id.starts_with("nutty");
            assert_eq!(triggers, s.source == SegmentSource::Allergen);
        }
    }

    #[test]
    fn test_single_dish_catalog_still_fills_wheel() {
        let board = board_with(vec![dish("pb", &["peanut butter"])]);
        let mut rng = Pcg32::seed_from_u64(1);

        for hearts in MIN_HEARTS..=MAX_HEARTS {
            let c = build_wheel_candidates(&board, "peanuts", hearts, &mut rng).unwrap();
            assert_eq!(c.len(), SEGMENT_COUNT);
            assert!(c.segments.iter().all(|s| s.dish.as_ref().unwrap().id == "pb"));
        }
    }

    #[test]
    fn test_triggering_padding_never_borrows_unrelated_dishes() {
        let board = board_with(vec![
            dish("pb", &["peanut butter"]),
            dish("satay", &["peanut sauce"]),
            dish("salad", &["lettuce"]),
        ]);
        let mut rng = Pcg32::seed_from_u64(3);

        let c = build_wheel_candidates(&board, "peanuts", 9, &mut rng).unwrap();
        assert_eq!(count(&c, SegmentSource::Allergen), 2);
        assert_eq!(count(&c, SegmentSource::AllergenPadding), 5);
        for s in c.segments.iter().filter(|s| s.source == SegmentSource::AllergenPadding) {
            assert_ne!(s.dish.as_ref().unwrap().id, "salad");
        }
    }

    #[test]
    fn test_safe_shortfall_falls_back_to_triggering_dishes() {
        // Surprising but intentional: safe slots end up holding trap dishes
        let board = board_with(vec![
            dish("pb", &["peanut butter"]),
            dish("satay", &["peanut sauce"]),
            dish("salad", &["lettuce"]),
        ]);
        let mut rng = Pcg32::seed_from_u64(11);

        let c = build_wheel_candidates(&board, "peanuts", 1, &mut rng).unwrap();
        assert_eq!(c.len(), SEGMENT_COUNT);
        assert_eq!(count(&c, SegmentSource::Allergen), 1);
        assert_eq!(count(&c, SegmentSource::Safe), 1);
        assert_eq!(count(&c, SegmentSource::Leftover), 1);
        assert_eq!(count(&c, SegmentSource::AllergenFallback), 5);

        let allergen_id = c
            .segments
            .iter()
            .find(|s| s.source == SegmentSource::Allergen)
            .and_then(|s| s.dish.as_ref())
            .map(|d| d.id.clone())
            .unwrap();
        let leftover = c
            .segments
            .iter()
            .find(|s| s.source == SegmentSource::Leftover)
            .and_then(|s| s.dish.as_ref())
            .unwrap();
        assert_ne!(leftover.id, allergen_id);
        assert_ne!(leftover.id, "salad");
    }

    #[test]
    fn test_unresolvable_allergen_is_an_error() {
        let board = board_with(vec![dish("pb", &["peanut"])]);
        let mut rng = Pcg32::seed_from_u64(0);
        let err = build_wheel_candidates(&board, "shellfish", 3, &mut rng).unwrap_err();
        assert!(matches!(err, Error::UnknownAllergen(t) if t == "shellfish"));
    }

    #[test]
    fn test_unlabelled_dishes_fall_back_to_placeholder() {
        let mut blank = dish("", &["peanut"]);
        blank.name = None;
        let board = board_with(vec![blank]);
        let mut rng = Pcg32::seed_from_u64(0);

        let c = build_wheel_candidates(&board, "peanuts", 3, &mut rng).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.segments[0].source, SegmentSource::Placeholder);
        assert_eq!(c.segments[0].label.label, NO_MATCHES_LABEL);
        assert!(c.dish_at(0).is_none());
    }

    #[test]
    fn test_same_seed_same_wheel() {
        let board = board_with(
            (0..12)
                .map(|i| dish(&format!("d{i}"), if i % 3 == 0 { &["peanut"] } else { &["rice"] }))
                .collect(),
        );
        let a = build_wheel_candidates(&board, "peanuts", 4, &mut Pcg32::seed_from_u64(99)).unwrap();
        let b = build_wheel_candidates(&board, "peanuts", 4, &mut Pcg32::seed_from_u64(99)).unwrap();
        assert_eq!(a.labels(), b.labels());
    }

    proptest! {
        #[test]
        fn prop_wheel_always_full(hearts in 0u32..12, triggering in 1usize..5, safe in 0usize..12, seed in any::<u64>()) {
            let mut dishes: Vec<Dish> = (0..triggering).map(|i| dish(&format!("t{i}"), &["peanut"])).collect();
            dishes.extend((0..safe).map(|i| dish(&format!("s{i}"), &["rice"])));
            let board = board_with(dishes);
            let mut rng = Pcg32::seed_from_u64(seed);

            let plan = SegmentPlan::for_hearts(hearts);
            prop_assert_eq!(plan.allergen + plan.safe, SEGMENT_COUNT);
            prop_assert!((1..=7).contains(&plan.allergen));

            let c = build_wheel_candidates(&board, "peanuts", hearts, &mut rng).unwrap();
            prop_assert_eq!(c.len(), SEGMENT_COUNT);
            let traps = c.segments.iter().filter(|s| matches!(s.source, SegmentSource::Allergen | SegmentSource::AllergenPadding)).count();
            prop_assert_eq!(traps, plan.allergen);
        }
    }
}
