//! Allergy Wheel entry point
//!
//! In the browser this loads the catalogs, wires the DOM and drives the wheel
//! from requestAnimationFrame. Natively it plays a seeded headless game and
//! reports each round through the log.

use std::cell::Cell;
use std::rc::Rc;

use allergy_wheel::wheel::SpinListener;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Holds the winner reported by the wheel until the game picks it up.
/// Resolving inside `on_stop` would re-enter the app while the wheel is
/// still borrowed.
struct WinnerSlot(Rc<Cell<Option<usize>>>);

impl SpinListener for WinnerSlot {
    fn on_tick(&mut self, index: usize) {
        log::trace!("Tick at segment {}", index);
    }

    fn on_stop(&mut self, winner: usize) {
        self.0.set(Some(winner));
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlCanvasElement, HtmlSelectElement, Response};

    use allergy_wheel::catalog::{CatalogSources, Catalogs};
    use allergy_wheel::game::{GameController, GamePresenter, RoundStatus, SpinOutcome};
    use allergy_wheel::wheel::web::{CanvasSurface, RafScheduler};
    use allergy_wheel::wheel::{ResetOptions, Wheel, WheelTuning};
    use allergy_wheel::{Error, Preferences, WheelLabelDescriptor};

    use super::WinnerSlot;

    /// Raw catalog text fetched from the server
    struct CatalogTexts {
        allergens: String,
        dishes: String,
        normalization: String,
        ingredients: String,
        countries: Option<String>,
    }

    impl CatalogTexts {
        async fn fetch() -> Result<Self, JsValue> {
            Ok(Self {
                allergens: fetch_text("data/allergens.json").await?,
                dishes: fetch_text("data/dishes.json").await?,
                normalization: fetch_text("data/normalization.json").await?,
                ingredients: fetch_text("data/ingredients.json").await?,
                // Flags are decoration only
                countries: fetch_text("data/countries.json").await.ok(),
            })
        }

        fn sources(&self) -> CatalogSources<'_> {
            CatalogSources {
                allergens: &self.allergens,
                dishes: &self.dishes,
                normalization: &self.normalization,
                ingredients: &self.ingredients,
                countries: self.countries.as_deref(),
            }
        }
    }

    async fn fetch_text(url: &str) -> Result<String, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }
        JsFuture::from(response.text()?)
            .await?
            .as_string()
            .ok_or_else(|| JsValue::from_str("response body is not text"))
    }

    /// Writes game events into the page
    struct DomPresenter {
        document: Document,
    }

    impl DomPresenter {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("hidden", hidden);
            }
        }

        fn allergen_picker(&self) -> Option<HtmlSelectElement> {
            self.document
                .get_element_by_id("allergen-select")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        }
    }

    impl GamePresenter for DomPresenter {
        fn show_wheel(&mut self, labels: &[WheelLabelDescriptor]) {
            log::debug!("Showing {} segments", labels.len());
            self.set_text("result", "");
            self.set_text("ingredients", "");
        }

        fn show_outcome(&mut self, outcome: &SpinOutcome) {
            let flag = outcome.cuisine_flag.as_deref().unwrap_or("");
            let verdict = if outcome.triggered {
                format!("{} {} contains {}!", flag, outcome.label, outcome.allergen)
            } else {
                format!("{} {} is safe!", flag, outcome.label)
            };
            self.set_text("result", verdict.trim());

            let ingredients: Vec<String> = outcome
                .ingredients
                .iter()
                .map(|i| {
                    let emoji = i.emoji.as_deref().unwrap_or("•");
                    let warn = if i.triggers { " ⚠️" } else { "" };
                    format!("{} {}{}", emoji, i.name, warn)
                })
                .collect();
            self.set_text("ingredients", &ingredients.join("  "));
        }

        fn show_hearts(&mut self, hearts: u32) {
            self.set_text("hearts", &"❤️".repeat(hearts as usize));
        }

        fn show_game_over(&mut self, status: RoundStatus, rounds: u32) {
            let text = match status {
                RoundStatus::Won => format!("You won in {} rounds!", rounds),
                RoundStatus::Lost => format!("Out of hearts after {} rounds", rounds),
                RoundStatus::Continue => return,
            };
            self.set_text("game-over-text", &text);
            self.set_hidden("game-over", false);
        }

        fn show_load_error(&mut self, error: &Error) {
            log::error!("Failed to load game data: {}", error);
            self.set_text("load-error", &error.to_string());
            self.set_hidden("load-error", false);
        }
    }

    /// Everything the event handlers share
    struct App {
        controller: GameController,
        wheel: Wheel<RafScheduler>,
        presenter: DomPresenter,
        winner: Rc<Cell<Option<usize>>>,
    }

    impl App {
        fn on_frame(&mut self, time: f64) {
            self.wheel.frame(time);
            if let Some(winner) = self.winner.take() {
                if let Err(e) = self.controller.finish_spin(winner, &mut self.presenter) {
                    log::warn!("Could not resolve spin: {}", e);
                }
            }
        }

        fn spin(&mut self) {
            if self.wheel.is_spinning() {
                self.wheel.spin(None);
                return;
            }
            match self.controller.begin_spin(&mut self.presenter) {
                Ok(labels) => {
                    self.wheel.set_labels(labels);
                    self.wheel.spin(None);
                }
                Err(e) => {
                    log::warn!("Cannot spin: {}", e);
                    self.presenter.set_text("result", &e.to_string());
                }
            }
        }

        fn stop(&mut self) {
            self.wheel.stop();
        }

        fn select_allergen(&mut self, token: &str) {
            if self.wheel.is_spinning() {
                return;
            }
            match self.controller.select_allergen(token) {
                Ok(allergen) => {
                    let label = allergen.label.clone();
                    self.presenter.set_text("selected-allergen", &label);
                }
                Err(e) => log::warn!("{}", e),
            }
            self.wheel.set_labels(Vec::new());
            self.wheel.reset_for_new_spin(ResetOptions {
                randomize_start: true,
            });
        }

        /// Select whatever the picker shows, falling back to the first allergen
        fn select_shown_allergen(&mut self) {
            let shown = self
                .presenter
                .allergen_picker()
                .map(|picker| picker.value())
                .filter(|value| !value.is_empty());
            if let Some(token) = shown {
                self.select_allergen(&token);
                return;
            }
            match self.controller.select_default_allergen() {
                Ok(allergen) => {
                    let (token, label) = (allergen.token.clone(), allergen.label.clone());
                    if let Some(picker) = self.presenter.allergen_picker() {
                        picker.set_value(&token);
                    }
                    self.presenter.set_text("selected-allergen", &label);
                }
                Err(e) => log::warn!("No allergen to select: {}", e),
            }
        }

        fn cycle_avatar(&mut self) {
            let preferences = &mut self.controller.session_mut().preferences;
            let avatar = preferences.cycle_avatar().to_string();
            preferences.save();
            self.presenter.set_text("avatar", &avatar);
        }

        fn restart(&mut self) {
            self.controller.restart();
            self.winner.set(None);
            self.wheel.set_labels(Vec::new());
            self.wheel.reset_for_new_spin(ResetOptions::default());
            self.presenter.set_hidden("game-over", true);
            self.presenter.set_text("result", "");
            self.presenter.set_text("ingredients", "");
            self.presenter.show_hearts(self.controller.session().hearts);
            self.select_shown_allergen();
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Allergy Wheel starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let mut presenter = DomPresenter {
            document: document.clone(),
        };

        let texts = match CatalogTexts::fetch().await {
            Ok(texts) => texts,
            Err(e) => {
                log::error!("Catalog fetch failed: {:?}", e);
                presenter.set_text("load-error", "Could not load game data");
                presenter.set_hidden("load-error", false);
                return Ok(());
            }
        };
        presenter.set_hidden("loading", true);

        let preferences = Preferences::load();
        let seed = js_sys::Date::now() as u64;
        let controller = match Catalogs::from_json(&texts.sources())
            .and_then(|catalogs| GameController::new(catalogs, preferences.clone(), seed))
        {
            Ok(controller) => controller,
            Err(e) => {
                presenter.show_load_error(&e);
                return Ok(());
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("wheel")
            .ok_or_else(|| JsValue::from_str("no #wheel canvas"))?
            .dyn_into()?;
        let winner = Rc::new(Cell::new(None));
        let mut wheel = Wheel::new(RafScheduler::new(), WheelTuning::default(), seed);
        wheel.register_spin_callbacks(Box::new(WinnerSlot(winner.clone())));
        wheel.set_spin_duration(preferences.spin_duration_ms);
        wheel.set_revolutions(preferences.revolutions);
        wheel.set_reduced_motion(preferences.reduced_motion);
        wheel.initialize(Box::new(CanvasSurface::new(canvas)?));

        presenter.show_hearts(controller.session().hearts);
        presenter.set_text("avatar", &preferences.avatar);
        populate_allergens(&document, &controller)?;

        let app = Rc::new(RefCell::new(App {
            controller,
            wheel,
            presenter,
            winner,
        }));

        // Frames go through a weak handle so the scheduler does not keep the app alive
        let weak = Rc::downgrade(&app);
        let on_frame: Rc<dyn Fn(f64)> = Rc::new(move |time: f64| {
            if let Some(app) = weak.upgrade() {
                app.borrow_mut().on_frame(time);
            }
        });
        app.borrow_mut().wheel.scheduler_mut().set_callback(on_frame);
        app.borrow_mut().select_shown_allergen();

        on_click(&document, "spin-btn", app.clone(), App::spin);
        on_click(&document, "stop-btn", app.clone(), App::stop);
        on_click(&document, "restart-btn", app.clone(), App::restart);
        on_click(&document, "avatar-btn", app.clone(), App::cycle_avatar);
        setup_allergen_select(&document, app.clone());
        setup_resize(app);

        log::info!("Allergy Wheel running!");
        Ok(())
    }

    fn populate_allergens(document: &Document, controller: &GameController) -> Result<(), JsValue> {
        let Some(select) = document.get_element_by_id("allergen-select") else {
            return Ok(());
        };
        for allergen in controller.allergens() {
            let option = document.create_element("option")?;
            option.set_attribute("value", &allergen.token)?;
            let text = match &allergen.emoji {
                Some(emoji) => format!("{} {}", emoji, allergen.label),
                None => allergen.label.clone(),
            };
            option.set_text_content(Some(&text));
            select.append_child(&option)?;
        }
        Ok(())
    }

    fn on_click(document: &Document, id: &str, app: Rc<RefCell<App>>, action: fn(&mut App)) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                action(&mut app.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_allergen_select(document: &Document, app: Rc<RefCell<App>>) {
        let Some(select) = document
            .get_element_by_id("allergen-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };
        let target = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().select_allergen(&target.value());
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().wheel.ensure_size();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::rc::Rc;

    use allergy_wheel::game::{GameController, LogPresenter};
    use allergy_wheel::wheel::{ManualScheduler, Wheel, WheelTuning};
    use allergy_wheel::{Catalogs, Preferences, Result};

    use super::WinnerSlot;

    /// Spin length when the player would otherwise stop the wheel by hand
    const DEFAULT_SPIN_MS: f64 = 1500.0;
    const MAX_ROUNDS: u32 = 200;
    /// Frames allowed per spin on the fake clock
    const MAX_FRAMES: usize = 60 * 60;

    /// Play one game on the bundled catalogs: `allergy-wheel [seed] [allergen]`
    pub fn run() -> Result<()> {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
        let allergen = args.next().unwrap_or_else(|| "peanuts".to_string());

        let preferences = Preferences::load();
        let mut controller = GameController::new(Catalogs::bundled()?, preferences.clone(), seed)?;
        let mut presenter = LogPresenter;
        controller.select_allergen(&allergen)?;

        let winner = Rc::new(Cell::new(None));
        let mut wheel = Wheel::new(ManualScheduler::default(), WheelTuning::default(), seed);
        wheel.register_spin_callbacks(Box::new(WinnerSlot(winner.clone())));
        wheel.set_spin_duration(if preferences.spin_duration_ms > 0.0 {
            preferences.spin_duration_ms
        } else {
            DEFAULT_SPIN_MS
        });
        wheel.set_revolutions(preferences.revolutions);
        wheel.set_reduced_motion(preferences.reduced_motion);

        println!(
            "{} Allergy Wheel (seed {}, allergen {})",
            preferences.avatar, seed, allergen
        );
        while !controller.session().is_over() && controller.session().rounds_played < MAX_ROUNDS {
            let labels = controller.begin_spin(&mut presenter)?;
            wheel.set_labels(labels);
            wheel.spin(None);
            wheel.pump(MAX_FRAMES);

            let Some(index) = winner.take() else {
                log::warn!("Wheel did not settle within {} frames", MAX_FRAMES);
                break;
            };
            let outcome = controller.finish_spin(index, &mut presenter)?;
            println!(
                "  {:>2}. {:<24} {:<6} hearts: {}",
                controller.session().rounds_played,
                outcome.label,
                if outcome.triggered { "TRAP" } else { "safe" },
                outcome.hearts
            );
        }

        let session = controller.session();
        println!(
            "Finished: {:?} with {} hearts after {} rounds",
            session.status, session.hearts, session.rounds_played
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Allergy Wheel (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
