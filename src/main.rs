//! Ballistic entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use ballistic::audio::AudioManager;
    use ballistic::platform::{KeyResponse, KeyState};
    use ballistic::renderer::Renderer;
    use ballistic::sim::{GameEvent, GameState, RoundPhase, SoundEffect, tick};
    use ballistic::{Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: Renderer,
        audio: AudioManager,
        keys: KeyState,
        settings: Settings,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// Leave the title screen
        fn start(&mut self) {
            self.audio.resume();
            if self.state.phase != RoundPhase::NotStarted {
                return;
            }
            if let Err(err) = self.state.start_game() {
                log::error!("Could not start game: {err}");
            }
        }

        /// Back to the title screen with the scores cleared
        fn new_match(&mut self) {
            if self.state.new_match() {
                self.keys.release_all();
                self.audio.play(SoundEffect::ButtonPush);
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.apply_settings(&self.settings);
            self.settings.save();
            log::info!("Sound {}", if self.settings.muted { "muted" } else { "on" });
        }

        /// Pause a running round when the page loses focus
        fn auto_pause(&mut self, reason: &str) {
            self.keys.release_all();
            if self.settings.auto_pause
                && self.state.phase == RoundPhase::Playing
                && !self.state.paused
            {
                self.keys.request_pause();
                log::info!("Auto-paused ({reason})");
            }
        }

        /// Run one simulation step
        fn update(&mut self, dt: f32, time: f64) {
            let input = self.keys.snapshot();
            if let Err(err) = tick(&mut self.state, &input, dt) {
                log::error!("Round restart failed: {err}");
            }

            let events = self.state.drain_events();
            self.audio.play_events(&events);
            for event in &events {
                if let GameEvent::RoundEnded { round, survivor } = event {
                    log::debug!("Round {round} ended, survivor {survivor:?}");
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Calculate FPS from oldest to newest frame
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&self) {
            let fps = self.settings.show_fps.then_some(self.fps);
            if let Err(err) = self.renderer.render(&self.state, fps) {
                log::warn!("Render error: {err:?}");
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Ballistic starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let state = GameState::new(Tuning::default(), seed);
        let renderer = Renderer::new(&canvas, &state, window.device_pixel_ratio())?;
        let audio = AudioManager::new(&settings);

        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            state,
            renderer,
            audio,
            keys: KeyState::new(),
            settings,
            last_time: 0.0,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        setup_input_handlers(&canvas, game.clone())?;
        setup_music_button(game.clone())?;
        setup_auto_pause(game.clone())?;

        // Start game loop
        request_animation_frame(game)?;

        log::info!("Ballistic running!");
        Ok(())
    }

    fn setup_input_handlers(
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Click on the title screen starts the match
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().start();
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let g = &mut *g;
                let code = event.code();
                match g.keys.key_down(&code, &g.settings.key_bindings) {
                    KeyResponse::Control(..) => event.prevent_default(),
                    KeyResponse::Start => {
                        event.prevent_default();
                        g.start();
                    }
                    KeyResponse::NewMatch => g.new_match(),
                    KeyResponse::Pause | KeyResponse::Ignored => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let g = &mut *g;
                g.keys.key_up(&event.code(), &g.settings.key_bindings);
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
        }

        if let Err(err) = request_animation_frame(game) {
            log::error!("Game loop stopped: {err:?}");
        }
    }

    fn setup_music_button(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;

        if let Some(btn) = document.get_element_by_id("music-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().toggle_mute();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

/// Headless match between two scripted tanks, for checking tuning files
#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use ballistic::Tuning;
    use ballistic::sim::{Action, GameEvent, GameState, Player, TickInput, tick};

    env_logger::init();
    log::info!("Ballistic (native) starting...");
    log::info!("Native mode runs a headless demo - build for wasm32 to play");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
        None => Tuning::default(),
    };
    let seed = match args.next() {
        Some(seed) => seed.parse()?,
        None => 42,
    };

    let mut state = GameState::new(tuning, seed);
    state.start_game()?;

    // Player one circles and fires, player two drives straight and fires
    let mut input = TickInput::default();
    input.press(Player::One, Action::Forward);
    input.press(Player::One, Action::RotateLeft);
    input.press(Player::One, Action::Fire);
    input.press(Player::Two, Action::Forward);
    input.press(Player::Two, Action::Fire);

    let frames = 60 * 120;
    for _ in 0..frames {
        tick(&mut state, &input, 1.0 / 60.0)?;
        for event in state.drain_events() {
            match event {
                GameEvent::Scored { player, score } => {
                    log::info!("{} scores ({score})", player.name());
                }
                GameEvent::RoundEnded { round, survivor } => {
                    log::info!(
                        "Round {round} won by {}",
                        survivor.map_or("nobody", Player::name)
                    );
                }
                _ => {}
            }
        }
    }

    println!(
        "After {} rounds: Player 1 {} - Player 2 {}",
        state.round,
        state.score(Player::One),
        state.score(Player::Two)
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
