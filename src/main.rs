//! Flappy Fish entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MouseEvent, TouchEvent,
    };

    use flappy_fish::platform::web::{AnimationFrameScheduler, FrameCallback, RankingSocket};
    use flappy_fish::platform::{Command, command_for_key, command_for_pointer};
    use flappy_fish::persistence::{KeyValueStore, LocalStorageStore, MemoryStore};
    use flappy_fish::ranking::{RankingBoard, RankingMode, fetch_entries};
    use flappy_fish::renderer::{RenderError, RenderState, build_scene};
    use flappy_fish::scores::{ApiScoreRepository, ScoreService};
    use flappy_fish::sim::{GamePhase, Viewport};
    use flappy_fish::{App, FinishedGame, Settings, Tuning};

    type Storage = Box<dyn KeyValueStore>;
    type Scores = Rc<ScoreService<ApiScoreRepository>>;

    /// Game instance holding all state
    struct Game {
        app: App<AnimationFrameScheduler, Storage>,
        render_state: Option<RenderState>,
        board: RankingBoard,
        settings: Settings,
        settings_store: Storage,
        scores: Option<Scores>,
        ranking_socket: Option<RankingSocket>,
    }

    impl Game {
        /// Render the current frame
        fn render(&mut self) {
            let Some(ref mut render_state) = self.render_state else {
                return;
            };
            let vertices = build_scene(&self.app.snapshot());
            match render_state.render(&vertices) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = current_document() else {
                return;
            };
            let snapshot = self.app.snapshot();

            set_text(&document, "#hud-score .hud-value", &snapshot.score.to_string());
            set_text(&document, "#hud-best .hud-value", &snapshot.high_score.to_string());
            set_text(&document, "#hud-player .hud-value", snapshot.player_name);

            set_visible(&document, "pause-overlay", snapshot.phase == GamePhase::Paused);
            set_visible(&document, "game-over", snapshot.phase == GamePhase::GameOver);
            if snapshot.phase == GamePhase::GameOver {
                set_text(&document, "#final-score", &snapshot.score.to_string());
            }
        }

        /// Rebuild the ranking list from the board
        fn render_ranking(&self) {
            let Some(document) = current_document() else {
                return;
            };
            let Some(list) = document.get_element_by_id("ranking-list") else {
                return;
            };
            list.set_inner_html("");

            let rows = self.board.rows(chrono::Utc::now());
            if rows.is_empty() {
                if let Ok(item) = document.create_element("li") {
                    item.set_text_content(Some("No scores yet"));
                    let _ = list.append_child(&item);
                }
                return;
            }
            for row in rows {
                if let Ok(item) = document.create_element("li") {
                    item.set_text_content(Some(&format!(
                        "{}. {} - {} ({})",
                        row.rank, row.alias, row.points, row.when
                    )));
                    let _ = list.append_child(&item);
                }
            }
        }

        /// Push a live or loaded top list's best into the HUD
        fn seed_best_from_board(&mut self) {
            if self.board.mode() != RankingMode::Top {
                return;
            }
            if let Some(best) = self.board.best_points() {
                self.app.observe_best(best);
            }
        }

        fn remember_player(&mut self, name: &str) {
            self.settings.last_player_name = Some(name.to_string());
            if let Err(e) = self.settings.save(&mut self.settings_store) {
                log::warn!("Could not save settings: {}", e);
            }
        }
    }

    fn current_document() -> Option<Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let classes = el.class_list();
            let result = if visible {
                classes.remove_1("hidden")
            } else {
                classes.add_1("hidden")
            };
            if let Err(e) = result {
                log::warn!("Failed to toggle #{}: {:?}", id, e);
            }
        }
    }

    fn open_storage() -> Storage {
        match LocalStorageStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; progress will not persist", e);
                Box::new(MemoryStore::new())
            }
        }
    }

    fn canvas_viewport(canvas: &HtmlCanvasElement) -> Viewport {
        let (w, h) = (canvas.client_width(), canvas.client_height());
        if w <= 0 || h <= 0 {
            return Viewport::default();
        }
        Viewport::new(w as f32, h as f32)
    }

    /// Match the backing store to the CSS size; returns physical pixels
    fn size_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width().max(1) as f64 * dpr) as u32;
        let height = (canvas.client_height().max(1) as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    async fn init_renderer(
        canvas: HtmlCanvasElement,
        width: u32,
        height: u32,
        viewport: Viewport,
    ) -> Result<RenderState, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, width, height, viewport).await
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Flappy Fish starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        let (width, height) = size_canvas(&window, &canvas);
        let viewport = canvas_viewport(&canvas);

        let settings_store = open_storage();
        let settings = Settings::load(&settings_store);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let scheduler = AnimationFrameScheduler::new(window.clone());
        let frame_slot = scheduler.callback_slot();
        let app = App::new(seed, Tuning::default(), viewport, scheduler, open_storage());

        let scores = match ApiScoreRepository::new(&settings.api_base_url) {
            Ok(repo) => Some(Rc::new(ScoreService::new(repo))),
            Err(e) => {
                log::error!("Score API disabled: {}", e);
                None
            }
        };

        let game = Rc::new(RefCell::new(Game {
            app,
            render_state: None,
            board: RankingBoard::new(settings.effective_leaderboard_size()),
            settings,
            settings_store,
            scores,
            ranking_socket: None,
        }));

        log::info!("Game initialized with seed: {}", seed);

        install_frame_callback(&game, &frame_slot);

        // Rendering is optional; the HUD keeps working without it
        match init_renderer(canvas.clone(), width, height, viewport).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Rendering disabled: {}", e),
        }

        // Pre-fill the name field
        if let Some(name) = game.borrow().settings.last_player_name.clone() {
            if let Some(input) = name_input(&document) {
                input.set_value(&name);
            }
        }

        setup_input_handlers(&canvas, game.clone());
        setup_name_entry(game.clone());
        setup_ranking_panel(game.clone());
        setup_resize(canvas, game.clone());
        setup_auto_pause(game.clone());
        setup_unload(game.clone());
        connect_ranking_feed(game.clone());

        {
            let mut g = game.borrow_mut();
            g.render();
            g.update_hud();
        }

        // Initial leaderboard load also seeds the best score
        wasm_bindgen_futures::spawn_local(refresh_ranking(game));

        log::info!("Flappy Fish running!");
    }

    fn install_frame_callback(game: &Rc<RefCell<Game>>, slot: &FrameCallback) {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            game_loop(&game, time);
        });
        *slot.borrow_mut() = Some(closure);
    }

    fn game_loop(game: &Rc<RefCell<Game>>, time: f64) {
        let finished = {
            let mut g = game.borrow_mut();
            let outcome = g.app.on_frame(time);
            g.render();
            g.update_hud();
            outcome.finished
        };

        if let Some(finished) = finished {
            submit_score(game.clone(), finished);
        }
    }

    /// Apply a command and redraw right away (the loop may be stopped)
    fn dispatch(game: &Rc<RefCell<Game>>, command: Command) {
        let mut g = game.borrow_mut();
        if g.app.handle(command).is_some() {
            g.render();
            g.update_hud();
        }
    }

    fn submit_score(game: Rc<RefCell<Game>>, finished: FinishedGame) {
        let Some(service) = game.borrow().scores.clone() else {
            return;
        };
        if finished.new_high_score {
            log::info!("New high score: {}", finished.points);
        }
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = service.register(&finished.alias, finished.points).await {
                log::error!("Failed to submit score: {}", e);
            }
            refresh_ranking(game).await;
        });
    }

    async fn refresh_ranking(game: Rc<RefCell<Game>>) {
        let (service, mode, alias, limit) = {
            let g = game.borrow();
            (
                g.scores.clone(),
                g.board.mode(),
                g.app.state().player_name().to_string(),
                g.board.limit(),
            )
        };
        let Some(service) = service else {
            return;
        };

        let result = fetch_entries(&*service, mode, &alias, limit).await;

        let mut g = game.borrow_mut();
        g.board.set_loaded(result);
        g.seed_best_from_board();
        g.render_ranking();
        g.update_hud();
    }

    fn connect_ranking_feed(game: Rc<RefCell<Game>>) {
        let (enabled, url) = {
            let g = game.borrow();
            (g.settings.live_ranking, g.settings.ranking_hub_url.clone())
        };
        if !enabled {
            return;
        }

        let handler_game = game.clone();
        let socket = RankingSocket::connect(&url, move |messages| {
            let mut g = handler_game.borrow_mut();
            if g.board.apply_feed(messages) {
                g.seed_best_from_board();
                g.render_ranking();
                g.update_hud();
            }
        });
        match socket {
            Ok(socket) => game.borrow_mut().ranking_socket = Some(socket),
            Err(e) => log::error!("Live ranking unavailable: {:?}", e),
        }
    }

    fn name_input(document: &Document) -> Option<HtmlInputElement> {
        document
            .get_element_by_id("player-name")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    /// Start from the name field; blank names are rejected
    fn start_from_name_entry(game: &Rc<RefCell<Game>>) {
        let Some(document) = current_document() else {
            return;
        };
        let Some(input) = name_input(&document) else {
            return;
        };
        let name = input.value();

        let mut g = game.borrow_mut();
        if g.app.start(&name).is_none() {
            set_visible(&document, "name-error", true);
            return;
        }
        let name = g.app.state().player_name().to_string();
        g.remember_player(&name);

        set_visible(&document, "name-error", false);
        set_visible(&document, "name-entry", false);
        set_visible(&document, "hud", true);
        g.render();
        g.update_hud();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(document) = current_document() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let typing = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .is_some();
                if typing {
                    if event.code() == "Enter" {
                        start_from_name_entry(&game);
                    }
                    return;
                }
                if let Some(command) = command_for_key(&event.code()) {
                    event.prevent_default();
                    dispatch(&game, command);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click swims
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                dispatch(&game, command_for_pointer());
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch swims too
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                dispatch(&game, command_for_pointer());
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_name_entry(game: Rc<RefCell<Game>>) {
        let Some(document) = current_document() else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                start_from_name_entry(&game);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_ranking_panel(game: Rc<RefCell<Game>>) {
        let Some(document) = current_document() else {
            return;
        };

        // Toggle button
        if let Some(btn) = document.get_element_by_id("ranking-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let visible = {
                    let mut g = game.borrow_mut();
                    let visible = g.board.toggle();
                    g.app.set_ranking_open(visible);
                    g.update_hud();
                    visible
                };
                if let Some(document) = current_document() {
                    set_visible(&document, "ranking-panel", visible);
                }
                if visible {
                    wasm_bindgen_futures::spawn_local(refresh_ranking(game.clone()));
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Top / mine tabs
        for (id, mode) in [
            ("ranking-top", RankingMode::Top),
            ("ranking-mine", RankingMode::Player),
        ] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    game.borrow_mut().board.set_mode(mode);
                    wasm_bindgen_futures::spawn_local(refresh_ranking(game.clone()));
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let window_clone = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = size_canvas(&window_clone, &canvas);
            let viewport = canvas_viewport(&canvas);

            let mut g = game.borrow_mut();
            g.app.resize(viewport);
            if let Some(ref mut render_state) = g.render_state {
                render_state.resize(width, height);
                render_state.set_viewport(viewport);
            }
            g.render();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.app.pause().is_some() {
                        log::info!("Auto-paused (tab hidden)");
                        g.update_hud();
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.app.pause().is_some() {
                    log::info!("Auto-paused (window blur)");
                    g.update_hud();
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_unload(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.app.shutdown();
            if let Some(socket) = g.ranking_socket.take() {
                socket.close();
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy Fish (native) starting...");
    log::info!("Native mode runs a headless session - run with `trunk serve` for the web version");

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    headless::run(seed, 3);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Autopiloted sessions against in-memory storage, for smoke-testing the
/// loop without a browser
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use flappy_fish::clock::ManualScheduler;
    use flappy_fish::consts::FRAME_DT_MS;
    use flappy_fish::persistence::MemoryStore;
    use flappy_fish::platform::Command;
    use flappy_fish::scores::{InMemoryScoreRepository, ScoreService};
    use flappy_fish::sim::{GamePhase, GameState, Viewport};
    use flappy_fish::{App, Tuning};

    /// Give up on a session after this many frames (~2 minutes)
    const MAX_FRAMES: u32 = 60 * 120;

    /// Swim when falling below the middle of the next gap
    fn should_jump(state: &GameState) -> bool {
        let player = state.player();
        let target = state
            .obstacles()
            .iter()
            .find(|o| o.right() > player.x)
            .map(|o| o.top + o.gap * 0.5)
            .unwrap_or(state.viewport().height * 0.5);
        player.velocity >= 0.0 && player.y + player.height * 0.5 > target
    }

    pub fn run(seed: u64, sessions: u32) {
        let mut app = App::new(
            seed,
            Tuning::default(),
            Viewport::default(),
            ManualScheduler::new(),
            MemoryStore::new(),
        );
        let service = ScoreService::new(InMemoryScoreRepository::new());

        let mut now = 0.0_f64;

        for session in 1..=sessions {
            if app.state().phase() == GamePhase::GameOver {
                // Tap to restart
                app.handle(Command::Jump);
            } else {
                app.start("Autopilot");
            }

            let mut frames = 0;
            while app.is_running() && frames < MAX_FRAMES {
                if should_jump(app.state()) {
                    app.handle(Command::Jump);
                }
                now += FRAME_DT_MS as f64;
                frames += 1;

                if let Some(finished) = app.on_frame(now).finished {
                    if let Err(e) =
                        pollster::block_on(service.register(&finished.alias, finished.points))
                    {
                        log::error!("Failed to register score: {}", e);
                    }
                }
            }
            if let Some(unfinished) = app.abandon() {
                log::warn!(
                    "Session {} cut off after {} frames, registering {} as is",
                    session,
                    frames,
                    unfinished.points
                );
                if let Err(e) =
                    pollster::block_on(service.register(&unfinished.alias, unfinished.points))
                {
                    log::error!("Failed to register score: {}", e);
                }
            }
            log::info!(
                "Session {} ended after {} frames with score {}",
                session,
                frames,
                app.state().score()
            );

            app.shutdown();
        }

        match pollster::block_on(service.top_scores(5)) {
            Ok(top) => {
                for (rank, score) in top.iter().enumerate() {
                    log::info!("#{} {} - {}", rank + 1, score.alias, score.points);
                }
            }
            Err(e) => log::error!("Failed to read scores: {}", e),
        }
        log::info!("Best: {}", app.state().high_score());
    }
}
