//! Application event loop.
//!
//! [`run`] opens the window, creates the GPU [`Context`] and drives the
//! [`Session`] from winit events:
//!
//! 1. Window, keyboard and DOM input become [`Command`]s applied to the session
//! 2. The returned [`Effect`]s are carried out here (loads, screenshots, share, fullscreen)
//! 3. Every frame the session advances, the [`GpuScene`] copies its state and draws it
//!
//! Car loads are the only async work. Natively they run on a tokio runtime
//! owned by the app, on the web with `spawn_local`; both post the result
//! back as [`FlowEvent::Loaded`].

use std::{fmt::Debug, iter, sync::Arc};

use instant::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window},
};

use crate::{
    capture,
    command::{Command, Effect},
    context::Context,
    data_structures::{scene_graph::LoadedModel, texture::Texture},
    garage::CarChoice,
    input::Keyboard,
    launch::LaunchOptions,
    render::GpuScene,
    resources,
    session::Session,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// GPU context, the scene mirror and the session they render.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: GpuScene,
    session: Session,
    is_surface_configured: bool,
}

impl Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("state", &self.session.state())
            .field("is_surface_configured", &self.is_surface_configured)
            .finish()
    }
}

impl AppState {
    async fn new(window: Arc<Window>, session: Session) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &session).await?;
        let scene = GpuScene::new(&ctx, session.profile());
        Ok(Self {
            ctx,
            scene,
            session,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.camera.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        self.scene.sync(&mut self.ctx, &self.session);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.scene
            .encode(&self.ctx, &mut encoder, &view, &self.ctx.depth_texture.view);
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Accepts a finished load if it is still the one the session waits for.
    fn on_loaded(&mut self, ticket: u64, result: anyhow::Result<LoadedModel>) {
        match result {
            Ok(loaded) if self.session.is_current(ticket) => {
                self.scene.upload_car(&self.ctx, &loaded);
                if let Err(e) = self.session.complete_load(ticket, loaded) {
                    log::info!("{}", e);
                    self.scene.clear_car();
                }
            }
            Ok(loaded) => log::info!("Discarding {} from stale load #{}", loaded.car, ticket),
            Err(e) => self.session.fail_load(ticket, format!("{:#}", e)),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    /// Handed over to [`AppState`] once the window exists.
    session: Option<Session>,
    state: Option<AppState>,
    keyboard: Keyboard,
    cursor: Option<PhysicalPosition<f64>>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, options: &LaunchOptions) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            session: Some(Session::new(options)),
            state: None,
            keyboard: Keyboard::default(),
            cursor: None,
            last_time: Instant::now(),
        })
    }

    fn start(&mut self, mut app_state: AppState) {
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        #[cfg(target_arch = "wasm32")]
        crate::web::bind_controls(self.proxy.clone(), &app_state.session);

        let car = app_state.session.selection().car;
        let effect = app_state.session.apply(Command::SelectCar(car));
        self.state = Some(app_state);
        self.handle_effect(effect);
        self.last_time = Instant::now();
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }

    fn apply(&mut self, command: Command) {
        let Some(state) = &mut self.state else {
            return;
        };
        let effect = state.session.apply(command);
        self.handle_effect(effect);
    }

    fn handle_effect(&mut self, effect: Effect) {
        let Some(state) = &mut self.state else {
            return;
        };
        match effect {
            Effect::None => (),
            Effect::Load { car, ticket } => {
                state.scene.clear_car();
                self.spawn_load(car, ticket);
            }
            Effect::Screenshot { file_name } => {
                state.scene.sync(&mut state.ctx, &state.session);
                let frame = capture::capture(&state.ctx, &state.scene);
                #[cfg(not(target_arch = "wasm32"))]
                match self
                    .async_runtime
                    .block_on(frame.into_png())
                    .and_then(|png| Ok(std::fs::write(file_name, png)?))
                {
                    Ok(()) => log::info!("Saved screenshot to {}", file_name),
                    Err(e) => log::error!("Screenshot failed: {:#}", e),
                }
                #[cfg(target_arch = "wasm32")]
                wasm_bindgen_futures::spawn_local(async move {
                    match frame.into_png().await {
                        Ok(png) => crate::web::download(file_name, &capture::png_data_url(&png)),
                        Err(e) => log::error!("Screenshot failed: {:#}", e),
                    }
                });
            }
            Effect::Share { encoded } => {
                #[cfg(not(target_arch = "wasm32"))]
                log::info!("Share this configuration with: --config {}", encoded);
                #[cfg(target_arch = "wasm32")]
                crate::web::show_share_url(&encoded);
            }
            Effect::ToggleFullscreen => {
                let window = &state.ctx.window;
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
            }
        }
    }

    fn spawn_load(&self, car: CarChoice, ticket: u64) {
        let proxy = self.proxy.clone();
        let load = async move {
            let result = resources::load_car(car).await;
            if proxy.send_event(FlowEvent::Loaded { ticket, result }).is_err() {
                log::warn!("Event loop closed before load #{} finished", ticket);
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }
}

pub enum FlowEvent {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Initialized(Box<AppState>),
    Loaded {
        ticket: u64,
        result: anyhow::Result<LoadedModel>,
    },
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Command(Command),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(state) => f.debug_tuple("Initialized").field(state).finish(),
            Self::Loaded { ticket, result } => f
                .debug_struct("Loaded")
                .field("ticket", ticket)
                .field("ok", &result.is_ok())
                .finish(),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Car Configurator");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window, session)) {
                Ok(app_state) => self.start(app_state),
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new(window, session).await {
                    Ok(app_state) => {
                        if proxy
                            .send_event(FlowEvent::Initialized(Box::new(app_state)))
                            .is_err()
                        {
                            log::error!("Event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(app_state) => self.start(*app_state),
            FlowEvent::Loaded { ticket, result } => {
                if let Some(state) = &mut self.state {
                    state.on_loaded(ticket, result);
                    #[cfg(target_arch = "wasm32")]
                    crate::web::refresh(&state.session);
                }
            }
            FlowEvent::Command(command) => self.apply(command),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                state.session.update_frame(dt);

                match state.render() {
                    Ok(()) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {}", e),
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => state
                .session
                .orbit
                .set_dragging(button_state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.cursor.replace(position) {
                    state
                        .session
                        .orbit
                        .handle_mouse(position.x - last.x, position.y - last.y);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                state.session.orbit.set_dragging(false);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                state.session.orbit.handle_scroll(lines);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state.is_pressed();
                    if let Some(command) = self.keyboard.on_key(&state.session, code, pressed) {
                        self.apply(command);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run(options: LaunchOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    log::info!("Starting the {:?} with {}", options.variant, options.car);
    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, &options)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
