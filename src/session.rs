//! The configurator state machine.
//!
//! A [`Session`] owns everything the UI can change: the loaded car and its
//! part classification, the preset selection, camera and drive state and the
//! stage settings. It never touches the GPU. The event loop feeds it
//! [`Command`]s and load completions, calls [`Session::update_frame`] once
//! per frame and renders whatever the session holds afterwards.
//!
//! Loading runs `Idle -> Loading(ticket) -> Classified -> Ready`. Every load
//! gets a fresh ticket and only the completion carrying the latest ticket is
//! accepted, so a slow asset can never replace a car picked after it.

use std::fmt;

use cgmath::{EuclideanSpace, Point3};
use instant::Duration;

use crate::{
    camera::{Camera, OrbitController},
    catalog::{MaterialBinding, MaterialCatalog, MaterialPreset},
    command::{Command, Effect, SCREENSHOT_FILE_NAME},
    data_structures::scene_graph::{CarModel, LoadedModel},
    garage::CarChoice,
    launch::{AppVariant, LaunchOptions, Profile},
    material::{Color, Material},
    motion::{self, CarControls},
    parts::{Classification, PartCategory},
    share::ShareConfig,
    stage::{Environment, Stage},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { ticket: u64 },
    /// Meshes are bucketed but presets are not bound yet.
    Classified,
    Ready,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("load #{ticket} was superseded (current: {current:?})")]
    Stale { ticket: u64, current: Option<u64> },
}

/// What the user has picked so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub part: PartCategory,
    pub body: usize,
    pub rim: usize,
    pub glass: usize,
    pub car: CarChoice,
}

pub struct Session {
    profile: Profile,
    catalog: MaterialCatalog,
    selection: Selection,
    state: LoadState,
    last_ticket: u64,
    model: Option<CarModel>,
    classification: Classification,
    pending_config: Option<ShareConfig>,
    follow_camera: bool,
    auto_rotate: bool,
    pub camera: Camera,
    pub orbit: OrbitController,
    pub controls: CarControls,
    pub stage: Stage,
}

impl Session {
    pub fn new(options: &LaunchOptions) -> Self {
        let profile = options.profile();
        let environment = match profile.variant {
            AppVariant::Configurator => Environment::Sky,
            AppVariant::Showroom => Environment::Showroom,
        };
        let mut orbit = OrbitController::new();
        orbit.enabled = profile.orbit_controls;
        Self {
            selection: Selection {
                part: PartCategory::CarBody,
                body: MaterialCatalog::DEFAULT_BODY,
                rim: MaterialCatalog::DEFAULT_RIM,
                glass: MaterialCatalog::DEFAULT_GLASS,
                car: options.car,
            },
            catalog: MaterialCatalog::new(),
            state: LoadState::Idle,
            last_ticket: 0,
            model: None,
            classification: Classification::default(),
            pending_config: options.config,
            follow_camera: profile.follow_camera,
            auto_rotate: true,
            camera: Camera::new(profile.eye, profile.target),
            orbit,
            controls: CarControls::default(),
            stage: Stage::new(environment, profile.fog),
            profile,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn model(&self) -> Option<&CarModel> {
        self.model.as_ref()
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn follow_camera(&self) -> bool {
        self.follow_camera
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Part categories the part dropdown should offer.
    pub fn available_parts(&self) -> Vec<PartCategory> {
        self.classification.available()
    }

    /// Starts loading `car`, dropping the current one. Returns the ticket the
    /// completion has to present.
    pub fn begin_load(&mut self, car: CarChoice) -> u64 {
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        self.state = LoadState::Loading { ticket };
        self.selection.car = car;
        self.model = None;
        self.classification = Classification::default();
        self.controls.speed = 0.0;
        log::info!("Loading '{}' (#{})", car, ticket);
        ticket
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.state == LoadState::Loading { ticket }
    }

    fn current_ticket(&self) -> Option<u64> {
        match self.state {
            LoadState::Loading { ticket } => Some(ticket),
            _ => None,
        }
    }

    /// Accepts the result of load `ticket`: classifies the meshes, binds the
    /// selected presets and replays a pending share configuration.
    pub fn complete_load(&mut self, ticket: u64, loaded: LoadedModel) -> Result<(), LoadError> {
        if !self.is_current(ticket) {
            log::info!("Discarding stale load #{}", ticket);
            return Err(LoadError::Stale {
                ticket,
                current: self.current_ticket(),
            });
        }

        let mut model = CarModel::from_loaded(loaded);
        self.classification = Classification::build(model.names());
        for mesh in &mut model.meshes {
            mesh.binding.make_owned().env_map = true;
            mesh.cast_shadow = self.stage.shadows;
            mesh.receive_shadow = self.stage.shadows;
        }
        log::info!("'{}': {}", model.car, self.classification);
        let available = self.classification.available();
        if !available.contains(&self.selection.part) {
            if let Some(&first) = available.first() {
                log::debug!("'{}' has no {}, selecting {}", model.car, self.selection.part, first);
                self.selection.part = first;
            }
        }
        self.model = Some(model);
        self.state = LoadState::Classified;

        if self.profile.variant == AppVariant::Configurator {
            self.update_materials();
        }
        self.state = LoadState::Ready;

        if let Some(config) = self.pending_config.take() {
            self.apply_share_config(config);
        }
        Ok(())
    }

    /// Records a failed load. The session stays without a car.
    pub fn fail_load(&mut self, ticket: u64, reason: impl fmt::Display) {
        if !self.is_current(ticket) {
            log::info!("Ignoring failure of stale load #{}: {}", ticket, reason);
            return;
        }
        log::error!("Failed to load '{}': {}", self.selection.car, reason);
        self.state = LoadState::Idle;
        self.model = None;
    }

    fn apply_share_config(&mut self, config: ShareConfig) {
        if config.car != self.selection.car {
            log::info!(
                "Shared configuration is for '{}', not '{}'",
                config.car,
                self.selection.car
            );
            return;
        }
        log::info!("Applying shared configuration for '{}'", config.car);
        self.edit_bucket(PartCategory::CarBody, |material| {
            material.color = config.color;
            material.metalness = config.metalness;
            material.roughness = config.roughness;
        });
    }

    /// Binds the selected body, rim and glass presets to their buckets.
    /// Every mesh in a bucket shares the very same preset.
    pub fn update_materials(&mut self) {
        let body = self.catalog.main_preset(self.selection.body).cloned();
        let rim = self.catalog.main_preset(self.selection.rim).cloned();
        let glass = self.catalog.glass_preset(self.selection.glass).cloned();
        for (category, preset) in [
            (PartCategory::CarBody, body),
            (PartCategory::Rims, rim),
            (PartCategory::Glass, glass),
        ] {
            if let Some(preset) = preset {
                self.bind_bucket(category, &preset);
            }
        }
    }

    fn bind_bucket(&mut self, category: PartCategory, preset: &MaterialPreset) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        for &idx in self.classification.bucket(category) {
            if let Some(mesh) = model.mesh_mut(idx) {
                mesh.binding = MaterialBinding::Shared(preset.clone());
            }
        }
    }

    /// Runs `edit` on an owned copy of every material in the bucket.
    fn edit_bucket(&mut self, category: PartCategory, edit: impl Fn(&mut Material)) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        for &idx in self.classification.bucket(category) {
            if let Some(mesh) = model.mesh_mut(idx) {
                edit(mesh.binding.make_owned());
            }
        }
    }

    /// The body material of the current car as a share configuration.
    pub fn share_config(&self) -> Option<ShareConfig> {
        let model = self.model.as_ref()?;
        let first = *self.classification.bucket(PartCategory::CarBody).first()?;
        let material = model.meshes.get(first)?.material();
        Some(ShareConfig {
            car: model.car,
            color: material.color,
            metalness: material.metalness,
            roughness: material.roughness,
        })
    }

    pub fn apply(&mut self, command: Command) -> Effect {
        if !self.is_ready() && !command.allowed_while_loading() {
            log::debug!("Ignoring {:?} while {:?}", command, self.state);
            return Effect::None;
        }

        match command {
            Command::SelectPart(part) => self.selection.part = part,
            Command::PickColor(color) => self.pick_color(color),
            Command::PaintBody(color) => {
                self.edit_bucket(PartCategory::CarBody, |material| material.color = color)
            }
            Command::SetMetalness(value) => {
                let value = value.clamp(0.0, 1.0);
                self.edit_bucket(PartCategory::CarBody, |material| material.metalness = value)
            }
            Command::SetRoughness(value) => {
                let value = value.clamp(0.0, 1.0);
                self.edit_bucket(PartCategory::CarBody, |material| material.roughness = value)
            }
            Command::SelectBodyMaterial(idx) => {
                if self.catalog.main_preset(idx).is_some() {
                    self.selection.body = idx;
                    self.update_materials();
                } else {
                    log::warn!("No body material #{}", idx);
                }
            }
            Command::SelectRimMaterial(idx) => {
                if self.catalog.main_preset(idx).is_some() {
                    self.selection.rim = idx;
                    self.update_materials();
                } else {
                    log::warn!("No rim material #{}", idx);
                }
            }
            Command::SelectGlassMaterial(idx) => {
                if self.catalog.glass_preset(idx).is_some() {
                    self.selection.glass = idx;
                    self.update_materials();
                } else {
                    log::warn!("No glass material #{}", idx);
                }
            }
            Command::SetCameraView(view) => self.camera.set_view(view),
            Command::Zoom(distance) => self.camera.set_distance(distance),
            Command::SetFollowCamera(follow) => self.follow_camera = follow,
            Command::SetAutoRotate(enabled) => {
                self.auto_rotate = enabled;
                self.orbit.auto_rotate = enabled;
            }
            Command::SelectEnvironment(environment) => self.stage.environment = environment,
            Command::SetLighting(intensity) => self.stage.set_lighting(intensity),
            Command::SetShadows(enabled) => {
                self.stage.shadows = enabled;
                if let Some(model) = self.model.as_mut() {
                    for mesh in &mut model.meshes {
                        mesh.cast_shadow = enabled;
                        mesh.receive_shadow = enabled;
                    }
                }
            }
            Command::SelectCar(car) => {
                if !self.profile.offers(car) {
                    log::warn!("'{}' is not offered here", car);
                    return Effect::None;
                }
                let ticket = self.begin_load(car);
                return Effect::Load { car, ticket };
            }
            Command::Drive(input) => self.controls.input = input,
            Command::Screenshot => {
                return Effect::Screenshot {
                    file_name: SCREENSHOT_FILE_NAME,
                };
            }
            Command::Share => {
                let Some(config) = self.share_config() else {
                    log::warn!("Nothing to share: the car has no body meshes");
                    return Effect::None;
                };
                return match config.encode() {
                    Ok(encoded) => Effect::Share { encoded },
                    Err(e) => {
                        log::warn!("Could not encode configuration: {}", e);
                        Effect::None
                    }
                };
            }
            Command::ToggleFullscreen => return Effect::ToggleFullscreen,
        }
        Effect::None
    }

    fn pick_color(&mut self, color: Color) {
        match self.selection.part {
            part @ (PartCategory::CarBody | PartCategory::Rims | PartCategory::Wheels) => {
                self.edit_bucket(part, |material| material.color = color)
            }
            part => log::debug!("Colour picker does not apply to {}", part),
        }
    }

    /// Advances car and camera by `dt`.
    pub fn update_frame(&mut self, dt: Duration) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let secs = dt.as_secs_f32();

        if self.auto_rotate {
            model.transform.rotate_y(secs * self.profile.spin_speed);
        }
        self.controls
            .update(&mut model.transform, secs * motion::DRIVE_TIME_SCALE);
        if motion::recover_out_of_bounds(&mut model.transform, &mut self.controls) {
            log::debug!("Car left the track, back to the start");
        }

        let position = model.transform.position;
        if self.follow_camera {
            let target = motion::follow_target(position);
            self.camera.eye = motion::damp(self.camera.eye, target, motion::FOLLOW_DAMPING, secs);
        } else if self.orbit.enabled {
            self.orbit.update(&mut self.camera, dt);
        } else {
            self.camera.eye = self.profile.eye;
        }
        self.camera.look_at(Point3::from_vec(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{instance::Instance, model::MeshGeometry};

    fn configurator() -> Session {
        Session::new(&LaunchOptions::default())
    }

    fn kia(names: &[&str]) -> LoadedModel {
        let mut loaded = LoadedModel::new(CarChoice::Kia);
        for name in names {
            loaded.push(name, MeshGeometry::default(), Material::named(name), Instance::new());
        }
        loaded
    }

    #[test]
    fn commands_wait_for_ready() {
        let mut session = configurator();
        assert_eq!(session.apply(Command::SelectPart(PartCategory::Rims)), Effect::None);
        assert_eq!(session.selection().part, PartCategory::CarBody);

        let ticket = session.begin_load(CarChoice::Kia);
        assert_eq!(session.apply(Command::SetShadows(false)), Effect::None);
        assert!(session.stage.shadows);

        session.complete_load(ticket, kia(&["body"])).unwrap();
        assert!(session.is_ready());
        session.apply(Command::SetShadows(false));
        assert!(!session.stage.shadows);
        assert!(!session.model().unwrap().meshes[0].cast_shadow);
    }

    #[test]
    fn failed_load_returns_to_idle() {
        let mut session = configurator();
        let ticket = session.begin_load(CarChoice::Audi);
        session.fail_load(ticket, "404");
        assert_eq!(session.state(), LoadState::Idle);
        assert!(session.model().is_none());
    }

    #[test]
    fn showroom_keeps_factory_paint() {
        let mut session = Session::new(&LaunchOptions {
            variant: AppVariant::Showroom,
            car: CarChoice::Ferrari,
            config: None,
        });
        let ticket = session.begin_load(CarChoice::Ferrari);
        let mut loaded = LoadedModel::new(CarChoice::Ferrari);
        loaded.push(
            "body",
            MeshGeometry::default(),
            Material::named("paint").with_color(CarChoice::Ferrari.paint()),
            Instance::new(),
        );
        session.complete_load(ticket, loaded).unwrap();
        let body = session.model().unwrap().meshes[0].material();
        assert_eq!(body.color, Color::from_hex(0xff0000));
        assert!(body.env_map);
    }

    #[test]
    fn spin_follows_profile_speed() {
        let mut session = configurator();
        let ticket = session.begin_load(CarChoice::Kia);
        session.complete_load(ticket, kia(&["body"])).unwrap();
        session.update_frame(Duration::from_secs(1));
        let forward = session.model().unwrap().transform.forward();
        approx::assert_relative_eq!(forward.x, 0.5f32.sin(), epsilon = 1e-5);
        assert_eq!(session.camera.eye, session.profile().eye);
    }
}
