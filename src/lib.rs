//! car-configurator
//!
//! Two browser-and-desktop 3D car demos on one small wgpu renderer: the
//! configurator, which loads a glTF car and lets the user swap materials per
//! part, and the showroom, which presents procedural sports cars with paint,
//! camera, environment and lighting controls.
//!
//! High-level modules
//! - `parts`: classification of mesh names into car parts
//! - `catalog`, `material`: preset materials and shared/owned bindings
//! - `session`: the load state machine and every UI command
//! - `command`, `input`, `web`: UI intents from the keyboard or the DOM
//! - `motion`, `camera`: spin, drive, follow camera and orbit controls
//! - `share`, `launch`: share URLs and query/CLI options
//! - `resources`: glTF loading and the procedural showroom cars
//! - `context`, `pipelines`, `render`, `capture`: GPU setup, drawing and screenshots
//! - `flow`: the winit event loop tying it together
//!

pub mod camera;
pub mod capture;
pub mod catalog;
pub mod command;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod garage;
pub mod input;
pub mod launch;
pub mod material;
pub mod motion;
pub mod parts;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod session;
pub mod share;
pub mod stage;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use flow::run;
pub use launch::LaunchOptions;
