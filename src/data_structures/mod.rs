//! Scene data: meshes, transforms, textures and the car model.
//!
//! - `model` contains vertex layouts, CPU geometry and uploaded meshes
//! - `texture` contains the GPU texture wrapper
//! - `instance` holds position, rotation and scale plus their GPU form
//! - `scene_graph` holds the loaded car and the per-mesh material bindings

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
