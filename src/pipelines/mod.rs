//! Render pipelines and the uniforms that feed them.
//!
//! - `basic` holds the shared pipeline builder and the opaque pipeline
//! - `transparent` draws glass and the ground with premultiplied blending
//! - `light` packs the stage lights, sky palette, fog and contact shadow

pub mod basic;
pub mod light;
pub mod transparent;
