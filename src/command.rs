//! UI intents and what the host has to do about them.
//!
//! Every control in either demo turns into exactly one [`Command`]. The
//! session applies it synchronously and answers with an [`Effect`] for the
//! parts it cannot do itself.

use crate::{
    camera::ViewPreset,
    garage::CarChoice,
    material::Color,
    motion::DriveInput,
    parts::PartCategory,
    stage::Environment,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SelectPart(PartCategory),
    /// Free colour picker, applied to the selected part.
    PickColor(Color),
    /// Swatch or custom colour of the showroom, always the body.
    PaintBody(Color),
    SetMetalness(f32),
    SetRoughness(f32),
    SelectBodyMaterial(usize),
    SelectRimMaterial(usize),
    SelectGlassMaterial(usize),
    SetCameraView(ViewPreset),
    Zoom(f32),
    SetFollowCamera(bool),
    SetAutoRotate(bool),
    SelectEnvironment(Environment),
    SetLighting(f32),
    SetShadows(bool),
    SelectCar(CarChoice),
    Drive(DriveInput),
    Screenshot,
    Share,
    ToggleFullscreen,
}

impl Command {
    /// Picking another car is the only thing that can interrupt a load.
    pub fn allowed_while_loading(&self) -> bool {
        matches!(self, Command::SelectCar(_))
    }
}

/// Follow-up work for the host.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    None,
    /// Start loading a car; the completion must carry `ticket`.
    Load { car: CarChoice, ticket: u64 },
    /// Re-render the current frame off screen and export it as PNG.
    Screenshot { file_name: &'static str },
    /// Publish the encoded configuration (`?config=` value).
    Share { encoded: String },
    ToggleFullscreen,
}

pub const SCREENSHOT_FILE_NAME: &str = "car-showroom-screenshot.png";
