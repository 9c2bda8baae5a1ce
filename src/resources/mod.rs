//! Everything that turns a [`CarChoice`] into a [`LoadedModel`]: fetching
//! asset bytes, parsing glTF and building the procedural showroom cars.

use crate::{
    data_structures::scene_graph::LoadedModel,
    garage::{CarChoice, CarSource},
};

pub mod glb;
pub mod primitives;
pub mod procedural;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context as _;

    let window = web_sys::window().context("No browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Cannot read the page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads a file below the asset root: `./assets` natively, `{origin}/assets`
/// on the web.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?
    };

    Ok(data)
}

pub async fn load_car(car: CarChoice) -> anyhow::Result<LoadedModel> {
    match car.source() {
        CarSource::Asset(path) => {
            log::info!("Loading {} from {}", car, path);
            glb::load_glb(car, path).await
        }
        CarSource::Procedural => Ok(procedural::build_car(car)),
    }
}
