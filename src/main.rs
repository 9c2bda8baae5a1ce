#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use car_configurator::{LaunchOptions, launch::Cli};
    use clap::Parser;

    car_configurator::run(LaunchOptions::from(Cli::parse()))
}

// The web build starts from `web::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
