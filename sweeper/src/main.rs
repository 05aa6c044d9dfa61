#[macro_use]
extern crate derive_more;

#[macro_use]
extern crate log;

mod app;
mod config;
mod data_structures;
mod device_registry;
mod error;
mod prelude;
mod simulation;
mod store;
mod util;
mod views;

pub use app::App;
pub use prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    App::new().await?.start().await
}
