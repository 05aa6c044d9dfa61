pub mod admin;
pub mod control;
pub mod status;

pub use admin::AdminPanel;
pub use control::ControlPanel;
