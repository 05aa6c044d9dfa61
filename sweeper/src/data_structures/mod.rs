pub mod constants;
mod devices;
mod fields;
mod room;
mod status;
pub mod time_format;

pub use devices::*;
pub use fields::*;
pub use room::Room;
pub use status::StatusEvent;
