pub use crate::{
    config::*,
    data_structures::{constants::*, *},
    device_registry::*,
    error::*,
};
pub use anyhow::{anyhow, Context, Error, Result};
pub use parking_lot::{Mutex, RwLock};
pub use std::sync::Arc;
