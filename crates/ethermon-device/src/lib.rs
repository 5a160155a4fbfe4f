pub mod error;
pub mod model;
pub mod registry;
pub mod store;

pub use error::{DeviceError, Result};
pub use model::{Device, DeviceSnapshot, Reading, Register, RegisterKind, RegisterValue};
pub use registry::DeviceRegistry;
pub use store::DataStore;
