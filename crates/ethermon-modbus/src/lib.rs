pub mod error;
pub mod poller;
pub mod session;

pub use error::{ModbusError, Result};
pub use poller::{PollingManager, DEFAULT_POLL_INTERVAL_MS};
pub use session::ModbusSession;
