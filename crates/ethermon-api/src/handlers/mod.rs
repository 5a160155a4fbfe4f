mod archives;
mod data;
mod devices;
mod modbus;
mod stats;

pub use archives::{create_zip, download_zip, get_archive, list_archives};
pub use data::{get_all_data, get_device_data};
pub use devices::{get_device, list_devices};
pub use modbus::{connect, disconnect, read, start_polling, stop_polling, write};
pub use stats::{get_device_stats, get_hourly_stats, get_stats, reset_stats};
