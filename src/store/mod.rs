pub mod memory;
pub mod models;

pub use memory::Store;
pub use models::{default_tariffs, Tariff, UserRecord};
