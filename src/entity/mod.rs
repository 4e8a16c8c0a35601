pub mod license_key;
pub mod user;

pub use license_key::{DurationClass, KeyStatus};
