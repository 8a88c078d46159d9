mod warden;

pub use warden::{ApiErrorBody, ApiErrorObject, WardenError};
