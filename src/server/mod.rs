pub mod guards;
pub mod router;
pub mod routes;

pub use router::{WardenState, warden_router};
