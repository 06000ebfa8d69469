pub mod error;
pub mod handlers;
pub mod instance_extractor;
pub mod routes;

pub use error::*;
pub use handlers::*;
pub use instance_extractor::*;
pub use routes::*;
