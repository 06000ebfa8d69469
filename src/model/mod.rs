pub mod common;
pub mod instance;
pub mod manifest;

pub use common::*;
pub use instance::*;
pub use manifest::*;
