pub mod compare;
pub mod error;
pub mod model;
pub mod runtime;
pub mod strategies;

pub use error::BaselineError;
