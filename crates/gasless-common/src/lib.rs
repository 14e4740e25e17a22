pub mod macros;
pub mod service;

pub use log;
