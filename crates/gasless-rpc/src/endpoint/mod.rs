pub mod badge;
pub mod common;
pub mod contract;
pub mod donate;
pub mod health;
mod validation;
