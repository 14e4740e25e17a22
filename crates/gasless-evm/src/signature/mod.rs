pub mod authorization;
pub mod permit;

pub use authorization::AuthorizationSigner;
pub use permit::{PermitAuthorization, PermitSigner};
