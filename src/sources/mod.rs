//! Sources module
//!
//! The identity service client and the two wire formats it speaks.

pub mod exchange;
pub mod identity;

pub use exchange::{ExchangeRequest, ExchangeStrategy, IssuedToken};
pub use identity::IdentityClient;
