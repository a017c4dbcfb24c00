//! # ecowear-shared
//!
//! Vocabulary shared between the EcoWear store and server crates: the closed
//! role enumeration, and the signed bearer token presented on every
//! authorized request.

pub mod token;
pub mod types;

pub use token::{AuthToken, TokenError};
pub use types::Role;
