//! # wayfarer-shared
//!
//! Types, constants and cryptographic primitives shared by every Wayfarer
//! crate: traveler/group/message identifiers, the credential vault
//! (password hashing + authenticated encryption under a device-bound key)
//! and the session token manager.

pub mod constants;
pub mod session;
pub mod types;
pub mod vault;

mod error;

pub use error::{CryptoError, SessionError};
