//! Error taxonomy and wire formats shared across `paycrypt` crates.

pub mod error;
pub mod protocol;

pub use error::CryptError;
pub use protocol::Envelope;
