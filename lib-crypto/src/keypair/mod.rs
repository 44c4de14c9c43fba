//! KeyPair management module

pub mod generation;

// Re-export main KeyPair type
pub use generation::KeyPair;
