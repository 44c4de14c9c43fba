//! Signature verification module

pub mod signature_verify;

// Re-export main functions
pub use signature_verify::{
    personal_message_hash, recover_personal_signer, recover_prehash_signer,
    verify_personal_signature,
};
