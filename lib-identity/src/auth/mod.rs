//! Login sessions
//!
//! Three login paths (email, Google OAuth callback, MetaMask) produce a
//! `Session`. Sessions persist as a `SessionRecord` that never carries key
//! material; restoring an embedded-wallet session re-derives the key.

pub mod session;

pub use session::{
    AuthError, AuthService, Session, SessionRecord, SessionToken, SessionWallet, UserProfile,
};
