//! Wallet, DID and session integration tests

use lib_identity::{
    create_did, derive_wallet, parse_did, AuthError, AuthService, SessionWallet, WalletError,
    WalletType,
};

#[test]
fn test_wallet_address_and_did_are_pure_functions_of_email() {
    let first = derive_wallet("donor@example.com").unwrap();
    let second = derive_wallet("donor@example.com").unwrap();
    assert_eq!(first.did(421614), second.did(421614));
    assert_eq!(parse_did(&first.did(421614)).unwrap(), first.address());
}

#[test]
fn test_email_login_matches_derivation() {
    let auth = AuthService::new(421614);
    let session = auth.login_with_email("donor@example.com", Some("Donor"), false).unwrap();
    let wallet = derive_wallet("donor@example.com").unwrap();

    assert_eq!(session.profile.wallet_address, wallet.address());
    assert_eq!(session.profile.did, create_did(&wallet.address(), 421614));
    assert_eq!(session.profile.wallet_type, WalletType::Embedded);
    assert!(session.signer().is_some());
    assert!(session.is_valid());
}

#[test]
fn test_empty_email_login_fails() {
    let auth = AuthService::default();
    assert_eq!(
        auth.login_with_email("", None, false).unwrap_err(),
        AuthError::Wallet(WalletError::EmptyEmail)
    );
}

#[test]
fn test_session_record_carries_no_key_material() {
    let auth = AuthService::default();
    let session = auth.login_with_email("donor@example.com", None, true).unwrap();
    let private_hex = derive_wallet("donor@example.com").unwrap().private_key().to_hex();

    let json = serde_json::to_string(&session.to_record()).unwrap();
    assert!(!json.contains(private_hex.trim_start_matches("0x")));
    assert!(!json.to_lowercase().contains("privatekey"));
}

#[test]
fn test_restore_rederives_embedded_key() {
    let auth = AuthService::default();
    let session = auth.login_with_email("donor@example.com", None, false).unwrap();
    let record = session.to_record();

    let restored = auth.restore(&record).unwrap();
    assert_eq!(restored.profile, session.profile);
    match restored.wallet() {
        SessionWallet::Embedded(wallet) => assert_eq!(wallet.address(), session.profile.wallet_address),
        other => panic!("expected embedded wallet, got {:?}", other),
    }
    auth.logout(restored);
}

#[test]
fn test_restore_detects_tampered_address() {
    let auth = AuthService::default();
    let mut record = auth
        .login_with_email("donor@example.com", None, false)
        .unwrap()
        .to_record();
    record.wallet_address = derive_wallet("someone-else@example.com").unwrap().address();

    assert!(matches!(
        auth.restore(&record),
        Err(AuthError::Wallet(WalletError::AddressMismatch { .. }))
    ));
}

#[test]
fn test_metamask_session_roundtrip() {
    let auth = AuthService::default();
    let address = derive_wallet("extension@example.com").unwrap().address();
    let session = auth.login_with_metamask(&address, 42161);
    assert!(session.profile.did.starts_with("did:ethr:arbitrum:"));

    let restored = auth.restore(&session.to_record()).unwrap();
    assert!(restored.signer().is_none());
    assert_eq!(restored.wallet().address(), address);
    assert_eq!(restored.profile.did, session.profile.did);
}
