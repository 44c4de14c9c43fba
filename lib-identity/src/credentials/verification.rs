//! Credential signing and verification
//!
//! The signed message is the canonical JSON of the credential without its
//! proof: object keys sorted lexicographically at every depth, no whitespace.
//! Sorting makes the bytes independent of field order, so a credential that
//! has been stored and parsed again still reproduces what was signed.

use lib_crypto::{recover_personal_signer, Signature};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::issuance::now_rfc3339;
use super::signer::CredentialSigner;
use super::types::{CredentialProof, VerifiableCredential};
use super::CredentialError;
use crate::constants::{PROOF_PURPOSE, PROOF_TYPE};

/// Canonical JSON of the credential with its proof removed
pub fn canonical_json(credential: &VerifiableCredential) -> Result<String, CredentialError> {
    let value = serde_json::to_value(credential.without_proof())
        .map_err(|e| CredentialError::Serialization(e.to_string()))?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), CredentialError> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_string(key)?);
                out.push(':');
                if let Some(inner) = map.get(*key) {
                    write_canonical(inner, out)?;
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::String(s) => out.push_str(&encode_string(s)?),
        other => out.push_str(&other.to_string()),
    }
    Ok(())
}

fn encode_string(s: &str) -> Result<String, CredentialError> {
    serde_json::to_string(s).map_err(|e| CredentialError::Serialization(e.to_string()))
}

/// Sign a credential, replacing any existing proof
pub fn sign_credential(
    credential: &VerifiableCredential,
    signer: &dyn CredentialSigner,
) -> Result<VerifiableCredential, CredentialError> {
    let message = canonical_json(credential)?;
    let signature = signer.sign_message(message.as_bytes())?;

    let mut signed = credential.without_proof();
    signed.proof = Some(CredentialProof {
        proof_type: PROOF_TYPE.to_string(),
        created: now_rfc3339(),
        proof_purpose: PROOF_PURPOSE.to_string(),
        verification_method: signer.signer_address().to_checksum(),
        signature: signature.to_hex(),
    });
    Ok(signed)
}

/// Check a credential's proof
///
/// Returns false when the proof is missing, malformed, or was produced by an
/// address other than `verificationMethod`. Never errors.
pub fn verify_credential(credential: &VerifiableCredential) -> bool {
    let Some(proof) = credential.proof.as_ref() else {
        return false;
    };

    let signature: Signature = match proof.signature.parse() {
        Ok(signature) => signature,
        Err(e) => {
            debug!(error = %e, "Credential proof signature is malformed");
            return false;
        }
    };

    let message = match canonical_json(credential) {
        Ok(message) => message,
        Err(_) => return false,
    };

    match recover_personal_signer(message.as_bytes(), &signature) {
        Ok(recovered) => {
            recovered.to_lowercase_hex() == proof.verification_method.trim().to_lowercase()
        }
        Err(e) => {
            debug!(error = %e, "Credential signer recovery failed");
            false
        }
    }
}

/// Check a credential received as raw JSON
///
/// JSON that does not parse as a credential, including one carrying fields
/// the proof does not cover, is not valid.
pub fn verify_credential_json(value: &Value) -> bool {
    match VerifiableCredential::deserialize(value) {
        Ok(credential) => verify_credential(&credential),
        Err(e) => {
            debug!(error = %e, "Credential JSON does not match the credential shape");
            false
        }
    }
}
