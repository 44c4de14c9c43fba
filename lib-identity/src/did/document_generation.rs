// packages/lib-identity/src/did/document_generation.rs
// W3C DID Document generation for village accounts.
//
// The document has a single recovery-method verification key bound to the
// on-chain account and one service entry pointing at the donation contract.

use lib_crypto::Address;
use serde::{Deserialize, Serialize};

use crate::constants::{DID_CONTEXT_V1, VERIFICATION_METHOD_TYPE};
use crate::did::create_did;

/// Service type advertised for the donation contract
pub const DONATION_LEDGER_SERVICE: &str = "DonationLedger";

/// W3C DID Document structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ServiceEndpoint>,
}

/// Verification method bound to a CAIP-10 account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    #[serde(rename = "blockchainAccountId")]
    pub blockchain_account_id: String,
}

/// Service endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

/// Generate the DID document for an address
///
/// `service_endpoint` is normally the donation contract address.
pub fn create_did_document(
    address: &Address,
    service_endpoint: &str,
    chain_id: u64,
) -> DidDocument {
    let did = create_did(address, chain_id);
    let controller_key = format!("{}#controller", did);

    DidDocument {
        context: DID_CONTEXT_V1.to_string(),
        id: did.clone(),
        verification_method: vec![VerificationMethod {
            id: controller_key.clone(),
            method_type: VERIFICATION_METHOD_TYPE.to_string(),
            controller: did.clone(),
            blockchain_account_id: format!("eip155:{}:{}", chain_id, address.to_checksum()),
        }],
        authentication: vec![controller_key],
        service: vec![ServiceEndpoint {
            id: format!("{}#donation-ledger", did),
            service_type: DONATION_LEDGER_SERVICE.to_string(),
            service_endpoint: service_endpoint.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let address: Address = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".parse().unwrap();
        let doc = create_did_document(&address, "0x00000000000000000000000000000000000000aa", 421614);

        assert_eq!(doc.id, "did:ethr:arbitrum-sepolia:0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359");
        assert_eq!(doc.verification_method.len(), 1);
        let method = &doc.verification_method[0];
        assert_eq!(method.id, format!("{}#controller", doc.id));
        assert_eq!(method.controller, doc.id);
        assert_eq!(
            method.blockchain_account_id,
            "eip155:421614:0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
        assert_eq!(doc.authentication, vec![method.id.clone()]);
        assert_eq!(doc.service[0].service_type, "DonationLedger");
    }

    #[test]
    fn test_document_json_field_names() {
        let doc = create_did_document(&Address::ZERO, "ledger", 42161);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["@context"], "https://www.w3.org/ns/did/v1");
        assert_eq!(json["verificationMethod"][0]["type"], "EcdsaSecp256k1RecoveryMethod2020");
        assert_eq!(json["service"][0]["serviceEndpoint"], "ledger");
        assert!(json["verificationMethod"][0]["blockchainAccountId"]
            .as_str()
            .unwrap()
            .starts_with("eip155:42161:"));
    }
}
