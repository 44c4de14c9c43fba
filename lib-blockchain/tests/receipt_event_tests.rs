//! Receipt decoding and JSON-RPC client tests

use std::time::Duration;

use lib_blockchain::rpc::parse_receipt_result;
use lib_blockchain::types::u128_to_word;
use lib_blockchain::{
    donation_made_topic, find_donation_event, ChainClient, ChainError, JsonRpcClient, TxHash,
};
use lib_crypto::Address;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const CONTRACT: &str = "0x9e4c6825cbb7a13a0eb56310239b7a06356e8ca1";
const DONOR: &str = "0x1111111111111111111111111111111111111111";

fn word_hex(value: u128) -> String {
    format!("0x{}", hex::encode(u128_to_word(value)))
}

fn donation_receipt_json(status: &str) -> Value {
    let donor_topic = format!("0x{}{}", "0".repeat(24), &DONOR[2..]);
    let data = format!(
        "0x{}{}",
        hex::encode(u128_to_word(20_000_000_000_000_000)),
        hex::encode(u128_to_word(1_735_689_600))
    );
    json!({
        "transactionHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": "0x5f5e100",
        "status": status,
        "from": DONOR,
        "to": CONTRACT,
        "logs": [{
            "address": CONTRACT,
            "topics": [
                format!("0x{}", hex::encode(donation_made_topic())),
                word_hex(12),
                word_hex(1),
                donor_topic
            ],
            "data": data,
            "logIndex": "0x0"
        }]
    })
}

#[test]
fn test_rpc_receipt_to_donation_event() {
    let receipt = parse_receipt_result(donation_receipt_json("0x1")).unwrap().unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.block_number, 100_000_000);

    let contract: Address = CONTRACT.parse().unwrap();
    let event = find_donation_event(&receipt, Some(&contract)).unwrap();
    assert_eq!(event.donation_id, 12);
    assert_eq!(event.campaign_id, 1);
    assert_eq!(event.donor, DONOR.parse::<Address>().unwrap());
    assert_eq!(event.amount, 20_000_000_000_000_000);
    assert_eq!(event.timestamp, 1_735_689_600);
}

#[test]
fn test_event_serializes_camel_case() {
    let receipt = parse_receipt_result(donation_receipt_json("0x1")).unwrap().unwrap();
    let event = find_donation_event(&receipt, None).unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["donationId"], 12);
    assert_eq!(json["campaignId"], 1);
}

/// Serve exactly one canned JSON-RPC response and hand back the request body
async fn one_shot_rpc(response: Value) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + length || n == 0 {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf).to_string();
        let body = text.split("\r\n\r\n").nth(1).unwrap_or_default().to_string();

        let payload = response.to_string();
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            payload.len(),
            payload
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        body
    });

    (url, handle)
}

#[tokio::test]
async fn test_client_fetches_receipt() {
    let (url, server) = one_shot_rpc(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": donation_receipt_json("0x1")
    }))
    .await;

    let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();
    let hash: TxHash = format!("0x{}", "ab".repeat(32)).parse().unwrap();
    let receipt = client.get_transaction_receipt(&hash).await.unwrap().unwrap();
    assert_eq!(receipt.tx_hash, hash);

    let request: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(request["method"], "eth_getTransactionReceipt");
    assert_eq!(request["params"][0], hash.to_hex());
}

#[tokio::test]
async fn test_client_pending_receipt() {
    let (url, _server) = one_shot_rpc(json!({"jsonrpc": "2.0", "id": 1, "result": null})).await;
    let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();
    let receipt = client.get_transaction_receipt(&TxHash([0u8; 32])).await.unwrap();
    assert!(receipt.is_none());
}

#[tokio::test]
async fn test_client_chain_id_and_rpc_error() {
    let (url, _server) = one_shot_rpc(json!({"jsonrpc": "2.0", "id": 1, "result": "0x66eee"})).await;
    let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();
    assert_eq!(client.chain_id().await.unwrap(), 421_614);

    let (url, _server) = one_shot_rpc(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {"code": -32000, "message": "header not found"}
    }))
    .await;
    let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();
    let err = client.chain_id().await.unwrap_err();
    assert_eq!(
        err,
        ChainError::Rpc {
            code: -32000,
            message: "header not found".to_string()
        }
    );
}
