//! JSON-RPC ledger client
//!
//! Talks to an Ethereum-style node over HTTP. Writes go through
//! `eth_sendTransaction` from the configured oracle account and block until
//! a receipt is available (polling `eth_getTransactionReceipt`); reads go
//! through `eth_call`. A reverted call, an unreachable node, or an exhausted
//! receipt-poll budget all surface as [`LedgerError`]; no retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::ledger::abi;
use crate::ledger::{AgreementDetails, LedgerClient, LedgerError, Receipt};

/// Ledger connection configuration
///
/// Everything here is externally supplied: the node endpoint, the deployed
/// agreement contract address, and the oracle account that signs writes.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the node
    pub endpoint_url: String,

    /// Address of the deployed agreement contract
    pub contract_address: String,

    /// Oracle account the node sends writes from
    pub oracle_address: String,

    /// Maximum number of receipt polls before giving up
    pub receipt_poll_attempts: u32,

    /// Delay between receipt polls (milliseconds)
    pub receipt_poll_interval_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:8545".to_string(),
            contract_address: String::new(),
            oracle_address: String::new(),
            receipt_poll_attempts: 30,
            receipt_poll_interval_ms: 1000,
        }
    }
}

/// HTTP JSON-RPC client for the agreement ledger
#[derive(Debug)]
pub struct RpcLedgerClient {
    /// Client configuration
    config: LedgerConfig,

    /// Underlying HTTP client
    client: reqwest::Client,

    /// Monotonic JSON-RPC request id
    request_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: Option<String>,
    block_number: Option<String>,
}

impl RpcLedgerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LedgerConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            config,
            client,
            request_id: AtomicU64::new(1),
        }
    }

    /// Issue a single JSON-RPC request and return its raw result.
    ///
    /// A JSON-RPC error object is mapped to [`LedgerError::Reverted`]; a
    /// `null` result is returned as `Value::Null` (receipt polling relies
    /// on it).
    async fn rpc(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .json(&request)
            .send()
            .await?;

        let body: RpcResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(LedgerError::Reverted(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    /// Submit calldata as a write and block until a receipt is available.
    async fn send_and_confirm(
        &self,
        operation: &str,
        data: String,
    ) -> Result<Receipt, LedgerError> {
        let params = json!([{
            "from": self.config.oracle_address,
            "to": self.config.contract_address,
            "data": data,
        }]);

        let result = self.rpc("eth_sendTransaction", params).await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| LedgerError::Codec("transaction hash missing from response".to_string()))?
            .to_string();

        debug!(
            "Submitted {} write (tx: {}), awaiting receipt",
            operation, tx_hash
        );

        for _ in 0..self.config.receipt_poll_attempts {
            let result = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if !result.is_null() {
                let receipt: RpcReceipt = serde_json::from_value(result)
                    .map_err(|e| LedgerError::Codec(format!("unreadable receipt: {}", e)))?;

                if let Some(status) = receipt.status.as_deref() {
                    if abi::parse_hex_u64(status)? == 0 {
                        return Err(LedgerError::Reverted(format!(
                            "{} reverted on chain",
                            operation
                        )));
                    }
                }

                let block_number = match receipt.block_number.as_deref() {
                    Some(number) => abi::parse_hex_u64(number)?,
                    None => 0,
                };

                return Ok(Receipt {
                    transaction_hash: tx_hash,
                    block_number,
                });
            }

            tokio::time::sleep(Duration::from_millis(self.config.receipt_poll_interval_ms)).await;
        }

        Err(LedgerError::ConfirmationTimeout {
            attempts: self.config.receipt_poll_attempts,
        })
    }

    /// Issue calldata as a read-only `eth_call` and return the raw hex data.
    async fn call(&self, data: String) -> Result<String, LedgerError> {
        let params = json!([{
            "from": self.config.oracle_address,
            "to": self.config.contract_address,
            "data": data,
        }, "latest"]);

        let result = self.rpc("eth_call", params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Codec("call returned no data".to_string()))
    }
}

impl LedgerClient for RpcLedgerClient {
    async fn add_transaction(
        &self,
        agreement_id: u64,
        parcel_id: u64,
        total_amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> Result<Receipt, LedgerError> {
        let data = abi::encode_call(
            "addTransaction(uint256,uint256,uint256,bytes32)",
            &[
                abi::uint_word(agreement_id),
                abi::uint_word(parcel_id),
                abi::uint_word(total_amount_cents),
                terms_hash,
            ],
        );
        self.send_and_confirm("addTransaction", data).await
    }

    async fn sign_agreement(&self, agreement_id: u64) -> Result<Receipt, LedgerError> {
        let data = abi::encode_call("signAgreement(uint256)", &[abi::uint_word(agreement_id)]);
        self.send_and_confirm("signAgreement", data).await
    }

    async fn verify_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
        terms_hash: [u8; 32],
    ) -> Result<Receipt, LedgerError> {
        let data = abi::encode_call(
            "verifyPayment(uint256,uint256,bytes32)",
            &[
                abi::uint_word(agreement_id),
                abi::uint_word(amount_cents),
                terms_hash,
            ],
        );
        self.send_and_confirm("verifyPayment", data).await
    }

    async fn is_payment_verified(&self, agreement_id: u64) -> Result<bool, LedgerError> {
        let data = abi::encode_call(
            "isPaymentVerified(uint256)",
            &[abi::uint_word(agreement_id)],
        );
        let returned = self.call(data).await?;
        let words = abi::decode_words(&returned)?;
        let word = words
            .first()
            .ok_or_else(|| LedgerError::Codec("empty return data".to_string()))?;
        abi::word_to_bool(word)
    }

    async fn record_payment(
        &self,
        agreement_id: u64,
        amount_cents: u64,
    ) -> Result<Receipt, LedgerError> {
        let data = abi::encode_call(
            "recordPayment(uint256,uint256)",
            &[abi::uint_word(agreement_id), abi::uint_word(amount_cents)],
        );
        self.send_and_confirm("recordPayment", data).await
    }

    async fn cancel_transaction(&self, agreement_id: u64) -> Result<Receipt, LedgerError> {
        let data = abi::encode_call(
            "cancelTransaction(uint256)",
            &[abi::uint_word(agreement_id)],
        );
        self.send_and_confirm("cancelTransaction", data).await
    }

    async fn get_transaction_details(
        &self,
        agreement_id: u64,
    ) -> Result<AgreementDetails, LedgerError> {
        let data = abi::encode_call(
            "getTransactionDetails(uint256)",
            &[abi::uint_word(agreement_id)],
        );
        let returned = self.call(data).await?;
        let words = abi::decode_words(&returned)?;
        if words.len() < 7 {
            return Err(LedgerError::Codec(format!(
                "expected 7 detail words, got {}",
                words.len()
            )));
        }
        Ok(AgreementDetails {
            parcel_id: abi::word_to_u64(&words[0])?,
            total_amount_cents: abi::word_to_u64(&words[1])?,
            current_amount_paid_cents: abi::word_to_u64(&words[2])?,
            installments_paid: abi::word_to_u64(&words[3])?,
            is_verified: abi::word_to_bool(&words[4])?,
            is_agreement_signed: abi::word_to_bool(&words[5])?,
            is_canceled: abi::word_to_bool(&words[6])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.endpoint_url, "http://127.0.0.1:8545");
        assert_eq!(config.receipt_poll_attempts, 30);
        assert_eq!(config.receipt_poll_interval_ms, 1000);
    }

    #[test]
    fn test_rpc_response_with_error_body() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#;
        let response: RpcResponse = serde_json::from_str(raw).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, 3);
        assert_eq!(error.message, "execution reverted");
        assert!(response.result.is_none());
    }

    #[test]
    fn test_rpc_receipt_deserialization() {
        let raw = r#"{"transactionHash":"0xabc","status":"0x1","blockNumber":"0x10"}"#;
        let receipt: RpcReceipt = serde_json::from_str(raw).unwrap();
        assert_eq!(receipt.status.as_deref(), Some("0x1"));
        assert_eq!(receipt.block_number.as_deref(), Some("0x10"));
    }

    #[test]
    fn test_pending_receipt_is_null_result() {
        let raw = r#"{"jsonrpc":"2.0","id":2,"result":null}"#;
        let response: RpcResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.result.unwrap_or(Value::Null), Value::Null);
    }
}
