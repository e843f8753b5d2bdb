//! End-to-end lifecycle tests
//!
//! These tests drive complete transaction lifecycles through the coordinator
//! against the in-process ledger, checking after every step that the local
//! record and the remote agreement agree. They cover:
//! - The happy path (create → sign → verify → installments → completion)
//! - The cancellation path and refund computation
//! - Compensation when the ledger rejects a creation
//! - Status-code mapping at the transport boundary

use rstest::rstest;
use rust_decimal::Decimal;

use land_ledger_coordinator::api::{CreateTransactionResponse, ErrorResponse};
use land_ledger_coordinator::core::{CoordinatorConfig, LifecycleCoordinator};
use land_ledger_coordinator::ledger::InMemoryLedger;
use land_ledger_coordinator::types::{
    CoordinatorError, LifecycleState, NewTransaction, UpdateTransaction,
};

const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn coordinator() -> LifecycleCoordinator<InMemoryLedger> {
    LifecycleCoordinator::new(
        CoordinatorConfig {
            agreement_address: CONTRACT_ADDRESS.to_string(),
        },
        InMemoryLedger::new(),
    )
}

fn lot_42() -> NewTransaction {
    NewTransaction {
        buyer: Some("Alice".to_string()),
        seller: Some("Bob".to_string()),
        parcel_id: Some("42".to_string()),
        terms: Some("Sale of Lot 42".to_string()),
        total_amount: Some("1000.00".to_string()),
    }
}

#[tokio::test]
async fn test_full_lifecycle_to_completion() {
    let coordinator = coordinator();

    // Create
    let record = coordinator.create_transaction(lot_42()).await.unwrap();
    assert_eq!(record.state(), LifecycleState::Created);
    assert_eq!(record.smart_contract_address, CONTRACT_ADDRESS);

    // Sign
    let record = coordinator.sign_agreement(record.id).await.unwrap();
    assert_eq!(record.state(), LifecycleState::Signed);

    // Installments before verification
    let record = coordinator
        .record_payment(record.id, Some("400.00".to_string()))
        .await
        .unwrap();
    assert_eq!(record.state(), LifecycleState::PaymentPending);

    // Verify
    let record = coordinator.verify_payment(record.id).await.unwrap();
    assert_eq!(record.state(), LifecycleState::Verified);
    assert!(coordinator.check_verification(record.id).await.unwrap());

    // Remaining installments
    coordinator
        .record_payment(record.id, Some("400.00".to_string()))
        .await
        .unwrap();
    let record = coordinator
        .record_payment(record.id, Some("200.00".to_string()))
        .await
        .unwrap();

    assert_eq!(record.state(), LifecycleState::Completed);
    assert_eq!(record.current_amount_paid, Decimal::new(100000, 2));
    assert_eq!(record.installments_paid, 3);

    // Local and remote state agree
    let details = coordinator.agreement_details(record.id).await.unwrap();
    assert_eq!(details.parcel_id, 42);
    assert_eq!(details.total_amount_cents, 100_000);
    assert_eq!(details.current_amount_paid_cents, 100_000);
    assert_eq!(details.installments_paid, 3);
    assert!(details.is_verified);
    assert!(details.is_agreement_signed);
    assert!(!details.is_canceled);
}

#[tokio::test]
async fn test_cancellation_path_with_refund() {
    let coordinator = coordinator();

    let record = coordinator.create_transaction(lot_42()).await.unwrap();
    coordinator.sign_agreement(record.id).await.unwrap();
    coordinator
        .record_payment(record.id, Some("300.00".to_string()))
        .await
        .unwrap();
    coordinator
        .update_transaction(
            record.id,
            UpdateTransaction {
                cancellation_fee: Some("50.00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let cancellation = coordinator.cancel_transaction(record.id).await.unwrap();

    assert_eq!(cancellation.record.state(), LifecycleState::Canceled);
    assert_eq!(cancellation.refund_amount, Decimal::new(25000, 2));

    let details = coordinator
        .agreement_details(cancellation.record.id)
        .await
        .unwrap();
    assert!(details.is_canceled);

    // A canceled agreement accepts no further payments
    let result = coordinator
        .record_payment(cancellation.record.id, Some("10.00".to_string()))
        .await;
    assert!(matches!(
        result,
        Err(CoordinatorError::RemoteLedger { .. })
    ));
}

#[tokio::test]
async fn test_rejected_creation_leaves_no_trace() {
    let coordinator = coordinator();
    coordinator.ledger().fail_on("addTransaction");

    let result = coordinator.create_transaction(lot_42()).await;
    assert!(matches!(
        result,
        Err(CoordinatorError::RemoteLedger { .. })
    ));
    assert!(coordinator.list_transactions().is_empty());
    assert_eq!(coordinator.ledger().agreement_count(), 0);

    // The next creation succeeds and gets a fresh id
    coordinator.ledger().clear_failures();
    let record = coordinator.create_transaction(lot_42()).await.unwrap();
    assert_eq!(coordinator.list_transactions().len(), 1);
    assert_eq!(coordinator.ledger().agreement_count(), 1);
    assert!(record.id > 0);
}

#[tokio::test]
async fn test_create_response_wire_shape() {
    let coordinator = coordinator();
    let record = coordinator.create_transaction(lot_42()).await.unwrap();

    let response = CreateTransactionResponse::from(&record);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["transaction_id"], record.id);
    assert_eq!(json["total_amount"], "1000.00");
    assert_eq!(json["smart_contract_address"], CONTRACT_ADDRESS);

    // keccak-256 of the terms text, 0x-prefixed
    let terms_hash = json["terms_hash"].as_str().unwrap();
    assert!(terms_hash.starts_with("0x"));
    assert_eq!(terms_hash.len(), 66);
    assert_eq!(terms_hash, record.terms_hash);
}

#[rstest]
#[case::missing_field(CoordinatorError::missing_field("buyer"), 400)]
#[case::bad_amount(CoordinatorError::invalid_amount("ten"), 400)]
#[case::unknown_record(CoordinatorError::transaction_not_found(99), 404)]
#[case::ledger_down(
    CoordinatorError::remote_ledger("verify_payment", "ledger unreachable: connection refused"),
    500
)]
#[case::tampered_terms(CoordinatorError::terms_hash_mismatch(1), 500)]
fn test_transport_status_mapping(#[case] error: CoordinatorError, #[case] status: u16) {
    assert_eq!(error.status(), status);
    let body = ErrorResponse::from(&error);
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_operations_on_unknown_record_return_not_found() {
    let coordinator = coordinator();

    assert_eq!(
        coordinator.sign_agreement(99).await.unwrap_err().status(),
        404
    );
    assert_eq!(
        coordinator.verify_payment(99).await.unwrap_err().status(),
        404
    );
    assert_eq!(
        coordinator
            .record_payment(99, Some("10.00".to_string()))
            .await
            .unwrap_err()
            .status(),
        404
    );
    assert_eq!(
        coordinator.cancel_transaction(99).await.unwrap_err().status(),
        404
    );
    assert_eq!(
        coordinator.check_verification(99).await.unwrap_err().status(),
        404
    );
}

#[tokio::test]
async fn test_verification_failure_does_not_block_retry() {
    // No automatic retries: after a reported failure, the caller can issue
    // the operation again once the ledger recovers.
    let coordinator = coordinator();
    let record = coordinator.create_transaction(lot_42()).await.unwrap();

    coordinator.ledger().fail_on("verifyPayment");
    assert!(coordinator.verify_payment(record.id).await.is_err());
    assert!(!coordinator.get_transaction(record.id).unwrap().is_verified);

    coordinator.ledger().clear_failures();
    let record = coordinator.verify_payment(record.id).await.unwrap();
    assert!(record.is_verified);
}

#[tokio::test]
async fn test_concurrent_payments_serialize_per_record() {
    let coordinator = std::sync::Arc::new(coordinator());
    let record = coordinator.create_transaction(lot_42()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let coordinator = coordinator.clone();
        let id = record.id;
        handles.push(tokio::spawn(async move {
            coordinator
                .record_payment(id, Some("10.00".to_string()))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = coordinator.get_transaction(record.id).unwrap();
    assert_eq!(record.current_amount_paid, Decimal::new(10000, 2));
    assert_eq!(record.installments_paid, 10);

    let details = coordinator.agreement_details(record.id).await.unwrap();
    assert_eq!(details.current_amount_paid_cents, 10_000);
    assert_eq!(details.installments_paid, 10);
}
