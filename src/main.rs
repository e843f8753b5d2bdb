//! Land Ledger Coordinator CLI
//!
//! Command-line interface for driving land-sale transactions through their
//! lifecycle against a remote agreement ledger.
//!
//! # Usage
//!
//! ```bash
//! land-ledger-coordinator --contract 0x5FbD... create \
//!     --buyer Alice --seller Bob --parcel-id 42 \
//!     --terms "Sale of Lot 42" --total-amount 1000.00
//! land-ledger-coordinator --contract 0x5FbD... sign 1
//! land-ledger-coordinator --contract 0x5FbD... verify 1
//! land-ledger-coordinator --contract 0x5FbD... pay 1 --amount 250.00
//! land-ledger-coordinator --ledger memory create --buyer Alice ...
//! ```
//!
//! Each invocation runs one lifecycle operation and prints the operation's
//! JSON response to stdout. The `memory` ledger runs the same coordination
//! against an in-process ledger for dry runs.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (validation failure, unknown record, ledger failure, etc.)

use std::process;

use land_ledger_coordinator::api::{
    CancellationResponse, CreateTransactionResponse, MessageResponse, TransactionResponse,
    VerificationResponse,
};
use land_ledger_coordinator::cli::{self, Command, DraftCommand, LedgerMode};
use land_ledger_coordinator::core::{CoordinatorConfig, LifecycleCoordinator};
use land_ledger_coordinator::ledger::{InMemoryLedger, LedgerClient, RpcLedgerClient};
use land_ledger_coordinator::types::{
    NewDraftedContract, NewTransaction, UpdateDraftedContract, UpdateTransaction,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    if let Err(message) = args.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let config = CoordinatorConfig {
        agreement_address: args.contract.clone().unwrap_or_default(),
    };
    let ledger_config = args.to_ledger_config();

    // Build the selected ledger backend and run the requested operation
    let result = match args.ledger {
        LedgerMode::Rpc => {
            let ledger = RpcLedgerClient::new(ledger_config);
            run(LifecycleCoordinator::new(config, ledger), args.command).await
        }
        LedgerMode::Memory => {
            let ledger = InMemoryLedger::new();
            run(LifecycleCoordinator::new(config, ledger), args.command).await
        }
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Run one lifecycle operation and render its JSON response.
async fn run<L: LedgerClient>(
    coordinator: LifecycleCoordinator<L>,
    command: Command,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match command {
        Command::Create {
            buyer,
            seller,
            parcel_id,
            terms,
            total_amount,
        } => {
            let record = coordinator
                .create_transaction(NewTransaction {
                    buyer,
                    seller,
                    parcel_id,
                    terms,
                    total_amount,
                })
                .await?;
            serde_json::to_string_pretty(&CreateTransactionResponse::from(&record))?
        }
        Command::Sign { id } => {
            coordinator.sign_agreement(id).await?;
            serde_json::to_string_pretty(&MessageResponse::new("Agreement signed"))?
        }
        Command::Verify { id } => {
            coordinator.verify_payment(id).await?;
            serde_json::to_string_pretty(&MessageResponse::new("Payment verified"))?
        }
        Command::Check { id } => {
            let is_verified = coordinator.check_verification(id).await?;
            serde_json::to_string_pretty(&VerificationResponse { is_verified })?
        }
        Command::Pay { id, amount } => {
            let record = coordinator.record_payment(id, amount).await?;
            serde_json::to_string_pretty(&TransactionResponse::from(record))?
        }
        Command::Cancel { id } => {
            let cancellation = coordinator.cancel_transaction(id).await?;
            serde_json::to_string_pretty(&CancellationResponse::from(&cancellation))?
        }
        Command::Show { id } => {
            let record = coordinator.get_transaction(id)?;
            serde_json::to_string_pretty(&TransactionResponse::from(record))?
        }
        Command::List => {
            let records: Vec<TransactionResponse> = coordinator
                .list_transactions()
                .into_iter()
                .map(TransactionResponse::from)
                .collect();
            serde_json::to_string_pretty(&records)?
        }
        Command::Update {
            id,
            buyer,
            seller,
            cancellation_fee,
            refund_fee,
        } => {
            let record = coordinator
                .update_transaction(
                    id,
                    UpdateTransaction {
                        buyer,
                        seller,
                        cancellation_fee,
                        refund_fee,
                    },
                )
                .await?;
            serde_json::to_string_pretty(&TransactionResponse::from(record))?
        }
        Command::Delete { id } => {
            coordinator.delete_transaction(id)?;
            serde_json::to_string_pretty(&MessageResponse::new("Transaction deleted"))?
        }
        Command::Details { id } => {
            let details = coordinator.agreement_details(id).await?;
            serde_json::to_string_pretty(&details)?
        }
        Command::Draft { command } => run_draft(&coordinator, command)?,
    };

    Ok(output)
}

/// Run one drafted-contract operation and render its JSON response.
fn run_draft<L: LedgerClient>(
    coordinator: &LifecycleCoordinator<L>,
    command: DraftCommand,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match command {
        DraftCommand::Create {
            title,
            buyer,
            seller,
            parcel_id,
            body,
        } => {
            let draft = coordinator.create_draft(NewDraftedContract {
                title,
                buyer,
                seller,
                parcel_id,
                body,
            })?;
            serde_json::to_string_pretty(&draft)?
        }
        DraftCommand::Show { id } => {
            let draft = coordinator.get_draft(id)?;
            serde_json::to_string_pretty(&draft)?
        }
        DraftCommand::List => serde_json::to_string_pretty(&coordinator.list_drafts())?,
        DraftCommand::Update {
            id,
            title,
            buyer,
            seller,
            parcel_id,
            body,
        } => {
            let draft = coordinator.update_draft(
                id,
                UpdateDraftedContract {
                    title,
                    buyer,
                    seller,
                    parcel_id,
                    body,
                },
            )?;
            serde_json::to_string_pretty(&draft)?
        }
        DraftCommand::Delete { id } => {
            coordinator.delete_draft(id)?;
            serde_json::to_string_pretty(&MessageResponse::new("Draft deleted"))?
        }
    };

    Ok(output)
}
