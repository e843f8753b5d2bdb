use clap::{Parser, Subcommand, ValueEnum};

use crate::ledger::LedgerConfig;

/// Coordinate land-sale transactions against a remote agreement ledger
#[derive(Parser, Debug)]
#[command(name = "land-ledger-coordinator")]
#[command(about = "Coordinate land-sale transactions against a remote agreement ledger", long_about = None)]
pub struct CliArgs {
    /// Ledger backend to run against
    #[arg(
        long = "ledger",
        value_name = "LEDGER",
        default_value = "rpc",
        help = "Ledger backend: 'rpc' for a JSON-RPC node or 'memory' for the in-process ledger"
    )]
    pub ledger: LedgerMode,

    /// JSON-RPC endpoint of the ledger node
    #[arg(
        long = "endpoint",
        value_name = "URL",
        default_value = "http://127.0.0.1:8545",
        help = "JSON-RPC endpoint of the ledger node"
    )]
    pub endpoint: String,

    /// Address of the deployed agreement contract
    #[arg(
        long = "contract",
        value_name = "ADDRESS",
        help = "Deployed agreement contract address (required for the rpc ledger)"
    )]
    pub contract: Option<String>,

    /// Oracle account writes are sent from
    #[arg(
        long = "oracle",
        value_name = "ADDRESS",
        help = "Oracle account address used to send ledger writes"
    )]
    pub oracle: Option<String>,

    /// Maximum number of receipt polls before giving up
    #[arg(
        long = "receipt-attempts",
        value_name = "COUNT",
        default_value_t = 30,
        help = "Maximum number of receipt polls before a write times out"
    )]
    pub receipt_attempts: u32,

    /// Delay between receipt polls in milliseconds
    #[arg(
        long = "receipt-interval",
        value_name = "MILLIS",
        default_value_t = 1000,
        help = "Delay between receipt polls in milliseconds"
    )]
    pub receipt_interval_ms: u64,

    /// Lifecycle operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available ledger backends
#[derive(Clone, Debug, ValueEnum)]
pub enum LedgerMode {
    /// JSON-RPC client against a real node
    Rpc,
    /// In-process ledger (dry runs, demos)
    Memory,
}

/// Lifecycle operations exposed by the CLI
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a transaction and register its agreement on the ledger
    Create {
        /// Buyer identity
        #[arg(long)]
        buyer: Option<String>,

        /// Seller identity
        #[arg(long)]
        seller: Option<String>,

        /// Land-parcel reference (numeric)
        #[arg(long = "parcel-id")]
        parcel_id: Option<String>,

        /// Contract terms text
        #[arg(long)]
        terms: Option<String>,

        /// Agreed sale total, e.g. 1000.00
        #[arg(long = "total-amount")]
        total_amount: Option<String>,
    },

    /// Sign the agreement for a transaction
    Sign {
        /// Transaction id
        id: u64,
    },

    /// Ask the ledger to verify the payment for a transaction
    Verify {
        /// Transaction id
        id: u64,
    },

    /// Read the ledger's verification flag for a transaction
    Check {
        /// Transaction id
        id: u64,
    },

    /// Record an installment payment against a transaction
    Pay {
        /// Transaction id
        id: u64,

        /// Payment amount, e.g. 250.00
        #[arg(long)]
        amount: Option<String>,
    },

    /// Cancel a transaction and compute the refund
    Cancel {
        /// Transaction id
        id: u64,
    },

    /// Show the local record for a transaction
    Show {
        /// Transaction id
        id: u64,
    },

    /// List all local transaction records
    List,

    /// Update a transaction's mutable fields
    Update {
        /// Transaction id
        id: u64,

        /// Replacement buyer identity
        #[arg(long)]
        buyer: Option<String>,

        /// Replacement seller identity
        #[arg(long)]
        seller: Option<String>,

        /// Replacement cancellation fee, e.g. 50.00
        #[arg(long = "cancellation-fee")]
        cancellation_fee: Option<String>,

        /// Replacement refund fee, e.g. 10.00
        #[arg(long = "refund-fee")]
        refund_fee: Option<String>,
    },

    /// Delete a local transaction record
    Delete {
        /// Transaction id
        id: u64,
    },

    /// Read the remote agreement state for a transaction
    Details {
        /// Transaction id
        id: u64,
    },

    /// Manage drafted contracts
    Draft {
        /// Draft operation to run
        #[command(subcommand)]
        command: DraftCommand,
    },
}

/// Drafted-contract operations
#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Create a drafted contract
    Create {
        /// Short title of the draft
        #[arg(long)]
        title: Option<String>,

        /// Buyer identity named in the draft
        #[arg(long)]
        buyer: Option<String>,

        /// Seller identity named in the draft
        #[arg(long)]
        seller: Option<String>,

        /// Land-parcel reference
        #[arg(long = "parcel-id")]
        parcel_id: Option<String>,

        /// Full draft text
        #[arg(long)]
        body: Option<String>,
    },

    /// Show a drafted contract
    Show {
        /// Draft id
        id: u64,
    },

    /// List all drafted contracts
    List,

    /// Update a drafted contract
    Update {
        /// Draft id
        id: u64,

        /// Replacement title
        #[arg(long)]
        title: Option<String>,

        /// Replacement buyer identity
        #[arg(long)]
        buyer: Option<String>,

        /// Replacement seller identity
        #[arg(long)]
        seller: Option<String>,

        /// Replacement parcel reference
        #[arg(long = "parcel-id")]
        parcel_id: Option<String>,

        /// Replacement draft text
        #[arg(long)]
        body: Option<String>,
    },

    /// Delete a drafted contract
    Delete {
        /// Draft id
        id: u64,
    },
}

impl CliArgs {
    /// Build the ledger connection configuration from the CLI arguments.
    ///
    /// Missing addresses default to empty strings; `validate` rejects that
    /// combination for the rpc backend before a client is built.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            endpoint_url: self.endpoint.clone(),
            contract_address: self.contract.clone().unwrap_or_default(),
            oracle_address: self.oracle.clone().unwrap_or_default(),
            receipt_poll_attempts: self.receipt_attempts,
            receipt_poll_interval_ms: self.receipt_interval_ms,
        }
    }

    /// Check argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.ledger, LedgerMode::Rpc) && self.contract.is_none() {
            return Err("--contract is required when --ledger is 'rpc'".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_ledger(&["program", "list"], LedgerMode::Rpc)]
    #[case::explicit_rpc(&["program", "--ledger", "rpc", "list"], LedgerMode::Rpc)]
    #[case::explicit_memory(&["program", "--ledger", "memory", "list"], LedgerMode::Memory)]
    fn test_ledger_mode_parsing(#[case] args: &[&str], #[case] expected: LedgerMode) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        match (&parsed.ledger, &expected) {
            (LedgerMode::Rpc, LedgerMode::Rpc) => (),
            (LedgerMode::Memory, LedgerMode::Memory) => (),
            _ => panic!("Expected {:?}, got {:?}", expected, parsed.ledger),
        }
    }

    #[test]
    fn test_create_subcommand_parsing() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--ledger",
            "memory",
            "create",
            "--buyer",
            "Alice",
            "--seller",
            "Bob",
            "--parcel-id",
            "42",
            "--terms",
            "Sale of Lot 42",
            "--total-amount",
            "1000.00",
        ])
        .unwrap();

        match parsed.command {
            Command::Create {
                buyer,
                seller,
                parcel_id,
                terms,
                total_amount,
            } => {
                assert_eq!(buyer.as_deref(), Some("Alice"));
                assert_eq!(seller.as_deref(), Some("Bob"));
                assert_eq!(parcel_id.as_deref(), Some("42"));
                assert_eq!(terms.as_deref(), Some("Sale of Lot 42"));
                assert_eq!(total_amount.as_deref(), Some("1000.00"));
            }
            other => panic!("Expected Create, got {:?}", other),
        }
    }

    #[test]
    fn test_ledger_config_conversion() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--endpoint",
            "http://node:8545",
            "--contract",
            "0xc0ffee",
            "--oracle",
            "0xfeed",
            "--receipt-attempts",
            "5",
            "--receipt-interval",
            "200",
            "sign",
            "1",
        ])
        .unwrap();

        let config = parsed.to_ledger_config();
        assert_eq!(config.endpoint_url, "http://node:8545");
        assert_eq!(config.contract_address, "0xc0ffee");
        assert_eq!(config.oracle_address, "0xfeed");
        assert_eq!(config.receipt_poll_attempts, 5);
        assert_eq!(config.receipt_poll_interval_ms, 200);
    }

    #[test]
    fn test_rpc_mode_requires_contract() {
        let parsed = CliArgs::try_parse_from(["program", "list"]).unwrap();
        assert!(parsed.validate().is_err());

        let parsed =
            CliArgs::try_parse_from(["program", "--contract", "0xc0ffee", "list"]).unwrap();
        assert!(parsed.validate().is_ok());

        let parsed = CliArgs::try_parse_from(["program", "--ledger", "memory", "list"]).unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[rstest]
    #[case::missing_command(&["program"])]
    #[case::invalid_ledger(&["program", "--ledger", "invalid", "list"])]
    #[case::missing_id(&["program", "sign"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
