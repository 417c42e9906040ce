//! Token Ledger CLI Application
//!
//! A command-line host for a single token ledger stored on disk.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use token_ledger::cli::{self, AppState};
use token_ledger::token::LedgerCall;

#[derive(Parser)]
#[command(name = "token-ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A capped, pausable fungible-token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage and wallets
    #[arg(short, long, default_value = ".token_ledger")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the genesis ledger
    Init {
        /// Owner address (a new account is created when omitted)
        #[arg(short, long)]
        owner: Option<String>,

        /// Genesis configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Account (wallet) operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Display token information
    Info,

    /// Show the balance of an address
    Balance {
        #[arg(short, long)]
        address: String,
    },

    /// Show how much a spender may use of an owner's balance
    Allowance {
        #[arg(short, long)]
        owner: String,

        #[arg(short, long)]
        spender: String,
    },

    /// Show recent operations
    History {
        /// Number of operations to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Check the ledger's invariants
    Validate,

    /// Send tokens from the caller
    Transfer {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        to: String,

        /// Amount in whole tokens (e.g. 12.5)
        #[arg(short, long)]
        amount: String,
    },

    /// Set a spender's allowance over the caller's balance
    Approve {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        spender: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Raise a spender's allowance
    IncreaseAllowance {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        spender: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Lower a spender's allowance
    DecreaseAllowance {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        spender: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Move tokens out of another account using an allowance
    TransferFrom {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Create new tokens (minters only)
    Mint {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Destroy tokens from the caller's balance
    Burn {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Destroy tokens from another account using an allowance
    BurnFrom {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        owner: String,

        #[arg(short, long)]
        amount: String,
    },

    /// Minter role management
    Minter {
        #[command(subcommand)]
        action: MinterCommands,
    },

    /// Stop transfers (owner only)
    Pause {
        #[arg(long)]
        caller: String,
    },

    /// Resume transfers (owner only)
    Unpause {
        #[arg(long)]
        caller: String,
    },

    /// Hand ownership to another address (owner only)
    TransferOwnership {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        new_owner: String,
    },

    /// Export ledger to file
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger from file
    Import {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Apply a JSON file of calls in order
    Replay {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Sign every call of a replay file with the callers' wallets
    Sign {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a new account
    New {
        /// Optional label for the account
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all accounts
    List,
}

#[derive(Subcommand)]
enum MinterCommands {
    /// Check whether an address may mint
    Check {
        #[arg(short, long)]
        address: String,
    },

    /// Grant the minter role (owner only)
    Add {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        account: String,
    },

    /// Revoke the minter role (owner only)
    Remove {
        #[arg(long)]
        caller: String,

        #[arg(short, long)]
        account: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that work without a ledger
    match &cli.command {
        Commands::Init {
            owner,
            config,
            force,
        } => {
            return cli::cmd_init(&cli.data_dir, owner.as_deref(), config.as_deref(), *force);
        }
        Commands::Account { action } => {
            return match action {
                AccountCommands::New { label } => {
                    cli::cmd_account_new(&cli.data_dir, label.as_deref())
                }
                AccountCommands::List => cli::cmd_account_list(&cli.data_dir),
            };
        }
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Account { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,
        Commands::Balance { address } => cli::cmd_balance(&state, &address)?,
        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,
        Commands::History { count } => cli::cmd_history(&state, count)?,
        Commands::Validate => cli::cmd_validate(&state)?,

        Commands::Transfer { caller, to, amount } => {
            let call = LedgerCall::Transfer {
                to: cli::parse_address(&to)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::Approve {
            caller,
            spender,
            amount,
        } => {
            let call = LedgerCall::Approve {
                spender: cli::parse_address(&spender)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::IncreaseAllowance {
            caller,
            spender,
            amount,
        } => {
            let call = LedgerCall::IncreaseAllowance {
                spender: cli::parse_address(&spender)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::DecreaseAllowance {
            caller,
            spender,
            amount,
        } => {
            let call = LedgerCall::DecreaseAllowance {
                spender: cli::parse_address(&spender)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            let call = LedgerCall::TransferFrom {
                from: cli::parse_address(&from)?,
                to: cli::parse_address(&to)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::Mint { caller, to, amount } => {
            let call = LedgerCall::Mint {
                to: cli::parse_address(&to)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::Burn { caller, amount } => {
            let call = LedgerCall::Burn {
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }
        Commands::BurnFrom {
            caller,
            owner,
            amount,
        } => {
            let call = LedgerCall::BurnFrom {
                owner: cli::parse_address(&owner)?,
                amount: state.parse_amount(&amount)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }

        Commands::Minter { action } => match action {
            MinterCommands::Check { address } => cli::cmd_minter_check(&state, &address)?,
            MinterCommands::Add { caller, account } => {
                let call = LedgerCall::AddMinter {
                    account: cli::parse_address(&account)?,
                };
                cli::cmd_call(&mut state, &caller, call)?;
            }
            MinterCommands::Remove { caller, account } => {
                let call = LedgerCall::RemoveMinter {
                    account: cli::parse_address(&account)?,
                };
                cli::cmd_call(&mut state, &caller, call)?;
            }
        },

        Commands::Pause { caller } => cli::cmd_call(&mut state, &caller, LedgerCall::Pause)?,
        Commands::Unpause { caller } => cli::cmd_call(&mut state, &caller, LedgerCall::Unpause)?,
        Commands::TransferOwnership { caller, new_owner } => {
            let call = LedgerCall::TransferOwnership {
                new_owner: cli::parse_address(&new_owner)?,
            };
            cli::cmd_call(&mut state, &caller, call)?;
        }

        Commands::Export { output } => cli::cmd_export(&state, &output)?,
        Commands::Import { input } => cli::cmd_import(&mut state, &input)?,
        Commands::Replay { file } => {
            cli::cmd_replay(state, &file)?;
        }
        Commands::Sign { file, output } => cli::cmd_sign(&state, &file, &output)?,
    }

    Ok(())
}
