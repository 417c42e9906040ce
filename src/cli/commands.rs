//! CLI commands for the token ledger
//!
//! Implements all command handlers for the CLI interface.

use crate::storage::{Storage, StorageConfig};
use crate::token::{
    format_units, parse_units, Address, GenesisConfig, LedgerCall, LedgerEvent, TokenLedger,
};
use crate::wallet::WalletManager;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub ledger: TokenLedger,
    pub storage: Storage,
    pub wallet_manager: WalletManager,
    pub data_dir: PathBuf,
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

fn open_wallets(data_dir: &Path) -> CliResult<WalletManager> {
    Ok(WalletManager::new(&data_dir.join("wallets"))?)
}

impl AppState {
    /// Load the ledger from `data_dir`; it must have been initialized
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;
        let wallet_manager = open_wallets(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found in {:?}. Run `token-ledger init` first.",
                data_dir
            )
            .into());
        }
        let ledger = storage.load()?;

        Ok(Self {
            ledger,
            storage,
            wallet_manager,
            data_dir,
        })
    }

    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.ledger)?;
        Ok(())
    }

    /// Parse a whole-token amount such as `"12.5"` into raw units
    pub fn parse_amount(&self, amount: &str) -> CliResult<u128> {
        Ok(parse_units(amount, self.ledger.decimals())?)
    }

    /// Raw units rendered with the token symbol
    pub fn display_amount(&self, raw: u128) -> String {
        format!(
            "{} {}",
            format_units(raw, self.ledger.decimals()),
            self.ledger.symbol()
        )
    }
}

pub fn parse_address(address: &str) -> CliResult<Address> {
    Ok(address.parse::<Address>()?)
}

/// Create the genesis ledger
pub fn cmd_init(
    data_dir: &Path,
    owner: Option<&str>,
    config_path: Option<&Path>,
    force: bool,
) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;
    let wallet_manager = open_wallets(data_dir)?;

    if storage.exists() {
        if !force {
            println!("⚠️  Ledger already exists at {:?}", data_dir);
            println!("   Use --force to reinitialize (this will delete existing data)");
            return Ok(());
        }
        storage.delete()?;
        log::warn!("Deleted existing ledger in {:?}", data_dir);
    }

    let config = match config_path {
        Some(path) => GenesisConfig::from_file(path)?,
        None => GenesisConfig::default(),
    };

    let owner = match owner {
        Some(address) => {
            let address = parse_address(address)?;
            if !wallet_manager.contains(&address) {
                println!("⚠️  Owner {} has no wallet here; it cannot sign calls", address);
            }
            address
        }
        None => wallet_manager.create_wallet(Some("owner"))?.address(),
    };

    let ledger = TokenLedger::new(&config, owner)?;
    storage.save(&ledger)?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!(
        "   🪙 Token: {} ({}), {} decimals",
        ledger.name(),
        ledger.symbol(),
        ledger.decimals()
    );
    println!("   👑 Owner: {}", owner);
    println!(
        "   💰 Initial supply: {}",
        format_units(ledger.total_supply(), ledger.decimals())
    );
    println!(
        "   🧢 Max supply: {}",
        format_units(ledger.max_supply(), ledger.decimals())
    );

    Ok(())
}

/// Create a new account wallet
pub fn cmd_account_new(data_dir: &Path, label: Option<&str>) -> CliResult<()> {
    let wallet = open_wallets(data_dir)?.create_wallet(label)?;

    println!("🔐 New account created!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔑 Public Key: {}", wallet.public_key());
    if let Some(l) = &wallet.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  IMPORTANT: The private key is stored in the wallets directory.");
    println!("   Back up this directory; it is the only way to act as this account.");

    Ok(())
}

/// List accounts, with balances once a ledger exists
pub fn cmd_account_list(data_dir: &Path) -> CliResult<()> {
    let wallets = open_wallets(data_dir)?.list_wallets()?;

    if wallets.is_empty() {
        println!("📭 No accounts found. Create one with: token-ledger account new");
        return Ok(());
    }

    let storage = Storage::new(storage_config(data_dir))?;
    let ledger = if storage.exists() {
        Some(storage.load()?)
    } else {
        None
    };

    println!("📋 Accounts:");
    for info in &wallets {
        let label = info.label.as_deref().unwrap_or("-");
        match &ledger {
            Some(ledger) => println!(
                "   {} ({}) - {} {}",
                info.address,
                label,
                format_units(ledger.balance_of(&info.address), ledger.decimals()),
                ledger.symbol()
            ),
            None => println!("   {} ({})", info.address, label),
        }
    }

    Ok(())
}

/// Display token information
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = &state.ledger;

    println!("🪙 {} ({})", ledger.name(), ledger.symbol());
    println!("   ├─ Decimals: {}", ledger.decimals());
    println!(
        "   ├─ Total supply: {}",
        state.display_amount(ledger.total_supply())
    );
    println!("   ├─ Max supply: {}", state.display_amount(ledger.max_supply()));
    println!(
        "   ├─ Remaining: {}",
        state.display_amount(ledger.remaining_supply())
    );
    println!("   ├─ Holders: {}", ledger.holder_count());
    println!("   ├─ Owner: {}", ledger.owner());
    println!("   ├─ Minters: {}", ledger.minters().len());
    for minter in ledger.minters() {
        println!("   │  └─ {}", minter);
    }
    println!(
        "   ├─ State: {}",
        if ledger.paused() { "⏸️  paused" } else { "▶️  active" }
    );
    println!("   └─ Operations: {}", ledger.sequence());

    Ok(())
}

pub fn cmd_balance(state: &AppState, address: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    let balance = state.ledger.balance_of(&address);

    println!("💰 Balance for {}", address);
    println!("   {} ({} raw)", state.display_amount(balance), balance);

    Ok(())
}

pub fn cmd_allowance(state: &AppState, owner: &str, spender: &str) -> CliResult<()> {
    let owner = parse_address(owner)?;
    let spender = parse_address(spender)?;
    let allowance = state.ledger.allowance(&owner, &spender);

    println!("🤝 Allowance {} -> {}", owner.short(), spender.short());
    println!("   {} ({} raw)", state.display_amount(allowance), allowance);

    Ok(())
}

pub fn cmd_minter_check(state: &AppState, address: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    if state.ledger.is_minter(&address) {
        println!("✅ {} is a minter", address);
    } else {
        println!("🚫 {} is not a minter", address);
    }
    Ok(())
}

/// Show the most recent operations
pub fn cmd_history(state: &AppState, count: usize) -> CliResult<()> {
    let records: Vec<_> = state.ledger.history().collect();

    if records.is_empty() {
        println!("📭 No operations recorded yet.");
        return Ok(());
    }

    println!("📜 Recent operations:");
    let start = records.len().saturating_sub(count);
    for record in records[start..].iter().rev() {
        println!(
            "   #{} | {} | {}",
            record.sequence,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.event
        );
    }

    Ok(())
}

/// Check ledger invariants and report storage state
pub fn cmd_validate(state: &AppState) -> CliResult<()> {
    println!("🔍 Validating ledger...");

    match state.ledger.verify_invariants() {
        Ok(()) => {
            println!("✅ Ledger is consistent!");
            println!(
                "   {} holders, supply {} of {}",
                state.ledger.holder_count(),
                state.display_amount(state.ledger.total_supply()),
                state.display_amount(state.ledger.max_supply())
            );
        }
        Err(e) => {
            println!("❌ Ledger validation FAILED!");
            println!("   {}", e);
        }
    }

    let stats = state.storage.stats()?;
    println!(
        "   💾 {} bytes on disk, {} backup(s)",
        stats.file_size, stats.backup_count
    );

    Ok(())
}

/// Apply `call` as `caller` and save. The caller's wallet must be in the
/// local keystore.
pub fn cmd_call(state: &mut AppState, caller: &str, call: LedgerCall) -> CliResult<()> {
    let caller = parse_address(caller)?;
    state.wallet_manager.load_wallet(&caller)?;

    match state.ledger.execute(&caller, &call) {
        Ok(event) => {
            state.save()?;
            println!("✅ {}", describe_event(state, &event));
        }
        Err(e) => {
            log::warn!("{} by {} rejected: {}", call, caller, e);
            println!("❌ {} rejected: {}", call, e);
        }
    }

    Ok(())
}

/// One-line summary of an applied operation, amounts in whole tokens
pub fn describe_event(state: &AppState, event: &LedgerEvent) -> String {
    let amount = |raw: &u128| state.display_amount(*raw);
    match event {
        LedgerEvent::Transfer { from, to, amount: a } => {
            format!("Transferred {} from {} to {}", amount(a), from, to)
        }
        LedgerEvent::TransferFrom {
            from,
            to,
            amount: a,
            remaining_allowance,
            ..
        } => format!(
            "Transferred {} from {} to {} (allowance left {})",
            amount(a),
            from,
            to,
            amount(remaining_allowance)
        ),
        LedgerEvent::Approval {
            spender, amount: a, ..
        } => format!("Allowance for {} set to {}", spender, amount(a)),
        LedgerEvent::Mint {
            to,
            amount: a,
            total_supply,
            ..
        } => format!(
            "Minted {} to {} (supply {})",
            amount(a),
            to,
            amount(total_supply)
        ),
        LedgerEvent::Burn {
            from,
            amount: a,
            total_supply,
            ..
        } => format!(
            "Burned {} from {} (supply {})",
            amount(a),
            from,
            amount(total_supply)
        ),
        other => {
            let text = other.to_string();
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => text,
            }
        }
    }
}

/// Export the ledger to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.ledger, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Replace the ledger with one read from a file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let ledger = match crate::storage::load_from_file(path) {
        Ok(ledger) => ledger,
        Err(e) => {
            log::warn!("Import of {:?} rejected: {}", path, e);
            println!("❌ Imported ledger is invalid: {}", e);
            return Ok(());
        }
    };

    state.ledger = ledger;
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!(
        "   {} ({}), supply {}",
        state.ledger.name(),
        state.ledger.symbol(),
        state.display_amount(state.ledger.total_supply())
    );

    Ok(())
}
