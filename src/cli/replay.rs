//! Batch replay of ledger calls from a JSON file
//!
//! The file holds an array of steps such as
//!
//! ```json
//! [
//!   { "caller": "0x…", "op": "transfer", "to": "0x…", "amount": "12.5" },
//!   { "caller": "0x…", "op": "pause" }
//! ]
//! ```
//!
//! Amounts are whole tokens. A step may carry `public_key` and `signature`
//! (added by `token-ledger sign`); such a step is checked against that
//! signature and needs no local wallet. An unsigned step needs the caller's
//! wallet in the keystore. Each step is committed on its own; a rejected step
//! is reported and the run continues.

use super::commands::{AppState, CliResult};
use crate::token::{parse_units, Address, LedgerCall, SharedLedger};
use crate::wallet::{SignedCall, WalletManager};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayStep {
    pub caller: Address,
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spender: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_owner: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Signer's compressed public key, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Signature over the call, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ReplayStep {
    fn field(&self, name: &str, value: Option<Address>) -> CliResult<Address> {
        value.ok_or_else(|| format!("`{}` needs `{}`", self.op, name).into())
    }

    fn raw_amount(&self, decimals: u8) -> CliResult<u128> {
        let amount = self
            .amount
            .as_deref()
            .ok_or_else(|| format!("`{}` needs `amount`", self.op))?;
        Ok(parse_units(amount, decimals)?)
    }

    /// Build the ledger call this step describes
    pub fn to_call(&self, decimals: u8) -> CliResult<LedgerCall> {
        let call = match self.op.replace('-', "_").as_str() {
            "transfer" => LedgerCall::Transfer {
                to: self.field("to", self.to)?,
                amount: self.raw_amount(decimals)?,
            },
            "approve" => LedgerCall::Approve {
                spender: self.field("spender", self.spender)?,
                amount: self.raw_amount(decimals)?,
            },
            "increase_allowance" => LedgerCall::IncreaseAllowance {
                spender: self.field("spender", self.spender)?,
                amount: self.raw_amount(decimals)?,
            },
            "decrease_allowance" => LedgerCall::DecreaseAllowance {
                spender: self.field("spender", self.spender)?,
                amount: self.raw_amount(decimals)?,
            },
            "transfer_from" => LedgerCall::TransferFrom {
                from: self.field("from", self.from)?,
                to: self.field("to", self.to)?,
                amount: self.raw_amount(decimals)?,
            },
            "mint" => LedgerCall::Mint {
                to: self.field("to", self.to)?,
                amount: self.raw_amount(decimals)?,
            },
            "burn" => LedgerCall::Burn {
                amount: self.raw_amount(decimals)?,
            },
            "burn_from" => LedgerCall::BurnFrom {
                owner: self.field("owner", self.owner)?,
                amount: self.raw_amount(decimals)?,
            },
            "transfer_ownership" => LedgerCall::TransferOwnership {
                new_owner: self.field("new_owner", self.new_owner)?,
            },
            "add_minter" => LedgerCall::AddMinter {
                account: self.field("account", self.account)?,
            },
            "remove_minter" => LedgerCall::RemoveMinter {
                account: self.field("account", self.account)?,
            },
            "pause" => LedgerCall::Pause,
            "unpause" => LedgerCall::Unpause,
            other => return Err(format!("Unknown operation `{}`", other).into()),
        };
        Ok(call)
    }

    /// Attach the caller's signature over this step's call
    pub fn sign(&mut self, wallets: &WalletManager, decimals: u8) -> CliResult<()> {
        let call = self.to_call(decimals)?;
        let signed = wallets.load_wallet(&self.caller)?.sign_call(call)?;
        self.public_key = Some(signed.public_key);
        self.signature = Some(signed.signature);
        Ok(())
    }

    /// The call to execute once the caller is authenticated, either by the
    /// attached signature or by a wallet in the local keystore
    pub fn authorize(&self, wallets: &WalletManager, decimals: u8) -> CliResult<LedgerCall> {
        let call = self.to_call(decimals)?;
        match (&self.public_key, &self.signature) {
            (Some(public_key), Some(signature)) => {
                let signed = SignedCall {
                    caller: self.caller,
                    call,
                    public_key: public_key.clone(),
                    signature: signature.clone(),
                };
                signed.verify()?;
                Ok(signed.call)
            }
            (None, None) => {
                wallets.load_wallet(&self.caller)?;
                Ok(call)
            }
            _ => Err("`public_key` and `signature` must be given together".into()),
        }
    }
}

/// Outcome counts of a replay run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

pub fn read_steps(path: &Path) -> CliResult<Vec<ReplayStep>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Apply every step in order; each success is persisted before the next step
pub async fn replay_steps(
    shared: &SharedLedger,
    wallets: &WalletManager,
    steps: &[ReplayStep],
) -> ReplaySummary {
    let decimals = shared.query(|l| l.decimals()).await;
    let mut summary = ReplaySummary::default();

    for (index, step) in steps.iter().enumerate() {
        let n = index + 1;
        match apply_step(shared, wallets, step, decimals).await {
            Ok(description) => {
                summary.applied += 1;
                println!("   ✅ #{} {}", n, description);
            }
            Err(e) => {
                summary.rejected += 1;
                log::warn!("Replay step {} ({} by {}) rejected: {}", n, step.op, step.caller, e);
                println!("   ❌ #{} {} by {}: {}", n, step.op, step.caller.short(), e);
            }
        }
    }

    summary
}

async fn apply_step(
    shared: &SharedLedger,
    wallets: &WalletManager,
    step: &ReplayStep,
    decimals: u8,
) -> CliResult<String> {
    let call = step.authorize(wallets, decimals)?;
    let event = shared.execute(&step.caller, &call).await?;
    Ok(event.to_string())
}

/// Run a replay file against the stored ledger
pub fn cmd_replay(state: AppState, path: &Path) -> CliResult<ReplaySummary> {
    let steps = read_steps(path)?;
    println!("🔁 Replaying {} call(s) from {:?}", steps.len(), path);

    let AppState {
        ledger,
        storage,
        wallet_manager,
        ..
    } = state;
    let shared = SharedLedger::with_storage(ledger, storage);

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(replay_steps(&shared, &wallet_manager, &steps));

    println!(
        "\n📊 Replay finished: {} applied, {} rejected",
        summary.applied, summary.rejected
    );
    Ok(summary)
}

/// Sign every step of a replay file with the callers' wallets
pub fn cmd_sign(state: &AppState, input: &Path, output: &Path) -> CliResult<()> {
    let mut steps = read_steps(input)?;
    let decimals = state.ledger.decimals();

    for (index, step) in steps.iter_mut().enumerate() {
        step.sign(&state.wallet_manager, decimals)
            .map_err(|e| format!("step {} ({} by {}): {}", index + 1, step.op, step.caller, e))?;
    }

    fs::write(output, serde_json::to_string_pretty(&steps)?)?;
    println!("✍️  Signed {} call(s) into {:?}", steps.len(), output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, StorageConfig};
    use crate::token::{GenesisConfig, TokenLedger};

    fn step(json: &str) -> ReplayStep {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_step_to_call() {
        let to = Address::new([2; 20]);
        let s = step(&format!(
            r#"{{ "caller": "{}", "op": "transfer", "to": "{}", "amount": "1.5" }}"#,
            Address::new([1; 20]),
            to
        ));
        assert_eq!(
            s.to_call(18).unwrap(),
            LedgerCall::Transfer {
                to,
                amount: 1_500_000_000_000_000_000
            }
        );

        let s = step(&format!(
            r#"{{ "caller": "{}", "op": "burn-from", "owner": "{}", "amount": "2" }}"#,
            Address::new([1; 20]),
            to
        ));
        assert_eq!(
            s.to_call(0).unwrap(),
            LedgerCall::BurnFrom {
                owner: to,
                amount: 2
            }
        );
    }

    #[test]
    fn test_step_errors() {
        let caller = Address::new([1; 20]);
        let missing = step(&format!(r#"{{ "caller": "{}", "op": "mint" }}"#, caller));
        assert!(missing.to_call(18).is_err());

        let unknown = step(&format!(r#"{{ "caller": "{}", "op": "freeze" }}"#, caller));
        assert!(unknown.to_call(18).is_err());

        let extra = format!(r#"{{ "caller": "{}", "op": "pause", "x": 1 }}"#, caller);
        assert!(serde_json::from_str::<ReplayStep>(&extra).is_err());
    }

    #[tokio::test]
    async fn test_replay_continues_after_rejection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wallets = WalletManager::new(&temp_dir.path().join("wallets")).unwrap();
        let owner = wallets.create_wallet(Some("owner")).unwrap().address();
        let alice = wallets.create_wallet(Some("alice")).unwrap().address();
        let stranger = Address::new([9; 20]);

        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let ledger = TokenLedger::new(&GenesisConfig::default(), owner).unwrap();
        let shared = SharedLedger::with_storage(ledger, Storage::new(config.clone()).unwrap());

        let steps: Vec<ReplayStep> = serde_json::from_str(&format!(
            r#"[
                {{ "caller": "{owner}", "op": "transfer", "to": "{alice}", "amount": "100" }},
                {{ "caller": "{alice}", "op": "mint", "to": "{alice}", "amount": "1" }},
                {{ "caller": "{stranger}", "op": "burn", "amount": "1" }},
                {{ "caller": "{owner}", "op": "pause" }},
                {{ "caller": "{alice}", "op": "transfer", "to": "{owner}", "amount": "1" }},
                {{ "caller": "{alice}", "op": "burn", "amount": "40" }}
            ]"#
        ))
        .unwrap();

        let summary = replay_steps(&shared, &wallets, &steps).await;
        assert_eq!(
            summary,
            ReplaySummary {
                applied: 3,
                rejected: 3
            }
        );

        let ledger = shared.snapshot().await;
        assert!(ledger.paused());
        assert_eq!(ledger.balance_of(&alice), 60 * 10u128.pow(18));
        assert_eq!(Storage::new(config).unwrap().load().unwrap(), ledger);
    }

    #[tokio::test]
    async fn test_signed_steps_need_no_local_wallet() {
        let signer_dir = tempfile::tempdir().unwrap();
        let signer_wallets = WalletManager::new(signer_dir.path()).unwrap();
        let owner = signer_wallets.create_wallet(Some("owner")).unwrap().address();
        let alice = Address::new([2; 20]);

        let mut steps: Vec<ReplayStep> = serde_json::from_str(&format!(
            r#"[
                {{ "caller": "{owner}", "op": "transfer", "to": "{alice}", "amount": "5" }},
                {{ "caller": "{owner}", "op": "add_minter", "account": "{alice}" }}
            ]"#
        ))
        .unwrap();
        for step in &mut steps {
            step.sign(&signer_wallets, 18).unwrap();
        }

        // The signed file is what crosses over to the replaying host
        let json = serde_json::to_string_pretty(&steps).unwrap();
        let steps: Vec<ReplayStep> = serde_json::from_str(&json).unwrap();
        assert!(steps.iter().all(|s| s.signature.is_some()));

        let host_dir = tempfile::tempdir().unwrap();
        let host_wallets = WalletManager::new(host_dir.path()).unwrap();
        let ledger = TokenLedger::new(&GenesisConfig::default(), owner).unwrap();
        let shared = SharedLedger::new(ledger);

        let summary = replay_steps(&shared, &host_wallets, &steps).await;
        assert_eq!(
            summary,
            ReplaySummary {
                applied: 2,
                rejected: 0
            }
        );
        let ledger = shared.snapshot().await;
        assert_eq!(ledger.balance_of(&alice), 5 * 10u128.pow(18));
        assert!(ledger.is_minter(&alice));

        // Unsigned, the same call needs the owner's wallet on the host
        let mut unsigned = steps[0].clone();
        unsigned.public_key = None;
        unsigned.signature = None;
        assert!(unsigned.authorize(&host_wallets, 18).is_err());
        assert!(unsigned.authorize(&signer_wallets, 18).is_ok());
    }

    #[tokio::test]
    async fn test_altered_signed_steps_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wallets = WalletManager::new(temp_dir.path()).unwrap();
        let owner = wallets.create_wallet(Some("owner")).unwrap().address();
        let mallory = wallets.create_wallet(Some("mallory")).unwrap().address();

        let mut signed = step(&format!(
            r#"{{ "caller": "{}", "op": "transfer", "to": "{}", "amount": "1" }}"#,
            owner, mallory
        ));
        signed.sign(&wallets, 18).unwrap();

        let mut inflated = signed.clone();
        inflated.amount = Some("1000".to_string());

        let mut borrowed = signed.clone();
        borrowed.caller = mallory;

        let mut half_signed = signed.clone();
        half_signed.public_key = None;

        for bad in [&inflated, &borrowed, &half_signed] {
            assert!(bad.authorize(&wallets, 18).is_err());
        }

        let ledger = TokenLedger::new(&GenesisConfig::default(), owner).unwrap();
        let shared = SharedLedger::new(ledger);
        let steps = vec![inflated, borrowed, half_signed, signed];
        let summary = replay_steps(&shared, &wallets, &steps).await;
        assert_eq!(
            summary,
            ReplaySummary {
                applied: 1,
                rejected: 3
            }
        );
        assert_eq!(shared.query(|l| l.balance_of(&mallory)).await, 10u128.pow(18));
    }
}
