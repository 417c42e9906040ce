//! Account keystore
//!
//! A wallet is a secp256k1 key pair with an optional label. Holding the
//! wallet for an address is what lets a host act as that address: calls are
//! signed with the wallet key and checked against the caller before they
//! reach the ledger.

use crate::crypto::{public_key_from_hex, public_key_to_address, verify_signature, KeyPair};
use crate::token::{Address, LedgerCall};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("No wallet for {0}")]
    NotFound(Address),
    #[error("Wallet file address {stored} does not match its key ({derived})")]
    AddressMismatch { stored: String, derived: Address },
    #[error("Signer {signer} is not the caller {caller}")]
    WrongSigner { signer: Address, caller: Address },
    #[error("Signature does not verify")]
    BadSignature,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] crate::crypto::KeyError),
}

/// On-disk wallet format
#[derive(Debug, Serialize, Deserialize)]
struct WalletData {
    private_key_hex: String,
    address: String,
    label: Option<String>,
}

pub struct Wallet {
    key_pair: KeyPair,
    pub label: Option<String>,
}

impl Wallet {
    pub fn new(label: Option<&str>) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: label.map(str::to_string),
        }
    }

    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        Ok(Self {
            key_pair: KeyPair::from_private_key_hex(private_key_hex)?,
            label: None,
        })
    }

    pub fn address(&self) -> Address {
        self.key_pair.address()
    }

    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Hex secret key. Keep it private.
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Sign `call` as this wallet's address
    pub fn sign_call(&self, call: LedgerCall) -> Result<SignedCall, WalletError> {
        let caller = self.address();
        let message = SignedCall::message(&caller, &call)?;
        let signature = self.key_pair.sign(&message)?;

        Ok(SignedCall {
            caller,
            call,
            public_key: self.public_key(),
            signature: hex::encode(signature),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = WalletData {
            private_key_hex: self.private_key(),
            address: self.address().to_string(),
            label: self.label.clone(),
        };

        fs::write(path, serde_json::to_string_pretty(&data)?)?;
        Ok(())
    }

    /// Load a wallet, checking the stored address against the key
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let data: WalletData = serde_json::from_str(&json)?;

        let mut wallet = Self::from_private_key(&data.private_key_hex)?;
        let derived = wallet.address();
        if data.address != derived.to_string() {
            return Err(WalletError::AddressMismatch {
                stored: data.address,
                derived,
            });
        }
        wallet.label = data.label;
        Ok(wallet)
    }

    /// Public wallet information
    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address(),
            public_key: self.public_key(),
            label: self.label.clone(),
        }
    }
}

/// Public wallet information (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: Address,
    pub public_key: String,
    pub label: Option<String>,
}

/// A ledger call with proof that `caller` authorized it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCall {
    pub caller: Address,
    pub call: LedgerCall,
    /// Compressed secp256k1 public key, hex
    pub public_key: String,
    /// Compact ECDSA signature, hex
    pub signature: String,
}

impl SignedCall {
    fn message(caller: &Address, call: &LedgerCall) -> Result<Vec<u8>, WalletError> {
        Ok(serde_json::to_vec(&(caller, call))?)
    }

    /// Check the key belongs to `caller` and signed this exact call
    pub fn verify(&self) -> Result<(), WalletError> {
        let public_key = public_key_from_hex(&self.public_key)?;
        let signer = public_key_to_address(&public_key);
        if signer != self.caller {
            return Err(WalletError::WrongSigner {
                signer,
                caller: self.caller,
            });
        }

        let signature = hex::decode(&self.signature).map_err(|_| WalletError::BadSignature)?;
        let message = Self::message(&self.caller, &self.call)?;
        if !verify_signature(&public_key, &message, &signature)? {
            return Err(WalletError::BadSignature);
        }
        Ok(())
    }
}

/// Wallets stored as `<address>.json` in one directory
pub struct WalletManager {
    wallets_dir: PathBuf,
}

impl WalletManager {
    pub fn new(wallets_dir: &Path) -> Result<Self, WalletError> {
        fs::create_dir_all(wallets_dir)?;
        Ok(Self {
            wallets_dir: wallets_dir.to_path_buf(),
        })
    }

    fn wallet_path(&self, address: &Address) -> PathBuf {
        self.wallets_dir.join(format!("{}.json", address))
    }

    /// Create and save a new wallet
    pub fn create_wallet(&self, label: Option<&str>) -> Result<Wallet, WalletError> {
        let wallet = Wallet::new(label);
        wallet.save(&self.wallet_path(&wallet.address()))?;
        log::info!("Created wallet {}", wallet.address());
        Ok(wallet)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.wallet_path(address).exists()
    }

    /// All readable wallets, in address order
    pub fn list_wallets(&self) -> Result<Vec<WalletInfo>, WalletError> {
        let mut wallets = Vec::new();

        for entry in fs::read_dir(&self.wallets_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Wallet::load(&path) {
                    Ok(wallet) => wallets.push(wallet.info()),
                    Err(e) => log::warn!("Skipping wallet {}: {}", path.display(), e),
                }
            }
        }

        wallets.sort_by_key(|info| info.address);
        Ok(wallets)
    }

    pub fn load_wallet(&self, address: &Address) -> Result<Wallet, WalletError> {
        let path = self.wallet_path(address);
        if !path.exists() {
            return Err(WalletError::NotFound(*address));
        }
        Wallet::load(&path)
    }

    pub fn delete_wallet(&self, address: &Address) -> Result<(), WalletError> {
        let path = self.wallet_path(address);
        if !path.exists() {
            return Err(WalletError::NotFound(*address));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_import() {
        let wallet1 = Wallet::new(None);
        let wallet2 = Wallet::from_private_key(&wallet1.private_key()).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert!(!wallet1.address().is_zero());
    }

    #[test]
    fn test_wallet_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wallet.json");

        let wallet1 = Wallet::new(Some("Treasury"));
        wallet1.save(&path).unwrap();

        let wallet2 = Wallet::load(&path).unwrap();
        assert_eq!(wallet1.address(), wallet2.address());
        assert_eq!(wallet2.label.as_deref(), Some("Treasury"));
    }

    #[test]
    fn test_load_rejects_mismatched_address() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wallet.json");
        let wallet = Wallet::new(None);
        wallet.save(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let forged = json.replace(
            &wallet.address().to_string(),
            &Address::new([7; 20]).to_string(),
        );
        fs::write(&path, forged).unwrap();

        assert!(matches!(
            Wallet::load(&path),
            Err(WalletError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn test_manager() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = WalletManager::new(&temp_dir.path().join("wallets")).unwrap();

        let a = manager.create_wallet(Some("a")).unwrap();
        let b = manager.create_wallet(None).unwrap();
        assert!(manager.contains(&a.address()));

        let listed: Vec<Address> = manager
            .list_wallets()
            .unwrap()
            .into_iter()
            .map(|info| info.address)
            .collect();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&b.address()));

        let loaded = manager.load_wallet(&a.address()).unwrap();
        assert_eq!(loaded.label.as_deref(), Some("a"));

        manager.delete_wallet(&a.address()).unwrap();
        assert!(matches!(
            manager.load_wallet(&a.address()),
            Err(WalletError::NotFound(_))
        ));
    }

    #[test]
    fn test_signed_call() {
        let wallet = Wallet::new(None);
        let call = LedgerCall::Transfer {
            to: Address::new([2; 20]),
            amount: 10,
        };

        let signed = wallet.sign_call(call).unwrap();
        assert_eq!(signed.caller, wallet.address());
        signed.verify().unwrap();

        // Altering the call breaks the signature
        let mut tampered = signed.clone();
        tampered.call = LedgerCall::Transfer {
            to: Address::new([2; 20]),
            amount: 11,
        };
        assert!(matches!(tampered.verify(), Err(WalletError::BadSignature)));

        // Claiming another caller is caught before the signature
        let mut impersonated = signed;
        impersonated.caller = Address::new([9; 20]);
        assert!(matches!(
            impersonated.verify(),
            Err(WalletError::WrongSigner { .. })
        ));
    }
}
