//! Account keys
//!
//! secp256k1 key pairs for ledger accounts. An account address is the
//! HASH160 of the compressed public key; signatures are compact ECDSA over a
//! 32-byte digest.

use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::{hash160, sha256};
use crate::token::Address;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A secret key together with its public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Import from a hex-encoded 32-byte secret
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key.trim_start_matches("0x"))
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Compressed public key, hex encoded
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_message(&self.secret_key, message)
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
        verify_signature(&self.public_key, message, signature)
    }
}

/// Derive an account address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    Address::new(hash160(&public_key.serialize()))
}

pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Messages that are not already a 32-byte digest are hashed first
fn to_digest(message: &[u8]) -> Result<Message, KeyError> {
    let digest = if message.len() == 32 {
        message.to_vec()
    } else {
        sha256(message)
    };
    Ok(Message::from_digest_slice(&digest)?)
}

/// Produce a 64-byte compact signature
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Result<Vec<u8>, KeyError> {
    let digest = to_digest(message)?;
    let signature = Secp256k1::new().sign_ecdsa(&digest, secret_key);
    Ok(signature.serialize_compact().to_vec())
}

/// Returns `Ok(false)` for a well-formed signature that does not match
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, KeyError> {
    let digest = to_digest(message)?;
    let signature = Signature::from_compact(signature).map_err(|_| KeyError::InvalidSignature)?;

    Ok(Secp256k1::new()
        .verify_ecdsa(&digest, &signature, public_key)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();

        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());

        // 0x prefix accepted
        let kp3 = KeyPair::from_private_key_hex(&format!("0x{}", kp1.private_key_hex())).unwrap();
        assert_eq!(kp1.address(), kp3.address());

        assert!(matches!(
            KeyPair::from_private_key_hex("not-a-key"),
            Err(KeyError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_address_derivation() {
        let kp = KeyPair::generate();
        let pk = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert_eq!(public_key_to_address(&pk), kp.address());
        assert_eq!(kp.address().to_string().len(), 42);
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let message = b"approve 0x742d35cc for 1000 EVMT";

        let signature = kp.sign(message).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(kp.verify(message, &signature).unwrap());
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();

        let signature = kp.sign(b"mint 500").unwrap();
        assert!(!other.verify(b"mint 500", &signature).unwrap());
        assert!(!kp.verify(b"mint 501", &signature).unwrap());
        assert!(matches!(
            kp.verify(b"mint 500", &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));
    }
}
