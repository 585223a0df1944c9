//! Client side of the keeper vault: per-user body encryption, the gateway
//! transport, and the chunked upsert protocol built on both.

pub mod api;
pub mod codec;
pub mod http;
pub mod transfer;

pub use api::{ApiError, AuthSession, VaultApi};
pub use codec::{Codec, CryptoError, KeyStore};
pub use http::{HttpConfig, HttpVaultApi};
pub use transfer::{Transfer, TransferError, TransferLimits};
