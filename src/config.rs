use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};

use crate::{
    catalog::AssetRecord,
    error::{Error, Result},
};

pub const RPC_NODE_ENV: &str = "RPC_NODE";
pub const WALLET_ENV: &str = "WALLET";

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolanaNet {
    Mainnet,
    Devnet,
    Testnet,
}

impl SolanaNet {
    pub fn bundlr_url(&self) -> Result<&'static str> {
        match self {
            SolanaNet::Mainnet => Ok("https://node1.bundlr.network"),
            SolanaNet::Devnet => Ok("https://devnet.bundlr.network"),
            SolanaNet::Testnet => Err(Error::BundlrNotAvailableOnTestnet),
        }
    }

    pub fn explorer_url(&self, address: &str) -> String {
        match self {
            SolanaNet::Mainnet => format!("https://explorer.solana.com/address/{address}"),
            SolanaNet::Devnet => {
                format!("https://explorer.solana.com/address/{address}?cluster=devnet")
            }
            SolanaNet::Testnet => {
                format!("https://explorer.solana.com/address/{address}?cluster=testnet")
            }
        }
    }
}

/// The identity that pays fees, signs uploads and owns the minted tokens.
/// Built once at startup and passed to every collaborator; read-only for the
/// whole run.
#[derive(Clone, Debug)]
pub struct Wallet {
    keypair: Arc<Keypair>,
}

impl Wallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn from_base58(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret)
            .into_vec()
            .map_err(|e| Error::InvalidWalletSecret(e.to_string()))?;
        let keypair =
            Keypair::from_bytes(&bytes).map_err(|e| Error::InvalidWalletSecret(e.to_string()))?;
        Ok(Self::new(keypair))
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(WALLET_ENV).map_err(|_| Error::MissingEnv(WALLET_ENV))?;
        Self::from_base58(&secret)
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

pub fn rpc_url_from_env() -> Result<String> {
    std::env::var(RPC_NODE_ENV).map_err(|_| Error::MissingEnv(RPC_NODE_ENV))
}

/// The catalog file: where the images live, which cluster to mint on, and
/// one `[[asset]]` record per token.
#[derive(Deserialize, Debug)]
pub struct Catalog {
    #[serde(default = "Catalog::default_upload_path")]
    pub upload_path: PathBuf,
    #[serde(default = "Catalog::default_cluster")]
    pub cluster: SolanaNet,
    #[serde(default = "Catalog::default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default, rename = "asset")]
    pub assets: Vec<AssetRecord>,
}

impl Catalog {
    fn default_upload_path() -> PathBuf {
        PathBuf::from("uploads")
    }

    fn default_cluster() -> SolanaNet {
        SolanaNet::Devnet
    }

    fn default_cooldown_secs() -> u64 {
        5
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| Error::CatalogParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}
