use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Any(#[from] anyhow::Error),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("environment variable WALLET is not a base58 keypair: {0}")]
    InvalidWalletSecret(String),
    #[error("failed to read catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("bundlr isn't available on solana testnet")]
    BundlrNotAvailableOnTestnet,
    #[error("asset \"{name}\": creator shares sum to {sum}, expected exactly 100")]
    CreatorShareSum { name: String, sum: u32 },
    #[error("asset \"{name}\": royalty of {basis_points} basis points is above the 10000 maximum")]
    RoyaltyOutOfRange { name: String, basis_points: u16 },
    #[error("asset \"{name}\": \"{address}\" is not a valid creator address")]
    InvalidCreatorAddress { name: String, address: String },
    #[error("asset \"{name}\": can't determine mime type of \"{file}\"")]
    MimeTypeNotFound { name: String, file: String },
    #[error("failed to read asset file {path}: {source}")]
    AssetRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    SolanaClient(#[from] solana_client::client_error::ClientError),
    #[error(transparent)]
    Signer(#[from] solana_sdk::signer::SignerError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Bundlr(#[from] bundlr_sdk::error::BundlrError),
    #[error("bundlr api returned an invalid response: {0}")]
    BundlrApiInvalidResponse(String),
    #[error("failed to register funding tx to bundlr. tx_id={0};")]
    BundlrTxRegisterFailed(String),
    #[error("insufficient solana balance, needed={needed}; have={balance};")]
    InsufficientSolanaBalance { needed: u64, balance: u64 },
}

impl Error {
    pub fn custom<E: Into<anyhow::Error>>(e: E) -> Self {
        Error::Any(e.into())
    }
}
