use std::sync::Arc;

use async_trait::async_trait;
use bundlr_sdk::{error::BundlrError, tags::Tag, Bundlr, Ed25519Signer};
use bytes::Bytes;
use serde::Deserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signer::Signer as _};

use crate::{
    config::{SolanaNet, Wallet},
    error::{Error, Result},
    mint::{execute, submit_transaction},
    pipeline::StorageUploader,
};

/// Signs Bundlr data items with the run's wallet key.
pub struct BundlrSigner {
    wallet: Wallet,
}

impl BundlrSigner {
    pub fn new(wallet: Wallet) -> Self {
        Self { wallet }
    }
}

impl bundlr_sdk::Signer for BundlrSigner {
    const SIG_TYPE: u16 = Ed25519Signer::SIG_TYPE;
    const SIG_LENGTH: u16 = Ed25519Signer::SIG_LENGTH;
    const PUB_LENGTH: u16 = Ed25519Signer::PUB_LENGTH;

    fn sign(&self, msg: Bytes) -> std::result::Result<Bytes, BundlrError> {
        let sig = self.wallet.keypair().sign_message(&msg);
        Ok(<[u8; 64]>::from(sig).to_vec().into())
    }

    fn pub_key(&self) -> Bytes {
        self.wallet.pubkey().to_bytes().to_vec().into()
    }
}

/// Uploads bytes to Arweave through a Bundlr node, topping the node balance
/// up from the wallet when an upload would not be covered.
pub struct BundlrClient {
    client: Arc<RpcClient>,
    wallet: Wallet,
    node_url: String,
    http: reqwest::Client,
}

impl BundlrClient {
    pub fn new(client: Arc<RpcClient>, cluster: SolanaNet, wallet: Wallet) -> Result<Self> {
        let node_url = cluster.bundlr_url()?.to_owned();
        Ok(Self {
            client,
            wallet,
            node_url,
            http: reqwest::Client::new(),
        })
    }

    async fn price(&self, size: u64) -> Result<u64> {
        let resp = self
            .http
            .get(format!("{}/price/solana/{}", self.node_url, size))
            .send()
            .await?;
        let text = resp.text().await?;
        text.parse::<u64>()
            .map_err(|_| Error::BundlrApiInvalidResponse(text))
    }

    async fn balance(&self) -> Result<u64> {
        #[serde_with::serde_as]
        #[derive(Deserialize)]
        struct Resp {
            #[serde_as(as = "serde_with::DisplayFromStr")]
            balance: u64,
        }

        let resp = self
            .http
            .get(format!(
                "{}/account/balance/solana/?address={}",
                self.node_url,
                self.wallet.pubkey()
            ))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json::<Resp>().await?.balance)
        } else {
            let text = resp.text().await?;
            Err(Error::BundlrApiInvalidResponse(text))
        }
    }

    async fn node_deposit_address(&self) -> Result<Pubkey> {
        #[derive(Deserialize)]
        struct Addresses {
            solana: String,
        }

        #[derive(Deserialize)]
        struct Info {
            addresses: Addresses,
        }

        let resp = self.http.get(format!("{}/info", self.node_url)).send().await?;
        let info: Info = serde_json::from_str(&resp.text().await?)?;

        info.addresses
            .solana
            .parse::<Pubkey>()
            .map_err(Error::custom)
    }

    /// Transfers `amount` lamports to the node's deposit address and
    /// registers the funding transaction with the node.
    async fn fund(&self, amount: u64) -> Result<()> {
        let recipient = self.node_deposit_address().await?;

        let instruction =
            solana_sdk::system_instruction::transfer(&self.wallet.pubkey(), &recipient, amount);
        let (mut tx, recent_blockhash) =
            execute(&self.client, &self.wallet.pubkey(), &[instruction], 0).await?;

        tx.try_sign(&[self.wallet.keypair()], recent_blockhash)?;

        let signature = submit_transaction(&self.client, tx).await?;

        let resp = self
            .http
            .post(format!("{}/account/balance/solana", self.node_url))
            .json(&serde_json::json!({
                "tx_id": signature.to_string(),
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::BundlrTxRegisterFailed(signature.to_string()));
        }

        Ok(())
    }

    async fn lazy_fund(&self, size: u64) -> Result<()> {
        // Tx fee offset, plus 10% headroom on the quoted price.
        let needed_balance = self.price(size + 10_000).await?;
        let needed_balance = needed_balance + needed_balance / 10;

        let current_balance = self.balance().await?;

        if current_balance < needed_balance {
            self.fund(needed_balance - current_balance).await?;
        }

        Ok(())
    }

    async fn send(&self, data: Bytes, content_type: String) -> Result<String> {
        let bundlr = Bundlr::new(
            self.node_url.clone(),
            "solana".to_string(),
            "sol".to_string(),
            BundlrSigner::new(self.wallet.clone()),
        );

        // Creating the data item signs it, which is CPU-bound work.
        let (bundlr, tx) = tokio::task::spawn_blocking(move || {
            let tx = bundlr.create_transaction_with_tags(
                data.to_vec(),
                vec![Tag::new("Content-Type".into(), content_type)],
            );
            (bundlr, tx)
        })
        .await
        .map_err(|_| {
            Error::custom(anyhow::anyhow!(
                "failed to create and sign bundlr transaction"
            ))
        })?;

        let resp: BundlrResponse = serde_json::from_value(bundlr.send_transaction(tx).await?)?;

        Ok(format!("https://arweave.net/{}", resp.id))
    }
}

#[async_trait]
impl StorageUploader for BundlrClient {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<String> {
        self.lazy_fund(data.len() as u64).await?;
        self.send(data, content_type.to_owned()).await
    }
}

#[derive(Deserialize)]
struct BundlrResponse {
    id: String,
}
