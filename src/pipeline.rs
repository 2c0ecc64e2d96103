use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info};

use crate::{
    catalog::{AssetRecord, NftCreator},
    config::Wallet,
    error::{Error, Result},
    metadata::NftMetadata,
};

/// The storage collaborator: content-addressed upload of raw bytes.
#[async_trait]
pub trait StorageUploader {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<String>;
}

/// The blockchain collaborator: one token-creation submission.
#[async_trait]
pub trait MintSubmitter {
    async fn mint(&self, request: MintRequest) -> Result<MintedNft>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub metadata_uri: String,
    pub name: String,
    pub symbol: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<NftCreator>,
}

#[derive(Debug, Clone)]
pub struct MintedNft {
    pub mint: String,
    pub signature: String,
}

pub struct MintedAsset {
    pub name: String,
    pub nft: MintedNft,
}

pub struct FailedAsset {
    pub name: String,
    pub error: Error,
}

#[derive(Default)]
pub struct RunReport {
    pub minted: Vec<MintedAsset>,
    pub failed: Vec<FailedAsset>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives one asset at a time through validate, image upload, metadata
/// upload and mint, with a fixed cooldown between assets.
pub struct Pipeline<S, M> {
    storage: S,
    minter: M,
    wallet: Wallet,
    upload_path: PathBuf,
    cooldown: Duration,
}

impl<S: StorageUploader, M: MintSubmitter> Pipeline<S, M> {
    pub fn new(
        storage: S,
        minter: M,
        wallet: Wallet,
        upload_path: PathBuf,
        cooldown: Duration,
    ) -> Self {
        Self {
            storage,
            minter,
            wallet,
            upload_path,
            cooldown,
        }
    }

    /// Processes every catalog entry in declared order, strictly one at a
    /// time. A failing asset is recorded and the run moves on to the next
    /// entry; already-uploaded artifacts of a failed mint stay orphaned,
    /// which content-addressed storage makes safe.
    pub async fn run(&self, assets: &[AssetRecord]) -> RunReport {
        let mut report = RunReport::default();
        for asset in assets {
            info!(
                "minting \"{}\" to an NFT in wallet {}",
                asset.name,
                self.wallet.pubkey()
            );
            match self.process(asset).await {
                Ok(nft) => report.minted.push(MintedAsset {
                    name: asset.name.clone(),
                    nft,
                }),
                Err(err) => {
                    error!("asset \"{}\" failed: {}", asset.name, err);
                    report.failed.push(FailedAsset {
                        name: asset.name.clone(),
                        error: err,
                    });
                }
            }
            // Stay under the storage and RPC rate limits.
            tokio::time::sleep(self.cooldown).await;
        }
        report
    }

    async fn process(&self, asset: &AssetRecord) -> Result<MintedNft> {
        let checked = asset.validate(&self.wallet)?;

        info!("step 1 - uploading image");
        let path = self.upload_path.join(&asset.file_name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| Error::AssetRead {
                path: path.clone(),
                source,
            })?;
        let image_uri = self.storage.upload(bytes.into(), &checked.mime_type).await?;
        info!("  image uri: {image_uri}");

        info!("step 2 - uploading metadata");
        let metadata = NftMetadata::new(&checked, &image_uri);
        let metadata_uri = self
            .storage
            .upload(serde_json::to_vec(&metadata)?.into(), "application/json")
            .await?;
        info!("  metadata uri: {metadata_uri}");

        info!("step 3 - minting nft");
        let nft = self
            .minter
            .mint(MintRequest {
                metadata_uri,
                name: asset.name.clone(),
                symbol: asset.symbol.clone(),
                seller_fee_basis_points: asset.seller_fee_basis_points,
                creators: checked.creators,
            })
            .await?;
        info!("  minted nft: {}", nft.mint);

        Ok(nft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetAttribute, CreatorEntry};
    use solana_sdk::signature::Keypair;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn recorded(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct StubStorage {
        calls: Calls,
        uris: Mutex<Vec<String>>,
        json_documents: Mutex<Vec<serde_json::Value>>,
    }

    impl StubStorage {
        fn new(calls: Calls, uris: &[&str]) -> Self {
            Self {
                calls,
                uris: Mutex::new(uris.iter().rev().map(|s| s.to_string()).collect()),
                json_documents: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StorageUploader for StubStorage {
        async fn upload(&self, data: Bytes, content_type: &str) -> Result<String> {
            self.calls.push(format!("upload {content_type}"));
            if content_type == "application/json" {
                let doc = serde_json::from_slice(&data).unwrap();
                self.json_documents.lock().unwrap().push(doc);
            }
            Ok(self.uris.lock().unwrap().pop().expect("unexpected upload"))
        }
    }

    struct StubMinter {
        calls: Calls,
        requests: Mutex<Vec<MintRequest>>,
    }

    impl StubMinter {
        fn new(calls: Calls) -> Self {
            Self {
                calls,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MintSubmitter for StubMinter {
        async fn mint(&self, request: MintRequest) -> Result<MintedNft> {
            self.calls.push("mint");
            self.requests.lock().unwrap().push(request);
            Ok(MintedNft {
                mint: "ADDR1".into(),
                signature: "SIG1".into(),
            })
        }
    }

    fn record(name: &str, file_name: &str) -> AssetRecord {
        AssetRecord {
            file_name: file_name.into(),
            name: name.into(),
            mime_type: None,
            description: format!("{name} description"),
            attributes: vec![
                AssetAttribute {
                    trait_type: "Speed".into(),
                    value: "Average".into(),
                },
                AssetAttribute {
                    trait_type: "Type".into(),
                    value: "Common".into(),
                },
            ],
            seller_fee_basis_points: 500,
            symbol: "QNPIY".into(),
            creators: Vec::new(),
        }
    }

    fn pipeline(
        storage: StubStorage,
        minter: StubMinter,
        wallet: Wallet,
        upload_path: PathBuf,
    ) -> Pipeline<StubStorage, StubMinter> {
        Pipeline::new(
            storage,
            minter,
            wallet,
            upload_path,
            Duration::from_secs(5),
        )
    }

    fn image_dir(test: &str, files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::Builder::new().prefix(test).tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"not really a png").unwrap();
        }
        dir
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_runs_the_three_steps_in_order() {
        let dir = image_dir("happy", &["car1.png"]);
        let wallet = Wallet::new(Keypair::new());
        let calls = Calls::default();
        let storage = StubStorage::new(calls.clone(), &["ipfs://img1", "ipfs://meta1"]);
        let minter = StubMinter::new(calls.clone());

        let pipeline = pipeline(storage, minter, wallet.clone(), dir.path().into());
        let started = tokio::time::Instant::now();
        let report = pipeline.run(&[record("Mitsubishi Blue", "car1.png")]).await;

        // One asset, one cooldown.
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(report.all_succeeded());
        assert_eq!(report.minted.len(), 1);
        assert_eq!(report.minted[0].nft.mint, "ADDR1");
        assert_eq!(
            calls.recorded(),
            vec!["upload image/png", "upload application/json", "mint"]
        );

        let documents = pipeline.storage.json_documents.lock().unwrap();
        assert_eq!(documents[0]["image"], "ipfs://img1");
        assert_eq!(documents[0]["properties"]["files"][0]["uri"], "ipfs://img1");

        let requests = pipeline.minter.requests.lock().unwrap();
        assert_eq!(requests[0].metadata_uri, "ipfs://meta1");
        assert_eq!(requests[0].creators[0].address, wallet.pubkey());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_image_skips_the_asset_and_continues() {
        let dir = image_dir("missing", &["car2.png"]);
        let wallet = Wallet::new(Keypair::new());
        let calls = Calls::default();
        // Only the second asset ever reaches storage.
        let storage = StubStorage::new(calls.clone(), &["ipfs://img1", "ipfs://meta1"]);
        let minter = StubMinter::new(calls.clone());

        let pipeline = pipeline(storage, minter, wallet, dir.path().into());
        let started = tokio::time::Instant::now();
        let report = pipeline
            .run(&[
                record("Mitsubishi Blue", "car1.png"),
                record("Toyota Red", "car2.png"),
            ])
            .await;

        // A failed asset still gets its cooldown.
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "Mitsubishi Blue");
        assert!(matches!(report.failed[0].error, Error::AssetRead { .. }));
        assert_eq!(report.minted.len(), 1);
        assert_eq!(report.minted[0].name, "Toyota Red");
        assert_eq!(
            calls.recorded(),
            vec!["upload image/png", "upload application/json", "mint"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_shares_fail_before_any_network_call() {
        let dir = image_dir("shares", &["car1.png"]);
        let wallet = Wallet::new(Keypair::new());
        let calls = Calls::default();
        let storage = StubStorage::new(calls.clone(), &[]);
        let minter = StubMinter::new(calls.clone());

        let mut asset = record("Mitsubishi Blue", "car1.png");
        asset.creators = vec![CreatorEntry {
            address: wallet.pubkey().to_string(),
            share: 90,
        }];

        let pipeline = pipeline(storage, minter, wallet, dir.path().into());
        let report = pipeline.run(&[asset]).await;

        assert!(calls.recorded().is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            Error::CreatorShareSum { sum: 90, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn catalog_order_is_preserved() {
        let dir = image_dir("order", &["car1.png", "car2.png"]);
        let wallet = Wallet::new(Keypair::new());
        let calls = Calls::default();
        let storage = StubStorage::new(
            calls.clone(),
            &["u://a-img", "u://a-meta", "u://b-img", "u://b-meta"],
        );
        let minter = StubMinter::new(calls.clone());

        let pipeline = pipeline(storage, minter, wallet, dir.path().into());
        let started = tokio::time::Instant::now();
        let report = pipeline
            .run(&[
                record("Mitsubishi Blue", "car1.png"),
                record("Toyota Red", "car2.png"),
            ])
            .await;

        assert!(report.all_succeeded());
        // Two assets, two cooldowns.
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        let requests = pipeline.minter.requests.lock().unwrap();
        assert_eq!(requests[0].name, "Mitsubishi Blue");
        assert_eq!(requests[0].metadata_uri, "u://a-meta");
        assert_eq!(requests[1].name, "Toyota Red");
        assert_eq!(requests[1].metadata_uri, "u://b-meta");
    }
}
