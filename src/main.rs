use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use solana_client::nonblocking::rpc_client::RpcClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use solana_nft_minter::{
    config::{self, Catalog, Wallet},
    mint::MetaplexMinter,
    pipeline::Pipeline,
    storage::BundlrClient,
};

/// Mints every asset of a catalog file as an NFT.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML catalog describing the assets to mint.
    catalog: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> solana_nft_minter::Result<bool> {
    let catalog = Catalog::load(&args.catalog)?;
    let rpc_url = config::rpc_url_from_env()?;
    let wallet = Wallet::from_env()?;

    let client = Arc::new(RpcClient::new(rpc_url));
    let storage = BundlrClient::new(client.clone(), catalog.cluster, wallet.clone())?;
    let minter = MetaplexMinter::new(client, wallet.clone());

    let pipeline = Pipeline::new(
        storage,
        minter,
        wallet,
        catalog.upload_path.clone(),
        catalog.cooldown(),
    );
    let report = pipeline.run(&catalog.assets).await;

    for minted in &report.minted {
        info!(
            "minted \"{}\": {}",
            minted.name,
            catalog.cluster.explorer_url(&minted.nft.mint)
        );
    }
    for failed in &report.failed {
        error!("failed \"{}\": {}", failed.name, failed.error);
    }
    info!(
        "{} minted, {} failed",
        report.minted.len(),
        report.failed.len()
    );

    Ok(report.all_succeeded())
}
