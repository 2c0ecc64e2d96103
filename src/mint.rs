use std::sync::Arc;

use async_trait::async_trait;
use mpl_token_metadata::{
    accounts::{MasterEdition, Metadata, TokenRecord},
    instructions::{CreateV1, CreateV1InstructionArgs, MintV1, MintV1InstructionArgs},
    types::{Creator, PrintSupply, TokenStandard},
};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_program::{hash::Hash, instruction::Instruction, message::Message, system_program, sysvar};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::{
    config::Wallet,
    error::Result,
    pipeline::{MintRequest, MintSubmitter, MintedNft},
};

/// Master edition `maxSupply`: no more than one print can ever exist.
const MAX_PRINT_SUPPLY: u64 = 1;

/// Builds an unsigned transaction and checks the fee payer can afford it.
pub(crate) async fn execute(
    client: &RpcClient,
    fee_payer: &Pubkey,
    instructions: &[Instruction],
    minimum_balance_for_rent_exemption: u64,
) -> Result<(Transaction, Hash)> {
    let recent_blockhash = client.get_latest_blockhash().await?;

    let message = Message::new_with_blockhash(instructions, Some(fee_payer), &recent_blockhash);

    let balance = client.get_balance(fee_payer).await?;

    let needed = minimum_balance_for_rent_exemption + client.get_fee_for_message(&message).await?;

    if balance < needed {
        return Err(crate::Error::InsufficientSolanaBalance { needed, balance });
    }

    let transaction = Transaction::new_unsigned(message);

    Ok((transaction, recent_blockhash))
}

pub(crate) async fn submit_transaction(client: &RpcClient, tx: Transaction) -> Result<Signature> {
    Ok(client.send_and_confirm_transaction(&tx).await?)
}

/// Arguments for the `CreateV1` instruction. Every token comes out
/// immutable, NonFungible, and with prints capped at one, whatever the
/// request says.
fn create_instruction_args(request: MintRequest, payer: Pubkey) -> CreateV1InstructionArgs {
    let creators = request
        .creators
        .iter()
        .map(|creator| Creator {
            address: creator.address,
            // The fee payer signs the transaction, so its creator entry
            // can be created verified; anyone else has to verify later.
            verified: creator.address == payer,
            share: creator.share,
        })
        .collect::<Vec<_>>();

    CreateV1InstructionArgs {
        name: request.name,
        symbol: request.symbol,
        uri: request.metadata_uri,
        seller_fee_basis_points: request.seller_fee_basis_points,
        creators: Some(creators),
        primary_sale_happened: false,
        is_mutable: false,
        token_standard: TokenStandard::NonFungible,
        collection: None,
        uses: None,
        collection_details: None,
        rule_set: None,
        decimals: None,
        print_supply: Some(PrintSupply::Limited(MAX_PRINT_SUPPLY)),
    }
}

/// Arguments for the `MintV1` instruction: exactly one unit.
fn mint_instruction_args() -> MintV1InstructionArgs {
    MintV1InstructionArgs {
        amount: 1,
        authorization_data: None,
    }
}

/// Creates supply-1, immutable tokens through the Token Metadata program.
pub struct MetaplexMinter {
    client: Arc<RpcClient>,
    wallet: Wallet,
}

impl MetaplexMinter {
    pub fn new(client: Arc<RpcClient>, wallet: Wallet) -> Self {
        Self { client, wallet }
    }
}

#[async_trait]
impl MintSubmitter for MetaplexMinter {
    async fn mint(&self, request: MintRequest) -> Result<MintedNft> {
        let mint_account = Keypair::new();
        let (metadata_account, _) = Metadata::find_pda(&mint_account.pubkey());
        let (master_edition_account, _) = MasterEdition::find_pda(&mint_account.pubkey());

        let payer = self.wallet.pubkey();

        let create_ix = CreateV1 {
            metadata: metadata_account,
            master_edition: Some(master_edition_account),
            mint: (mint_account.pubkey(), true),
            authority: payer,
            payer,
            update_authority: (payer, true),
            system_program: system_program::id(),
            sysvar_instructions: sysvar::instructions::id(),
            spl_token_program: Some(spl_token::id()),
        };

        let create_ix = create_ix.instruction(create_instruction_args(request, payer));

        let token_account = spl_associated_token_account::get_associated_token_address(
            &payer,
            &mint_account.pubkey(),
        );
        let token_record = TokenRecord::find_pda(&mint_account.pubkey(), &token_account).0;

        let mint_ix = MintV1 {
            token: token_account,
            token_owner: Some(payer),
            metadata: metadata_account,
            master_edition: Some(master_edition_account),
            token_record: Some(token_record),
            mint: mint_account.pubkey(),
            authority: payer,
            delegate_record: None,
            payer,
            system_program: system_program::id(),
            sysvar_instructions: sysvar::instructions::id(),
            spl_token_program: spl_token::id(),
            spl_ata_program: spl_associated_token_account::id(),
            authorization_rules_program: None,
            authorization_rules: None,
        };

        let mint_ix = mint_ix.instruction(mint_instruction_args());

        let minimum_balance_for_rent_exemption = self
            .client
            .get_minimum_balance_for_rent_exemption(std::mem::size_of::<MasterEdition>())
            .await?;

        let (mut tx, recent_blockhash) = execute(
            &self.client,
            &payer,
            &[create_ix, mint_ix],
            minimum_balance_for_rent_exemption,
        )
        .await?;

        tx.try_sign(&[self.wallet.keypair(), &mint_account], recent_blockhash)?;

        let signature = submit_transaction(&self.client, tx).await?;

        Ok(MintedNft {
            mint: mint_account.pubkey().to_string(),
            signature: signature.to_string(),
        })
    }
}
