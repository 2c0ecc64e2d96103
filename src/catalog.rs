use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::Wallet,
    error::{Error, Result},
};

pub const MAX_ROYALTY_BASIS_POINTS: u16 = 10_000;

/// One image to mint, as declared in the catalog file.
#[derive(Deserialize, Debug, Clone)]
pub struct AssetRecord {
    pub file_name: String,
    pub name: String,
    /// Guessed from `file_name` when absent.
    #[serde(default)]
    pub mime_type: Option<String>,
    pub description: String,
    #[serde(default)]
    pub attributes: Vec<AssetAttribute>,
    pub seller_fee_basis_points: u16,
    pub symbol: String,
    /// Empty means the minting wallet takes the whole share.
    #[serde(default)]
    pub creators: Vec<CreatorEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetAttribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreatorEntry {
    pub address: String,
    pub share: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftCreator {
    pub address: Pubkey,
    pub share: u8,
}

/// An asset record that passed validation, with the mime type and creator
/// list resolved.
#[derive(Debug)]
pub struct CheckedAsset<'a> {
    pub record: &'a AssetRecord,
    pub mime_type: String,
    pub creators: Vec<NftCreator>,
}

impl AssetRecord {
    /// Checks everything that can be checked locally, before any network
    /// call is made for this asset.
    pub fn validate(&self, wallet: &Wallet) -> Result<CheckedAsset<'_>> {
        if self.seller_fee_basis_points > MAX_ROYALTY_BASIS_POINTS {
            return Err(Error::RoyaltyOutOfRange {
                name: self.name.clone(),
                basis_points: self.seller_fee_basis_points,
            });
        }

        let creators = self.resolved_creators(wallet)?;
        let sum: u32 = creators.iter().map(|c| u32::from(c.share)).sum();
        if sum != 100 {
            return Err(Error::CreatorShareSum {
                name: self.name.clone(),
                sum,
            });
        }

        let mime_type = match &self.mime_type {
            Some(mime_type) => mime_type.clone(),
            None => mime_guess::from_path(&self.file_name)
                .first()
                .ok_or_else(|| Error::MimeTypeNotFound {
                    name: self.name.clone(),
                    file: self.file_name.clone(),
                })?
                .to_string(),
        };

        Ok(CheckedAsset {
            record: self,
            mime_type,
            creators,
        })
    }

    fn resolved_creators(&self, wallet: &Wallet) -> Result<Vec<NftCreator>> {
        if self.creators.is_empty() {
            return Ok(vec![NftCreator {
                address: wallet.pubkey(),
                share: 100,
            }]);
        }

        self.creators
            .iter()
            .map(|creator| {
                let address = Pubkey::from_str(&creator.address).map_err(|_| {
                    Error::InvalidCreatorAddress {
                        name: self.name.clone(),
                        address: creator.address.clone(),
                    }
                })?;
                Ok(NftCreator {
                    address,
                    share: creator.share,
                })
            })
            .collect()
    }
}
