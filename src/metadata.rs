use serde::{Deserialize, Serialize};

use crate::catalog::{AssetAttribute, CheckedAsset};

/// The off-chain document uploaded next to every token.
///
/// The key structure (name/description/image/attributes/properties.files) is
/// what wallets and marketplaces expect; nothing else is emitted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<AssetAttribute>,
    pub properties: NftMetadataProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadataProperties {
    pub files: Vec<NftMetadataFile>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NftMetadataFile {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NftMetadata {
    pub fn new(asset: &CheckedAsset<'_>, image_uri: &str) -> Self {
        Self {
            name: asset.record.name.clone(),
            description: asset.record.description.clone(),
            image: image_uri.to_owned(),
            attributes: asset.record.attributes.clone(),
            properties: NftMetadataProperties {
                files: vec![NftMetadataFile {
                    uri: image_uri.to_owned(),
                    kind: asset.mime_type.clone(),
                }],
            },
        }
    }
}
