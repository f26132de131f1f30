use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::primitives::{Address, NftId};

/// A registered non-fungible token. Exactly one owner per id; burned
/// tokens are removed from the registry and their ids never reused.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Nft {
    /// Sequentially assigned identifier.
    pub id: NftId,
    pub owner: Address,
    /// Opaque metadata reference, immutable after minting.
    pub uri: String,
}

impl Nft {
    pub fn new(id: NftId, owner: Address, uri: String) -> Self {
        Self { id, owner, uri }
    }
}
