use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::constants::MAX_URI_LENGTH;
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::nft::Nft;
use agora_types::primitives::{Address, NftId, ZERO_ADDRESS};

/// The NFT registry: one owner per token id, ids never reused. Minting
/// authorization is the dispatcher's job; ownership checks live here.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct NftRegistry {
    tokens: BTreeMap<NftId, Nft>,
    next_id: NftId,
}

impl NftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NftId) -> Option<&Nft> {
        self.tokens.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens owned by an address, in id order.
    pub fn owned_by(&self, owner: &Address) -> Vec<NftId> {
        self.tokens
            .values()
            .filter(|nft| nft.owner == *owner)
            .map(|nft| nft.id)
            .collect()
    }

    pub fn mint(
        &mut self,
        to: Address,
        uri: String,
    ) -> Result<(NftId, EventKind), TransitionError> {
        if to == ZERO_ADDRESS {
            return Err(TransitionError::InvalidRecipient);
        }
        if uri.len() > MAX_URI_LENGTH {
            return Err(TransitionError::ValueTooLarge {
                size: uri.len(),
                max: MAX_URI_LENGTH,
            });
        }

        let id = self.next_id + 1;
        self.next_id = id;
        self.tokens.insert(id, Nft::new(id, to, uri.clone()));

        Ok((
            id,
            EventKind::NftMinted {
                token_id: id,
                to,
                uri,
            },
        ))
    }

    pub fn transfer(
        &mut self,
        caller: &Address,
        token_id: NftId,
        to: Address,
    ) -> Result<EventKind, TransitionError> {
        if to == ZERO_ADDRESS {
            return Err(TransitionError::InvalidRecipient);
        }
        let nft = self.tokens.get_mut(&token_id).ok_or(TransitionError::NotFound {
            entity: "nft",
            id: token_id,
        })?;
        if nft.owner != *caller {
            return Err(TransitionError::Unauthorized {
                required: "token owner".to_string(),
            });
        }

        let from = nft.owner;
        nft.owner = to;
        Ok(EventKind::NftTransferred { token_id, from, to })
    }

    pub fn burn(&mut self, caller: &Address, token_id: NftId) -> Result<EventKind, TransitionError> {
        let nft = self.tokens.get(&token_id).ok_or(TransitionError::NotFound {
            entity: "nft",
            id: token_id,
        })?;
        if nft.owner != *caller {
            return Err(TransitionError::Unauthorized {
                required: "token owner".to_string(),
            });
        }

        self.tokens.remove(&token_id);
        Ok(EventKind::NftBurned {
            token_id,
            owner: *caller,
        })
    }
}
