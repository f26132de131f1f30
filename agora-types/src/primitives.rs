/// 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// 20-byte account address.
pub type Address = [u8; 20];

/// 32-byte storage slot key, scoped to an account.
pub type SlotKey = [u8; 32];

/// Unique identifier for a crowdfunding campaign (assigned sequentially).
pub type CampaignId = u64;

/// Unique identifier for a governance proposal (assigned sequentially).
pub type ProposalId = u64;

/// Unique identifier for a registered NFT (assigned sequentially).
pub type NftId = u64;

/// Position of an accepted transition in the global order.
pub type Sequence = u64;

/// Amount of tokens in base units.
pub type Amount = u128;

/// Unix timestamp in seconds, supplied by callers.
pub type Timestamp = u64;

/// The zero address, never a valid transfer or mint recipient.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Domain separator for campaign escrow address derivation.
const ESCROW_DOMAIN: &[u8] = b"agora:campaign:escrow";

/// Compute the deterministic escrow address that holds a campaign's
/// pledged funds. Derived addresses have no keypair, so escrow balances
/// can only move through campaign operations.
pub fn campaign_escrow_address(campaign_id: CampaignId) -> Address {
    use blake3::Hasher;
    let mut hasher = Hasher::new();
    hasher.update(ESCROW_DOMAIN);
    hasher.update(&campaign_id.to_le_bytes());
    let hash = hasher.finalize();
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash.as_bytes()[..20]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_address_deterministic() {
        assert_eq!(campaign_escrow_address(7), campaign_escrow_address(7));
        assert_ne!(campaign_escrow_address(7), campaign_escrow_address(8));
    }

    #[test]
    fn test_escrow_address_never_zero() {
        for id in 0..100 {
            assert_ne!(campaign_escrow_address(id), ZERO_ADDRESS);
        }
    }
}
