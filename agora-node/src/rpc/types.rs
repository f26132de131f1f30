use serde::{Deserialize, Serialize};

/// Information about an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account address as hex string.
    pub address: String,
    /// Balance in base units, as string.
    pub balance: String,
    /// Next expected nonce.
    pub nonce: u64,
    /// Granted roles (e.g., "admin|minter", "none").
    pub roles: String,
    /// Voting delegate as hex string, if one is set.
    pub delegate: Option<String>,
}

/// Information about the engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInfo {
    /// Chain identifier.
    pub chain_id: String,
    /// Sequence number of the last accepted transition.
    pub sequence: u64,
    /// Engine clock (seconds).
    pub clock: u64,
    /// State root as hex string.
    pub state_root: String,
    /// Total token supply in base units, as string.
    pub total_supply: String,
    /// Number of accounts with ledger entries.
    pub account_count: usize,
    /// Number of campaigns ever created.
    pub campaign_count: usize,
    /// Number of proposals ever created.
    pub proposal_count: usize,
    /// Number of live NFTs.
    pub nft_count: usize,
    /// Number of events in the log.
    pub event_count: usize,
}

/// Result of submitting a transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    /// Whether the transition was accepted.
    pub accepted: bool,
    /// Assigned sequence number, if accepted.
    pub sequence: Option<u64>,
    /// Identifier assigned by a creation operation, if any.
    pub created_id: Option<u64>,
    /// Events emitted by the transition.
    #[serde(default)]
    pub events: Vec<EventInfo>,
    /// Rejection reason, if any.
    pub reason: Option<String>,
}

/// A key-value attribute in a structured event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInfo {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

/// A structured event from the engine log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    /// Sequence number of the emitting transition.
    pub sequence: u64,
    /// Emission index within that transition.
    pub index: u32,
    /// Event type (e.g., "transfer", "pledged").
    #[serde(rename = "type")]
    pub ty: String,
    /// Key-value attributes.
    pub attributes: Vec<AttributeInfo>,
}

/// Information about a crowdfunding campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignInfo {
    /// Campaign identifier.
    pub campaign_id: u64,
    /// Owner address as hex string.
    pub owner: String,
    /// Funding goal in base units, as string.
    pub target: String,
    /// Pledge cutoff timestamp.
    pub deadline: u64,
    /// Total pledged so far in base units, as string.
    pub raised: String,
    /// Lifecycle status: "open", "succeeded", or "failed".
    pub status: String,
    /// Unclaimed owner payout in base units, as string.
    pub payout: String,
    /// Number of outstanding pledges.
    pub pledge_count: usize,
    /// Derived escrow address as hex string.
    pub escrow_address: String,
}

/// Information about a governance proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInfo {
    /// Proposal identifier.
    pub proposal_id: u64,
    /// Proposer address as hex string.
    pub proposer: String,
    /// Proposal description.
    pub description: String,
    /// Timestamp when voting opens.
    pub voting_start: u64,
    /// Timestamp when voting closes (exclusive).
    pub voting_end: u64,
    /// Observed state (e.g., "active", "queued").
    pub state: String,
    /// Weight cast for, as string.
    pub for_votes: String,
    /// Weight cast against, as string.
    pub against_votes: String,
    /// Weight cast abstaining, as string.
    pub abstain_votes: String,
    /// Minimum cast weight required to pass, as string.
    pub quorum: String,
    /// Total snapshot weight, as string.
    pub snapshot_total: String,
    /// Earliest execution time, if queued.
    pub eta: Option<u64>,
}

/// Information about an NFT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftInfo {
    /// Token identifier.
    pub token_id: u64,
    /// Owner address as hex string.
    pub owner: String,
    /// Metadata reference.
    pub uri: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    /// Node uptime status.
    pub status: String,
    /// Chain identifier.
    pub chain_id: String,
    /// Sequence number of the last accepted transition.
    pub sequence: u64,
    /// Engine clock (seconds).
    pub clock: u64,
    /// Node software version.
    pub version: String,
}

/// Receipt pushed to subscribers when a transition is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptInfo {
    /// Assigned sequence number.
    pub sequence: u64,
    /// Caller address as hex string.
    pub caller: String,
    /// Operation name (e.g., "transfer", "cast_vote").
    pub op: String,
    /// Identifier assigned by a creation operation, if any.
    pub created_id: Option<u64>,
    /// Events emitted by the transition.
    pub events: Vec<EventInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_result_serialization() {
        let result = SubmitResult {
            accepted: true,
            sequence: Some(7),
            created_id: Some(2),
            events: vec![EventInfo {
                sequence: 7,
                index: 0,
                ty: "campaign_created".to_string(),
                attributes: vec![AttributeInfo {
                    key: "campaign_id".to_string(),
                    value: "2".to_string(),
                }],
            }],
            reason: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: SubmitResult = serde_json::from_str(&json).unwrap();
        assert!(deserialized.accepted);
        assert_eq!(deserialized.sequence, Some(7));
        assert_eq!(deserialized.events.len(), 1);
        assert_eq!(deserialized.events[0].ty, "campaign_created");
    }

    #[test]
    fn test_event_info_type_field_renamed() {
        let info = EventInfo {
            sequence: 1,
            index: 0,
            ty: "transfer".to_string(),
            attributes: Vec::new(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"type\":\"transfer\""));
    }

    #[test]
    fn test_state_info_serialization() {
        let info = StateInfo {
            chain_id: "agora-dev".to_string(),
            sequence: 100,
            clock: 1_700_000_000,
            state_root: "deadbeef".to_string(),
            total_supply: "1000000000".to_string(),
            account_count: 3,
            campaign_count: 1,
            proposal_count: 0,
            nft_count: 2,
            event_count: 12,
        };
        let json = serde_json::to_string(&info).unwrap();
        let deserialized: StateInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.sequence, 100);
        assert_eq!(deserialized.total_supply, "1000000000");
    }
}
