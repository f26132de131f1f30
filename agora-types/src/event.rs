use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignStatus;
use crate::governance::VoteChoice;
use crate::primitives::{Address, Amount, CampaignId, NftId, ProposalId, Sequence, SlotKey, Timestamp};
use crate::roles::RoleSet;

/// An entry in the append-only event log, keyed by the sequence number of
/// the transition that emitted it and its emission index within that
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: Sequence,
    pub index: u32,
    pub kind: EventKind,
}

/// Everything the engine announces. Events carry enough detail to rebuild
/// derived views (balance flows, ownership history) from the log alone.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum EventKind {
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    Minted {
        account: Address,
        amount: Amount,
        total_supply: Amount,
    },
    Burned {
        account: Address,
        amount: Amount,
        total_supply: Amount,
    },
    StorageChanged {
        account: Address,
        key: SlotKey,
        previous: Option<Vec<u8>>,
        value: Vec<u8>,
    },
    RoleGranted {
        account: Address,
        roles: RoleSet,
    },
    RoleRevoked {
        account: Address,
        roles: RoleSet,
    },
    CampaignCreated {
        campaign_id: CampaignId,
        owner: Address,
        target: Amount,
        deadline: Timestamp,
    },
    Pledged {
        campaign_id: CampaignId,
        contributor: Address,
        amount: Amount,
        raised: Amount,
    },
    CampaignFinalized {
        campaign_id: CampaignId,
        status: CampaignStatus,
        raised: Amount,
    },
    CampaignFundsClaimed {
        campaign_id: CampaignId,
        owner: Address,
        amount: Amount,
    },
    Refunded {
        campaign_id: CampaignId,
        contributor: Address,
        amount: Amount,
    },
    NftMinted {
        token_id: NftId,
        to: Address,
        uri: String,
    },
    NftTransferred {
        token_id: NftId,
        from: Address,
        to: Address,
    },
    NftBurned {
        token_id: NftId,
        owner: Address,
    },
    DelegateChanged {
        delegator: Address,
        previous: Address,
        delegate: Address,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        voting_start: Timestamp,
        voting_end: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        choice: VoteChoice,
        weight: Amount,
    },
    ProposalQueued {
        proposal_id: ProposalId,
        eta: Timestamp,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
    },
    ProposalCanceled {
        proposal_id: ProposalId,
    },
}

impl EventKind {
    /// Short event name for logs and subscriptions.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Transfer { .. } => "transfer",
            EventKind::Approval { .. } => "approval",
            EventKind::Minted { .. } => "minted",
            EventKind::Burned { .. } => "burned",
            EventKind::StorageChanged { .. } => "storage_changed",
            EventKind::RoleGranted { .. } => "role_granted",
            EventKind::RoleRevoked { .. } => "role_revoked",
            EventKind::CampaignCreated { .. } => "campaign_created",
            EventKind::Pledged { .. } => "pledged",
            EventKind::CampaignFinalized { .. } => "campaign_finalized",
            EventKind::CampaignFundsClaimed { .. } => "campaign_funds_claimed",
            EventKind::Refunded { .. } => "refunded",
            EventKind::NftMinted { .. } => "nft_minted",
            EventKind::NftTransferred { .. } => "nft_transferred",
            EventKind::NftBurned { .. } => "nft_burned",
            EventKind::DelegateChanged { .. } => "delegate_changed",
            EventKind::ProposalCreated { .. } => "proposal_created",
            EventKind::VoteCast { .. } => "vote_cast",
            EventKind::ProposalQueued { .. } => "proposal_queued",
            EventKind::ProposalExecuted { .. } => "proposal_executed",
            EventKind::ProposalCanceled { .. } => "proposal_canceled",
        }
    }
}
