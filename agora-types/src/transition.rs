use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::event::EventRecord;
use crate::governance::VoteChoice;
use crate::primitives::{Address, Amount, CampaignId, NftId, ProposalId, Sequence, SlotKey, Timestamp};
use crate::roles::RoleSet;

/// Direction of a supply adjustment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum MintDirection {
    /// Create supply and credit the account.
    Mint,
    /// Debit the account and destroy supply.
    Burn,
}

/// The typed operations the engine executes.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum TransitionOp {
    /// Move tokens between accounts. When `from` differs from the caller,
    /// an allowance from `from` to the caller is consumed.
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Set the caller's allowance for a spender (overwrites, no increment).
    Approve { spender: Address, amount: Amount },
    /// Adjust total supply and one balance in lockstep. Minter role required.
    MintBurn {
        account: Address,
        amount: Amount,
        direction: MintDirection,
    },
    /// Write a storage slot of `account`. The caller must be the account
    /// itself or hold the slot-admin role.
    SetStorage {
        account: Address,
        key: SlotKey,
        value: Vec<u8>,
    },
    /// Add roles to an account. Admin only.
    GrantRole { account: Address, roles: RoleSet },
    /// Remove roles from an account. Admin only.
    RevokeRole { account: Address, roles: RoleSet },
    /// Open a crowdfunding campaign owned by the caller.
    CreateCampaign { target: Amount, deadline: Timestamp },
    /// Pledge tokens to an open campaign. Funds move into escrow.
    Pledge { campaign_id: CampaignId, amount: Amount },
    /// Close a campaign once its deadline passed or its target is met.
    FinalizeCampaign { campaign_id: CampaignId },
    /// Owner withdrawal after a successful campaign. One-shot.
    ClaimCampaignFunds { campaign_id: CampaignId },
    /// Contributor refund after a failed campaign. One-shot per contributor.
    ClaimRefund { campaign_id: CampaignId },
    /// Mint a new NFT to `to`. Minter role required.
    MintNft { to: Address, uri: String },
    /// Transfer an NFT. Current owner only.
    TransferNft { token_id: NftId, to: Address },
    /// Burn an NFT. Current owner only.
    BurnNft { token_id: NftId },
    /// Redirect the caller's future snapshot voting weight to `to`.
    Delegate { to: Address },
    /// Create a governance proposal, snapshotting voting power.
    CreateProposal { description: String },
    /// Cast the caller's snapshot weight on an active proposal.
    CastVote {
        proposal_id: ProposalId,
        choice: VoteChoice,
    },
    /// Queue a succeeded proposal behind the timelock.
    QueueProposal { proposal_id: ProposalId },
    /// Execute a queued proposal once its timelock elapsed. One-shot.
    ExecuteProposal { proposal_id: ProposalId },
    /// Cancel a non-terminal proposal. Proposer or admin.
    CancelProposal { proposal_id: ProposalId },
}

impl TransitionOp {
    /// Short operation name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            TransitionOp::Transfer { .. } => "transfer",
            TransitionOp::Approve { .. } => "approve",
            TransitionOp::MintBurn { .. } => "mint_burn",
            TransitionOp::SetStorage { .. } => "set_storage",
            TransitionOp::GrantRole { .. } => "grant_role",
            TransitionOp::RevokeRole { .. } => "revoke_role",
            TransitionOp::CreateCampaign { .. } => "create_campaign",
            TransitionOp::Pledge { .. } => "pledge",
            TransitionOp::FinalizeCampaign { .. } => "finalize_campaign",
            TransitionOp::ClaimCampaignFunds { .. } => "claim_campaign_funds",
            TransitionOp::ClaimRefund { .. } => "claim_refund",
            TransitionOp::MintNft { .. } => "mint_nft",
            TransitionOp::TransferNft { .. } => "transfer_nft",
            TransitionOp::BurnNft { .. } => "burn_nft",
            TransitionOp::Delegate { .. } => "delegate",
            TransitionOp::CreateProposal { .. } => "create_proposal",
            TransitionOp::CastVote { .. } => "cast_vote",
            TransitionOp::QueueProposal { .. } => "queue_proposal",
            TransitionOp::ExecuteProposal { .. } => "execute_proposal",
            TransitionOp::CancelProposal { .. } => "cancel_proposal",
        }
    }
}

/// A transition request: the unit of execution. The caller's nonce must
/// match the account's current nonce; the timestamp drives the engine
/// clock forward and gates all time-dependent checks.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Transition {
    pub caller: Address,
    pub nonce: u64,
    pub timestamp: Timestamp,
    pub op: TransitionOp,
}

/// The result of an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Receipt {
    /// Position of this transition in the global order.
    pub sequence: Sequence,
    /// Events emitted by this transition, in emission order.
    pub events: Vec<EventRecord>,
    /// Identifier assigned by creation operations (campaign, proposal, NFT).
    pub created_id: Option<u64>,
}
