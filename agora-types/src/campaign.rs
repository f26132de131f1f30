use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::primitives::{Address, Amount, CampaignId, Timestamp};

/// Lifecycle of a crowdfunding campaign. `Open` accepts pledges;
/// the terminal states are set exactly once by finalization.
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
pub enum CampaignStatus {
    /// Accepting pledges until the deadline.
    Open,
    /// Finalized with raised >= target; owner may claim the funds.
    Succeeded,
    /// Finalized short of target; contributors may claim refunds.
    Failed,
}

/// A crowdfunding campaign. Pledged funds live in the campaign's derived
/// escrow account until claimed, so the ledger supply invariant covers them.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Campaign {
    /// Sequentially assigned identifier.
    pub id: CampaignId,
    /// The account that created the campaign and may claim a successful raise.
    pub owner: Address,
    /// Funding goal in base units.
    pub target: Amount,
    /// Pledges are rejected at and after this timestamp.
    pub deadline: Timestamp,
    /// Total pledged so far.
    pub raised: Amount,
    /// Outstanding pledge per contributor. Entries are removed when
    /// refunded, so a remaining entry is exactly the refund entitlement.
    pub pledges: BTreeMap<Address, Amount>,
    /// Current lifecycle state.
    pub status: CampaignStatus,
    /// Owner withdrawal entitlement. Armed by a successful finalization,
    /// zeroed before the payout is credited.
    pub payout: Amount,
}

impl Campaign {
    pub fn new(id: CampaignId, owner: Address, target: Amount, deadline: Timestamp) -> Self {
        Self {
            id,
            owner,
            target,
            deadline,
            raised: 0,
            pledges: BTreeMap::new(),
            status: CampaignStatus::Open,
            payout: 0,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status != CampaignStatus::Open
    }

    /// True once the pledge window has closed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }

    /// The outstanding pledge of a contributor (zero once refunded).
    pub fn pledged(&self, contributor: &Address) -> Amount {
        self.pledges.get(contributor).copied().unwrap_or(0)
    }
}
