use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::campaign::{Campaign, CampaignStatus};
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::primitives::{campaign_escrow_address, Address, Amount, CampaignId, Timestamp};

use crate::state::LedgerState;

/// All crowdfunding campaigns plus the id counter. Pledged funds are held
/// by per-campaign escrow accounts in the ledger, so every campaign
/// operation that moves money is an ordinary balance transfer underneath.
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
pub struct CampaignBook {
    campaigns: BTreeMap<CampaignId, Campaign>,
    next_id: CampaignId,
}

impl CampaignBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns.get(&id)
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    fn get_mut(&mut self, id: CampaignId) -> Result<&mut Campaign, TransitionError> {
        self.campaigns.get_mut(&id).ok_or(TransitionError::NotFound {
            entity: "campaign",
            id,
        })
    }

    /// Open a new campaign. The deadline must lie strictly in the future.
    pub fn create(
        &mut self,
        owner: Address,
        target: Amount,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<(CampaignId, EventKind), TransitionError> {
        if target == 0 {
            return Err(TransitionError::InvalidAmount);
        }
        if deadline <= now {
            return Err(TransitionError::CampaignExpired { deadline, now });
        }

        let id = self.next_id + 1;
        self.next_id = id;
        self.campaigns
            .insert(id, Campaign::new(id, owner, target, deadline));

        Ok((
            id,
            EventKind::CampaignCreated {
                campaign_id: id,
                owner,
                target,
                deadline,
            },
        ))
    }

    /// Pledge to an open campaign, moving the amount into escrow.
    pub fn pledge(
        &mut self,
        state: &mut LedgerState,
        contributor: Address,
        id: CampaignId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<EventKind, TransitionError> {
        if amount == 0 {
            return Err(TransitionError::InvalidAmount);
        }

        let campaign = self.get_mut(id)?;
        if campaign.is_finalized() {
            return Err(TransitionError::CampaignFinalized);
        }
        if campaign.is_expired(now) {
            return Err(TransitionError::CampaignExpired {
                deadline: campaign.deadline,
                now,
            });
        }

        let available = state.balance(&contributor);
        if available < amount {
            return Err(TransitionError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        let new_pledge = campaign
            .pledged(&contributor)
            .checked_add(amount)
            .ok_or(TransitionError::BalanceOverflow)?;
        let new_raised = campaign
            .raised
            .checked_add(amount)
            .ok_or(TransitionError::BalanceOverflow)?;

        // All checks passed; apply.
        state.debit(&contributor, amount);
        state.credit(campaign_escrow_address(id), amount)?;
        campaign.pledges.insert(contributor, new_pledge);
        campaign.raised = new_raised;

        Ok(EventKind::Pledged {
            campaign_id: id,
            contributor,
            amount,
            raised: new_raised,
        })
    }

    /// Close a campaign. Succeeds once the target is met (even before the
    /// deadline) or once the deadline has passed; callable by anyone.
    pub fn finalize(
        &mut self,
        id: CampaignId,
        now: Timestamp,
    ) -> Result<EventKind, TransitionError> {
        let campaign = self.get_mut(id)?;
        if campaign.is_finalized() {
            return Err(TransitionError::CampaignFinalized);
        }

        if campaign.raised >= campaign.target {
            campaign.status = CampaignStatus::Succeeded;
            campaign.payout = campaign.raised;
        } else if campaign.is_expired(now) {
            campaign.status = CampaignStatus::Failed;
        } else {
            return Err(TransitionError::NotYetExpired {
                deadline: campaign.deadline,
                now,
            });
        }

        Ok(EventKind::CampaignFinalized {
            campaign_id: id,
            status: campaign.status,
            raised: campaign.raised,
        })
    }

    /// Owner withdrawal after a successful campaign. The entitlement is
    /// zeroed before the escrow pays out, so the claim is one-shot.
    pub fn claim_funds(
        &mut self,
        state: &mut LedgerState,
        caller: Address,
        id: CampaignId,
    ) -> Result<EventKind, TransitionError> {
        let campaign = self.get_mut(id)?;
        if caller != campaign.owner {
            return Err(TransitionError::Unauthorized {
                required: "campaign owner".to_string(),
            });
        }
        if campaign.payout == 0 {
            return Err(TransitionError::NothingToClaim);
        }

        let amount = campaign.payout;
        campaign.payout = 0;
        let debited = state.debit(&campaign_escrow_address(id), amount);
        debug_assert!(debited, "escrow must cover the armed payout");
        state.credit(caller, amount)?;

        Ok(EventKind::CampaignFundsClaimed {
            campaign_id: id,
            owner: caller,
            amount,
        })
    }

    /// Contributor refund after a failed campaign. Removing the pledge
    /// entry before paying makes a second claim find nothing.
    pub fn claim_refund(
        &mut self,
        state: &mut LedgerState,
        caller: Address,
        id: CampaignId,
    ) -> Result<EventKind, TransitionError> {
        let campaign = self.get_mut(id)?;
        if campaign.status != CampaignStatus::Failed {
            return Err(TransitionError::NothingToClaim);
        }

        let amount = match campaign.pledges.remove(&caller) {
            Some(amount) if amount > 0 => amount,
            _ => return Err(TransitionError::NothingToClaim),
        };
        let debited = state.debit(&campaign_escrow_address(id), amount);
        debug_assert!(debited, "escrow must cover outstanding pledges");
        state.credit(caller, amount)?;

        Ok(EventKind::Refunded {
            campaign_id: id,
            contributor: caller,
            amount,
        })
    }
}
