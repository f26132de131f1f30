use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::constants::MAX_DESCRIPTION_LENGTH;
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::governance::{
    GovernanceParams, Proposal, ProposalState, VoteChoice, VoteTally,
};
use agora_types::primitives::{Address, ProposalId, Timestamp};

use crate::state::LedgerState;

/// All governance proposals plus the id counter and chain parameters.
/// Voting power is snapshotted from the ledger's delegated weights at
/// proposal creation; the ledger is never consulted again afterwards.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct GovernanceBook {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
    params: GovernanceParams,
}

impl GovernanceBook {
    pub fn new(params: GovernanceParams) -> Self {
        Self {
            proposals: BTreeMap::new(),
            next_id: 0,
            params,
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, TransitionError> {
        self.proposals.get_mut(&id).ok_or(TransitionError::NotFound {
            entity: "proposal",
            id,
        })
    }

    /// Create a proposal, snapshotting every account's delegated weight.
    pub fn create_proposal(
        &mut self,
        state: &LedgerState,
        proposer: Address,
        description: String,
        now: Timestamp,
    ) -> Result<(ProposalId, EventKind), TransitionError> {
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(TransitionError::ValueTooLarge {
                size: description.len(),
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        let snapshot = state.voting_weights();
        let proposer_weight = snapshot.get(&proposer).copied().unwrap_or(0);
        if proposer_weight < self.params.proposal_threshold {
            return Err(TransitionError::Unauthorized {
                required: format!(
                    "voting weight of at least {}",
                    self.params.proposal_threshold
                ),
            });
        }

        let snapshot_total = snapshot
            .values()
            .fold(0u128, |sum, w| sum.saturating_add(*w));
        let quorum = snapshot_total.saturating_mul(self.params.quorum_percent as u128) / 100;
        let voting_start = now + self.params.voting_delay;
        let voting_end = voting_start + self.params.voting_period;

        let id = self.next_id + 1;
        self.next_id = id;
        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer,
                description,
                voting_start,
                voting_end,
                snapshot,
                snapshot_total,
                quorum,
                tally: VoteTally::default(),
                votes: BTreeMap::new(),
                queued: false,
                executed: false,
                canceled: false,
                eta: None,
            },
        );

        Ok((
            id,
            EventKind::ProposalCreated {
                proposal_id: id,
                proposer,
                voting_start,
                voting_end,
            },
        ))
    }

    /// Record a vote with the voter's snapshot weight. One vote per voter;
    /// the recorded weight is immune to later balance changes.
    pub fn cast_vote(
        &mut self,
        voter: Address,
        id: ProposalId,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<EventKind, TransitionError> {
        let proposal = self.get_mut(id)?;
        if proposal.state(now) != ProposalState::Active {
            return Err(TransitionError::VotingClosed);
        }
        if proposal.votes.contains_key(&voter) {
            return Err(TransitionError::AlreadyVoted);
        }

        let weight = proposal.weight_of(&voter);
        match choice {
            VoteChoice::For => {
                proposal.tally.for_votes = proposal.tally.for_votes.saturating_add(weight);
            }
            VoteChoice::Against => {
                proposal.tally.against_votes = proposal.tally.against_votes.saturating_add(weight);
            }
            VoteChoice::Abstain => {
                proposal.tally.abstain_votes = proposal.tally.abstain_votes.saturating_add(weight);
            }
        }
        proposal.votes.insert(voter, choice);

        Ok(EventKind::VoteCast {
            proposal_id: id,
            voter,
            choice,
            weight,
        })
    }

    /// Queue a succeeded proposal behind the timelock.
    pub fn queue(&mut self, id: ProposalId, now: Timestamp) -> Result<EventKind, TransitionError> {
        let timelock_delay = self.params.timelock_delay;
        let proposal = self.get_mut(id)?;
        let state = proposal.state(now);
        if state != ProposalState::Succeeded {
            return Err(TransitionError::InvalidProposalState { state });
        }

        let eta = now + timelock_delay;
        proposal.queued = true;
        proposal.eta = Some(eta);

        Ok(EventKind::ProposalQueued {
            proposal_id: id,
            eta,
        })
    }

    /// Execute a queued proposal once its timelock has elapsed. One-shot.
    pub fn execute(&mut self, id: ProposalId, now: Timestamp) -> Result<EventKind, TransitionError> {
        let proposal = self.get_mut(id)?;
        if proposal.executed {
            return Err(TransitionError::AlreadyExecuted);
        }
        let state = proposal.state(now);
        if state != ProposalState::Queued {
            return Err(TransitionError::InvalidProposalState { state });
        }
        // Queued implies an eta is set.
        let eta = proposal.eta.unwrap_or(0);
        if now < eta {
            return Err(TransitionError::TimelockNotElapsed { eta, now });
        }

        proposal.executed = true;
        Ok(EventKind::ProposalExecuted { proposal_id: id })
    }

    /// Cancel a proposal from any non-terminal state. Proposer or admin.
    pub fn cancel(
        &mut self,
        caller: Address,
        caller_is_admin: bool,
        id: ProposalId,
    ) -> Result<EventKind, TransitionError> {
        let proposal = self.get_mut(id)?;
        if proposal.executed {
            return Err(TransitionError::AlreadyExecuted);
        }
        if proposal.canceled {
            return Err(TransitionError::InvalidProposalState {
                state: ProposalState::Canceled,
            });
        }
        if caller != proposal.proposer && !caller_is_admin {
            return Err(TransitionError::Unauthorized {
                required: "proposer or admin role".to_string(),
            });
        }

        proposal.canceled = true;
        Ok(EventKind::ProposalCanceled { proposal_id: id })
    }
}
