use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PROPOSAL_THRESHOLD, DEFAULT_QUORUM_PERCENT, DEFAULT_TIMELOCK_DELAY,
    DEFAULT_VOTING_DELAY, DEFAULT_VOTING_PERIOD,
};
use crate::primitives::{Address, Amount, ProposalId, Timestamp};

/// A voter's choice on a proposal.
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
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

/// Observable lifecycle state of a proposal. Time-driven states are
/// derived from the stored flags and the engine clock, so a proposal
/// can only move forward.
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
pub enum ProposalState {
    /// Created, voting not yet open.
    Pending,
    /// Within the voting window.
    Active,
    /// Voting closed with quorum reached and more for than against.
    Succeeded,
    /// Voting closed without quorum or with for <= against.
    Defeated,
    /// Queued behind the timelock.
    Queued,
    /// Executed. Terminal.
    Executed,
    /// Canceled by the proposer or an admin. Terminal.
    Canceled,
}

/// Accumulated vote weight per choice.
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
pub struct VoteTally {
    pub for_votes: Amount,
    pub against_votes: Amount,
    pub abstain_votes: Amount,
}

impl VoteTally {
    /// Total weight cast across all three choices.
    pub fn cast_total(&self) -> Amount {
        self.for_votes
            .saturating_add(self.against_votes)
            .saturating_add(self.abstain_votes)
    }
}

/// Governance parameters, fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Seconds between proposal creation and the start of voting.
    pub voting_delay: u64,
    /// Length of the voting window in seconds.
    pub voting_period: u64,
    /// Seconds a queued proposal must wait before execution.
    pub timelock_delay: u64,
    /// Quorum as a percentage of the snapshot's total weight.
    pub quorum_percent: u8,
    /// Minimum snapshot weight required to create a proposal (0 disables).
    pub proposal_threshold: Amount,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_delay: DEFAULT_VOTING_DELAY,
            voting_period: DEFAULT_VOTING_PERIOD,
            timelock_delay: DEFAULT_TIMELOCK_DELAY,
            quorum_percent: DEFAULT_QUORUM_PERCENT,
            proposal_threshold: DEFAULT_PROPOSAL_THRESHOLD,
        }
    }
}

/// A governance proposal with its creation-time voting-power snapshot.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequentially assigned identifier.
    pub id: ProposalId,
    pub proposer: Address,
    pub description: String,
    /// Voting opens at this timestamp (creation time + voting delay).
    pub voting_start: Timestamp,
    /// Voting closes at this timestamp (exclusive).
    pub voting_end: Timestamp,
    /// Delegated voting weight per account, captured at creation.
    /// Later balance or delegation changes do not affect it.
    pub snapshot: BTreeMap<Address, Amount>,
    /// Sum of all snapshot weights.
    pub snapshot_total: Amount,
    /// Minimum cast weight for the proposal to be able to succeed.
    pub quorum: Amount,
    pub tally: VoteTally,
    /// Recorded choices, one per voter.
    pub votes: BTreeMap<Address, VoteChoice>,
    pub queued: bool,
    pub executed: bool,
    pub canceled: bool,
    /// Earliest execution time, set when the proposal is queued.
    pub eta: Option<Timestamp>,
}

impl Proposal {
    /// The voting weight of an account under this proposal's snapshot.
    pub fn weight_of(&self, voter: &Address) -> Amount {
        self.snapshot.get(voter).copied().unwrap_or(0)
    }

    /// True once the tally meets quorum with strictly more for than against.
    pub fn tally_passed(&self) -> bool {
        self.tally.cast_total() >= self.quorum && self.tally.for_votes > self.tally.against_votes
    }

    /// The proposal's state as observed at `now`.
    pub fn state(&self, now: Timestamp) -> ProposalState {
        if self.canceled {
            return ProposalState::Canceled;
        }
        if self.executed {
            return ProposalState::Executed;
        }
        if self.queued {
            return ProposalState::Queued;
        }
        if now < self.voting_start {
            return ProposalState::Pending;
        }
        if now < self.voting_end {
            return ProposalState::Active;
        }
        if self.tally_passed() {
            ProposalState::Succeeded
        } else {
            ProposalState::Defeated
        }
    }
}
