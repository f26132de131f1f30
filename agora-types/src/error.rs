use thiserror::Error;

use crate::governance::ProposalState;

/// All rejection reasons a transition can produce. Rejections are total:
/// a failed transition leaves no state change and emits no events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    // ─── Ledger Errors ───────────────────────────────────────────────────────
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: u128, required: u128 },

    #[error("invalid amount: amount must be positive")]
    InvalidAmount,

    #[error("invalid recipient: the zero address cannot receive")]
    InvalidRecipient,

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("supply cap exceeded: {requested} > {cap}")]
    SupplyCapExceeded { requested: u128, cap: u128 },

    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    // ─── Authorization Errors ────────────────────────────────────────────────
    #[error("unauthorized: requires {required}")]
    Unauthorized { required: String },

    // ─── Payload Errors ──────────────────────────────────────────────────────
    #[error("value too large: {size} > {max}")]
    ValueTooLarge { size: usize, max: usize },

    // ─── Campaign Errors ─────────────────────────────────────────────────────
    #[error("campaign expired: deadline {deadline}, now {now}")]
    CampaignExpired { deadline: u64, now: u64 },

    #[error("campaign already finalized")]
    CampaignFinalized,

    #[error("campaign not yet expired: deadline {deadline}, now {now}")]
    NotYetExpired { deadline: u64, now: u64 },

    #[error("nothing to claim")]
    NothingToClaim,

    // ─── Governance Errors ───────────────────────────────────────────────────
    #[error("already voted on this proposal")]
    AlreadyVoted,

    #[error("voting is closed")]
    VotingClosed,

    #[error("timelock not elapsed: eta {eta}, now {now}")]
    TimelockNotElapsed { eta: u64, now: u64 },

    #[error("proposal already executed")]
    AlreadyExecuted,

    #[error("invalid proposal state: {state:?}")]
    InvalidProposalState { state: ProposalState },

    // ─── Lookup Errors ───────────────────────────────────────────────────────
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u64 },
}
