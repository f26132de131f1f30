use crate::primitives::Amount;

// ─── Token Parameters ────────────────────────────────────────────────────────

/// Number of decimal places for the native token.
pub const TOKEN_DECIMALS: u32 = 9;

/// One full token in base units (10^9).
pub const ONE_TOKEN: Amount = 1_000_000_000;

/// Maximum total supply the engine will mint (in base units).
pub const MAX_SUPPLY: Amount = 1_000_000_000 * ONE_TOKEN; // 1 billion tokens

// ─── Transition Limits ───────────────────────────────────────────────────────

/// Maximum size of a storage slot value in bytes.
pub const MAX_SLOT_VALUE_SIZE: usize = 4_096;

/// Maximum length of an NFT metadata URI in bytes.
pub const MAX_URI_LENGTH: usize = 256;

/// Maximum length of a proposal description in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 4_096;

// ─── Governance Defaults ─────────────────────────────────────────────────────

/// Default delay before voting opens (seconds).
pub const DEFAULT_VOTING_DELAY: u64 = 3_600; // 1 hour

/// Default voting window length (seconds).
pub const DEFAULT_VOTING_PERIOD: u64 = 259_200; // 3 days

/// Default timelock between queueing and execution (seconds).
pub const DEFAULT_TIMELOCK_DELAY: u64 = 172_800; // 2 days

/// Default quorum as a percentage of snapshot weight.
pub const DEFAULT_QUORUM_PERCENT: u8 = 4;

/// Default minimum weight to create a proposal (0 = anyone).
pub const DEFAULT_PROPOSAL_THRESHOLD: Amount = 0;
