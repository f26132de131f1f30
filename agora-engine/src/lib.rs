//! Deterministic execution engine for the Agora ledger.
//!
//! Implements sequential transition application over accounts, storage
//! slots, the token ledger, the NFT registry, crowdfunding campaigns,
//! and snapshot-based governance, with an ordered event log.

pub mod campaign;
pub mod engine;
pub mod events;
pub mod governance;
pub mod ledger;
pub mod nft;
pub mod slots;
pub mod state;
