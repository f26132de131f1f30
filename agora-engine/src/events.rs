use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::event::{EventKind, EventRecord};
use agora_types::primitives::{campaign_escrow_address, Address, Amount, Sequence};

/// The ordered event log. Records are appended in (sequence, index) order
/// and never mutated.
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
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key and store the events of one accepted transition. Returns the
    /// stored records for the receipt.
    pub fn append(&mut self, sequence: Sequence, kinds: Vec<EventKind>) -> Vec<EventRecord> {
        let records: Vec<EventRecord> = kinds
            .into_iter()
            .enumerate()
            .map(|(index, kind)| EventRecord {
                sequence,
                index: index as u32,
                kind,
            })
            .collect();
        self.records.extend(records.iter().cloned());
        records
    }

    pub fn all(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with sequence >= `from`, relying on the append order.
    pub fn from_sequence(&self, from: Sequence) -> &[EventRecord] {
        let start = self.records.partition_point(|r| r.sequence < from);
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-account totals derived from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowTotals {
    /// Tokens received through any balance-moving event.
    pub received: Amount,
    /// Tokens sent through any balance-moving event.
    pub sent: Amount,
}

/// Replay the log into per-account transfer totals. Every event that
/// moves a balance contributes, including escrow flows, so for any
/// account: genesis allocation + received - sent = current balance.
pub fn transfer_totals(records: &[EventRecord]) -> BTreeMap<Address, FlowTotals> {
    let mut totals: BTreeMap<Address, FlowTotals> = BTreeMap::new();
    let mut add = |address: Address, received: Amount, sent: Amount| {
        let entry = totals.entry(address).or_default();
        entry.received = entry.received.saturating_add(received);
        entry.sent = entry.sent.saturating_add(sent);
    };

    for record in records {
        match &record.kind {
            EventKind::Transfer { from, to, amount } => {
                add(*from, 0, *amount);
                add(*to, *amount, 0);
            }
            EventKind::Minted { account, amount, .. } => {
                add(*account, *amount, 0);
            }
            EventKind::Burned { account, amount, .. } => {
                add(*account, 0, *amount);
            }
            EventKind::Pledged {
                campaign_id,
                contributor,
                amount,
                ..
            } => {
                add(*contributor, 0, *amount);
                add(campaign_escrow_address(*campaign_id), *amount, 0);
            }
            EventKind::CampaignFundsClaimed {
                campaign_id,
                owner,
                amount,
            } => {
                add(campaign_escrow_address(*campaign_id), 0, *amount);
                add(*owner, *amount, 0);
            }
            EventKind::Refunded {
                campaign_id,
                contributor,
                amount,
            } => {
                add(campaign_escrow_address(*campaign_id), 0, *amount);
                add(*contributor, *amount, 0);
            }
            _ => {}
        }
    }

    totals
}
