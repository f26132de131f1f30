use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::account::Account;
use agora_types::error::TransitionError;
use agora_types::primitives::{Address, Amount, SlotKey};
use agora_types::roles::RoleSet;

/// The ledger portion of engine state: accounts, storage slots,
/// allowances, delegation, and the running total supply. All maps are
/// ordered so the borsh encoding is canonical.
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
pub struct LedgerState {
    /// Accounts keyed by address. Created on first write, never removed.
    pub accounts: BTreeMap<Address, Account>,
    /// Storage slots keyed by (owner, slot key).
    pub slots: BTreeMap<(Address, SlotKey), Vec<u8>>,
    /// Spending allowances keyed by (owner, spender). Zeroed entries are
    /// removed.
    pub allowances: BTreeMap<(Address, Address), Amount>,
    /// Vote delegation. Absent entry means the account delegates to itself.
    pub delegates: BTreeMap<Address, Address>,
    /// Sum of all account balances at all times.
    pub total_supply: Amount,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an address (zero for untouched accounts).
    pub fn balance(&self, address: &Address) -> Amount {
        self.accounts.get(address).map(|a| a.balance).unwrap_or(0)
    }

    /// Get the current nonce of an address.
    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or(0)
    }

    /// Get the roles held by an address.
    pub fn roles(&self, address: &Address) -> RoleSet {
        self.accounts
            .get(address)
            .map(|a| a.roles)
            .unwrap_or_default()
    }

    pub fn has_role(&self, address: &Address, roles: RoleSet) -> bool {
        self.roles(address).contains(roles)
    }

    /// Mutable access to an account, creating it on first reference.
    pub fn account_mut(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_default()
    }

    /// Credit an address. Total supply is unchanged; this moves existing
    /// supply, so callers pair it with a debit or a supply adjustment.
    pub fn credit(&mut self, address: Address, amount: Amount) -> Result<(), TransitionError> {
        self.account_mut(address).credit(amount)
    }

    /// Debit an address. Returns false if the balance is insufficient.
    pub fn debit(&mut self, address: &Address, amount: Amount) -> bool {
        match self.accounts.get_mut(address) {
            Some(account) => account.debit(amount),
            None => amount == 0,
        }
    }

    /// The allowance granted by `owner` to `spender`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite an allowance. Zero removes the entry.
    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Reduce an allowance after a spend. The caller has already checked
    /// that the allowance covers `amount`.
    pub fn consume_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let remaining = self.allowance(owner, spender).saturating_sub(amount);
        self.set_allowance(*owner, *spender, remaining);
    }

    /// The delegate of an address (itself unless redirected).
    pub fn delegate_of(&self, address: &Address) -> Address {
        self.delegates.get(address).copied().unwrap_or(*address)
    }

    /// Point an address's voting weight at a delegate. Returns the
    /// previous delegate. Delegating to yourself clears the entry.
    pub fn set_delegate(&mut self, delegator: Address, delegate: Address) -> Address {
        let previous = self.delegate_of(&delegator);
        if delegate == delegator {
            self.delegates.remove(&delegator);
        } else {
            self.delegates.insert(delegator, delegate);
        }
        previous
    }

    /// Voting weight per delegate: every account's balance counted toward
    /// its delegate. This is the map proposals snapshot at creation.
    pub fn voting_weights(&self) -> BTreeMap<Address, Amount> {
        let mut weights: BTreeMap<Address, Amount> = BTreeMap::new();
        for (address, account) in &self.accounts {
            if account.balance == 0 {
                continue;
            }
            let delegate = self.delegate_of(address);
            let entry = weights.entry(delegate).or_insert(0);
            *entry = entry.saturating_add(account.balance);
        }
        weights
    }

    /// Read a storage slot.
    pub fn slot(&self, account: &Address, key: &SlotKey) -> Option<&Vec<u8>> {
        self.slots.get(&(*account, *key))
    }

    /// Write a storage slot, returning the previous value.
    pub fn set_slot(&mut self, account: Address, key: SlotKey, value: Vec<u8>) -> Option<Vec<u8>> {
        self.slots.insert((account, key), value)
    }

    /// Sum of all account balances. Equals `total_supply` whenever the
    /// ledger invariant holds.
    pub fn balance_sum(&self) -> Amount {
        self.accounts
            .values()
            .fold(0, |sum: Amount, a| sum.saturating_add(a.balance))
    }
}
