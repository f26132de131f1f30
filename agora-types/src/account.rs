use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::primitives::Amount;
use crate::roles::RoleSet;

/// Per-address account state. Accounts are created on first reference and
/// never removed; a drained account simply holds a zero balance.
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
pub struct Account {
    /// Native token balance in base units.
    pub balance: Amount,
    /// Replay-protection nonce, incremented per accepted transition.
    pub nonce: u64,
    /// Roles held by this account.
    pub roles: RoleSet,
}

impl Account {
    /// Create a fresh account with no balance, nonce zero, no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the account holds at least the specified balance.
    pub fn has_balance(&self, amount: Amount) -> bool {
        self.balance >= amount
    }

    /// Credit tokens to this account. Returns error on overflow.
    pub fn credit(&mut self, amount: Amount) -> Result<(), TransitionError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TransitionError::BalanceOverflow)?;
        Ok(())
    }

    /// Debit tokens from this account. Returns false if insufficient balance.
    pub fn debit(&mut self, amount: Amount) -> bool {
        if self.balance >= amount {
            self.balance -= amount;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let mut account = Account::new();
        account.credit(100).unwrap();
        assert_eq!(account.balance, 100);
        assert!(account.has_balance(100));
        assert!(!account.has_balance(101));

        assert!(account.debit(40));
        assert_eq!(account.balance, 60);
        assert!(!account.debit(61));
        assert_eq!(account.balance, 60);
    }

    #[test]
    fn test_credit_overflow() {
        let mut account = Account::new();
        account.credit(Amount::MAX).unwrap();
        assert_eq!(
            account.credit(1),
            Err(TransitionError::BalanceOverflow)
        );
        assert_eq!(account.balance, Amount::MAX);
    }

    #[test]
    fn test_debit_to_zero_keeps_account() {
        let mut account = Account::new();
        account.credit(5).unwrap();
        assert!(account.debit(5));
        assert_eq!(account.balance, 0);
        assert_eq!(account.nonce, 0);
    }
}
