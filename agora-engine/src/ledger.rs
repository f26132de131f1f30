use agora_types::constants::MAX_SUPPLY;
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::primitives::{Address, Amount, ZERO_ADDRESS};
use agora_types::transition::MintDirection;

use crate::state::LedgerState;

/// Move tokens between accounts. When the caller is not the sender, an
/// allowance from the sender to the caller is consumed. Validation runs
/// before any mutation so a rejection leaves the state untouched.
pub fn apply_transfer(
    state: &mut LedgerState,
    caller: &Address,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<EventKind, TransitionError> {
    if amount == 0 {
        return Err(TransitionError::InvalidAmount);
    }
    if *to == ZERO_ADDRESS {
        return Err(TransitionError::InvalidRecipient);
    }

    if caller != from {
        let allowance = state.allowance(from, caller);
        if allowance < amount {
            return Err(TransitionError::InsufficientAllowance {
                available: allowance,
                required: amount,
            });
        }
    }

    let available = state.balance(from);
    if available < amount {
        return Err(TransitionError::InsufficientBalance {
            available,
            required: amount,
        });
    }

    if caller != from {
        state.consume_allowance(from, caller, amount);
    }
    state.debit(from, amount);
    state.credit(*to, amount)?;

    Ok(EventKind::Transfer {
        from: *from,
        to: *to,
        amount,
    })
}

/// Overwrite the caller's allowance for a spender.
pub fn apply_approve(
    state: &mut LedgerState,
    owner: &Address,
    spender: &Address,
    amount: Amount,
) -> Result<EventKind, TransitionError> {
    if *spender == ZERO_ADDRESS {
        return Err(TransitionError::InvalidRecipient);
    }
    state.set_allowance(*owner, *spender, amount);
    Ok(EventKind::Approval {
        owner: *owner,
        spender: *spender,
        amount,
    })
}

/// Adjust total supply and one balance in lockstep. The caller's minter
/// role has already been checked by the dispatcher.
pub fn apply_mint_burn(
    state: &mut LedgerState,
    account: &Address,
    amount: Amount,
    direction: MintDirection,
) -> Result<EventKind, TransitionError> {
    if amount == 0 {
        return Err(TransitionError::InvalidAmount);
    }

    match direction {
        MintDirection::Mint => {
            if *account == ZERO_ADDRESS {
                return Err(TransitionError::InvalidRecipient);
            }
            let new_supply = state
                .total_supply
                .checked_add(amount)
                .ok_or(TransitionError::BalanceOverflow)?;
            if new_supply > MAX_SUPPLY {
                return Err(TransitionError::SupplyCapExceeded {
                    requested: new_supply,
                    cap: MAX_SUPPLY,
                });
            }
            state.credit(*account, amount)?;
            state.total_supply = new_supply;
            Ok(EventKind::Minted {
                account: *account,
                amount,
                total_supply: state.total_supply,
            })
        }
        MintDirection::Burn => {
            let available = state.balance(account);
            if available < amount {
                return Err(TransitionError::InsufficientBalance {
                    available,
                    required: amount,
                });
            }
            state.debit(account, amount);
            state.total_supply -= amount;
            Ok(EventKind::Burned {
                account: *account,
                amount,
                total_supply: state.total_supply,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    /// Helper: a ledger seeded by minting directly, supply kept in sync.
    fn seeded(entries: &[(Address, Amount)]) -> LedgerState {
        let mut state = LedgerState::new();
        for (address, amount) in entries {
            state.credit(*address, *amount).unwrap();
            state.total_supply += amount;
        }
        state
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut state = seeded(&[(addr(1), 100)]);
        let event = apply_transfer(&mut state, &addr(1), &addr(1), &addr(2), 60).unwrap();

        assert_eq!(state.balance(&addr(1)), 40);
        assert_eq!(state.balance(&addr(2)), 60);
        assert_eq!(
            event,
            EventKind::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 60,
            }
        );
    }

    #[test]
    fn test_transfer_insufficient_balance_unchanged() {
        let mut state = seeded(&[(addr(1), 50)]);
        let result = apply_transfer(&mut state, &addr(1), &addr(1), &addr(2), 60);
        assert_eq!(
            result,
            Err(TransitionError::InsufficientBalance {
                available: 50,
                required: 60,
            })
        );
        assert_eq!(state.balance(&addr(1)), 50);
        assert_eq!(state.balance(&addr(2)), 0);
    }

    #[test]
    fn test_transfer_zero_amount_rejected() {
        let mut state = seeded(&[(addr(1), 50)]);
        assert_eq!(
            apply_transfer(&mut state, &addr(1), &addr(1), &addr(2), 0),
            Err(TransitionError::InvalidAmount)
        );
    }

    #[test]
    fn test_transfer_zero_recipient_rejected() {
        let mut state = seeded(&[(addr(1), 50)]);
        assert_eq!(
            apply_transfer(&mut state, &addr(1), &addr(1), &ZERO_ADDRESS, 10),
            Err(TransitionError::InvalidRecipient)
        );
    }

    #[test]
    fn test_transfer_on_behalf_consumes_allowance() {
        let mut state = seeded(&[(addr(1), 100)]);
        apply_approve(&mut state, &addr(1), &addr(3), 80).unwrap();

        apply_transfer(&mut state, &addr(3), &addr(1), &addr(2), 50).unwrap();
        assert_eq!(state.balance(&addr(1)), 50);
        assert_eq!(state.balance(&addr(2)), 50);
        assert_eq!(state.allowance(&addr(1), &addr(3)), 30);
    }

    #[test]
    fn test_transfer_on_behalf_without_allowance() {
        let mut state = seeded(&[(addr(1), 100)]);
        let result = apply_transfer(&mut state, &addr(3), &addr(1), &addr(2), 50);
        assert_eq!(
            result,
            Err(TransitionError::InsufficientAllowance {
                available: 0,
                required: 50,
            })
        );
        assert_eq!(state.balance(&addr(1)), 100);
    }

    #[test]
    fn test_transfer_on_behalf_allowance_checked_before_balance() {
        // A short allowance rejects even when the balance would cover it,
        // and a short balance leaves the allowance untouched.
        let mut state = seeded(&[(addr(1), 100)]);
        apply_approve(&mut state, &addr(1), &addr(3), 200).unwrap();
        let result = apply_transfer(&mut state, &addr(3), &addr(1), &addr(2), 150);
        assert_eq!(
            result,
            Err(TransitionError::InsufficientBalance {
                available: 100,
                required: 150,
            })
        );
        assert_eq!(state.allowance(&addr(1), &addr(3)), 200);
    }

    #[test]
    fn test_approve_overwrites() {
        let mut state = LedgerState::new();
        apply_approve(&mut state, &addr(1), &addr(2), 100).unwrap();
        apply_approve(&mut state, &addr(1), &addr(2), 40).unwrap();
        assert_eq!(state.allowance(&addr(1), &addr(2)), 40);
    }

    #[test]
    fn test_approve_zero_spender_rejected() {
        let mut state = LedgerState::new();
        assert_eq!(
            apply_approve(&mut state, &addr(1), &ZERO_ADDRESS, 100),
            Err(TransitionError::InvalidRecipient)
        );
    }

    #[test]
    fn test_mint_raises_supply_and_balance() {
        let mut state = LedgerState::new();
        let event =
            apply_mint_burn(&mut state, &addr(1), 1_000, MintDirection::Mint).unwrap();
        assert_eq!(state.balance(&addr(1)), 1_000);
        assert_eq!(state.total_supply, 1_000);
        assert_eq!(
            event,
            EventKind::Minted {
                account: addr(1),
                amount: 1_000,
                total_supply: 1_000,
            }
        );
    }

    #[test]
    fn test_burn_lowers_supply_and_balance() {
        let mut state = seeded(&[(addr(1), 1_000)]);
        apply_mint_burn(&mut state, &addr(1), 400, MintDirection::Burn).unwrap();
        assert_eq!(state.balance(&addr(1)), 600);
        assert_eq!(state.total_supply, 600);
    }

    #[test]
    fn test_burn_more_than_balance_rejected() {
        let mut state = seeded(&[(addr(1), 100)]);
        let result = apply_mint_burn(&mut state, &addr(1), 200, MintDirection::Burn);
        assert_eq!(
            result,
            Err(TransitionError::InsufficientBalance {
                available: 100,
                required: 200,
            })
        );
        assert_eq!(state.total_supply, 100);
    }

    #[test]
    fn test_mint_beyond_cap_rejected() {
        let mut state = LedgerState::new();
        apply_mint_burn(&mut state, &addr(1), MAX_SUPPLY, MintDirection::Mint).unwrap();
        let result = apply_mint_burn(&mut state, &addr(1), 1, MintDirection::Mint);
        assert!(matches!(
            result,
            Err(TransitionError::SupplyCapExceeded { .. })
        ));
        assert_eq!(state.total_supply, MAX_SUPPLY);
    }

    #[test]
    fn test_mint_to_zero_address_rejected() {
        let mut state = LedgerState::new();
        assert_eq!(
            apply_mint_burn(&mut state, &ZERO_ADDRESS, 10, MintDirection::Mint),
            Err(TransitionError::InvalidRecipient)
        );
    }

    #[test]
    fn test_supply_tracks_balance_sum() {
        let mut state = LedgerState::new();
        apply_mint_burn(&mut state, &addr(1), 500, MintDirection::Mint).unwrap();
        apply_transfer(&mut state, &addr(1), &addr(1), &addr(2), 200).unwrap();
        apply_mint_burn(&mut state, &addr(2), 50, MintDirection::Burn).unwrap();
        assert_eq!(state.balance_sum(), state.total_supply);
        assert_eq!(state.total_supply, 450);
    }
}
