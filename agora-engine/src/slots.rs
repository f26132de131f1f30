use agora_types::constants::MAX_SLOT_VALUE_SIZE;
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::primitives::{Address, SlotKey};
use agora_types::roles::RoleSet;

use crate::state::LedgerState;

/// Write a storage slot of `account`. Only the account itself or a
/// slot-admin may write; the previous value is reported in the event.
pub fn apply_set_storage(
    state: &mut LedgerState,
    caller: &Address,
    account: &Address,
    key: SlotKey,
    value: Vec<u8>,
) -> Result<EventKind, TransitionError> {
    if value.len() > MAX_SLOT_VALUE_SIZE {
        return Err(TransitionError::ValueTooLarge {
            size: value.len(),
            max: MAX_SLOT_VALUE_SIZE,
        });
    }
    if caller != account && !state.has_role(caller, RoleSet::SLOT_ADMIN) {
        return Err(TransitionError::Unauthorized {
            required: "slot owner or slot-admin role".to_string(),
        });
    }

    let previous = state.set_slot(*account, key, value.clone());
    Ok(EventKind::StorageChanged {
        account: *account,
        key,
        previous,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    #[test]
    fn test_owner_writes_own_slot() {
        let mut state = LedgerState::new();
        let key = [1u8; 32];
        let event =
            apply_set_storage(&mut state, &addr(1), &addr(1), key, vec![7, 7]).unwrap();
        assert_eq!(state.slot(&addr(1), &key), Some(&vec![7, 7]));
        assert_eq!(
            event,
            EventKind::StorageChanged {
                account: addr(1),
                key,
                previous: None,
                value: vec![7, 7],
            }
        );
    }

    #[test]
    fn test_overwrite_reports_previous() {
        let mut state = LedgerState::new();
        let key = [1u8; 32];
        apply_set_storage(&mut state, &addr(1), &addr(1), key, vec![1]).unwrap();
        let event = apply_set_storage(&mut state, &addr(1), &addr(1), key, vec![2]).unwrap();
        assert_eq!(
            event,
            EventKind::StorageChanged {
                account: addr(1),
                key,
                previous: Some(vec![1]),
                value: vec![2],
            }
        );
    }

    #[test]
    fn test_foreign_write_requires_slot_admin() {
        let mut state = LedgerState::new();
        let key = [1u8; 32];
        let result = apply_set_storage(&mut state, &addr(2), &addr(1), key, vec![1]);
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
        assert_eq!(state.slot(&addr(1), &key), None);

        state.account_mut(addr(2)).roles.grant(RoleSet::SLOT_ADMIN);
        apply_set_storage(&mut state, &addr(2), &addr(1), key, vec![1]).unwrap();
        assert_eq!(state.slot(&addr(1), &key), Some(&vec![1]));
    }

    #[test]
    fn test_oversized_value_rejected() {
        let mut state = LedgerState::new();
        let value = vec![0u8; MAX_SLOT_VALUE_SIZE + 1];
        let result = apply_set_storage(&mut state, &addr(1), &addr(1), [1u8; 32], value);
        assert!(matches!(result, Err(TransitionError::ValueTooLarge { .. })));
    }

    #[test]
    fn test_empty_value_allowed() {
        let mut state = LedgerState::new();
        let key = [1u8; 32];
        apply_set_storage(&mut state, &addr(1), &addr(1), key, vec![1]).unwrap();
        apply_set_storage(&mut state, &addr(1), &addr(1), key, vec![]).unwrap();
        assert_eq!(state.slot(&addr(1), &key), Some(&vec![]));
    }
}
