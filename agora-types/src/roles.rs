use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A set of account roles packed into a bitmask.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct RoleSet(pub u8);

impl RoleSet {
    /// May grant and revoke roles and cancel any proposal.
    pub const ADMIN: RoleSet = RoleSet(1 << 0);
    /// May mint and burn token supply and mint NFTs.
    pub const MINTER: RoleSet = RoleSet(1 << 1);
    /// May write storage slots of any account.
    pub const SLOT_ADMIN: RoleSet = RoleSet(1 << 2);

    /// The empty role set.
    pub fn empty() -> Self {
        RoleSet(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if every role in `roles` is present in this set.
    pub fn contains(&self, roles: RoleSet) -> bool {
        self.0 & roles.0 == roles.0
    }

    pub fn grant(&mut self, roles: RoleSet) {
        self.0 |= roles.0;
    }

    pub fn revoke(&mut self, roles: RoleSet) {
        self.0 &= !roles.0;
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for (bit, name) in [
            (RoleSet::ADMIN, "admin"),
            (RoleSet::MINTER, "minter"),
            (RoleSet::SLOT_ADMIN, "slot-admin"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let mut roles = RoleSet::empty();
        assert!(roles.is_empty());

        roles.grant(RoleSet::MINTER);
        assert!(roles.contains(RoleSet::MINTER));
        assert!(!roles.contains(RoleSet::ADMIN));

        roles.grant(RoleSet::ADMIN);
        assert!(roles.contains(RoleSet::ADMIN));
        assert!(roles.contains(RoleSet::MINTER));

        roles.revoke(RoleSet::MINTER);
        assert!(!roles.contains(RoleSet::MINTER));
        assert!(roles.contains(RoleSet::ADMIN));
    }

    #[test]
    fn test_contains_requires_all_bits() {
        let mut roles = RoleSet::empty();
        roles.grant(RoleSet::ADMIN);
        let both = RoleSet(RoleSet::ADMIN.0 | RoleSet::MINTER.0);
        assert!(!roles.contains(both));
        roles.grant(RoleSet::MINTER);
        assert!(roles.contains(both));
    }

    #[test]
    fn test_display() {
        assert_eq!(RoleSet::empty().to_string(), "none");
        assert_eq!(RoleSet::ADMIN.to_string(), "admin");
        let mut roles = RoleSet::ADMIN;
        roles.grant(RoleSet::SLOT_ADMIN);
        assert_eq!(roles.to_string(), "admin|slot-admin");
    }
}
