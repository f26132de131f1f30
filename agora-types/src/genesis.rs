use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::governance::GovernanceParams;
use crate::primitives::*;
use crate::roles::RoleSet;

/// Configuration applied once to an empty engine before any transition.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Chain identifier.
    pub chain_id: String,
    /// Genesis timestamp; the engine clock starts here.
    pub timestamp: Timestamp,
    /// Initial token allocations. Their sum is the initial total supply.
    pub allocations: Vec<GenesisAllocation>,
    /// Initial role grants.
    pub roles: Vec<GenesisRoleGrant>,
    /// Governance parameters.
    pub governance: GovernanceParams,
}

/// An initial token allocation.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Recipient address.
    pub address: Address,
    /// Amount to allocate.
    pub amount: Amount,
}

/// An initial role grant.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct GenesisRoleGrant {
    /// Grantee address.
    pub address: Address,
    /// Roles to grant.
    pub roles: RoleSet,
}

impl GenesisConfig {
    /// Total supply implied by the allocations.
    pub fn total_allocation(&self) -> Amount {
        self.allocations
            .iter()
            .fold(0, |sum: Amount, a| sum.saturating_add(a.amount))
    }
}
