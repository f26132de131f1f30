use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use agora_types::constants::MAX_SUPPLY;
use agora_types::error::TransitionError;
use agora_types::event::EventKind;
use agora_types::genesis::GenesisConfig;
use agora_types::governance::GovernanceParams;
use agora_types::primitives::{Address, Hash, Sequence, Timestamp, ZERO_ADDRESS};
use agora_types::roles::RoleSet;
use agora_types::transition::{Receipt, Transition, TransitionOp};

use crate::campaign::CampaignBook;
use crate::events::EventLog;
use crate::governance::GovernanceBook;
use crate::ledger;
use crate::nft::NftRegistry;
use crate::slots;
use crate::state::LedgerState;

/// The top-level execution engine: one authoritative state, transitions
/// applied strictly one at a time. A transition either fully applies,
/// advancing the sequence number, the clock, and the caller's nonce, or
/// fully rejects, mutating nothing.
#[derive(Debug, Clone)]
pub struct Engine {
    chain_id: String,
    /// Sequence number of the last accepted transition. Zero before any.
    sequence: Sequence,
    /// High-water mark over accepted transition timestamps.
    clock: Timestamp,
    ledger: LedgerState,
    campaigns: CampaignBook,
    nfts: NftRegistry,
    governance: GovernanceBook,
    events: EventLog,
}

/// A complete serializable image of engine state, for persistence and
/// transport. Restoring a snapshot yields an engine that continues
/// exactly where the original left off.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct EngineSnapshot {
    pub chain_id: String,
    pub sequence: Sequence,
    pub clock: Timestamp,
    pub ledger: LedgerState,
    pub campaigns: CampaignBook,
    pub nfts: NftRegistry,
    pub governance: GovernanceBook,
    pub events: EventLog,
}

impl Engine {
    /// Create an empty engine with no balances and no roles.
    pub fn new(chain_id: impl Into<String>, params: GovernanceParams) -> Self {
        Self {
            chain_id: chain_id.into(),
            sequence: 0,
            clock: 0,
            ledger: LedgerState::new(),
            campaigns: CampaignBook::new(),
            nfts: NftRegistry::new(),
            governance: GovernanceBook::new(params),
            events: EventLog::new(),
        }
    }

    /// Create an engine seeded from a genesis configuration: initial
    /// balances become the total supply, role grants take effect, and
    /// the clock starts at the genesis timestamp.
    pub fn from_genesis(genesis: &GenesisConfig) -> Result<Self, TransitionError> {
        let mut engine = Engine::new(genesis.chain_id.clone(), genesis.governance.clone());
        engine.clock = genesis.timestamp;

        let mut total: u128 = 0;
        for allocation in &genesis.allocations {
            if allocation.address == ZERO_ADDRESS {
                return Err(TransitionError::InvalidRecipient);
            }
            total = total
                .checked_add(allocation.amount)
                .ok_or(TransitionError::BalanceOverflow)?;
        }
        if total > MAX_SUPPLY {
            return Err(TransitionError::SupplyCapExceeded {
                requested: total,
                cap: MAX_SUPPLY,
            });
        }

        for allocation in &genesis.allocations {
            engine.ledger.credit(allocation.address, allocation.amount)?;
        }
        engine.ledger.total_supply = total;

        for grant in &genesis.roles {
            engine.ledger.account_mut(grant.address).roles.grant(grant.roles);
        }

        tracing::info!(
            chain_id = %engine.chain_id,
            accounts = genesis.allocations.len(),
            total_supply = total,
            "engine initialized from genesis"
        );
        Ok(engine)
    }

    /// Rebuild an engine from a snapshot.
    pub fn restore(snapshot: EngineSnapshot) -> Self {
        Self {
            chain_id: snapshot.chain_id,
            sequence: snapshot.sequence,
            clock: snapshot.clock,
            ledger: snapshot.ledger,
            campaigns: snapshot.campaigns,
            nfts: snapshot.nfts,
            governance: snapshot.governance,
            events: snapshot.events,
        }
    }

    /// Capture the full engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            chain_id: self.chain_id.clone(),
            sequence: self.sequence,
            clock: self.clock,
            ledger: self.ledger.clone(),
            campaigns: self.campaigns.clone(),
            nfts: self.nfts.clone(),
            governance: self.governance.clone(),
            events: self.events.clone(),
        }
    }

    /// Apply one transition. On acceptance the receipt carries the
    /// assigned sequence number, the emitted events, and any identifier
    /// a creation operation produced. On rejection nothing changes, not
    /// even the caller's nonce or the clock.
    pub fn apply(&mut self, transition: &Transition) -> Result<Receipt, TransitionError> {
        let expected = self.ledger.nonce(&transition.caller);
        if transition.nonce != expected {
            return Err(TransitionError::NonceMismatch {
                expected,
                got: transition.nonce,
            });
        }

        // The clock never moves backward: a stale caller timestamp is
        // clamped to the current clock for all time-gated checks.
        let now = self.clock.max(transition.timestamp);
        let (kinds, created_id) = self.dispatch(transition.caller, now, transition.op.clone())?;

        self.sequence += 1;
        self.clock = now;
        self.ledger.account_mut(transition.caller).nonce += 1;
        let records = self.events.append(self.sequence, kinds);

        tracing::debug!(
            sequence = self.sequence,
            op = transition.op.name(),
            caller = %hex::encode(transition.caller),
            "transition applied"
        );

        Ok(Receipt {
            sequence: self.sequence,
            events: records,
            created_id,
        })
    }

    /// Route one operation to its handler. Handlers validate fully
    /// before mutating, which is what makes rejection side-effect free.
    fn dispatch(
        &mut self,
        caller: Address,
        now: Timestamp,
        op: TransitionOp,
    ) -> Result<(Vec<EventKind>, Option<u64>), TransitionError> {
        match op {
            TransitionOp::Transfer { from, to, amount } => {
                let event = ledger::apply_transfer(&mut self.ledger, &caller, &from, &to, amount)?;
                Ok((vec![event], None))
            }

            TransitionOp::Approve { spender, amount } => {
                let event = ledger::apply_approve(&mut self.ledger, &caller, &spender, amount)?;
                Ok((vec![event], None))
            }

            TransitionOp::MintBurn {
                account,
                amount,
                direction,
            } => {
                self.require_role(&caller, RoleSet::MINTER, "minter role")?;
                let event = ledger::apply_mint_burn(&mut self.ledger, &account, amount, direction)?;
                Ok((vec![event], None))
            }

            TransitionOp::SetStorage {
                account,
                key,
                value,
            } => {
                let event = slots::apply_set_storage(&mut self.ledger, &caller, &account, key, value)?;
                Ok((vec![event], None))
            }

            TransitionOp::GrantRole { account, roles } => {
                self.require_role(&caller, RoleSet::ADMIN, "admin role")?;
                self.ledger.account_mut(account).roles.grant(roles);
                Ok((vec![EventKind::RoleGranted { account, roles }], None))
            }

            TransitionOp::RevokeRole { account, roles } => {
                self.require_role(&caller, RoleSet::ADMIN, "admin role")?;
                self.ledger.account_mut(account).roles.revoke(roles);
                Ok((vec![EventKind::RoleRevoked { account, roles }], None))
            }

            TransitionOp::CreateCampaign { target, deadline } => {
                let (id, event) = self.campaigns.create(caller, target, deadline, now)?;
                Ok((vec![event], Some(id)))
            }

            TransitionOp::Pledge {
                campaign_id,
                amount,
            } => {
                let event =
                    self.campaigns
                        .pledge(&mut self.ledger, caller, campaign_id, amount, now)?;
                Ok((vec![event], None))
            }

            TransitionOp::FinalizeCampaign { campaign_id } => {
                let event = self.campaigns.finalize(campaign_id, now)?;
                Ok((vec![event], None))
            }

            TransitionOp::ClaimCampaignFunds { campaign_id } => {
                let event = self
                    .campaigns
                    .claim_funds(&mut self.ledger, caller, campaign_id)?;
                Ok((vec![event], None))
            }

            TransitionOp::ClaimRefund { campaign_id } => {
                let event = self
                    .campaigns
                    .claim_refund(&mut self.ledger, caller, campaign_id)?;
                Ok((vec![event], None))
            }

            TransitionOp::MintNft { to, uri } => {
                self.require_role(&caller, RoleSet::MINTER, "minter role")?;
                let (id, event) = self.nfts.mint(to, uri)?;
                Ok((vec![event], Some(id)))
            }

            TransitionOp::TransferNft { token_id, to } => {
                let event = self.nfts.transfer(&caller, token_id, to)?;
                Ok((vec![event], None))
            }

            TransitionOp::BurnNft { token_id } => {
                let event = self.nfts.burn(&caller, token_id)?;
                Ok((vec![event], None))
            }

            TransitionOp::Delegate { to } => {
                let previous = self.ledger.set_delegate(caller, to);
                Ok((
                    vec![EventKind::DelegateChanged {
                        delegator: caller,
                        previous,
                        delegate: to,
                    }],
                    None,
                ))
            }

            TransitionOp::CreateProposal { description } => {
                let (id, event) =
                    self.governance
                        .create_proposal(&self.ledger, caller, description, now)?;
                Ok((vec![event], Some(id)))
            }

            TransitionOp::CastVote {
                proposal_id,
                choice,
            } => {
                let event = self.governance.cast_vote(caller, proposal_id, choice, now)?;
                Ok((vec![event], None))
            }

            TransitionOp::QueueProposal { proposal_id } => {
                let event = self.governance.queue(proposal_id, now)?;
                Ok((vec![event], None))
            }

            TransitionOp::ExecuteProposal { proposal_id } => {
                let event = self.governance.execute(proposal_id, now)?;
                Ok((vec![event], None))
            }

            TransitionOp::CancelProposal { proposal_id } => {
                let caller_is_admin = self.ledger.has_role(&caller, RoleSet::ADMIN);
                let event = self.governance.cancel(caller, caller_is_admin, proposal_id)?;
                Ok((vec![event], None))
            }
        }
    }

    fn require_role(
        &self,
        caller: &Address,
        roles: RoleSet,
        required: &str,
    ) -> Result<(), TransitionError> {
        if !self.ledger.has_role(caller, roles) {
            return Err(TransitionError::Unauthorized {
                required: required.to_string(),
            });
        }
        Ok(())
    }

    /// Hash of the persistent state. The event log is derived data and
    /// does not contribute to the root.
    pub fn state_root(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.chain_id.as_bytes());
        hasher.update(&self.sequence.to_le_bytes());
        hasher.update(&self.clock.to_le_bytes());
        let ledger =
            borsh::to_vec(&self.ledger).expect("LedgerState serialization should not fail");
        hasher.update(&ledger);
        let campaigns =
            borsh::to_vec(&self.campaigns).expect("CampaignBook serialization should not fail");
        hasher.update(&campaigns);
        let nfts = borsh::to_vec(&self.nfts).expect("NftRegistry serialization should not fail");
        hasher.update(&nfts);
        let governance =
            borsh::to_vec(&self.governance).expect("GovernanceBook serialization should not fail");
        hasher.update(&governance);
        *hasher.finalize().as_bytes()
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Sequence number of the last accepted transition.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Current engine clock.
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn campaigns(&self) -> &CampaignBook {
        &self.campaigns
    }

    pub fn nfts(&self) -> &NftRegistry {
        &self.nfts
    }

    pub fn governance(&self) -> &GovernanceBook {
        &self.governance
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::transfer_totals;
    use agora_types::campaign::CampaignStatus;
    use agora_types::genesis::{GenesisAllocation, GenesisRoleGrant};
    use agora_types::governance::{ProposalState, VoteChoice};
    use agora_types::primitives::Amount;
    use agora_types::transition::MintDirection;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    fn genesis(allocations: &[(Address, Amount)]) -> GenesisConfig {
        GenesisConfig {
            chain_id: "agora-test".to_string(),
            timestamp: 1_000,
            allocations: allocations
                .iter()
                .map(|(address, amount)| GenesisAllocation {
                    address: *address,
                    amount: *amount,
                })
                .collect(),
            roles: vec![GenesisRoleGrant {
                address: addr(1),
                roles: RoleSet(RoleSet::ADMIN.0 | RoleSet::MINTER.0),
            }],
            governance: GovernanceParams {
                voting_delay: 10,
                voting_period: 100,
                timelock_delay: 50,
                quorum_percent: 4,
                proposal_threshold: 0,
            },
        }
    }

    fn engine_with(allocations: &[(Address, Amount)]) -> Engine {
        Engine::from_genesis(&genesis(allocations)).unwrap()
    }

    /// Submit with the caller's current nonce filled in.
    fn submit(
        engine: &mut Engine,
        caller: Address,
        timestamp: Timestamp,
        op: TransitionOp,
    ) -> Result<Receipt, TransitionError> {
        let nonce = engine.ledger().nonce(&caller);
        engine.apply(&Transition {
            caller,
            nonce,
            timestamp,
            op,
        })
    }

    #[test]
    fn test_genesis_seeds_balances_roles_and_clock() {
        let engine = engine_with(&[(addr(1), 1_000), (addr(2), 500)]);
        assert_eq!(engine.ledger().balance(&addr(1)), 1_000);
        assert_eq!(engine.ledger().balance(&addr(2)), 500);
        assert_eq!(engine.ledger().total_supply, 1_500);
        assert!(engine.ledger().has_role(&addr(1), RoleSet::ADMIN));
        assert!(engine.ledger().has_role(&addr(1), RoleSet::MINTER));
        assert_eq!(engine.clock(), 1_000);
        assert_eq!(engine.sequence(), 0);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_genesis_rejects_overallocation() {
        let result = Engine::from_genesis(&genesis(&[(addr(1), MAX_SUPPLY), (addr(2), 1)]));
        assert!(matches!(
            result,
            Err(TransitionError::SupplyCapExceeded { .. })
        ));
    }

    #[test]
    fn test_genesis_rejects_zero_address_allocation() {
        let result = Engine::from_genesis(&genesis(&[(ZERO_ADDRESS, 100)]));
        assert_eq!(result.unwrap_err(), TransitionError::InvalidRecipient);
    }

    #[test]
    fn test_transfer_updates_balances_and_emits_event() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        let receipt = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 60,
            },
        )
        .unwrap();

        assert_eq!(engine.ledger().balance(&addr(1)), 40);
        assert_eq!(engine.ledger().balance(&addr(2)), 60);
        assert_eq!(receipt.sequence, 1);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(
            receipt.events[0].kind,
            EventKind::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 60,
            }
        );
    }

    #[test]
    fn test_nonce_must_match_and_increments_on_success() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        let transition = Transition {
            caller: addr(1),
            nonce: 0,
            timestamp: 2_000,
            op: TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 10,
            },
        };
        engine.apply(&transition).unwrap();

        // Replaying the same transition fails: the nonce moved on.
        assert_eq!(
            engine.apply(&transition),
            Err(TransitionError::NonceMismatch {
                expected: 1,
                got: 0
            })
        );
        assert_eq!(engine.ledger().balance(&addr(2)), 10);
    }

    #[test]
    fn test_rejection_mutates_nothing() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        let before = engine.snapshot();

        let result = submit(
            &mut engine,
            addr(1),
            9_999,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 500,
            },
        );
        assert!(matches!(
            result,
            Err(TransitionError::InsufficientBalance { .. })
        ));
        // Sequence, clock, nonce, and events are all untouched.
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        submit(
            &mut engine,
            addr(1),
            5_000,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 10,
            },
        )
        .unwrap();
        assert_eq!(engine.clock(), 5_000);

        // A stale timestamp does not rewind the clock.
        submit(
            &mut engine,
            addr(1),
            3_000,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 10,
            },
        )
        .unwrap();
        assert_eq!(engine.clock(), 5_000);
    }

    #[test]
    fn test_mint_requires_minter_role() {
        let mut engine = engine_with(&[(addr(1), 100), (addr(2), 100)]);
        let result = submit(
            &mut engine,
            addr(2),
            2_000,
            TransitionOp::MintBurn {
                account: addr(2),
                amount: 50,
                direction: MintDirection::Mint,
            },
        );
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
    }

    #[test]
    fn test_mint_and_burn_adjust_supply() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::MintBurn {
                account: addr(2),
                amount: 50,
                direction: MintDirection::Mint,
            },
        )
        .unwrap();
        assert_eq!(engine.ledger().total_supply, 150);
        assert_eq!(engine.ledger().balance(&addr(2)), 50);

        submit(
            &mut engine,
            addr(1),
            2_001,
            TransitionOp::MintBurn {
                account: addr(2),
                amount: 20,
                direction: MintDirection::Burn,
            },
        )
        .unwrap();
        assert_eq!(engine.ledger().total_supply, 130);
        assert_eq!(engine.ledger().balance(&addr(2)), 30);
        assert_eq!(engine.ledger().balance_sum(), engine.ledger().total_supply);
    }

    #[test]
    fn test_grant_and_revoke_roles() {
        let mut engine = engine_with(&[(addr(1), 100), (addr(3), 100)]);
        submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::GrantRole {
                account: addr(3),
                roles: RoleSet::MINTER,
            },
        )
        .unwrap();

        // The grantee can now mint.
        submit(
            &mut engine,
            addr(3),
            2_001,
            TransitionOp::MintBurn {
                account: addr(3),
                amount: 10,
                direction: MintDirection::Mint,
            },
        )
        .unwrap();

        submit(
            &mut engine,
            addr(1),
            2_002,
            TransitionOp::RevokeRole {
                account: addr(3),
                roles: RoleSet::MINTER,
            },
        )
        .unwrap();
        let result = submit(
            &mut engine,
            addr(3),
            2_003,
            TransitionOp::MintBurn {
                account: addr(3),
                amount: 10,
                direction: MintDirection::Mint,
            },
        );
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
    }

    #[test]
    fn test_grant_role_requires_admin() {
        let mut engine = engine_with(&[(addr(1), 100), (addr(2), 100)]);
        let result = submit(
            &mut engine,
            addr(2),
            2_000,
            TransitionOp::GrantRole {
                account: addr(2),
                roles: RoleSet::ADMIN,
            },
        );
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
    }

    #[test]
    fn test_set_storage_reports_previous_value() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        let key = [7u8; 32];
        submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::SetStorage {
                account: addr(1),
                key,
                value: b"one".to_vec(),
            },
        )
        .unwrap();
        let receipt = submit(
            &mut engine,
            addr(1),
            2_001,
            TransitionOp::SetStorage {
                account: addr(1),
                key,
                value: b"two".to_vec(),
            },
        )
        .unwrap();

        assert_eq!(
            receipt.events[0].kind,
            EventKind::StorageChanged {
                account: addr(1),
                key,
                previous: Some(b"one".to_vec()),
                value: b"two".to_vec(),
            }
        );
        assert_eq!(engine.ledger().slot(&addr(1), &key), Some(&b"two".to_vec()));
    }

    #[test]
    fn test_campaign_full_lifecycle_with_single_claim() {
        let deadline = 10_000;
        let mut engine = engine_with(&[
            (addr(1), 1_000),
            (addr(2), 400),
            (addr(3), 400),
            (addr(4), 300),
        ]);

        let receipt = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::CreateCampaign {
                target: 1_000,
                deadline,
            },
        )
        .unwrap();
        let campaign_id = receipt.created_id.unwrap();

        for contributor in [addr(2), addr(3)] {
            submit(
                &mut engine,
                contributor,
                3_000,
                TransitionOp::Pledge {
                    campaign_id,
                    amount: 400,
                },
            )
            .unwrap();
        }
        submit(
            &mut engine,
            addr(4),
            3_000,
            TransitionOp::Pledge {
                campaign_id,
                amount: 300,
            },
        )
        .unwrap();

        submit(
            &mut engine,
            addr(2),
            deadline + 1,
            TransitionOp::FinalizeCampaign { campaign_id },
        )
        .unwrap();
        let campaign = engine.campaigns().get(campaign_id).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Succeeded);
        assert_eq!(campaign.raised, 1_100);

        // The owner withdraws exactly once.
        submit(
            &mut engine,
            addr(1),
            deadline + 2,
            TransitionOp::ClaimCampaignFunds { campaign_id },
        )
        .unwrap();
        assert_eq!(engine.ledger().balance(&addr(1)), 2_100);

        let again = submit(
            &mut engine,
            addr(1),
            deadline + 3,
            TransitionOp::ClaimCampaignFunds { campaign_id },
        );
        assert_eq!(again, Err(TransitionError::NothingToClaim));
        assert_eq!(engine.ledger().balance_sum(), engine.ledger().total_supply);
    }

    #[test]
    fn test_failed_campaign_refunds_at_most_once() {
        let deadline = 10_000;
        let mut engine = engine_with(&[(addr(1), 100), (addr(2), 500)]);

        let campaign_id = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::CreateCampaign {
                target: 1_000,
                deadline,
            },
        )
        .unwrap()
        .created_id
        .unwrap();
        submit(
            &mut engine,
            addr(2),
            3_000,
            TransitionOp::Pledge {
                campaign_id,
                amount: 300,
            },
        )
        .unwrap();
        assert_eq!(engine.ledger().balance(&addr(2)), 200);

        submit(
            &mut engine,
            addr(1),
            deadline + 1,
            TransitionOp::FinalizeCampaign { campaign_id },
        )
        .unwrap();
        assert_eq!(
            engine.campaigns().get(campaign_id).unwrap().status,
            CampaignStatus::Failed
        );

        submit(
            &mut engine,
            addr(2),
            deadline + 2,
            TransitionOp::ClaimRefund { campaign_id },
        )
        .unwrap();
        assert_eq!(engine.ledger().balance(&addr(2)), 500);

        let again = submit(
            &mut engine,
            addr(2),
            deadline + 3,
            TransitionOp::ClaimRefund { campaign_id },
        );
        assert_eq!(again, Err(TransitionError::NothingToClaim));
        assert_eq!(engine.ledger().balance(&addr(2)), 500);
    }

    #[test]
    fn test_proposal_lifecycle_through_timelock() {
        let mut engine = engine_with(&[(addr(1), 60), (addr(2), 40)]);

        let proposal_id = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::CreateProposal {
                description: "raise the cap".to_string(),
            },
        )
        .unwrap()
        .created_id
        .unwrap();

        // Voting opens after the delay (2_000 + 10).
        submit(
            &mut engine,
            addr(1),
            2_020,
            TransitionOp::CastVote {
                proposal_id,
                choice: VoteChoice::For,
            },
        )
        .unwrap();
        submit(
            &mut engine,
            addr(2),
            2_020,
            TransitionOp::CastVote {
                proposal_id,
                choice: VoteChoice::Against,
            },
        )
        .unwrap();

        // Voting closes at 2_110; 60 for vs 40 against with quorum met.
        submit(
            &mut engine,
            addr(1),
            2_200,
            TransitionOp::QueueProposal { proposal_id },
        )
        .unwrap();
        let eta = engine.governance().get(proposal_id).unwrap().eta.unwrap();
        assert_eq!(eta, 2_250);

        let early = submit(
            &mut engine,
            addr(1),
            2_210,
            TransitionOp::ExecuteProposal { proposal_id },
        );
        assert_eq!(
            early,
            Err(TransitionError::TimelockNotElapsed {
                eta,
                now: 2_210
            })
        );

        submit(
            &mut engine,
            addr(1),
            eta,
            TransitionOp::ExecuteProposal { proposal_id },
        )
        .unwrap();
        assert_eq!(
            engine.governance().get(proposal_id).unwrap().state(eta),
            ProposalState::Executed
        );

        let repeat = submit(
            &mut engine,
            addr(1),
            eta + 1,
            TransitionOp::ExecuteProposal { proposal_id },
        );
        assert_eq!(repeat, Err(TransitionError::AlreadyExecuted));
    }

    #[test]
    fn test_vote_weight_is_snapshotted() {
        let mut engine = engine_with(&[(addr(1), 60), (addr(2), 40)]);
        let proposal_id = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::CreateProposal {
                description: "x".to_string(),
            },
        )
        .unwrap()
        .created_id
        .unwrap();

        // Drain the voter's balance after the snapshot was taken.
        submit(
            &mut engine,
            addr(1),
            2_001,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(3),
                amount: 60,
            },
        )
        .unwrap();

        let receipt = submit(
            &mut engine,
            addr(1),
            2_020,
            TransitionOp::CastVote {
                proposal_id,
                choice: VoteChoice::For,
            },
        )
        .unwrap();
        assert_eq!(
            receipt.events[0].kind,
            EventKind::VoteCast {
                proposal_id,
                voter: addr(1),
                choice: VoteChoice::For,
                weight: 60,
            }
        );
    }

    #[test]
    fn test_delegation_moves_snapshot_weight() {
        let mut engine = engine_with(&[(addr(1), 60), (addr(2), 40)]);
        submit(
            &mut engine,
            addr(2),
            1_500,
            TransitionOp::Delegate { to: addr(1) },
        )
        .unwrap();

        let proposal_id = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::CreateProposal {
                description: "x".to_string(),
            },
        )
        .unwrap()
        .created_id
        .unwrap();

        let proposal = engine.governance().get(proposal_id).unwrap();
        assert_eq!(proposal.weight_of(&addr(1)), 100);
        assert_eq!(proposal.weight_of(&addr(2)), 0);
    }

    #[test]
    fn test_nft_lifecycle() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        let token_id = submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::MintNft {
                to: addr(2),
                uri: "ipfs://meta/1".to_string(),
            },
        )
        .unwrap()
        .created_id
        .unwrap();
        assert_eq!(token_id, 1);

        submit(
            &mut engine,
            addr(2),
            2_001,
            TransitionOp::TransferNft {
                token_id,
                to: addr(3),
            },
        )
        .unwrap();
        assert_eq!(engine.nfts().get(token_id).unwrap().owner, addr(3));

        submit(
            &mut engine,
            addr(3),
            2_002,
            TransitionOp::BurnNft { token_id },
        )
        .unwrap();
        assert!(engine.nfts().get(token_id).is_none());
    }

    #[test]
    fn test_event_log_keys_are_strictly_ordered() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        for i in 0..3u64 {
            submit(
                &mut engine,
                addr(1),
                2_000 + i,
                TransitionOp::Transfer {
                    from: addr(1),
                    to: addr(2),
                    amount: 1,
                },
            )
            .unwrap();
        }

        let records = engine.events().all();
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, i as u64 + 1);
            assert_eq!(record.index, 0);
        }
        assert_eq!(engine.events().from_sequence(3).len(), 1);
    }

    #[test]
    fn test_transfer_totals_replay_matches_balances() {
        let mut engine = engine_with(&[(addr(1), 1_000), (addr(2), 500)]);
        submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 250,
            },
        )
        .unwrap();
        let campaign_id = submit(
            &mut engine,
            addr(2),
            2_001,
            TransitionOp::CreateCampaign {
                target: 100,
                deadline: 9_000,
            },
        )
        .unwrap()
        .created_id
        .unwrap();
        submit(
            &mut engine,
            addr(2),
            2_002,
            TransitionOp::Pledge {
                campaign_id,
                amount: 100,
            },
        )
        .unwrap();

        let totals = transfer_totals(engine.events().all());
        // addr(1): 1000 genesis - 250 sent.
        let t1 = totals[&addr(1)];
        assert_eq!(1_000 + t1.received - t1.sent, engine.ledger().balance(&addr(1)));
        // addr(2): 500 genesis + 250 received - 100 pledged.
        let t2 = totals[&addr(2)];
        assert_eq!(500 + t2.received - t2.sent, engine.ledger().balance(&addr(2)));
    }

    #[test]
    fn test_state_root_is_deterministic() {
        let mut a = engine_with(&[(addr(1), 100)]);
        let mut b = engine_with(&[(addr(1), 100)]);
        assert_eq!(a.state_root(), b.state_root());

        let op = TransitionOp::Transfer {
            from: addr(1),
            to: addr(2),
            amount: 10,
        };
        submit(&mut a, addr(1), 2_000, op.clone()).unwrap();
        assert_ne!(a.state_root(), b.state_root());
        submit(&mut b, addr(1), 2_000, op).unwrap();
        assert_eq!(a.state_root(), b.state_root());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut engine = engine_with(&[(addr(1), 100)]);
        submit(
            &mut engine,
            addr(1),
            2_000,
            TransitionOp::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 10,
            },
        )
        .unwrap();

        let mut restored = Engine::restore(engine.snapshot());
        assert_eq!(restored.state_root(), engine.state_root());
        assert_eq!(restored.events().len(), engine.events().len());

        // Both continue identically.
        let op = TransitionOp::Transfer {
            from: addr(1),
            to: addr(2),
            amount: 5,
        };
        submit(&mut engine, addr(1), 2_001, op.clone()).unwrap();
        submit(&mut restored, addr(1), 2_001, op).unwrap();
        assert_eq!(restored.state_root(), engine.state_root());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use agora_types::genesis::{GenesisAllocation, GenesisRoleGrant};
    use agora_types::primitives::Amount;
    use agora_types::transition::MintDirection;
    use proptest::prelude::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    fn seeded_engine() -> Engine {
        Engine::from_genesis(&GenesisConfig {
            chain_id: "agora-prop".to_string(),
            timestamp: 1_000,
            allocations: vec![
                GenesisAllocation {
                    address: addr(1),
                    amount: 10_000,
                },
                GenesisAllocation {
                    address: addr(2),
                    amount: 5_000,
                },
            ],
            roles: vec![GenesisRoleGrant {
                address: addr(1),
                roles: RoleSet::MINTER,
            }],
            governance: GovernanceParams::default(),
        })
        .unwrap()
    }

    /// A caller plus an operation affecting balances or supply. Callers
    /// stay off the zero address, and mint/burn always comes from the
    /// genesis minter.
    fn arb_step() -> impl Strategy<Value = (Address, TransitionOp)> {
        prop_oneof![
            (1u8..5, 1u8..5, 1u128..500u128).prop_map(|(from, to, amount)| {
                (
                    addr(from),
                    TransitionOp::Transfer {
                        from: addr(from),
                        to: addr(to),
                        amount,
                    },
                )
            }),
            (1u8..5, 1u128..500u128).prop_map(|(account, amount)| {
                (
                    addr(1),
                    TransitionOp::MintBurn {
                        account: addr(account),
                        amount,
                        direction: MintDirection::Mint,
                    },
                )
            }),
            (1u8..5, 1u128..500u128).prop_map(|(account, amount)| {
                (
                    addr(1),
                    TransitionOp::MintBurn {
                        account: addr(account),
                        amount,
                        direction: MintDirection::Burn,
                    },
                )
            }),
        ]
    }

    proptest! {
        /// After any run of accepted and rejected steps, the balances
        /// still sum to the total supply and never went negative (the
        /// balance type is unsigned, so conservation is the whole story).
        #[test]
        fn test_supply_conservation(steps in proptest::collection::vec(arb_step(), 1..50)) {
            let mut engine = seeded_engine();
            for (i, (caller, op)) in steps.into_iter().enumerate() {
                let nonce = engine.ledger().nonce(&caller);
                let _ = engine.apply(&Transition {
                    caller,
                    nonce,
                    timestamp: 2_000 + i as u64,
                    op,
                });
                prop_assert_eq!(engine.ledger().balance_sum(), engine.ledger().total_supply);
            }
        }

        /// Supply moves by exactly the minted or burned amount.
        #[test]
        fn test_mint_burn_delta(amount in 1u128..1_000u128) {
            let mut engine = seeded_engine();
            let before = engine.ledger().total_supply;

            let nonce = engine.ledger().nonce(&addr(1));
            engine.apply(&Transition {
                caller: addr(1),
                nonce,
                timestamp: 2_000,
                op: TransitionOp::MintBurn {
                    account: addr(3),
                    amount,
                    direction: MintDirection::Mint,
                },
            }).unwrap();
            prop_assert_eq!(engine.ledger().total_supply, before + amount);

            let nonce = engine.ledger().nonce(&addr(1));
            engine.apply(&Transition {
                caller: addr(1),
                nonce,
                timestamp: 2_001,
                op: TransitionOp::MintBurn {
                    account: addr(3),
                    amount,
                    direction: MintDirection::Burn,
                },
            }).unwrap();
            prop_assert_eq!(engine.ledger().total_supply, before);
        }
    }
}
