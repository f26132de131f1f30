use std::sync::Arc;
use tokio::sync::RwLock;

use jsonrpsee::core::async_trait;
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::PendingSubscriptionSink;

use agora_engine::engine::Engine;
use agora_storage::journal::JournalStore;
use agora_storage::traits::KvStore;
use agora_types::campaign::CampaignStatus;
use agora_types::event::{EventKind, EventRecord};
use agora_types::governance::{ProposalState, VoteChoice};
use agora_types::primitives::{campaign_escrow_address, Address, SlotKey};
use agora_types::transition::{Receipt, Transition};

use super::types::{
    AccountInfo, AttributeInfo, CampaignInfo, EventInfo, HealthInfo, NftInfo, ProposalInfo,
    ReceiptInfo, StateInfo, SubmitResult,
};
use crate::metrics::NodeMetrics;

/// JSON-RPC trait for the Agora node.
#[rpc(server)]
pub trait AgoraRpc {
    /// Submit a transition (hex-encoded borsh bytes).
    #[method(name = "agora_submitTransition")]
    async fn submit_transition(
        &self,
        transition_hex: String,
    ) -> Result<SubmitResult, ErrorObjectOwned>;

    /// Get account info by address (hex).
    #[method(name = "agora_getAccount")]
    async fn get_account(&self, address: String) -> Result<Option<AccountInfo>, ErrorObjectOwned>;

    /// Get the balance of an address.
    #[method(name = "agora_getBalance")]
    async fn get_balance(&self, address: String) -> Result<String, ErrorObjectOwned>;

    /// Get the total token supply.
    #[method(name = "agora_getTotalSupply")]
    async fn get_total_supply(&self) -> Result<String, ErrorObjectOwned>;

    /// Get the allowance from an owner to a spender.
    #[method(name = "agora_getAllowance")]
    async fn get_allowance(
        &self,
        owner: String,
        spender: String,
    ) -> Result<String, ErrorObjectOwned>;

    /// Get a storage slot value (hex) for an account and key.
    #[method(name = "agora_getStorage")]
    async fn get_storage(
        &self,
        address: String,
        key: String,
    ) -> Result<Option<String>, ErrorObjectOwned>;

    /// Get campaign info by ID.
    #[method(name = "agora_getCampaign")]
    async fn get_campaign(
        &self,
        campaign_id: u64,
    ) -> Result<Option<CampaignInfo>, ErrorObjectOwned>;

    /// Get the outstanding pledge of a contributor to a campaign.
    #[method(name = "agora_getPledge")]
    async fn get_pledge(
        &self,
        campaign_id: u64,
        contributor: String,
    ) -> Result<Option<String>, ErrorObjectOwned>;

    /// Get proposal info by ID.
    #[method(name = "agora_getProposal")]
    async fn get_proposal(
        &self,
        proposal_id: u64,
    ) -> Result<Option<ProposalInfo>, ErrorObjectOwned>;

    /// Get a voter's snapshot weight under a proposal.
    #[method(name = "agora_getVotingWeight")]
    async fn get_voting_weight(
        &self,
        proposal_id: u64,
        voter: String,
    ) -> Result<Option<String>, ErrorObjectOwned>;

    /// Get NFT info by token ID.
    #[method(name = "agora_getNft")]
    async fn get_nft(&self, token_id: u64) -> Result<Option<NftInfo>, ErrorObjectOwned>;

    /// List NFTs owned by an address.
    #[method(name = "agora_getNftsByOwner")]
    async fn get_nfts_by_owner(&self, owner: String) -> Result<Vec<NftInfo>, ErrorObjectOwned>;

    /// Get events from a sequence number onward. A limit of zero means no limit.
    #[method(name = "agora_getEvents")]
    async fn get_events(
        &self,
        from_sequence: u64,
        limit: u64,
    ) -> Result<Vec<EventInfo>, ErrorObjectOwned>;

    /// Get a summary of the engine state.
    #[method(name = "agora_getState")]
    async fn get_state(&self) -> Result<StateInfo, ErrorObjectOwned>;

    /// Get the current state root (hex).
    #[method(name = "agora_getStateRoot")]
    async fn get_state_root(&self) -> Result<String, ErrorObjectOwned>;

    /// Health check endpoint.
    #[method(name = "agora_health")]
    async fn health(&self) -> Result<HealthInfo, ErrorObjectOwned>;

    /// Get node metrics in Prometheus text exposition format.
    #[method(name = "agora_getMetrics")]
    async fn get_metrics(&self) -> Result<String, ErrorObjectOwned>;

    /// Subscribe to receipts of accepted transitions.
    #[subscription(name = "agora_subscribeReceipts" => "agora_receipts", unsubscribe = "agora_unsubscribeReceipts", item = ReceiptInfo)]
    async fn subscribe_receipts(&self) -> SubscriptionResult;
}

/// Implementation of the AgoraRpc trait.
#[allow(dead_code)] // Required: jsonrpsee accesses fields via trait impl
pub struct AgoraRpcImpl {
    pub engine: Arc<RwLock<Engine>>,
    pub journal: Arc<JournalStore<Arc<dyn KvStore>>>,
    pub metrics: Arc<NodeMetrics>,
    pub receipt_tx: tokio::sync::broadcast::Sender<ReceiptInfo>,
}

/// Parse a hex string into a 20-byte address.
fn parse_address_hex(hex_str: &str) -> Result<Address, ErrorObjectOwned> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid hex: {}", e), None::<()>))?;
    if bytes.len() != 20 {
        return Err(ErrorObjectOwned::owned(
            -32602,
            format!("address must be 20 bytes, got {}", bytes.len()),
            None::<()>,
        ));
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Parse a hex string into a 32-byte slot key.
fn parse_slot_key_hex(hex_str: &str) -> Result<SlotKey, ErrorObjectOwned> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| ErrorObjectOwned::owned(-32602, format!("invalid hex: {}", e), None::<()>))?;
    if bytes.len() != 32 {
        return Err(ErrorObjectOwned::owned(
            -32602,
            format!("slot key must be 32 bytes, got {}", bytes.len()),
            None::<()>,
        ));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

fn campaign_status_str(status: &CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Open => "open",
        CampaignStatus::Succeeded => "succeeded",
        CampaignStatus::Failed => "failed",
    }
}

fn vote_choice_str(choice: &VoteChoice) -> &'static str {
    match choice {
        VoteChoice::For => "for",
        VoteChoice::Against => "against",
        VoteChoice::Abstain => "abstain",
    }
}

fn proposal_state_str(state: ProposalState) -> &'static str {
    match state {
        ProposalState::Pending => "pending",
        ProposalState::Active => "active",
        ProposalState::Succeeded => "succeeded",
        ProposalState::Defeated => "defeated",
        ProposalState::Queued => "queued",
        ProposalState::Executed => "executed",
        ProposalState::Canceled => "canceled",
    }
}

/// Flatten an event record into its wire representation.
pub(crate) fn event_info(record: &EventRecord) -> EventInfo {
    let mut attributes = Vec::new();
    let mut push = |key: &str, value: String| {
        attributes.push(AttributeInfo {
            key: key.to_string(),
            value,
        });
    };

    match &record.kind {
        EventKind::Transfer { from, to, amount } => {
            push("from", hex::encode(from));
            push("to", hex::encode(to));
            push("amount", amount.to_string());
        }
        EventKind::Approval {
            owner,
            spender,
            amount,
        } => {
            push("owner", hex::encode(owner));
            push("spender", hex::encode(spender));
            push("amount", amount.to_string());
        }
        EventKind::Minted {
            account,
            amount,
            total_supply,
        } => {
            push("account", hex::encode(account));
            push("amount", amount.to_string());
            push("total_supply", total_supply.to_string());
        }
        EventKind::Burned {
            account,
            amount,
            total_supply,
        } => {
            push("account", hex::encode(account));
            push("amount", amount.to_string());
            push("total_supply", total_supply.to_string());
        }
        EventKind::StorageChanged {
            account,
            key,
            previous,
            value,
        } => {
            push("account", hex::encode(account));
            push("key", hex::encode(key));
            if let Some(prev) = previous {
                push("previous", hex::encode(prev));
            }
            push("value", hex::encode(value));
        }
        EventKind::RoleGranted { account, roles } => {
            push("account", hex::encode(account));
            push("roles", roles.to_string());
        }
        EventKind::RoleRevoked { account, roles } => {
            push("account", hex::encode(account));
            push("roles", roles.to_string());
        }
        EventKind::CampaignCreated {
            campaign_id,
            owner,
            target,
            deadline,
        } => {
            push("campaign_id", campaign_id.to_string());
            push("owner", hex::encode(owner));
            push("target", target.to_string());
            push("deadline", deadline.to_string());
        }
        EventKind::Pledged {
            campaign_id,
            contributor,
            amount,
            raised,
        } => {
            push("campaign_id", campaign_id.to_string());
            push("contributor", hex::encode(contributor));
            push("amount", amount.to_string());
            push("raised", raised.to_string());
        }
        EventKind::CampaignFinalized {
            campaign_id,
            status,
            raised,
        } => {
            push("campaign_id", campaign_id.to_string());
            push("status", campaign_status_str(status).to_string());
            push("raised", raised.to_string());
        }
        EventKind::CampaignFundsClaimed {
            campaign_id,
            owner,
            amount,
        } => {
            push("campaign_id", campaign_id.to_string());
            push("owner", hex::encode(owner));
            push("amount", amount.to_string());
        }
        EventKind::Refunded {
            campaign_id,
            contributor,
            amount,
        } => {
            push("campaign_id", campaign_id.to_string());
            push("contributor", hex::encode(contributor));
            push("amount", amount.to_string());
        }
        EventKind::NftMinted { token_id, to, uri } => {
            push("token_id", token_id.to_string());
            push("to", hex::encode(to));
            push("uri", uri.clone());
        }
        EventKind::NftTransferred { token_id, from, to } => {
            push("token_id", token_id.to_string());
            push("from", hex::encode(from));
            push("to", hex::encode(to));
        }
        EventKind::NftBurned { token_id, owner } => {
            push("token_id", token_id.to_string());
            push("owner", hex::encode(owner));
        }
        EventKind::DelegateChanged {
            delegator,
            previous,
            delegate,
        } => {
            push("delegator", hex::encode(delegator));
            push("previous", hex::encode(previous));
            push("delegate", hex::encode(delegate));
        }
        EventKind::ProposalCreated {
            proposal_id,
            proposer,
            voting_start,
            voting_end,
        } => {
            push("proposal_id", proposal_id.to_string());
            push("proposer", hex::encode(proposer));
            push("voting_start", voting_start.to_string());
            push("voting_end", voting_end.to_string());
        }
        EventKind::VoteCast {
            proposal_id,
            voter,
            choice,
            weight,
        } => {
            push("proposal_id", proposal_id.to_string());
            push("voter", hex::encode(voter));
            push("choice", vote_choice_str(choice).to_string());
            push("weight", weight.to_string());
        }
        EventKind::ProposalQueued { proposal_id, eta } => {
            push("proposal_id", proposal_id.to_string());
            push("eta", eta.to_string());
        }
        EventKind::ProposalExecuted { proposal_id } => {
            push("proposal_id", proposal_id.to_string());
        }
        EventKind::ProposalCanceled { proposal_id } => {
            push("proposal_id", proposal_id.to_string());
        }
    }

    EventInfo {
        sequence: record.sequence,
        index: record.index,
        ty: record.kind.name().to_string(),
        attributes,
    }
}

/// Build the subscription payload for an accepted transition.
pub(crate) fn receipt_info(transition: &Transition, receipt: &Receipt) -> ReceiptInfo {
    ReceiptInfo {
        sequence: receipt.sequence,
        caller: hex::encode(transition.caller),
        op: transition.op.name().to_string(),
        created_id: receipt.created_id,
        events: receipt.events.iter().map(event_info).collect(),
    }
}

#[async_trait]
impl AgoraRpcServer for AgoraRpcImpl {
    async fn submit_transition(
        &self,
        transition_hex: String,
    ) -> Result<SubmitResult, ErrorObjectOwned> {
        let bytes = hex::decode(&transition_hex).map_err(|e| {
            ErrorObjectOwned::owned(-32602, format!("invalid hex: {}", e), None::<()>)
        })?;

        let transition: Transition = borsh::from_slice(&bytes).map_err(|e| {
            ErrorObjectOwned::owned(-32602, format!("invalid transition: {}", e), None::<()>)
        })?;

        match crate::node::ingest_transition(
            &self.engine,
            &self.journal,
            &self.metrics,
            Some(&self.receipt_tx),
            &transition,
        )
        .await
        {
            Ok(receipt) => Ok(SubmitResult {
                accepted: true,
                sequence: Some(receipt.sequence),
                created_id: receipt.created_id,
                events: receipt.events.iter().map(event_info).collect(),
                reason: None,
            }),
            Err(e) => Ok(SubmitResult {
                accepted: false,
                sequence: None,
                created_id: None,
                events: Vec::new(),
                reason: Some(e.to_string()),
            }),
        }
    }

    async fn get_account(
        &self,
        address_hex: String,
    ) -> Result<Option<AccountInfo>, ErrorObjectOwned> {
        let address = parse_address_hex(&address_hex)?;

        let engine = self.engine.read().await;
        let ledger = engine.ledger();
        let Some(account) = ledger.accounts.get(&address) else {
            return Ok(None);
        };

        Ok(Some(AccountInfo {
            address: address_hex,
            balance: account.balance.to_string(),
            nonce: account.nonce,
            roles: account.roles.to_string(),
            delegate: ledger.delegates.get(&address).map(hex::encode),
        }))
    }

    async fn get_balance(&self, address_hex: String) -> Result<String, ErrorObjectOwned> {
        let address = parse_address_hex(&address_hex)?;
        let engine = self.engine.read().await;
        Ok(engine.ledger().balance(&address).to_string())
    }

    async fn get_total_supply(&self) -> Result<String, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        Ok(engine.ledger().total_supply.to_string())
    }

    async fn get_allowance(
        &self,
        owner_hex: String,
        spender_hex: String,
    ) -> Result<String, ErrorObjectOwned> {
        let owner = parse_address_hex(&owner_hex)?;
        let spender = parse_address_hex(&spender_hex)?;
        let engine = self.engine.read().await;
        Ok(engine.ledger().allowance(&owner, &spender).to_string())
    }

    async fn get_storage(
        &self,
        address_hex: String,
        key_hex: String,
    ) -> Result<Option<String>, ErrorObjectOwned> {
        let address = parse_address_hex(&address_hex)?;
        let key = parse_slot_key_hex(&key_hex)?;
        let engine = self.engine.read().await;
        Ok(engine.ledger().slot(&address, &key).map(hex::encode))
    }

    async fn get_campaign(
        &self,
        campaign_id: u64,
    ) -> Result<Option<CampaignInfo>, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        let Some(campaign) = engine.campaigns().get(campaign_id) else {
            return Ok(None);
        };

        Ok(Some(CampaignInfo {
            campaign_id: campaign.id,
            owner: hex::encode(campaign.owner),
            target: campaign.target.to_string(),
            deadline: campaign.deadline,
            raised: campaign.raised.to_string(),
            status: campaign_status_str(&campaign.status).to_string(),
            payout: campaign.payout.to_string(),
            pledge_count: campaign.pledges.len(),
            escrow_address: hex::encode(campaign_escrow_address(campaign.id)),
        }))
    }

    async fn get_pledge(
        &self,
        campaign_id: u64,
        contributor_hex: String,
    ) -> Result<Option<String>, ErrorObjectOwned> {
        let contributor = parse_address_hex(&contributor_hex)?;
        let engine = self.engine.read().await;
        Ok(engine
            .campaigns()
            .get(campaign_id)
            .map(|c| c.pledged(&contributor).to_string()))
    }

    async fn get_proposal(
        &self,
        proposal_id: u64,
    ) -> Result<Option<ProposalInfo>, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        let Some(proposal) = engine.governance().get(proposal_id) else {
            return Ok(None);
        };

        Ok(Some(ProposalInfo {
            proposal_id: proposal.id,
            proposer: hex::encode(proposal.proposer),
            description: proposal.description.clone(),
            voting_start: proposal.voting_start,
            voting_end: proposal.voting_end,
            state: proposal_state_str(proposal.state(engine.clock())).to_string(),
            for_votes: proposal.tally.for_votes.to_string(),
            against_votes: proposal.tally.against_votes.to_string(),
            abstain_votes: proposal.tally.abstain_votes.to_string(),
            quorum: proposal.quorum.to_string(),
            snapshot_total: proposal.snapshot_total.to_string(),
            eta: proposal.eta,
        }))
    }

    async fn get_voting_weight(
        &self,
        proposal_id: u64,
        voter_hex: String,
    ) -> Result<Option<String>, ErrorObjectOwned> {
        let voter = parse_address_hex(&voter_hex)?;
        let engine = self.engine.read().await;
        Ok(engine
            .governance()
            .get(proposal_id)
            .map(|p| p.weight_of(&voter).to_string()))
    }

    async fn get_nft(&self, token_id: u64) -> Result<Option<NftInfo>, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        Ok(engine.nfts().get(token_id).map(|nft| NftInfo {
            token_id: nft.id,
            owner: hex::encode(nft.owner),
            uri: nft.uri.clone(),
        }))
    }

    async fn get_nfts_by_owner(
        &self,
        owner_hex: String,
    ) -> Result<Vec<NftInfo>, ErrorObjectOwned> {
        let owner = parse_address_hex(&owner_hex)?;
        let engine = self.engine.read().await;
        let nfts = engine.nfts();
        Ok(nfts
            .owned_by(&owner)
            .into_iter()
            .filter_map(|id| nfts.get(id))
            .map(|nft| NftInfo {
                token_id: nft.id,
                owner: hex::encode(nft.owner),
                uri: nft.uri.clone(),
            })
            .collect())
    }

    async fn get_events(
        &self,
        from_sequence: u64,
        limit: u64,
    ) -> Result<Vec<EventInfo>, ErrorObjectOwned> {
        let limit = if limit == 0 { usize::MAX } else { limit as usize };
        let engine = self.engine.read().await;
        Ok(engine
            .events()
            .from_sequence(from_sequence)
            .iter()
            .take(limit)
            .map(event_info)
            .collect())
    }

    async fn get_state(&self) -> Result<StateInfo, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        Ok(StateInfo {
            chain_id: engine.chain_id().to_string(),
            sequence: engine.sequence(),
            clock: engine.clock(),
            state_root: hex::encode(engine.state_root()),
            total_supply: engine.ledger().total_supply.to_string(),
            account_count: engine.ledger().accounts.len(),
            campaign_count: engine.campaigns().len(),
            proposal_count: engine.governance().len(),
            nft_count: engine.nfts().len(),
            event_count: engine.events().len(),
        })
    }

    async fn get_state_root(&self) -> Result<String, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        Ok(hex::encode(engine.state_root()))
    }

    async fn health(&self) -> Result<HealthInfo, ErrorObjectOwned> {
        let engine = self.engine.read().await;
        Ok(HealthInfo {
            status: "ok".to_string(),
            chain_id: engine.chain_id().to_string(),
            sequence: engine.sequence(),
            clock: engine.clock(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    async fn get_metrics(&self) -> Result<String, ErrorObjectOwned> {
        Ok(self.metrics.encode())
    }

    async fn subscribe_receipts(&self, pending: PendingSubscriptionSink) -> SubscriptionResult {
        let mut rx = self.receipt_tx.subscribe();
        let sink = pending.accept().await?;

        tokio::spawn(async move {
            while let Ok(receipt) = rx.recv().await {
                match jsonrpsee::SubscriptionMessage::from_json(&receipt) {
                    Ok(msg) => {
                        if sink.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_hex() {
        let addr = parse_address_hex(&hex::encode([7u8; 20])).unwrap();
        assert_eq!(addr, [7u8; 20]);

        assert!(parse_address_hex("zz").is_err());
        assert!(parse_address_hex(&hex::encode([7u8; 19])).is_err());
        assert!(parse_address_hex(&hex::encode([7u8; 32])).is_err());
    }

    #[test]
    fn test_parse_slot_key_hex() {
        let key = parse_slot_key_hex(&hex::encode([9u8; 32])).unwrap();
        assert_eq!(key, [9u8; 32]);

        assert!(parse_slot_key_hex(&hex::encode([9u8; 20])).is_err());
    }

    #[test]
    fn test_event_info_transfer() {
        let record = EventRecord {
            sequence: 4,
            index: 1,
            kind: EventKind::Transfer {
                from: [1u8; 20],
                to: [2u8; 20],
                amount: 50,
            },
        };
        let info = event_info(&record);
        assert_eq!(info.sequence, 4);
        assert_eq!(info.index, 1);
        assert_eq!(info.ty, "transfer");
        assert_eq!(info.attributes.len(), 3);
        assert_eq!(info.attributes[0].key, "from");
        assert_eq!(info.attributes[2].value, "50");
    }

    #[test]
    fn test_event_info_storage_omits_absent_previous() {
        let record = EventRecord {
            sequence: 1,
            index: 0,
            kind: EventKind::StorageChanged {
                account: [3u8; 20],
                key: [0u8; 32],
                previous: None,
                value: vec![0xab],
            },
        };
        let info = event_info(&record);
        assert!(info.attributes.iter().all(|a| a.key != "previous"));

        let record = EventRecord {
            sequence: 1,
            index: 0,
            kind: EventKind::StorageChanged {
                account: [3u8; 20],
                key: [0u8; 32],
                previous: Some(vec![0xcd]),
                value: vec![0xab],
            },
        };
        let info = event_info(&record);
        assert!(info.attributes.iter().any(|a| a.key == "previous" && a.value == "cd"));
    }

    #[test]
    fn test_receipt_info_carries_op_name() {
        let transition = Transition {
            caller: [1u8; 20],
            nonce: 0,
            timestamp: 1_000,
            op: agora_types::transition::TransitionOp::Delegate { to: [2u8; 20] },
        };
        let receipt = Receipt {
            sequence: 9,
            events: Vec::new(),
            created_id: None,
        };
        let info = receipt_info(&transition, &receipt);
        assert_eq!(info.sequence, 9);
        assert_eq!(info.op, "delegate");
        assert_eq!(info.caller, hex::encode([1u8; 20]));
    }
}
