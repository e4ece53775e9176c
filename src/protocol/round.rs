//! Round driver.
//!
//! Builds the local tree, hands every participant its keys and subgraph,
//! spawns one task per participant and waits for the authority's
//! outcome. The driver is also where the round deadline lives: the
//! protocol itself never times out.

use super::authority::{Authority, AuthorityCore, ChainOutput};
use super::directory::RoundKeys;
use super::error::{ProtocolError, ProtocolResult};
use super::telecom::{Telecom, TelecomCore};
use crate::frontier::{Warrant, DEFAULT_FRONTIER_CAPACITY};
use crate::graph::LocalSubgraph;
use crate::transport::LocalNetwork;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Default deadline for a whole round.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(30);

/// How telecoms treat queries whose signature does not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignaturePolicy {
    /// Drop the query without replying. The authority keeps waiting on
    /// it, so the round ends at its deadline.
    #[default]
    Enforce,
    /// Log a warning and answer anyway.
    LogOnly,
}

/// Participant role in a topology.
#[derive(Debug, Clone)]
pub enum Role {
    Authority,
    Telecom(LocalSubgraph),
}

/// One authority and the ordered list of telecom subgraphs.
///
/// A telecom's position in the list is its index in warrants and replies.
#[derive(Debug, Clone)]
pub struct Topology {
    telecoms: Vec<LocalSubgraph>,
}

impl Topology {
    pub fn new(telecoms: Vec<LocalSubgraph>) -> ProtocolResult<Self> {
        if telecoms.is_empty() {
            return Err(ProtocolError::Construction(
                "a round needs at least one telecom".to_string(),
            ));
        }
        Ok(Self { telecoms })
    }

    /// Build from a role list containing exactly one authority.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> ProtocolResult<Self> {
        let mut authorities = 0;
        let mut telecoms = Vec::new();
        for role in roles {
            match role {
                Role::Authority => authorities += 1,
                Role::Telecom(subgraph) => telecoms.push(subgraph),
            }
        }

        if authorities != 1 {
            return Err(ProtocolError::Construction(format!(
                "expected exactly one authority, found {authorities}"
            )));
        }
        Self::new(telecoms)
    }

    pub fn telecom_count(&self) -> usize {
        self.telecoms.len()
    }

    pub fn telecoms(&self) -> &[LocalSubgraph] {
        &self.telecoms
    }
}

/// Driver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundConfig {
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub signature_policy: SignaturePolicy,
    pub frontier_capacity: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_ROUND_TIMEOUT),
            signature_policy: SignaturePolicy::default(),
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
        }
    }
}

/// A single contact-chaining round over an in-process tree.
#[derive(Debug, Clone)]
pub struct Round {
    topology: Topology,
    config: RoundConfig,
}

impl Round {
    pub fn new(topology: Topology, config: RoundConfig) -> Self {
        Self { topology, config }
    }

    /// Chain outward from `seed` (owned by telecom `seed_owner`) for at
    /// most `max_depth` hops and return every identifier reached.
    pub async fn run(
        self,
        seed: &str,
        seed_owner: usize,
        max_depth: u32,
    ) -> ProtocolResult<ChainOutput> {
        let round_id = Uuid::new_v4();
        let span = info_span!("round", %round_id);
        self.execute(Warrant::seed(seed, seed_owner, max_depth))
            .instrument(span)
            .await
    }

    async fn execute(self, seed: Warrant) -> ProtocolResult<ChainOutput> {
        let Self { topology, config } = self;
        let telecom_count = topology.telecom_count();
        info!(
            telecoms = telecom_count,
            seed_owner = seed.destination,
            max_depth = seed.depth,
            "starting round"
        );

        let keys = RoundKeys::generate(telecom_count)?;
        let (network, endpoints) = LocalNetwork::star(telecom_count);
        let mut endpoints = endpoints.into_iter();
        let (root, root_inbox) = endpoints
            .next()
            .ok_or_else(|| ProtocolError::Construction("tree has no root".to_string()))?;

        let mut telecom_tasks = Vec::with_capacity(telecom_count);
        for (index, (((transport, inbox), subgraph), pair)) in endpoints
            .zip(topology.telecoms)
            .zip(keys.telecoms)
            .enumerate()
        {
            let core = TelecomCore::new(
                index,
                pair,
                keys.directory.clone(),
                subgraph,
                config.signature_policy,
            );
            let telecom = Telecom::new(transport, core)?;
            telecom_tasks.push(tokio::spawn(telecom.run(inbox).in_current_span()));
        }

        let (completion, outcome) = oneshot::channel();
        let core = AuthorityCore::new(
            keys.authority,
            keys.signing_key,
            keys.directory,
            seed,
            config.frontier_capacity,
        );
        let authority = Authority::new(root, core, completion)?;
        authority.trigger().await?;
        let authority_task = tokio::spawn(authority.run(root_inbox).in_current_span());

        let outcome = match config.timeout {
            Some(limit) => match tokio::time::timeout(limit, outcome).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(?limit, "round deadline passed, aborting participants");
                    authority_task.abort();
                    for task in &telecom_tasks {
                        task.abort();
                    }
                    return Err(ProtocolError::Timeout(limit));
                }
            },
            None => outcome.await,
        };

        let result = outcome.unwrap_or_else(|_| {
            Err(ProtocolError::Aborted(
                "authority exited without reporting an outcome".to_string(),
            ))
        });

        if let Err(e) = authority_task.await {
            warn!(error = %e, "authority task did not shut down cleanly");
        }
        for joined in futures::future::join_all(telecom_tasks).await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "telecom ended with error"),
                Err(e) => warn!(error = %e, "telecom task did not shut down cleanly"),
            }
        }

        let mut output = result?;
        let traffic = network.traffic();
        output.messages = traffic.messages;
        output.bytes = traffic.bytes;
        info!(
            identifiers = output.len(),
            queries = output.queries,
            messages = output.messages,
            "round complete"
        );
        Ok(output)
    }
}
