//! Script-driven vault simulation
//!
//! Replays a JSON script of `{caller, action}` steps against an in-process
//! vault and prints one JSON report. Proposal ids are random, so vote steps
//! can refer to the id created by an earlier step as `"$<step>"`.
//!
//! ```json
//! {"steps": [
//!   {"caller": "alice", "action": "propose_threshold_change", "threshold": 3},
//!   {"caller": "bob", "action": "vote_on_threshold_proposal", "proposal": "$0", "adopt": true}
//! ]}
//! ```
//!
//! With `--state`, a CBOR snapshot is restored before the run (when the file
//! exists) and written back afterwards. The in-memory ledger is re-credited
//! from config on every run.

use super::check_config;
use super::config::{resolve_config_path, VaultConfig};
use super::logging;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigvault::clock::SystemClock;
use sigvault::ledger::{AccountId, Ledger, MockLedger, Tokens};
use sigvault::proposals::{ProposalId, SignerChange};
use sigvault::randomness::{OsRandomness, RandomnessSource};
use sigvault::vault::{ErrorCategory, ProposalFilter, VaultSnapshot};
use sigvault::{Principal, Vault, VaultError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A simulation script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

/// One scripted call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Calling principal; queries may omit it
    #[serde(default)]
    pub caller: Option<Principal>,

    #[serde(flatten)]
    pub action: Action,
}

/// Vault operations a script can invoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ProposeSignerChange {
        #[serde(default)]
        description: String,
        signer: Principal,
        add: bool,
    },
    ProposeThresholdChange {
        #[serde(default)]
        description: String,
        threshold: u32,
    },
    ProposeTransfer {
        #[serde(default)]
        description: String,
        to: AccountId,
        amount_e8s: u64,
    },
    VoteOnSignerProposal {
        proposal: String,
        adopt: bool,
    },
    VoteOnThresholdProposal {
        proposal: String,
        adopt: bool,
    },
    VoteOnTransferProposal {
        proposal: String,
        adopt: bool,
    },
    ListSignerProposals {
        #[serde(default)]
        filter: ProposalFilter,
    },
    ListThresholdProposals {
        #[serde(default)]
        filter: ProposalFilter,
    },
    ListTransferProposals {
        #[serde(default)]
        filter: ProposalFilter,
    },
    GetSigners,
    GetThreshold,
    Balance,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

/// Final report printed to stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps: Vec<StepReport>,
    pub signers: Vec<Principal>,
    pub threshold: u32,
}

/// Step failures that are not vault errors
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Step requires a caller")]
    MissingCaller,

    #[error("Unknown proposal reference '{0}'")]
    BadReference(String),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StepError {
    fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Vault(err) => Some(err.category()),
            _ => None,
        }
    }
}

/// Run a simulation script
pub async fn execute(
    script: String,
    config: Option<String>,
    state: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);
    let config = VaultConfig::load(&config_path)?;
    logging::init(&config.logging)?;

    let script_path = PathBuf::from(script);
    let contents = fs::read_to_string(&script_path).map_err(|e| {
        format!(
            "Failed to read script '{}': {}",
            script_path.display(),
            e
        )
    })?;
    let script: Script = serde_json::from_str(&contents).map_err(|e| {
        format!(
            "Failed to parse script '{}': {}",
            script_path.display(),
            e
        )
    })?;

    let state_path = state.map(PathBuf::from);
    let vault = match &state_path {
        Some(path) if path.exists() => restore(&config, path)?,
        _ => check_config::build(&config)?,
    };

    let steps = run_script(&vault, &script).await;
    let report = SimulationReport {
        steps,
        signers: vault.signers(),
        threshold: vault.threshold(),
    };

    if let Some(path) = &state_path {
        let bytes = vault.snapshot().to_bytes()?;
        fs::write(path, bytes)
            .map_err(|e| format!("Failed to write state '{}': {}", path.display(), e))?;
        tracing::info!(path = %path.display(), "state snapshot saved");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn restore(
    config: &VaultConfig,
    path: &Path,
) -> Result<Vault<OsRandomness, MockLedger>, Box<dyn std::error::Error>> {
    let bytes =
        fs::read(path).map_err(|e| format!("Failed to read state '{}': {}", path.display(), e))?;
    let snapshot = VaultSnapshot::from_bytes(&bytes)?;

    let ledger = MockLedger::new(snapshot.account, config.transfer_fee());
    ledger.deposit(snapshot.account, config.initial_balance());
    tracing::info!(path = %path.display(), "restoring state snapshot");
    Ok(Vault::restore(
        snapshot,
        OsRandomness::new(),
        ledger,
        Arc::new(SystemClock),
    )?)
}

/// Execute every step in order, collecting one report per step.
///
/// A failing step does not stop the run.
pub async fn run_script<R, L>(vault: &Vault<R, L>, script: &Script) -> Vec<StepReport>
where
    R: RandomnessSource,
    L: Ledger,
{
    let mut created: Vec<Option<ProposalId>> = Vec::with_capacity(script.steps.len());
    let mut reports = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        let outcome = run_step(vault, step, &created).await;
        let (id, report) = match outcome {
            Ok((id, result)) => (
                id,
                StepReport {
                    step: index,
                    ok: true,
                    result: Some(result),
                    error: None,
                    category: None,
                },
            ),
            Err(err) => (
                None,
                StepReport {
                    step: index,
                    ok: false,
                    result: None,
                    error: Some(err.to_string()),
                    category: err.category(),
                },
            ),
        };
        created.push(id);
        reports.push(report);
    }
    reports
}

async fn run_step<R, L>(
    vault: &Vault<R, L>,
    step: &Step,
    created: &[Option<ProposalId>],
) -> Result<(Option<ProposalId>, Value), StepError>
where
    R: RandomnessSource,
    L: Ledger,
{
    let caller = || step.caller.as_ref().ok_or(StepError::MissingCaller);

    let id = match &step.action {
        Action::ProposeSignerChange {
            description,
            signer,
            add,
        } => {
            let change = SignerChange {
                signer: signer.clone(),
                add: *add,
            };
            vault
                .propose_signer_change(caller()?, description.as_str(), change)
                .await?
        }
        Action::ProposeThresholdChange {
            description,
            threshold,
        } => {
            vault
                .propose_threshold_change(caller()?, description.as_str(), *threshold)
                .await?
        }
        Action::ProposeTransfer {
            description,
            to,
            amount_e8s,
        } => {
            vault
                .propose_transfer(
                    caller()?,
                    description.as_str(),
                    *to,
                    Tokens::from_e8s(*amount_e8s),
                )
                .await?
        }
        Action::VoteOnSignerProposal { proposal, adopt } => {
            let id = resolve(proposal, created)?;
            let decision = vault.vote_on_signer_proposal(caller()?, &id, *adopt)?;
            return Ok((None, serde_json::to_value(decision)?));
        }
        Action::VoteOnThresholdProposal { proposal, adopt } => {
            let id = resolve(proposal, created)?;
            let decision = vault.vote_on_threshold_proposal(caller()?, &id, *adopt)?;
            return Ok((None, serde_json::to_value(decision)?));
        }
        Action::VoteOnTransferProposal { proposal, adopt } => {
            let id = resolve(proposal, created)?;
            let decision = vault
                .vote_on_transfer_proposal(caller()?, &id, *adopt)
                .await?;
            return Ok((None, serde_json::to_value(decision)?));
        }
        Action::ListSignerProposals { filter } => {
            return Ok((None, serde_json::to_value(vault.signer_proposals(*filter))?));
        }
        Action::ListThresholdProposals { filter } => {
            return Ok((
                None,
                serde_json::to_value(vault.threshold_proposals(*filter))?,
            ));
        }
        Action::ListTransferProposals { filter } => {
            return Ok((
                None,
                serde_json::to_value(vault.transfer_proposals(*filter))?,
            ));
        }
        Action::GetSigners => return Ok((None, serde_json::to_value(vault.signers())?)),
        Action::GetThreshold => return Ok((None, serde_json::to_value(vault.threshold())?)),
        Action::Balance => {
            let balance = vault.balance().await?;
            return Ok((None, serde_json::to_value(balance)?));
        }
    };

    let value = Value::String(id.to_string());
    Ok((Some(id), value))
}

/// `"$N"` names the proposal created by step N; anything else is a literal id.
fn resolve(reference: &str, created: &[Option<ProposalId>]) -> Result<ProposalId, StepError> {
    match reference.strip_prefix('$') {
        Some(index) => index
            .parse::<usize>()
            .ok()
            .and_then(|index| created.get(index).cloned().flatten())
            .ok_or_else(|| StepError::BadReference(reference.to_string())),
        None => Ok(ProposalId::new(reference)),
    }
}
