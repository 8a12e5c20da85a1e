//! Subcommand execution. Every command prints one JSON document on stdout.

use serde::Serialize;
use serde_json::json;

use coopgov_governance::{Ballot, GovernanceEngine, NewProposal};
use coopgov_store::{ProposalStore, StakeholderRegistry, VoteStore, VoteWrite};
use coopgov_store_lmdb::integrity::{check_data_dir, check_integrity};
use coopgov_store_lmdb::LmdbEnvironment;
use coopgov_types::{Clock, ProposalMetadata, SystemClock, Timestamp, VoterId};
use coopgov_utils::format_duration;

use crate::cli::Command;
use crate::config::{ConfigRegistry, DaemonConfig};
use crate::DaemonError;

/// Named databases plus headroom.
const MAX_DBS: u32 = 8;

pub fn run(command: Command, config: &DaemonConfig) -> Result<(), DaemonError> {
    if let Command::Config = command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let env = open_environment(config)?;
    let registry = ConfigRegistry::try_from(&config.registry)?;
    let engine = GovernanceEngine::new(
        env.governance_store(),
        registry,
        SystemClock,
        config.policy.clone(),
    );
    let output = execute(&engine, command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn open_environment(config: &DaemonConfig) -> Result<LmdbEnvironment, DaemonError> {
    check_data_dir(&config.data_dir).map_err(DaemonError::Config)?;
    let env = LmdbEnvironment::open(&config.data_dir, MAX_DBS, config.map_size_bytes())?;
    let report = check_integrity(&env)?;
    let schema_version = env.schema_version()?;
    for error in &report.errors {
        tracing::warn!("integrity: {error}");
    }
    tracing::debug!(
        path = %env.path().display(),
        schema_version,
        proposals = report.proposals,
        votes = report.votes,
        healthy = report.is_healthy(),
        "integrity check complete"
    );
    Ok(env)
}

/// Run one command against an engine and return its JSON output.
pub fn execute<S, R, C>(
    engine: &GovernanceEngine<S, R, C>,
    command: Command,
) -> Result<serde_json::Value, DaemonError>
where
    S: ProposalStore + VoteStore,
    R: StakeholderRegistry,
    C: Clock,
{
    match command {
        Command::Propose {
            model,
            quorum,
            approval,
            deadline,
            closes_in,
            title,
            description,
            initiator,
            cooperatives,
        } => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DaemonError::InvalidArgument("title must not be empty".into()));
            }
            let voting_deadline = match (deadline, closes_in) {
                (Some(at), _) => Timestamp::new(at),
                (None, Some(secs)) => {
                    Timestamp::new(engine.clock().now().as_secs().saturating_add(secs))
                }
                (None, None) => {
                    return Err(DaemonError::InvalidArgument(
                        "either --deadline or --closes-in is required".into(),
                    ))
                }
            };
            let id = engine.create_proposal(NewProposal {
                governance_model: model,
                quorum_threshold: quorum,
                approval_threshold: approval,
                voting_deadline,
                metadata: ProposalMetadata {
                    title,
                    description,
                    initiator_id: initiator.map(VoterId::new),
                    stakeholder_cooperatives: cooperatives,
                },
            })?;
            let proposal = engine.get_proposal(&id)?;
            let remaining = proposal.voting_deadline.secs_until(engine.clock().now());
            Ok(json!({
                "proposal_id": id,
                "status": proposal.status,
                "voting_deadline": proposal.voting_deadline,
                "closes_in": remaining,
                "closes_in_human": format_duration(remaining),
            }))
        }

        Command::Vote {
            proposal,
            voter,
            vote_type,
            weight,
            delegate_to,
        } => {
            let ballot = Ballot {
                proposal_id: proposal,
                voter_id: VoterId::new(voter),
                vote_type,
                weight,
                delegate_to: delegate_to.map(VoterId::new),
            };
            let voter_id = ballot.voter_id.clone();
            let outcome = engine.cast_vote(ballot)?;
            Ok(json!({
                "proposal_id": proposal,
                "voter_id": voter_id,
                "vote_type": vote_type,
                "recorded": outcome == VoteWrite::Recorded,
            }))
        }

        Command::Results { proposal, preview } => {
            let results = if preview {
                engine.preview_results(&proposal)?
            } else {
                engine.get_results(&proposal)?
            };
            to_value(&results)
        }

        Command::Show { proposal, votes } => {
            let record = engine.get_proposal(&proposal)?;
            if votes {
                let votes = engine.list_votes(&proposal)?;
                Ok(json!({ "proposal": record, "votes": votes }))
            } else {
                to_value(&record)
            }
        }

        Command::Sweep => {
            let settled: Vec<_> = engine
                .finalize_expired()?
                .into_iter()
                .map(|(id, status)| json!({ "proposal_id": id, "status": status }))
                .collect();
            Ok(json!({ "settled": settled }))
        }

        Command::Config => Err(DaemonError::InvalidArgument(
            "config does not run against the store".into(),
        )),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value, DaemonError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use coopgov_governance::TallyPolicy;
    use coopgov_nullables::{NullClock, NullGovernanceStore, NullRegistry};
    use coopgov_types::{GovernanceModel, ProposalId, VoteType};

    type TestEngine = GovernanceEngine<NullGovernanceStore, NullRegistry, Arc<NullClock>>;

    fn engine(clock: &Arc<NullClock>) -> TestEngine {
        GovernanceEngine::new(
            NullGovernanceStore::new(),
            NullRegistry::with_default(3.0),
            Arc::clone(clock),
            TallyPolicy::default(),
        )
    }

    fn propose(title: &str) -> Command {
        Command::Propose {
            model: GovernanceModel::Majority,
            quorum: 0.5,
            approval: 0.5,
            deadline: None,
            closes_in: Some(7_200),
            title: title.into(),
            description: String::new(),
            initiator: Some("carol".into()),
            cooperatives: vec!["bakery".into()],
        }
    }

    fn proposal_id(output: &serde_json::Value) -> ProposalId {
        output["proposal_id"].as_str().unwrap().parse().unwrap()
    }

    #[test]
    fn propose_reports_closes_in() {
        let clock = Arc::new(NullClock::new(1_000));
        let engine = engine(&clock);
        let output = execute(&engine, propose("  New oven  ")).unwrap();

        assert_eq!(output["status"], "voting");
        assert_eq!(output["voting_deadline"], 8_200);
        assert_eq!(output["closes_in"], 7_200);
        assert_eq!(output["closes_in_human"], "2h 0m");

        let proposal = engine.get_proposal(&proposal_id(&output)).unwrap();
        assert_eq!(proposal.metadata.title, "New oven");
        assert_eq!(proposal.metadata.initiator_id, Some(VoterId::new("carol")));
    }

    #[test]
    fn blank_title_is_refused() {
        let clock = Arc::new(NullClock::new(1_000));
        let engine = engine(&clock);
        assert!(matches!(
            execute(&engine, propose("   ")),
            Err(DaemonError::InvalidArgument(_))
        ));
    }

    #[test]
    fn vote_then_results() {
        let clock = Arc::new(NullClock::new(1_000));
        let engine = engine(&clock);
        let id = proposal_id(&execute(&engine, propose("Shared van")).unwrap());

        for voter in ["a", "b"] {
            let output = execute(
                &engine,
                Command::Vote {
                    proposal: id,
                    voter: voter.into(),
                    vote_type: VoteType::Approve,
                    weight: 1.0,
                    delegate_to: None,
                },
            )
            .unwrap();
            assert_eq!(output["recorded"], true);
        }

        let preview = execute(&engine, Command::Results { proposal: id, preview: true }).unwrap();
        assert_eq!(preview["verdict"], "approved");
        assert_eq!(preview["status"], "voting");

        let results = execute(&engine, Command::Results { proposal: id, preview: false }).unwrap();
        assert_eq!(results["status"], "approved");
        assert_eq!(results["approve_weight"], 2.0);

        let shown = execute(&engine, Command::Show { proposal: id, votes: true }).unwrap();
        assert_eq!(shown["votes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn sweep_lists_settled_proposals() {
        let clock = Arc::new(NullClock::new(1_000));
        let engine = engine(&clock);
        let id = proposal_id(&execute(&engine, propose("Late fees")).unwrap());

        clock.advance(7_200);
        let output = execute(&engine, Command::Sweep).unwrap();
        let settled = output["settled"].as_array().unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0]["proposal_id"], id.to_string());
        assert_eq!(settled[0]["status"], "rejected");
    }
}
