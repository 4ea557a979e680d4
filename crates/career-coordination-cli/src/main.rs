// crates/career-coordination-cli/src/main.rs
// ============================================================================
// Module: Career Coordination CLI Entry Point
// Description: Command dispatcher for local pipelines and the MCP server.
// Purpose: Drive match, ingest, tokenize, index, interaction, audit, and
//          decision operations from the shell.
// Dependencies: career-coordination-core, career-coordination-mcp,
//               career-coordination-store-sqlite, clap, serde_json, tokio
// ============================================================================

//! ## Overview
//! The CLI composes the same backends as the MCP server (flag-selected
//! in-memory or SQLite storage) and runs the core pipelines directly. Demo
//! commands inject counter identifiers and a fixed clock so repeated runs are
//! byte-identical; `serve` switches to system providers unless the config
//! says otherwise. Errors print a one-line diagnostic to stderr and exit
//! non-zero.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "The CLI surfaces results and diagnostics on stdio by design."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use career_coordination_core::app::IndexBuildPipelineRequest;
use career_coordination_core::app::IngestResumePipelineRequest;
use career_coordination_core::app::InteractionTransitionRequest;
use career_coordination_core::app::MatchPipelineRequest;
use career_coordination_core::app::fetch_audit_trace;
use career_coordination_core::app::fetch_decision;
use career_coordination_core::app::list_decisions_by_trace;
use career_coordination_core::app::record_match_decision;
use career_coordination_core::app::run_index_build_pipeline;
use career_coordination_core::app::run_ingest_resume_pipeline;
use career_coordination_core::app::run_interaction_transition;
use career_coordination_core::app::run_match_pipeline;
use career_coordination_core::audit::verify_audit_chain;
use career_coordination_core::constitution::ConstitutionOverrideRequest;
use career_coordination_core::constitution::OVERRIDE_BINDING_ALG;
use career_coordination_core::core::identifiers::AtomId;
use career_coordination_core::core::identifiers::ContactId;
use career_coordination_core::core::identifiers::DecisionId;
use career_coordination_core::core::identifiers::InteractionId;
use career_coordination_core::core::identifiers::OpportunityId;
use career_coordination_core::core::identifiers::ResumeId;
use career_coordination_core::core::identifiers::TraceId;
use career_coordination_core::core::providers::DeterministicIdGenerator;
use career_coordination_core::core::providers::FixedClock;
use career_coordination_core::domain::ExperienceAtom;
use career_coordination_core::domain::InteractionEvent;
use career_coordination_core::domain::Opportunity;
use career_coordination_core::domain::Requirement;
use career_coordination_core::indexing::IndexScope;
use career_coordination_core::ingest::DefaultResumeIngestor;
use career_coordination_core::matching::MatchStrategy;
use career_coordination_core::tokenization::DeterministicLexicalTokenizer;
use career_coordination_core::tokenization::ResumeTokenStore;
use career_coordination_core::tokenization::TokenizationProvider;
use career_coordination_mcp::McpServer;
use career_coordination_mcp::ServerConfig;
use career_coordination_mcp::ServerState;
use career_coordination_mcp::VectorBackend;
use career_coordination_store_sqlite::RuntimeSnapshot;
use career_coordination_store_sqlite::SqliteDb;
use career_coordination_store_sqlite::SqliteResumeTokenStore;
use career_coordination_store_sqlite::SqliteRuntimeSnapshotStore;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed timestamp injected for deterministic command runs.
const DEMO_CLOCK: &str = "2026-01-01T00:00:00Z";

// ============================================================================
// SECTION: Argument Types
// ============================================================================

/// Matching strategy flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum StrategyArg {
    /// Lexical-only scoring.
    #[default]
    Lexical,
    /// Hybrid lexical + embedding scoring.
    Hybrid,
}

impl StrategyArg {
    /// Converts the flag into the core strategy.
    const fn to_strategy(self) -> MatchStrategy {
        match self {
            Self::Lexical => MatchStrategy::DeterministicLexicalV01,
            Self::Hybrid => MatchStrategy::HybridLexicalEmbeddingV02,
        }
    }
}

/// Vector backend flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum VectorBackendArg {
    /// Ephemeral in-memory vector index.
    #[default]
    Inmemory,
    /// Durable SQLite vector index.
    Sqlite,
}

/// Index scope flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum ScopeArg {
    /// Atoms only.
    Atoms,
    /// Resumes only.
    Resumes,
    /// Opportunities only.
    Opps,
    /// Every artifact type.
    #[default]
    All,
}

impl ScopeArg {
    /// Converts the flag into the core scope.
    const fn to_scope(self) -> IndexScope {
        match self {
            Self::Atoms => IndexScope::Atoms,
            Self::Resumes => IndexScope::Resumes,
            Self::Opps => IndexScope::Opportunities,
            Self::All => IndexScope::All,
        }
    }
}

/// Interaction event flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EventArg {
    /// Draft -> Ready.
    Prepare,
    /// Ready -> Sent.
    Send,
    /// Sent -> Responded.
    ReceiveReply,
    /// Any non-terminal state -> Closed.
    Close,
}

impl EventArg {
    /// Converts the flag into the domain event.
    const fn to_event(self) -> InteractionEvent {
        match self {
            Self::Prepare => InteractionEvent::Prepare,
            Self::Send => InteractionEvent::Send,
            Self::ReceiveReply => InteractionEvent::ReceiveReply,
            Self::Close => InteractionEvent::Close,
        }
    }
}

// ============================================================================
// SECTION: Command Line
// ============================================================================

/// Shared storage flags.
#[derive(Debug, Clone, clap::Args)]
struct StorageArgs {
    /// Path to the SQLite database file (omit for in-memory storage).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Vector index backend.
    #[arg(long, value_enum, default_value_t = VectorBackendArg::Inmemory)]
    vector_backend: VectorBackendArg,
    /// Directory for the SQLite vector index file.
    #[arg(long)]
    vector_db_path: Option<PathBuf>,
}

/// Career coordination command-line interface.
#[derive(Debug, Parser)]
#[command(name = "career-coordination", version, about = "Deterministic career coordination engine")]
struct Cli {
    /// Selected command.
    #[command(subcommand)]
    command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run the deterministic demo match with constitutional validation.
    Match {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Matching strategy.
        #[arg(long, value_enum, default_value_t = StrategyArg::Lexical)]
        matching_strategy: StrategyArg,
        /// Rule ID to override (requires --operator and --reason).
        #[arg(long)]
        override_rule: Option<String>,
        /// Operator authorizing the override (requires --override-rule).
        #[arg(long)]
        operator: Option<String>,
        /// Human-readable reason for the override (requires --override-rule).
        #[arg(long)]
        reason: Option<String>,
    },
    /// Ingest a resume file into the resume store.
    Ingest {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Path to the resume file (md or txt).
        input_path: String,
        /// Skip persisting the ingested resume.
        #[arg(long)]
        no_persist: bool,
    },
    /// Derive and store the token IR for an ingested resume.
    Tokenize {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Resume identifier to tokenize.
        resume_id: String,
        /// Keep common English stop words.
        #[arg(long)]
        keep_stop_words: bool,
    },
    /// Build or refresh the embedding vector index.
    IndexBuild {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Artifact scope to index.
        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,
    },
    /// Apply an interaction state transition.
    Interaction {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Interaction identifier.
        interaction_id: String,
        /// Event to apply.
        #[arg(value_enum)]
        event: EventArg,
        /// Idempotency key deduplicating retries.
        idempotency_key: String,
        /// Create the interaction in Draft before applying the event.
        #[arg(long)]
        create: bool,
    },
    /// Fetch a trace's audit events and verify its hash chain.
    Audit {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Trace identifier to fetch.
        trace_id: String,
    },
    /// Decision record queries.
    Decision {
        /// Shared storage flags.
        #[command(flatten)]
        storage: StorageArgs,
        /// Decision subcommand.
        #[command(subcommand)]
        action: DecisionAction,
    },
    /// Run the MCP server on stdio.
    Serve {
        /// Path to a TOML server configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Shared storage flags (ignored when --config is given).
        #[command(flatten)]
        storage: StorageArgs,
    },
}

/// Decision query subcommands.
#[derive(Debug, Subcommand)]
enum DecisionAction {
    /// Fetch one decision record.
    Get {
        /// Decision identifier.
        decision_id: String,
    },
    /// List decision records for a trace.
    List {
        /// Trace identifier.
        trace_id: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying the one-line diagnostic.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct CliError(String);

impl CliError {
    /// Builds a diagnostic from any displayable error.
    fn from_display(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}

// ============================================================================
// SECTION: Composition
// ============================================================================

/// Converts storage flags into a validated server configuration.
fn storage_config(storage: &StorageArgs) -> Result<ServerConfig, CliError> {
    let config = ServerConfig {
        db_path: storage.db.clone(),
        vector_backend: match storage.vector_backend {
            VectorBackendArg::Inmemory => VectorBackend::Inmemory,
            VectorBackendArg::Sqlite => VectorBackend::Sqlite,
        },
        vector_db_path: storage.vector_db_path.clone(),
        ..ServerConfig::default()
    };
    config.validate().map_err(CliError::from_display)?;
    Ok(config)
}

/// Builds backend state with deterministic providers for local commands.
fn deterministic_state(storage: &StorageArgs) -> Result<ServerState, CliError> {
    let config = storage_config(storage)?;
    let mut state = ServerState::from_config(&config).map_err(CliError::from_display)?;
    state.id_gen = Box::new(DeterministicIdGenerator::new());
    state.clock = Box::new(FixedClock::new(DEMO_CLOCK));
    Ok(state)
}

// ============================================================================
// SECTION: Main
// ============================================================================

/// Entry point: parse arguments, run the command, report one-line failures.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatches one parsed command.
fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Match {
            storage,
            matching_strategy,
            override_rule,
            operator,
            reason,
        } => cmd_match(&storage, matching_strategy, override_rule, operator, reason),
        Command::Ingest {
            storage,
            input_path,
            no_persist,
        } => cmd_ingest(&storage, &input_path, no_persist),
        Command::Tokenize {
            storage,
            resume_id,
            keep_stop_words,
        } => cmd_tokenize(&storage, &resume_id, keep_stop_words),
        Command::IndexBuild { storage, scope } => cmd_index_build(&storage, scope),
        Command::Interaction {
            storage,
            interaction_id,
            event,
            idempotency_key,
            create,
        } => cmd_interaction(&storage, &interaction_id, event, &idempotency_key, create),
        Command::Audit { storage, trace_id } => cmd_audit(&storage, &trace_id),
        Command::Decision { storage, action } => cmd_decision(&storage, &action),
        Command::Serve { config, storage } => cmd_serve(config, &storage),
    }
}

// ============================================================================
// SECTION: Match Command
// ============================================================================

/// Seeds the demo scenario and runs the match + validation pipeline.
fn cmd_match(
    storage: &StorageArgs,
    strategy: StrategyArg,
    override_rule: Option<String>,
    operator: Option<String>,
    reason: Option<String>,
) -> Result<(), CliError> {
    // The override flags are an all-or-nothing set; a partial set is a usage
    // error with no implicit defaults.
    let has_any = override_rule.is_some() || operator.is_some() || reason.is_some();
    let override_request = match (override_rule, operator, reason) {
        (Some(rule_id), Some(operator_id), Some(reason)) => Some(ConstitutionOverrideRequest {
            rule_id,
            operator_id,
            reason,
            // The validation pipeline binds the hash to the artifact.
            payload_hash: String::new(),
            binding_hash_alg: OVERRIDE_BINDING_ALG.to_string(),
        }),
        (None, None, None) => None,
        _ => {
            return Err(CliError(
                "--override-rule requires both --operator and --reason".to_string(),
            ));
        }
    };
    if has_any {
        if let Some(request) = &override_request {
            eprintln!(
                "Constitutional override: rule={} operator={}",
                request.rule_id, request.operator_id
            );
        }
    }

    let state = deterministic_state(storage)?;
    seed_demo(&state)?;

    let pipeline_request = MatchPipelineRequest {
        opportunity_id: Some(OpportunityId::new("opp-demo")),
        strategy: strategy.to_strategy(),
        override_request,
        ..MatchPipelineRequest::default()
    };
    let services = state.services();
    let response = run_match_pipeline(
        &pipeline_request,
        &services,
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )
    .map_err(CliError::from_display)?;
    let decision_id = record_match_decision(
        &response,
        state.decisions.as_ref(),
        &services,
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )
    .map_err(CliError::from_display)?;

    let report = &response.match_report;
    let out = json!({
        "opportunity_id": report.opportunity_id.as_str(),
        "strategy": report.strategy,
        "scores": {
            "lexical": report.breakdown.lexical,
            "semantic": report.breakdown.semantic,
            "bonus": report.breakdown.bonus,
            "final": report.breakdown.final_score,
        },
        "matched_atoms": report.matched_atoms.iter().map(AtomId::as_str).collect::<Vec<_>>(),
        "missing_requirements": report.missing_requirements,
        "validation_status": response.validation_report.status.as_str(),
        "decision_id": decision_id.as_str(),
    });
    println!("{}", serde_json::to_string_pretty(&out).map_err(CliError::from_display)?);

    println!("\n--- Audit Trail (trace_id={}) ---", response.trace_id);
    for event in
        fetch_audit_trace(&response.trace_id, &services).map_err(CliError::from_display)?
    {
        println!("{} [{}] {}", event.created_at, event.event_type, event.payload);
    }
    Ok(())
}

/// Seeds the demo opportunity and atoms used by `match`.
fn seed_demo(state: &ServerState) -> Result<(), CliError> {
    state
        .opportunities
        .upsert(&Opportunity {
            opportunity_id: OpportunityId::new("opp-demo"),
            company: "ExampleCo".to_string(),
            role_title: "Principal Architect".to_string(),
            source: "manual".to_string(),
            requirements: vec![
                Requirement::new("C++20", vec!["cpp".to_string(), "cpp20".to_string()], true),
                Requirement::new(
                    "Architecture experience",
                    vec!["architecture".to_string()],
                    true,
                ),
            ],
        })
        .map_err(CliError::from_display)?;
    state
        .atoms
        .upsert(&ExperienceAtom {
            atom_id: AtomId::new("atom-architecture"),
            domain: "architecture".to_string(),
            title: "Architecture Leadership".to_string(),
            claim: "Led architecture decisions".to_string(),
            tags: vec!["architecture".to_string(), "governance".to_string()],
            verified: true,
            evidence_refs: Vec::new(),
        })
        .map_err(CliError::from_display)?;
    state
        .atoms
        .upsert(&ExperienceAtom {
            atom_id: AtomId::new("atom-cpp"),
            domain: "cpp".to_string(),
            title: "Modern C++".to_string(),
            claim: "Built C++20 systems".to_string(),
            tags: vec!["cpp20".to_string(), "systems".to_string()],
            verified: true,
            evidence_refs: Vec::new(),
        })
        .map_err(CliError::from_display)?;
    Ok(())
}

// ============================================================================
// SECTION: Ingest and Tokenize Commands
// ============================================================================

/// Ingests one resume file.
fn cmd_ingest(storage: &StorageArgs, input_path: &str, no_persist: bool) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    let request = IngestResumePipelineRequest {
        input_path: input_path.to_string(),
        persist: !no_persist,
        trace_id: None,
    };
    let ingestor = DefaultResumeIngestor::new();
    let response = run_ingest_resume_pipeline(
        &request,
        &ingestor,
        state.resumes.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )
    .map_err(CliError::from_display)?;

    println!(
        "{}",
        json!({
            "resume_id": response.resume_id.as_str(),
            "resume_hash": response.resume_hash,
            "source_hash": response.source_hash,
            "trace_id": response.trace_id.as_str(),
        })
    );
    Ok(())
}

/// Derives and stores the token IR for a stored resume.
fn cmd_tokenize(
    storage: &StorageArgs,
    resume_id: &str,
    keep_stop_words: bool,
) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    let resume_id = ResumeId::new(resume_id);
    let resume = state
        .resumes
        .get(&resume_id)
        .map_err(CliError::from_display)?
        .ok_or_else(|| CliError(format!("Resume not found: {resume_id}")))?;

    let tokenizer = DeterministicLexicalTokenizer::new(!keep_stop_words);
    let ir = tokenizer.tokenize(&resume.resume_md, &resume.resume_hash);

    if let Some(db_path) = &storage.db {
        let db = SqliteDb::open(db_path).map_err(CliError::from_display)?;
        let token_store = SqliteResumeTokenStore::new(db);
        token_store.upsert(&resume_id, &ir).map_err(CliError::from_display)?;
    }

    let lexical_count = ir.tokens.get("lexical").map_or(0, Vec::len);
    println!(
        "{}",
        json!({
            "resume_id": resume_id.as_str(),
            "source_hash": ir.source_hash,
            "lexical_tokens": lexical_count,
            "persisted": storage.db.is_some(),
        })
    );
    Ok(())
}

// ============================================================================
// SECTION: Index Command
// ============================================================================

/// Runs one index build over the configured stores.
fn cmd_index_build(storage: &StorageArgs, scope: ScopeArg) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    let request = IndexBuildPipelineRequest {
        scope: scope.to_scope(),
        ..IndexBuildPipelineRequest::default()
    };
    let response = run_index_build_pipeline(
        &request,
        state.resumes.as_ref(),
        state.index_runs.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )
    .map_err(CliError::from_display)?;

    println!(
        "{}",
        json!({
            "run_id": response.result.run_id.as_str(),
            "indexed": response.result.indexed_count,
            "skipped": response.result.skipped_count,
            "stale": response.result.stale_count,
            "trace_id": response.trace_id.as_str(),
        })
    );
    Ok(())
}

// ============================================================================
// SECTION: Interaction Command
// ============================================================================

/// Applies one interaction transition, optionally creating the interaction.
fn cmd_interaction(
    storage: &StorageArgs,
    interaction_id: &str,
    event: EventArg,
    idempotency_key: &str,
    create: bool,
) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    let interaction_id = InteractionId::new(interaction_id);

    if create
        && !state.coordinator.create_interaction(
            &interaction_id,
            &ContactId::new("contact-local"),
            &OpportunityId::new("opp-local"),
        )
    {
        return Err(CliError(format!("Interaction already exists: {interaction_id}")));
    }

    let request = InteractionTransitionRequest {
        interaction_id,
        event: event.to_event(),
        idempotency_key: idempotency_key.to_string(),
        trace_id: None,
    };
    let response = run_interaction_transition(
        &request,
        state.coordinator.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )
    .map_err(CliError::from_display)?;

    println!(
        "{}",
        json!({
            "outcome": response.result.outcome.as_str(),
            "before_state": response.result.before_state.as_str(),
            "after_state": response.result.after_state.as_str(),
            "transition_index": response.result.transition_index,
            "trace_id": response.trace_id.as_str(),
        })
    );
    Ok(())
}

// ============================================================================
// SECTION: Audit Command
// ============================================================================

/// Prints a trace's events and its chain verification verdict.
fn cmd_audit(storage: &StorageArgs, trace_id: &str) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    let trace_id = TraceId::new(trace_id);
    let events =
        fetch_audit_trace(&trace_id, &state.services()).map_err(CliError::from_display)?;
    for event in &events {
        println!(
            "{:>3} {} [{}] {}",
            event.idx, event.created_at, event.event_type, event.payload
        );
    }

    let verification = verify_audit_chain(&events);
    if verification.valid {
        println!("chain: valid ({} events)", events.len());
        Ok(())
    } else {
        Err(CliError(format!(
            "audit chain invalid at index {}: {}",
            verification.first_invalid_index, verification.error
        )))
    }
}

// ============================================================================
// SECTION: Decision Command
// ============================================================================

/// Runs one decision query.
fn cmd_decision(storage: &StorageArgs, action: &DecisionAction) -> Result<(), CliError> {
    let state = deterministic_state(storage)?;
    match action {
        DecisionAction::Get { decision_id } => {
            let record = fetch_decision(&DecisionId::new(decision_id.clone()), state.decisions.as_ref())
                .map_err(CliError::from_display)?
                .ok_or_else(|| CliError(format!("Decision not found: {decision_id}")))?;
            println!("{}", record.to_json().map_err(CliError::from_display)?);
        }
        DecisionAction::List { trace_id } => {
            let records = list_decisions_by_trace(
                &TraceId::new(trace_id.clone()),
                state.decisions.as_ref(),
            )
            .map_err(CliError::from_display)?;
            for record in records {
                println!("{}", record.to_json().map_err(CliError::from_display)?);
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Runs the MCP server on stdio.
fn cmd_serve(config_path: Option<PathBuf>, storage: &StorageArgs) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|err| CliError(format!("{}: {err}", path.display())))?;
            ServerConfig::from_toml(&text).map_err(CliError::from_display)?
        }
        None => storage_config(storage)?,
    };

    // Startup diagnostics: every subsystem announces its operational mode,
    // and ephemeral fallbacks are loud WARNINGs so data loss on a production
    // server cannot be missed in operator logs.
    eprintln!("career-coordination-mcp MCP Server v0.3");
    if let Some(db_path) = &config.db_path {
        eprintln!("Storage:     SQLite -- {}", db_path.display());
    } else {
        eprintln!(
            "WARNING: No db_path configured. Running with EPHEMERAL in-memory storage.\n         All career data (atoms, opportunities, interactions, audit log)\n         will be LOST on process exit."
        );
    }
    if config.vector_backend == VectorBackend::Sqlite {
        if let Some(dir) = &config.vector_db_path {
            eprintln!("Vector:      SQLite -- {}/vectors.db", dir.display());
        }
    } else {
        eprintln!(
            "WARNING: In-memory vector index. The embedding index will be LOST on\n         process exit and hybrid matching will require re-embedding."
        );
    }
    eprintln!("Listening on stdio for JSON-RPC requests...");

    let state = ServerState::from_config(&config).map_err(CliError::from_display)?;

    // Freeze the effective configuration for later reproduction.
    if let Some(db_path) = &config.db_path {
        let db = SqliteDb::open(db_path).map_err(CliError::from_display)?;
        let snapshots = SqliteRuntimeSnapshotStore::new(db);
        let snapshot = RuntimeSnapshot {
            snapshot_id: state.id_gen.next("snapshot"),
            created_at: state.clock.now_iso8601(),
            snapshot_json: json!({
                "vector_backend": if config.vector_backend == VectorBackend::Sqlite { "sqlite" } else { "inmemory" },
                "strategy": config.matching.strategy,
                "k_lexical": config.matching.k_lexical,
                "k_embedding": config.matching.k_embedding,
                "embedding_dimension": config.embedding.dimension,
            })
            .to_string(),
        };
        snapshots.upsert(&snapshot).map_err(CliError::from_display)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .build()
        .map_err(CliError::from_display)?;
    let server = McpServer::new(state);
    runtime.block_on(server.run_stdio()).map_err(CliError::from_display)?;
    eprintln!("MCP Server shutting down");
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod main_tests;
