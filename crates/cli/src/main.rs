use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use agents::{ChatClient, HttpAgent, HttpJudge};
use events::{Event, EventBus, EventEnvelope};
use orchestrator::{DebateOrchestrator, ExecutionResult, SinglePassOrchestrator};
use parley_core::{Agent, AgentClarifications, ClarificationItem, DebateStore, Judge};

mod config;

use config::ParleyConfig;

const PARLEY_DIR: &str = ".parley";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_NAME: &str = "parley.db";

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Multi-agent debate orchestrator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a .parley directory with a default config and database
    Init,
    /// Run a debate on a problem statement
    Run {
        problem: String,

        /// Additional context handed to every agent
        #[arg(short, long)]
        context: Option<String>,

        /// Override the configured number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Let agents ask clarifying questions before round one
        #[arg(long)]
        interactive: bool,

        /// Terminate early when the judge scores convergence above threshold
        #[arg(long)]
        convergence: bool,

        /// Run phases sequentially without the transition graph
        #[arg(long)]
        single_pass: bool,
    },
    /// Resume a suspended debate by answering its pending questions
    Resume { id: Uuid },
    /// List all debates
    List,
    /// Show one debate in full
    Show { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_project().await,
        Commands::Run {
            problem,
            context,
            rounds,
            interactive,
            convergence,
            single_pass,
        } => {
            run(
                &problem,
                context.as_deref(),
                rounds,
                interactive,
                convergence,
                single_pass,
            )
            .await
        }
        Commands::Resume { id } => resume(id).await,
        Commands::List => list().await,
        Commands::Show { id } => show(id).await,
    }
}

async fn init_project() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let parley_dir = cwd.join(PARLEY_DIR);

    if parley_dir.exists() {
        println!("Already initialized at {}", parley_dir.display());
        return Ok(());
    }

    tokio::fs::create_dir_all(&parley_dir).await?;

    let config = ParleyConfig::default();
    let config_path = parley_dir.join(CONFIG_FILE);
    tokio::fs::write(&config_path, toml::to_string_pretty(&config)?).await?;

    let db_path = parley_dir.join(DEFAULT_DB_NAME);
    let pool = db::create_pool(&format!("sqlite:{}", db_path.display())).await?;
    db::run_migrations(&pool).await?;

    println!();
    println!("Initialized Parley in {}", parley_dir.display());
    println!();
    println!("Created:");
    println!("  {}/", PARLEY_DIR);
    println!("  ├── {}", CONFIG_FILE);
    println!("  └── {}", DEFAULT_DB_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/{} to pick your agents and models", PARLEY_DIR, CONFIG_FILE);
    println!("  2. Export the API key named in [provider]");
    println!("  3. Run 'parley run \"your problem statement\"'");

    Ok(())
}

struct Project {
    config: ParleyConfig,
    store: Arc<dyn DebateStore>,
}

async fn open_project() -> Result<Project> {
    let cwd = std::env::current_dir()?;
    let parley_dir = cwd.join(PARLEY_DIR);
    if !parley_dir.exists() {
        bail!("No {} directory found. Run 'parley init' first.", PARLEY_DIR);
    }

    let config_path = parley_dir.join(CONFIG_FILE);
    let config = if config_path.exists() {
        ParleyConfig::load(&config_path).await?
    } else {
        ParleyConfig::default()
    };

    let db_path: PathBuf = parley_dir.join(DEFAULT_DB_NAME);
    let pool = db::create_pool(&format!("sqlite:{}", db_path.display()))
        .await
        .context("Failed to open database")?;
    db::run_migrations(&pool).await?;

    Ok(Project {
        config,
        store: Arc::new(db::DebateRepository::new(pool)),
    })
}

fn build_collaborators(config: &ParleyConfig) -> Result<(Vec<Arc<dyn Agent>>, Arc<dyn Judge>)> {
    let api_key = config.api_key()?;
    let client = ChatClient::new(api_key, config.provider.base_url.clone());

    let agents = config
        .agents
        .iter()
        .map(|entry| {
            Arc::new(HttpAgent::new(entry.profile(), client.clone())) as Arc<dyn Agent>
        })
        .collect();
    let judge = Arc::new(HttpJudge::new(config.judge.profile(), client)) as Arc<dyn Judge>;
    Ok((agents, judge))
}

async fn run(
    problem: &str,
    context: Option<&str>,
    rounds: Option<u32>,
    interactive: bool,
    convergence: bool,
    single_pass: bool,
) -> Result<()> {
    let project = open_project().await?;
    let (agents, judge) = build_collaborators(&project.config)?;
    let debate_config = project.config.debate_config(rounds, interactive, convergence);

    let bus = EventBus::new();
    spawn_progress_printer(bus.subscribe());

    if single_pass {
        let orch = SinglePassOrchestrator::new(Arc::clone(&project.store), agents, judge)
            .with_config(debate_config)
            .with_bus(bus);
        let result = orch.run(problem, context).await?;
        print_result(&result);
        return Ok(());
    }

    let orch = DebateOrchestrator::new(Arc::clone(&project.store), agents, judge)
        .with_config(debate_config)
        .with_bus(bus);

    let mut result = orch.run_debate(problem, context, None, None).await?;
    loop {
        match result {
            ExecutionResult::Completed { .. } => {
                print_result(&result);
                return Ok(());
            }
            ExecutionResult::Suspended { payload, .. } => {
                println!();
                println!("The agents have questions before they debate.");
                let answers = prompt_answers(&payload.questions)?;
                if answers.is_empty() {
                    println!();
                    println!(
                        "No answers given. Resume later with: parley resume {}",
                        payload.debate_id
                    );
                    return Ok(());
                }
                result = orch.resume(payload.debate_id, answers).await?;
            }
        }
    }
}

async fn resume(id: Uuid) -> Result<()> {
    let project = open_project().await?;
    let (agents, judge) = build_collaborators(&project.config)?;
    let debate_config = project.config.debate_config(None, true, false);

    let state = project
        .store
        .get_debate(id)
        .await?
        .with_context(|| format!("Debate {id} not found"))?;
    if !state.is_suspended() {
        bail!("Debate {id} is not suspended (status: {})", state.status.as_str());
    }

    let questions = state.clarifications.unwrap_or_default();
    let answers = prompt_answers(&questions)?;

    let bus = EventBus::new();
    spawn_progress_printer(bus.subscribe());

    let orch = DebateOrchestrator::new(Arc::clone(&project.store), agents, judge)
        .with_config(debate_config)
        .with_bus(bus);

    let mut result = orch.resume(id, answers).await?;
    loop {
        match result {
            ExecutionResult::Completed { .. } => {
                print_result(&result);
                return Ok(());
            }
            ExecutionResult::Suspended { payload, .. } => {
                println!();
                println!("The agents have follow-up questions.");
                let answers = prompt_answers(&payload.questions)?;
                if answers.is_empty() {
                    println!();
                    println!(
                        "No answers given. Resume later with: parley resume {}",
                        payload.debate_id
                    );
                    return Ok(());
                }
                result = orch.resume(payload.debate_id, answers).await?;
            }
        }
    }
}

async fn list() -> Result<()> {
    let project = open_project().await?;
    let debates = project.store.list_debates().await?;

    if debates.is_empty() {
        println!("No debates yet.");
        return Ok(());
    }

    println!();
    for debate in &debates {
        let icon = match debate.status.as_str() {
            "pending" => "○",
            "running" => "◑",
            "completed" => "●",
            "failed" => "✗",
            _ => "?",
        };
        let suspended = if debate.is_suspended() { " [suspended]" } else { "" };
        let mut problem = debate.problem.replace('\n', " ");
        if problem.len() > 60 {
            problem.truncate(57);
            problem.push_str("...");
        }
        println!(
            "  {} {} [{}{}] {}",
            icon,
            debate.id,
            debate.status.as_str(),
            suspended,
            problem
        );
    }
    println!();

    Ok(())
}

async fn show(id: Uuid) -> Result<()> {
    let project = open_project().await?;
    let debate = project
        .store
        .get_debate(id)
        .await?
        .with_context(|| format!("Debate {id} not found"))?;

    println!();
    println!("Debate {}", debate.id);
    println!("Status:   {}", debate.status.as_str());
    println!("Created:  {}", debate.created_at.to_rfc3339());
    println!("Problem:  {}", debate.problem);
    if let Some(context) = &debate.context {
        println!("Context:  {context}");
    }
    if let Some(node) = &debate.suspended_at_node {
        println!("Suspended at: {node}");
    }
    if let Some(error) = &debate.error {
        println!("Error:    {error}");
    }

    if let Some(groups) = &debate.clarifications {
        println!();
        println!("Clarifications:");
        for group in groups {
            for item in &group.items {
                let answer = if item.is_answered() {
                    item.answer.as_str()
                } else {
                    "(unanswered)"
                };
                println!("  [{}] {} -> {}", group.agent_name, item.question, answer);
            }
        }
    }

    for round in &debate.rounds {
        println!();
        println!("Round {}:", round.round_number);
        for c in &round.contributions {
            let target = c
                .target_agent_id
                .as_ref()
                .map(|t| format!(" -> {t}"))
                .unwrap_or_default();
            println!(
                "  {} {}{} ({} tokens, {}ms)",
                c.agent_id,
                c.kind.as_str(),
                target,
                c.metadata.tokens_used,
                c.metadata.latency_ms
            );
        }
    }

    if let Some(solution) = &debate.final_solution {
        println!();
        println!("Solution (by {}):", solution.model);
        println!("{}", solution.content);
        if let Some(confidence) = solution.confidence {
            println!();
            println!("Confidence: {confidence:.1}");
        }
    }
    println!();

    Ok(())
}

/// Prompt for each unanswered question on stdin. Empty input skips a
/// question; "NA" declines it explicitly.
fn prompt_answers(groups: &[AgentClarifications]) -> Result<Vec<AgentClarifications>> {
    let stdin = std::io::stdin();
    let mut answered = Vec::new();

    for group in groups {
        let mut items = Vec::new();
        for item in &group.items {
            if item.is_answered() {
                continue;
            }
            println!();
            println!("[{}] {}", group.agent_name, item.question);
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            stdin.read_line(&mut line)?;
            let answer = line.trim();
            if answer.is_empty() {
                continue;
            }
            items.push(ClarificationItem::new(&item.id, &item.question).with_answer(answer));
        }
        if !items.is_empty() {
            answered.push(
                AgentClarifications::new(&group.agent_id, &group.agent_name, &group.role)
                    .with_items(items),
            );
        }
    }

    Ok(answered)
}

fn print_result(result: &ExecutionResult) {
    let ExecutionResult::Completed {
        debate_id,
        solution,
        metadata,
        ..
    } = result
    else {
        return;
    };

    println!();
    println!("════════════════════════════════════════");
    println!("Debate {debate_id} completed");
    println!(
        "{} rounds in {:.1}s",
        metadata.total_rounds,
        metadata.duration_ms as f64 / 1000.0
    );
    println!("════════════════════════════════════════");
    println!();
    println!("{}", solution.content);
}

fn spawn_progress_printer(mut rx: broadcast::Receiver<EventEnvelope>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => print_event(envelope.event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn print_event(event: Event) {
    match event {
        Event::RoundStarted { round, .. } => {
            println!();
            println!("── Round {round} ──");
        }
        Event::ContributionAdded {
            agent_id, activity, ..
        } => {
            println!("  {agent_id}: {activity}");
        }
        Event::ContextSummarized {
            agent_id,
            chars_before,
            chars_after,
            ..
        } => {
            println!("  {agent_id}: context condensed {chars_before} -> {chars_after} chars");
        }
        Event::ConsensusEvaluated {
            confidence,
            threshold,
            ..
        } => {
            println!("  consensus confidence {confidence:.1} (threshold {threshold:.1})");
        }
        Event::DebateSuspended {
            pending_questions, ..
        } => {
            println!("  waiting for input ({pending_questions} questions)");
        }
        Event::EngineWarning { message, .. } => {
            eprintln!("  warning: {message}");
        }
        _ => {}
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info,orchestrator=info,agents=info,db=info".into()),
        )
        .init();
}
