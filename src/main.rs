use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inbox_planner::config::{Config, LlmProvider};
use inbox_planner::llm::create_completer;
use inbox_planner::planning::{
    execution_levels, fallback_plan, topological_order, validate, PlanRecord, Planner, TaskGraph,
};

#[derive(Parser)]
#[command(name = "inbox-planner")]
#[command(about = "Turn a goal into a validated plan of calendar, booking and email tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a goal and print the plan as JSON
    Plan {
        /// What the user wants done
        goal: String,
        /// Context as a JSON object
        #[arg(long, conflicts_with = "context_file")]
        context: Option<String>,
        /// Read context from a JSON file
        #[arg(long)]
        context_file: Option<PathBuf>,
        /// Fail instead of returning the fallback plan
        #[arg(long, default_value = "false")]
        strict: bool,
    },
    /// List the tools the planner can schedule
    Tools,
    /// Validate a task graph JSON file and print its execution order
    Validate {
        /// Path to a JSON file with a {"tasks": [...]} object
        file: PathBuf,
    },
    /// Print the fallback plan
    Fallback,
    /// Configure inbox-planner
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set API key
        #[arg(long)]
        api_key: Option<String>,
        /// Set model
        #[arg(long)]
        model: Option<String>,
        /// Set completion provider
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Openai,
    Ollama,
    OpenaiGeneric,
    Offline,
}

impl From<ProviderArg> for LlmProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => LlmProvider::OpenAI,
            ProviderArg::Ollama => LlmProvider::Ollama,
            ProviderArg::OpenaiGeneric => LlmProvider::OpenAIGeneric,
            ProviderArg::Offline => LlmProvider::Offline,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inbox_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            goal,
            context,
            context_file,
            strict,
        } => {
            let context = load_context(context, context_file)?;
            run_plan(&goal, context.as_ref(), strict).await?;
        }
        Commands::Tools => list_tools()?,
        Commands::Validate { file } => validate_file(file)?,
        Commands::Fallback => print_json(&fallback_plan())?,
        Commands::Config {
            show,
            api_key,
            model,
            provider,
        } => handle_config(show, api_key, model, provider)?,
    }

    Ok(())
}

async fn run_plan(goal: &str, context: Option<&Map<String, Value>>, strict: bool) -> Result<()> {
    let config = Config::load()?;
    let completer = create_completer(&config.llm)?;

    let mut planner = Planner::new(config.registry().into(), completer)
        .with_prompt_logging(config.planner.log_prompts);
    if let Some(timeout) = config.planner.completion_timeout() {
        planner = planner.with_timeout(timeout);
    }

    let graph = if strict {
        planner
            .try_plan(goal, context)
            .await
            .context("Planning failed")?
    } else {
        let outcome = planner.plan_with_outcome(goal, context).await;
        if outcome.is_fallback() {
            eprintln!("note: returned the fallback plan");
        }
        outcome.graph
    };

    print_json(&PlanRecord::new(goal, graph))
}

fn load_context(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<Map<String, Value>>> {
    let raw = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?,
        (None, None) => return Ok(None),
    };

    let context = serde_json::from_str(&raw).context("Context must be a JSON object")?;
    Ok(Some(context))
}

fn list_tools() -> Result<()> {
    let registry = Config::load()?.registry();
    for tool in registry.all_tools() {
        println!("{}", tool.name);
        println!("    {}", tool.description);
        if !tool.inputs.is_empty() {
            let inputs: Vec<String> = tool
                .inputs
                .iter()
                .map(|(name, hint)| format!("{}: {}", name, hint))
                .collect();
            println!("    inputs:  {}", inputs.join(", "));
        }
        if !tool.outputs.is_empty() {
            println!("    outputs: {}", tool.outputs.join(", "));
        }
    }
    Ok(())
}

fn validate_file(path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let graph: TaskGraph = serde_json::from_str(&content).context("Failed to parse task graph")?;

    let registry = Config::load()?.registry();
    let graph = validate(graph, &registry)?;

    println!("✓ {} tasks, {} dependencies", graph.len(), graph.edge_count());
    println!("\nExecution order:");
    for (i, task) in topological_order(&graph.tasks)?.iter().enumerate() {
        println!("  {}. {} [{}] {}", i + 1, task.task_id, task.tool, task.title);
    }

    println!("\nParallel waves:");
    for (i, wave) in execution_levels(&graph.tasks)?.iter().enumerate() {
        let ids: Vec<&str> = wave.iter().map(|t| t.task_id.as_str()).collect();
        println!("  {}: {}", i + 1, ids.join(", "));
    }

    Ok(())
}

fn handle_config(
    show: bool,
    api_key: Option<String>,
    model: Option<String>,
    provider: Option<ProviderArg>,
) -> Result<()> {
    let mut config = Config::load()?;
    let changed = api_key.is_some() || model.is_some() || provider.is_some();

    if let Some(key) = api_key {
        config.llm.api_key = Some(key);
    }
    if let Some(m) = model {
        config.llm.model = m;
    }
    if let Some(p) = provider {
        config.llm.provider = p.into();
    }

    if changed {
        config.save()?;
        println!("Configuration saved to {}", Config::config_path()?.display());
    }

    if show || !changed {
        let mut shown = config.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("***".to_string());
        }
        println!("{}", toml::to_string_pretty(&shown)?);
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
