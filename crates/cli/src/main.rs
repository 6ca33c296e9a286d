mod config;
mod error;
mod prompt;
mod prompter;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use policy::ApprovalGate;
use runtime::{AnyBackend, Backend, CachedBackend, Conversation, ManifestLoader, Message, ToolRegistry};
use storage::ResponseCache;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{ConfigLoader, Overrides, Settings};
use error::Result;
use prompt::PromptFile;

#[derive(Parser)]
#[command(name = "runprompt")]
#[command(about = "Run a prompt file against an LLM, letting it call local tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Prompt file to run; template variables are read as JSON from stdin
    #[arg(required_unless_present = "clear_cache")]
    prompt: Option<PathBuf>,

    /// Model as provider/name, e.g. openai/gpt-4o or anthropic/claude-sonnet-4-20250514
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible server to send requests to
    #[arg(long)]
    base_url: Option<String>,

    /// Tools to offer: calculator, source.* or source.name (repeatable, comma-separated)
    #[arg(long = "tools", visible_alias = "tool", value_delimiter = ',')]
    tools: Vec<String>,

    /// Directory to search for tool sources (repeatable)
    #[arg(long)]
    tool_path: Vec<PathBuf>,

    /// Run tools marked safe without asking
    #[arg(long)]
    safe_yes: bool,

    /// Answer repeated requests from the response cache
    #[arg(long)]
    cache: bool,

    /// Remove every cached response
    #[arg(long)]
    clear_cache: bool,

    /// Directory holding the response cache
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Model requests allowed per run (0 for no limit)
    #[arg(long)]
    max_turns: Option<usize>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            tools: self.tools.clone(),
            tool_path: self.tool_path.clone(),
            safe_yes: self.safe_yes.then_some(true),
            cache: self.cache.then_some(true),
            cache_dir: self.cache_dir.clone(),
            max_turns: self.max_turns,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `RUNPROMPT_LOG` wins over `-v`. Logs go to stderr; stdout is the answer.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("RUNPROMPT_LOG").unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let loader = ConfigLoader::default();
    let overrides = cli.overrides();

    if cli.clear_cache {
        let settings = loader.load(None, &overrides)?;
        let removed = storage::clear_dir(settings.cache_dir()?)?;
        println!("Cleared {removed} cached responses");
    }

    let Some(path) = cli.prompt else {
        return Ok(());
    };

    let file = PromptFile::load(&path)?;
    let settings = loader.load(file.front_matter(), &overrides)?;
    debug!(model = %settings.model, tools = ?settings.tools, "loaded settings");

    let variables = read_variables()?;
    let mut messages = Vec::new();
    if let Some(system) = &file.meta.system {
        messages.push(Message::system(prompt::render(system, &variables)));
    }
    messages.push(Message::user(prompt::render(&file.body, &variables)));

    let registry = ToolRegistry::resolve(
        &settings.tools,
        &settings.tool_search_path(file.dir()),
        &ManifestLoader::new(settings.tool_timeout()),
    )?;
    let gate = ApprovalGate::new(settings.approval_policy(), prompter::terminal());
    let backend = AnyBackend::from_settings(&settings.backend())?;
    info!(%backend, tools = registry.len(), "running {}", path.display());

    let answer = if settings.cache {
        let cache = ResponseCache::open_dir(settings.cache_dir()?)?;
        converse(CachedBackend::new(backend, cache), registry, gate, &settings, messages).await?
    } else {
        converse(backend, registry, gate, &settings, messages).await?
    };

    println!("{answer}");
    Ok(())
}

async fn converse<B: Backend>(
    backend: B,
    registry: ToolRegistry,
    gate: ApprovalGate,
    settings: &Settings,
    messages: Vec<Message>,
) -> Result<String> {
    let mut conversation =
        Conversation::new(backend, registry, gate).with_max_turns(settings.max_turns);
    let answer = conversation.run(messages).await?;

    let usage = conversation.usage();
    info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "run finished"
    );
    Ok(answer)
}

/// Template variables from piped stdin. An interactive stdin has none.
fn read_variables() -> Result<serde_json::Map<String, serde_json::Value>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(serde_json::Map::new());
    }
    let mut input = String::new();
    stdin.lock().read_to_string(&mut input)?;
    Ok(prompt::variables_from_input(&input))
}
