//! `haven` command-line host.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use haven_rs::config::{HavenConfig, LayeredConfigOptions};
use haven_rs::core::{Orchestrator, build_index, build_provider};
use haven_rs::rag::{VectorIndex, embedder_from_config};
use haven_rs::speech::{RetentionPolicy, SpeechBridge, prune_artifacts};
use haven_rs::{ConversationState, init_logging};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the Haven host.
#[derive(Parser)]
#[command(name = "haven", version, about = "Grounded support companion")]
struct Cli {
    /// Extra haven.json5 layered on top of the discovered config files
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector index from the source directory
    Index {
        /// Rebuild even if an index already exists
        #[arg(long)]
        rebuild: bool,
    },
    /// Answer one question with no history
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Converse on stdin/stdout; `exit` or EOF ends the session
    Chat,
    /// Print the transcript of a WAV file
    Transcribe { audio: PathBuf },
    /// Synthesize speech and print the output path
    Speak {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Apply the audio retention policy
    PruneAudio,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Index { rebuild } => index(config, rebuild).await,
        Command::Ask { question } => {
            let orchestrator = Orchestrator::from_config(config)?;
            let (answer, _) = orchestrator
                .answer(&question.join(" "), ConversationState::new())
                .await?;
            println!("{answer}");
            Ok(())
        }
        Command::Chat => chat(config).await,
        Command::Transcribe { audio } => {
            let bridge = SpeechBridge::from_config(&config.speech)?;
            println!("{}", bridge.transcribe(&audio).await?);
            Ok(())
        }
        Command::Speak { text } => {
            let bridge = SpeechBridge::from_config(&config.speech)?;
            let path = bridge.synthesize(&text.join(" ")).await?;
            println!("{}", path.display());
            Ok(())
        }
        Command::PruneAudio => {
            let policy = RetentionPolicy::from(&config.speech.retention);
            if policy.keeps_everything() {
                info!("retention policy keeps everything; nothing to prune");
            }
            let removed =
                prune_artifacts(Path::new(&config.speech.synthesis.output_dir), &policy)?;
            println!("removed {removed} file(s)");
            Ok(())
        }
    }
}

fn load_config(runtime_path: Option<&Path>) -> anyhow::Result<HavenConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = runtime_path {
        info!("adding runtime config layer: {}", path.display());
        options = options.with_runtime_path(path);
    }
    let layered =
        HavenConfig::load_layered_with_options(options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    layered.config.validate().context("invalid config")?;
    Ok(layered.config)
}

async fn index(config: HavenConfig, rebuild: bool) -> anyhow::Result<()> {
    let llm = if config.embedder.provider == "llm" {
        Some(build_provider(&config.generation)?)
    } else {
        None
    };
    let embedder = embedder_from_config(&config.embedder, llm)?;
    let location = PathBuf::from(&config.index.path);
    let index = if rebuild || !VectorIndex::exists(&location) {
        build_index(&config, embedder).await?
    } else {
        VectorIndex::load(&location, embedder)?
    };
    println!(
        "index at {} holds {} chunk(s) embedded with {}",
        index.location().display(),
        index.len(),
        index.embedder_identity()
    );
    Ok(())
}

async fn chat(config: HavenConfig) -> anyhow::Result<()> {
    let orchestrator = Arc::new(Orchestrator::from_config(config)?);
    orchestrator.initialize().await?;
    let session = orchestrator.sessions().create_session();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        match orchestrator.answer_in_session(session, line).await {
            Ok(answer) => println!("Chatbot: {answer}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    let turns = orchestrator.sessions().get(session)?.len();
    if orchestrator.sessions().delete_session(session) {
        info!("chat ended (turns={})", turns);
    } else {
        bail!("chat session disappeared before shutdown");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_words_and_accepts_global_config() {
        let cli = Cli::try_parse_from([
            "haven",
            "ask",
            "how",
            "do",
            "I",
            "relax",
            "--config",
            "extra.json5",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("extra.json5")));
        match cli.command {
            Command::Ask { question } => assert_eq!(question.join(" "), "how do I relax"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn index_rebuild_flag() {
        let cli = Cli::try_parse_from(["haven", "index", "--rebuild"]).expect("parse");
        assert!(matches!(cli.command, Command::Index { rebuild: true }));
    }
}
