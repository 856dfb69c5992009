use std::env;
use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

use hybridrag_core::config::{Config, Settings};
use hybridrag_core::data_processor::{ChunkingConfig, DataProcessor};
use hybridrag_core::error::Error;
use hybridrag_core::types::Chunk;
use hybridrag_hybrid::{Answer, EngineModels, RetrievalEngine};
use hybridrag_models::{get_default_embedder, get_default_generator, get_default_scorer};

const USAGE: &str = "Usage: hybridrag [ask] | hybridrag query \"<question>\"";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return ("ask".to_string(), args);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Documents under `data.docs_dir`; an empty directory yields an empty corpus.
fn load_chunks(settings: &Settings) -> anyhow::Result<Vec<Chunk>> {
    let docs_dir = settings.data.docs_path();
    println!("Loading documents from: {}", docs_dir.display());
    let processor = DataProcessor::new(ChunkingConfig::from(&settings.data));
    match processor.process_directory(&docs_dir) {
        Ok(chunks) => Ok(chunks),
        Err(e @ Error::EmptyCorpus(_)) => {
            tracing::warn!("{e}; every question will be refused until documents are added");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn start_engine(settings: &Settings) -> anyhow::Result<RetrievalEngine> {
    let models = EngineModels {
        embedder: get_default_embedder(&settings.models)?,
        scorer: get_default_scorer(&settings.models)?,
        generator: get_default_generator(&settings.models)?,
    };
    let engine = RetrievalEngine::new(models, settings);
    let chunks = load_chunks(settings)?;
    engine.build(chunks).await?;
    Ok(engine)
}

fn print_answer(answer: &Answer) {
    println!("\n===== RETRIEVAL REPORT =====");
    println!("{}", answer.report);

    println!("\n===== ANSWER =====");
    println!("{}", answer.text);

    println!("\n===== SOURCES =====");
    if answer.sources.is_empty() {
        println!("No sources");
    } else {
        for source in &answer.sources {
            println!("- {source}");
        }
    }
    println!("Confidence: {:.2}", answer.confidence());
    println!("\n------------------------------------\n");
}

fn show_help() {
    println!("Commands:");
    println!("  /help     - Show this help message");
    println!("  /stats    - Show engine status and retrieval settings");
    println!("  /reload   - Reload documents and rebuild the indexes");
    println!("  /quit     - Exit (also: exit, quit)");
    println!("  <text>    - Ask a question about your documents");
}

async fn show_stats(engine: &RetrievalEngine) {
    let (retrieval, generation) = engine.settings();
    println!("Engine: {}", engine.status().await);
    println!(
        "Retrieval: k={} rerank_top_k={} max_per_source={} min_support={} parallel={}",
        retrieval.k, retrieval.rerank_top_k, retrieval.max_per_source, retrieval.min_support, retrieval.parallel
    );
    println!("Generation: max_length={}", generation.max_length);
}

async fn reload(engine: &RetrievalEngine, settings: &Settings) -> anyhow::Result<()> {
    let chunks = load_chunks(settings)?;
    let status = engine.build(chunks).await?;
    println!("Rebuilt: {status}");
    Ok(())
}

async fn interactive(settings: &Settings) -> anyhow::Result<()> {
    println!("====================================");
    println!(" HybridRAG System");
    println!("====================================");
    println!("Initializing system... (this may take a minute)\n");

    let engine = start_engine(settings).await?;

    println!("\nSystem ready! {}", engine.status().await);
    println!("Type your question (type 'exit' to quit, '/help' for commands)\n");

    loop {
        print!("Question: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "/quit" | "/q" => {
                println!("Exiting HybridRAG.");
                break;
            }
            "/help" | "/h" => show_help(),
            "/stats" | "/s" => show_stats(&engine).await,
            "/reload" => {
                if let Err(e) = reload(&engine, settings).await {
                    println!("Error during reload: {e:#}");
                }
            }
            _ => match engine.answer_question(input).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => println!("Error during processing: {e}"),
            },
        }
    }
    Ok(())
}

async fn one_shot(settings: &Settings, question: &str) -> anyhow::Result<()> {
    let engine = start_engine(settings).await?;
    let answer = engine.answer_question(question).await?;
    print_answer(&answer);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;

    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ask" => interactive(&settings).await,
        "query" => {
            let question = args.join(" ");
            if question.trim().is_empty() {
                eprintln!("{USAGE}");
                std::process::exit(1);
            }
            one_shot(&settings, &question).await
        }
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}\n{USAGE}", cmd);
            std::process::exit(1);
        }
    }
}
