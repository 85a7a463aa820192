use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docqa_answer::RemoteGenerator;
use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_core::traits::Generator;
use docqa_embed::embedder_from_settings;
use docqa_index::VectorIndex;
use docqa_loader::DocumentFormat;
use docqa_pipeline::QaSession;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|ask|chat> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let mut settings = config.settings()?;
    let (cmd, mut args) = parse_args();
    if let Some(k) = take_flag_value(&mut args, "-k") {
        settings.retrieval.top_k = k.parse()?;
    }
    let format_flag = take_flag_value(&mut args, "--format");

    let rt = tokio::runtime::Runtime::new()?;
    match cmd.as_str() {
        "ingest" => {
            let file = require_arg(&args, 0, "docqa-cli ingest <file> [--format txt|md|docx]");
            rt.block_on(ingest(&settings, Path::new(&file), format_flag.as_deref()))?;
        }
        "ask" => {
            let question = require_arg(&args, 0, "docqa-cli ask \"<question>\" [-k N]");
            rt.block_on(ask(&settings, &question))?;
        }
        "chat" => {
            let file = require_arg(&args, 0, "docqa-cli chat <file> [--format txt|md|docx]");
            rt.block_on(chat(&settings, Path::new(&file), format_flag.as_deref()))?;
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn take_flag_value(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    if pos + 1 >= args.len() {
        eprintln!("{} requires a value", flag);
        std::process::exit(1);
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Some(value)
}

fn require_arg(args: &[String], pos: usize, usage: &str) -> String {
    args.get(pos).cloned().unwrap_or_else(|| {
        eprintln!("Usage: {}", usage);
        std::process::exit(1)
    })
}

fn resolve_format(path: &Path, flag: Option<&str>) -> anyhow::Result<DocumentFormat> {
    let ext = match flag {
        Some(f) => f.to_string(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("cannot infer format of {}; pass --format", path.display()))?,
    };
    Ok(DocumentFormat::from_extension(&ext)?)
}

fn index_path(settings: &Settings) -> PathBuf {
    let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_with_base(&base, &settings.data.index_path)
}

fn build_session(settings: &Settings) -> anyhow::Result<QaSession> {
    let embedder = embedder_from_settings(settings)?;
    let generator: Arc<dyn Generator> = Arc::new(RemoteGenerator::new(
        settings.generation.clone(),
        settings.retry.clone(),
        settings
            .credentials
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("credentials.api_key is required to generate answers"))?,
    )?);
    Ok(QaSession::new(embedder, generator, settings.clone()))
}

async fn ingest(settings: &Settings, file: &Path, format_flag: Option<&str>) -> anyhow::Result<()> {
    let format = resolve_format(file, format_flag)?;
    let bytes = fs::read(file)?;

    let embedder = embedder_from_settings(settings)?;
    let embedder_id = embedder.embedder_id();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Embedding segments from {}", file.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    // Build through the loader/index directly so the index can be persisted.
    let loader = docqa_loader::Loader::new(settings.chunking.clone());
    let segments = loader.load(&bytes, format)?;
    let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    let index = VectorIndex::build(segments.into_iter().zip(embeddings).collect(), embedder_id)?;
    pb.finish_with_message(format!("Indexed {} segments (dim {})", index.len(), index.dim()));

    let out = index_path(settings);
    index.save(&out)?;
    println!("Index written to {}", out.display());
    Ok(())
}

async fn ask(settings: &Settings, question: &str) -> anyhow::Result<()> {
    let session = build_session(settings)?;
    let embedder = embedder_from_settings(settings)?;
    let embedder_id = embedder.embedder_id();
    let path = index_path(settings);
    let index = VectorIndex::load(&path, Some(embedder_id.as_str()))?;
    session.attach_index(Arc::new(index));

    let answer = session.ask(question).await?;
    print_answer(&answer);
    Ok(())
}

async fn chat(settings: &Settings, file: &Path, format_flag: Option<&str>) -> anyhow::Result<()> {
    let format = resolve_format(file, format_flag)?;
    let bytes = fs::read(file)?;
    let session = build_session(settings)?;
    let stats = session.index_document(&bytes, format).await?;
    println!("Loaded {} segments from {}. Ask away (empty line quits).", stats.segments, file.display());

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }
        // A failed question leaves the session and index usable.
        match session.ask(question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("Question failed: {}", e),
        }
    }
    Ok(())
}

fn print_answer(answer: &docqa_core::types::Answer) {
    println!("{}", answer.text);
    if !answer.grounded {
        eprintln!("(warning: no grounding context was found; answer is not document-backed)");
    }
}
