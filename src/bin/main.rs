use clap::Parser;
use financial_doc_qa::{
    config::{AppConfig, SheetMode},
    extractor::FactExtractor,
    loader::DocumentLoader,
    matcher::EXAMPLE_QUESTIONS,
    session::{DebugReport, Session},
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qa")]
#[command(about = "Ask plain-language questions about a financial PDF or spreadsheet")]
#[command(version)]
struct Cli {
    /// PDF, XLSX or XLS file to load
    file: PathBuf,

    /// Question to answer; repeatable. Without any, questions are read from stdin
    #[arg(short, long = "question")]
    question: Vec<String>,

    /// Print the extracted text preview and every fact after loading
    #[arg(long)]
    debug: bool,

    /// Only read the first worksheet of a spreadsheet
    #[arg(long)]
    first_sheet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so answers stay clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("financial_doc_qa=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if cli.first_sheet {
        config.sheet_mode = SheetMode::First;
    }

    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    let bytes = std::fs::read(&cli.file)?;

    let loader = DocumentLoader::new(config.sheet_mode);
    let extractor = FactExtractor::new();
    let mut session = Session::new(config.history_limit);

    let summary = match session.ingest(&loader, &extractor, &file_name, &bytes) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Could not load {}: {}", file_name, e);
            return Err(Box::new(e));
        }
    };
    info!(file = %file_name, facts = summary.fact_count, "Document ready");

    println!("=== DOCUMENT ===");
    println!("File:   {}", summary.document.file_name);
    println!("Type:   {}", summary.document.format);
    println!("Size:   {:.1} KB", summary.document.size_kb());
    println!("SHA256: {}", summary.document.sha256);
    println!("\n{}", summary.message());
    for anomaly in &summary.anomalies {
        println!("  note: {}", anomaly);
    }

    if cli.debug {
        let report = session.debug_report(config.preview_chars)?;
        print_debug(&report);
    }

    if !cli.question.is_empty() {
        for question in &cli.question {
            let answer = session.ask(question)?;
            println!("\nQ: {}\nA: {}", question.trim(), answer.text);
        }
        return Ok(());
    }

    println!("\nTry asking:");
    for example in EXAMPLE_QUESTIONS {
        println!("  - {}", example);
    }
    println!("Commands: :history [N], :clear, :debug, exit");

    run_repl(&mut session, config.preview_chars)?;
    Ok(())
}

/// Read questions from stdin until EOF or `exit`
fn run_repl(session: &mut Session, preview_chars: usize) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            command if command.starts_with(":history") => {
                print_history(session, command.trim_start_matches(":history").trim())
            }
            ":clear" => {
                session.clear_history();
                println!("Chat history cleared.");
            }
            ":debug" => print_debug(&session.debug_report(preview_chars)?),
            question => {
                let answer = session.ask(question)?;
                println!("{}", answer.text);
            }
        }
    }

    Ok(())
}

/// `:history` prints everything, `:history N` the last N exchanges
fn print_history(session: &Session, count: &str) {
    let history = session.history();
    if history.is_empty() {
        println!("No questions asked yet.");
        return;
    }

    if count.is_empty() {
        print!("{}", history.formatted_transcript());
        return;
    }

    match count.parse::<usize>() {
        Ok(n) => {
            for exchange in history.recent(n).rev() {
                print!("{}", exchange.transcript_entry());
            }
        }
        Err(_) => println!("Usage: :history [N]"),
    }
}

fn print_debug(report: &DebugReport) {
    println!("\n=== DEBUG ===");
    println!("Status: {:?}", report.status);
    println!("Lines:  {}", report.line_count);
    if !report.sheet_names.is_empty() {
        println!("Sheets: {}", report.sheet_names.join(", "));
    }
    for anomaly in &report.anomalies {
        println!("Anomaly: {}", anomaly);
    }

    println!("\n--- Text preview{} ---", if report.truncated { " (truncated)" } else { "" });
    println!("{}", report.text_preview);

    println!("\n--- Facts ---");
    if report.facts.is_empty() {
        println!("(none)");
    }
    for (category, facts) in report.facts.iter() {
        for fact in facts {
            println!(
                "{:<12} {:<40} {}",
                category.to_string(),
                fact.label,
                financial_doc_qa::matcher::format_value(fact)
            );
        }
    }
}
