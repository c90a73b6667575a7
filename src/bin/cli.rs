use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use doc_analyzer_lib::analysis::report::{report_filename, report_json, ReportTable};
use doc_analyzer_lib::analysis::{AnalysisOutcome, Analyzer, NoticeLevel};
use doc_analyzer_lib::config::{AnalyzerConfig, DEFAULT_DB_FILE};
use doc_analyzer_lib::llm::gemini::DEFAULT_MODEL;
use doc_analyzer_lib::llm::GeminiClient;
use doc_analyzer_lib::{Database, UploadedDocument};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doc-analyzer-cli")]
#[command(version, about = "Classify a PDF with Gemini and check its required fields", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one PDF and store its field report
    Analyze {
        /// PDF file to analyze
        pdf: PathBuf,

        /// Gemini model name
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Directory for the `<name>_report.json` checklist
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Keep rows from earlier runs instead of recreating the table
        #[arg(long)]
        keep_existing: bool,

        /// Print the extracted text
        #[arg(long)]
        show_text: bool,

        /// Disable ANSI colours
        #[arg(long)]
        no_color: bool,
    },
    /// List stored documents
    History,
    /// Drop and recreate the documents table
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

// ── ANSI colour helpers ──────────────────────────────────────────────────────

struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }
    fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }
    fn yellow(&self, s: &str) -> String {
        self.paint("33", s)
    }
    fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }
    fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            pdf,
            model,
            out_dir,
            keep_existing,
            show_text,
            no_color,
        } => {
            let style = Style {
                color: !no_color && io::stdout().is_terminal(),
            };
            let config = AnalyzerConfig::from_env()?
                .model(model)
                .db_path(&cli.db)
                .reset_on_start(!keep_existing);
            analyze(&config, &pdf, &out_dir, show_text, &style).await
        }
        Commands::History => history(&cli.db),
        Commands::Reset { yes } => reset(&cli.db, yes),
    }
}

async fn analyze(
    config: &AnalyzerConfig,
    pdf: &Path,
    out_dir: &Path,
    show_text: bool,
    style: &Style,
) -> Result<()> {
    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;
    if config.reset_on_start {
        db.reset_schema().context("resetting documents table")?;
    }

    let doc = UploadedDocument::from_path(pdf)?;
    println!(
        "{} {} {}",
        style.green("✓"),
        style.bold(&doc.filename),
        style.dim(&format!("({} bytes)", doc.bytes.len()))
    );

    let model = GeminiClient::new(config.gemini());
    let outcome = Analyzer::new(&model, &db).analyze(&doc).await?;

    if let (true, Some(text)) = (show_text, outcome.text()) {
        println!("\n{}\n{}", style.bold("Extracted text"), text);
    }

    if let Some(classification) = outcome.classification() {
        println!("\n{}", style.bold("Document classification"));
        println!("Predicted type: {}", style.bold(&classification.display_label()));
        if let Some(confidence) = classification.confidence() {
            println!("Confidence: {}", style.bold(&format!("{confidence:.2}%")));
        }
    }

    if let Some(raw) = outcome.raw_output() {
        println!("\n{}\n{}", style.bold("Raw model output"), raw);
    }

    let report = outcome.report();
    if !report.is_empty() {
        let table = ReportTable::from_entries(report);
        println!(
            "\n{} {}",
            style.bold("Missing fields & recommendations"),
            style.dim(&format!("({} critical missing)", table.flagged_count()))
        );
        print!("{}", table.render_text(style.color));

        let path = out_dir.join(report_filename(&doc.filename));
        std::fs::write(&path, report_json(report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Checklist written to {}", path.display());
    }

    let notice = outcome.notice();
    let message = match notice.level {
        NoticeLevel::Success => style.green(&notice.message),
        NoticeLevel::Warning => style.yellow(&notice.message),
        NoticeLevel::Error => style.red(&notice.message),
    };
    println!("\n{message}");

    // The checklist is already on disk; only the database write failed.
    if matches!(outcome, AnalysisOutcome::NotStored { .. }) {
        bail!("document was not saved to {}", config.db_path.display());
    }
    Ok(())
}

fn history(db_path: &Path) -> Result<()> {
    let db = Database::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    let docs = db.list_documents()?;
    if docs.is_empty() {
        println!("No documents stored.");
        return Ok(());
    }
    for doc in docs {
        let fields = doc.field_report.as_ref().map_or(0, Vec::len);
        let missing = doc
            .field_report
            .iter()
            .flatten()
            .filter(|e| e.is_critical_missing())
            .count();
        println!(
            "{:>4}  {:<32}  {:<10}  {} fields, {} critical missing",
            doc.id,
            doc.filename,
            doc.predicted_type.as_deref().unwrap_or("-"),
            fields,
            missing
        );
    }
    Ok(())
}

fn reset(db_path: &Path, yes: bool) -> Result<()> {
    if !yes {
        print!(
            "Delete every stored document in {}? [y/N] ",
            db_path.display()
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            bail!("reset cancelled");
        }
    }
    let db = Database::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    db.reset_schema()?;
    println!("Documents table recreated.");
    Ok(())
}
