//! Codex - A terminal workspace for writing books

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codex_core::export::{export_file_name, export_markdown, write_export};
use codex_core::library::{read_backup, write_backup};
use codex_core::stats::{format_duration, pacing, readability, DashboardStats};
use codex_core::{Book, Config, LibraryStore, RenderBlock};
use codex_tui::App;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// A terminal workspace for writing books
#[derive(Parser, Debug)]
#[command(name = "codex")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the library (overrides storage.data_dir)
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print analytics for each book
    Stats {
        /// Only the book with this title
        #[arg(long)]
        book: Option<String>,
    },
    /// Print the preview blocks of a Markdown file
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Export a book as a single document
    Export {
        /// Title of the book to export
        #[arg(long)]
        book: String,
        /// Write HTML instead of Markdown
        #[arg(long)]
        html: bool,
        /// Output path (defaults to <data dir>/exports/<Title>.md)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Write the whole library to a JSON backup
    Backup {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Replace the library with the books in a JSON backup
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = Some(dir);
    }
    let store = LibraryStore::from_config(&config)?;

    match args.command {
        None => {
            init_file_logging(store.dir())?;
            log::info!("library at {}", store.dir().display());

            let app = App::new(config, store)?;
            codex_tui::run(app).context("TUI application error")?;
        }
        Some(command) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
                .init();
            run_command(command, &config, &store)?;
        }
    }

    Ok(())
}

/// Log to `codex.log` in the data directory so output never reaches the screen
fn init_file_logging(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    let path = dir.join("codex.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run_command(command: Command, config: &Config, store: &LibraryStore) -> Result<()> {
    match command {
        Command::Stats { book } => {
            let books = store.load_books()?;
            let selected: Vec<&Book> = match &book {
                Some(title) => vec![find_book(&books, title)?],
                None => books.iter().collect(),
            };
            for book in selected {
                print_stats(book, config);
            }
        }
        Command::Render { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let rendered = codex_core::render(&text);
            for block in &rendered.blocks {
                println!("{}", describe_block(block));
            }
        }
        Command::Export { book, html, out } => {
            let books = store.load_books()?;
            let book = find_book(&books, &book)?;
            let (contents, extension) = export_contents(book, html)?;
            let path = out.unwrap_or_else(|| {
                store
                    .dir()
                    .join("exports")
                    .join(export_file_name(&book.title, extension))
            });
            write_export(&path, &contents)?;
            println!("{}", path.display());
        }
        Command::Backup { path } => {
            let books = store.load_books()?;
            write_backup(&books, &path)?;
            println!("Backed up {} books to {}", books.len(), path.display());
        }
        Command::Import { path } => {
            let books = read_backup(&path)?;
            store.save_books(&books)?;
            println!("Imported {} books from {}", books.len(), path.display());
        }
    }
    Ok(())
}

fn find_book<'a>(books: &'a [Book], title: &str) -> Result<&'a Book> {
    books
        .iter()
        .find(|b| b.title.eq_ignore_ascii_case(title))
        .with_context(|| format!("No book titled {:?}", title))
}

#[cfg(feature = "html")]
fn export_contents(book: &Book, html: bool) -> Result<(String, &'static str)> {
    Ok(if html {
        (codex_core::export::export_html(book), "html")
    } else {
        (export_markdown(book), "md")
    })
}

#[cfg(not(feature = "html"))]
fn export_contents(book: &Book, html: bool) -> Result<(String, &'static str)> {
    if html {
        anyhow::bail!("codex was built without the `html` feature");
    }
    Ok((export_markdown(book), "md"))
}

fn print_stats(book: &Book, config: &Config) {
    let stats = DashboardStats::compute(
        book,
        config.goals.default_target_words,
        config.goals.burn_window_days,
        &chrono::Local,
    );
    let projection = &stats.projection;

    println!("{}", book.title);
    println!("  words            {}", stats.total_words);
    println!("  segments         {}", book.segments.len());
    println!("  diversity        {:.1}%", stats.diversity * 100.0);
    println!("  avg sentence     {:.1} words", stats.avg_sentence);
    println!("  readability      {:.1}", readability(&book.full_text(" ")));
    println!(
        "  goal             {} / {} ({:.0}%)",
        projection.current_words, projection.target, projection.percent_complete
    );
    println!(
        "  velocity         {:.0} words/day, ETA {}",
        projection.avg_per_day, projection.days_to_finish
    );
    println!(
        "  time invested    {} ({:.0} words/hour)",
        format_duration(stats.total_seconds),
        stats.words_per_hour
    );
    if stats.high_churn() {
        println!("  warning          high churn");
    }
    for (title, words) in pacing(&book.segments) {
        println!("    {:>7}  {}", words, title);
    }
}

fn describe_block(block: &RenderBlock) -> String {
    match block {
        RenderBlock::Heading { level, inline } => format!("heading{} {}", level, inline.as_str()),
        RenderBlock::Paragraph(inline) => format!("paragraph {}", inline.as_str()),
        RenderBlock::ListItem(inline) => format!("item {}", inline.as_str()),
        RenderBlock::TaskItem { checked, inline } => {
            format!("task[{}] {}", if *checked { "x" } else { " " }, inline.as_str())
        }
        RenderBlock::Blockquote(inline) => format!("quote {}", inline.as_str()),
        RenderBlock::Table { header, rows } => {
            let cells = |row: &[codex_core::markup::InlineHtml]| {
                row.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" | ")
            };
            let mut out = format!("table {}", cells(header));
            for row in rows {
                out.push_str(&format!("\n      {}", cells(row)));
            }
            out
        }
        RenderBlock::FootnoteBlock(entries) => entries
            .iter()
            .map(|e| format!("footnote [{}] {}", e.id, e.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        RenderBlock::Spacer => "spacer".to_string(),
    }
}
