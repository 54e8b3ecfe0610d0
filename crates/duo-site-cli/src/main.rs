use clap::{Parser, Subcommand};
use duo_site_service::{
    document::{Document, GALLERY_MOUNT},
    models::ContentRecord,
    repositories::{DEFAULT_ENDPOINT, SheetDbSource},
    view::{Action, ContentView, LoadOutcome, Phase, ViewOptions, compare_records},
};
use serde::Serialize;
use std::error::Error;
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(name = "duo-site")]
#[command(about = "Inspect the Duo Mazzola content spreadsheet")]
struct Cli {
    /// SheetDB endpoint serving the content rows
    #[arg(long, env = "SHEETDB_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: Url,

    /// Seconds to wait for the spreadsheet before giving up
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rows of the spreadsheet, reporting the ones that fail validation
    Records {
        /// Print the valid records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the gallery fragment as it would appear on the site
    Render {
        /// Category to filter by ("all" for every record)
        #[arg(short, long)]
        filter: Option<String>,
        /// Page to render, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        /// Cards per page
        #[arg(long, default_value_t = 9)]
        per_page: usize,
    },
}

#[derive(Serialize)]
struct RecordsReport {
    records: Vec<ContentRecord>,
    malformed: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let source = SheetDbSource::new(cli.endpoint, Duration::from_secs(cli.timeout_secs))?;

    match cli.command {
        Commands::Records { json } => list_records(&source, json).await?,
        Commands::Render {
            filter,
            page,
            per_page,
        } => render_gallery(source, filter, page, per_page).await?,
    }

    Ok(())
}

async fn list_records(source: &SheetDbSource, json: bool) -> Result<(), Box<dyn Error>> {
    let mut report = RecordsReport {
        records: Vec::new(),
        malformed: Vec::new(),
    };
    for row in source.fetch_rows().await? {
        match row {
            Ok(record) => report.records.push(record),
            Err(err) => report.malformed.push(err.to_string()),
        }
    }
    report.records.sort_by(compare_records);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for record in &report.records {
        println!(
            "{:<15} {:>4}  {}  [{}]",
            record.kind.tag(),
            record.order,
            record.title,
            record.categories.as_deref().unwrap_or("-")
        );
    }
    for issue in &report.malformed {
        eprintln!("skipped: {issue}");
    }
    println!(
        "{} records, {} skipped",
        report.records.len(),
        report.malformed.len()
    );

    Ok(())
}

async fn render_gallery(
    source: SheetDbSource,
    filter: Option<String>,
    page: usize,
    per_page: usize,
) -> Result<(), Box<dyn Error>> {
    let document = Document::site();
    let options = ViewOptions::new(GALLERY_MOUNT).items_per_page(per_page);
    let mut view = ContentView::new(options, &document, source)?;

    if view.refresh().await == LoadOutcome::Failed {
        if let Phase::Error { detail, .. } = view.phase() {
            eprintln!("Failed to load content: {detail}");
        }
    }

    if filter.is_some() {
        view.apply(Action::from_filter_attr(filter.as_deref()));
    }
    if page > 1 && !view.apply(Action::Page(page)) {
        eprintln!(
            "Page {page} is out of range (total pages: {})",
            view.total_pages()
        );
    }

    println!("{}", view.render());
    Ok(())
}
