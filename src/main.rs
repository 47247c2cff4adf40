mod config;
mod directory;
mod extract;
mod linker;
mod pipeline;
mod registrar;
mod render;
mod resolver;
mod store;
mod summarize;
mod transcript;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use meeting_types::{CanonicalEntity, EntityKind};

use config::Config;
use directory::EntityDirectory;
use extract::NameExtractor;
use store::{Properties, PropertyPayload, StoreClient, StoreDirectorySource};
use summarize::Summarizer;

#[derive(Parser)]
#[command(
    name = "meeting_link",
    about = "Meeting transcript ingestion with entity resolution and linking"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a transcript and create a linked meeting page
    Ingest {
        /// Directory containing transcript .txt files
        #[arg(long, default_value = "./transcript")]
        dir: PathBuf,
        /// Specific transcript filename inside the directory
        #[arg(long)]
        file: Option<String>,
        /// Do not create directory records for unresolved names
        #[arg(long)]
        no_create: bool,
    },
    /// Append an AI summary to an existing meeting page
    Update {
        /// Share URL of the meeting page
        page_url: String,
        /// Directory containing transcript .txt files
        #[arg(long, default_value = "./transcript")]
        dir: PathBuf,
        /// Specific transcript filename inside the directory
        #[arg(long)]
        file: Option<String>,
    },
    /// Extract and resolve people mentioned in text
    Resolve {
        /// Text to scan, e.g. "Attendees: Aaron, Darren"
        text: Vec<String>,
        /// Report misses as unresolved instead of creating records
        #[arg(long)]
        no_create: bool,
    },
    /// Segment text into entity-linked spans
    Link {
        /// Text to segment
        text: Vec<String>,
    },
    /// Print the meeting database property layout
    Schema,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        eprintln!("meeting_link error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Ingest { dir, file, no_create } => {
            run_ingest(&config, &dir, file.as_deref(), no_create).await
        }
        Command::Update { page_url, dir, file } => {
            run_update(&config, &page_url, &dir, file.as_deref()).await
        }
        Command::Resolve { text, no_create } => run_resolve(&config, &text.join(" "), no_create).await,
        Command::Link { text } => run_link(&config, &text.join(" ")).await,
        Command::Schema => run_schema(&config).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meeting_link=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════
//  SHARED SETUP
// ═══════════════════════════════════════════════════════════════════════

fn store_client(config: &Config) -> StoreClient {
    StoreClient::new(config.token.clone(), config.store_url.clone())
}

fn entity_directory(config: &Config, client: &StoreClient) -> EntityDirectory<StoreDirectorySource> {
    EntityDirectory::new(StoreDirectorySource::new(
        client.clone(),
        config.people_db.clone(),
        config.projects_db.clone(),
    ))
}

/// Everything linkable: people plus projects (empty when no projects
/// database is configured).
async fn all_entities(
    directory: &EntityDirectory<StoreDirectorySource>,
) -> anyhow::Result<Vec<CanonicalEntity>> {
    let mut entities = directory.list(EntityKind::Person, false).await?;
    entities.extend(directory.list(EntityKind::Project, false).await?);
    Ok(entities)
}

fn summarizer(config: &Config) -> anyhow::Result<Summarizer> {
    let key = config
        .summarizer_key
        .as_deref()
        .context("MEETLINK_SUMMARIZER_KEY is required for this command")?;
    Ok(Summarizer::new(
        key,
        config.summarizer_url.clone(),
        config.summarizer_model.clone(),
    ))
}

// ═══════════════════════════════════════════════════════════════════════
//  INGEST: transcript → summarize → resolve → create linked page
// ═══════════════════════════════════════════════════════════════════════

async fn run_ingest(
    config: &Config,
    dir: &std::path::Path,
    file: Option<&str>,
    no_create: bool,
) -> anyhow::Result<()> {
    let summarizer = summarizer(config)?;
    let client = store_client(config);
    let directory = entity_directory(config, &client);

    let path = transcript::find_transcript(dir, file)?;
    let raw = transcript::read_transcript(&path)?;
    eprintln!("Read transcript {} ({} chars)", path.display(), raw.chars().count());

    let schema = client.database_schema(&config.meetings_db).await?;
    let known_people: Vec<String> = directory
        .list(EntityKind::Person, false)
        .await?
        .into_iter()
        .map(|e| e.canonical_name)
        .collect();

    eprintln!("Summarizing transcript...");
    let mut meeting = summarizer
        .summarize(&raw, &known_people, &schema.select_options("Type"))
        .await?;
    if meeting.title.is_empty() {
        meeting.title = "Untitled Meeting".to_string();
    }
    if meeting.date.is_empty() {
        meeting.date = chrono::Utc::now().to_rfc3339();
    }
    if meeting.meeting_type.is_empty() {
        meeting.meeting_type = "Standard Meeting".to_string();
    }

    // Resolve people across the title and rendered content, creating
    // directory records for misses unless told otherwise.
    let extractor = NameExtractor::new();
    let text_content = render::meeting_text(&meeting);
    let full_text = format!("{} {}", meeting.title, text_content);
    let resolution =
        pipeline::resolve_in_text(&extractor, &directory, &full_text, !no_create).await?;

    eprintln!(
        "Resolved {} people ({} unresolved)",
        resolution.resolved.len(),
        resolution.unresolved.len()
    );
    if !resolution.unresolved.is_empty() {
        eprintln!("Could not resolve: {}", resolution.unresolved.join(", "));
    }

    let mut properties = Properties::new();
    properties.insert("Name".to_string(), PropertyPayload::title(meeting.title.clone()));
    properties.insert("Date".to_string(), PropertyPayload::date(meeting.date.clone()));
    properties.insert(
        "Type".to_string(),
        PropertyPayload::select(meeting.meeting_type.clone()),
    );
    if !text_content.is_empty() {
        properties.insert(
            "Text".to_string(),
            PropertyPayload::rich_text(render::chunked_runs(&text_content)),
        );
    }

    if let Some(relation_prop) = schema.relation_property_for(&config.people_db) {
        let mut ids: Vec<String> = Vec::new();
        for mention in &resolution.resolved {
            if !ids.contains(&mention.entity.id) {
                ids.push(mention.entity.id.clone());
            }
        }
        if !ids.is_empty() {
            eprintln!("Linking {} people via '{relation_prop}'", ids.len());
            properties.insert(relation_prop.to_string(), PropertyPayload::relation(ids));
        }
    }

    let page = client.create_page(&config.meetings_db, &properties).await?;
    let page_url = page
        .url
        .clone()
        .unwrap_or_else(|| render::entity_url(&config.page_url, &page.id));

    // Blocks link against the post-resolution directory, so entities
    // created above participate.
    let entities = all_entities(&directory).await?;
    let blocks = render::meeting_blocks(&meeting, &entities, &config.page_url);
    client.append_blocks(&page.id, &blocks).await?;

    eprintln!("Created meeting page: {}", meeting.title);
    println!("{page_url}");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  UPDATE: append an AI summary to an existing page
// ═══════════════════════════════════════════════════════════════════════

async fn run_update(
    config: &Config,
    page_url: &str,
    dir: &std::path::Path,
    file: Option<&str>,
) -> anyhow::Result<()> {
    let page_id = store::page_id_from_url(page_url)
        .with_context(|| format!("could not extract a page ID from {page_url}"))?;
    eprintln!("Page ID: {page_id}");

    let summarizer = summarizer(config)?;
    let client = store_client(config);
    let directory = entity_directory(config, &client);

    let path = transcript::find_transcript(dir, file)?;
    let raw = transcript::read_transcript(&path)?;
    eprintln!("Read transcript {} ({} chars)", path.display(), raw.chars().count());

    let known_people: Vec<String> = directory
        .list(EntityKind::Person, false)
        .await?
        .into_iter()
        .map(|e| e.canonical_name)
        .collect();

    eprintln!("Summarizing transcript...");
    let meeting = summarizer.summarize(&raw, &known_people, &[]).await?;

    let entities = all_entities(&directory).await?;
    let blocks = render::meeting_blocks(&meeting, &entities, &config.page_url);
    client.append_blocks(&page_id, &blocks).await?;

    eprintln!(
        "Appended {} blocks ({} attendees, {} action items)",
        blocks.len(),
        meeting.attendees.len(),
        meeting.action_items.len()
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  RESOLVE / LINK: dry-runnable views of the engine
// ═══════════════════════════════════════════════════════════════════════

async fn run_resolve(config: &Config, text: &str, no_create: bool) -> anyhow::Result<()> {
    let client = store_client(config);
    let directory = entity_directory(config, &client);
    let extractor = NameExtractor::new();

    let resolution = pipeline::resolve_in_text(&extractor, &directory, text, !no_create).await?;

    eprintln!(
        "Resolved {} name(s), {} unresolved",
        resolution.resolved.len(),
        resolution.unresolved.len()
    );
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

async fn run_link(config: &Config, text: &str) -> anyhow::Result<()> {
    let client = store_client(config);
    let directory = entity_directory(config, &client);

    let entities = all_entities(&directory).await?;
    let spans = linker::link_mentions(text, &entities);

    let mentions = spans
        .iter()
        .filter(|s| matches!(s, meeting_types::LinkedSpan::Entity { .. }))
        .count();
    eprintln!("{} span(s), {} linked mention(s)", spans.len(), mentions);
    println!("{}", serde_json::to_string_pretty(&spans)?);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  SCHEMA: inspect the meeting database layout
// ═══════════════════════════════════════════════════════════════════════

async fn run_schema(config: &Config) -> anyhow::Result<()> {
    let client = store_client(config);
    let schema = client.database_schema(&config.meetings_db).await?;

    println!("Database: {}", schema.display_title());
    println!("Database ID: {}", config.meetings_db);
    println!("\nAvailable properties:");
    println!("{}", "-".repeat(50));
    for (name, property) in &schema.properties {
        println!("• {name}: {}", property.kind);
        if let Some(select) = &property.select
            && !select.options.is_empty()
        {
            let options: Vec<&str> = select.options.iter().map(|o| o.name.as_str()).collect();
            println!("  Options: {}", options.join(", "));
        }
        if let Some(relation) = &property.relation
            && let Some(db) = &relation.database_id
        {
            println!("  Relation → {db}");
        }
    }
    Ok(())
}
