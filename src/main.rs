//! GlucoLens CLI
//!
//! Command-line interface for the glucose dashboard core:
//! - Windowed readings and event views
//! - Logging and deleting events
//! - Interesting-range inspection (remote or locally detected)
//! - Food photo analysis and consequence recommendations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glucolens::{
    ApiClient, Config, DetectionConfig, EventDraft, EventPayload, NutritionFacts,
    RecommendationQuery, Session, WINDOW_HOURS,
};
use glucolens::model::split_date_time;

#[derive(Parser)]
#[command(name = "glucolens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client core for glucose self-tracking")]
#[command(
    long_about = "GlucoLens fetches glucose readings and logged events from a backend API,\nwindows and filters them, and correlates readings with interesting time ranges."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend API URL (overrides config file)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show glucose readings within a trailing window
    Readings {
        /// Window size in hours (dashboard menu: 1, 3, 6, 12, 24)
        #[arg(short, long, default_value = "24")]
        window: f64,
    },

    /// List events, newest first
    Events {
        /// Filter by type (insulin, food, exercise, ...; "all" for everything)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Log a new event
    Add {
        /// Event type (insulin, food, exercise, or free-form)
        kind: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Insulin units
        #[arg(long)]
        units: Option<f64>,
        /// Calories (food or exercise)
        #[arg(long)]
        calories: Option<f64>,
        /// Exercise duration in minutes
        #[arg(long)]
        duration: Option<f64>,
        /// Exercise distance
        #[arg(long)]
        distance: Option<f64>,
        /// Carbohydrate grams (food)
        #[arg(long)]
        carbohydrate: Option<f64>,
        /// Protein grams (food)
        #[arg(long)]
        protein: Option<f64>,
    },

    /// Delete an event by id
    Delete { id: i64 },

    /// Show interesting time ranges and their attributed events
    Interesting {
        /// Detect locally from raw data instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Analyze a food photo into a nutrition record
    Analyze {
        /// Path to the image file
        path: PathBuf,
    },

    /// Ask for a consequence recommendation
    Recommend {
        /// Event type the recommendation is about
        kind: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Data attributes in key=value format
        #[arg(short = 'A', long)]
        attribute: Vec<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_default();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    init_logging(&config);

    // Config generation needs no backend.
    if let Commands::Config { output } = &cli.command {
        let content = glucolens::generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &content)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let client = Arc::new(ApiClient::new((&config.api).into()));
    let mut session = Session::start(client).await;
    if let Some(status) = session.take_status() {
        eprintln!("Warning: {}", status.text);
    }

    match cli.command {
        Commands::Readings { window } => {
            if !WINDOW_HOURS.contains(&window) {
                tracing::debug!("Window {}h is outside the dashboard menu", window);
            }
            let readings = session.windowed(window);
            if readings.is_empty() {
                println!("No readings in the last {} hours", window);
                return Ok(());
            }

            println!("{:<12} {:<10} {:>8}", "Date", "Time", "mg/dL");
            println!("{}", "-".repeat(32));
            for reading in &readings {
                let (date, time) = split_date_time(&reading.timestamp);
                println!("{:<12} {:<10} {:>8.0}", date, time, reading.value);
            }
            println!();
            println!("{} readings", readings.len());
        }

        Commands::Events { kind } => {
            let events = session.events().sorted_by_recency();
            let filtered: Vec<_> = match kind.as_deref() {
                Some(k) if k != "all" => {
                    events.into_iter().filter(|e| e.kind() == k).collect()
                }
                _ => events,
            };

            if filtered.is_empty() {
                println!("No events");
                return Ok(());
            }

            println!(
                "{:<14} {:<12} {:<10} {:<10} {}",
                "ID", "Date", "Time", "Type", "Description"
            );
            println!("{}", "-".repeat(70));
            for event in &filtered {
                let (date, time) = split_date_time(&event.timestamp);
                println!(
                    "{:<14} {:<12} {:<10} {:<10} {}",
                    event.id,
                    date,
                    time,
                    event.kind(),
                    event.description_or_na()
                );
            }
        }

        Commands::Add {
            kind,
            description,
            units,
            calories,
            duration,
            distance,
            carbohydrate,
            protein,
        } => {
            let payload = match kind.as_str() {
                "insulin" => {
                    let units = units.context("insulin events need --units")?;
                    EventPayload::Insulin { units }
                }
                "food" => EventPayload::Food(NutritionFacts {
                    calories,
                    carbohydrate,
                    protein,
                    ..Default::default()
                }),
                "exercise" => {
                    let calories = calories.context("exercise events need --calories")?;
                    let duration = duration.context("exercise events need --duration")?;
                    EventPayload::Exercise {
                        calories,
                        duration,
                        distance,
                    }
                }
                _ => EventPayload::Other {
                    kind: kind.clone(),
                    data: serde_json::json!({}),
                },
            };

            let mut draft = EventDraft::new(payload);
            if let Some(desc) = description {
                draft = draft.description(desc);
            }

            match session.add_event(draft).await {
                Some(event) => println!("Logged {} event #{}", event.kind(), event.id),
                None => report_failure(&mut session)?,
            }
        }

        Commands::Delete { id } => {
            if session.delete_event(id).await {
                println!("Deleted event #{}", id);
            } else {
                report_failure(&mut session)?;
            }
        }

        Commands::Interesting { local } => {
            if local {
                session.detect_locally(&config.detection);
            }
            let Some(selector) = session.selector() else {
                bail!("No interesting-event catalog available");
            };

            let catalog = selector.catalog();
            if catalog.is_empty() {
                println!("No interesting events");
                return Ok(());
            }

            for key in catalog.keys() {
                let ranges = catalog.ranges(key).unwrap_or_default();
                println!("{} ({} ranges)", key, ranges.len());
                for range in ranges {
                    let (start_date, start_time) = split_date_time(&range.span.start);
                    let (_, end_time) = split_date_time(&range.span.end);
                    println!("  {} {} - {}", start_date, start_time, end_time);
                    for event in &range.events {
                        let (_, time) = split_date_time(&event.timestamp);
                        println!(
                            "    #{} {} at {} — {}",
                            event.id,
                            event.kind(),
                            time,
                            event.description_or_na()
                        );
                    }
                }
            }
        }

        Commands::Analyze { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {:?}", path))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "photo".to_string());
            let content_type = match path.extension().and_then(|e| e.to_str()) {
                Some("jpg") | Some("jpeg") => "image/jpeg",
                Some("png") => "image/png",
                Some("webp") => "image/webp",
                _ => "application/octet-stream",
            };

            match session
                .analyze_photo(file_name, content_type.to_string(), bytes)
                .await
            {
                Some(facts) => {
                    println!("Nutrition facts:");
                    print_fact("Calories", facts.calories, "kcal");
                    print_fact("Fat", facts.fat, "g");
                    print_fact("Saturated fat", facts.saturated_fat, "g");
                    print_fact("Carbohydrate", facts.carbs(), "g");
                    print_fact("Sugar", facts.sugar, "g");
                    print_fact("Dietary fiber", facts.dietary_fiber, "g");
                    print_fact("Protein", facts.protein, "g");
                    print_fact("Cholesterol", facts.cholesterol, "mg");
                    print_fact("Sodium", facts.sodium, "mg");
                }
                None => report_failure(&mut session)?,
            }
        }

        Commands::Recommend {
            kind,
            description,
            attribute,
        } => {
            let mut query = RecommendationQuery::new(kind);
            if let Some(desc) = description {
                query = query.description(desc);
            }
            for pair in attribute {
                let Some((key, value)) = pair.split_once('=') else {
                    bail!("Invalid attribute {:?}, expected key=value", pair);
                };
                query = query.attribute(key, value);
            }

            match session.recommend(&query).await {
                Some(rec) => {
                    println!("{}", rec.detail);
                    if !rec.sources.is_empty() {
                        println!();
                        println!("Sources:");
                        for source in &rec.sources {
                            println!("  - {}", source);
                        }
                    }
                }
                None => report_failure(&mut session)?,
            }
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("glucolens={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn report_failure(session: &mut Session) -> anyhow::Result<()> {
    match session.take_status() {
        Some(status) => bail!("{}", status.text),
        None => bail!("Operation failed"),
    }
}

fn print_fact(label: &str, value: Option<f64>, unit: &str) {
    if let Some(v) = value {
        println!("  {:<15} {:>8.1} {}", label, v, unit);
    }
}
