use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use moodreel_catalog::CatalogClient;
use moodreel_core::locator::LocatorConfig;
use moodreel_core::{select_genres, Analyzer, AnalyzerConfig, Emotion, Gender};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moodreel", about = "Moodreel face-attribute movie recommendation CLI")]
struct Cli {
    /// Directory containing the cascade and classifier model files
    /// (falls back to MOODREEL_MODEL_DIR, then the system default)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer face attributes from an image file
    Analyze {
        /// Path to the photograph
        image: PathBuf,
    },
    /// Infer attributes and fetch movie recommendations
    Recommend {
        /// Path to the photograph
        image: PathBuf,
    },
    /// Print the genre selection for an attribute pair
    Genres {
        /// Emotion label (angry, disgust, fear, happy, neutral, sad,
        /// surprise, unknown)
        emotion: String,
        /// Age in years
        age: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let model_dir = cli
        .model_dir
        .clone()
        .or_else(|| std::env::var("MOODREEL_MODEL_DIR").map(PathBuf::from).ok())
        .unwrap_or_else(moodreel_core::default_model_dir);

    match cli.command {
        Commands::Analyze { image } => {
            let analysis = analyze_file(&model_dir, &image)?;
            let genres = select_genres(analysis.emotion, analysis.age, analysis.gender);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "analysis": analysis,
                    "genres": genres,
                }))?
            );
        }
        Commands::Recommend { image } => {
            let analysis = analyze_file(&model_dir, &image)?;
            let genres = select_genres(analysis.emotion, analysis.age, analysis.gender);

            let token = std::env::var("TMDB_BEARER_TOKEN")
                .context("TMDB_BEARER_TOKEN not set; recommendations need a catalog token")?;
            let base_url = std::env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| moodreel_catalog::DEFAULT_BASE_URL.to_string());

            let catalog = CatalogClient::new(base_url, token)?;
            let recommendations = catalog.recommendations_for(&genres).await;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "analysis": analysis,
                    "recommendations": recommendations,
                    "message": "Analysis complete",
                }))?
            );
        }
        Commands::Genres { emotion, age } => {
            let emotion: Emotion = emotion
                .parse()
                .map_err(|err| anyhow::anyhow!("{err}"))?;
            let genres = select_genres(emotion, age, Gender::Unknown);
            println!("{}", serde_json::to_string(&genres)?);
        }
    }

    Ok(())
}

/// Build a local analyzer and run it on one image file.
fn analyze_file(
    model_dir: &std::path::Path,
    image: &PathBuf,
) -> Result<moodreel_core::AttributeResult> {
    let config = AnalyzerConfig::from_model_dir(model_dir, LocatorConfig::default());
    let mut analyzer = Analyzer::new(&config)?;
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    Ok(analyzer.analyze_bytes(&bytes)?)
}
