use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::report;
use compass_core::config::{self, AppConfig};
use compass_core::pipeline::{match_against, Pipeline};
use compass_core::query::JobDescription;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    if let Some(dir) = cli.resumes {
        cfg.paths.resumes_dir = dir;
    }
    if let Some(dir) = cli.cache {
        cfg.paths.cache_dir = dir;
    }

    match cli.command {
        Commands::Match {
            job_description,
            top_terms,
            show,
            json,
            rebuild,
        } => run_match(cfg, &job_description, top_terms, show, json, rebuild),
        Commands::Rebuild => run_rebuild(cfg),
        Commands::Status => run_status(cfg),
    }
}

#[derive(Parser)]
#[command(name = "cv-compass")]
#[command(about = "Find the resume that best matches a job description", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Override the resume directory
    #[arg(long)]
    resumes: Option<String>,

    /// Override the cache directory
    #[arg(long)]
    cache: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank resumes against a job description JSON file
    Match {
        /// JD file, or a name inside the configured job_descriptions_dir
        job_description: String,
        /// Number of explanatory terms (defaults to explain.top_terms)
        #[arg(long)]
        top_terms: Option<usize>,
        /// Also list the N best candidates
        #[arg(long, default_value_t = 1)]
        show: usize,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Refit the vector space even if the cache is fresh
        #[arg(long, default_value_t = false)]
        rebuild: bool,
    },
    /// Refit the vector space and replace the cache bundle
    Rebuild,
    /// Show whether the cache bundle is absent, stale or fresh
    Status,
}

fn run_match(
    cfg: AppConfig,
    job_description: &str,
    top_terms: Option<usize>,
    show: usize,
    json: bool,
    rebuild: bool,
) -> Result<()> {
    let jd_path = cfg.resolve_job_description(job_description);
    let jd = JobDescription::from_path(&jd_path)
        .with_context(|| format!("job description {}", jd_path.display()))?;
    let top_terms = top_terms.unwrap_or(cfg.explain.top_terms);

    let pipeline = Pipeline::from_config(&cfg)?;
    let outcome = pipeline
        .load_or_build(rebuild)
        .with_context(|| format!("resume corpus {}", pipeline.resumes_dir().display()))?;
    let report = match_against(&outcome, &jd.query_text(), top_terms)
        .context("no meaningful match")?;

    if json {
        println!("{}", report::render_match_json(&report)?);
    } else {
        print!("{}", report::render_match(&report, show));
    }
    Ok(())
}

fn run_rebuild(cfg: AppConfig) -> Result<()> {
    let pipeline = Pipeline::from_config(&cfg)?;
    let outcome = pipeline
        .load_or_build(true)
        .with_context(|| format!("resume corpus {}", pipeline.resumes_dir().display()))?;
    print!("{}", report::render_rebuild(&outcome));
    Ok(())
}

fn run_status(cfg: AppConfig) -> Result<()> {
    let pipeline = Pipeline::from_config(&cfg)?;
    let (state, bundle) = pipeline.status()?;
    print!("{}", report::render_status(state, bundle.as_ref()));
    Ok(())
}
