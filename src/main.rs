use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use base64::Engine as _;
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use mathboard::analysis::{AnalysisConfig, AnalysisError, CalculationResult, HttpAnalyzer};
use mathboard::pipeline::ResultPipeline;
use mathboard::replay::{self, ReplayError, StrokeScript};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("pass --strokes or --image")]
    NoInput,
    #[error("{} is not a PNG file", .0.display())]
    NotPng(PathBuf),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("canvas export failed: {0}")]
    Canvas(#[from] canvas::error::CanvasError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "mathboard", about = "Replay a handwritten board and ask the analysis service to solve it")]
#[command(group(ArgGroup::new("input").required(true).args(["strokes", "image"])))]
struct Cli {
    /// Stroke script (JSON) to replay onto a blank board.
    #[arg(long)]
    strokes: Option<PathBuf>,

    /// Existing PNG of a board, sent as-is.
    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Variable sent with the request, as `name=value`. Repeatable.
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Analysis endpoint; overrides `ANALYSIS_URL`.
    #[arg(long)]
    endpoint: Option<String>,

    /// Write the replayed bitmap here as PNG.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Replay and export only; do not call the analysis service.
    #[arg(long)]
    skip_analysis: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_owned(), value.trim().to_owned())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "mathboard failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let image = if let Some(path) = &cli.strokes {
        board_from_script(path, &cli)?
    } else if let Some(path) = &cli.image {
        board_from_png(path)?
    } else {
        return Err(CliError::NoInput);
    };

    if cli.skip_analysis {
        return Ok(());
    }

    let mut config = AnalysisConfig::from_env()?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_url(endpoint)?;
    }
    tracing::info!(url = %config.url, "analysis client configured");
    let analyzer = Arc::new(HttpAnalyzer::new(&config)?);
    let pipeline = ResultPipeline::new(analyzer);
    for (name, value) in &cli.vars {
        pipeline.set_variable(name.clone(), value.clone());
    }

    match pipeline.calculate(image).await {
        Ok(result) => print_result(&result, cli.json),
        Err(e) => {
            if let Some(message) = pipeline.state().error {
                eprintln!("{message}");
            }
            Err(e.into())
        }
    }
}

fn board_from_script(path: &Path, cli: &Cli) -> Result<String, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    let script = StrokeScript::from_json(&json)?;
    let (core, stats) = replay::render(&script, cli.width, cli.height)?;
    tracing::info!(strokes = stats.strokes, points = stats.points, "board replayed");

    if let Some(out) = &cli.out {
        if let Some(surface) = core.surface() {
            let png = surface.to_png()?;
            std::fs::write(out, png).map_err(|source| CliError::Write { path: out.clone(), source })?;
            tracing::info!(path = %out.display(), "bitmap written");
        }
    }
    Ok(core.to_data_url()?)
}

fn board_from_png(path: &Path) -> Result<String, CliError> {
    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
    let bytes = std::fs::read(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return Err(CliError::NotPng(path.to_path_buf()));
    }
    Ok(format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes)))
}

fn print_result(result: &CalculationResult, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("{} = {}", result.expression, result.answer);
    if result.assign {
        println!("(assigned {})", result.expression);
    }
    for (i, step) in result.steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    Ok(())
}
