//! Run one optimization request and print its job status as JSON.
//!
//! ```text
//! inverse-design [REQUEST.json] [--config CONFIG.toml] [--job-id ID]
//! ```
//!
//! The request is read from stdin when no path is given. A `--config` file
//! replaces the request's optimizer settings; `INVERSE_DESIGN_*` environment
//! variables are applied last.

use anyhow::{bail, Context, Result};
use inverse_design::config::ConfigSource;
use inverse_design::{run_job, ModelRegistry, OptimizationRequest, OptimizerConfig};
use std::io::Read;

#[derive(Debug, Default)]
struct Args {
    request_path: Option<String>,
    config_path: Option<String>,
    job_id: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                args.config_path = Some(iter.next().context("--config needs a file path")?);
            }
            "--job-id" => {
                args.job_id = Some(iter.next().context("--job-id needs a value")?);
            }
            "-h" | "--help" => {
                println!("usage: inverse-design [REQUEST.json] [--config FILE] [--job-id ID]");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path => {
                if args.request_path.replace(path.to_string()).is_some() {
                    bail!("only one request file may be given");
                }
            }
        }
    }
    Ok(args)
}

fn read_request(path: Option<&str>) -> Result<OptimizationRequest> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read request from stdin")?;
            text
        }
    };
    OptimizationRequest::from_json(&text).context("request is not valid JSON")
}

fn main() -> Result<()> {
    inverse_design::init()?;
    let args = parse_args()?;

    let mut request = read_request(args.request_path.as_deref())?;

    let mut source = ConfigSource::Request;
    if let Some(path) = &args.config_path {
        request.config = OptimizerConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path))?;
        source = ConfigSource::File(path.clone());
    }
    request.config.apply_environment_overrides()?;
    log::info!("Optimizer settings from {}", source);

    let job_id = args
        .job_id
        .unwrap_or_else(|| format!("job-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    let job = run_job(job_id, &request, &ModelRegistry::default())?;

    let payload = job.status().to_json()?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
