pub mod report;

use std::{fs, path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use paperscout_domain::Query;
use paperscout_pipeline::{CancelFlag, PipelineService, RunRequest};
use paperscout_store::{CacheStore, FileStore, MemoryStore};

const REPORT_TOP_N: usize = 20;

#[derive(Debug, Parser)]
#[command(
	version = paperscout_cli::VERSION,
	rename_all = "kebab",
	styles = paperscout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Conference to search, e.g. "neurips".
	#[arg(long)]
	pub venue: String,
	#[arg(long)]
	pub year: i32,
	/// Explicit seed term; repeatable. Omit to derive keywords from --interest.
	#[arg(long = "term", value_name = "TERM")]
	pub terms: Vec<String>,
	/// Free-text research interest.
	#[arg(long)]
	pub interest: Option<String>,
	/// Override the configured candidate working-set size.
	#[arg(long)]
	pub top_k: Option<u32>,
	/// Rank by retrieval score and review signal only, skipping rubric calls.
	#[arg(long)]
	pub skip_llm_evaluation: bool,
	/// Write the markdown report here instead of stdout.
	#[arg(long, short = 'o', value_name = "FILE")]
	pub output: Option<PathBuf>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut config = paperscout_config::load(&args.config)?;

	init_tracing(&config)?;

	if let Some(top_k) = args.top_k {
		config.selection.top_k = top_k;
	}
	if args.skip_llm_evaluation {
		config.evaluation.skip_llm_evaluation = true;
	}

	let query = Query::new(args.terms, args.interest)?;
	let cache: Arc<dyn CacheStore> = if config.cache.enabled {
		Arc::new(FileStore::new(config.cache.dir.as_str(), config.cache.ttl_hours as u64)?)
	} else {
		Arc::new(MemoryStore::new())
	};
	let service = PipelineService::new(config, cache);
	let request = RunRequest { venue: args.venue, year: args.year, query };
	let outcome = service.run(request, &CancelFlag::new()).await?;

	tracing::info!(
		run_id = %outcome.run_id,
		ranked = outcome.ranked.len(),
		degraded = outcome.degraded,
		"Pipeline run complete."
	);

	let rendered = report::render_markdown(&outcome, REPORT_TOP_N);

	match args.output {
		Some(path) => fs::write(&path, rendered)?,
		None => print!("{rendered}"),
	}

	Ok(())
}

fn init_tracing(config: &paperscout_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
