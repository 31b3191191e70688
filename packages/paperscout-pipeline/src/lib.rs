pub mod aggregate;
pub mod decode;
pub mod error;
pub mod evaluate;
pub mod keywords;
pub mod matcher;
pub mod run;
pub mod select;
pub mod synonyms;

pub use error::{Error, Result, Stage};

use std::{
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use serde_json::Value;

pub use aggregate::{RankComponents, RankedResult};
pub use evaluate::RubricScore;
pub use matcher::CandidateScore;
pub use run::{RunOutcome, RunRequest, RunState};

use paperscout_config::{Config, CorpusProviderConfig, GenerationProviderConfig};
use paperscout_domain::PaperRecord;
use paperscout_providers::{corpus, generation};
use paperscout_store::CacheStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait CorpusProvider
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a CorpusProviderConfig,
		venue: &'a str,
		year: i32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PaperRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub generation: Arc<dyn GenerationProvider>,
	pub corpus: Arc<dyn CorpusProvider>,
}

struct DefaultProviders;

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, messages))
	}
}

impl CorpusProvider for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a CorpusProviderConfig,
		venue: &'a str,
		year: i32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PaperRecord>>> {
		Box::pin(corpus::fetch(cfg, venue, year))
	}
}

impl Providers {
	pub fn new(generation: Arc<dyn GenerationProvider>, corpus: Arc<dyn CorpusProvider>) -> Self {
		Self { generation, corpus }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { generation: provider.clone(), corpus: provider }
	}
}

/// Run-level cancellation signal. Cancelling stops new external dispatch;
/// already-completed per-candidate work still flows into the final ranking.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

pub struct PipelineService {
	pub cfg: Config,
	pub cache: Arc<dyn CacheStore>,
	pub providers: Providers,
}

impl PipelineService {
	pub fn new(cfg: Config, cache: Arc<dyn CacheStore>) -> Self {
		Self { cfg, cache, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, cache: Arc<dyn CacheStore>, providers: Providers) -> Self {
		Self { cfg, cache, providers }
	}
}
