use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub selection: Selection,
	#[serde(default)]
	pub evaluation: Evaluation,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub generation: GenerationProviderConfig,
	pub corpus: CorpusProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusProviderConfig {
	pub api_base: String,
	#[serde(default)]
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default = "default_fetch_retries")]
	pub max_retries: u32,
	#[serde(default)]
	pub accepted_only: bool,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Query {
	pub min_keywords: u32,
	pub max_keywords: u32,
	pub max_synonyms_per_keyword: u32,
	pub synonym_workers: u32,
}
impl Default for Query {
	fn default() -> Self {
		Self { min_keywords: 3, max_keywords: 10, max_synonyms_per_keyword: 10, synonym_workers: 4 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selection {
	pub top_k: u32,
	pub min_relevance_score: f32,
}
impl Default for Selection {
	fn default() -> Self {
		Self { top_k: 100, min_relevance_score: 0.0 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Evaluation {
	pub skip_llm_evaluation: bool,
	pub max_retries: u32,
	pub eval_workers: u32,
	pub abstract_budget_chars: u32,
	pub review_budget_chars: u32,
}
impl Default for Evaluation {
	fn default() -> Self {
		Self {
			skip_llm_evaluation: false,
			max_retries: 2,
			eval_workers: 4,
			abstract_budget_chars: 1_500,
			review_budget_chars: 300,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub weight_relevance: f32,
	pub weight_novelty: f32,
	pub weight_impact: f32,
	pub weight_practicality: f32,
	/// Blend weight for the retrieval-stage initial score. Zero disables the blend.
	pub initial_blend: f32,
	/// Blend weight for the normalized corpus review signal. Zero disables the blend.
	pub review_blend: f32,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			weight_relevance: 0.4,
			weight_novelty: 0.25,
			weight_impact: 0.25,
			weight_practicality: 0.1,
			initial_blend: 0.0,
			review_blend: 0.0,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	pub ttl_hours: i64,
	pub dir: String,
}
impl Default for Cache {
	fn default() -> Self {
		Self { enabled: true, ttl_hours: 24, dir: "storage/cache".to_string() }
	}
}

fn default_fetch_retries() -> u32 {
	3
}
