mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, CorpusProviderConfig, Evaluation, GenerationProviderConfig, Providers, Query,
	Ranking, Selection, Service,
};

use std::{fs, path::Path};

const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.providers.generation.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.generation.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.model must be non-empty.".to_string(),
		});
	}
	if cfg.providers.generation.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.generation.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.corpus.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.corpus.timeout_ms must be greater than zero.".to_string(),
		});
	}

	if cfg.query.min_keywords == 0 {
		return Err(Error::Validation {
			message: "query.min_keywords must be greater than zero.".to_string(),
		});
	}
	if cfg.query.max_keywords < cfg.query.min_keywords {
		return Err(Error::Validation {
			message: "query.max_keywords must be at least query.min_keywords.".to_string(),
		});
	}
	if cfg.query.max_synonyms_per_keyword == 0 {
		return Err(Error::Validation {
			message: "query.max_synonyms_per_keyword must be greater than zero.".to_string(),
		});
	}
	if cfg.query.synonym_workers == 0 {
		return Err(Error::Validation {
			message: "query.synonym_workers must be greater than zero.".to_string(),
		});
	}

	if cfg.selection.top_k == 0 {
		return Err(Error::Validation {
			message: "selection.top_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.selection.min_relevance_score) {
		return Err(Error::Validation {
			message: "selection.min_relevance_score must be in the range 0.0-1.0.".to_string(),
		});
	}

	if cfg.evaluation.eval_workers == 0 {
		return Err(Error::Validation {
			message: "evaluation.eval_workers must be greater than zero.".to_string(),
		});
	}
	if cfg.evaluation.abstract_budget_chars == 0 {
		return Err(Error::Validation {
			message: "evaluation.abstract_budget_chars must be greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("ranking.weight_relevance", cfg.ranking.weight_relevance),
		("ranking.weight_novelty", cfg.ranking.weight_novelty),
		("ranking.weight_impact", cfg.ranking.weight_impact),
		("ranking.weight_practicality", cfg.ranking.weight_practicality),
		("ranking.initial_blend", cfg.ranking.initial_blend),
		("ranking.review_blend", cfg.ranking.review_blend),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	let rubric_sum = cfg.ranking.weight_relevance
		+ cfg.ranking.weight_novelty
		+ cfg.ranking.weight_impact
		+ cfg.ranking.weight_practicality;

	if (rubric_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
		return Err(Error::Validation {
			message: "ranking rubric weights must sum to 1.0.".to_string(),
		});
	}

	if cfg.cache.ttl_hours <= 0 {
		return Err(Error::Validation {
			message: "cache.ttl_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.enabled && cfg.cache.dir.trim().is_empty() {
		return Err(Error::Validation {
			message: "cache.dir must be non-empty when cache.enabled is true.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.generation.model = cfg.providers.generation.model.trim().to_string();

	if cfg
		.providers
		.corpus
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.corpus.api_key = None;
	}
}
