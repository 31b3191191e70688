use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use paperscout_domain::PaperRecord;

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Fetches the venue/year corpus slice. The provider applies its own rate
/// limiting upstream; this client only retries with capped backoff and hands
/// back read-only records.
pub async fn fetch(
	cfg: &paperscout_config::CorpusProviderConfig,
	venue: &str,
	year: i32,
) -> Result<Vec<PaperRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let attempts = cfg.max_retries.max(1);

	let mut last_err = None;

	for attempt in 0..attempts {
		if attempt > 0 {
			tokio::time::sleep(backoff_delay(attempt)).await;
		}

		let res = client
			.get(&url)
			.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
			.query(&[("venue", venue.to_string()), ("year", year.to_string())])
			.send()
			.await;

		match res {
			Ok(res) => match res.error_for_status() {
				Ok(res) => {
					let json: Value = res.json().await?;
					let papers = parse_corpus_response(json)?;

					return Ok(apply_accepted_filter(papers, cfg.accepted_only));
				},
				Err(err) => last_err = Some(err.into()),
			},
			Err(err) => last_err = Some(err.into()),
		}
	}

	Err(last_err.unwrap_or_else(|| eyre::eyre!("Corpus fetch failed.")))
}

fn backoff_delay(attempt: u32) -> Duration {
	let ms = BASE_BACKOFF_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));

	Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

fn parse_corpus_response(json: Value) -> Result<Vec<PaperRecord>> {
	// Providers wrap the record list differently; accept both a bare array and
	// a { "papers": [...] } envelope.
	let records = if json.is_array() {
		json
	} else if let Some(papers) = json.get("papers").cloned() {
		papers
	} else {
		return Err(eyre::eyre!("Corpus response is missing the papers array."));
	};

	serde_json::from_value(records).map_err(|err| eyre::eyre!("Invalid paper record: {err}."))
}

fn apply_accepted_filter(papers: Vec<PaperRecord>, accepted_only: bool) -> Vec<PaperRecord> {
	if !accepted_only {
		return papers;
	}

	papers.into_iter().filter(PaperRecord::is_accepted).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_bare_array() {
		let json = serde_json::json!([
			{ "id": "a", "title": "A", "venue": "neurips", "year": 2024 }
		]);
		let papers = parse_corpus_response(json).expect("parse failed");

		assert_eq!(papers.len(), 1);
		assert_eq!(papers[0].id, "a");
	}

	#[test]
	fn parses_papers_envelope() {
		let json = serde_json::json!({
			"papers": [
				{ "id": "b", "title": "B", "venue": "icml", "year": 2023 }
			]
		});
		let papers = parse_corpus_response(json).expect("parse failed");

		assert_eq!(papers[0].venue, "icml");
	}

	#[test]
	fn accepted_filter_drops_rejects() {
		let json = serde_json::json!([
			{ "id": "a", "title": "A", "venue": "v", "year": 2024, "decision": "Accept (poster)" },
			{ "id": "b", "title": "B", "venue": "v", "year": 2024, "decision": "Reject" }
		]);
		let papers = parse_corpus_response(json).expect("parse failed");
		let filtered = apply_accepted_filter(papers, true);

		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "a");
	}

	#[test]
	fn backoff_caps_at_maximum() {
		assert_eq!(backoff_delay(1), Duration::from_millis(500));
		assert!(backoff_delay(20) <= Duration::from_millis(MAX_BACKOFF_MS));
	}
}
