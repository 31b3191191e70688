use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

const ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

/// Sends one chat-completion request and returns the assistant message content
/// as raw text. Parsing that text into structured values is the caller's job;
/// this layer only retries transport and server failures.
pub async fn generate(
	cfg: &paperscout_config::GenerationProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	let mut last_err = None;

	for attempt in 0..ATTEMPTS {
		if attempt > 0 {
			tokio::time::sleep(backoff_delay(attempt)).await;
		}

		let res = client
			.post(&url)
			.headers(crate::auth_headers(Some(&cfg.api_key), &cfg.default_headers)?)
			.json(&body)
			.send()
			.await;

		match res {
			Ok(res) => match res.error_for_status() {
				Ok(res) => {
					let json: Value = res.json().await?;

					return parse_generation_response(json);
				},
				Err(err) => last_err = Some(err.into()),
			},
			Err(err) => last_err = Some(err.into()),
		}
	}

	Err(last_err.unwrap_or_else(|| eyre::eyre!("Generation request failed.")))
}

fn backoff_delay(attempt: u32) -> Duration {
	Duration::from_millis(BASE_BACKOFF_MS * 2_u64.pow(attempt.saturating_sub(1)))
}

fn parse_generation_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| eyre::eyre!("Generation response is missing message content."))?;

	Ok(content.to_string())
}
