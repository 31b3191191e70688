use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn fence_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();

	PATTERN.get_or_init(|| {
		Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fence pattern must compile")
	})
}

/// Pulls a JSON value out of raw generation output. The generator is allowed to
/// wrap its answer in markdown fences or surround it with prose; the first
/// decodable payload wins. Returns None when nothing decodes.
pub fn extract_json(text: &str) -> Option<Value> {
	if let Some(captures) = fence_pattern().captures(text)
		&& let Some(block) = captures.get(1)
		&& let Ok(value) = serde_json::from_str(block.as_str().trim())
	{
		return Some(value);
	}

	let trimmed = text.trim();

	if let Ok(value) = serde_json::from_str(trimmed) {
		return Some(value);
	}

	extract_delimited(trimmed, '{', '}').or_else(|| extract_delimited(trimmed, '[', ']'))
}

fn extract_delimited(text: &str, open: char, close: char) -> Option<Value> {
	let start = text.find(open)?;
	let end = text.rfind(close)?;

	if end <= start {
		return None;
	}

	serde_json::from_str(&text[start..=end]).ok()
}
