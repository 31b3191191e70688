pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The pipeline stage a run-fatal error surfaced in. Only the stages before
/// candidate selection can abort a run; later failures degrade per candidate
/// and never carry a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	CorpusFetch,
	KeywordExtraction,
}

impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::CorpusFetch => "corpus_fetch",
			Self::KeywordExtraction => "keyword_extraction",
		}
	}
}

impl std::fmt::Display for Stage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid input: {message}")]
	FatalInput { message: String },
	#[error("Upstream failure in {stage}: {message}")]
	Upstream { stage: Stage, message: String },
	#[error("Schema violation in {stage}: {message}")]
	SchemaViolation { stage: Stage, message: String },
	#[error("Corpus slice for {venue} {year} is empty.")]
	CorpusEmpty { venue: String, year: i32 },
}

impl From<paperscout_domain::QueryError> for Error {
	fn from(err: paperscout_domain::QueryError) -> Self {
		Self::FatalInput { message: err.to_string() }
	}
}
