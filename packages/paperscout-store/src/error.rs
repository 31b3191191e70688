pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("cache io: {0}")]
	Io(#[from] std::io::Error),
	#[error("cache encode: {0}")]
	Encode(#[from] serde_json::Error),
}
