use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid UTF-8")]
    NotUtf8,
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn preview(raw: &str) -> String {
        const LIMIT: usize = 120;
        match raw.char_indices().nth(LIMIT) {
            Some((idx, _)) => format!("{}…", &raw[..idx]),
            None => raw.to_string(),
        }
    }
}
