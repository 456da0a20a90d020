use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Knowledge store error: {0}")]
    Store(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Similarity service error: {0}")]
    Similarity(String),

    #[error("Preference store error: {0}")]
    Preference(String),

    #[error("Turn timed out after {0} ms")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_the_budget() {
        assert_eq!(
            EngineError::Timeout(20_000).to_string(),
            "Turn timed out after 20000 ms"
        );
    }
}
