use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuesserError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No image has been analyzed yet")]
    NoSession,

    #[error("A re-examination is already in progress")]
    Busy,

    #[error("The current result has no candidates to focus on")]
    NothingToFocus,

    #[error("Step {index} does not exist (history has {len} rounds)")]
    StepOutOfRange { index: usize, len: usize },
}

impl From<GuesserError> for String {
    fn from(err: GuesserError) -> Self {
        err.to_string()
    }
}
