use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlasspaneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No unused uid found after {attempts} attempts")]
    UidExhausted { attempts: u32 },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
