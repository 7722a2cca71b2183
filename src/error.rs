use thiserror::Error;

#[derive(Debug, Error)]
pub enum KronosError {
    #[error("malformed state value for `{key}`: expected {expected}, found {found}")]
    MalformedState {
        key: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("host notification failed: {0}")]
    Notification(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
}
