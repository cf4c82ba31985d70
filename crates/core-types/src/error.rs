use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),
}
