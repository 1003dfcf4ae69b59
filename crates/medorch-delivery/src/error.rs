use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeliveryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("agent registry is empty")]
    EmptyRegistry,

    #[error("unknown agent index {0}")]
    UnknownAgent(usize),
}
