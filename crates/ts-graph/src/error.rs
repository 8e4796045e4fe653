//! Network construction and assembly errors.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Part {part} does not exist")]
    UnknownPart { part: String },

    #[error("Part {part} has no port named {port}")]
    UnknownPort { part: String, port: String },

    #[error("Port {part}:{port} is connected more than once")]
    PortAlreadyConnected { part: String, port: String },

    #[error("Port {part}:{port} is connected to itself")]
    SelfConnection { part: String, port: String },

    #[error("Part name {name} is used more than once")]
    DuplicatePartName { name: String },

    #[error("Part {part} declares port {port} more than once")]
    DuplicatePortName { part: String, port: String },

    #[error("Assembly received {actual} parts for a network of {expected}")]
    PartCountMismatch { expected: usize, actual: usize },

    #[error("Flow at {part}:{port} cannot be resolved from the rest of the network")]
    Unresolvable { part: String, port: String },
}
