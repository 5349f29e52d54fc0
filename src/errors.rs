//! Error types returned across the crate boundary. Internal invariants
//! (a malformed kd-tree node, an out-of-range BxDF index) still panic -
//! `Error` is reserved for conditions a caller building or driving a scene
//! can actually hit and recover from.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad parameter `{name}`: {reason}")]
    BadParam { name: String, reason: String },

    #[error("missing required parameter `{0}`")]
    MissingParam(String),

    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("degenerate scene: {0}")]
    DegenerateScene(String),

    #[error("render cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
