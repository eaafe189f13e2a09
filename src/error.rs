use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrimError {
    #[error("failed to spawn the trimmer thread")]
    Spawn(#[source] io::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidConfig { var: &'static str, value: String },
    #[error("failed to reserve {size} bytes of address space")]
    Reserve { size: usize },
}
