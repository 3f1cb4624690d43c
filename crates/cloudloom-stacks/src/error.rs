//! Assembly error types

use thiserror::Error;

use cloudloom_core::ConfigError;
use cloudloom_graph::GraphError;

/// Anything that can stop an assembly run.
///
/// Both variants are fatal before emission; there is no partial success.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
