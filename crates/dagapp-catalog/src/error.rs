use dagapp_config::ConfigError;
use dagapp_core::CoreError;
use thiserror::Error;

/// Errors raised while building or driving a catalog calculator
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Name that matches no calculator in the catalog
    #[error("Unknown calculator: {0}")]
    UnknownCalculator(String),

    /// An update that is not of the form `name=value`
    #[error("Invalid update '{0}': expected name=value")]
    InvalidUpdate(String),

    /// The inputs document could not be loaded or does not fit the calculator
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The engine rejected the declarations or an operation
    #[error("Engine error: {0}")]
    Core(#[from] CoreError),
}

impl CatalogError {
    /// Get the error code, forwarding the code of a wrapped error
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::UnknownCalculator(_) => "ERR_CATALOG_UNKNOWN_CALCULATOR",
            CatalogError::InvalidUpdate(_) => "ERR_CATALOG_INVALID_UPDATE",
            CatalogError::Config(err) => err.error_code(),
            CatalogError::Core(err) => err.error_code(),
        }
    }
}
