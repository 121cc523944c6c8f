#![forbid(unsafe_code)]

use poem_openapi::Object;
use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("pixel_oracle input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to configure Log4rs using {}: {}", .0, .1)]
    Log4rsInitialization(String, String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    /// The responses document could not be loaded.  Fatal at startup.
    #[error("Unable to load responses from {}: {}", .0, .1)]
    ConfigError(String, String),

    /// The landing page template could not be rendered.
    #[error("Unable to render landing page template: {}", .0)]
    TemplateError(String),

    /// Missing or unknown category.  The message is returned to clients as
    /// the answer, so it must not change.
    #[error("Invalid category.")]
    InvalidCategory(String),
}

// ***************************************************************************
//                               HttpResult
// ***************************************************************************
/// Generic payload for non-200 responses.
#[derive(Object, Debug)]
pub struct HttpResult {
    pub result_code: String,
    pub result_msg: String,
}

impl HttpResult {
    pub fn new(result_code: String, result_msg: String) -> Self {
        Self {result_code, result_msg}
    }
}
