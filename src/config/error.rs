//! Errors raised while loading or validating `folio.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config")]
    Toml(#[from] toml::de::Error),

    #[error("[build].content `{0}` is not a directory")]
    ContentNotDir(PathBuf),

    #[error("[build].extensions must have at least one element")]
    NoExtensions,

    #[error("[base].url is required when [build.feed] is enabled")]
    FeedWithoutUrl,

    #[error("[base].url `{0}` must start with http:// or https://")]
    InvalidUrl(String),

    #[error("[build].output `{output}` is inside [build].content `{content}`")]
    OutputInsideContent { output: PathBuf, content: PathBuf },
}
