use fpm_domain::DescriptionError;
use std::borrow::Cow;

/// A specialized [`LayoutError`] enum of this crate.
#[fpm_derive::fpm_error]
pub enum LayoutError {
    #[error("Directory not found{}: {message}", format_context(.context))]
    DirectoryNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Two documents of the repository describe the same feature-pack.
    #[error("Duplicate feature-pack{}: {message}", format_context(.context))]
    DuplicateFeaturePack { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Directory walk failure{}: {source}", format_context(.context))]
    Walk { source: walkdir::Error, context: Option<Cow<'static, str>> },

    #[error("Malformed TOML document{}: {source}", format_context(.context))]
    Toml { source: toml::de::Error, context: Option<Cow<'static, str>> },

    #[error("State file serialization failure{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid description{}: {source}", format_context(.context))]
    Description { source: DescriptionError, context: Option<Cow<'static, str>> },
}
