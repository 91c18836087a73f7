use std::borrow::Cow;

/// Invalid or inconsistent descriptions, detected while building specs and customizations.
#[fpm_derive::fpm_error]
#[derive(Clone, PartialEq, Eq)]
pub enum DescriptionError {
    /// A string does not follow its expected format (ids, GAVs, capabilities, lists).
    #[error("Malformed value{}: {message}", format_context(.context))]
    Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Duplicate definition{}: {message}", format_context(.context))]
    Duplicate { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The same element was both included and excluded.
    #[error("Conflicting customization{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Missing attribute{}: {message}", format_context(.context))]
    MissingAttribute { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A reference inside a spec points at something the spec does not declare.
    #[error("Invalid reference{}: {message}", format_context(.context))]
    InvalidReference { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A package dependency cannot be satisfied inside its feature-pack.
    #[error("Unresolved dependency{}: {message}", format_context(.context))]
    UnresolvedDependency { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DescriptionError {
    pub(crate) fn malformed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Malformed { message: message.into(), context: None }
    }

    pub(crate) fn duplicate(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Duplicate { message: message.into(), context: None }
    }

    pub(crate) fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict { message: message.into(), context: None }
    }

    pub(crate) fn missing(message: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingAttribute { message: message.into(), context: None }
    }

    pub(crate) fn invalid_reference(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidReference { message: message.into(), context: None }
    }
}

/// Fails with [`DescriptionError::MissingAttribute`] when `value` is blank.
pub(crate) fn require_non_empty(value: &str, what: &'static str) -> Result<(), DescriptionError> {
    if value.trim().is_empty() {
        return Err(DescriptionError::missing(format!("{what} cannot be empty")));
    }
    Ok(())
}
