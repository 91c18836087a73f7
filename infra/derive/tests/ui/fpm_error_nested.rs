use fpm_derive::fpm_error;
use std::borrow::Cow;

#[fpm_error]
pub enum ChainError {
    #[error("Failed to process group {group}")]
    #[nested]
    Group { group: String, source: Box<ChainError> },

    #[error("Failed to process feature {feature}")]
    #[nested]
    Feature { feature: String, source: Box<ChainError> },

    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let leaf = ChainError::Conflict { message: "a1 vs a2".into(), context: None };
    let err = ChainError::Group {
        group: "groupC".into(),
        source: Box::new(ChainError::Feature { feature: "specC".into(), source: Box::new(leaf) }),
    };
    let _ = std::error::Error::source(&err);
}
