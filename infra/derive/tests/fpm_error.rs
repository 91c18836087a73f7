use fpm_derive::fpm_error;
use std::borrow::Cow;
use std::error::Error as _;

#[fpm_error]
pub enum SampleError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Failed to resolve {what}")]
    #[nested]
    Resolving { what: String, source: Box<SampleError> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[test]
fn fpm_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/fpm_error_pass.rs");
    t.pass("tests/ui/fpm_error_nested.rs");
}

#[test]
fn context_is_rendered_in_display() {
    let result: Result<()> = Err(SampleError::from("boom"));
    let err = result.context("while loading").expect_err("error expected");
    assert_eq!(err.to_string(), "Internal error (while loading): boom");
}

#[test]
fn source_errors_convert_with_context() {
    let io: std::result::Result<(), std::io::Error> =
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
    let err = io.context("reading state").expect_err("error expected");
    assert!(matches!(err, SampleError::Io { context: Some(_), .. }));
    assert!(err.to_string().starts_with("IO error (reading state)"));
}

#[test]
fn nested_variants_expose_their_cause() {
    let err = SampleError::Resolving {
        what: "config".to_owned(),
        source: Box::new(SampleError::from(String::from("leaf"))),
    };
    assert_eq!(err.to_string(), "Failed to resolve config");
    let cause = err.source().expect("nested variant has a source");
    assert_eq!(cause.to_string(), "Internal error: leaf");
}
