use fpm_derive::fpm_error;
use std::borrow::Cow;

#[fpm_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<String> {
    std::fs::read_to_string("missing.toml").context("Reading descriptor")
}

fn main() {
    let _ = read();
}
