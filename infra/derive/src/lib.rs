#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the provisioning crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! fpm-derive.workspace = true
//! thiserror.workspace = true
//! ```
//!
//! Examples are `ignore`d to avoid compiling in this crate; `tests/ui` holds compiled copies.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro to define a standardized error enum.
///
/// # Injected Behaviors
///
/// * **Derives**: Adds `Debug` and `thiserror::Error` unless already derived.
/// * **Context**: Generates a `<ErrorName>Ext` trait adding `.context(...)` to results.
/// * **Conversions**: `From<SourceError>` for variants that wrap a foreign error.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Cause Chains**: Variants marked `#[nested]` wrap another error of the same family
///   (usually `Box<Self>`). They get no `From` impl and do not need a `context` field, so
///   several wrapping levels can share one source type.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants with a source (other than `#[nested]` ones) must include a
///    `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping errors name the field `source` or mark it `#[source]`/`#[from]`.
/// 4. Tuple or unit variants are rejected.
///
/// # Generated Items
///
/// * `Result<T, E = ErrorName>` type alias in the same module.
/// * `<ErrorName>Ext` trait.
/// * `From` impls as described above.
/// * A private `format_context` helper used by the `#[error]` strings.
///
/// # Example
///
/// ```rust,ignore
/// use fpm_derive::fpm_error;
/// use std::borrow::Cow;
///
/// #[fpm_error]
/// pub enum LoadError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Failed to load {path}")]
///     #[nested]
///     Loading { path: String, source: Box<LoadError> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String> {
///     std::fs::read_to_string(path).context("Reading descriptor")
/// }
/// ```
#[proc_macro_attribute]
pub fn fpm_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
