#![allow(unreachable_pub)]

//! # Derive
//!
//! Procedural macros shared by the workspace crates.
//!
//! Currently a single attribute, [`macro@herald_error`], which turns a plain enum into
//! the error type convention used across the workspace.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a workspace error type.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]`, skipping whichever the enum already derives.
/// * A `<Name>Ext` trait adding `.context(...)` to `Result<T, Name>` and, for every
///   variant holding a `source`, to `Result<T, SourceError>` as well.
/// * `From<SourceError>` for each variant with a source field (named `source`, or
///   marked `#[source]` / `#[from]`).
/// * `From<&'static str>` and `From<String>` when an `Internal { message, context }`
///   variant exists.
/// * `variant_name(&self) -> &'static str`, used as the `kind` field in logs.
/// * A module-private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// Variants must have named fields. A variant with a source must also carry
/// `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[herald_derive::herald_error]
/// pub enum LoadError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(path: &str) -> Result<String, LoadError> {
///     std::fs::read_to_string(path).context("Reading settings file")
/// }
/// ```
#[proc_macro_attribute]
pub fn herald_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(&input).into()
}
