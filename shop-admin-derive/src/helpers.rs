//! Helper functions for implementing procedural macros.

use itertools::Itertools;
use proc_macro2::TokenStream;
use std::borrow::Borrow;
use syn::{
    parenthesized,
    parse::{Parse, Parser},
    Attribute, Expr, Ident, Lit, Meta,
};

/// Convenient parsing interface for helper attributes.
pub struct AttrParser(String);

impl AttrParser {
    /// Create a new parser for attributes in `scope`, the top-level identifier of attributes parsed
    /// by this parser.
    ///
    /// This parser will parse attributes of the form `#[scope(name)]` (boolean attributes) or
    /// `#[scope(name(arg))]` (argument attributes). A single attribute may hold several items, as
    /// in `#[scope(name1(arg), name2)]`.
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// Check if a list of attributes has a certain boolean attribute.
    pub fn has_bool<I>(&self, attrs: I, name: &str) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<Attribute>,
    {
        attrs.into_iter().any(|a| {
            self.parse_attr(a.borrow())
                .into_iter()
                .any(|(attr_name, param)| attr_name == name && param.is_none())
        })
    }

    /// Check if a list of attributes has a certain attribute and return its argument.
    ///
    /// # Panics
    ///
    /// Panics if the attribute exists but its argument does not parse as a `T`.
    pub fn get_arg<T: Parse, I>(&self, attrs: I, name: &str) -> Option<T>
    where
        I: IntoIterator,
        I::Item: Borrow<Attribute>,
    {
        self.get_args_with(attrs, name, T::parse).into_iter().next()
    }

    /// Get the arguments of every occurrence of a certain attribute, parsed using `p`.
    ///
    /// # Panics
    ///
    /// Panics if any of the arguments does not parse using `p`.
    pub fn get_args_with<P, I>(&self, attrs: I, name: &str, p: P) -> Vec<P::Output>
    where
        P: Parser + Copy,
        I: IntoIterator,
        I::Item: Borrow<Attribute>,
    {
        attrs
            .into_iter()
            .flat_map(|a| self.parse_attr(a.borrow()))
            .filter(|(attr_name, _)| attr_name == name)
            .map(|(_, param)| {
                let param = param.unwrap_or_else(|| panic!("{name} requires an argument"));
                p.parse2(param).unwrap_or_else(|err| {
                    panic!(
                        "argument to {name} must be a {}: {err}",
                        std::any::type_name::<P::Output>(),
                    )
                })
            })
            .collect()
    }

    /// Parse an attribute in this scope, returning the name and parameter of each of its items.
    ///
    /// For example, parsing the attribute `#[scope(foo(bar), baz)]` would result in
    /// `[("foo", Some("bar")), ("baz", None)]`. If `a` is not in scope, the result is empty.
    ///
    /// # Panics
    ///
    /// Panics if `a` is in scope but malformed (e.g. it's name is `self.scope()` but one of its
    /// items does not start with an identifier).
    pub fn parse_attr(&self, a: &Attribute) -> Vec<(Ident, Option<TokenStream>)> {
        let mut parsed = vec![];
        if a.path().is_ident(&self.0) {
            a.parse_nested_meta(|meta| {
                let name = meta.path.get_ident().unwrap_or_else(|| {
                    panic!("{} attribute must start with an identifier", self.0)
                });
                let content = if meta.input.is_empty() || meta.input.peek(syn::Token![,]) {
                    None
                } else {
                    let content;
                    parenthesized!(content in meta.input);
                    Some(content.parse()?)
                };
                parsed.push((name.clone(), content));
                Ok(())
            })
            .unwrap_or_else(|err| panic!("malformed {} attribute: {err}", self.0));
        }
        parsed
    }
}

/// Extract documentation from the attributes on an item.
///
/// The documentation is constructed by taking all the `#[doc = "..."]` attributes and concatenating
/// their arguments, separated by newlines.
pub fn parse_docs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            let Meta::NameValue(nv) = &attr.meta else { return None; };
            if !nv.path.is_ident("doc") {
                return None;
            }
            let Expr::Lit(lit) = &nv.value else { return None; };
            let Lit::Str(s) = &lit.lit else { return None; };
            Some(s.value().trim().to_string())
        })
        .join("\n")
}
