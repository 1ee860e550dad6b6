//! Derive macros for the GraphQL API.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    Ident, Path, Token,
};

pub mod input;
pub mod record;

/// The path of the `shop_admin::graphql` module in the scope invoking a procedural macro.
fn graphql_path() -> TokenStream {
    quote!(shop_admin::graphql)
}

/// The path of the `shop_admin::sql::db` module in the scope invoking a procedural macro.
fn db_path() -> TokenStream {
    quote!(shop_admin::sql::db)
}

/// The argument of a relation attribute, like `category: Category = category_id`.
///
/// `name` is the resolver, `target` the related record and `key` the column linking the two.
struct RelationArg {
    name: Ident,
    target: Path,
    key: Ident,
}

impl Parse for RelationArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![:]>()?;
        let target = input.parse()?;
        input.parse::<Token![=]>()?;
        let key = input.parse()?;
        Ok(Self { name, target, key })
    }
}
