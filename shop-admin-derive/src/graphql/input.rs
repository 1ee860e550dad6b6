//! Derive macro for create and update payloads of records.

use super::{db_path, graphql_path};
use crate::helpers::AttrParser;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, Path};

pub fn derive(
    DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    }: DeriveInput,
) -> TokenStream {
    if !generics.params.is_empty() {
        panic!("RecordInput cannot be derived on generic types");
    }
    match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(fields) => {
                generate_struct(ident, attrs, fields.named.into_iter().collect())
            }
            _ => panic!("RecordInput can only be derived for structs with named fields"),
        },
        _ => panic!("RecordInput can only be derived for structs"),
    }
}

fn generate_struct(name: Ident, attrs: Vec<Attribute>, fields: Vec<Field>) -> TokenStream {
    let graphql = graphql_path();
    let db = db_path();
    let p = AttrParser::new("record");
    let mod_name = format_ident!("__record_input_{}", name);

    // `FooInput` writes `Foo` unless told otherwise.
    let target = p.get_arg::<Path, _>(&attrs, "target").unwrap_or_else(|| {
        let target = name
            .to_string()
            .strip_suffix("Input")
            .map(|target| format_ident!("{target}"))
            .unwrap_or_else(|| panic!("{name} needs a #[record(target(...))] attribute"));
        target.into()
    });

    // Each field assigns to the column of the same name, unless renamed.
    let assignments = fields
        .iter()
        .filter(|field| !p.has_bool(&field.attrs, "skip"))
        .map(|field| {
            let ident = field.ident.as_ref().unwrap();
            let column = p
                .get_arg::<Ident, _>(&field.attrs, "column")
                .unwrap_or_else(|| ident.clone())
                .to_string();
            quote! {
                Assign::assign(&self.#ident, #column, &mut assignments);
            }
        });

    quote! {
        #[allow(non_snake_case)]
        mod #mod_name {
            use super::*;
            use #graphql::type_system::{self, Assign};
            use #db::Value;

            impl type_system::RecordInput for #name {
                type Record = #target;

                fn assignments(&self) -> Vec<(&'static str, Value)> {
                    let mut assignments = Vec::new();
                    #(#assignments)*
                    assignments
                }
            }
        }
    }
}
