//! Derive macro for table-backed GraphQL objects.

use super::{db_path, graphql_path, RelationArg};
use crate::helpers::{parse_docs, AttrParser};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{parse::Parse, Attribute, Data, DeriveInput, Field, Fields, Ident};

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
        panic!("Record cannot be derived on generic types");
    }
    match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(fields) => {
                generate_struct(ident, attrs, fields.named.into_iter().collect())
            }
            _ => panic!("Record can only be derived for structs with named fields"),
        },
        _ => panic!("Record can only be derived for structs"),
    }
}

fn generate_struct(name: Ident, attrs: Vec<Attribute>, fields: Vec<Field>) -> TokenStream {
    let graphql = graphql_path();
    let db = db_path();
    let p = AttrParser::new("record");

    // We will generate the impls in an anonymous module so we can bring things into scope.
    let mod_name = format_ident!("__record_{}", name);
    let doc = parse_docs(&attrs);

    let snake_name = name.to_string().to_case(Case::Snake);
    let table = p
        .get_arg::<Ident, _>(&attrs, "table")
        .map(|table| table.to_string())
        .unwrap_or_else(|| format!("{snake_name}s"));

    let field_name = |field: &Field| field.ident.clone().unwrap();
    let columns = fields
        .iter()
        .map(|field| field_name(field).to_string())
        .collect::<Vec<_>>();

    // The primary key is either marked explicitly or follows the `{record}_id` convention.
    let default_id = format!("{snake_name}_id");
    let id = fields
        .iter()
        .find(|field| p.has_bool(&field.attrs, "id"))
        .or_else(|| fields.iter().find(|field| field_name(field) == default_id))
        .map(field_name)
        .unwrap_or_else(|| {
            panic!("{name} has no primary key: mark one field with #[record(id)] or name it {default_id}")
        });
    let id_column = id.to_string();

    let touch = match p.get_arg::<Ident, _>(&attrs, "touch") {
        Some(column) => {
            let column = column.to_string();
            if !columns.contains(&column) {
                panic!("{name} has no column {column} to touch");
            }
            quote!(Some(#column))
        }
        None => quote!(None),
    };

    // Decode each field from the next value of the row.
    let decoders = fields.iter().map(|field| {
        let ident = field_name(field);
        let column = ident.to_string();
        quote! {
            #ident: {
                let value = values.next().ok_or_else(|| {
                    Error::decode(&Self::TABLE, #column, "missing column")
                })?;
                FromValue::from_value(value)
                    .map_err(|err| Error::decode(&Self::TABLE, #column, err))?
            }
        }
    });

    // One resolver per column. The primary key is exposed as an `ID`.
    let field_resolvers = fields.iter().map(|field| {
        let ident = field_name(field);
        let ty = &field.ty;
        let doc = parse_docs(&field.attrs);
        if ident == id {
            quote! {
                #[doc = #doc]
                async fn #ident(&self) -> ID {
                    ID(self.#ident.to_string())
                }
            }
        } else {
            quote! {
                #[doc = #doc]
                async fn #ident(&self) -> &#ty {
                    &self.#ident
                }
            }
        }
    });

    // One resolver per relation, each a single lookup through the store.
    let belongs_to = p
        .get_args_with(&attrs, "belongs_to", RelationArg::parse)
        .into_iter()
        .map(|RelationArg { name, target, key }| {
            if !columns.contains(&key.to_string()) {
                panic!("belongs_to({name}) refers to missing column {key}");
            }
            quote! {
                async fn #name(&self, ctx: &Context<'_>) -> Result<Option<#target>> {
                    let Some(id) = ForeignKey::key(&self.#key) else { return Ok(None); };
                    Ok(ctx.data::<Store>()?.find::<#target>(id).await?)
                }
            }
        });
    let has_many = p
        .get_args_with(&attrs, "has_many", RelationArg::parse)
        .into_iter()
        .map(|RelationArg { name, target, key }| {
            let key = key.to_string();
            quote! {
                async fn #name(&self, ctx: &Context<'_>) -> Result<Vec<#target>> {
                    let id = <Self as type_system::Record>::id(self);
                    Ok(ctx.data::<Store>()?.all_by::<#target>(#key, id.into()).await?)
                }
            }
        });
    let has_one = p
        .get_args_with(&attrs, "has_one", RelationArg::parse)
        .into_iter()
        .map(|RelationArg { name, target, key }| {
            let key = key.to_string();
            quote! {
                async fn #name(&self, ctx: &Context<'_>) -> Result<Option<#target>> {
                    let id = <Self as type_system::Record>::id(self);
                    Ok(ctx.data::<Store>()?.first_by::<#target>(#key, id.into()).await?)
                }
            }
        });

    quote! {
        #[allow(non_snake_case, unused_imports)]
        mod #mod_name {
            use super::*;
            use #graphql::{
                async_graphql,
                backend::{DataSourceExt as _, Error},
                type_system::{self, ForeignKey, Id, Table},
                Context, Object, Result, Store, ID,
            };
            use #db::{FromValue, Value};

            impl type_system::Record for #name {
                const TABLE: Table = Table {
                    name: #table,
                    id: #id_column,
                    columns: &[#(#columns),*],
                    touch: #touch,
                };

                fn id(&self) -> Id {
                    self.#id
                }

                fn from_row(row: Vec<Value>) -> std::result::Result<Self, Error> {
                    let mut values = row.into_iter();
                    Ok(Self {
                        #(#decoders),*
                    })
                }
            }

            #[Object(rename_fields = "snake_case")]
            #[doc = #doc]
            impl #name {
                #(#field_resolvers)*
                #(#belongs_to)*
                #(#has_many)*
                #(#has_one)*
            }
        }
    }
}
