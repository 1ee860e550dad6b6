//! Derive macros for the `shop_admin` crate.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod graphql;
mod helpers;

/// Derive an implementation of `Record`, and a GraphQL object, for a struct.
///
/// The struct describes one row of a table: it must have a named field for every column, in the
/// order of the columns, and each field type must implement `FromValue`. The macro generates:
/// * An implementation of `Record`, describing the table and decoding the struct from a row.
/// * An `async_graphql` `#[Object]` `impl` block with a resolver for each field, named like the
///   field. The resolver for the primary key returns an `ID`; the others return a reference to the
///   field, which must be an `OutputType`.
/// * A resolver for each relation declared with a struct attribute. Relations are loaded on
///   demand, one query each, through the `Store` in the GraphQL context data.
///
/// Documentation on the struct and its fields is propagated to the GraphQL schema.
///
/// # Examples
///
/// ```ignore
/// /// A product category.
/// #[derive(Clone, Debug, Record)]
/// #[record(table(categories), has_many(products: Product = category_id))]
/// pub struct Category {
///     pub category_id: Id,
///     pub category_name: String,
/// }
///
/// #[derive(Clone, Debug, Record)]
/// #[record(belongs_to(category: Category = category_id))]
/// pub struct Product {
///     pub product_id: Id,
///     pub category_id: Option<Id>,
/// }
/// ```
///
/// # Struct attributes
///
/// | Attribute  | Description                                                     | Arg    | Required |
/// |------------|-----------------------------------------------------------------|--------|----------|
/// | table      | The table storing the records. Defaults to the snake_case struct name with an `s` appended. | ident | no |
/// | touch      | A timestamp column set to the current time by every update.    | ident  | no       |
/// | belongs_to | `name: Target = column`: the `Target` referenced by the foreign key `column` of this record, or `null`. | relation | no |
/// | has_many   | `name: Target = column`: every `Target` whose `column` references this record. | relation | no |
/// | has_one    | `name: Target = column`: the first `Target` whose `column` references this record, or `null`. | relation | no |
///
/// # Field attributes
///
/// | Attribute  | Description                                                     | Arg    | Required |
/// |------------|-----------------------------------------------------------------|--------|----------|
/// | id         | Use this field as the primary key. Can be omitted if the field is named after the struct, as in `category_id` for `Category`. | n/a | no |
#[proc_macro_derive(Record, attributes(record))]
pub fn record(input: TokenStream) -> TokenStream {
    graphql::record::derive(parse_macro_input!(input)).into()
}

/// Derive an implementation of `RecordInput` for a struct.
///
/// Each field assigns to the column with the same name, through the field type's `Assign`
/// implementation: `Option` fields assign nothing when absent and `MaybeUndefined` fields assign
/// nothing when undefined and `NULL` when null.
///
/// # Struct attributes
///
/// | Attribute  | Description                                                     | Arg    | Required |
/// |------------|-----------------------------------------------------------------|--------|----------|
/// | target     | The record written by this input. Defaults to the struct name without its `Input` suffix. | path | no |
///
/// # Field attributes
///
/// | Attribute  | Description                                                     | Arg    | Required |
/// |------------|-----------------------------------------------------------------|--------|----------|
/// | column     | Assign to this column instead of the one named like the field. | ident  | no       |
/// | skip       | Do not assign this field to any column.                         | n/a    | no       |
#[proc_macro_derive(RecordInput, attributes(record))]
pub fn record_input(input: TokenStream) -> TokenStream {
    graphql::input::derive(parse_macro_input!(input)).into()
}
