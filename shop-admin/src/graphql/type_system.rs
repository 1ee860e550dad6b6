//! The type system connecting GraphQL objects to relational tables.
//!
//! Every entity exposed by the API is a [`Record`]: a Rust struct with one field per column of a
//! table. Records are decoded from rows by position, using the column list in [`Record::TABLE`].
//! Writes go through a [`RecordInput`], which turns a GraphQL input object into a list of column
//! assignments.
//!
//! Both traits are normally derived, using [`Record`](macro@Record) and
//! [`RecordInput`](macro@RecordInput).

use super::backend::Error;
use crate::money::Money;
use crate::sql::db::Value;
use async_graphql::MaybeUndefined;
use chrono::{DateTime, Utc};

pub use shop_admin_derive::{Record, RecordInput};

/// Primary keys of all tables.
pub type Id = i32;

/// Static description of the table backing a [`Record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Table {
    /// The name of the table.
    pub name: &'static str,
    /// The primary key column.
    pub id: &'static str,
    /// Every column of the table, in the order of the fields of the record.
    pub columns: &'static [&'static str],
    /// A timestamp column to set to the current time on every update.
    pub touch: Option<&'static str>,
}

/// A table-backed entity.
pub trait Record: Clone + Send + Sync + Sized + 'static {
    /// The table this record is stored in.
    const TABLE: Table;

    /// The primary key of this record.
    fn id(&self) -> Id;

    /// Decode a record from the values of [`TABLE.columns`](Table::columns), in order.
    fn from_row(row: Vec<Value>) -> Result<Self, Error>;
}

/// A payload which creates or updates a [`Record`].
pub trait RecordInput: Send + Sync {
    /// The record created or updated by this input.
    type Record: Record;

    /// The columns to write and their new values.
    ///
    /// Columns for which the input has no value are omitted, so that they take their default
    /// value on insert and keep their current value on update.
    fn assignments(&self) -> Vec<(&'static str, Value)>;
}

/// A field of a [`RecordInput`] which may assign a value to its column.
pub trait Assign {
    fn assign(&self, column: &'static str, assignments: &mut Vec<(&'static str, Value)>);
}

macro_rules! assign_value {
    ($($t:ty),+) => {
        $(
            impl Assign for $t {
                fn assign(&self, column: &'static str, assignments: &mut Vec<(&'static str, Value)>) {
                    assignments.push((column, self.clone().into()));
                }
            }
        )+
    };
}

assign_value!(String, i32, Money, DateTime<Utc>);

/// An optional field which, when absent, leaves the column alone.
impl<T: Assign> Assign for Option<T> {
    fn assign(&self, column: &'static str, assignments: &mut Vec<(&'static str, Value)>) {
        if let Some(value) = self {
            value.assign(column, assignments);
        }
    }
}

/// A field of a nullable column: absent leaves the column alone, and `null` clears it.
impl<T: Assign> Assign for MaybeUndefined<T> {
    fn assign(&self, column: &'static str, assignments: &mut Vec<(&'static str, Value)>) {
        match self {
            MaybeUndefined::Undefined => {}
            MaybeUndefined::Null => assignments.push((column, Value::Null)),
            MaybeUndefined::Value(value) => value.assign(column, assignments),
        }
    }
}

/// A column referencing another record.
pub trait ForeignKey {
    /// The referenced primary key, if any.
    fn key(&self) -> Option<Id>;
}

impl ForeignKey for Id {
    fn key(&self) -> Option<Id> {
        Some(*self)
    }
}

impl ForeignKey for Option<Id> {
    fn key(&self) -> Option<Id> {
        *self
    }
}

/// Declare an enum stored in a text column and exposed as a GraphQL enum.
///
/// Each variant is given with the text stored in the database, which is also its GraphQL name.
/// The generated type gets [`From`] and [`FromValue`](crate::sql::db::FromValue) conversions, an
/// [`Assign`] implementation and an `ALL` constant listing every stored text, which is useful for
/// check constraints.
#[macro_export]
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $text:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, $crate::graphql::Enum)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[graphql(name = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every value of this type, as stored in the database.
            pub const ALL: &'static [&'static str] = &[$($text),+];

            /// This value as stored in the database.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {} {s:?}", stringify!($name))),
                }
            }
        }

        impl From<$name> for $crate::sql::db::Value {
            fn from(value: $name) -> Self {
                Self::Text(value.as_str().into())
            }
        }

        impl $crate::sql::db::FromValue for $name {
            fn from_value(value: $crate::sql::db::Value) -> Result<Self, String> {
                <String as $crate::sql::db::FromValue>::from_value(value)?.parse()
            }
        }

        impl $crate::graphql::type_system::Assign for $name {
            fn assign(
                &self,
                column: &'static str,
                assignments: &mut Vec<(&'static str, $crate::sql::db::Value)>,
            ) {
                assignments.push((column, (*self).into()));
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sql::db::FromValue;

    crate::text_enum! {
        enum Light {
            Red = "red",
            Amber = "amber_light",
        }
    }

    #[test]
    fn test_assign() {
        let mut assignments = vec![];
        "x".to_string().assign("a", &mut assignments);
        None::<i32>.assign("b", &mut assignments);
        Some(3).assign("c", &mut assignments);
        MaybeUndefined::<i32>::Undefined.assign("d", &mut assignments);
        MaybeUndefined::<i32>::Null.assign("e", &mut assignments);
        MaybeUndefined::Value(Money::from_cents(1)).assign("f", &mut assignments);
        Light::Amber.assign("g", &mut assignments);
        assert_eq!(
            assignments,
            [
                ("a", Value::from("x")),
                ("c", Value::Int4(3)),
                ("e", Value::Null),
                ("f", Value::Money(Money::from_cents(1))),
                ("g", Value::from("amber_light")),
            ]
        );
    }

    #[test]
    fn test_text_enum() {
        assert_eq!(Light::ALL, ["red", "amber_light"]);
        assert_eq!(Light::Red.to_string(), "red");
        assert_eq!(Light::from_value("amber_light".into()), Ok(Light::Amber));
        assert!(Light::from_value("green".into()).is_err());
        assert!(Light::from_value(Value::Int4(0)).is_err());
    }

    #[test]
    fn test_foreign_key() {
        assert_eq!(ForeignKey::key(&3), Some(3));
        assert_eq!(ForeignKey::key(&None::<Id>), None);
    }
}
