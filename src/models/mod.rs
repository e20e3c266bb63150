// Data models for the realty back office
// One module per table family; status columns are TEXT-backed enums

pub mod appointment;
pub mod lead;
pub mod maintenance;
pub mod notification;
pub mod owner;
pub mod property;
pub mod rent_payment;
pub mod subscription;
pub mod tenant;

// Re-export common types
pub use appointment::*;
pub use lead::*;
pub use maintenance::*;
pub use notification::*;
pub use owner::*;
pub use property::*;
pub use rent_payment::*;
pub use subscription::*;
pub use tenant::*;

/// Implements Postgres TEXT (de)serialization and `Display` for an enum that
/// has `as_str()` and a `FromStr<Err = String>` impl.
macro_rules! text_column_enum {
    ($ty:ty) => {
        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::pg::Pg,
                >>::from_sql(bytes)?;
                value.parse::<$ty>().map_err(|e| e.into())
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                <str as diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg>>::to_sql(
                    self.as_str(),
                    out,
                )
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_column_enum;
