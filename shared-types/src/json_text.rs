//! Typed JSON storage for Diesel TEXT columns.
//!
//! Meeting rows carry list-valued columns (attendee emails, action items)
//! in TEXT columns. This wrapper serializes the typed value to JSON on
//! write and parses it back on read, so list data never round-trips
//! through free text.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// A typed value stored as a JSON string in a TEXT column.
///
/// Reading a row fails with a deserialize error if the stored text is not
/// valid JSON for `T`; there is no fallback interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::AsExpression, diesel::FromSqlRow))]
#[cfg_attr(feature = "diesel", diesel(sql_type = diesel::sql_types::Text))]
#[serde(transparent)]
pub struct JsonText<T>(pub T);

impl<T> JsonText<T> {
    pub fn new(value: T) -> Self {
        JsonText(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Default> Default for JsonText<T> {
    fn default() -> Self {
        JsonText(T::default())
    }
}

impl<T> Deref for JsonText<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for JsonText<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<T> for JsonText<T> {
    fn from(value: T) -> Self {
        JsonText(value)
    }
}

#[cfg(feature = "diesel")]
mod diesel_impls {
    use super::JsonText;
    use diesel::deserialize::FromSql;
    use diesel::pg::{Pg, PgValue};
    use diesel::serialize::{IsNull, Output, ToSql};
    use diesel::sql_types::Text;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use std::fmt;
    use std::io::Write;

    impl<T> FromSql<Text, Pg> for JsonText<T>
    where
        T: DeserializeOwned,
    {
        fn from_sql(bytes: PgValue<'_>) -> diesel::deserialize::Result<Self> {
            let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
            let value: T = serde_json::from_str(&s)
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            Ok(JsonText(value))
        }
    }

    impl<T> ToSql<Text, Pg> for JsonText<T>
    where
        T: Serialize + fmt::Debug,
    {
        fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> diesel::serialize::Result {
            let s = serde_json::to_string(&self.0)?;
            out.write_all(s.as_bytes())?;
            Ok(IsNull::No)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendee_list_round_trips_through_json() {
        let attendees = JsonText::new(vec![
            "ana@example.com".to_string(),
            "ben@example.com".to_string(),
        ]);

        let json = serde_json::to_string(&attendees).unwrap();
        assert_eq!(json, r#"["ana@example.com","ben@example.com"]"#);

        let parsed: JsonText<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, attendees);
    }

    #[test]
    fn rejects_non_json_text() {
        // The legacy store wrote Python-repr lists; those must not parse.
        let result: Result<JsonText<Vec<String>>, _> =
            serde_json::from_str("['ana@example.com']");
        assert!(result.is_err());
    }

    #[test]
    fn derefs_to_inner_list() {
        let items = JsonText::new(vec!["Send deck".to_string()]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], "Send deck");
        assert_eq!(items.into_inner(), vec!["Send deck".to_string()]);
    }

    #[test]
    fn default_is_empty_list() {
        let empty: JsonText<Vec<String>> = JsonText::default();
        assert!(empty.is_empty());
    }
}
