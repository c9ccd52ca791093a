use std::fmt;

use crate::errors::DashError;

/// Longest identifier the service accepts.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Hard cap on the rows shown in a table preview.
pub const PREVIEW_ROW_LIMIT: usize = 100;

/// A SQL identifier that is safe to splice into a statement.
///
/// Names typed by the user go through [`Identifier::parse`] and are rendered
/// unquoted, so the service folds them to upper case. Names that came back from
/// the catalog go through [`Identifier::quoted`] and are rendered in double
/// quotes, so they resolve to exactly the stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    name: String,
    quoted: bool,
}

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, DashError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashError::Validation("Name must not be empty".to_string()));
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(DashError::Validation(format!(
                "Name is longer than {} characters",
                MAX_IDENTIFIER_LEN
            )));
        }

        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if !first_ok || !rest_ok {
            return Err(DashError::Validation(format!(
                "Invalid name '{}': use letters, digits, '_' or '$', starting with a letter or '_'",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            quoted: false,
        })
    }

    pub fn quoted(name: &str) -> Result<Self, DashError> {
        if name.is_empty() || name.contains('\0') {
            return Err(DashError::Validation(format!(
                "Invalid catalog name '{}'",
                name.escape_default()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            quoted: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as the service stores it: unquoted names fold to upper case.
    pub fn stored_name(&self) -> String {
        if self.quoted {
            self.name.clone()
        } else {
            self.name.to_ascii_uppercase()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.name.replace('"', "\"\""))
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Column definitions for `CREATE TABLE`, e.g. `id INT, name VARCHAR(100)`.
///
/// Only a restricted character set is allowed, which keeps quotes, statement
/// terminators and comments out of the statement. Syntax is checked by the
/// service, including parenthesis balance, so a stray `)` can still close the
/// column list early and reshape the statement, e.g. into
/// `CREATE TABLE t (id INT) AS SELECT ...`. The statement runs with the
/// logged-in user's privileges and nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefs(String);

impl ColumnDefs {
    pub fn parse(defs: &str) -> Result<Self, DashError> {
        let defs = defs.trim();
        if defs.is_empty() {
            return Err(DashError::Validation(
                "Column definitions must not be empty".to_string(),
            ));
        }

        if let Some(bad) = defs.chars().find(|c| {
            !(c.is_ascii_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '_' | '$' | ',' | '.' | '(' | ')'))
        }) {
            return Err(DashError::Validation(format!(
                "Column definitions may not contain '{}'",
                bad
            )));
        }

        Ok(Self(defs.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified location of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub table: String,
}

/// Up to [`PREVIEW_ROW_LIMIT`] rows of a table, aligned to its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePreview {
    pub location: TableLocation,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TablePreview {
    pub fn new(
        location: TableLocation,
        columns: Vec<String>,
        mut rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, DashError> {
        if let Some(bad) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(DashError::Query(format!(
                "Row {} has {} values but the result has {} columns",
                bad,
                rows[bad].len(),
                columns.len()
            )));
        }
        rows.truncate(PREVIEW_ROW_LIMIT);

        Ok(Self {
            location,
            columns,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }
}

/// A DDL command issued from one of the creation forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRequest {
    Warehouse {
        name: Identifier,
    },
    Database {
        name: Identifier,
        warehouse: Identifier,
    },
    Schema {
        name: Identifier,
        database: Identifier,
    },
    Table {
        name: Identifier,
        schema: Identifier,
        columns: ColumnDefs,
    },
}

impl CreateRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            CreateRequest::Warehouse { .. } => "Warehouse",
            CreateRequest::Database { .. } => "Database",
            CreateRequest::Schema { .. } => "Schema",
            CreateRequest::Table { .. } => "Table",
        }
    }

    pub fn name(&self) -> &Identifier {
        match self {
            CreateRequest::Warehouse { name }
            | CreateRequest::Database { name, .. }
            | CreateRequest::Schema { name, .. }
            | CreateRequest::Table { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> TableLocation {
        TableLocation {
            warehouse: "WH_A".to_string(),
            database: "DB1".to_string(),
            schema: "PUBLIC".to_string(),
            table: "USERS".to_string(),
        }
    }

    #[test]
    fn test_identifier_accepts_plain_names() {
        let ident = Identifier::parse("  sales_2024$ ").unwrap();
        assert_eq!(ident.name(), "sales_2024$");
        assert_eq!(ident.to_string(), "sales_2024$");
        assert_eq!(ident.stored_name(), "SALES_2024$");
        assert!(Identifier::parse("_tmp").is_ok());
    }

    #[test]
    fn test_identifier_rejects_injection() {
        for bad in [
            "",
            "   ",
            "1abc",
            "a b",
            "x; DROP DATABASE prod",
            "a--b",
            "\"quoted\"",
            "db.schema",
        ] {
            let err = Identifier::parse(bad).unwrap_err();
            assert!(err.is_validation(), "{bad:?} should be rejected");
        }
        assert!(Identifier::parse(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn test_quoted_identifier_escapes_quotes() {
        let ident = Identifier::quoted("my \"odd\" db").unwrap();
        assert_eq!(ident.to_string(), "\"my \"\"odd\"\" db\"");
        assert_eq!(ident.stored_name(), "my \"odd\" db");
        assert!(Identifier::quoted("").is_err());
    }

    #[test]
    fn test_column_defs() {
        let defs = ColumnDefs::parse(" id INT, price NUMBER(10,2), name VARCHAR(100) ").unwrap();
        assert_eq!(defs.as_str(), "id INT, price NUMBER(10,2), name VARCHAR(100)");

        // Unbalanced parentheses are left for the service to reject.
        assert!(ColumnDefs::parse("id INT, name VARCHAR(100))").is_ok());

        // A stray `)` can reshape the statement; it still reaches the service as typed.
        let reshaped = ColumnDefs::parse("id INT) AS SELECT id FROM other_db.s.t WHERE (1").unwrap();
        assert_eq!(reshaped.to_string(), "id INT) AS SELECT id FROM other_db.s.t WHERE (1");

        assert!(ColumnDefs::parse("").is_err());
        assert!(ColumnDefs::parse("id INT); DROP TABLE x; --").is_err());
        assert!(ColumnDefs::parse("name VARCHAR DEFAULT 'x'").is_err());
        assert!(ColumnDefs::parse("id INT /* c */").is_err());
    }

    #[test]
    fn test_preview_caps_rows() {
        let rows = (0..250)
            .map(|i| vec![Some(i.to_string())])
            .collect::<Vec<_>>();
        let preview = TablePreview::new(location(), vec!["ID".to_string()], rows).unwrap();
        assert_eq!(preview.rows().len(), PREVIEW_ROW_LIMIT);
        assert_eq!(preview.rows()[0][0].as_deref(), Some("0"));
    }

    #[test]
    fn test_preview_rejects_misaligned_rows() {
        let result = TablePreview::new(
            location(),
            vec!["ID".to_string(), "NAME".to_string()],
            vec![vec![Some("1".to_string()), None], vec![Some("2".to_string())]],
        );
        assert!(matches!(result, Err(DashError::Query(_))));
    }
}
