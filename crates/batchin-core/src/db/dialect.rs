use crate::db::{column::ColumnType, staging::TableName};
use derive_more::Display;
use std::fmt::Write as _;

// Widest utf8mb4 index key InnoDB accepts, in characters.
const MYSQL_TEXT_INDEX_PREFIX: u16 = 768;

///
/// Dialect
///
/// SQL surface differences the optimizer has to care about: identifier
/// quoting, placeholder style, staging column types, and temp-table DDL.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Dialect {
    #[display("mysql")]
    MySql,

    #[display("postgres")]
    Postgres,

    #[display("sqlite")]
    Sqlite,
}

impl Dialect {
    const fn quote_char(self) -> char {
        match self {
            Self::MySql => '`',
            Self::Postgres | Self::Sqlite => '"',
        }
    }

    /// Append a quoted identifier, doubling any embedded quote character.
    pub fn push_ident(self, out: &mut String, ident: &str) {
        let quote = self.quote_char();

        out.push(quote);
        for c in ident.chars() {
            if c == quote {
                out.push(quote);
            }
            out.push(c);
        }
        out.push(quote);
    }

    #[must_use]
    pub fn quote_ident(self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 2);
        self.push_ident(&mut out, ident);

        out
    }

    /// Append the placeholder for the 1-based parameter `index`.
    pub fn push_placeholder(self, out: &mut String, index: usize) {
        match self {
            Self::Postgres => {
                let _ = write!(out, "${index}");
            }
            Self::MySql | Self::Sqlite => out.push('?'),
        }
    }

    /// Column type used for the staging table's single column.
    #[must_use]
    pub const fn staging_type(self, ty: ColumnType) -> &'static str {
        match self {
            Self::Postgres => match ty {
                ColumnType::BigInt => "BIGINT",
                ColumnType::Boolean => "BOOLEAN",
                ColumnType::Date => "DATE",
                ColumnType::Double => "DOUBLE PRECISION",
                ColumnType::Integer => "INTEGER",
                ColumnType::Json => "JSONB",
                ColumnType::SmallInt => "SMALLINT",
                ColumnType::Text => "TEXT",
                ColumnType::Timestamp => "TIMESTAMP",
                ColumnType::TimestampTz => "TIMESTAMPTZ",
            },
            Self::MySql => match ty {
                ColumnType::BigInt => "BIGINT",
                ColumnType::Boolean => "BOOLEAN",
                ColumnType::Date => "DATE",
                ColumnType::Double => "DOUBLE",
                ColumnType::Integer => "INT",
                ColumnType::Json => "JSON",
                ColumnType::SmallInt => "SMALLINT",
                ColumnType::Text => "TEXT",
                ColumnType::Timestamp => "DATETIME(6)",
                ColumnType::TimestampTz => "TIMESTAMP(6)",
            },
            Self::Sqlite => match ty {
                ColumnType::BigInt
                | ColumnType::Boolean
                | ColumnType::Integer
                | ColumnType::SmallInt => "INTEGER",
                ColumnType::Double => "REAL",
                ColumnType::Date
                | ColumnType::Json
                | ColumnType::Text
                | ColumnType::Timestamp
                | ColumnType::TimestampTz => "TEXT",
            },
        }
    }

    /// Whether the staging column can carry a plain secondary index.
    #[must_use]
    pub const fn supports_index(self, ty: ColumnType) -> bool {
        !matches!((self, ty), (Self::MySql, ColumnType::Json))
    }

    /// Key prefix length for indexing the staging column, if the dialect
    /// requires one.
    ///
    /// MySQL cannot index TEXT without one. The column itself still stores
    /// values in full, so lookups stay exact.
    #[must_use]
    pub const fn index_prefix(self, ty: ColumnType) -> Option<u16> {
        match (self, ty) {
            (Self::MySql, ColumnType::Text) => Some(MYSQL_TEXT_INDEX_PREFIX),
            _ => None,
        }
    }

    #[must_use]
    pub fn create_temp_table(self, table: &TableName, column: &str, ty: ColumnType) -> String {
        let mut sql = String::from(match self {
            Self::MySql | Self::Postgres => "CREATE TEMPORARY TABLE ",
            Self::Sqlite => "CREATE TEMP TABLE ",
        });

        self.push_ident(&mut sql, table.as_str());
        sql.push_str(" (");
        self.push_ident(&mut sql, column);
        sql.push(' ');
        sql.push_str(self.staging_type(ty));
        sql.push_str(" NOT NULL)");

        sql
    }

    #[must_use]
    pub fn create_index(
        self,
        index: &str,
        table: &TableName,
        column: &str,
        ty: ColumnType,
    ) -> String {
        let mut sql = String::from("CREATE INDEX ");

        self.push_ident(&mut sql, index);
        sql.push_str(" ON ");
        self.push_ident(&mut sql, table.as_str());
        sql.push_str(" (");
        self.push_ident(&mut sql, column);
        if let Some(len) = self.index_prefix(ty) {
            let _ = write!(sql, "({len})");
        }
        sql.push(')');

        sql
    }

    #[must_use]
    pub fn drop_table(self, table: &TableName, if_exists: bool) -> String {
        let mut sql = String::from(match self {
            Self::MySql => "DROP TEMPORARY TABLE ",
            Self::Postgres | Self::Sqlite => "DROP TABLE ",
        });

        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        self.push_ident(&mut sql, table.as_str());

        sql
    }
}

///
/// TESTS
///
