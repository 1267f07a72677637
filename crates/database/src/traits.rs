//! PostgreSQL serialization traits.
use tokio_postgres::Row;

/// Schema metadata for PostgreSQL tables.
///
/// Provides compile-time SQL generation for table creation and indexing.
/// All methods return `&'static str` to avoid runtime allocations and
/// enable compile-time string construction via [`const_format::concatcp!`].
///
/// This trait contains no I/O operations, it purely describes table
/// structure; queries live in the store traits.
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
}

/// Derived table generation from enumerable domain values.
///
/// For tables whose contents can be exhaustively enumerated at runtime
/// (the stake catalog), this trait generates INSERT statements
/// programmatically. Seeding is idempotent via `ON CONFLICT DO NOTHING`.
pub trait Derive: Sized + Schema {
    /// Enumerates all values that should be inserted into the table.
    fn exhaust() -> Vec<Self>;
    /// Formats this value as an INSERT statement.
    fn inserts(&self) -> String;
    /// Generates a batch of INSERT statements for all enumerated values.
    fn derives() -> String {
        Self::exhaust()
            .iter()
            .map(Self::inserts)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Row → domain record decoding.
///
/// Column order and types must match the SELECT lists in the store
/// traits, which in turn match the [`Schema`] DDL.
pub trait Load: Sized {
    fn load(row: &Row) -> Self;
}
