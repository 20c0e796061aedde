use crate::chain::StatementChain;
use crate::config::ChainerConfig;
use crate::error::Result;
use crate::params::ColumnValue;
use crate::query::PreparedStatement;
use crate::row::{FetchMode, Row};
use crate::sql::{self, AssembledStatement};

/// What [`RecordBuilder::select`] returns: one row for `limit <= 1`, all rows otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    One(Option<Row>),
    Many(Vec<Row>),
}

impl Selection {
    /// The single row, or the first of many.
    pub fn into_row(self) -> Option<Row> {
        match self {
            Selection::One(row) => row,
            Selection::Many(rows) => rows.into_iter().next(),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Selection::One(row) => row.into_iter().collect(),
            Selection::Many(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::One(row) => row.is_none(),
            Selection::Many(rows) => rows.is_empty(),
        }
    }
}

/// Table-oriented writes and raw selects on top of a [`StatementChain`].
///
/// Every write generates parameterized SQL (see [`crate::sql`]), binds all values
/// through the chain and runs it. Values are never written into the SQL text.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx_chainer::{ChainerConfig, ColumnValue, RecordBuilder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut records = RecordBuilder::connect(ChainerConfig::default().with_dbname("test")).await?;
///
/// let id = records
///     .insert("users", &[ColumnValue::new("name", "Ann"), ColumnValue::int("age", 30)])
///     .await?;
///
/// let updated = records
///     .update(
///         "users",
///         &[ColumnValue::int("age", 31)],
///         &[ColumnValue::int("id", id)],
///         1,
///     )
///     .await?;
/// assert_eq!(updated, 1);
///
/// let row = records
///     .select("SELECT * FROM users WHERE id = :id", 1, &[ColumnValue::int("id", id)])
///     .await?
///     .into_row();
/// println!("{row:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RecordBuilder {
    chain: StatementChain,
}

impl RecordBuilder {
    /// Wraps an existing chain.
    pub fn new(chain: StatementChain) -> Self {
        Self { chain }
    }

    /// Opens a new connection and wraps it.
    pub async fn connect(config: ChainerConfig) -> Result<Self> {
        Ok(Self::new(StatementChain::connect(config).await?))
    }

    pub fn chain(&self) -> &StatementChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut StatementChain {
        &mut self.chain
    }

    pub fn into_inner(self) -> StatementChain {
        self.chain
    }

    async fn run(&mut self, statement: AssembledStatement) -> Result<&mut StatementChain> {
        let AssembledStatement { sql, params } = statement;
        self.chain.prepare(sql)?.bind_values(&params)?.execute().await
    }

    /// Inserts one row and returns the generated identifier, `0` if the table
    /// has none.
    pub async fn insert(&mut self, table: &str, columns: &[ColumnValue]) -> Result<u64> {
        let statement = sql::insert_statement(table, columns)?;
        let id = self
            .run(statement)
            .await?
            .statement()
            .and_then(PreparedStatement::last_insert_id)
            .unwrap_or(0);
        tracing::debug!(table, id, "inserted row");
        Ok(id)
    }

    /// Updates up to `limit` rows matching every entry of `conditions` and
    /// returns the affected-row count.
    ///
    /// With no conditions, up to `limit` rows of the table are updated.
    pub async fn update(
        &mut self,
        table: &str,
        columns: &[ColumnValue],
        conditions: &[ColumnValue],
        limit: u64,
    ) -> Result<u64> {
        let statement = sql::update_statement(table, columns, conditions, limit)?;
        let affected = self.run(statement).await?.row_count()?;
        tracing::debug!(table, affected, "updated rows");
        Ok(affected)
    }

    /// Deletes up to `limit` rows matching every entry of `conditions`.
    pub async fn delete(&mut self, table: &str, conditions: &[ColumnValue], limit: u64) -> Result<u64> {
        let statement = sql::delete_statement(table, conditions, limit)?;
        let affected = self.run(statement).await?.row_count()?;
        tracing::debug!(table, affected, "deleted rows");
        Ok(affected)
    }

    /// Inserts all `rows` with one statement and returns the identifier the
    /// server reports for the batch, `0` if none.
    pub async fn insert_multi(&mut self, table: &str, rows: &[Vec<ColumnValue>]) -> Result<u64> {
        let statement = sql::insert_multi_statement(table, rows)?;
        let id = self
            .run(statement)
            .await?
            .statement()
            .and_then(PreparedStatement::last_insert_id)
            .unwrap_or(0);
        tracing::debug!(table, rows = rows.len(), id, "inserted rows");
        Ok(id)
    }

    /// Runs caller-written SQL with `:name` placeholders bound from `binds`.
    ///
    /// Returns [`Selection::Many`] with every row when `limit > 1`, otherwise
    /// [`Selection::One`] with the first row, if any.
    pub async fn select(&mut self, sql: &str, limit: u64, binds: &[ColumnValue]) -> Result<Selection> {
        let chain = self.chain.prepare(sql)?;
        for bind in binds {
            chain.bind_value(&bind.name, bind.value.clone(), bind.param_type)?;
        }
        chain.execute().await?;

        if limit > 1 {
            Ok(Selection::Many(chain.fetch_all(FetchMode::Assoc)?))
        } else {
            Ok(Selection::One(chain.fetch(FetchMode::Assoc)?))
        }
    }

    /// First row of `sql`, if any.
    pub async fn select_one(&mut self, sql: &str, binds: &[ColumnValue]) -> Result<Option<Row>> {
        Ok(self.select(sql, 1, binds).await?.into_row())
    }

    /// Every row of `sql`.
    pub async fn select_all(&mut self, sql: &str, binds: &[ColumnValue]) -> Result<Vec<Row>> {
        Ok(self.select(sql, u64::MAX, binds).await?.into_rows())
    }
}
