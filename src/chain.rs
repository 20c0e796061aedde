use std::fmt;

use sqlx::mysql::MySqlConnection;
use sqlx::Connection;

use crate::config::ChainerConfig;
use crate::error::{Error, Result};
use crate::params::ParameterSet;
use crate::query::PreparedStatement;
use crate::row::{FetchMode, Row};
use crate::value::{ParamType, Value};

/// Lifecycle of the statement held by a [`StatementChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Connected, nothing prepared yet.
    Idle,
    /// A statement is prepared and has no bound values.
    Prepared,
    /// At least one value is bound and the statement has not run yet.
    Bound,
    /// The statement ran; its rows can be fetched.
    Executed,
}

/// A single MySQL connection with at most one prepared statement, driven
/// through chained calls.
///
/// Every step returns `Result<&mut Self>`, so a whole round trip reads as one
/// expression. Preparing again discards the previous statement together with
/// its bindings and buffered rows.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx_chainer::{ChainerConfig, FetchMode, ParamType, StatementChain};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut chain = StatementChain::connect(ChainerConfig::default().with_dbname("test")).await?;
///
/// let row = chain
///     .prepare("SELECT name FROM users WHERE id = :id")?
///     .bind_value(":id", 42, ParamType::Int)?
///     .execute()
///     .await?
///     .fetch(FetchMode::Assoc)?;
///
/// if let Some(row) = row {
///     println!("name = {:?}", row.get("name"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct StatementChain {
    conn: MySqlConnection,
    config: ChainerConfig,
    statement: Option<PreparedStatement>,
    last_insert_id: Option<u64>,
}

impl fmt::Debug for StatementChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementChain")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("statement", &self.statement.as_ref().map(PreparedStatement::sql))
            .field("last_insert_id", &self.last_insert_id)
            .finish()
    }
}

impl StatementChain {
    /// Opens the connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the server cannot be reached or
    /// rejects the credentials.
    pub async fn connect(config: ChainerConfig) -> Result<Self> {
        match MySqlConnection::connect_with(&config.connect_options()).await {
            Ok(conn) => {
                tracing::debug!(
                    host = %config.host,
                    port = config.port,
                    dbname = ?config.dbname,
                    "connected"
                );
                Ok(Self::from_connection(conn, config))
            }
            Err(e) => {
                let err = Error::Connection(e);
                config.error_mode.report("database connection failed", &err);
                Err(err)
            }
        }
    }

    /// Wraps an already open connection.
    pub fn from_connection(conn: MySqlConnection, config: ChainerConfig) -> Self {
        Self {
            conn,
            config,
            statement: None,
            last_insert_id: None,
        }
    }

    pub fn config(&self) -> &ChainerConfig {
        &self.config
    }

    pub fn state(&self) -> ChainState {
        match &self.statement {
            None => ChainState::Idle,
            Some(s) if s.is_executed() => ChainState::Executed,
            Some(s) if s.is_bound() => ChainState::Bound,
            Some(_) => ChainState::Prepared,
        }
    }

    /// The currently prepared statement.
    pub fn statement(&self) -> Option<&PreparedStatement> {
        self.statement.as_ref()
    }

    /// Replaces the current statement with `sql`, which may use `:name` placeholders.
    pub fn prepare<T>(&mut self, sql: T) -> Result<&mut Self>
    where
        T: Into<String>,
    {
        let statement = PreparedStatement::new(sql)?;
        tracing::debug!(sql = statement.sql(), "prepared statement");
        self.statement = Some(statement);
        Ok(self)
    }

    /// Binds one value to a named placeholder of the current statement.
    ///
    /// # Errors
    ///
    /// [`Error::NoStatement`] before `prepare`, [`Error::UnknownPlaceholder`] if the
    /// statement has no such placeholder, [`Error::Coercion`] if the value does not fit
    /// `param_type`.
    pub fn bind_value(
        &mut self,
        placeholder: &str,
        value: impl Into<Value>,
        param_type: ParamType,
    ) -> Result<&mut Self> {
        self.statement_mut()?.bind(placeholder, value, param_type)?;
        Ok(self)
    }

    /// Binds every entry of `params`.
    pub fn bind_values(&mut self, params: &ParameterSet) -> Result<&mut Self> {
        let statement = self.statement_mut()?;
        for (placeholder, bound) in params {
            statement.bind(placeholder, bound.value.clone(), bound.param_type)?;
        }
        Ok(self)
    }

    /// Runs the current statement and buffers its result.
    ///
    /// # Errors
    ///
    /// [`Error::NoStatement`] before `prepare`, [`Error::UnboundPlaceholder`] if a
    /// placeholder has no value, [`Error::Execution`] if the server fails the statement.
    /// After a failure the statement has no result.
    pub async fn execute(&mut self) -> Result<&mut Self> {
        let Some(statement) = self.statement.as_mut() else {
            return Err(Error::NoStatement);
        };
        tracing::debug!(
            sql = statement.sql(),
            params = statement.placeholders().len(),
            "executing statement"
        );
        match statement.run(&mut self.conn, self.config.persistent).await {
            Ok(result) => {
                if let Some(id) = result.last_insert_id() {
                    self.last_insert_id = Some(id);
                }
            }
            Err(err) => {
                self.config.error_mode.report("statement execution failed", &err);
                return Err(err);
            }
        }
        Ok(self)
    }

    /// Prepares and executes literal SQL in one step. The text is sent as is;
    /// `:name` sequences in it are not treated as placeholders.
    pub async fn query<T>(&mut self, sql: T) -> Result<&mut Self>
    where
        T: Into<String>,
    {
        self.statement = Some(PreparedStatement::literal(sql));
        self.execute().await
    }

    /// Next unread row of the last execution, `None` once all rows were read.
    pub fn fetch(&mut self, mode: FetchMode) -> Result<Option<Row>> {
        Ok(self.statement_mut()?.next_row(mode))
    }

    /// Every unread row of the last execution.
    pub fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<Row>> {
        Ok(self.statement_mut()?.remaining_rows(mode))
    }

    /// Identifier generated by the most recent insert on this connection.
    ///
    /// Statements that generate no identifier leave it unchanged, so it
    /// survives a `SELECT` or an `UPDATE` run after the insert.
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }

    /// Rows returned or affected by the last execution; `0` until the statement runs.
    pub fn row_count(&self) -> Result<u64> {
        self.statement
            .as_ref()
            .map(PreparedStatement::row_count)
            .ok_or(Error::NoStatement)
    }

    /// Closes the connection, letting the server know.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        tracing::debug!("connection closed");
        Ok(())
    }

    fn statement_mut(&mut self) -> Result<&mut PreparedStatement> {
        self.statement.as_mut().ok_or(Error::NoStatement)
    }
}
