use std::collections::{HashMap, VecDeque};

use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlConnection};
use sqlx::query::Query;
use sqlx::{Either, Executor, MySql};

use crate::builder::NamedSql;
use crate::error::{Error, Result};
use crate::params::normalize_placeholder;
use crate::row::{decode_row, FetchMode, Row};
use crate::value::{ParamType, Value};

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// A statement with named placeholders, the values bound to it so far and
/// the buffered result of its last execution.
///
/// The SQL is rewritten to positional placeholders once, when the statement is
/// created; values are looked up by name at execution time, so the order in
/// which they were bound does not matter.
///
/// # Examples
///
/// ```
/// use sqlx_chainer::{ParamType, PreparedStatement};
///
/// let mut statement = PreparedStatement::new("SELECT * FROM users WHERE id = :id")?;
/// statement.bind(":id", 42, ParamType::Int)?;
/// assert_eq!(statement.sql(), "SELECT * FROM users WHERE id = ?");
/// assert!(statement.is_bound());
/// # Ok::<(), sqlx_chainer::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    named: NamedSql,
    bindings: HashMap<String, Value>,
    result: Option<ResultSet>,
}

/// Everything one execution produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResultSet {
    rows: VecDeque<Row>,
    returned: u64,
    affected: u64,
    last_insert_id: Option<u64>,
}

impl PreparedStatement {
    /// Parses `template`, which may contain `:name` placeholders.
    pub fn new<T>(template: T) -> Result<Self>
    where
        T: Into<String>,
    {
        Ok(Self::from_named(NamedSql::parse(template)?))
    }

    /// A statement whose text is sent as is, without placeholders.
    pub fn literal<T>(sql: T) -> Self
    where
        T: Into<String>,
    {
        Self::from_named(NamedSql::literal(sql))
    }

    fn from_named(named: NamedSql) -> Self {
        Self {
            named,
            bindings: HashMap::new(),
            result: None,
        }
    }

    /// The SQL as given to `prepare`.
    pub fn template(&self) -> &str {
        self.named.template()
    }

    /// The SQL sent to the server.
    pub fn sql(&self) -> &str {
        self.named.sql()
    }

    pub fn placeholders(&self) -> &[String] {
        self.named.order()
    }

    /// Attaches a value to a placeholder, converting it according to `param_type`.
    ///
    /// Binding the same placeholder again replaces the previous value.
    pub fn bind(&mut self, placeholder: &str, value: impl Into<Value>, param_type: ParamType) -> Result<()> {
        let key = normalize_placeholder(placeholder);
        if !self.named.contains(&key) {
            return Err(Error::UnknownPlaceholder(key));
        }
        let value = value.into().coerce(param_type, &key)?;
        tracing::trace!(placeholder = %key, ?param_type, "bound value");
        self.bindings.insert(key, value);
        Ok(())
    }

    /// The value currently bound to `placeholder`.
    pub fn bound(&self, placeholder: &str) -> Option<&Value> {
        self.bindings.get(&normalize_placeholder(placeholder))
    }

    pub fn is_bound(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }

    /// Builds the SQLx query, binding every placeholder occurrence in order.
    fn query(&self) -> Result<Q<'_>> {
        let mut q = sqlx::query::<MySql>(self.named.sql());
        for key in self.named.order() {
            let value = self
                .bindings
                .get(key)
                .ok_or_else(|| Error::UnboundPlaceholder(key.clone()))?;
            q = bind_value(q, value);
        }
        Ok(q)
    }

    pub(crate) async fn run(&mut self, conn: &mut MySqlConnection, persistent: bool) -> Result<&ResultSet> {
        self.result = None;
        let result = {
            let query = self.query()?.persistent(persistent);
            let mut stream = conn.fetch_many(query);
            let mut result = ResultSet::default();
            while let Some(item) = stream.try_next().await.map_err(Error::Execution)? {
                match item {
                    Either::Left(done) => {
                        result.affected += done.rows_affected();
                        if done.last_insert_id() != 0 {
                            result.last_insert_id = Some(done.last_insert_id());
                        }
                    }
                    Either::Right(row) => {
                        result.rows.push_back(decode_row(&row)?);
                        result.returned += 1;
                    }
                }
            }
            result
        };
        Ok(self.result.insert(result))
    }

    pub(crate) fn next_row(&mut self, mode: FetchMode) -> Option<Row> {
        self.result
            .as_mut()
            .and_then(|r| r.rows.pop_front())
            .map(|row| row.with_mode(mode))
    }

    pub(crate) fn remaining_rows(&mut self, mode: FetchMode) -> Vec<Row> {
        self.result
            .as_mut()
            .map(|r| r.rows.drain(..).map(|row| row.with_mode(mode)).collect())
            .unwrap_or_default()
    }

    /// Identifier generated by this statement's last execution, if it generated one.
    pub fn last_insert_id(&self) -> Option<u64> {
        self.result.as_ref().and_then(ResultSet::last_insert_id)
    }

    /// Rows returned by the last execution, or rows affected when it returned none.
    pub fn row_count(&self) -> u64 {
        self.result.as_ref().map_or(0, |r| {
            if r.returned > 0 {
                r.returned
            } else {
                r.affected
            }
        })
    }
}

impl ResultSet {
    pub(crate) fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }
}

fn bind_value<'q>(q: Q<'q>, value: &'q Value) -> Q<'q> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(v) => q.bind(*v),
        Value::Int(v) => q.bind(*v),
        Value::UInt(v) => q.bind(*v),
        Value::Float(v) => q.bind(*v),
        Value::Text(v) => q.bind(v.as_str()),
        Value::Blob(v) => q.bind(v.as_slice()),
    }
}
