use std::collections::HashSet;

use regex::Regex;

use crate::error::{Error, Result};

// Quoted sections and comments are matched first so that a `:word` inside them
// is skipped; only the last alternative captures a placeholder.
const PLACEHOLDER_PATTERN: &str = concat!(
    r"'(?:[^'\\]|\\.)*'",
    r#"|"(?:[^"\\]|\\.)*""#,
    r"|`[^`]*`",
    r"|--(?:[ \t][^\n]*|$)",
    r"|#[^\n]*",
    r"|/\*(?s:.)*?\*/",
    r"|(:[a-zA-Z0-9_]+)",
);

/// SQL text rewritten from named (`:name`) to positional (`?`) placeholders,
/// together with the placeholder names in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    template: String,
    sql: String,
    order: Vec<String>,
}

impl NamedSql {
    /// Parses a template with named placeholders.
    ///
    /// A placeholder that occurs several times is recorded at each occurrence.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_chainer::builder::NamedSql;
    ///
    /// let parsed = NamedSql::parse("SELECT * FROM users WHERE id = :id AND note <> ':x'")?;
    /// assert_eq!(parsed.sql(), "SELECT * FROM users WHERE id = ? AND note <> ':x'");
    /// assert_eq!(parsed.order(), [":id"]);
    /// # Ok::<(), sqlx_chainer::Error>(())
    /// ```
    pub fn parse<T>(template: T) -> Result<Self>
    where
        T: Into<String>,
    {
        let template = template.into();
        let regex = Regex::new(PLACEHOLDER_PATTERN)?;

        let mut sql = String::with_capacity(template.len());
        let mut order = Vec::new();
        let mut last = 0;
        for caps in regex.captures_iter(&template) {
            if let Some(m) = caps.get(1) {
                sql.push_str(&template[last..m.start()]);
                sql.push('?');
                order.push(m.as_str().to_owned());
                last = m.end();
            }
        }
        sql.push_str(&template[last..]);

        Ok(Self {
            template,
            sql,
            order,
        })
    }

    /// Keeps `sql` verbatim, without looking for placeholders.
    pub fn literal<T>(sql: T) -> Self
    where
        T: Into<String>,
    {
        let sql = sql.into();
        Self {
            template: sql.clone(),
            sql,
            order: Vec::new(),
        }
    }

    /// The text as it was given.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The text sent to the server.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholders in order of appearance, each with its leading `:`.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Whether `placeholder`, written with its leading `:`, occurs in the template.
    pub fn contains(&self, placeholder: &str) -> bool {
        self.order.iter().any(|p| p == placeholder)
    }
}

/// Converts named placeholders (`:name`) to positional placeholders (`?`) for MySQL.
///
/// # Examples
///
/// ```
/// use sqlx_chainer::builder::build_query;
///
/// let sql = build_query("SELECT * FROM users WHERE id = :id AND name = :name")?;
/// assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
/// # Ok::<(), sqlx_chainer::Error>(())
/// ```
pub fn build_query(template: &str) -> crate::Result<String> {
    Ok(NamedSql::parse(template)?.sql)
}

/// Hands out the placeholder tokens for one generated statement.
///
/// Every token issued by one namer is unique. Sequenced tokens share a single
/// counter, so a batch of rows gets `:a1, :b2, :a3, :b4, ...`.
#[derive(Debug, Default)]
pub struct PlaceholderNamer {
    counter: usize,
    issued: HashSet<String>,
}

impl PlaceholderNamer {
    /// A namer that has issued nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// `:column`, failing if that token was already issued.
    pub fn plain(&mut self, column: &str) -> Result<String> {
        let token = format!(":{}", sanitize(column));
        if !self.issued.insert(token.clone()) {
            return Err(Error::DuplicatePlaceholder(token));
        }
        Ok(token)
    }

    /// `:column{n}` with the next free counter value.
    pub fn sequenced(&mut self, column: &str) -> String {
        let base = sanitize(column);
        loop {
            self.counter += 1;
            let token = format!(":{base}{}", self.counter);
            if self.issued.insert(token.clone()) {
                return token;
            }
        }
    }

    /// `:column` when still free, otherwise a sequenced token.
    pub fn unique(&mut self, column: &str) -> String {
        self.plain(column)
            .unwrap_or_else(|_| self.sequenced(column))
    }
}

fn sanitize(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
