//! Fluent table → where → select builder stages.
//!
//! Every stage is plain construction: nothing is rendered, fetched, or
//! decoded until rows are pulled from a [`SelectQuery`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::{QueryError, Result};
use crate::query::ast::{Expr, Projection, ProjectionItem};
use crate::query::executor::Rows;
use crate::query::render::{render_field_list, render_predicate};
use crate::query::RecordShape;
use crate::source::Source;

/// Named remote resource whose records have shape `M`.
pub struct Table<M> {
    name: String,
    source: Source,
    _shape: PhantomData<fn() -> M>,
}

impl<M: RecordShape> Table<M> {
    /// Creates a reference to the table `name` on `source`.
    ///
    /// Names are rendered inside `[...]`, so empty names, names containing
    /// brackets, and names containing control characters are rejected.
    pub fn new(source: &Source, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_table_name(&name)?;
        Ok(Self {
            name,
            source: source.clone(),
            _shape: PhantomData,
        })
    }

    /// Table name as supplied at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source the table is read from.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Filters the table's records by `predicate`.
    pub fn r#where(self, predicate: impl Into<Expr>) -> FilterQuery<M> {
        FilterQuery {
            table: self,
            predicate: predicate.into(),
        }
    }

    /// `SELECT * FROM [<name>]`
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl<M> fmt::Display for Table<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM [{}]", self.name)
    }
}

impl<M> fmt::Debug for Table<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("endpoint", &self.source.endpoint().as_str())
            .finish()
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(QueryError::InvalidArgument(
            "table name must not be empty".to_owned(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| matches!(c, '[' | ']') || c.is_control())
    {
        return Err(QueryError::InvalidArgument(format!(
            "table name '{}' contains illegal character {bad:?}",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Table restricted by a single predicate.
pub struct FilterQuery<M> {
    table: Table<M>,
    predicate: Expr,
}

impl<M: RecordShape> FilterQuery<M> {
    /// Projects the filtered records into result records of type `R`.
    ///
    /// Each element is a field name, a `(field, alias)` pair, or an
    /// expression; only direct field references render.
    pub fn select<R, I, P>(self, fields: I) -> SelectQuery<M, R>
    where
        R: DeserializeOwned,
        I: IntoIterator<Item = P>,
        P: Into<ProjectionSpec>,
    {
        let projection = Projection {
            items: fields
                .into_iter()
                .map(|p| p.into().into_item())
                .collect(),
        };
        SelectQuery {
            filter: self,
            projection,
            _result: PhantomData,
        }
    }

    /// `SELECT * FROM <name> WHERE <predicate>`
    ///
    /// The table name is deliberately not bracketed at this stage.
    pub fn render(&self) -> Result<String> {
        Ok(format!(
            "SELECT * FROM {} WHERE {}",
            self.table.name,
            self.render_predicate()?
        ))
    }

    /// Renders only the predicate text.
    pub fn render_predicate(&self) -> Result<String> {
        render_predicate::<M>(&self.predicate)
    }

    /// Table being filtered.
    pub fn table(&self) -> &Table<M> {
        &self.table
    }

    /// Predicate tree.
    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }
}

impl<M> fmt::Debug for FilterQuery<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterQuery")
            .field("table", &self.table)
            .field("predicate", &self.predicate)
            .finish()
    }
}

/// Terminal, executable stage producing records of type `R`.
///
/// Iterating (`for row in &query`, [`SelectQuery::iter`]) performs one fetch
/// per iterator on its first pull. Nothing is cached between iterations.
pub struct SelectQuery<M, R> {
    filter: FilterQuery<M>,
    projection: Projection,
    _result: PhantomData<fn() -> R>,
}

impl<M: RecordShape, R: DeserializeOwned> SelectQuery<M, R> {
    /// `SELECT <f1>,<f2>,... FROM [<name>] WHERE <predicate>`
    pub fn render(&self) -> Result<String> {
        let fields = render_field_list::<M>(&self.projection)?;
        Ok(format!(
            "SELECT {fields} FROM [{}] WHERE {}",
            self.filter.table.name,
            self.filter.render_predicate()?
        ))
    }

    /// Returns a cold iterator; the fetch happens on its first pull.
    pub fn iter(&self) -> Rows<'_, M, R> {
        Rows::new(self)
    }

    /// Runs one iteration to completion.
    pub fn fetch_all(&self) -> Result<Vec<R>> {
        self.iter().collect()
    }

    /// Filter stage this projection wraps.
    pub fn filter(&self) -> &FilterQuery<M> {
        &self.filter
    }

    /// Projection tree.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub(crate) fn source(&self) -> &Source {
        &self.filter.table.source
    }
}

impl<'q, M: RecordShape, R: DeserializeOwned> IntoIterator for &'q SelectQuery<M, R> {
    type Item = Result<R>;
    type IntoIter = Rows<'q, M, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<M, R> fmt::Debug for SelectQuery<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQuery")
            .field("filter", &self.filter)
            .field("projection", &self.projection)
            .finish()
    }
}

/// Projection element accepted by [`FilterQuery::select`].
pub struct ProjectionSpec {
    item: ProjectionItem,
}

impl ProjectionSpec {
    fn into_item(self) -> ProjectionItem {
        self.item
    }
}

impl From<&str> for ProjectionSpec {
    fn from(name: &str) -> Self {
        Self {
            item: ProjectionItem {
                expr: Expr::Field(name.to_owned()),
                alias: None,
            },
        }
    }
}

impl From<String> for ProjectionSpec {
    fn from(name: String) -> Self {
        Self {
            item: ProjectionItem {
                expr: Expr::Field(name),
                alias: None,
            },
        }
    }
}

impl From<(&str, &str)> for ProjectionSpec {
    fn from((name, alias): (&str, &str)) -> Self {
        Self {
            item: ProjectionItem {
                expr: Expr::Field(name.to_owned()),
                alias: Some(alias.to_owned()),
            },
        }
    }
}

impl From<Expr> for ProjectionSpec {
    fn from(expr: Expr) -> Self {
        Self {
            item: ProjectionItem { expr, alias: None },
        }
    }
}

impl From<(Expr, &str)> for ProjectionSpec {
    fn from((expr, alias): (Expr, &str)) -> Self {
        Self {
            item: ProjectionItem {
                expr,
                alias: Some(alias.to_owned()),
            },
        }
    }
}

impl From<ProjectionItem> for ProjectionSpec {
    fn from(item: ProjectionItem) -> Self {
        Self { item }
    }
}
