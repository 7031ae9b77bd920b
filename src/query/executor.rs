//! Deferred execution of a [`SelectQuery`].
//!
//! A [`Rows`] iterator starts cold. Its first pull renders the query, fetches
//! the request target, and decodes the whole payload; later pulls hand out the
//! decoded records. Any failure is yielded once as an error, after which the
//! iterator is exhausted.

use std::any::type_name;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{ErrorKind, QueryError, Result};
use crate::query::ast::Projection;
use crate::query::{RecordShape, SelectQuery};

/// Upper bound on the rejected-response body kept in [`QueryError::RequestRejected`].
pub const MAX_REJECTED_BODY: usize = 4096;

/// Execution state of a [`Rows`] iterator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecState {
    /// Built but not yet pulled; no side effects have happened.
    Constructed,
    /// Rendering the query text.
    Rendering,
    /// Waiting on the transport.
    Fetching,
    /// Decoding the response body.
    Decoding,
    /// Records decoded and being handed out.
    Ready,
    /// Terminal failure of the given kind.
    Failed(ErrorKind),
}

/// Lazy sequence of result records produced by one execution.
pub struct Rows<'q, M, R> {
    query: &'q SelectQuery<M, R>,
    state: ExecState,
    rows: std::vec::IntoIter<R>,
}

impl<'q, M: RecordShape, R: DeserializeOwned> Rows<'q, M, R> {
    pub(crate) fn new(query: &'q SelectQuery<M, R>) -> Self {
        Self {
            query,
            state: ExecState::Constructed,
            rows: Vec::new().into_iter(),
        }
    }

    /// Current execution state.
    pub fn state(&self) -> ExecState {
        self.state
    }

    fn execute(&mut self) -> Result<Vec<R>> {
        let source = self.query.source();

        self.state = ExecState::Rendering;
        let text = self.query.render()?;
        debug!(query = %text, "query.rows.render");

        self.state = ExecState::Fetching;
        let url = source.request_url(&text);
        debug!(url = %url, "query.rows.fetch");
        let response = source
            .transport()
            .fetch(&url)
            .map_err(|err| QueryError::FetchFailed {
                url: url.to_string(),
                source: err,
            })?;
        if !response.is_success() {
            return Err(QueryError::RequestRejected {
                status: response.status,
                body: rejected_body(&response.body),
            });
        }

        self.state = ExecState::Decoding;
        debug!(
            status = response.status,
            bytes = response.body.len(),
            "query.rows.decode"
        );
        let values = source.decoder().decode_rows(&response.body)?;
        let records = decode_records(values, self.query.projection())?;
        debug!(rows = records.len(), "query.rows.ready");
        Ok(records)
    }
}

impl<M: RecordShape, R: DeserializeOwned> Iterator for Rows<'_, M, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ExecState::Constructed => match self.execute() {
                Ok(records) => {
                    self.rows = records.into_iter();
                    self.state = ExecState::Ready;
                    self.rows.next().map(Ok)
                }
                Err(err) => {
                    self.state = ExecState::Failed(err.kind());
                    Some(Err(err))
                }
            },
            ExecState::Ready => self.rows.next().map(Ok),
            _ => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            ExecState::Ready => self.rows.size_hint(),
            ExecState::Constructed => (0, None),
            _ => (0, Some(0)),
        }
    }
}

/// Lossy UTF-8 text of a rejected body, at most [`MAX_REJECTED_BODY`] bytes
/// and never split inside a character.
fn rejected_body(body: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(body).into_owned();
    if text.len() > MAX_REJECTED_BODY {
        let mut cut = MAX_REJECTED_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

/// Converts decoded payload values into result records.
///
/// When the projection renames fields, each record object is rebuilt under
/// the result names first.
fn decode_records<R: DeserializeOwned>(
    values: Vec<JsonValue>,
    projection: &Projection,
) -> Result<Vec<R>> {
    let rename = projection.has_aliases();
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let value = if rename {
                rename_fields(value, projection)
            } else {
                value
            };
            serde_json::from_value(value).map_err(|err| {
                QueryError::decode_failed(
                    format!("record of type {}", type_name::<R>()),
                    format!("element {index}: {err}"),
                )
            })
        })
        .collect()
}

fn rename_fields(value: JsonValue, projection: &Projection) -> JsonValue {
    let JsonValue::Object(source) = value else {
        return value;
    };
    let mut renamed = Map::with_capacity(projection.items.len());
    for item in &projection.items {
        let (Some(from), Some(to)) = (item.expr.as_field(), item.result_name()) else {
            continue;
        };
        if let Some(field) = source.get(from) {
            renamed.insert(to.to_owned(), field.clone());
        }
    }
    JsonValue::Object(renamed)
}
