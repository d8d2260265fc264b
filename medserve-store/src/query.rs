//! Select query builder
//!
//! Builds the filter/order/range parameters a table select accepts and
//! renders them as the backend's query-string conventions. Both backends
//! consume the structured form; only the HTTP backend uses the rendered
//! pairs.

use serde_json::Value;

/// Comparison operator for a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    In,
}

/// One filter condition on a column
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Child-table embed: the select returns each parent row with its child
/// rows attached under the child table's name.
#[derive(Debug, Clone)]
pub struct Embed {
    pub table: String,
    /// Ascending order column for the embedded rows
    pub order: Option<String>,
}

/// A filtered, ordered, ranged select over one table.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    /// Column projection (comma-separated); all columns when `None`
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub embeds: Vec<Embed>,
    /// (column, descending)
    pub order: Option<(String, bool)>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the projection to the given comma-separated columns.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Add an equality condition.
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    /// Add a set-membership condition.
    pub fn filter_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op: FilterOp::In,
            value: Value::Array(values),
        });
        self
    }

    /// Embed a child table's rows on each returned parent row.
    pub fn embed(mut self, table: impl Into<String>) -> Self {
        self.embeds.push(Embed {
            table: table.into(),
            order: None,
        });
        self
    }

    /// Embed a child table, ordering the embedded rows ascending by the
    /// given column.
    pub fn embed_ordered(mut self, table: impl Into<String>, order: impl Into<String>) -> Self {
        self.embeds.push(Embed {
            table: table.into(),
            order: Some(order.into()),
        });
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some((column.into(), false));
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some((column.into(), true));
        self
    }

    pub fn range(mut self, offset: u32, limit: u32) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as backend query-string pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        let mut select = self.columns.clone().unwrap_or_else(|| "*".to_string());
        for embed in &self.embeds {
            select.push_str(&format!(",{}(*)", embed.table));
        }
        pairs.push(("select".to_string(), select));

        for filter in &self.filters {
            let rendered = match filter.op {
                FilterOp::Eq => format!("eq.{}", render_scalar(&filter.value)),
                FilterOp::In => {
                    let items = match &filter.value {
                        Value::Array(values) => values
                            .iter()
                            .map(render_scalar)
                            .collect::<Vec<_>>()
                            .join(","),
                        other => render_scalar(other),
                    };
                    format!("in.({items})")
                }
            };
            pairs.push((filter.column.clone(), rendered));
        }

        if let Some((column, descending)) = &self.order {
            let direction = if *descending { "desc" } else { "asc" };
            pairs.push(("order".to_string(), format!("{column}.{direction}")));
        }
        for embed in &self.embeds {
            if let Some(order) = &embed.order {
                pairs.push((format!("{}.order", embed.table), format!("{order}.asc")));
            }
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }

        pairs
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
