//! Query description shared by the document store implementations

use serde_json::Value;

use crate::error::{Error, Result};
use crate::store::filter::FilterOperator;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// One `field <op> value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

/// Filtered, ordered, limited query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter<T: Into<Value>>(mut self, field: &str, operator: FilterOperator, value: T) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Filter rows where field equals a value
    pub fn eq<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Eq, value)
    }

    /// Filter rows where field does not equal a value
    pub fn neq<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Neq, value)
    }

    /// Filter rows where field is greater than a value
    pub fn gt<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Gt, value)
    }

    /// Filter rows where field is greater than or equal to a value
    pub fn gte<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Gte, value)
    }

    /// Filter rows where field is less than a value
    pub fn lt<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Lt, value)
    }

    /// Filter rows where field is less than or equal to a value
    pub fn lte<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.filter(field, FilterOperator::Lte, value)
    }

    /// Filter rows where field is one of `values`
    pub fn in_list<T: Into<Value>, I: IntoIterator<Item = T>>(self, field: &str, values: I) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(field, FilterOperator::In, Value::Array(values))
    }

    /// Order the results by a field
    pub fn order(mut self, field: &str, order: SortOrder) -> Self {
        self.order = Some((field.to_string(), order));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Reject queries no store evaluates reliably
    ///
    /// An `in` filter needs at least one value.
    pub fn validate(&self) -> Result<()> {
        for filter in &self.filters {
            if filter.operator == FilterOperator::In {
                let empty = filter.value.as_array().map(Vec::is_empty).unwrap_or(true);
                if empty {
                    return Err(Error::invalid_query(format!(
                        "'in' filter on '{}' requires a non-empty list",
                        filter.field
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the query as REST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &self.filters {
            let rendered = match (&filter.operator, &filter.value) {
                (FilterOperator::In, Value::Array(values)) => {
                    let items: Vec<String> = values.iter().map(list_item).collect();
                    format!("in.({})", items.join(","))
                }
                (op, value) => format!("{}.{}", op.as_str(), scalar(value)),
            };
            params.push((filter.field.clone(), rendered));
        }
        if let Some((field, order)) = &self.order {
            params.push(("order".to_string(), format!("{}.{}", field, order.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_item(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(&[',', '(', ')', '"'][..]) => {
            format!("\"{}\"", s.replace('"', "\\\""))
        }
        other => scalar(other),
    }
}
