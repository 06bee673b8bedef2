//! Column and editor descriptors
//!
//! Columns form a small tree: group columns nest other columns, everything
//! else is a leaf. Only data columns carry a field, and only data columns with
//! an editor take part in edit navigation.

use chrono::NaiveDate;

use crate::error::{GridError, Result};
use crate::model::GridModel;
use crate::types::Value;
use crate::validation::Validator;

/// A column of the grid
#[derive(Debug, Clone)]
pub enum Column {
    Data(DataColumn),
    Display(DisplayColumn),
    Group(GroupColumn),
    Action(ActionColumn),
}

impl Column {
    pub fn title(&self) -> &str {
        match self {
            Column::Data(c) => &c.title,
            Column::Display(c) => &c.title,
            Column::Group(c) => &c.title,
            Column::Action(c) => &c.title,
        }
    }
}

/// A column bound to one field of the row model
#[derive(Debug, Clone)]
pub struct DataColumn {
    pub field: String,
    pub title: String,
    pub editable: Option<Editor>,
    pub validator: Option<Validator>,
    pub sortable: bool,
    pub default_value: Option<Value>,
    pub hidden: bool,
}

impl DataColumn {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            title: field.clone(),
            field,
            editable: None,
            validator: None,
            sortable: false,
            default_value: None,
            hidden: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn editable(mut self, editor: Editor) -> Self {
        self.editable = Some(editor);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Whether the edit cursor may stop on this column
    pub fn is_navigable(&self) -> bool {
        self.editable.is_some() && !self.hidden
    }
}

/// A computed, read-only column
#[derive(Debug, Clone)]
pub struct DisplayColumn {
    pub title: String,
}

/// A header grouping child columns
#[derive(Debug, Clone)]
pub struct GroupColumn {
    pub title: String,
    pub columns: Vec<Column>,
}

/// A column of row-level action buttons (edit, delete, revert)
#[derive(Debug, Clone)]
pub struct ActionColumn {
    pub title: String,
}

/// A selectable option of a values editor
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Editor descriptor of an editable data column
#[derive(Debug, Clone, PartialEq)]
pub enum Editor {
    Text,
    /// Numeric input, rejected outside the inclusive `min..=max` bounds
    Number { min: Option<f64>, max: Option<f64> },
    Date,
    Values(Vec<SelectOption>),
    /// Host-rendered editor identified by name
    Custom(String),
}

impl Editor {
    /// Convert raw input text into a typed value for this editor.
    ///
    /// Empty input maps to `Null` for every editor except `Text`, so clearing
    /// a number or date field makes it absent rather than invalid. Number
    /// editors enforce their own bounds; other range and length rules are
    /// left to the column validator.
    pub fn parse_input(&self, input: &str) -> Result<Value> {
        let trimmed = input.trim();
        match self {
            Editor::Text | Editor::Custom(_) => Ok(Value::String(input.to_string())),
            _ if trimmed.is_empty() => Ok(Value::Null),
            Editor::Number { min, max } => {
                let value = if let Ok(i) = trimmed.parse::<i64>() {
                    Value::Int(i)
                } else {
                    trimmed
                        .parse::<f64>()
                        .map(Value::Float)
                        .map_err(|_| GridError::InvalidInput(format!("'{}' is not a number", trimmed)))?
                };
                let n = value.as_f64().unwrap_or(f64::NAN);
                if n.is_nan() {
                    return Err(GridError::InvalidInput(format!("'{}' is not a number", trimmed)));
                }
                if let Some(min) = min.filter(|min| n < *min) {
                    return Err(GridError::InvalidInput(format!("{} is below the minimum {}", trimmed, min)));
                }
                if let Some(max) = max.filter(|max| n > *max) {
                    return Err(GridError::InvalidInput(format!("{} is above the maximum {}", trimmed, max)));
                }
                Ok(value)
            }
            Editor::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| GridError::InvalidInput(format!("'{}' is not a YYYY-MM-DD date", trimmed))),
            Editor::Values(options) => options
                .iter()
                .find(|opt| opt.label == trimmed || opt.value.to_string() == trimmed)
                .map(|opt| opt.value.clone())
                .ok_or_else(|| GridError::InvalidInput(format!("'{}' is not an allowed value", trimmed))),
        }
    }
}

/// Flatten the column tree into its data columns, in declaration order
pub fn flatten_data_columns(columns: &[Column]) -> Vec<&DataColumn> {
    let mut out = Vec::new();
    collect_data_columns(columns, &mut out);
    out
}

fn collect_data_columns<'a>(columns: &'a [Column], out: &mut Vec<&'a DataColumn>) {
    for column in columns {
        match column {
            Column::Data(data) => out.push(data),
            Column::Group(group) => collect_data_columns(&group.columns, out),
            Column::Display(_) | Column::Action(_) => {}
        }
    }
}

/// Fields the edit cursor can visit, in navigation order
pub fn navigable_fields(columns: &[Column]) -> Vec<&str> {
    flatten_data_columns(columns)
        .into_iter()
        .filter(|c| c.is_navigable())
        .map(|c| c.field.as_str())
        .collect()
}

/// Build the initial model of a new row from column default values
pub fn new_row_model<M: GridModel + Default>(columns: &[Column]) -> M {
    let mut model = M::default();
    for column in flatten_data_columns(columns) {
        if let Some(default) = &column.default_value {
            model.set(&column.field, default.clone());
        }
    }
    model
}
