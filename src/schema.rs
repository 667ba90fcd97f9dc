use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a column. Drives cell rendering and how staged edits
/// are coerced; unknown declarations fall back to plain text handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
    Select,
    Other,
}

impl From<String> for ColumnType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "string" => ColumnType::String,
            "number" => ColumnType::Number,
            "boolean" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "select" => ColumnType::Select,
            _ => ColumnType::Other,
        }
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> String {
        match t {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Select => "select",
            ColumnType::Other => "other",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(rename = "ordinalNo")]
    pub ordinal_no: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    /// Allowed values for `select` columns. A missing list is tolerated,
    /// the column then edits as plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// A single cell value. Untagged so the persisted JSON keeps the plain
/// shape `{"id":"1","name":"John","age":30}`. Dates are ISO-8601 strings,
/// which order chronologically under string comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Total order across value kinds: Null < Bool < Number < Text.
    /// NaN compares equal to everything numeric rather than poisoning
    /// the sort.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Bool(_), _) => Ordering::Less,
            (_, Bool(_)) => Ordering::Greater,
            (Number(a), Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Number(_), _) => Ordering::Less,
            (_, Number(_)) => Ordering::Greater,
            (Text(a), Text(b)) => a.cmp(b),
        }
    }

    /// Text used for substring search. Lower-casing happens at the
    /// filter site.
    pub fn search_text(&self) -> String {
        self.to_string()
    }

    /// Parse text from the cell editor according to the column type.
    /// Anything that does not parse is kept verbatim as text.
    pub fn coerce(text: &str, column_type: ColumnType) -> CellValue {
        match column_type {
            ColumnType::Number => match text.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(text.to_string()),
            },
            ColumnType::Boolean => match text.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => CellValue::Bool(true),
                "false" | "no" | "n" | "0" => CellValue::Bool(false),
                _ => CellValue::Text(text.to_string()),
            },
            _ => CellValue::Text(text.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One table row: a stable identity plus a mapping from column id to
/// value. Extra keys not covered by the schema are kept but not rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(flatten)]
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Row {
            id: id.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, column_id: impl Into<String>, value: CellValue) -> Self {
        self.cells.insert(column_id.into(), value);
        self
    }

    pub fn get(&self, column_id: &str) -> Option<&CellValue> {
        self.cells.get(column_id)
    }

    pub fn set(&mut self, column_id: impl Into<String>, value: CellValue) {
        self.cells.insert(column_id.into(), value);
    }

    /// Cell rendered for display: booleans as Yes/No, missing as empty.
    pub fn display(&self, column: &Column) -> String {
        match self.get(&column.id) {
            Some(CellValue::Bool(true)) => "Yes".to_string(),
            Some(CellValue::Bool(false)) => "No".to_string(),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }
}

/// The initialization bundle handed in once by the caller. After the
/// row store is seeded the store is the single source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<Column>,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_data_parses_original_shape() {
        let json = r#"{
            "columns": [
                {"id": "name", "ordinalNo": 1, "title": "Name", "type": "string"},
                {"id": "age", "ordinalNo": 2, "title": "Age", "type": "number", "width": 80},
                {"id": "gender", "ordinalNo": 5, "title": "Gender", "type": "select",
                 "options": ["Male", "Female", "Other"]}
            ],
            "data": [
                {"id": "1", "name": "John Doe", "age": 30, "isActive": true},
                {"id": "2", "name": "Jane Smith", "age": 25, "isActive": false}
            ]
        }"#;
        let table: TableData = serde_json::from_str(json).unwrap();
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[1].column_type, ColumnType::Number);
        assert_eq!(
            table.columns[2].options.as_deref(),
            Some(&["Male".to_string(), "Female".to_string(), "Other".to_string()][..])
        );
        assert_eq!(table.rows[0].id, "1");
        assert_eq!(
            table.rows[0].get("age"),
            Some(&CellValue::Number(30.0))
        );
        assert_eq!(table.rows[1].get("isActive"), Some(&CellValue::Bool(false)));
    }

    #[test]
    fn unknown_column_type_is_tolerated() {
        let json = r#"{"id": "x", "ordinalNo": 1, "title": "X", "type": "geo"}"#;
        let column: Column = serde_json::from_str(json).unwrap();
        assert_eq!(column.column_type, ColumnType::Other);
    }

    #[test]
    fn value_order_is_total_across_kinds() {
        let null = CellValue::Null;
        let b = CellValue::Bool(true);
        let n = CellValue::Number(1e9);
        let t = CellValue::Text("a".into());
        assert_eq!(null.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&n), Ordering::Less);
        assert_eq!(n.compare(&t), Ordering::Less);
        assert_eq!(t.compare(&t), Ordering::Equal);
    }

    #[test]
    fn coerce_follows_declared_type() {
        assert_eq!(
            CellValue::coerce("42", ColumnType::Number),
            CellValue::Number(42.0)
        );
        assert_eq!(
            CellValue::coerce("not a number", ColumnType::Number),
            CellValue::Text("not a number".into())
        );
        assert_eq!(
            CellValue::coerce("yes", ColumnType::Boolean),
            CellValue::Bool(true)
        );
        assert_eq!(
            CellValue::coerce("2001-05-04", ColumnType::Date),
            CellValue::Text("2001-05-04".into())
        );
    }

    #[test]
    fn boolean_cells_render_yes_no() {
        let column: Column = serde_json::from_str(
            r#"{"id": "isActive", "ordinalNo": 3, "title": "Active", "type": "boolean"}"#,
        )
        .unwrap();
        let row = Row::new("1").with_cell("isActive", CellValue::Bool(true));
        assert_eq!(row.display(&column), "Yes");
        let row = Row::new("2");
        assert_eq!(row.display(&column), "");
    }
}
