use tracing::{debug, info, trace};

use crate::domain::StorageError;
use crate::schema::{CellValue, Row};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Active sort: `column == None` means insertion order.
#[derive(Debug, Clone, Default)]
pub struct SortSpec {
    pub column: Option<String>,
    pub order: Option<SortOrder>,
}

/// Owns the canonical row collection plus the transient view state
/// attached to it (visible columns, sort, search). Rows are written to
/// durable storage after every structural change; visibility, sort and
/// search are session-only.
///
/// A persist failure never rolls back the in-memory mutation. The `Err`
/// carries the storage problem for the caller to report.
pub struct RowStore {
    rows: Vec<Row>,
    visible_columns: Vec<String>,
    sort: SortSpec,
    search: String,
    storage: Storage,
}

impl RowStore {
    /// Open the store over its durable backing, loading whatever rows
    /// survived from a previous session.
    pub fn open(storage: Storage) -> Result<Self, StorageError> {
        let rows = storage.load()?;
        Ok(RowStore {
            rows,
            visible_columns: Vec::new(),
            sort: SortSpec::default(),
            search: String::new(),
            storage,
        })
    }

    #[cfg(test)]
    pub fn in_temp(dir: &std::path::Path) -> Self {
        RowStore::open(Storage::new(dir.join("rows.json"))).unwrap()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn visible_columns(&self) -> &[String] {
        &self.visible_columns
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.visible_columns.iter().any(|c| c == column_id)
    }

    pub fn get_row(&self, row_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    /// Seed the row collection, only if it is currently empty. A store
    /// restored from durable storage is never overwritten by the
    /// caller's sample data. Returns whether seeding happened.
    pub fn seed(&mut self, rows: Vec<Row>) -> Result<bool, StorageError> {
        if !self.rows.is_empty() {
            debug!("Store already holds {} rows, seed skipped", self.rows.len());
            return Ok(false);
        }
        info!("Seeding store with {} rows", rows.len());
        self.rows = rows;
        self.persist()?;
        Ok(true)
    }

    /// Seed the visible-column set, only if currently empty. Visibility
    /// is a session preference and is not persisted.
    pub fn seed_visible_columns(&mut self, column_ids: Vec<String>) {
        if self.visible_columns.is_empty() {
            self.visible_columns = column_ids;
        }
    }

    /// Set one cell on the row with the given id. An unknown row id is a
    /// silent no-op. The value is stored exactly as given; any type
    /// coercion happens at the edit boundary, not here.
    pub fn update_cell(
        &mut self,
        row_id: &str,
        column_id: &str,
        value: CellValue,
    ) -> Result<(), StorageError> {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id) else {
            trace!("update_cell: no row with id {row_id}");
            return Ok(());
        };
        row.set(column_id, value);
        self.persist()
    }

    /// Remove the row with the given id; no-op when absent.
    pub fn delete_row(&mut self, row_id: &str) -> Result<(), StorageError> {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != row_id);
        if self.rows.len() == before {
            trace!("delete_row: no row with id {row_id}");
            return Ok(());
        }
        info!("Deleted row {row_id}, {} rows remain", self.rows.len());
        self.persist()
    }

    /// Toggle semantics: a repeated request on the active sort column
    /// flips the order, a new column starts ascending.
    pub fn set_sort_column(&mut self, column_id: &str) {
        if self.sort.column.as_deref() == Some(column_id) {
            self.sort.order = Some(
                self.sort
                    .order
                    .unwrap_or(SortOrder::Ascending)
                    .flipped(),
            );
        } else {
            self.sort.column = Some(column_id.to_string());
            self.sort.order = Some(SortOrder::Ascending);
        }
        trace!("Sort spec now {:?}", self.sort);
    }

    /// Replace the search query verbatim; empty clears the filter.
    pub fn set_search_query(&mut self, text: &str) {
        self.search = text.to_string();
    }

    /// Symmetric-difference toggle on the visible set.
    pub fn toggle_column_visibility(&mut self, column_id: &str) {
        if let Some(pos) = self.visible_columns.iter().position(|c| c == column_id) {
            self.visible_columns.remove(pos);
        } else {
            self.visible_columns.push(column_id.to_string());
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.storage.save(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str, age: f64) -> Row {
        Row::new(id)
            .with_cell("name", CellValue::Text(name.into()))
            .with_cell("age", CellValue::Number(age))
    }

    #[test]
    fn seed_only_fills_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());

        assert!(store.seed(vec![person("1", "John", 30.0)]).unwrap());
        assert!(!store.seed(vec![person("9", "Other", 1.0)]).unwrap());

        assert_eq!(store.rows().len(), 1);
        assert_eq!(store.rows()[0].id, "1");
    }

    #[test]
    fn seeded_rows_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![person("1", "John", 30.0), person("2", "Jane", 25.0)];
        {
            let mut store = RowStore::in_temp(dir.path());
            store.seed(rows.clone()).unwrap();
        }
        let store = RowStore::in_temp(dir.path());
        assert_eq!(store.rows(), &rows[..]);
        // And the durable copy wins over fresh sample data.
        let mut store = RowStore::in_temp(dir.path());
        store.seed(vec![person("9", "Other", 1.0)]).unwrap();
        assert_eq!(store.rows(), &rows[..]);
    }

    #[test]
    fn update_cell_replaces_value_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());
        store.seed(vec![person("1", "John", 30.0)]).unwrap();

        store
            .update_cell("1", "name", CellValue::Text("X".into()))
            .unwrap();

        assert_eq!(
            store.get_row("1").unwrap().get("name"),
            Some(&CellValue::Text("X".into()))
        );
        let reopened = RowStore::in_temp(dir.path());
        assert_eq!(
            reopened.get_row("1").unwrap().get("name"),
            Some(&CellValue::Text("X".into()))
        );
    }

    #[test]
    fn unknown_row_mutations_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());
        store.seed(vec![person("1", "John", 30.0)]).unwrap();

        store
            .update_cell("nonexistent", "name", CellValue::Text("X".into()))
            .unwrap();
        store.delete_row("nonexistent").unwrap();

        assert_eq!(store.rows().len(), 1);
        assert_eq!(
            store.get_row("1").unwrap().get("name"),
            Some(&CellValue::Text("John".into()))
        );
    }

    #[test]
    fn delete_removes_exactly_one_row_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());
        store
            .seed(vec![
                person("1", "John", 30.0),
                person("2", "Jane", 25.0),
                person("3", "Jim", 40.0),
            ])
            .unwrap();

        store.delete_row("2").unwrap();

        let ids: Vec<&str> = store.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        let reopened = RowStore::in_temp(dir.path());
        assert_eq!(reopened.rows().len(), 2);
    }

    #[test]
    fn sort_column_toggles_through_orders() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());

        store.set_sort_column("age");
        assert_eq!(store.sort().column.as_deref(), Some("age"));
        assert_eq!(store.sort().order, Some(SortOrder::Ascending));

        store.set_sort_column("age");
        assert_eq!(store.sort().order, Some(SortOrder::Descending));

        store.set_sort_column("age");
        assert_eq!(store.sort().order, Some(SortOrder::Ascending));

        store.set_sort_column("name");
        assert_eq!(store.sort().column.as_deref(), Some("name"));
        assert_eq!(store.sort().order, Some(SortOrder::Ascending));
    }

    #[test]
    fn visibility_toggle_is_symmetric_difference() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RowStore::in_temp(dir.path());
        store.seed_visible_columns(vec!["name".into(), "age".into()]);
        // Seeding again is a no-op on a non-empty set.
        store.seed_visible_columns(vec!["other".into()]);
        assert_eq!(store.visible_columns(), ["name", "age"]);

        store.toggle_column_visibility("age");
        assert!(!store.is_visible("age"));
        store.toggle_column_visibility("age");
        assert!(store.is_visible("age"));
    }

    #[test]
    fn persist_failure_keeps_in_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // A path under a missing directory makes every write fail.
        let path = dir.path().join("no_such_dir").join("rows.json");
        let mut store = RowStore::open(Storage::new(path)).unwrap();

        assert!(store.seed(vec![person("1", "John", 30.0)]).is_err());
        assert_eq!(store.rows().len(), 1);

        assert!(
            store
                .update_cell("1", "name", CellValue::Text("X".into()))
                .is_err()
        );
        assert_eq!(
            store.get_row("1").unwrap().get("name"),
            Some(&CellValue::Text("X".into()))
        );

        assert!(store.delete_row("1").is_err());
        assert!(store.is_empty());
    }
}
