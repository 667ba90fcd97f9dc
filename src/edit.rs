use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::domain::StorageError;
use crate::schema::{CellValue, Row};
use crate::store::RowStore;

/// Staged edits for at most one row at a time. The buffer is seeded from
/// the row's persisted values on `begin` and thrown away on cancel or
/// commit; nothing touches the store until `commit`.
#[derive(Debug, Default)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        row_id: String,
        buffer: BTreeMap<String, CellValue>,
    },
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing { .. })
    }

    pub fn row_id(&self) -> Option<&str> {
        match self {
            EditSession::Editing { row_id, .. } => Some(row_id),
            EditSession::Idle => None,
        }
    }

    /// Start editing a row. Beginning a new edit while another row is
    /// open silently abandons the previous buffer.
    pub fn begin(&mut self, row: &Row) {
        if let EditSession::Editing { row_id, .. } = self {
            debug!("Abandoning edit buffer for row {row_id}");
        }
        *self = EditSession::Editing {
            row_id: row.id.clone(),
            buffer: row.cells.clone(),
        };
    }

    /// Stage one value. Ignored when not editing.
    pub fn stage(&mut self, column_id: &str, value: CellValue) {
        if let EditSession::Editing { buffer, .. } = self {
            trace!("Staging {column_id} = {value:?}");
            buffer.insert(column_id.to_string(), value);
        }
    }

    /// Current staged value for a column, if any.
    pub fn staged(&self, column_id: &str) -> Option<&CellValue> {
        match self {
            EditSession::Editing { buffer, .. } => buffer.get(column_id),
            EditSession::Idle => None,
        }
    }

    /// Apply every staged value to the store and return to `Idle`.
    /// Application is best-effort per field: a persist failure on one
    /// cell does not stop the remaining cells, the first error is
    /// reported afterwards.
    pub fn commit(&mut self, store: &mut RowStore) -> Result<(), StorageError> {
        let EditSession::Editing { row_id, buffer } = std::mem::take(self) else {
            return Ok(());
        };
        debug!("Committing {} staged cells to row {row_id}", buffer.len());
        let mut first_error = None;
        for (column_id, value) in buffer {
            if let Err(e) = store.update_cell(&row_id, &column_id, value) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Discard the buffer without touching the store.
    pub fn cancel(&mut self) {
        if self.is_editing() {
            trace!("Edit canceled");
        }
        *self = EditSession::Idle;
    }
}

/// Two-step row deletion, backing a confirmation popup. Direct deletion
/// (no confirmation) simply never parks in `Pending`.
#[derive(Debug, Default, PartialEq)]
pub enum DeleteConfirm {
    #[default]
    Closed,
    Pending(String),
}

impl DeleteConfirm {
    pub fn is_pending(&self) -> bool {
        matches!(self, DeleteConfirm::Pending(_))
    }

    pub fn request(&mut self, row_id: &str) {
        *self = DeleteConfirm::Pending(row_id.to_string());
    }

    /// Delete the pending row and close.
    pub fn confirm(&mut self, store: &mut RowStore) -> Result<(), StorageError> {
        let DeleteConfirm::Pending(row_id) = std::mem::take(self) else {
            return Ok(());
        };
        store.delete_row(&row_id)
    }

    pub fn cancel(&mut self) {
        *self = DeleteConfirm::Closed;
    }
}
