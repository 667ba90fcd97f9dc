use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TedError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("could not parse table data: {0}")]
    InvalidTableData(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("could not expand path \"{0}\"")]
    PathExpansion(String),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
}

/// Durable storage failure. The mutation that triggered the write has
/// already been applied in memory; only durability is lost.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write row store to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to read row store from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize rows: {0}")]
    Serialize(serde_json::Error),
    #[error("stored rows are corrupt: {0}")]
    Deserialize(serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CmdMode {
    SearchTable,
    EditCell,
}

#[derive(Debug, Clone)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    SortColumn,
    Search,
    ClearSearch,
    ToggleColumn,
    EditRow,
    EditCell,
    CommitEdit,
    DeleteRow,
    Confirm,
    Exit,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, derive_setters::Setters)]
pub struct TedConfig {
    /// Number of rows per page.
    pub page_size: usize,
    /// Event poll timeout in ms for the controller loop.
    pub event_poll_time: u64,
    /// Widest a column may render before truncation.
    pub max_column_width: usize,
    /// Ask before deleting a row.
    pub confirm_delete: bool,
}

impl Default for TedConfig {
    fn default() -> Self {
        TedConfig {
            page_size: 10,
            event_poll_time: 100,
            max_column_width: 40,
            confirm_delete: true,
        }
    }
}

pub const HELP_TEXT: &str = "\
 ted - tabular data editor

 Navigation
   j / Down       move down
   k / Up         move up
   h / Left       move left
   l / Right      move right
   n / PageDown   next page
   p / PageUp     previous page
   g / G          first / last page

 Data
   s              sort by current column (toggles asc/desc)
   /              search (substring over all columns)
   c              clear search
   v              toggle visibility of current column
   e              edit current row
   d              delete current row

 While editing
   Enter          edit current cell
   h / l          move between cells
   w              save row
   Esc            discard changes

 ?                this help
 q                quit
";
