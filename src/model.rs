use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::domain::{CmdMode, HELP_TEXT, Message, StorageError, TedConfig, TedError};
use crate::edit::{DeleteConfirm, EditSession};
use crate::inputter::{InputResult, Inputter};
use crate::schema::{CellValue, Column, ColumnType, TableData};
use crate::storage::Storage;
use crate::store::{RowStore, SortOrder};
use crate::ui::COLUMN_WIDTH_MARGIN;
use crate::view::{self, PageIndicator, Projection};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    EDIT,
    POPUP,
    CMDINPUT,
}

/// Header cell handed to the UI: resolved title, render width and the
/// sort marker for the active sort column.
#[derive(Debug, Clone)]
pub struct HeaderView {
    pub title: String,
    pub width: usize,
    pub sort: Option<SortOrder>,
}

/// Everything the UI needs for one frame, precomputed as strings.
pub struct UIData {
    pub name: String,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub row_ids: Vec<String>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub editing: bool,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub indicators: Vec<PageIndicator>,
    pub search_query: String,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CmdMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
    pub last_update: Instant,
}

impl UIData {
    fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            row_ids: Vec::new(),
            selected_row: 0,
            selected_column: 0,
            editing: false,
            page: 1,
            total_pages: 0,
            total_rows: 0,
            filtered_rows: 0,
            indicators: Vec::new(),
            search_query: String::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: TedConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    columns: Vec<Column>,
    store: RowStore,
    page: usize,
    cursor_row: usize,
    cursor_column: usize,
    edit: EditSession,
    pending_delete: DeleteConfirm,
    input: Inputter,
    cmd_mode: Option<CmdMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    uidata: UIData,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    /// Build the model and run the one-time seeding: rows only when the
    /// durable store came up empty, visible columns only when none are
    /// set. Must be called once, before the first render.
    pub fn init(
        config: &TedConfig,
        table_data: TableData,
        storage: Storage,
    ) -> Result<Self, TedError> {
        let mut store = RowStore::open(storage)?;
        let restored = !store.is_empty();

        let mut seed_failure = None;
        if let Err(e) = store.seed(table_data.rows) {
            // Rows are seeded in memory even when the write failed.
            seed_failure = Some(e);
        }
        store.seed_visible_columns(table_data.columns.iter().map(|c| c.id.clone()).collect());

        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            columns: table_data.columns,
            store,
            page: 1,
            cursor_row: 0,
            cursor_column: 0,
            edit: EditSession::default(),
            pending_delete: DeleteConfirm::default(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            uidata: UIData::empty(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };

        if restored {
            model.set_status_message(format!(
                "Restored {} rows from storage",
                model.store.rows().len()
            ));
        } else {
            model.set_status_message(format!("Loaded {} rows", model.store.rows().len()));
        }
        if let Some(e) = seed_failure {
            model.report_storage_error(&e);
        }
        model.update_view_data();
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// While command input is active the controller forwards raw keys.
    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TedError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::NextPage => self.change_page(self.page as i64 + 1),
                Message::PrevPage => self.change_page(self.page as i64 - 1),
                Message::FirstPage => self.change_page(1),
                Message::LastPage => self.change_page(i64::MAX),
                Message::SortColumn => self.sort_current_column(),
                Message::Search => self.enter_cmd_mode(CmdMode::SearchTable),
                Message::ClearSearch => self.clear_search(),
                Message::ToggleColumn => self.toggle_current_column(),
                Message::EditRow => self.begin_edit(),
                Message::DeleteRow => self.request_delete(),
                Message::Help => self.show_help(),
                Message::Resize(_, _) => {}
                _ => (),
            },
            Modus::EDIT => match msg {
                Message::Quit => self.quit(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::EditCell => self.enter_cmd_mode(CmdMode::EditCell),
                Message::CommitEdit => self.commit_edit(),
                Message::Exit => self.cancel_edit(),
                Message::Resize(_, _) => {}
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Confirm | Message::EditCell => self.confirm_popup(),
                Message::Exit => self.close_popup(),
                Message::Resize(_, _) => {}
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key);
                }
            }
        }

        self.update_view_data();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn visible_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| self.store.is_visible(&c.id))
            .collect()
    }

    fn current_column(&self) -> Option<&Column> {
        self.visible_columns().get(self.cursor_column).copied()
    }

    fn current_row_id(&self) -> Option<String> {
        self.uidata.row_ids.get(self.cursor_row).cloned()
    }

    fn projection(&self) -> Projection {
        view::project(
            self.store.rows(),
            self.store.sort(),
            self.store.search(),
            self.page,
            self.config.page_size,
        )
    }

    fn move_selection_down(&mut self) {
        let rows = self.uidata.rows.len();
        if self.cursor_row + 1 < rows {
            self.cursor_row += 1;
        } else if self.page < self.uidata.total_pages {
            // Walking past the last row of a page continues on the next.
            self.page += 1;
            self.cursor_row = 0;
        }
    }

    fn move_selection_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.page > 1 {
            self.page -= 1;
            self.cursor_row = self.config.page_size.saturating_sub(1);
        }
    }

    fn move_selection_left(&mut self) {
        self.cursor_column = self.cursor_column.saturating_sub(1);
    }

    fn move_selection_right(&mut self) {
        let columns = self.visible_columns().len();
        if self.cursor_column + 1 < columns {
            self.cursor_column += 1;
        }
    }

    fn change_page(&mut self, page: i64) {
        let total = self.projection().total_pages.max(1) as i64;
        self.page = page.clamp(1, total) as usize;
        self.cursor_row = 0;
    }

    fn sort_current_column(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        let id = column.id.clone();
        let title = column.title.clone();
        self.store.set_sort_column(&id);
        let order = match self.store.sort().order {
            Some(SortOrder::Descending) => "desc",
            _ => "asc",
        };
        self.set_status_message(format!("Sorted by {title} ({order})"));
    }

    fn clear_search(&mut self) {
        if self.store.search().is_empty() {
            return;
        }
        self.store.set_search_query("");
        self.page = 1;
        self.cursor_row = 0;
        self.set_status_message("Search cleared");
    }

    fn toggle_current_column(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        let id = column.id.clone();
        self.store.toggle_column_visibility(&id);
        let visible = self.visible_columns().len();
        self.cursor_column = self.cursor_column.min(visible.saturating_sub(1));
        self.set_status_message(format!("{visible} columns visible"));
    }

    fn begin_edit(&mut self) {
        let Some(row_id) = self.current_row_id() else {
            return;
        };
        let Some(row) = self.store.get_row(&row_id) else {
            return;
        };
        self.edit.begin(row);
        self.modus = Modus::EDIT;
        self.set_status_message(format!(
            "Editing row {row_id} - Enter edits a cell, w saves, Esc discards"
        ));
    }

    fn commit_edit(&mut self) {
        let row_id = self.edit.row_id().unwrap_or_default().to_string();
        match self.edit.commit(&mut self.store) {
            Ok(()) => self.set_status_message(format!("Saved row {row_id}")),
            Err(e) => self.report_storage_error(&e),
        }
        self.modus = Modus::TABLE;
    }

    fn cancel_edit(&mut self) {
        self.edit.cancel();
        self.modus = Modus::TABLE;
        self.set_status_message("Edit discarded");
    }

    fn request_delete(&mut self) {
        let Some(row_id) = self.current_row_id() else {
            return;
        };
        if self.config.confirm_delete {
            self.pending_delete.request(&row_id);
            self.previous_modus = self.modus;
            self.modus = Modus::POPUP;
            self.uidata.popup_message =
                format!("Delete row {row_id}?\n\n  y / Enter  delete\n  Esc        cancel");
            self.uidata.show_popup = true;
        } else {
            match self.store.delete_row(&row_id) {
                Ok(()) => self.set_status_message(format!("Deleted row {row_id}")),
                Err(e) => self.report_storage_error(&e),
            }
        }
    }

    fn confirm_popup(&mut self) {
        if self.pending_delete.is_pending() {
            match self.pending_delete.confirm(&mut self.store) {
                Ok(()) => self.set_status_message("Row deleted"),
                Err(e) => self.report_storage_error(&e),
            }
        }
        self.close_popup();
    }

    fn close_popup(&mut self) {
        self.pending_delete.cancel();
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.uidata.show_popup = false;
        self.uidata.popup_message.clear();
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn enter_cmd_mode(&mut self, mode: CmdMode) {
        let (prompt, initial) = match mode {
            CmdMode::SearchTable => ("Search".to_string(), self.store.search().to_string()),
            CmdMode::EditCell => {
                let Some(column) = self.current_column() else {
                    return;
                };
                let prompt = match (&column.column_type, &column.options) {
                    (ColumnType::Select, Some(options)) => {
                        format!("{} [{}]", column.title, options.join("/"))
                    }
                    _ => column.title.clone(),
                };
                let initial = self
                    .edit
                    .staged(&column.id)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                (prompt, initial)
            }
        };

        trace!("Entering command mode {:?}", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.start(&prompt, &initial);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let cmd_input = self.last_input.input.clone();
        if self.last_input.canceled {
            self.cmd_mode = None;
            return;
        }

        match self.cmd_mode {
            Some(CmdMode::SearchTable) => {
                self.store.set_search_query(&cmd_input);
                self.page = 1;
                self.cursor_row = 0;
                let found = self.projection().filtered_count;
                if cmd_input.is_empty() {
                    self.set_status_message("Search cleared");
                } else {
                    self.set_status_message(format!("Found {found} matching rows"));
                }
            }
            Some(CmdMode::EditCell) => {
                if let Some(column) = self.current_column() {
                    let value = CellValue::coerce(&cmd_input, column.column_type);
                    let id = column.id.clone();
                    self.edit.stage(&id, value);
                }
            }
            None => {
                info!("Cmd mode is none!");
            }
        }
        self.cmd_mode = None;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        debug!("Status: {}", self.status_message);
        self.last_status_message_update = Instant::now();
    }

    fn report_storage_error(&mut self, e: &StorageError) {
        error!("Storage failure: {e}");
        self.set_status_message(format!("Warning: changes not persisted ({e})"));
    }

    // ----------------------- View data derivation ------------------------- //

    fn column_width(&self, column: &Column, rows: &[crate::schema::Row]) -> usize {
        let content = rows
            .iter()
            .map(|r| r.display(column).chars().count())
            .max()
            .unwrap_or(0);
        let width = column
            .width
            .map(|w| w as usize)
            .unwrap_or_else(|| column.title.chars().count().max(content) + COLUMN_WIDTH_MARGIN);
        width.clamp(3, self.config.max_column_width)
    }

    fn update_view_data(&mut self) {
        let projection = self.projection();

        // The projection can shrink under the cursor (delete, filter
        // change), keep page and cursor inside it.
        let total = projection.total_pages.max(1);
        let projection = if self.page > total {
            self.page = total;
            self.projection()
        } else {
            projection
        };
        self.cursor_row = self
            .cursor_row
            .min(projection.rows.len().saturating_sub(1));

        let visible_count = self.visible_columns().len();
        self.cursor_column = self.cursor_column.min(visible_count.saturating_sub(1));

        let visible = self.visible_columns();
        let headers: Vec<HeaderView> = visible
            .iter()
            .map(|c| HeaderView {
                title: c.title.clone(),
                width: self.column_width(c, &projection.rows),
                sort: match self.store.sort() {
                    spec if spec.column.as_deref() == Some(c.id.as_str()) => spec.order,
                    _ => None,
                },
            })
            .collect();

        let rows: Vec<Vec<String>> = projection
            .rows
            .iter()
            .map(|row| {
                visible
                    .iter()
                    .map(|column| {
                        // The row under edit shows its staged values.
                        if self.edit.row_id() == Some(row.id.as_str()) {
                            match self.edit.staged(&column.id) {
                                Some(CellValue::Bool(true)) => "Yes".to_string(),
                                Some(CellValue::Bool(false)) => "No".to_string(),
                                Some(v) => v.to_string(),
                                None => String::new(),
                            }
                        } else {
                            row.display(column)
                        }
                    })
                    .collect()
            })
            .collect();

        let indicators = if projection.total_pages > 0 {
            view::page_indicators(self.page, projection.total_pages)
        } else {
            Vec::new()
        };

        self.uidata = UIData {
            name: "ted".to_string(),
            headers,
            rows,
            row_ids: projection.rows.iter().map(|r| r.id.clone()).collect(),
            selected_row: self.cursor_row,
            selected_column: self.cursor_column,
            editing: self.edit.is_editing(),
            page: self.page,
            total_pages: projection.total_pages,
            total_rows: self.store.rows().len(),
            filtered_rows: projection.filtered_count,
            indicators,
            search_query: self.store.search().to_string(),
            show_popup: self.uidata.show_popup,
            popup_message: self.uidata.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
            last_update: Instant::now(),
        };
    }
}
