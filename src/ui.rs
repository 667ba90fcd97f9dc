use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use crate::domain::TedConfig;
use crate::model::UIData;
use crate::store::SortOrder;
use crate::view::PageIndicator;

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const PAGINATION_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;

/// How long a status message stays on the command line.
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TedUI {
    _config: TedConfig,
}

impl TedUI {
    pub fn new(config: &TedConfig) -> Self {
        Self {
            _config: config.clone(),
        }
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let [header_area, table_area, pagination_area, cmdline_area] = Layout::vertical([
            Constraint::Length(TABLE_HEADER_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(PAGINATION_HEIGHT),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_header(uidata, frame, header_area);
        self.draw_rows(uidata, frame, table_area);
        self.draw_pagination(uidata, frame, pagination_area);
        self.draw_cmdline(uidata, frame, cmdline_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_header(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::with_capacity(uidata.headers.len() * 2);
        for (idx, header) in uidata.headers.iter().enumerate() {
            let marker = match header.sort {
                Some(SortOrder::Ascending) => " ▲",
                Some(SortOrder::Descending) => " ▼",
                None => "",
            };
            let text = pad(&format!("{}{}", header.title, marker), header.width);
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if idx == uidata.selected_column {
                style = style.fg(Color::Cyan);
            }
            spans.push(Span::styled(text, style));
            spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_rows(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::with_capacity(uidata.rows.len());
        for (ridx, row) in uidata.rows.iter().enumerate() {
            let selected_row = ridx == uidata.selected_row;
            let mut spans = Vec::with_capacity(row.len() * 2);
            for (cidx, cell) in row.iter().enumerate() {
                let width = uidata.headers.get(cidx).map(|h| h.width).unwrap_or(3);
                let mut style = Style::default();
                if selected_row && uidata.editing {
                    style = style.fg(Color::Yellow);
                }
                if selected_row && cidx == uidata.selected_column {
                    style = style.add_modifier(Modifier::REVERSED);
                } else if selected_row {
                    style = style.add_modifier(Modifier::BOLD);
                }
                spans.push(Span::styled(pad(cell, width), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_pagination(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(format!(
            " {} rows ({} match) ",
            uidata.total_rows, uidata.filtered_rows
        ))];
        if !uidata.search_query.is_empty() {
            spans.push(Span::styled(
                format!("/{} ", uidata.search_query),
                Style::default().fg(Color::Magenta),
            ));
        }
        for indicator in &uidata.indicators {
            match indicator {
                PageIndicator::Page(n) => {
                    let style = if *n == uidata.page {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    spans.push(Span::styled(format!(" {n} "), style));
                }
                PageIndicator::Ellipsis => spans.push(Span::raw(" … ")),
            }
        }
        if uidata.total_pages > 0 {
            spans.push(Span::raw(format!(
                "  page {}/{}",
                uidata.page, uidata.total_pages
            )));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let line = if uidata.active_cmdinput {
            let input = &uidata.cmdinput;
            Line::from(vec![
                Span::styled(
                    format!("{}: ", input.prompt),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(input.input.clone()),
                Span::styled("█", Style::default().fg(Color::Gray)),
            ])
        } else if uidata.last_status_message_update.elapsed() < STATUS_MESSAGE_TIMEOUT {
            Line::from(uidata.status_message.clone())
        } else {
            Line::from(Span::styled(
                " ? for help",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = centered_rect(frame.area(), 60, 70);
        let title = Line::from(format!(" {} ", uidata.name).bold());
        let block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(uidata.popup_message.clone()).block(block),
            area,
        );
    }
}

/// Pad or truncate a cell to its render width.
fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let used = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_truncates_and_fills() {
        assert_eq!(pad("abc", 5), "abc  ");
        assert_eq!(pad("abcdef", 4), "abcd");
        assert_eq!(pad("", 3), "   ");
    }
}
