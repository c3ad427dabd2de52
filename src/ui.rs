use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table, TableState},
    Frame,
};

use crate::controller::SearchView;
use crate::model::Item;
use crate::session::Status;
use crate::sort::{SortKey, SortState};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Results,
}

/// Terminal-side state that the search core does not care about.
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    pub focus: Focus,
    /// Cursor position in chars.
    pub cursor: usize,
    pub selected: usize,
    pub sort: SortState,
}

impl ScreenState {
    /// Id of the selected row in display order.
    pub fn selected_id(&self, hits: &[Item]) -> Option<String> {
        self.sort
            .apply(hits)
            .get(self.selected)
            .map(|item| item.id.clone())
    }

    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

pub fn render(f: &mut Frame, view: &SearchView<'_>, screen: &ScreenState) {
    // Layout: Input | Banner | Results | Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    // 1. Search box
    let prefix = "Search: ";
    let input_line = Line::from(vec![
        Span::styled(
            prefix,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw(view.search_term),
    ]);
    f.render_widget(Paragraph::new(input_line), chunks[0]);

    // 2. Error banner; results stay visible underneath
    if view.error.is_some() {
        let banner = Paragraph::new("Something went wrong.")
            .style(Style::default().fg(Color::LightRed));
        f.render_widget(banner, chunks[1]);
    }

    // 3. Results table
    let sorted = screen.sort.apply(view.hits);
    let header = Row::new(
        [
            SortKey::Title,
            SortKey::Author,
            SortKey::Comments,
            SortKey::Points,
        ]
        .into_iter()
        .map(|key| header_cell(key, screen.sort)),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = sorted.iter().map(|item| {
        Row::new(vec![
            item.title.clone().unwrap_or_default(),
            item.author.clone().unwrap_or_default(),
            item.num_comments.map(|n| n.to_string()).unwrap_or_default(),
            item.points.map(|n| n.to_string()).unwrap_or_default(),
        ])
    });

    let widths = [
        Constraint::Percentage(52),
        Constraint::Percentage(24),
        Constraint::Percentage(12),
        Constraint::Percentage(12),
    ];
    let highlight = match screen.focus {
        Focus::Results => Style::default().bg(Color::DarkGray),
        Focus::Input => Style::default(),
    };
    let table = Table::new(rows, widths)
        .header(header)
        .highlight_style(highlight);

    let mut table_state = TableState::default();
    if !sorted.is_empty() {
        table_state.select(Some(screen.selected.min(sorted.len() - 1)));
    }
    f.render_stateful_widget(table, chunks[2], &mut table_state);

    // 4. Footer: "More" affordance, or loading indicator
    let (footer_text, footer_color) = if view.is_loading {
        ("Loading ...".to_string(), Color::Yellow)
    } else {
        let hint = match screen.focus {
            Focus::Input => "[Enter] search  [Tab] results  [Esc] quit",
            Focus::Results => "[m] More  [d] dismiss  [1-4] sort  [Tab] search  [q] quit",
        };
        (footer(view, hint), Color::DarkGray)
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(footer_color).add_modifier(Modifier::ITALIC));
    f.render_widget(footer, chunks[3]);

    // Cursor
    if screen.focus == Focus::Input {
        let column = cursor_column(prefix, view.search_term, screen.cursor, chunks[0].width);
        f.set_cursor(chunks[0].x + column, chunks[0].y);
    }
}

/// Display column of the cursor after `prefix`, where `cursor` counts chars
/// of `text`. Clamped to the last column of a `width`-wide line.
pub fn cursor_column(prefix: &str, text: &str, cursor: usize, width: u16) -> u16 {
    let before: String = text.chars().take(cursor).collect();
    let column = prefix.width() + before.width();
    let last = usize::from(width.saturating_sub(1));
    u16::try_from(column.min(last)).unwrap_or(u16::MAX)
}

/// True for keys that should be typed into the search box. Control and Alt
/// chords are commands, not text.
pub fn is_text_input(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char(_))
        && !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn header_cell(key: SortKey, sort: SortState) -> String {
    if sort.key != key {
        return key.label().to_string();
    }
    let arrow = if sort.reverse { "^" } else { "v" };
    format!("{} {arrow}", key.label())
}

fn footer(view: &SearchView<'_>, hint: &str) -> String {
    match (view.status, view.active_key) {
        (Status::Idle, _) | (_, None) => hint.to_string(),
        (_, Some(key)) => format!(
            "{} hits for \"{key}\" (page {})  {hint}",
            view.hits.len(),
            view.page
        ),
    }
}
