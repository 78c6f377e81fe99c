//! Page geometry and column layout of the weekly table.
//!
//! Everything here is in millimetres, measured from the top-left corner of a
//! landscape A4 page. Conversion to PDF points happens in the renderer.

use std::ops::Range;

use crate::models::visitor::VisitorRecord;

pub const PAGE_WIDTH: f32 = 297.0;
pub const PAGE_HEIGHT: f32 = 210.0;
pub const MARGIN: f32 = 10.0;
pub const TITLE_HEIGHT: f32 = 10.0;
pub const TITLE_GAP: f32 = 4.0;
pub const HEADER_ROW_HEIGHT: f32 = 8.0;
/// Fixed so every signature thumbnail has the same size
pub const ROW_HEIGHT: f32 = 20.0;
pub const FOOTER_HEIGHT: f32 = 8.0;
pub const CELL_PADDING: f32 = 1.5;
pub const SIGNATURE_INSET: f32 = 2.0;

pub const TITLE_FONT_SIZE: f32 = 14.0;
pub const HEADER_FONT_SIZE: f32 = 10.0;
pub const CELL_FONT_SIZE: f32 = 9.0;
pub const FOOTER_FONT_SIZE: f32 = 8.0;

/// What a column shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Arrival,
    Departure,
    LastName,
    FirstName,
    Company,
    Reason,
    Host,
    Signature,
}

impl ColumnKind {
    /// Cell text for `record`; absent values are empty
    pub fn text(self, record: &VisitorRecord) -> String {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            ColumnKind::Arrival => record.arrival_display(),
            ColumnKind::Departure => record.departure_display(),
            ColumnKind::LastName => field(&record.last_name),
            ColumnKind::FirstName => field(&record.first_name),
            ColumnKind::Company => field(&record.company),
            ColumnKind::Reason => field(&record.reason),
            ColumnKind::Host => field(&record.host),
            ColumnKind::Signature => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub label: &'static str,
    pub width: f32,
    pub kind: ColumnKind,
}

const fn column(label: &'static str, width: f32, kind: ColumnKind) -> Column {
    Column { label, width, kind }
}

const STANDARD_COLUMNS: [Column; 7] = [
    column("Date", 32.0, ColumnKind::Arrival),
    column("Nom", 32.0, ColumnKind::LastName),
    column("Prénom", 32.0, ColumnKind::FirstName),
    column("Entreprise", 40.0, ColumnKind::Company),
    column("Motif", 50.0, ColumnKind::Reason),
    column("Hôte", 32.0, ColumnKind::Host),
    column("Signature", 42.0, ColumnKind::Signature),
];

const DEPARTURE_COLUMNS: [Column; 8] = [
    column("Arrivée", 30.0, ColumnKind::Arrival),
    column("Départ", 30.0, ColumnKind::Departure),
    column("Nom", 28.0, ColumnKind::LastName),
    column("Prénom", 28.0, ColumnKind::FirstName),
    column("Entreprise", 34.0, ColumnKind::Company),
    column("Motif", 42.0, ColumnKind::Reason),
    column("Hôte", 28.0, ColumnKind::Host),
    column("Signature", 40.0, ColumnKind::Signature),
];

/// A cell rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// The rectangle shrunk by `inset` on every side
    pub fn inset(&self, inset: f32) -> Rect {
        Rect {
            x: self.x + inset,
            y: self.y + inset,
            width: (self.width - 2.0 * inset).max(0.0),
            height: (self.height - 2.0 * inset).max(0.0),
        }
    }
}

/// Fixed-width table, horizontally centered on the page
#[derive(Debug, Clone)]
pub struct TableLayout {
    columns: Vec<Column>,
}

impl TableLayout {
    /// Date, Nom, Prénom, Entreprise, Motif, Hôte, Signature
    pub fn standard() -> Self {
        Self {
            columns: STANDARD_COLUMNS.to_vec(),
        }
    }

    /// Separate arrival and departure columns
    pub fn with_departure() -> Self {
        Self {
            columns: DEPARTURE_COLUMNS.to_vec(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn left(&self) -> f32 {
        (PAGE_WIDTH - self.width()) / 2.0
    }

    /// Left edge of every column
    pub fn column_offsets(&self) -> Vec<f32> {
        self.columns
            .iter()
            .scan(self.left(), |x, column| {
                let at = *x;
                *x += column.width;
                Some(at)
            })
            .collect()
    }

    /// Top of the header row; the first page also carries the title
    pub fn table_top(page_index: usize) -> f32 {
        if page_index == 0 {
            MARGIN + TITLE_HEIGHT + TITLE_GAP
        } else {
            MARGIN
        }
    }

    /// Lowest y a row may reach before the footer
    pub fn table_bottom() -> f32 {
        PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT
    }

    pub fn rows_per_page(page_index: usize) -> usize {
        let available = Self::table_bottom() - Self::table_top(page_index) - HEADER_ROW_HEIGHT;
        (available / ROW_HEIGHT).floor().max(1.0) as usize
    }

    /// Row ranges per page. There is always at least one page, even without rows.
    pub fn paginate(row_count: usize) -> Vec<Range<usize>> {
        let mut pages = Vec::new();
        let mut next = 0;
        loop {
            let capacity = Self::rows_per_page(pages.len());
            let end = (next + capacity).min(row_count);
            pages.push(next..end);
            next = end;
            if next >= row_count {
                return pages;
            }
        }
    }

    /// Top of the `slot`-th data row on a page
    pub fn row_top(page_index: usize, slot: usize) -> f32 {
        Self::table_top(page_index) + HEADER_ROW_HEIGHT + slot as f32 * ROW_HEIGHT
    }
}

/// Approximate Helvetica advance width of `c`, in ems
fn glyph_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' => 0.25,
        'f' | 't' | 'r' | 'I' | ' ' | '-' | '(' | ')' | '/' => 0.33,
        'm' | 'w' | 'M' | 'W' => 0.85,
        '0'..='9' => 0.556,
        c if c.is_uppercase() => 0.68,
        _ => 0.53,
    }
}

fn ems_to_mm(ems: f32, font_size: f32) -> f32 {
    ems * font_size * 25.4 / 72.0
}

/// Estimated rendered width of `text` in millimetres
pub fn text_width(text: &str, font_size: f32) -> f32 {
    ems_to_mm(text.chars().map(glyph_width).sum(), font_size)
}

/// Cut `text` so it fits in `width` millimetres, marking the cut with `...`
pub fn fit_text(text: &str, width: f32, font_size: f32) -> String {
    if text_width(text, font_size) <= width {
        return text.to_string();
    }
    let budget = width - text_width("...", font_size);
    let mut used = 0.0;
    let mut fitted = String::new();
    for c in text.chars() {
        let w = ems_to_mm(glyph_width(c), font_size);
        if used + w > budget {
            break;
        }
        used += w;
        fitted.push(c);
    }
    format!("{}...", fitted.trim_end())
}
