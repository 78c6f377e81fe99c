//! Weekly register as a landscape PDF table.
//!
//! The document uses the standard Helvetica fonts with `WinAnsiEncoding`, so
//! no font program is embedded. Signatures are embedded as JPEG image
//! XObjects, one per signed row, referenced only from the page that shows
//! them. Content streams are left uncompressed.

use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorRecord,
};

use super::{
    layout::{
        fit_text, text_width, ColumnKind, Rect, TableLayout, CELL_FONT_SIZE, CELL_PADDING,
        FOOTER_FONT_SIZE, HEADER_FONT_SIZE, HEADER_ROW_HEIGHT, MARGIN, PAGE_HEIGHT, PAGE_WIDTH,
        ROW_HEIGHT, SIGNATURE_INSET, TITLE_FONT_SIZE, TITLE_HEIGHT,
    },
    signature::{self, SignatureImage},
    window::WeekWindow,
};

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const BORDER_WIDTH: f32 = 0.5;
const HEADER_GREY: f32 = 0.88;

fn pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// PDF y coordinate (bottom-up, points) of a top-down millimetre offset
fn pdf_y(mm_from_top: f32) -> f32 {
    pt(PAGE_HEIGHT - mm_from_top)
}

/// Encode text for a `WinAnsiEncoding` font; unmapped characters become `?`
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            'Œ' => 0x8C,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9C,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Collects the drawing operations of one page
struct PageCanvas {
    operations: Vec<Operation>,
    images: Dictionary,
}

impl PageCanvas {
    fn new() -> Self {
        Self {
            operations: vec![Operation::new("w", vec![pt(BORDER_WIDTH).into()])],
            images: Dictionary::new(),
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// Text with its baseline at `baseline` (mm from top)
    fn text(&mut self, font: &str, size: f32, x: f32, baseline: f32, text: &str) {
        self.op("BT", vec![]);
        self.op("Tf", vec![font.into(), size.into()]);
        self.op("Td", vec![pt(x).into(), pdf_y(baseline).into()]);
        self.op(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        );
        self.op("ET", vec![]);
    }

    fn rect_operands(rect: &Rect) -> Vec<Object> {
        vec![
            pt(rect.x).into(),
            pdf_y(rect.y + rect.height).into(),
            pt(rect.width).into(),
            pt(rect.height).into(),
        ]
    }

    fn border(&mut self, rect: &Rect) {
        self.op("re", Self::rect_operands(rect));
        self.op("S", vec![]);
    }

    fn shaded_border(&mut self, rect: &Rect, grey: f32) {
        self.op("g", vec![grey.into()]);
        self.op("re", Self::rect_operands(rect));
        self.op("B", vec![]);
        self.op("g", vec![0.0f32.into()]);
    }

    /// Left-aligned text, vertically centered in `cell`
    fn cell_text(&mut self, font: &str, size: f32, cell: &Rect, text: &str) {
        if text.is_empty() {
            return;
        }
        let fitted = fit_text(text, cell.width - 2.0 * CELL_PADDING, size);
        // Cap height of Helvetica is about 0.7 em
        let baseline = cell.y + cell.height / 2.0 + pt_to_mm(size) * 0.35;
        self.text(font, size, cell.x + CELL_PADDING, baseline, &fitted);
    }

    fn image(&mut self, name: &str, id: ObjectId, area: &Rect) {
        self.images.set(name, id);
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                pt(area.width).into(),
                Object::Integer(0),
                Object::Integer(0),
                pt(area.height).into(),
                pt(area.x).into(),
                pdf_y(area.y + area.height).into(),
            ],
        );
        self.op("Do", vec![name.into()]);
        self.op("Q", vec![]);
    }
}

fn pt_to_mm(points: f32) -> f32 {
    points * 25.4 / 72.0
}

/// Renders week windows of visitor records with a fixed table layout
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    layout: TableLayout,
}

impl ReportRenderer {
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    /// Render `records` (already filtered and ordered) as a complete PDF
    pub fn render(&self, window: &WeekWindow, records: &[VisitorRecord]) -> AppResult<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let pages = TableLayout::paginate(records.len());
        let page_count = pages.len();
        let mut page_ids = Vec::with_capacity(page_count);

        for (page_index, rows) in pages.into_iter().enumerate() {
            let mut canvas = PageCanvas::new();

            if page_index == 0 {
                self.draw_title(&mut canvas, &window.title());
            }
            self.draw_header(&mut canvas, page_index);

            for (slot, row) in rows.enumerate() {
                let record = &records[row];
                let top = TableLayout::row_top(page_index, slot);
                let image = record.signature.as_deref().and_then(signature::decode);
                let image_id = image.map(|img| doc.add_object(image_stream(img)));
                self.draw_row(&mut canvas, record, top, row, image_id);
            }

            draw_footer(&mut canvas, page_index + 1, page_count);

            let PageCanvas { operations, images } = canvas;
            let content = Content { operations }
                .encode()
                .map_err(|e| AppError::Report(format!("Failed to encode page content: {}", e)))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let resources = dictionary! {
                "Font" => dictionary! {
                    FONT_REGULAR => font_regular,
                    FONT_BOLD => font_bold,
                },
                "XObject" => images,
            };
            let media_box: Vec<Object> = vec![
                Object::Integer(0),
                Object::Integer(0),
                pt(PAGE_WIDTH).into(),
                pt(PAGE_HEIGHT).into(),
            ];

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Resources" => resources,
                "Contents" => content_id,
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(win_ansi(&window.title()), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!("registre-server ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Report(format!("Failed to write PDF: {}", e)))?;

        tracing::debug!(
            rows = records.len(),
            pages = page_count,
            bytes = buffer.len(),
            "Rendered weekly register"
        );
        Ok(buffer)
    }

    fn draw_title(&self, canvas: &mut PageCanvas, title: &str) {
        let x = (PAGE_WIDTH - text_width(title, TITLE_FONT_SIZE)) / 2.0;
        let baseline = MARGIN + TITLE_HEIGHT / 2.0 + pt_to_mm(TITLE_FONT_SIZE) * 0.35;
        canvas.text(FONT_BOLD, TITLE_FONT_SIZE, x.max(MARGIN), baseline, title);
    }

    fn draw_header(&self, canvas: &mut PageCanvas, page_index: usize) {
        let top = TableLayout::table_top(page_index);
        let columns = self.layout.columns();
        for (column, x) in columns.iter().zip(self.layout.column_offsets()) {
            let cell = Rect {
                x,
                y: top,
                width: column.width,
                height: HEADER_ROW_HEIGHT,
            };
            canvas.shaded_border(&cell, HEADER_GREY);
            canvas.cell_text(FONT_BOLD, HEADER_FONT_SIZE, &cell, column.label);
        }
    }

    fn draw_row(
        &self,
        canvas: &mut PageCanvas,
        record: &VisitorRecord,
        top: f32,
        row: usize,
        signature: Option<ObjectId>,
    ) {
        let columns = self.layout.columns();
        for (column, x) in columns.iter().zip(self.layout.column_offsets()) {
            let cell = Rect {
                x,
                y: top,
                width: column.width,
                height: ROW_HEIGHT,
            };
            canvas.border(&cell);
            match (column.kind, signature) {
                (ColumnKind::Signature, Some(id)) => {
                    canvas.image(&format!("Sig{}", row), id, &cell.inset(SIGNATURE_INSET));
                }
                (ColumnKind::Signature, None) => {}
                (kind, _) => {
                    canvas.cell_text(FONT_REGULAR, CELL_FONT_SIZE, &cell, &kind.text(record));
                }
            }
        }
    }
}

fn draw_footer(canvas: &mut PageCanvas, page_number: usize, page_count: usize) {
    let label = format!("Page {} / {}", page_number, page_count);
    let x = (PAGE_WIDTH - text_width(&label, FOOTER_FONT_SIZE)) / 2.0;
    canvas.text(FONT_REGULAR, FOOTER_FONT_SIZE, x, PAGE_HEIGHT - MARGIN, &label);
}

fn image_stream(image: SignatureImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        image.jpeg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::{NaiveDate, NaiveDateTime};
    use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, Rgba, RgbaImage};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn window() -> WeekWindow {
        WeekWindow::containing(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()).unwrap()
    }

    fn visitor(arrival: &str, last_name: &str, signature: Option<String>) -> VisitorRecord {
        VisitorRecord {
            arrival: at(arrival),
            departure: None,
            first_name: Some("Léa".to_string()),
            last_name: Some(last_name.to_string()),
            company: None,
            reason: Some("Livraison".to_string()),
            host: Some("Accueil".to_string()),
            phone: None,
            signature,
        }
    }

    fn signature_url() -> String {
        let img = RgbaImage::from_pixel(30, 10, Rgba([20, 20, 20, 255]));
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(img.as_raw(), 30, 10, ColorType::Rgba8)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(png))
    }

    /// Decoded content operations of every page
    fn page_operations(pdf: &[u8]) -> Vec<Vec<Operation>> {
        let doc = Document::load_mem(pdf).expect("output should be a readable PDF");
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let raw = doc.get_page_content(page_id).unwrap();
                Content::decode(&raw).unwrap().operations
            })
            .collect()
    }

    fn texts(operations: &[Operation]) -> Vec<String> {
        operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| b as char).collect()),
                _ => None,
            })
            .collect()
    }

    fn count(operations: &[Operation], operator: &str) -> usize {
        operations.iter().filter(|op| op.operator == operator).count()
    }

    fn render(records: &[VisitorRecord]) -> Vec<u8> {
        ReportRenderer::new(TableLayout::standard())
            .render(&window(), records)
            .unwrap()
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Prénom"), b"Pr\xe9nom".to_vec());
        assert_eq!(win_ansi("Hôte"), b"H\xf4te".to_vec());
        assert_eq!(win_ansi("cœur"), b"c\x9cur".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_empty_week_has_title_and_header_only() {
        let pdf = render(&[]);
        assert!(pdf.starts_with(b"%PDF-1.5"));

        let pages = page_operations(&pdf);
        assert_eq!(pages.len(), 1);
        let text = texts(&pages[0]);
        assert_eq!(
            text,
            vec![
                "Registre de la semaine du 2024-06-10 au 2024-06-17",
                "Date",
                "Nom",
                "Prénom",
                "Entreprise",
                "Motif",
                "Hôte",
                "Signature",
                "Page 1 / 1",
            ]
        );
        // Header cells only
        assert_eq!(count(&pages[0], "re"), 7);
    }

    #[test]
    fn test_unsigned_row() {
        let pdf = render(&[visitor("2024-06-10T09:00:00", "Dupont", None)]);
        let pages = page_operations(&pdf);
        let text = texts(&pages[0]);

        assert!(text.contains(&"2024-06-10 09:00".to_string()));
        assert!(text.contains(&"Dupont".to_string()));
        assert!(text.contains(&"Léa".to_string()));
        // Seven bordered data cells, no image drawn
        assert_eq!(count(&pages[0], "re"), 14);
        assert_eq!(count(&pages[0], "Do"), 0);
    }

    #[test]
    fn test_signed_row_embeds_image() {
        let pdf = render(&[visitor("2024-06-11T10:30:00", "Martin", Some(signature_url()))]);
        let pages = page_operations(&pdf);
        assert_eq!(count(&pages[0], "Do"), 1);

        let doc = Document::load_mem(&pdf).unwrap();
        let images = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(images, 1);
    }

    #[test]
    fn test_signature_drawn_inside_cell_inset() {
        let pdf = render(&[visitor("2024-06-11T10:30:00", "Martin", Some(signature_url()))]);
        let pages = page_operations(&pdf);
        let cm = pages[0]
            .iter()
            .find(|op| op.operator == "cm")
            .expect("image transform");
        let width = cm.operands[0].as_float().unwrap();
        let height = cm.operands[3].as_float().unwrap();
        assert!((width - pt(42.0 - 2.0 * SIGNATURE_INSET)).abs() < 0.01);
        assert!((height - pt(ROW_HEIGHT - 2.0 * SIGNATURE_INSET)).abs() < 0.01);
    }

    #[test]
    fn test_malformed_signature_leaves_empty_cell() {
        let records = vec![
            visitor("2024-06-10T09:00:00", "Dupont", Some("data:image/png;base64,@@@".to_string())),
            visitor("2024-06-10T09:05:00", "Durand", Some("not base64 at all".to_string())),
        ];
        let pdf = render(&records);
        let pages = page_operations(&pdf);

        assert_eq!(count(&pages[0], "Do"), 0);
        assert_eq!(count(&pages[0], "re"), 7 * 3);
        assert!(texts(&pages[0]).contains(&"Durand".to_string()));
    }

    #[test]
    fn test_rows_flow_over_pages() {
        let records: Vec<_> = (0..20)
            .map(|i| visitor(&format!("2024-06-12T{:02}:00:00", i), &format!("Visiteur {}", i), None))
            .collect();
        let pdf = render(&records);
        let pages = page_operations(&pdf);
        assert_eq!(pages.len(), 3);

        for (index, page) in pages.iter().enumerate() {
            let text = texts(page);
            assert!(text.contains(&"Prénom".to_string()), "header on page {}", index + 1);
            assert!(text.contains(&format!("Page {} / 3", index + 1)));
        }
        assert!(texts(&pages[0])[0].starts_with("Registre de la semaine"));
        assert!(!texts(&pages[1])[0].starts_with("Registre"));
        assert!(texts(&pages[2]).contains(&"Visiteur 19".to_string()));
        assert_eq!(count(&pages[2], "re"), 7 + 4 * 7);
    }

    #[test]
    fn test_text_is_stable_across_renders() {
        let records = vec![
            visitor("2024-06-10T09:00:00", "Dupont", Some(signature_url())),
            visitor("2024-06-13T17:45:00", "Lefèvre", None),
        ];
        let first = page_operations(&render(&records));
        let second = page_operations(&render(&records));
        assert_eq!(
            first.iter().map(|p| texts(p)).collect::<Vec<_>>(),
            second.iter().map(|p| texts(p)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_departure_layout() {
        let mut record = visitor("2024-06-10T09:00:00", "Dupont", None);
        record.departure = Some(at("2024-06-10T11:15:00"));
        let pdf = ReportRenderer::new(TableLayout::with_departure())
            .render(&window(), &[record])
            .unwrap();
        let text = texts(&page_operations(&pdf)[0]);

        assert!(text.contains(&"Départ".to_string()));
        assert!(text.contains(&"2024-06-10 11:15".to_string()));
    }
}
