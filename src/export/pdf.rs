use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::models::event::EventDetail;
use crate::models::event_item::EventItemWithInventory;
use crate::models::inventory::InventoryDetail;
use crate::utils::error::AppError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;

fn mm(v: f32) -> Mm {
    Mm(v.into())
}

fn render_error(err: printpdf::Error) -> AppError {
    AppError::Internal(format!("PDF rendering failed: {err}"))
}

struct Column {
    header: &'static str,
    x: f32,
}

/// Cursor over an A4 portrait document; opens a fresh page whenever a row
/// would run past the bottom margin.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, AppError> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn title(&mut self, title: &str) {
        self.layer
            .use_text(title, 16.0, mm(MARGIN), mm(self.y), &self.bold);
        self.y -= LINE_HEIGHT;
        let generated = format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
        self.layer
            .use_text(generated, 9.0, mm(MARGIN), mm(self.y), &self.regular);
        self.y -= LINE_HEIGHT * 2.0;
    }

    fn ensure_room(&mut self, columns: &[Column]) {
        if self.y >= MARGIN + LINE_HEIGHT {
            return;
        }
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.header_row(columns);
    }

    fn header_row(&mut self, columns: &[Column]) {
        for col in columns {
            self.layer
                .use_text(col.header, 10.0, mm(col.x), mm(self.y), &self.bold);
        }
        self.y -= LINE_HEIGHT;
    }

    fn data_row(&mut self, columns: &[Column], cells: &[String]) {
        self.ensure_room(columns);
        for (col, cell) in columns.iter().zip(cells) {
            self.layer
                .use_text(cell, 9.0, mm(col.x), mm(self.y), &self.regular);
        }
        self.y -= LINE_HEIGHT;
    }

    fn finish(self) -> Result<Vec<u8>, AppError> {
        self.doc.save_to_bytes().map_err(render_error)
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

pub fn inventory_pdf(items: &[InventoryDetail]) -> Result<Vec<u8>, AppError> {
    let columns = [
        Column { header: "Name", x: MARGIN },
        Column { header: "Category", x: 70.0 },
        Column { header: "Qty", x: 105.0 },
        Column { header: "Condition", x: 120.0 },
        Column { header: "Location", x: 155.0 },
    ];

    let mut writer = PdfWriter::new("Inventory Report")?;
    writer.title("Inventory Report");
    writer.header_row(&columns);

    for detail in items {
        let location = detail
            .location
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("-");
        writer.data_row(
            &columns,
            &[
                truncate(&detail.item.name, 28),
                detail.item.category.as_str().to_string(),
                detail.item.quantity.to_string(),
                detail.item.condition.as_str().to_string(),
                truncate(location, 22),
            ],
        );
    }

    writer.finish()
}

pub fn events_pdf(events: &[EventDetail<EventItemWithInventory>]) -> Result<Vec<u8>, AppError> {
    let columns = [
        Column { header: "Name", x: MARGIN },
        Column { header: "Type", x: 70.0 },
        Column { header: "Status", x: 95.0 },
        Column { header: "Start", x: 125.0 },
        Column { header: "Responsible", x: 155.0 },
    ];

    let mut writer = PdfWriter::new("Events Report")?;
    writer.title("Events Report");
    writer.header_row(&columns);

    for detail in events {
        writer.data_row(
            &columns,
            &[
                truncate(&detail.event.name, 28),
                detail.event.r#type.as_str().to_string(),
                detail.event.status.as_str().to_string(),
                detail.event.start_date.format("%Y-%m-%d").to_string(),
                truncate(&detail.event.responsible, 22),
            ],
        );
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inventory_report_is_valid_pdf() {
        let bytes = inventory_pdf(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_events_report_is_valid_pdf() {
        let bytes = events_pdf(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn truncate_keeps_short_values_intact() {
        assert_eq!(truncate("Projector", 28), "Projector");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
