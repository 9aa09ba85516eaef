use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::models::event::EventDetail;
use crate::models::event_item::EventItemWithInventory;
use crate::models::inventory::InventoryDetail;
use crate::utils::error::AppError;

fn render_error(err: XlsxError) -> AppError {
    AppError::Internal(format!("Excel rendering failed: {err}"))
}

fn write_headers(
    sheet: &mut Worksheet,
    headers: &[(&str, f64)],
) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, (header, width)) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &bold)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(())
}

pub fn inventory_excel(items: &[InventoryDetail]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Inventory").map_err(render_error)?;

    write_headers(
        sheet,
        &[
            ("Name", 30.0),
            ("Category", 16.0),
            ("Brand", 16.0),
            ("Quantity", 10.0),
            ("Condition", 16.0),
            ("Acquisition Value", 18.0),
            ("Location", 24.0),
            ("Responsible", 20.0),
        ],
    )
    .map_err(render_error)?;

    for (i, detail) in items.iter().enumerate() {
        let row = i as u32 + 1;
        let item = &detail.item;
        sheet.write_string(row, 0, &item.name).map_err(render_error)?;
        sheet
            .write_string(row, 1, item.category.as_str())
            .map_err(render_error)?;
        sheet
            .write_string(row, 2, item.brand.as_deref().unwrap_or("-"))
            .map_err(render_error)?;
        sheet
            .write_number(row, 3, f64::from(item.quantity))
            .map_err(render_error)?;
        sheet
            .write_string(row, 4, item.condition.as_str())
            .map_err(render_error)?;
        let value = item
            .acquisition_value
            .and_then(|v| v.to_f64())
            .unwrap_or(0.0);
        sheet.write_number(row, 5, value).map_err(render_error)?;
        let location = detail
            .location
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("-");
        sheet.write_string(row, 6, location).map_err(render_error)?;
        sheet
            .write_string(row, 7, item.responsible.as_deref().unwrap_or("-"))
            .map_err(render_error)?;
    }

    workbook.save_to_buffer().map_err(render_error)
}

pub fn events_excel(events: &[EventDetail<EventItemWithInventory>]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Events").map_err(render_error)?;

    write_headers(
        sheet,
        &[
            ("Name", 30.0),
            ("Type", 14.0),
            ("Status", 14.0),
            ("Start Date", 14.0),
            ("End Date", 14.0),
            ("Participants", 12.0),
            ("Items Used", 12.0),
            ("Responsible", 20.0),
        ],
    )
    .map_err(render_error)?;

    for (i, detail) in events.iter().enumerate() {
        let row = i as u32 + 1;
        let event = &detail.event;
        sheet.write_string(row, 0, &event.name).map_err(render_error)?;
        sheet
            .write_string(row, 1, event.r#type.as_str())
            .map_err(render_error)?;
        sheet
            .write_string(row, 2, event.status.as_str())
            .map_err(render_error)?;
        sheet
            .write_string(row, 3, event.start_date.format("%Y-%m-%d").to_string())
            .map_err(render_error)?;
        sheet
            .write_string(row, 4, event.end_date.format("%Y-%m-%d").to_string())
            .map_err(render_error)?;
        sheet
            .write_number(row, 5, f64::from(event.participants.unwrap_or(0)))
            .map_err(render_error)?;
        let items_used: i64 = detail
            .event_items
            .iter()
            .map(|ei| i64::from(ei.item.quantity_used))
            .sum();
        sheet
            .write_number(row, 6, items_used as f64)
            .map_err(render_error)?;
        sheet
            .write_string(row, 7, &event.responsible)
            .map_err(render_error)?;
    }

    workbook.save_to_buffer().map_err(render_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    // xlsx files are zip archives, so a valid buffer starts with "PK".
    #[test]
    fn empty_inventory_workbook_is_valid_zip() {
        let bytes = inventory_excel(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_events_workbook_is_valid_zip() {
        let bytes = events_excel(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
