//! Excel export of the delivery history

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use toyu_types::{Error, Result};

use crate::app::HistoryView;

fn excel(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Build the history workbook: one sheet per-day totals, one sheet of records
pub fn history_workbook(view: &HistoryView) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, view)?;

    let details_sheet = workbook.add_worksheet();
    write_details_sheet(details_sheet, view)?;

    workbook.save_to_buffer().map_err(excel)
}

/// `history_<YYMMDDHHMMSS>.xlsx`
pub fn history_file_name(now: chrono::NaiveDateTime) -> String {
    format!("history_{}.xlsx", now.format("%y%m%d%H%M%S"))
}

fn write_summary_sheet(sheet: &mut Worksheet, view: &HistoryView) -> Result<()> {
    sheet.set_name("日別集計").map_err(excel)?;

    let header_format = Format::new().set_bold();
    let headers = ["日付", "件数", "数量(L)", "合計(円)", "未出力", "出力済"];
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel)?;
    }

    for (idx, day) in view.days.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &day.date).map_err(excel)?;
        sheet
            .write_number(row, 1, day.records.len() as f64)
            .map_err(excel)?;
        sheet.write_number(row, 2, day.total_qty).map_err(excel)?;
        sheet.write_number(row, 3, day.total_amount).map_err(excel)?;
        sheet
            .write_number(row, 4, day.unexported as f64)
            .map_err(excel)?;
        sheet
            .write_number(row, 5, day.exported as f64)
            .map_err(excel)?;
    }

    let total_row = (view.days.len() + 1) as u32;
    sheet
        .write_string_with_format(total_row, 0, "合計", &header_format)
        .map_err(excel)?;
    sheet
        .write_number(total_row, 1, view.totals.count as f64)
        .map_err(excel)?;
    sheet
        .write_number(total_row, 2, view.totals.qty)
        .map_err(excel)?;
    sheet
        .write_number(total_row, 3, view.totals.total)
        .map_err(excel)?;

    Ok(())
}

fn write_details_sheet(sheet: &mut Worksheet, view: &HistoryView) -> Result<()> {
    sheet.set_name("配送記録").map_err(excel)?;

    let header_format = Format::new().set_bold();
    let headers = [
        "日付",
        "時刻",
        "顧客コード",
        "顧客名",
        "タンク",
        "数量(L)",
        "単価",
        "金額",
        "消費税",
        "合計",
        "状態",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel)?;
    }

    let records = view.days.iter().flat_map(|day| day.records.iter());
    for (idx, r) in records.enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &r.date).map_err(excel)?;
        sheet.write_string(row, 1, &r.time).map_err(excel)?;
        sheet.write_string(row, 2, &r.cust_code).map_err(excel)?;
        sheet.write_string(row, 3, &r.cust_name).map_err(excel)?;
        sheet.write_string(row, 4, &r.tank_name).map_err(excel)?;
        sheet.write_number(row, 5, r.qty).map_err(excel)?;
        sheet.write_number(row, 6, r.unit_price).map_err(excel)?;
        sheet.write_number(row, 7, r.amount).map_err(excel)?;
        sheet.write_number(row, 8, r.tax).map_err(excel)?;
        sheet.write_number(row, 9, r.total).map_err(excel)?;
        sheet
            .write_string(row, 10, if r.exported { "出力済" } else { "未出力" })
            .map_err(excel)?;
    }

    Ok(())
}
