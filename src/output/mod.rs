pub mod table;

use crate::catalog::Product;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

const CSV_HEADER: [&str; 6] = ["ID", "Title", "Price", "Description", "Category", "Images"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub mime: &'static str,
    pub body: String,
    pub rows: usize,
}

pub fn export_filename(page: usize) -> String {
    format!("products_page_{page}.csv")
}

fn quote_csv(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_row(product: &Product) -> String {
    [
        product.id.to_string(),
        quote_csv(&product.title),
        product.price.to_string(),
        quote_csv(product.description_or_empty()),
        quote_csv(product.category_name()),
        quote_csv(&product.images.join("; ")),
    ]
    .join(",")
}

pub fn render_csv(rows: &[&Product]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.join(","));
    lines.extend(rows.iter().map(|p| csv_row(p)));
    lines.join("\n")
}

/// `None` when the page is empty; exporting nothing is not an error.
pub fn csv_export(rows: &[&Product], page: usize) -> Option<CsvExport> {
    if rows.is_empty() {
        return None;
    }
    Some(CsvExport {
        filename: export_filename(page),
        mime: CSV_MIME,
        body: render_csv(rows),
        rows: rows.len(),
    })
}
