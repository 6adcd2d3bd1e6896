use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use itertools::Itertools;

use super::CsvExport;
use crate::catalog::{Category, Product};
use crate::dashboard::{
    DashboardView, DetailView, FormField, LoadState, Notification, Presenter,
};
use crate::view::{PageLink, SortKey};

const TITLE_WIDTH: usize = 40;
const CATEGORY_WIDTH: usize = 14;
const IMAGE_WIDTH: usize = 36;
const DESCRIPTION_WIDTH: usize = 72;

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize) -> String {
    let clipped = clip(value, width);
    let fill = width.saturating_sub(clipped.chars().count());
    format!("{clipped}{}", " ".repeat(fill))
}

pub fn format_price(price: f64) -> String {
    format!("${price}")
}

fn column_label(view: &DashboardView<'_>, key: SortKey, label: &str) -> String {
    match view.sort {
        Some((active, direction)) if active == key => format!("{label} {}", direction.arrow()),
        _ => label.to_string(),
    }
}

pub fn render_links(links: &[PageLink]) -> String {
    links
        .iter()
        .map(|link| match *link {
            PageLink::Previous { enabled, .. } if enabled => "«".to_string(),
            PageLink::Previous { .. } => "«".dimmed().to_string(),
            PageLink::Page { number, active } if active => {
                format!("[{number}]").bold().to_string()
            }
            PageLink::Page { number, .. } => number.to_string(),
            PageLink::Ellipsis => "...".dimmed().to_string(),
            PageLink::Next { enabled, .. } if enabled => "»".to_string(),
            PageLink::Next { .. } => "»".dimmed().to_string(),
        })
        .join(" ")
}

pub fn format_notification(notification: &Notification) -> String {
    let tag = if notification.is_error() {
        "ERR".bold().red()
    } else if notification.is_notice() {
        "INF".bold().yellow()
    } else {
        "OK".bold().green()
    };
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        notification
    )
}

pub struct TerminalPresenter<W: Write> {
    out: W,
    export_dir: PathBuf,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, export_dir: PathBuf) -> Self {
        Self { out, export_dir }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_notification(&mut self, notification: &Notification) {
        let _ = writeln!(self.out, "{}", format_notification(notification));
    }

    fn row(&mut self, index: usize, product: &Product) {
        let category = product.category_name();
        let category = if category == "N/A" {
            pad(category, CATEGORY_WIDTH).dimmed().to_string()
        } else {
            pad(category, CATEGORY_WIDTH)
        };
        let image = match product.images.first() {
            Some(url) => clip(url, IMAGE_WIDTH),
            None => "No image".dimmed().to_string(),
        };
        let _ = writeln!(
            self.out,
            "{:>3}  {:>6}  {}  {:>10}  {}  {}",
            index,
            product.id,
            pad(&product.title, TITLE_WIDTH),
            format_price(product.price).green(),
            category,
            image
        );
        let description = product.description_or_empty().trim();
        if !description.is_empty() {
            let flat = description.replace(|c: char| c == '\n' || c == '\r', " ");
            let preview = clip(&flat, DESCRIPTION_WIDTH);
            let _ = writeln!(self.out, "{:>13}{}", "", preview.dimmed());
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &DashboardView<'_>) {
        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "{}",
            format!(
                "{:>3}  {:>6}  {}  {:>10}  {}  {}",
                "#",
                column_label(view, SortKey::Id, "ID"),
                pad(&column_label(view, SortKey::Title, "Title"), TITLE_WIDTH),
                column_label(view, SortKey::Price, "Price"),
                pad("Category", CATEGORY_WIDTH),
                "Image"
            )
            .bold()
        );

        match view.load {
            LoadState::Failed => {
                let _ = writeln!(self.out, "{}", "Unable to load product data".red());
            }
            LoadState::Pending => {
                let _ = writeln!(self.out, "{}", "Loading...".dimmed());
            }
            LoadState::Ready if view.rows.is_empty() => {
                let _ = writeln!(self.out, "{}", "No products found".dimmed());
            }
            LoadState::Ready => {
                for (i, product) in view.rows.iter().enumerate() {
                    self.row(i + 1, product);
                }
            }
        }

        let mut footer = format!(
            ":: Page {}/{} :: {} of {} products :: {} / page",
            view.current_page,
            view.total_pages.max(1),
            view.filtered_count,
            view.total_count,
            view.page_size
        );
        if !view.search.is_empty() {
            footer.push_str(&format!(" :: search \"{}\"", view.search));
        }
        let _ = writeln!(self.out, "{}", footer.dimmed());
        if !view.links.is_empty() {
            let _ = writeln!(self.out, ":: {}", render_links(&view.links));
        }
    }

    fn show_detail(&mut self, detail: &DetailView) {
        let p = &detail.product;
        let _ = writeln!(
            self.out,
            "\n{} {}",
            "Product details:".bold(),
            p.title.bold()
        );
        let _ = writeln!(self.out, "  id          : {}", p.id);
        for field in FormField::ALL {
            let _ = writeln!(
                self.out,
                "  {:<12}: {}",
                field.label(),
                detail.form.get(field)
            );
        }
        let _ = writeln!(self.out, "  {:<12}: {}", "", p.category_name().dimmed());
        let _ = writeln!(
            self.out,
            "{}",
            "Edit with `save key=value ...`, `close` to discard.".dimmed()
        );
    }

    fn close_detail(&mut self) {}

    fn close_create(&mut self) {}

    fn focus(&mut self, field: FormField) {
        let _ = writeln!(
            self.out,
            "{} {}",
            "->".yellow().bold(),
            format!("check the `{}` field", field.label()).yellow()
        );
    }

    fn show_categories(&mut self, categories: &[Category]) {
        if categories.is_empty() {
            let _ = writeln!(self.out, "{}", "No categories known yet".dimmed());
            return;
        }
        for c in categories {
            let _ = writeln!(self.out, "{:>6}  {}", c.id, c.name);
        }
    }

    fn deliver(&mut self, export: &CsvExport) -> std::io::Result<String> {
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(&export.filename);
        std::fs::write(&path, export.body.as_bytes())?;
        Ok(path.display().to_string())
    }
}
