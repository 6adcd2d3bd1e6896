use std::fmt;

use crate::catalog::{ErrorKind, ProductId};

use super::form::FormField;

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Loaded {
        count: usize,
    },
    LoadFailed {
        kind: ErrorKind,
        message: String,
    },
    Created {
        id: ProductId,
        title: String,
    },
    CreateFailed {
        kind: ErrorKind,
        message: String,
    },
    Updated {
        id: ProductId,
    },
    UpdateFailed {
        id: ProductId,
        kind: ErrorKind,
        message: String,
    },
    Invalid {
        field: Option<FormField>,
        message: String,
    },
    Exported {
        location: String,
        rows: usize,
    },
    ExportFailed {
        message: String,
    },
    NothingToExport,
    PageRejected {
        requested: usize,
        total: usize,
    },
    UnknownRow {
        row: usize,
    },
}

impl Notification {
    /// Requests that were declined without touching any state.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            Notification::NothingToExport | Notification::PageRejected { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        !self.is_notice()
            && !matches!(
                self,
                Notification::Loaded { .. }
                    | Notification::Created { .. }
                    | Notification::Updated { .. }
                    | Notification::Exported { .. }
            )
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Notification::LoadFailed { kind, .. }
            | Notification::CreateFailed { kind, .. }
            | Notification::UpdateFailed { kind, .. } => Some(*kind),
            Notification::Invalid { .. } => Some(ErrorKind::Validation),
            _ => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Loaded { count } => write!(f, "Loaded {count} products"),
            Notification::LoadFailed { message, .. } => {
                write!(f, "Unable to load product data: {message}")
            }
            Notification::Created { id, title } => {
                write!(f, "Product created successfully (#{id} {title})")
            }
            Notification::CreateFailed { message, .. } => {
                write!(f, "Failed to create product: {message}")
            }
            Notification::Updated { id } => write!(f, "Product #{id} updated successfully"),
            Notification::UpdateFailed { id, message, .. } => {
                write!(f, "Failed to update product #{id}: {message}")
            }
            Notification::Invalid { message, .. } => f.write_str(message),
            Notification::Exported { location, rows } => {
                write!(f, "Exported {rows} rows to {location}")
            }
            Notification::ExportFailed { message } => write!(f, "Export failed: {message}"),
            Notification::NothingToExport => f.write_str("No data to export"),
            Notification::PageRejected { total: 0, .. } => f.write_str("There are no pages"),
            Notification::PageRejected { requested, total } => {
                write!(f, "Page {requested} is out of range (1-{total})")
            }
            Notification::UnknownRow { row } => write!(f, "No row {row} on this page"),
        }
    }
}
