pub mod form;
pub mod notify;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::catalog::{self, CatalogApi, Category, Product, ProductId};
use crate::output::{self, CsvExport};
use crate::view::{self, PageLink, SortDirection, SortKey, ViewQuery};

pub use form::{DraftDefaults, FormField, ProductForm, ValidationError};
pub use notify::Notification;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub search: String,
    pub sort: Option<(SortKey, SortDirection)>,
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Pending,
    Ready,
    Failed,
}

#[derive(Clone, Debug)]
pub struct DashboardView<'a> {
    pub rows: Vec<&'a Product>,
    pub current_page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub links: Vec<PageLink>,
    pub sort: Option<(SortKey, SortDirection)>,
    pub search: &'a str,
    pub page_size: usize,
    pub load: LoadState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    pub product: Product,
    pub form: ProductForm,
}

impl DetailView {
    pub fn id(&self) -> ProductId {
        self.product.id
    }
}

/// Drawing surface for the dashboard. The dashboard decides what to show;
/// implementations only decide how.
pub trait Presenter {
    fn render(&mut self, view: &DashboardView<'_>);

    fn show_detail(&mut self, detail: &DetailView);

    fn close_detail(&mut self);

    fn close_create(&mut self);

    fn focus(&mut self, field: FormField);

    fn show_categories(&mut self, categories: &[Category]);

    /// Hands an export to the operator and returns where it went.
    fn deliver(&mut self, export: &CsvExport) -> std::io::Result<String>;
}

pub struct Dashboard<C, P> {
    client: C,
    presenter: P,
    records: Vec<Product>,
    state: ViewState,
    load: LoadState,
    // row index on the visible page -> product id
    rows: Vec<ProductId>,
    total_pages: usize,
    detail: Option<DetailView>,
    defaults: DraftDefaults,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl<C: CatalogApi, P: Presenter> Dashboard<C, P> {
    pub fn new(
        client: C,
        presenter: P,
        state: ViewState,
        defaults: DraftDefaults,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Self {
            client,
            presenter,
            records: Vec::new(),
            state,
            load: LoadState::Pending,
            rows: Vec::new(),
            total_pages: 0,
            detail: None,
            defaults,
            notifications: tx,
        };
        (dashboard, rx)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn records(&self) -> &[Product] {
        &self.records
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn page_rows(&self) -> Vec<&Product> {
        self.rows
            .iter()
            .filter_map(|id| self.find(*id).map(|i| &self.records[i]))
            .collect()
    }

    fn find(&self, id: ProductId) -> Option<usize> {
        self.records.iter().position(|p| p.id == id)
    }

    fn notify(&self, notification: Notification) {
        debug!(%notification, "notify");
        let _ = self.notifications.send(notification);
    }

    fn refresh(&mut self) {
        let query = ViewQuery {
            search: &self.state.search,
            sort: self.state.sort,
            page: self.state.current_page,
            page_size: self.state.page_size,
        };
        let mut slice = view::run(&self.records, &query);

        // mutations can shrink the result set under the current page
        let last = slice.total_pages.max(1);
        if self.state.current_page == 0 || self.state.current_page > last {
            let page = self.state.current_page.clamp(1, last);
            slice = view::run(&self.records, &ViewQuery { page, ..query });
            self.state.current_page = page;
        }

        self.rows = slice.rows.iter().map(|p| p.id).collect();
        self.total_pages = slice.total_pages;

        let view = DashboardView {
            links: view::page_window(self.state.current_page, slice.total_pages),
            rows: slice.rows,
            current_page: self.state.current_page,
            total_pages: slice.total_pages,
            filtered_count: slice.filtered_count,
            total_count: self.records.len(),
            sort: self.state.sort,
            search: &self.state.search,
            page_size: self.state.page_size,
            load: self.load,
        };
        self.presenter.render(&view);
    }

    pub async fn load(&mut self) {
        match self.client.list_all().await {
            Ok(products) => {
                debug!(count = products.len(), "catalog loaded");
                self.records = products;
                self.load = LoadState::Ready;
                self.refresh();
                self.notify(Notification::Loaded {
                    count: self.records.len(),
                });
            }
            Err(e) => {
                warn!(error = %e, "catalog load failed");
                self.records.clear();
                self.load = LoadState::Failed;
                self.refresh();
                self.notify(Notification::LoadFailed {
                    kind: e.kind(),
                    message: e.user_message(),
                });
            }
        }
    }

    pub fn show(&mut self) {
        self.refresh();
    }

    pub fn search(&mut self, term: &str) {
        self.state.search = term.to_lowercase();
        self.state.current_page = 1;
        self.refresh();
    }

    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            self.notify(Notification::Invalid {
                field: None,
                message: "Page size must be a positive number".to_string(),
            });
            return;
        }
        self.state.page_size = size;
        self.state.current_page = 1;
        self.refresh();
    }

    /// Same key flips the direction, a new key starts ascending. The current
    /// page is kept.
    pub fn sort_by(&mut self, key: SortKey) {
        self.state.sort = match self.state.sort {
            Some((current, direction)) if current == key => Some((key, direction.flipped())),
            _ => Some((key, SortDirection::Ascending)),
        };
        self.refresh();
    }

    /// Returns false, leaving the state untouched, when `page` is outside
    /// `1..=total_pages`.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages {
            self.notify(Notification::PageRejected {
                requested: page,
                total: self.total_pages,
            });
            return false;
        }
        self.state.current_page = page;
        self.refresh();
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.state.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.go_to_page(self.state.current_page.saturating_sub(1))
    }

    pub fn open_row(&mut self, row: usize) -> Option<&DetailView> {
        let id = row.checked_sub(1).and_then(|i| self.rows.get(i).copied());
        let Some(product) = id.and_then(|id| self.find(id)).map(|i| self.records[i].clone())
        else {
            self.notify(Notification::UnknownRow { row });
            return None;
        };

        let detail = DetailView {
            form: ProductForm::from_product(&product),
            product,
        };
        self.presenter.show_detail(&detail);
        self.detail = Some(detail);
        self.detail.as_ref()
    }

    pub fn close_detail(&mut self) {
        if self.detail.take().is_some() {
            self.presenter.close_detail();
        }
    }

    /// Sends the edited detail form. The detail view stays open on failure.
    pub async fn save_detail(&mut self, form: ProductForm) {
        let Some(id) = self.detail.as_ref().map(DetailView::id) else {
            self.notify(Notification::Invalid {
                field: None,
                message: "Open a product before saving".to_string(),
            });
            return;
        };
        if let Some(detail) = self.detail.as_mut() {
            detail.form = form.clone();
        }

        let patch = match form::coerce_update(&form) {
            Ok(patch) => patch,
            Err(e) => {
                self.presenter.focus(e.field);
                self.notify(Notification::Invalid {
                    field: Some(e.field),
                    message: e.message,
                });
                return;
            }
        };

        match self.client.update(id, &patch).await {
            Ok(()) => {
                let known = catalog::known_categories(&self.records);
                if let Some(index) = self.find(id) {
                    self.records[index].apply_patch(&patch, &known);
                }
                self.refresh();
                self.detail = None;
                self.presenter.close_detail();
                self.notify(Notification::Updated { id });
            }
            Err(e) => {
                warn!(id, error = %e, "update failed");
                self.notify(Notification::UpdateFailed {
                    id,
                    kind: e.kind(),
                    message: e.user_message(),
                });
            }
        }
    }

    /// Validates and submits a new product. Nothing reaches the network
    /// unless every required field passes.
    pub async fn create(&mut self, form: &ProductForm) -> Option<ProductId> {
        let draft = match form::validate_create(form, &self.defaults) {
            Ok(draft) => draft,
            Err(e) => {
                self.presenter.focus(e.field);
                self.notify(Notification::Invalid {
                    field: Some(e.field),
                    message: e.message,
                });
                return None;
            }
        };

        match self.client.create(&draft).await {
            Ok(product) => {
                let id = product.id;
                let title = product.title.clone();
                if self.find(id).is_some() {
                    warn!(id, "server returned an id already in the table, replacing it");
                    self.records.retain(|p| p.id != id);
                }
                self.records.insert(0, product);
                self.state.current_page = 1;
                self.refresh();
                self.presenter.close_create();
                self.notify(Notification::Created { id, title });
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                self.notify(Notification::CreateFailed {
                    kind: e.kind(),
                    message: e.user_message(),
                });
                None
            }
        }
    }

    pub fn export(&mut self) {
        let export = {
            let rows = self.page_rows();
            output::csv_export(&rows, self.state.current_page)
        };
        let Some(export) = export else {
            self.notify(Notification::NothingToExport);
            return;
        };

        match self.presenter.deliver(&export) {
            Ok(location) => self.notify(Notification::Exported {
                location,
                rows: export.rows,
            }),
            Err(e) => self.notify(Notification::ExportFailed {
                message: e.to_string(),
            }),
        }
    }

    pub fn show_categories(&mut self) {
        let categories = catalog::known_categories(&self.records);
        self.presenter.show_categories(&categories);
    }
}
