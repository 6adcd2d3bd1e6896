use std::cell::{Cell, RefCell};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::catalog::{
    CatalogApi, CatalogError, Category, ErrorKind, Product, ProductDraft, ProductId,
    PLACEHOLDER_IMAGE,
};
use crate::dashboard::{
    Dashboard, DashboardView, DetailView, DraftDefaults, FormField, LoadState, Notification,
    Presenter, ProductForm, ViewState,
};
use crate::output::CsvExport;
use crate::view::pagination::listed_pages;
use crate::view::{PageLink, SortDirection, SortKey};

#[derive(Default)]
struct FakeCatalog {
    products: Vec<Product>,
    fail_list: bool,
    reject_create: Option<String>,
    reject_update: bool,
    next_id: Cell<ProductId>,
    calls: RefCell<Vec<String>>,
}

impl FakeCatalog {
    fn with(products: Vec<Product>) -> Self {
        Self {
            products,
            next_id: Cell::new(1000),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CatalogApi for FakeCatalog {
    async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        self.calls.borrow_mut().push("list".to_string());
        if self.fail_list {
            return Err(CatalogError::Status {
                status: 503,
                message: "failed to fetch products".to_string(),
            });
        }
        Ok(self.products.clone())
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        self.calls.borrow_mut().push(format!("create {}", draft.title));
        if let Some(message) = self.reject_create.clone() {
            return Err(CatalogError::Status {
                status: 400,
                message,
            });
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(Product {
            id,
            title: draft.title.clone(),
            price: draft.price,
            description: Some(draft.description.clone()),
            category: Some(Category {
                id: draft.category_id,
                name: "Server Category".to_string(),
                image: None,
            }),
            images: draft.images.clone(),
        })
    }

    async fn update(&self, id: ProductId, _patch: &ProductDraft) -> Result<(), CatalogError> {
        self.calls.borrow_mut().push(format!("update {id}"));
        if self.reject_update {
            return Err(CatalogError::Status {
                status: 500,
                message: "failed to update product".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Frame {
    ids: Vec<ProductId>,
    current_page: usize,
    total_pages: usize,
    filtered_count: usize,
    links: Vec<PageLink>,
    load: LoadState,
}

#[derive(Default)]
struct RecordingPresenter {
    frames: Vec<Frame>,
    details: Vec<DetailView>,
    detail_closed: usize,
    create_closed: usize,
    focused: Vec<FormField>,
    delivered: Vec<CsvExport>,
    categories: Vec<Category>,
    fail_delivery: bool,
}

impl RecordingPresenter {
    fn last(&self) -> &Frame {
        self.frames.last().expect("nothing rendered")
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, view: &DashboardView<'_>) {
        self.frames.push(Frame {
            ids: view.rows.iter().map(|p| p.id).collect(),
            current_page: view.current_page,
            total_pages: view.total_pages,
            filtered_count: view.filtered_count,
            links: view.links.clone(),
            load: view.load,
        });
    }

    fn show_detail(&mut self, detail: &DetailView) {
        self.details.push(detail.clone());
    }

    fn close_detail(&mut self) {
        self.detail_closed += 1;
    }

    fn close_create(&mut self) {
        self.create_closed += 1;
    }

    fn focus(&mut self, field: FormField) {
        self.focused.push(field);
    }

    fn show_categories(&mut self, categories: &[Category]) {
        self.categories = categories.to_vec();
    }

    fn deliver(&mut self, export: &CsvExport) -> std::io::Result<String> {
        if self.fail_delivery {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            ));
        }
        self.delivered.push(export.clone());
        Ok(format!("./{}", export.filename))
    }
}

type TestDashboard = Dashboard<FakeCatalog, RecordingPresenter>;

fn catalog_of_twelve() -> Vec<Product> {
    let titles = [
        "Oak Desk Lamp",
        "Canvas Backpack",
        "Steel Water Bottle",
        "Linen Shirt",
        "Floor Lamp",
        "Wool Scarf",
        "Leather Wallet",
        "Ceramic Mug",
        "Bedside lamp",
        "Running Shoes",
        "Denim Jacket",
        "Glass Vase",
    ];
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Product {
            id: i as u64 + 1,
            title: title.to_string(),
            price: 10.0 + (i % 4) as f64,
            description: Some(format!("about {title}")),
            category: Some(Category {
                id: (i % 3) as u64 + 1,
                name: ["Clothes", "Electronics", "Furniture"][i % 3].to_string(),
                image: None,
            }),
            images: vec![format!("https://img.test/{}.png", i + 1)],
        })
        .collect()
}

async fn loaded(catalog: FakeCatalog) -> (TestDashboard, UnboundedReceiver<Notification>) {
    let (mut dashboard, mut rx) = Dashboard::new(
        catalog,
        RecordingPresenter::default(),
        ViewState::default(),
        DraftDefaults::default(),
    );
    dashboard.load().await;
    let first = rx.try_recv();
    assert!(matches!(
        first,
        Ok(Notification::Loaded { .. }) | Ok(Notification::LoadFailed { .. })
    ));
    (dashboard, rx)
}

fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn form(title: &str, price: &str, category: &str, images: &str) -> ProductForm {
    ProductForm {
        title: title.to_string(),
        price: price.to_string(),
        description: String::new(),
        category: category.to_string(),
        images: images.to_string(),
    }
}

#[tokio::test]
async fn twelve_records_page_search_and_sort() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;

    let frame = dashboard.presenter().last().clone();
    assert_eq!(frame.ids.len(), 10);
    assert_eq!(frame.total_pages, 2);
    assert_eq!(listed_pages(&frame.links), vec![1, 2]);
    assert!(!frame.links.contains(&PageLink::Ellipsis));

    assert!(dashboard.go_to_page(2));
    assert_eq!(dashboard.presenter().last().ids, vec![11, 12]);

    dashboard.search("LAMP");
    let frame = dashboard.presenter().last().clone();
    assert_eq!(frame.filtered_count, 3);
    assert_eq!(frame.current_page, 1);
    assert_eq!(frame.ids, vec![1, 5, 9]);
    assert!(frame.links.is_empty());

    dashboard.search("");
    dashboard.sort_by(SortKey::Title);
    let ascending = dashboard.presenter().last().ids.clone();
    dashboard.set_page_size(20);
    let full_asc = dashboard.presenter().last().ids.clone();
    dashboard.sort_by(SortKey::Title);
    assert_eq!(
        dashboard.state().sort,
        Some((SortKey::Title, SortDirection::Descending))
    );
    let mut full_desc = dashboard.presenter().last().ids.clone();
    full_desc.reverse();
    assert_eq!(full_asc, full_desc);
    assert_eq!(&full_asc[..10], &ascending[..]);

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn out_of_range_pages_are_rejected_without_state_change() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    let before = dashboard.state().clone();
    let frames = dashboard.presenter().frames.len();

    assert!(!dashboard.go_to_page(0));
    assert!(!dashboard.go_to_page(3));
    assert!(!dashboard.prev_page());

    assert_eq!(dashboard.state(), &before);
    assert_eq!(dashboard.presenter().frames.len(), frames);
    let rejected = drain(&mut rx);
    assert_eq!(rejected.len(), 3);
    assert!(rejected
        .iter()
        .all(|n| matches!(n, Notification::PageRejected { total: 2, .. })));

    assert!(dashboard.next_page());
    assert_eq!(dashboard.state().current_page, 2);
}

#[tokio::test]
async fn empty_catalog_has_no_pages() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(Vec::new())).await;
    assert_eq!(dashboard.total_pages(), 0);
    assert!(dashboard.presenter().last().links.is_empty());
    assert!(!dashboard.go_to_page(1));
    assert_eq!(dashboard.state().current_page, 1);

    dashboard.export();
    let notes = drain(&mut rx);
    assert!(notes.contains(&Notification::NothingToExport));
    assert!(dashboard.presenter().delivered.is_empty());
}

#[tokio::test]
async fn page_size_and_search_reset_page_but_sort_keeps_it() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.set_page_size(5);
    dashboard.go_to_page(3);
    dashboard.sort_by(SortKey::Price);
    assert_eq!(dashboard.state().current_page, 3);

    dashboard.set_page_size(4);
    assert_eq!(dashboard.state().current_page, 1);
    assert_eq!(dashboard.total_pages(), 3);

    dashboard.go_to_page(2);
    dashboard.search("shirt");
    assert_eq!(dashboard.state().current_page, 1);
    assert_eq!(dashboard.state().search, "shirt");

    dashboard.set_page_size(0);
    assert_eq!(dashboard.state().page_size, 4);
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Notification::Invalid { field: None, .. }]
    ));
}

#[tokio::test]
async fn create_validation_happens_before_any_request() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;

    assert_eq!(dashboard.create(&form("  ", "10", "1", "")).await, None);
    assert_eq!(dashboard.create(&form("Lamp", "0", "1", "")).await, None);
    assert_eq!(dashboard.create(&form("Lamp", "-4", "1", "")).await, None);
    assert_eq!(dashboard.create(&form("Lamp", "4", "", "")).await, None);

    assert_eq!(dashboard.presenter().focused, vec![
        FormField::Title,
        FormField::Price,
        FormField::Price,
        FormField::Category
    ]);
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 4);
    assert!(notes.iter().all(|n| n.kind() == Some(ErrorKind::Validation)));
    assert_eq!(dashboard.records().len(), 12);
    // only the initial load reached the catalog
    assert_eq!(dashboard_calls(&dashboard), vec!["list".to_string()]);
}

fn dashboard_calls(dashboard: &TestDashboard) -> Vec<String> {
    dashboard.client().calls()
}

#[tokio::test]
async fn created_product_is_prepended_with_placeholder_image() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.go_to_page(2);

    let id = dashboard
        .create(&form("Brass Lamp", "49.90", "2", "  , "))
        .await
        .expect("created");

    assert_eq!(dashboard.records()[0].id, id);
    assert_eq!(dashboard.records()[0].images, vec![PLACEHOLDER_IMAGE.to_string()]);
    assert_eq!(
        dashboard.records()[0].description.as_deref(),
        Some("No description provided")
    );
    assert_eq!(dashboard.records().len(), 13);
    assert_eq!(dashboard.state().current_page, 1);
    assert_eq!(dashboard.presenter().last().ids[0], id);
    assert_eq!(dashboard.presenter().create_closed, 1);
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Notification::Created { title, .. }] if title == "Brass Lamp"
    ));
}

#[tokio::test]
async fn rejected_create_keeps_form_open_and_reports_server_message() {
    let mut catalog = FakeCatalog::with(catalog_of_twelve());
    catalog.reject_create = Some("price must be a positive number".to_string());
    let (mut dashboard, mut rx) = loaded(catalog).await;

    assert_eq!(dashboard.create(&form("Lamp", "5", "1", "")).await, None);
    assert_eq!(dashboard.presenter().create_closed, 0);
    assert_eq!(dashboard.records().len(), 12);
    assert_eq!(
        drain(&mut rx),
        vec![Notification::CreateFailed {
            kind: ErrorKind::Network,
            message: "price must be a positive number".to_string()
        }]
    );
}

#[tokio::test]
async fn row_opens_full_record_and_save_updates_in_place() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.sort_by(SortKey::Price);
    let second_row_id = dashboard.presenter().last().ids[1];

    let detail = dashboard.open_row(2).cloned().expect("row 2");
    assert_eq!(detail.id(), second_row_id);
    assert_eq!(
        detail.product.description.as_deref(),
        dashboard.records()[second_row_id as usize - 1].description.as_deref()
    );
    assert_eq!(dashboard.presenter().details.len(), 1);

    let mut edited = detail.form.clone();
    edited.title = "Renamed".to_string();
    edited.price = "99".to_string();
    edited.category = "3".to_string();
    dashboard.save_detail(edited).await;

    let index = dashboard
        .records()
        .iter()
        .position(|p| p.id == second_row_id)
        .unwrap();
    assert_eq!(index, second_row_id as usize - 1);
    let updated = &dashboard.records()[index];
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.price, 99.0);
    assert_eq!(updated.category_name(), "Furniture");
    assert!(dashboard.detail().is_none());
    assert_eq!(dashboard.presenter().detail_closed, 1);
    assert_eq!(
        drain(&mut rx),
        vec![Notification::Updated { id: second_row_id }]
    );
    assert!(dashboard_calls(&dashboard).contains(&format!("update {second_row_id}")));
}

#[tokio::test]
async fn failed_update_keeps_detail_open_and_record_untouched() {
    let mut catalog = FakeCatalog::with(catalog_of_twelve());
    catalog.reject_update = true;
    let (mut dashboard, mut rx) = loaded(catalog).await;

    let detail = dashboard.open_row(1).cloned().unwrap();
    let mut edited = detail.form.clone();
    edited.title = "Nope".to_string();
    dashboard.save_detail(edited).await;

    assert!(dashboard.detail().is_some());
    assert_eq!(dashboard.records()[0].title, "Oak Desk Lamp");
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Notification::UpdateFailed { id: 1, kind: ErrorKind::Network, .. }]
    ));
}

#[tokio::test]
async fn save_without_open_detail_or_unknown_row_is_reported() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    assert!(dashboard.open_row(11).is_none());
    assert!(dashboard.open_row(0).is_none());
    dashboard.save_detail(ProductForm::default()).await;

    let notes = drain(&mut rx);
    assert_eq!(notes[0], Notification::UnknownRow { row: 11 });
    assert_eq!(notes[1], Notification::UnknownRow { row: 0 });
    assert!(matches!(notes[2], Notification::Invalid { field: None, .. }));
    assert_eq!(dashboard_calls(&dashboard), vec!["list".to_string()]);
}

#[tokio::test]
async fn export_covers_visible_page_only() {
    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.go_to_page(2);
    dashboard.export();

    let export = dashboard.presenter().delivered[0].clone();
    assert_eq!(export.filename, "products_page_2.csv");
    assert_eq!(export.rows, 2);
    assert_eq!(export.body.lines().count(), 3);
    assert!(export.body.contains("\"Denim Jacket\""));
    assert!(!export.body.contains("Oak Desk Lamp"));
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Notification::Exported { rows: 2, .. }]
    ));

    dashboard.presenter_mut().fail_delivery = true;
    dashboard.export();
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [Notification::ExportFailed { .. }]
    ));
}

#[tokio::test]
async fn load_failure_degrades_to_no_data() {
    let mut catalog = FakeCatalog::with(catalog_of_twelve());
    catalog.fail_list = true;
    let (dashboard, _rx) = loaded(catalog).await;

    assert_eq!(dashboard.load_state(), LoadState::Failed);
    assert!(dashboard.records().is_empty());
    let frame = dashboard.presenter().last();
    assert_eq!(frame.load, LoadState::Failed);
    assert!(frame.ids.is_empty());
}

#[tokio::test]
async fn update_that_hides_last_row_clamps_page() {
    let (mut dashboard, _rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.search("lamp");
    dashboard.set_page_size(1);
    dashboard.go_to_page(3);

    let detail = dashboard.open_row(1).cloned().unwrap();
    let mut edited = detail.form.clone();
    edited.title = "Bedside light".to_string();
    dashboard.save_detail(edited).await;

    assert_eq!(dashboard.total_pages(), 2);
    assert_eq!(dashboard.state().current_page, 2);
    assert_eq!(dashboard.presenter().last().ids, vec![5]);
}

#[tokio::test]
async fn categories_come_from_loaded_records() {
    let (mut dashboard, _rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    dashboard.show_categories();
    let names: Vec<_> = dashboard
        .presenter()
        .categories
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Clothes", "Electronics", "Furniture"]);
}

#[tokio::test]
async fn create_form_survives_failed_submission_through_dispatch() {
    use crate::app::{dispatch, Flow, Session};
    use crate::cli::commands::parse_intent;

    let (mut dashboard, mut rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    let mut session = Session::default();

    let intent = parse_intent(r#"create title="Brass Lamp" price=0"#).unwrap().unwrap();
    assert_eq!(dispatch(&mut dashboard, &mut session, intent).await, Flow::Continue);
    assert_eq!(session.create_form.title, "Brass Lamp");

    let intent = parse_intent("create price=12 category=2").unwrap().unwrap();
    dispatch(&mut dashboard, &mut session, intent).await;
    assert_eq!(session.create_form, ProductForm::default());
    assert_eq!(dashboard.records()[0].title, "Brass Lamp");

    let intent = parse_intent("quit").unwrap().unwrap();
    assert_eq!(dispatch(&mut dashboard, &mut session, intent).await, Flow::Quit);

    let notes = drain(&mut rx);
    assert!(matches!(notes[0], Notification::Invalid { field: Some(FormField::Price), .. }));
    assert!(matches!(notes[1], Notification::Created { .. }));
}

#[tokio::test]
async fn save_through_dispatch_keeps_untouched_fields() {
    use crate::app::{dispatch, Session};
    use crate::cli::commands::parse_intent;

    let (mut dashboard, _rx) = loaded(FakeCatalog::with(catalog_of_twelve())).await;
    let mut session = Session::default();

    for line in ["open 4", "save price=15.5"] {
        let intent = parse_intent(line).unwrap().unwrap();
        dispatch(&mut dashboard, &mut session, intent).await;
    }
    let p = &dashboard.records()[3];
    assert_eq!(p.title, "Linen Shirt");
    assert_eq!(p.price, 15.5);
    assert_eq!(p.images, vec!["https://img.test/4.png".to_string()]);
}
