use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::catalog::client::ClientOptions;
use crate::catalog::{CatalogApi, HttpCatalogClient, DEFAULT_BASE_URL};
use crate::cli::args::CliArgs;
use crate::cli::commands::{self, Intent};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::dashboard::{
    Dashboard, DraftDefaults, FormField, Notification, Presenter, ProductForm, ViewState,
    DEFAULT_PAGE_SIZE,
};
use crate::logging;
use crate::output::table::TerminalPresenter;
use crate::view::{SortDirection, SortKey};

fn print_banner(no_color: bool) {
    const BANNER: &str = r#"
            __        __                          __         __
  _________ _/ /_____ _/ /___  ____ _      ____/ /___ ______/ /_
 / ___/ __ `/ __/ __ `/ / __ \/ __ `/_____/ __  / __ `/ ___/ __ \
/ /__/ /_/ / /_/ /_/ / / /_/ / /_/ /_____/ /_/ / /_/ (__  ) / / /
\___/\__,_/\__/\__,_/_/\____/\__, /      \__,_/\__,_/____/_/ /_/
                            /____/
       product catalog console
    "#;
    if no_color {
        print!("{}", BANNER);
    } else {
        let _ = write!(&mut rainbowcoat::stdout(), "{}", BANNER);
    }
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn render_flags(arg: &clap::Arg) -> String {
    let mut flags: Vec<String> = arg.get_short().map(|s| format!("-{s}")).into_iter().collect();
    flags.extend(arg.get_long().map(|l| format!("--{l}")));
    flags.extend(
        arg.get_visible_aliases()
            .unwrap_or_default()
            .into_iter()
            .map(|alias| format!("--{alias}")),
    );

    let mut rendered = flags.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        rendered.push_str(&format!(" <{value}>"));
    }
    rendered
}

// Flags grouped by help heading, followed by the prompt commands.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let about = cmd
        .get_long_about()
        .or(cmd.get_about())
        .map(|a| a.to_string())
        .unwrap_or_default();
    let mut out = format!(
        "{} {}\n\n{}\n\nUsage: {} [OPTIONS]\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default(),
        about.trim_end(),
        cmd.get_name()
    );

    let sections = cmd
        .get_arguments()
        .filter(|arg| !arg.is_hide_set())
        .group_by(|arg| arg.get_help_heading().unwrap_or("Options"));
    for (heading, args) in &sections {
        out.push_str(&format!("\n{heading}:\n"));
        for arg in args {
            out.push_str(&format!("  {}\n", render_flags(arg)));
            if let Some(help) = arg.get_help().map(|h| h.to_string()) {
                out.push_str(&format!("          {}\n", help.trim()));
            }
        }
    }

    out.push('\n');
    out.push_str(commands::HELP);
    out.push('\n');
    out
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Interactive,
    Once,
    Export,
}

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    view: ViewState,
    start_page: usize,
    export_dir: PathBuf,
    defaults: DraftDefaults,
    no_color: bool,
    verbose: u8,
    mode: Mode,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout_seconds = args.timeout.or(cfg.timeout).filter(|t| *t > 0);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size in config, expected positive integer".to_string());
    }

    let sort = match args.sort.or(cfg.sort) {
        Some(raw) => {
            let key = SortKey::parse(&raw)
                .ok_or_else(|| format!("invalid sort field '{raw}', expected id, title or price"))?;
            let direction = if args.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            Some((key, direction))
        }
        None => None,
    };

    let export_dir = args
        .export_dir
        .or(cfg.export_dir)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut defaults = DraftDefaults::default();
    if let Some(description) = cfg.default_description.filter(|d| !d.trim().is_empty()) {
        defaults.description = description;
    }
    if let Some(image) = cfg.placeholder_image.filter(|i| !i.trim().is_empty()) {
        defaults.placeholder_image = image;
    }

    let mode = if args.export {
        Mode::Export
    } else if args.once {
        Mode::Once
    } else {
        Mode::Interactive
    };

    Ok(RunConfig {
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy,
        },
        view: ViewState {
            search: args.search.unwrap_or_default().to_lowercase(),
            sort,
            current_page: 1,
            page_size,
        },
        start_page: args.page.unwrap_or(1),
        export_dir,
        defaults,
        no_color,
        verbose: args.verbose,
        mode,
    })
}

/// Values typed into the create form survive a failed submission.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) create_form: ProductForm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

fn apply_assignments(form: &mut ProductForm, assignments: Vec<(FormField, String)>) {
    for (field, value) in assignments {
        form.set(field, value);
    }
}

pub(crate) async fn dispatch<C: CatalogApi, P: Presenter>(
    dashboard: &mut Dashboard<C, P>,
    session: &mut Session,
    intent: Intent,
) -> Flow {
    debug!(?intent, "intent");
    match intent {
        Intent::Search(term) => dashboard.search(&term),
        Intent::PageSize(size) => dashboard.set_page_size(size),
        Intent::Sort(key) => dashboard.sort_by(key),
        Intent::Page(page) => {
            dashboard.go_to_page(page);
        }
        Intent::Next => {
            dashboard.next_page();
        }
        Intent::Prev => {
            dashboard.prev_page();
        }
        Intent::Open(row) => {
            dashboard.open_row(row);
        }
        Intent::Save(assignments) => {
            let mut form = dashboard
                .detail()
                .map(|d| d.form.clone())
                .unwrap_or_default();
            apply_assignments(&mut form, assignments);
            dashboard.save_detail(form).await;
        }
        Intent::Close => dashboard.close_detail(),
        Intent::Create(assignments) => {
            apply_assignments(&mut session.create_form, assignments);
            if dashboard.create(&session.create_form).await.is_some() {
                session.create_form = ProductForm::default();
            }
        }
        Intent::Export => dashboard.export(),
        Intent::Categories => dashboard.show_categories(),
        Intent::Show => dashboard.show(),
        Intent::Help => println!("{}", commands::HELP),
        Intent::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn drain_notifications<C: CatalogApi, W: Write>(
    dashboard: &mut Dashboard<C, TerminalPresenter<W>>,
    rx: &mut mpsc::UnboundedReceiver<Notification>,
) -> Vec<Notification> {
    let mut seen = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        dashboard.presenter_mut().print_notification(&notification);
        seen.push(notification);
    }
    seen
}

fn first_error(notifications: &[Notification]) -> Option<String> {
    notifications
        .iter()
        .find(|n| n.is_error())
        .map(|n| n.to_string())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let interactive = run.mode == Mode::Interactive;
    if interactive {
        print_banner(run.no_color);
        format_kv_line("Catalog", &run.client.base_url);
        format_kv_line("Page size", &run.view.page_size.to_string());
        format_kv_line("Exports", &run.export_dir.display().to_string());
        format_kv_line("Color", format_bool(!run.no_color));
    }

    let client = HttpCatalogClient::new(&run.client).map_err(|e| e.to_string())?;
    let presenter = TerminalPresenter::new(std::io::stdout(), run.export_dir.clone());
    let (mut dashboard, mut rx) =
        Dashboard::new(client, presenter, run.view.clone(), run.defaults.clone());

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress style: {e}"))?,
    );
    pb.set_message(format!("loading {}/products", run.client.base_url));
    dashboard.load().await;
    pb.finish_and_clear();

    if run.start_page > 1 {
        dashboard.go_to_page(run.start_page);
    }
    let startup = drain_notifications(&mut dashboard, &mut rx);

    match run.mode {
        Mode::Once => {
            return first_error(&startup).map_or(Ok(()), Err);
        }
        Mode::Export => {
            if let Some(err) = first_error(&startup) {
                return Err(err);
            }
            // a declined --page would otherwise export page 1
            if let Some(rejected) = startup
                .iter()
                .find(|n| matches!(n, Notification::PageRejected { .. }))
            {
                return Err(rejected.to_string());
            }
            dashboard.export();
            let exported = drain_notifications(&mut dashboard, &mut rx);
            return first_error(&exported).map_or(Ok(()), Err);
        }
        Mode::Interactive => {}
    }

    println!("Type `help` for commands.");
    let prompt = std::io::stdin().is_terminal();
    let mut session = Session::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if prompt {
            print!("catalog> ");
            let _ = std::io::stdout().flush();
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read input: {e}")),
        };

        let flow = match commands::parse_intent(&line) {
            Ok(Some(intent)) => dispatch(&mut dashboard, &mut session, intent).await,
            Ok(None) => Flow::Continue,
            Err(e) => {
                dashboard
                    .presenter_mut()
                    .print_notification(&Notification::Invalid {
                        field: None,
                        message: e.to_string(),
                    });
                Flow::Continue
            }
        };
        drain_notifications(&mut dashboard, &mut rx);
        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    logging::init_logging(args.verbose);

    let cfg = match args.config.as_deref().map(config::expand_tilde) {
        Some(path) => config::load_config(&path, false)?,
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(e) = config::ensure_default_config_file(&path) {
                    tracing::warn!("{e}");
                }
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    debug!(verbose = run.verbose, mode = ?run.mode, "starting");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
