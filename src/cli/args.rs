use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalog-dash",
    version,
    about = "terminal administration console for a remote product catalog",
    long_about = "catalog-dash loads a product catalog from a REST endpoint and lets you search, sort, page through, edit, create and export products from the terminal.\n\nExamples:\n  catalog-dash\n  catalog-dash -u http://localhost:3000/api/v1 -n 25\n  catalog-dash --search shirt --sort price --desc --once\n  catalog-dash --page 2 --export -o ./exports\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "ed",
        visible_alias = "export-dir",
        value_name = "DIR",
        help_heading = "Output",
        help = "Directory CSV exports are written to (defaults to the current directory)."
    )]
    pub export_dir: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.catalog-dash/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'u',
        long = "bu",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Catalog",
        help = "Base URL of the catalog API (the /products collection lives under it)."
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Catalog",
        help = "HTTP proxy for catalog requests."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECS",
        help_heading = "Catalog",
        help = "Request timeout in seconds (0 or unset waits indefinitely)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 's',
        long = "q",
        visible_alias = "search",
        value_name = "TEXT",
        help_heading = "View",
        help = "Initial title search."
    )]
    pub search: Option<String>,

    #[arg(
        long = "sort",
        value_name = "FIELD",
        help_heading = "View",
        help = "Initial sort field (id, title, price)."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "desc",
        help_heading = "View",
        help = "Sort descending instead of ascending."
    )]
    pub desc: bool,

    #[arg(
        short = 'n',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "View",
        help = "Rows per page."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "View",
        help = "Initial page (1-based)."
    )]
    pub page: Option<usize>,

    #[arg(
        long = "once",
        help_heading = "Mode",
        help = "Render the selected page once and exit."
    )]
    pub once: bool,

    #[arg(
        long = "export",
        help_heading = "Mode",
        help = "Export the selected page to CSV and exit."
    )]
    pub export: bool,
}
