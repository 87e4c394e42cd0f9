use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pagepick",
    version,
    about = "cross-page record selection for paged JSON APIs",
    long_about = "Pagepick fetches a paginated JSON API page by page and builds a selection of exactly N records, carrying the remaining quota forward as pages advance.\n\nExamples:\n  pagepick -u https://api.artic.edu/api/v1/artworks -n 15\n  pagepick -u https://api.artic.edu/api/v1/artworks -n 30 --pages 4,5,6 -o selection.json\n  pagepick -u https://api.artic.edu/api/v1/artworks --max-pages 2\n\nTip: Use --config to persist the API and field settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'u',
        long = "api",
        value_name = "URL",
        help_heading = "Input",
        help = "Paged JSON API endpoint to fetch records from."
    )]
    pub api: Option<String>,

    #[arg(
        long = "id-field",
        value_name = "FIELD",
        help_heading = "Input",
        help = "Record field holding the stable unique identifier (default: id)."
    )]
    pub id_field: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.pagepick/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'n',
        long = "select",
        value_name = "N",
        help_heading = "Selection",
        help = "Number of records to auto-select across pages."
    )]
    pub select: Option<u64>,

    #[arg(
        short = 'p',
        long = "start-page",
        value_name = "N",
        help_heading = "Selection",
        help = "1-based page to start from (default: 1)."
    )]
    pub start_page: Option<u64>,

    #[arg(
        long = "pages",
        value_name = "LIST",
        help_heading = "Selection",
        help = "Explicit page visit order, comma-separated and 1-based (overrides --start-page/--max-pages)."
    )]
    pub pages: Option<String>,

    #[arg(
        long = "max-pages",
        value_name = "N",
        help_heading = "Selection",
        help = "Maximum number of pages to walk (default: 50)."
    )]
    pub max_pages: Option<u64>,

    #[arg(
        short = 's',
        long = "page-size",
        value_name = "N",
        help_heading = "Selection",
        help = "Records per page requested from the API (default: 12)."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Page fetch rate limit (requests per second)."
    )]
    pub rate: Option<u32>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Performance",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Route requests through an HTTP proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "user-agent",
        value_name = "UA",
        help_heading = "HTTP",
        help = "Override the User-Agent header."
    )]
    pub user_agent: Option<String>,

    #[arg(
        short = 'F',
        long = "fields",
        value_name = "LIST",
        help_heading = "Output",
        help = "Record fields to display, comma-separated."
    )]
    pub fields: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the selection to a file."
    )]
    pub output: Option<String>,

    #[arg(
        long = "output-format",
        value_name = "FMT",
        help_heading = "Output",
        help = "Output format: text, json or csv (inferred from the file extension when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'c',
        long = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,
}
