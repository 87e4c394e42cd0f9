use std::num::NonZeroU32;

use clap::Parser;
use colored::Colorize;
use governor::{Quota, RateLimiter};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::time::Instant;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output;
use crate::runner::{DEFAULT_FIELDS, DEFAULT_ID_FIELD, DEFAULT_PAGE_SIZE};
use crate::session::{Delivery, Session};
use crate::source::{http::HttpSourceOptions, HttpPageSource};

fn print_banner() {
    const BANNER: &str = r#"
                             _      __
   ___  ___ ____ ____ ___  (_)___/ /__
  / _ \/ _ `/ _ `/ -_) _ \/ / __/  '_/
 / .__/\_,_/\_, /\__/ .__/_/\__/_/\_\
/_/        /___/   /_/
      v0.2.0 - cross-page record selection
    "#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_url: String,
    id_field: String,
    fields: Vec<String>,
    select: Option<u64>,
    start_page: u64,
    pages: Option<Vec<u64>>,
    max_pages: u64,
    page_size: usize,
    rate: u32,
    timeout: usize,
    proxy: Option<String>,
    user_agent: Option<String>,
    output: Option<String>,
    output_format: Option<String>,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let api_url = args.api.or(cfg.api_url).unwrap_or_default();
    if api_url.trim().is_empty() {
        return Err("an API URL is required (--api, or api_url in the config file)".to_string());
    }
    if reqwest::Url::parse(&api_url).is_err() {
        return Err(format!("invalid API URL: {api_url}"));
    }

    let id_field = args
        .id_field
        .or(cfg.id_field)
        .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string());
    if id_field.trim().is_empty() {
        return Err("invalid id-field, expected a field name".to_string());
    }

    let fields = match args.fields.or(cfg.fields) {
        Some(raw) => crate::utils::parse_fields_csv(&raw)
            .map_err(|e| format!("invalid fields '{raw}': {e}"))?,
        None => DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
    };

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }
    let start_page = args.start_page.or(cfg.start_page).unwrap_or(1);
    if start_page == 0 {
        return Err("invalid start_page, page indexes are 1-based".to_string());
    }
    let max_pages = args.max_pages.or(cfg.max_pages).unwrap_or(50);
    if max_pages == 0 {
        return Err("invalid max_pages, expected positive integer".to_string());
    }
    let pages = match args.pages.as_deref() {
        Some(raw) => Some(
            crate::utils::parse_u64_list_csv(raw)
                .map_err(|e| format!("invalid --pages '{raw}': {e}"))?,
        ),
        None => None,
    };

    let rate = args.rate.or(cfg.rate).unwrap_or(5);
    if rate == 0 {
        return Err("invalid rate, expected positive integer".to_string());
    }
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);

    let proxy = args.proxy.or(cfg.proxy);
    let user_agent = args.user_agent.or(cfg.user_agent);
    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = args.output_format.or(cfg.output_format);

    Ok(RunConfig {
        api_url,
        id_field,
        fields,
        select: args.select,
        start_page,
        pages,
        max_pages,
        page_size,
        rate,
        timeout,
        proxy,
        user_agent,
        output,
        output_format,
        no_color,
    })
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let source = HttpPageSource::new(HttpSourceOptions {
        api_url: run.api_url.clone(),
        page_size: run.page_size,
        id_field: run.id_field.clone(),
        fields: run.fields.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
        user_agent: run.user_agent.clone(),
    })
    .map_err(|e| e.to_string())?;
    let mut session = Session::new(source, run.page_size);

    let plan: Vec<u64> = match run.pages.as_ref() {
        Some(pages) => pages.clone(),
        None => (0..run.max_pages)
            .map(|i| run.start_page.saturating_add(i))
            .collect(),
    };

    format_kv_line("Target", &run.api_url);
    format_kv_line(
        "Fill",
        &format!(
            "select={} pages={} page_size={} id_field={}",
            run.select
                .map(|n| n.to_string())
                .unwrap_or_else(|| "none".to_string()),
            match run.pages.as_ref() {
                Some(pages) => pages
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                None => format!("{}..{}", run.start_page, run.start_page + run.max_pages - 1),
            },
            run.page_size,
            run.id_field,
        ),
    );
    format_kv_line(
        "HTTP",
        &format!(
            "rate={} timeout={}s proxy={}",
            run.rate,
            run.timeout,
            if run.proxy.as_deref().unwrap_or("").is_empty() {
                "off"
            } else {
                "on"
            }
        ),
    );
    println!();

    if let Some(target) = run.select {
        session.start_auto_fill(target).map_err(|e| e.to_string())?;
    }

    let pb = match run.select {
        Some(target) => {
            let pb = ProgressBar::new(target);
            pb.set_draw_target(ProgressDrawTarget::stderr());
            pb.set_style(
                ProgressStyle::with_template(
                    ":: Progress: [{pos}/{len}] :: Duration: [{elapsed_precise}] :: {msg}",
                )
                .map_err(|e| format!("failed to build progress bar style: {e}"))?
                .progress_chars(r#"#>-"#),
            );
            pb
        }
        None => ProgressBar::hidden(),
    };

    let limiter = RateLimiter::direct(Quota::per_second(
        NonZeroU32::new(run.rate).unwrap_or(NonZeroU32::MIN),
    ));

    let now = Instant::now();
    let mut pages_visited: u64 = 0;
    let mut fetch_failures: u64 = 0;
    for page in plan {
        if run.select.is_some() && session.pending_quota().is_none() {
            break;
        }
        if let Some(total_pages) = session.total_pages() {
            if page > total_pages {
                break;
            }
        }
        limiter.until_ready().await;
        match session.goto_page(page).await {
            Ok(Delivery::Consumed { page: data, drawn }) => {
                pages_visited += 1;
                pb.inc(drawn as u64);
                pb.set_message(format!(
                    "page {} :: {} records :: selected {}",
                    page,
                    data.len(),
                    session.engine().selected_len(),
                ));
            }
            Ok(Delivery::Stale) => {}
            Err(e) => {
                // quota stays armed; the next page in the plan may still fill it
                fetch_failures += 1;
                pb.println(format!(
                    "{} {}",
                    "fetch failed ::".bold().red(),
                    e.to_string().bold().white(),
                ));
            }
        }
    }
    pb.finish_and_clear();

    let pending_quota = session.pending_quota();
    let total_records = session.total_records();
    let selected = session.take_selection();
    let records = output::build_records(&selected, &run.fields);

    format_kv_line(
        "Selected",
        &format!(
            "{} records across {} pages (catalogue total: {})",
            selected.len(),
            pages_visited,
            total_records
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    );
    if let Some(quota) = pending_quota {
        println!(
            "{} {}",
            ":: target not met ::".bold().yellow(),
            format!("{quota} records still unfilled").bold().white(),
        );
    }
    if fetch_failures > 0 {
        println!(
            "{} {}",
            ":: fetch errors ::".bold().yellow(),
            format!("{fetch_failures} pages failed").bold().white(),
        );
    }
    println!();

    match run.output.as_ref() {
        Some(outfile_path) => {
            let output_format = run
                .output_format
                .as_deref()
                .and_then(output::OutputFormat::parse)
                .or_else(|| output::infer_format_from_path(outfile_path))
                .unwrap_or(output::OutputFormat::Text);
            let rendered = match output_format {
                output::OutputFormat::Text => output::render_text(&records),
                output::OutputFormat::Json => output::render_json(&records),
                output::OutputFormat::Csv => output::render_csv(&records),
            };
            tokio::fs::write(outfile_path, rendered)
                .await
                .map_err(|e| format!("failed to write output file '{outfile_path}': {e}"))?;
            format_kv_line("Output", outfile_path);
        }
        None => {
            print!("{}", String::from_utf8_lossy(&output::render_text(&records)));
        }
    }

    let elapsed_time = now.elapsed();
    println!();
    println!(":: Completed :: fill took {}s ::", elapsed_time.as_secs());

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = CliArgs::parse();

    if args.init_config {
        let path = match args.config.as_ref() {
            Some(p) => config::expand_tilde(p),
            None => config::default_config_path()
                .ok_or_else(|| "could not determine home directory".to_string())?,
        };
        config::ensure_default_config_file(&path)?;
        println!(":: wrote config template to {}", path.display());
        return Ok(());
    }

    let cfg = match args.config.as_ref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
