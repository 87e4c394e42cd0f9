use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(select) = args.select {
        if select == 0 {
            return Err("invalid --select, expected positive integer".to_string());
        }
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid --page-size, expected positive integer".to_string());
        }
    }
    if let Some(start_page) = args.start_page {
        if start_page == 0 {
            return Err("invalid --start-page, page indexes are 1-based".to_string());
        }
    }
    if let Some(max_pages) = args.max_pages {
        if max_pages == 0 {
            return Err("invalid --max-pages, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.pages.as_deref() {
        crate::utils::parse_u64_list_csv(raw)
            .map_err(|e| format!("invalid --pages '{raw}': {e}"))?;
    }
    if let Some(raw) = args.fields.as_deref() {
        crate::utils::parse_fields_csv(raw)
            .map_err(|e| format!("invalid --fields '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or csv"
            ));
        }
    }
    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err("invalid --rate, expected positive integer".to_string());
        }
    }
    Ok(())
}
