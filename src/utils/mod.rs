use std::collections::HashSet;

pub fn parse_u64_list_csv(value: &str) -> Result<Vec<u64>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("list is empty".to_string());
    }
    let mut out: Vec<u64> = Vec::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let page: u64 = item
            .parse()
            .map_err(|_| format!("invalid page index '{item}'"))?;
        if page == 0 {
            return Err("page indexes are 1-based".to_string());
        }
        out.push(page);
    }
    if out.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_fields_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("fields list is empty".to_string());
    }
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    if out.is_empty() {
        return Err("fields list is empty".to_string());
    }
    Ok(out)
}
