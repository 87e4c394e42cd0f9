use serde_json::json;

use crate::runner::{Options, RecordSource, Runner, RunnerError};

fn inline_records(count: usize) -> Vec<serde_json::Value> {
    (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Artwork {i}"),
                "artist_title": if i % 3 == 0 { json!(null) } else { json!("Anonymous") },
            })
        })
        .collect()
}

#[tokio::test]
async fn inline_fill_carries_the_quota_across_pages() {
    let runner = Runner::new(Options {
        source: RecordSource::Inline(inline_records(36)),
        select: Some(15),
        page_size: 12,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.pages_visited, vec![1, 2]);
    assert_eq!(result.selected.len(), 15);
    assert_eq!(result.pending_quota, None);
    assert_eq!(result.total_records, Some(36));
    let ids: Vec<_> = result.selected.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids[0], "1");
    assert_eq!(ids[14], "15");
}

#[tokio::test]
async fn fill_stops_once_the_catalogue_is_exhausted() {
    let runner = Runner::new(Options {
        source: RecordSource::Inline(inline_records(8)),
        select: Some(20),
        page_size: 5,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    // |selected| == min(target, total records)
    assert_eq!(result.selected.len(), 8);
    assert_eq!(result.pending_quota, Some(12));
    assert_eq!(result.pages_visited, vec![1, 2]);
}

#[tokio::test]
async fn explicit_page_order_is_honored() {
    let runner = Runner::new(Options {
        source: RecordSource::Inline(inline_records(36)),
        select: Some(14),
        page_size: 12,
        pages: Some(vec![3, 1]),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.pages_visited, vec![3, 1]);
    let ids: Vec<_> = result.selected.iter().map(|r| r.id.as_str()).collect();
    // page 3 fills first, the remaining 2 come from page 1
    assert_eq!(ids[0], "25");
    assert_eq!(ids[12], "1");
    assert_eq!(ids[13], "2");
}

#[tokio::test]
async fn walk_without_a_target_just_visits_pages() {
    let runner = Runner::new(Options {
        source: RecordSource::Inline(inline_records(30)),
        page_size: 12,
        max_pages: 10,
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();

    assert_eq!(result.pages_visited, vec![1, 2, 3]);
    assert!(result.selected.is_empty());
    assert_eq!(result.total_records, Some(30));
}

#[test]
fn runner_rejects_invalid_options() {
    assert!(matches!(
        Runner::new(Options::default()),
        Err(RunnerError::NoSource)
    ));
    assert!(matches!(
        Runner::new(Options {
            source: RecordSource::Api {
                url: "not a url".to_string()
            },
            ..Options::default()
        }),
        Err(RunnerError::InvalidUrl { .. })
    ));
    assert!(matches!(
        Runner::new(Options {
            source: RecordSource::Inline(inline_records(5)),
            select: Some(0),
            ..Options::default()
        }),
        Err(RunnerError::InvalidTarget)
    ));
    assert!(matches!(
        Runner::new(Options {
            source: RecordSource::Inline(inline_records(5)),
            page_size: 0,
            ..Options::default()
        }),
        Err(RunnerError::InvalidPageSize)
    ));
    assert!(matches!(
        Runner::new(Options {
            source: RecordSource::Inline(inline_records(5)),
            pages: Some(vec![]),
            ..Options::default()
        }),
        Err(RunnerError::EmptyPages)
    ));
    assert!(matches!(
        Runner::new(Options {
            source: RecordSource::Inline(inline_records(5)),
            pages: Some(vec![1, 0]),
            ..Options::default()
        }),
        Err(RunnerError::ZeroPageIndex)
    ));
}

#[tokio::test]
async fn idless_inline_records_fail_source_construction() {
    let runner = Runner::new(Options {
        source: RecordSource::Inline(vec![json!({"title": "no id"})]),
        ..Options::default()
    })
    .unwrap();
    assert!(matches!(
        runner.run().await,
        Err(RunnerError::SourceBuild { .. })
    ));
}

#[test]
fn output_renders_selection_in_every_format() {
    use crate::output;
    use crate::source::Record;

    let values = inline_records(3);
    let records: Vec<Record> = values
        .iter()
        .map(|v| Record::from_value(v, "id").unwrap())
        .collect();
    let fields = vec!["title".to_string(), "artist_title".to_string()];
    let out = output::build_records(&records, &fields);

    let text = String::from_utf8(output::render_text(&out)).unwrap();
    assert!(text.starts_with("1 :: Artwork 1 :: Anonymous\n"));
    // null fields render as the -- placeholder
    assert!(text.contains("3 :: Artwork 3 :: --\n"));

    let json_out: serde_json::Value =
        serde_json::from_slice(&output::render_json(&out)).unwrap();
    assert_eq!(json_out[0]["id"], "1");
    assert_eq!(json_out[0]["title"], "Artwork 1");

    let csv = String::from_utf8(output::render_csv(&out)).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("id,title,artist_title"));
    assert_eq!(lines.next(), Some("1,Artwork 1,Anonymous"));
}

#[test]
fn output_csv_escapes_embedded_separators() {
    use crate::output;
    use crate::source::Record;

    let value = json!({"id": 9, "title": "Still Life, with \"Apples\""});
    let records = vec![Record::from_value(&value, "id").unwrap()];
    let out = output::build_records(&records, &["title".to_string()]);
    let csv = String::from_utf8(output::render_csv(&out)).unwrap();
    assert!(csv.contains("\"Still Life, with \"\"Apples\"\"\""));
}

#[test]
fn output_format_inference_follows_the_extension() {
    use crate::output::{infer_format_from_path, OutputFormat};

    assert_eq!(
        infer_format_from_path("./selection.json"),
        Some(OutputFormat::Json)
    );
    assert_eq!(
        infer_format_from_path("SELECTION.CSV"),
        Some(OutputFormat::Csv)
    );
    assert_eq!(
        infer_format_from_path("notes.txt"),
        Some(OutputFormat::Text)
    );
    assert_eq!(infer_format_from_path("dump.bin"), None);
    assert_eq!(OutputFormat::parse("Json"), Some(OutputFormat::Json));
    assert_eq!(OutputFormat::parse("yaml"), None);
}

#[test]
fn default_config_template_parses() {
    let cfg: crate::config::ConfigFile =
        serde_yaml::from_str(&crate::config::default_config_yaml()).unwrap();
    assert_eq!(cfg.page_size, Some(12));
    assert_eq!(cfg.id_field.as_deref(), Some("id"));
    assert_eq!(cfg.api_url, None);
}
