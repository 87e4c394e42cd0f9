use pagepick::runner::{Options, RecordSource, Runner};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        source: RecordSource::Api {
            url: "https://api.artic.edu/api/v1/artworks".to_string(),
        },
        select: Some(15),
        fields: vec!["title".to_string(), "artist_title".to_string()],
        rate: 2,
        timeout_seconds: 5,
        ..Options::default()
    })?;
    let result = runner.run().await?;

    println!("Pages visited: {:?}", result.pages_visited);
    println!("Selected: {}", result.selected.len());
    for record in result.selected.iter() {
        println!("{} {:?}", record.id, record.field("title"));
    }
    if let Some(quota) = result.pending_quota {
        println!("Still unfilled: {}", quota);
    }

    Ok(())
}
