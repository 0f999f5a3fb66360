use manga_extensions::{bootstrap, Config, ListOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let query = std::env::args().nth(1).unwrap_or_else(|| "one piece".to_string());
    let config = Config::load();
    let api = bootstrap(&config)?;

    println!("Active sources:");
    for info in api.active_extensions() {
        println!("  {} v{} ({})", info.name, info.version, info.lang.join(", "));
    }

    let options = ListOptions {
        limit: Some(5),
        ..ListOptions::default()
    };
    let results = api.search(&query, &options).await;
    println!("\nFound {} manga for '{}'", results.len(), query);
    for manga in &results {
        println!(
            "  [{}] {} ({:?})",
            manga.source.as_deref().unwrap_or("?"),
            manga.title.as_deref().unwrap_or("<untitled>"),
            manga.status
        );
    }

    if let Some(first) = results.first() {
        if let (Some(source), Some(id)) = (first.source.as_deref(), first.source_id.as_deref()) {
            let chapters = api.get_chapters(source, id, &Default::default()).await;
            println!("\n{} chapters for the first result", chapters.len());
        }
    }
    Ok(())
}
