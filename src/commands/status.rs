use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use storewatch::rating::{average_rating, stars};
use storewatch::repository::RatingSnapshot;
use storewatch::reviews::Store;

pub fn execute(
    app_name: &str,
    store: Store,
    db: Option<PathBuf>,
    history: usize,
    json: bool,
) -> Result<()> {
    let config = super::load_config(db)?;
    let repo = super::open_repository(&config.database.path)?;

    let reviews = repo
        .review_count(app_name, store)
        .context("Failed to count reviews")?;
    let snapshots = repo
        .snapshot_history(app_name, store, history.max(1))
        .context("Failed to read snapshot history")?;

    if json {
        let result = serde_json::json!({
            "app_name": app_name,
            "store": store,
            "reviews": reviews,
            "latest": snapshots.first().map(summary),
            "history": snapshots.iter().map(summary).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", format!("📊 {} ({})", app_name, store).bold());
    println!("Stored reviews: {}", reviews);

    let Some(latest) = snapshots.first() else {
        println!("No rating snapshot yet. Run `storewatch scrape` first.");
        return Ok(());
    };

    println!(
        "Latest rating:  {:.2} from {} ratings ({})",
        average_rating(&latest.distribution),
        latest.distribution.total,
        latest.created_at.format("%Y-%m-%d %H:%M")
    );
    for star in (1..=5).rev() {
        println!(
            "  {}: {}%",
            stars(star),
            latest.distribution.percentage(star)
        );
    }

    if snapshots.len() > 1 {
        println!("\n{}", "History".bold());
        for snapshot in &snapshots {
            println!(
                "  #{:<5} {}  {:.2}  total {}",
                snapshot.id,
                snapshot.created_at.format("%Y-%m-%d"),
                average_rating(&snapshot.distribution),
                snapshot.distribution.total
            );
        }
    }

    Ok(())
}

fn summary(snapshot: &RatingSnapshot) -> serde_json::Value {
    serde_json::json!({
        "id": snapshot.id,
        "created_at": snapshot.created_at,
        "total": snapshot.distribution.total,
        "average_rating": average_rating(&snapshot.distribution),
        "percentages": snapshot.distribution.percentages(),
    })
}
