//! Collection listing and explicit-add commands.

use anyhow::Result;
use rolodex_client::{HttpTransport, Transport};

/// `rolodex collections`
pub async fn list(transport: &HttpTransport, json: bool) -> Result<()> {
    let collections = transport.list_collections().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collections)?);
        return Ok(());
    }

    if collections.is_empty() {
        println!("No collections.");
        return Ok(());
    }
    println!("{:<34} NAME", "ID");
    for c in collections {
        println!("{:<34} {}", c.id, c.collection_name);
    }
    Ok(())
}

/// `rolodex show <id> [--offset N --limit N]`
pub async fn show(
    transport: &HttpTransport,
    id: &str,
    offset: u64,
    limit: usize,
    json: bool,
) -> Result<()> {
    let page = transport.collection_page(id, offset, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!(
        "{} — {} companies total (showing {} from offset {})",
        page.collection_name,
        page.total,
        page.companies.len(),
        offset
    );
    println!("{:<10} {:<40} LIKED", "ID", "NAME");
    for company in page.companies {
        println!(
            "{:<10} {:<40} {}",
            company.id,
            company.company_name,
            if company.liked { "yes" } else { "" }
        );
    }
    Ok(())
}

/// `rolodex add <id> <company_ids...>`
pub async fn add(
    transport: &HttpTransport,
    id: &str,
    company_ids: &[i64],
    json: bool,
) -> Result<()> {
    let result = transport.add_companies(id, company_ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.duplicates_count > 0 {
        println!(
            "Added {} companies ({} already present).",
            result.added_count, result.duplicates_count
        );
    } else {
        println!("Added {} companies.", result.added_count);
    }
    Ok(())
}
