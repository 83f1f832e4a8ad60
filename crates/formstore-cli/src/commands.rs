use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::cli::Commands;
use formstore_api::controller::{self, ShowOutcome, ShowView};
use formstore_api::{routes, ApiState, Settings};
use formstore_db::DateInterval;

pub async fn execute(command: Commands, mut settings: Settings) -> Result<()> {
    if let Commands::Serve { port: Some(port) } = &command {
        settings.server.port = *port;
    }

    let state = ApiState::from_settings(&settings).await?;

    match command {
        Commands::Serve { .. } => {
            let app = routes::create_router_with_upload_limit(
                state,
                settings.server.max_upload_bytes,
            );

            let addr = format!("{}:{}", settings.server.host, settings.server.port);
            println!("Formstore API Server running on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }

        Commands::InitDb => {
            // from_settings already created the schema
            println!("✓ Database initialized successfully");
        }

        Commands::Identifiers => {
            let identifiers = controller::list_identifiers(&state.db).await?;
            if identifiers.is_empty() {
                println!("No stored submissions");
            }
            for identifier in identifiers {
                let count = state.db.count_by_identifier(&identifier).await?;
                println!("{}  ({} entries)", identifier, count);
            }
        }

        Commands::Show { identifier, page } => {
            match controller::show(&state.db, &state.settings, &identifier, page).await? {
                ShowOutcome::Page(view) => print_page(&view),
                ShowOutcome::RedirectToIndex => {
                    println!("No entries on page {} of '{}'", page, identifier);
                }
            }
        }

        Commands::Export {
            identifier,
            format,
            include_date_time,
            output,
        } => {
            let file = controller::export(
                &state.db,
                &state.settings,
                &state.writers,
                &identifier,
                &format,
                include_date_time,
            )
            .await?;

            let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
            tokio::fs::write(&path, &file.bytes).await?;
            println!(
                "✓ Exported '{}' as {} to {} ({} bytes)",
                identifier,
                file.format,
                path.display(),
                file.bytes.len()
            );
        }

        Commands::Purge {
            identifier,
            from,
            to,
            remove_attached_resources,
        } => {
            let interval = purge_interval(from, to, Utc::now());
            let count = controller::delete_all(
                &state.db,
                &identifier,
                interval,
                remove_attached_resources,
            )
            .await?;
            println!("✓ {} entries removed.", count);
        }
    }

    Ok(())
}

/// An open side of the range defaults to the epoch or to `now`.
fn purge_interval(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateInterval> {
    if from.is_none() && to.is_none() {
        return None;
    }
    Some(DateInterval::new(
        from.unwrap_or_default(),
        to.unwrap_or(now),
    ))
}

fn print_page(view: &ShowView) {
    println!(
        "{}: page {} of {} ({} entries)",
        view.identifier, view.current_page, view.number_of_pages, view.total_entries_count
    );

    let mut header = vec!["id", "date"];
    header.extend(view.titles.iter().map(String::as_str));
    println!("{}", header.join("\t"));

    for entry in &view.entries {
        let mut row = vec![entry.id.as_str(), entry.date_time.as_str()];
        row.extend(entry.values.values().map(String::as_str));
        println!("{}", row.join("\t"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_purge_interval() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(purge_interval(None, None, now).is_none());

        let interval = purge_interval(Some(from), None, now).unwrap();
        assert_eq!(interval.from, from);
        assert_eq!(interval.to, now);

        let interval = purge_interval(None, Some(from), now).unwrap();
        assert_eq!(interval.from.timestamp(), 0);
        assert_eq!(interval.to, from);
    }
}
