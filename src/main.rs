//! leetsync CLI - sync and inspect LeetCode profile data.
//!
//! A thin consumer of the library crate: syncs all entity kinds for a
//! username and prints a summary, or pages through the problem catalog
//! with the combined search/difficulty filters.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use leetsync::paging::PagingEngine;
use leetsync::sync::SyncConfig;
use leetsync::{CacheStore, LeetCodeClient, Outcome, SyncCoordinator};

// ============================================================================
// Constants
// ============================================================================

/// Number of catalog pages fetched per `--problems` invocation.
const PROBLEM_PAGES_TO_SHOW: usize = 3;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  leetsync <username> [--year <YYYY>]   sync a profile and print a summary");
    eprintln!("  leetsync --problems [--search <text>] [--difficulty <easy|medium|hard>]");
    eprintln!("  leetsync --clean-cache                delete records older than the TTL");
    eprintln!("  leetsync --clear-cache                delete every cached record");
    eprintln!("  leetsync --evict <username>           delete one user's cached records");
    std::process::exit(2);
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(first) = args.first() else { usage() };

    let store = Arc::new(CacheStore::open_default()?);
    let client = Arc::new(LeetCodeClient::new()?);
    let config = SyncConfig::default();

    match first.as_str() {
        "--problems" => {
            browse_problems(
                client,
                flag_value(&args, "--search"),
                flag_value(&args, "--difficulty"),
            )
            .await
        }
        "--clean-cache" => {
            let coordinator = SyncCoordinator::new(client, store, config.clone());
            let threshold = Utc::now().timestamp_millis() - config.default_ttl.as_millis() as i64;
            let report = coordinator.clean_expired_cache(threshold);
            println!(
                "Swept {} expired record(s), {} failure(s)",
                report.deleted.len(),
                report.failures.len()
            );
            for failure in &report.failures {
                eprintln!("  {} / {}: {}", failure.kind, failure.user_key, failure.message);
            }
            Ok(())
        }
        "--clear-cache" => {
            store.delete_all()?;
            println!("Cache cleared");
            Ok(())
        }
        "--evict" => {
            let Some(username) = args.get(1) else { usage() };
            store.delete_user(username)?;
            println!("Evicted cached records for {username}");
            Ok(())
        }
        flag if flag.starts_with("--") => usage(),
        username => {
            let year = flag_value(&args, "--year")
                .map(|y| y.parse::<i32>())
                .transpose()?;
            sync_profile(client, store, config, username, year).await
        }
    }
}

/// Sync every entity kind for one username and print what came back,
/// marking values served from stale cache.
async fn sync_profile(
    client: Arc<LeetCodeClient>,
    store: Arc<CacheStore>,
    config: SyncConfig,
    username: &str,
    year: Option<i32>,
) -> Result<()> {
    info!(username, "Syncing profile");
    let coordinator = SyncCoordinator::new(client, store, config);

    println!("== {username} ==");

    match coordinator.user_profile(username).await {
        Outcome::Success { value, stale } => {
            let name = value.real_name.as_deref().unwrap_or(&value.username);
            let ranking = value
                .ranking
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("Profile:      {name} (ranking {ranking}){}", stale_tag(stale));
        }
        outcome => print_failure("Profile:", &outcome),
    }

    match coordinator.question_counts(username).await {
        Outcome::Success { value, stale } => {
            for solved in &value.accepted {
                println!(
                    "Solved:       {:<7} {}{}",
                    solved.difficulty,
                    solved.count,
                    stale_tag(stale)
                );
            }
        }
        outcome => print_failure("Solved:", &outcome),
    }

    match coordinator.profile_calendar(username, year).await {
        Outcome::Success { value, stale } => println!(
            "Calendar:     streak {}, {} active day(s){}",
            value.streak,
            value.total_active_days,
            stale_tag(stale)
        ),
        outcome => print_failure("Calendar:", &outcome),
    }

    match coordinator.recent_submissions(username, None).await {
        Outcome::Success { value, stale } => {
            println!(
                "Recent ACs:   {} submission(s){}",
                value.submissions.len(),
                stale_tag(stale)
            );
            for submission in value.submissions.iter().take(5) {
                println!("  - {}", submission.title);
            }
        }
        outcome => print_failure("Recent ACs:", &outcome),
    }

    match coordinator.contest_ranking(username).await {
        Outcome::Success { value, stale } => println!(
            "Contests:     {} attended, rating {:.0}{}",
            value.attended_contests_count,
            value.rating,
            stale_tag(stale)
        ),
        outcome => print_failure("Contests:", &outcome),
    }

    match coordinator.badges(username).await {
        Outcome::Success { value, stale } => println!(
            "Badges:       {} earned{}",
            value.badges.len(),
            stale_tag(stale)
        ),
        outcome => print_failure("Badges:", &outcome),
    }

    Ok(())
}

fn stale_tag(stale: bool) -> &'static str {
    if stale {
        "  [stale]"
    } else {
        ""
    }
}

fn print_failure<T>(label: &str, outcome: &Outcome<T>) {
    if let Some(message) = outcome.error_message() {
        println!("{label:<13} unavailable: {message}");
    }
}

/// Page through the problem catalog under the combined filters, printing
/// a few pages of results.
async fn browse_problems(
    client: Arc<LeetCodeClient>,
    search: Option<String>,
    difficulty: Option<String>,
) -> Result<()> {
    let mut engine = PagingEngine::new(client);
    if let Some(text) = search.as_deref() {
        engine.update_search(text);
    }
    engine.update_filter(difficulty.as_deref());

    for _ in 0..PROBLEM_PAGES_TO_SHOW {
        if !engine.has_next() {
            break;
        }
        engine.load_next().await;

        let snapshot = engine.snapshot();
        if let Some(message) = snapshot.initial_error.or(snapshot.append_error) {
            eprintln!("Error: {message}");
            // Transient failures (rate limits) are worth one retry.
            tokio::time::sleep(Duration::from_secs(1)).await;
            engine.retry().await;
        }
    }

    let snapshot = engine.snapshot();
    if snapshot.items.is_empty() {
        println!("No problems matched the current filters");
        return Ok(());
    }

    for question in &snapshot.items {
        println!(
            "{:>5}  {:<8} {:>5.1}%  {}{}",
            question.id,
            question.difficulty,
            question.ac_rate,
            question.title,
            if question.paid_only { "  [paid]" } else { "" }
        );
    }
    println!(
        "-- {} problem(s){}",
        snapshot.items.len(),
        if engine.has_next() { ", more available" } else { "" }
    );

    Ok(())
}
