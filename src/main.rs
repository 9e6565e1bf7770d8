use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobtrack::config::StoreConfig;
use jobtrack::job::{Job, JobStatus};
use jobtrack::remote::memory::MemoryCollection;
use jobtrack::store::JobStore;
use jobtrack::store::state::StoreState;

#[derive(Parser, Debug)]
#[command(name = "jobtrack")]
#[command(version)]
#[command(about = "Job-application tracker store demo against an in-memory collection")]
struct Args {
    /// Minimum loading-skeleton duration in milliseconds
    #[arg(long, default_value = "600")]
    skeleton_ms: u64,

    /// Remote collection path
    #[arg(long, default_value = "jobs")]
    path: String,

    /// Apply live updates after the initial seed to demonstrate realtime sync
    #[arg(long)]
    live_updates: bool,
}

fn seed_collection(collection: &MemoryCollection, path: &str) {
    let mut backend = Job::new("Backend Engineer", "Acme", "Rust services team");
    backend.status = Some(JobStatus::FirstRound);
    backend.updated_at = backend.updated_at.map(|t| t + 2_000);

    let platform = Job::new("Platform Engineer", "Initech", "Build tooling");

    let mut data = Job::new("Data Engineer", "Globex", "Pipelines");
    data.status = Some(JobStatus::NoResponse);
    data.updated_at = None;

    for job in [backend, platform, data] {
        let value = serde_json::to_value(&job).expect("job serializes");
        collection.push(path, value);
    }
}

fn print_state(state: &StoreState) {
    if state.is_currently_fetching {
        println!("Loading applications...");
        return;
    }
    if let Some(error) = &state.error {
        println!("Error: {}", error);
        return;
    }

    let jobs = state.sorted_jobs();
    println!();
    println!("{:<22} {:<12} {:<12} {:<10}", "TITLE", "COMPANY", "STATUS", "DATE");
    println!("{}", "-".repeat(58));
    for job in &jobs {
        let status = job
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22} {:<12} {:<12} {:<10}",
            job.title,
            job.company,
            status,
            job.date.as_deref().unwrap_or("-")
        );
    }
    println!("{} application(s)", jobs.len());
}

async fn apply_live_updates(collection: Arc<MemoryCollection>, path: String) {
    tokio::time::sleep(Duration::from_secs(2)).await;

    let frontend = Job::new("Frontend Engineer", "Umbrella", "Design system");
    let value = serde_json::to_value(&frontend).expect("job serializes");
    let key = collection.push(&path, value);
    tracing::info!(key = %key, "Pushed a new application");

    tokio::time::sleep(Duration::from_secs(2)).await;

    let mut offer = frontend;
    offer.status = Some(JobStatus::JobOffer);
    offer.updated_at = offer.updated_at.map(|t| t + 10_000);
    let value = serde_json::to_value(&offer).expect("job serializes");
    collection.put(&path, &key, value);
    tracing::info!(key = %key, "Updated application status to job offer");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let collection = Arc::new(MemoryCollection::new());
    seed_collection(&collection, &args.path);

    let config = StoreConfig::default()
        .with_collection_path(args.path.clone())
        .with_skeleton_min_duration(Duration::from_millis(args.skeleton_ms));

    let (store, message_rx) = JobStore::new(collection.clone(), config);
    let store = Arc::new(store);

    let runner = {
        let store = store.clone();
        tokio::spawn(async move { store.run(message_rx).await })
    };

    // Re-render the sorted view on every state revision
    let printer = {
        let store = store.clone();
        let mut changes = store.subscribe_changes();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let state = store.state.read().await;
                print_state(&state);
            }
        })
    };

    store.ensure_listener_active().await?;

    if args.live_updates {
        tokio::spawn(apply_live_updates(collection.clone(), args.path.clone()));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    store.shutdown();
    let _ = runner.await;
    printer.abort();

    Ok(())
}
