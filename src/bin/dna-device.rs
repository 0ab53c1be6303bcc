// src/bin/dna-device.rs
use clap::Parser;
use dna_auth::client::{AuthClient, DEFAULT_SERVER_URL};
use dna_auth::Device;
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dna-device", about = "Simulated device for the authentication backend")]
struct Args {
    /// Device id to authenticate as (ignored with --count)
    #[arg(default_value = "SIM-DEVICE-001")]
    device_id: String,
    /// Backend base URL
    #[arg(long, env = "AUTH_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,
    /// Run this many devices concurrently as SIM-DEVICE-1..N
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let client = AuthClient::new(&args.server)?;

    let ids: Vec<String> = match args.count {
        Some(n) => (1..=n).map(|i| format!("SIM-DEVICE-{i}")).collect(),
        None => vec![args.device_id],
    };
    let total = ids.len();

    let mut tasks = JoinSet::new();
    for id in ids {
        let client = client.clone();
        tasks.spawn(async move {
            info!(device_id = %id, "starting device");
            let device = Device::new(id);
            let outcome = client.authenticate(&device).await;
            (device.device_id().to_owned(), outcome)
        });
    }

    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            (_, Ok(true)) => succeeded += 1,
            (_, Ok(false)) => {}
            (id, Err(e)) => error!(device_id = %id, "{e}"),
        }
    }

    info!("{succeeded}/{total} devices authenticated");
    if succeeded != total {
        anyhow::bail!("{} device(s) failed to authenticate", total - succeeded);
    }
    Ok(())
}
