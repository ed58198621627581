//! Test client: checks the gate is closed, knocks in order, checks again.

use clap::Parser;
use reqwest::StatusCode;

use port_knock::KnockSequence;
use port_knock::observability::logging;

#[derive(Parser)]
#[command(name = "knock-client")]
#[command(about = "Knock on a port-knock server and verify the gate opens", long_about = None)]
struct Cli {
    /// The host to connect to.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// The base (gated) port of the server.
    #[arg(long, default_value_t = 8080)]
    base_port: u16,

    /// Comma-separated sequence of ports to knock on.
    #[arg(long, default_value = "8081,8082,8083")]
    sequence: KnockSequence,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init("info");

    let client = reqwest::Client::builder().no_proxy().build()?;
    let gate = format!("http://{}:{}/", cli.host, cli.base_port);

    tracing::info!("Calling server without knocking");
    let res = client.get(&gate).send().await?;
    if res.status() == StatusCode::OK {
        return Err("received unexpected success before knocking".into());
    }
    tracing::info!(status = %res.status(), "Received expected denial");

    tracing::info!(sequence = %cli.sequence, "Knocking server");
    for &port in cli.sequence.ports() {
        let res = client
            .get(format!("http://{}:{}/", cli.host, port))
            .send()
            .await?;
        tracing::info!(port, status = %res.status(), "Knocked");
    }

    tracing::info!("Calling server again");
    let res = client.get(&gate).send().await?;
    let status = res.status();
    let body = res.text().await?;
    tracing::info!(status = %status, body = %body, "Received response");

    if status != StatusCode::OK {
        return Err(format!("gate still closed after knocking: {status}").into());
    }
    Ok(())
}
