use clap::Parser;
use dhcp_sentry::{Args, Detection, Detector, DetectorConfig, ProbeError};
use std::{process::ExitCode, time::Duration};
use tracing_subscriber::EnvFilter;

fn report(family: &str, interface: &str, result: &Result<Detection, ProbeError>) {
    match result {
        Ok(Detection::Detected) => println!("{family}: a DHCP server is answering on {interface}"),
        Ok(Detection::NotDetected) => println!("{family}: no DHCP server found on {interface}"),
        Err(e) => {
            tracing::warn!(error = ?e, phase = %e.phase(), "{family} check failed");
            println!("{family}: check failed during {}: {e}", e.phase());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = DetectorConfig::default().with_timeout(Duration::from_millis(args.timeout));
    let detector = Detector::new(config);
    tracing::debug!(interface = %args.interface, config = ?detector.config(), "Starting checks");

    let (v4, v6) = tokio::join!(
        async {
            if args.v6_only {
                None
            } else {
                Some(detector.check_v4(&args.interface).await)
            }
        },
        async {
            if args.v4_only {
                None
            } else {
                Some(detector.check_v6(&args.interface).await)
            }
        },
    );

    let results: Vec<_> = [("DHCPv4", v4), ("DHCPv6", v6)]
        .into_iter()
        .filter_map(|(family, result)| result.map(|r| (family, r)))
        .collect();
    for (family, result) in &results {
        report(family, &args.interface, result);
    }

    if results.iter().any(|(_, r)| r.is_err()) {
        ExitCode::from(2)
    } else if results
        .iter()
        .any(|(_, r)| matches!(r, Ok(Detection::Detected)))
    {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
