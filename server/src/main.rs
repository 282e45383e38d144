use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::{Parser, Subcommand};
use percorsi_client::{
    ClientConfig, RenderPolicy,
    shared::{Coordinate, PathType, RouteFilters},
};
use percorsi_server::{AppState, headless};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Sun/shade walking planner: static page server and headless map client"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the map page, its scripts and the road network as static files
    Serve {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Snap a point to the nearest road network vertex
    Snap {
        #[command(flatten)]
        client: ClientArgs,
        /// Point as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        at: Coordinate,
    },
    /// Pick two points, ask the routing backend for a path and print what
    /// would be drawn
    Route {
        #[command(flatten)]
        client: ClientArgs,
        /// Start as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        start: Coordinate,
        /// End as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        end: Coordinate,
        /// Season passed through to the backend
        #[arg(long)]
        stagione: Option<String>,
        /// Time band passed through to the backend
        #[arg(long)]
        fascia: Option<String>,
        /// `sole` or `ombra`
        #[arg(long)]
        tipo: Option<PathType>,
    },
}

/// Overrides for the `PERCORSI_*` environment.
#[derive(Debug, clap::Args)]
struct ClientArgs {
    /// Road network GeoJSON, file path or http(s) URL
    #[arg(long)]
    network: Option<String>,
    /// Routing backend base URL
    #[arg(long)]
    api_root: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// `filtered` or `all`
    #[arg(long)]
    render_policy: Option<RenderPolicy>,
}

impl ClientArgs {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(network) = &self.network {
            config.network_source = network.parse().unwrap_or_else(|never| match never {});
        }
        if let Some(root) = &self.api_root {
            config.api_root = root.trim_end_matches('/').to_string();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = self.render_policy {
            config.render_policy = policy;
        }
        config
    }
}

fn parse_lat_lon(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got `{raw}`"))?;
    let parse = |field: &str, label: &str| {
        field
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid {label} `{field}`"))
    };
    Ok(Coordinate::new(parse(lat, "latitude")?, parse(lon, "longitude")?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "percorsi_server=debug,percorsi_client=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Serve { dir, host, port } => {
            let state = AppState::new(dir)?;
            percorsi_server::serve(state, SocketAddr::new(host, port)).await?;
        }
        Command::Snap { client, at } => {
            let report = headless::snap(&client.config(), at).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Route {
            client,
            start,
            end,
            stagione,
            fascia,
            tipo,
        } => {
            let config = client.config();
            let filters = RouteFilters {
                stagione,
                fascia,
                tipo,
            };
            let report = headless::plan_route(&config, start, end, filters).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(error) = report.error {
                return Err(error.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lat_lon() {
        assert_eq!(
            parse_lat_lon("40.770, 14.790").unwrap(),
            Coordinate::new(40.770, 14.790)
        );
        assert!(parse_lat_lon("40.770").is_err());
        assert!(parse_lat_lon("nord,14.79").is_err());
    }

    #[test]
    fn test_cli_parses_route_command() {
        let cli = Cli::try_parse_from([
            "percorsi-server",
            "route",
            "--start",
            "40.770,14.790",
            "--end",
            "40.773,14.792",
            "--tipo",
            "ombra",
            "--render-policy",
            "all",
        ])
        .unwrap();
        match cli.command {
            Command::Route { tipo, client, .. } => {
                assert_eq!(tipo, Some(PathType::Ombra));
                assert_eq!(client.render_policy, Some(RenderPolicy::All));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
