use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use geoflags::client::{evaluate_locally, health_banner, BackendClient};
use geoflags::config::Config;
use geoflags::location::providers::{BigDataCloud, FixedPosition, IpApi, IpInfo, IpLookup};
use geoflags::location::{
    find_option, Coordinates, LocationResolver, ManualLocationOption, ManualPicker, PresetChoice, SkipManual, Step,
};
use tracing_subscriber::EnvFilter;

/// geoflags: progressive location detection with location-based feature flags
///
/// Without --serve, runs the detection chain (device → IP → manual → default),
/// posts the result to the backend and prints the flags as JSON.
///
/// Examples:
///   geoflags --serve --port 3000
///   geoflags
///   geoflags --lat 37.42 --lon -122.08
///   geoflags --choose Tokyo
///   geoflags --skip-manual --timezone Europe/Paris
#[derive(Parser)]
#[command(name = "geoflags", version, about, long_about = None)]
struct Cli {
    /// Run the backend HTTP server.
    #[arg(long)]
    serve: bool,

    /// Bind address for --serve.
    #[arg(long)]
    host: Option<String>,

    /// Port for --serve.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Config file (defaults to ~/.geoflags/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend origin (e.g. http://localhost:3000).
    #[arg(long)]
    backend: Option<String>,

    /// Device latitude. Without --lat/--lon the device step is unavailable.
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Device longitude.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Age of the device fix in seconds.
    #[arg(long, default_value_t = 0)]
    fix_age: u64,

    /// Pick this manual location (city name or country code) if manual
    /// selection is reached.
    #[arg(long, conflicts_with = "skip_manual")]
    choose: Option<String>,

    /// Decline manual selection and fall through to the timezone default.
    #[arg(long)]
    skip_manual: bool,

    /// IANA timezone override for the default step (e.g. Europe/Paris).
    #[arg(long)]
    timezone: Option<String>,

    /// Evaluate flags in-process instead of calling the backend.
    #[arg(long)]
    local: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoflags=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(ref backend) = cli.backend {
        config.backend_url = backend.clone();
    }

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        return runtime
            .block_on(geoflags::server::start(&config))
            .with_context(|| format!("Server error on {}:{}", config.host, config.port));
    }

    detect(&cli, &config)
}

fn detect(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let backend = BackendClient::new(&config.backend_url);

    // ── Backend health banner ───────────────────────────────────

    eprintln!("{}", health_banner(&backend.health()));

    // ── Resolve location ────────────────────────────────────────

    let ip_services: Vec<Box<dyn IpLookup>> = vec![
        Box::new(IpInfo::new(config.ipinfo_url.clone())),
        Box::new(IpApi::new(config.ip_api_url.clone())),
    ];
    let mut resolver = LocationResolver::new()
        .with_geocoder(BigDataCloud::new(config.reverse_geocode_url.clone()))
        .with_ip_services(ip_services)
        .with_catalog(BackendClient::new(&config.backend_url))
        .with_position_options(config.position_options());

    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            anyhow::bail!("Invalid coordinates. Lat: -90..90, Lon: -180..180");
        }
        resolver = resolver.with_device(FixedPosition {
            coords: Coordinates { latitude: lat, longitude: lon },
            age: Duration::from_secs(cli.fix_age),
        });
    }

    if cli.timezone.is_some() {
        resolver = resolver.with_timezone(cli.timezone.clone());
    }

    resolver = if let Some(ref choice) = cli.choose {
        resolver.with_picker(PresetChoice(choice.clone()))
    } else if cli.skip_manual || !io::stdin().is_terminal() {
        resolver.with_picker(SkipManual)
    } else {
        resolver.with_picker(PromptPicker)
    };

    let resolution = resolver.resolve();

    // ── Print progression ───────────────────────────────────────

    let reached = resolution.steps.last().copied().unwrap_or(Step::Default);
    for (i, step) in [Step::Device, Step::Ip, Step::Manual, Step::Default].iter().enumerate() {
        let mark = if *step == reached {
            "\u{25C9}"
        } else if resolution.steps.contains(step) {
            "\u{2717}"
        } else {
            "\u{25CB}"
        };
        eprintln!("  {} {}. {}", mark, i + 1, step);
    }
    eprintln!("  \u{1F4CD} {}", resolution.estimate.summary());

    // ── Fetch flags ─────────────────────────────────────────────

    let flags = if cli.local {
        evaluate_locally(&resolution.estimate)
    } else {
        match backend.feature_flags(&resolution.estimate) {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch feature flags");
                return Ok(());
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&flags)?);
    Ok(())
}

/// Interactive manual selection on stdin/stderr.
struct PromptPicker;

impl ManualPicker for PromptPicker {
    fn choose(&self, options: &[ManualLocationOption]) -> Option<ManualLocationOption> {
        if options.is_empty() {
            return None;
        }

        eprintln!();
        eprintln!("  Could not detect your location automatically. Choose one:");
        for (i, o) in options.iter().enumerate() {
            let region = o.region.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default();
            eprintln!("    {:>2}. {}, {}{}", i + 1, o.city, o.country, region);
        }
        eprint!("  Number or city, empty to skip: ");
        let _ = io::stderr().flush();

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("s") || answer.eq_ignore_ascii_case("skip") {
            return None;
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => Some(options[n - 1].clone()),
            _ => find_option(options, answer).cloned(),
        }
    }
}
