use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use flashgen_core::{ConfigDocument, DocumentDiff, Value};
use flashgen_kubehub::{build_sidecar_containers, ClusterSource};
use flashgen_synth::{parse_version, synthesize_with, Dialect, SynthOptions, SynthesizedConfig};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "flashgenctl", version, about = "Render storage engine and proxy configs for a cluster")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubernetes namespace for live lookups
    #[arg(long = "ns", global = true, default_value = "default")]
    namespace: String,

    /// Fail on an unparsable engine version instead of using the legacy dialect
    #[arg(long = "strict-version", global = true, action = ArgAction::SetTrue, env = "FLASHGEN_STRICT_VERSION")]
    strict_version: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json, Yaml }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render configs for a TidbCluster manifest on disk
    Render {
        /// YAML or JSON manifest
        file: PathBuf,
    },
    /// Render configs for a TidbCluster read from the API server
    Fetch {
        /// TidbCluster name
        name: String,
    },
    /// Print the log-tailing sidecar containers for a manifest
    Sidecars {
        file: PathBuf,
    },
    /// Compare a manifest's rendered configs with a previous `-o json`/`-o yaml` render
    Diff {
        file: PathBuf,
        /// Previously rendered output
        #[arg(long = "against")]
        against: PathBuf,
    },
    /// Show which config dialect a version selects
    Dialect {
        version: String,
    },
}

fn init_tracing() {
    let env = std::env::var("FLASHGEN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FLASHGEN_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid FLASHGEN_METRICS_ADDR; expected host:port");
        }
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("{:?}", s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::List(_) => serde_json::to_string(v).unwrap_or_else(|_| "[...]".to_string()),
        Value::Table(_) => "{...}".to_string(),
        Value::Null => "null".to_string(),
    }
}

fn print_doc(title: &str, doc: &ConfigDocument) {
    println!("[{}]", title);
    for path in doc.leaf_paths() {
        if let Some(v) = doc.get(&path) {
            println!("{} = {}", path, render_value(v));
        }
    }
}

fn emit<T: Serialize>(output: Output, value: &T) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Output::Yaml | Output::Human => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

fn print_synthesized(output: Output, out: &SynthesizedConfig) -> Result<()> {
    match output {
        Output::Human => {
            println!("# dialect: {}", out.dialect);
            print_doc("engine", &out.engine);
            println!();
            print_doc("proxy", &out.proxy);
            Ok(())
        }
        other => emit(other, out),
    }
}

fn print_diff(title: &str, d: &DocumentDiff) {
    println!("[{}] {} added, {} changed, {} removed", title, d.added.len(), d.changed.len(), d.removed.len());
    for p in d.added.iter() { println!("+ {}", p); }
    for p in d.changed.iter() { println!("~ {}", p); }
    for p in d.removed.iter() { println!("- {}", p); }
}

fn render(src: &ClusterSource, opts: SynthOptions, output: Output) -> Result<()> {
    let out = synthesize_with(&src.topology, &src.partial, opts)
        .with_context(|| format!("synthesizing config for {}/{}", src.topology.namespace, src.topology.name))?;
    info!(cluster = %src.topology.name, dialect = %out.dialect, "rendered");
    print_synthesized(output, &out)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let opts = SynthOptions { strict_version: cli.strict_version };

    match cli.command {
        Commands::Render { file } => {
            info!(file = %file.display(), "render invoked");
            let src = flashgen_kubehub::load_cluster_file(&file)?;
            render(&src, opts, cli.output)?;
        }
        Commands::Fetch { name } => {
            info!(name = %name, ns = %cli.namespace, "fetch invoked");
            match flashgen_kubehub::fetch_cluster(&cli.namespace, &name).await {
                Ok(src) => render(&src, opts, cli.output)?,
                Err(e) => {
                    error!(error = ?e, "fetch failed");
                    return Err(e);
                }
            }
        }
        Commands::Sidecars { file } => {
            let src = flashgen_kubehub::load_cluster_file(&file)?;
            let engine = src.partial.engine.clone().unwrap_or_default();
            let containers = build_sidecar_containers(
                &engine,
                &src.helper_image,
                src.helper_pull_policy.as_deref(),
                src.log_tailer_resources.as_ref(),
            )
                .context("building sidecar containers")?;
            emit(cli.output, &containers)?;
        }
        Commands::Diff { file, against } => {
            let src = flashgen_kubehub::load_cluster_file(&file)?;
            let now = synthesize_with(&src.topology, &src.partial, opts).context("synthesizing config")?;
            let text = std::fs::read_to_string(&against).with_context(|| format!("reading {}", against.display()))?;
            let before: SynthesizedConfig =
                serde_yaml::from_str(&text).with_context(|| format!("parsing {}", against.display()))?;

            #[derive(Serialize)]
            struct Report { dialect_changed: bool, engine: DocumentDiff, proxy: DocumentDiff }
            let report = Report {
                dialect_changed: now.dialect != before.dialect,
                engine: now.engine.diff(&before.engine),
                proxy: now.proxy.diff(&before.proxy),
            };
            info!(
                unchanged = report.engine.is_empty() && report.proxy.is_empty() && !report.dialect_changed,
                "diff computed"
            );
            match cli.output {
                Output::Human => {
                    if report.dialect_changed { println!("# dialect: {} -> {}", before.dialect, now.dialect); }
                    print_diff("engine", &report.engine);
                    print_diff("proxy", &report.proxy);
                }
                other => emit(other, &report)?,
            }
        }
        Commands::Dialect { version } => {
            let dialect = if cli.strict_version {
                flashgen_synth::try_select_dialect(&version)?
            } else {
                flashgen_synth::select_dialect(&version)
            };
            match cli.output {
                Output::Human => {
                    let parsed = parse_version(&version).map(|v| v.to_string()).unwrap_or_else(|_| "unparsable".to_string());
                    println!("{} ({}) -> {}", version, parsed, dialect);
                }
                other => {
                    #[derive(Serialize)]
                    struct Selection<'a> { version: &'a str, dialect: Dialect }
                    emit(other, &Selection { version: &version, dialect })?;
                }
            }
        }
    }
    Ok(())
}
