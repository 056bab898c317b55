use crate::{
    atlas::{AtlasClient, MeasurementPlatform},
    config::Config,
    enrich::MetadataEnricher,
    inputs,
    pipeline::Campaign,
    report::{self, CampaignReport},
    table::{self, TableSink},
    types::JobHandle,
    util::{ensure_dir, now_rfc3339, sibling_with, timestamp_slug},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "atlas-campaign")]
#[command(about = "RIPE Atlas ping campaigns and probe metadata enrichment")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./atlas-campaign.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ping targets from a set of probes and save the results as CSV.GZ.
    Ping {
        /// Comma-separated probe ids, a probe-id file, or ALL.
        #[arg(long)]
        probes: String,
        /// Comma-separated target IPs/hostnames, or a hitlist file.
        #[arg(long)]
        targets: String,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of ping packets per probe.
        #[arg(long)]
        packets: Option<u32>,
        /// Seconds to wait for measurements to complete.
        #[arg(long)]
        wait: Option<u64>,
    },
    /// Collect results of measurements that were already created.
    Fetch {
        #[arg(long, conflicts_with = "measurements", required_unless_present = "measurements")]
        manifest: Option<PathBuf>,
        /// Comma-separated measurement ids.
        #[arg(long)]
        measurements: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List connected probe ids.
    Probes {
        /// Write the ids to a probe-id file instead of printing a summary only.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Add probe metadata columns to a table with a probe id column.
    Enrich {
        input: PathBuf,
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,
        #[arg(long)]
        in_place: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Ping {
            probes,
            targets,
            output,
            packets,
            wait,
        } => {
            let mut cfg = cfg.clone();
            if let Some(p) = packets {
                cfg.campaign.packets = *p;
            }
            if let Some(w) = wait {
                cfg.wait.wait_seconds = *w;
            }
            cfg.validate()?;
            ping(&cfg, probes, targets, output.as_deref())
        }
        Command::Fetch {
            manifest,
            measurements,
            output,
        } => fetch(&cfg, manifest.as_deref(), measurements.as_deref(), output.as_deref()),
        Command::Probes { output } => probes(&cfg, output.as_deref()),
        Command::Enrich {
            input,
            output,
            in_place,
        } => enrich(&cfg, input, output.as_deref(), *in_place),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("atlas-campaign.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.output.out_dir).join("atlas-campaign.log"))
}

fn ping(cfg: &Config, probes_arg: &str, targets_arg: &str, output: Option<&Path>) -> Result<()> {
    let selection = inputs::parse_probe_arg(probes_arg)?;
    let targets = inputs::parse_target_arg(targets_arg)?;

    let client = AtlasClient::new(cfg)?;
    if !client.has_api_key() {
        return Err(anyhow!(
            "{} is not set; get a key from https://atlas.ripe.net/keys/",
            cfg.atlas.api_key_env
        ));
    }
    let probes = selection.resolve(&client)?;
    info!(
        "using {} probe(s), targeting {} destination(s)",
        probes.len(),
        targets.len()
    );

    let output = resolve_output(cfg, output)?;
    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(sibling_with(&output, ".effective-config.toml"), raw)?;
    }

    let started = now_rfc3339();
    let result = match Campaign::new(cfg, &client).run(&targets, &probes) {
        Ok(result) => result,
        Err(err) => {
            let created = err.created_jobs();
            if cfg.output.write_manifest && !created.is_empty() {
                let path = sibling_with(&output, ".manifest.json");
                let campaign_id = report::campaign_id(&cfg.normalized_for_hash(), &targets, &probes);
                CampaignReport::unfinished(
                    campaign_id,
                    started,
                    &targets,
                    probes.len(),
                    cfg.campaign.packets,
                    created,
                )
                .write(&path)?;
                warn!(
                    "{} measurement(s) were created; collect them later with `fetch --manifest {}`",
                    created.len(),
                    path.display()
                );
            }
            return Err(anyhow::Error::new(err).context("ping campaign failed"));
        }
    };

    table::write_records(&output, &result.records)?;
    if cfg.output.write_manifest {
        result.report.write(&sibling_with(&output, ".manifest.json"))?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "campaign_id": result.report.campaign_id,
                "output": output,
                "measurements": result.report.jobs.len(),
                "records": result.records.len(),
                "status": "ok"
            }))?
        );
    }
    Ok(())
}

fn fetch(
    cfg: &Config,
    manifest: Option<&Path>,
    measurements: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let handles = match (manifest, measurements) {
        (Some(path), _) => CampaignReport::load(path)?.handles(),
        (None, Some(ids)) => parse_measurement_ids(ids)?,
        (None, None) => return Err(anyhow!("either --manifest or --measurements is required")),
    };

    let client = AtlasClient::new(cfg)?;
    let campaign = Campaign::new(cfg, &client);
    let (records, jobs) = campaign.collect(&handles, Vec::new());
    if records.is_empty() {
        return Err(crate::error::Error::EmptyResults { jobs: handles }.into());
    }

    let output = resolve_output(cfg, output)?;
    table::write_records(&output, &records)?;

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "output": output,
                "measurements": jobs.len(),
                "records": records.len(),
                "fetched_at": now_rfc3339(),
                "status": "ok"
            }))?
        );
    }
    Ok(())
}

fn parse_measurement_ids(raw: &str) -> Result<Vec<JobHandle>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| {
            let measurement_id = s
                .parse()
                .map_err(|_| anyhow!("invalid measurement id: '{s}'"))?;
            Ok(JobHandle {
                measurement_id,
                target: String::new(),
                batch_index: i + 1,
                probe_count: 0,
            })
        })
        .collect()
}

fn probes(cfg: &Config, output: Option<&Path>) -> Result<()> {
    let client = AtlasClient::new(cfg)?;
    let ids = client.list_active_probe_ids()?;
    info!("found {} connected probe(s)", ids.len());

    if let Some(path) = output {
        let mut body = format!("# connected RIPE Atlas probes, {}\n", now_rfc3339());
        for id in &ids {
            body.push_str(&id.to_string());
            body.push('\n');
        }
        std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote probe ids to {}", path.display());
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "connected_probes": ids.len(),
                "output": output,
            }))?
        );
    }
    Ok(())
}

fn enrich(cfg: &Config, input: &Path, output: Option<&Path>, in_place: bool) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input file '{}' not found", input.display()));
    }

    let sink = if in_place {
        TableSink::InPlace
    } else {
        let path = output.map(PathBuf::from).unwrap_or_else(|| {
            sibling_with(input, &format!("{}.csv.gz", cfg.enrich.output_suffix))
        });
        TableSink::NewFile(path)
    };

    info!("reading input file: {}", input.display());
    let table = table::read_table(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let client = AtlasClient::new(cfg)?;
    let enricher = MetadataEnricher::new(&client, &cfg.enrich.id_column, cfg.concurrency.lookup_workers);
    let enriched = enricher.enrich(&table)?;

    let written = table::write_to_sink(input, &sink, &enriched)?;
    info!("saved enriched data to {}", written.display());

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "input": input,
                "output": written,
                "rows": enriched.len(),
                "status": "ok"
            }))?
        );
    }
    Ok(())
}

fn resolve_output(cfg: &Config, user: Option<&Path>) -> Result<PathBuf> {
    let path = match user {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(&cfg.output.out_dir)
            .join(format!("{}_{}.csv.gz", cfg.output.file_prefix, timestamp_slug())),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    Ok(path)
}
