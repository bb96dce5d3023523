mod cli;
mod error_fmt;
mod session;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::session::{RunOptions, Snapshot, stats_json};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: &Path) -> eyre::Result<dro_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = dro_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(json: bool, level: &str, logging: &dro_config::Logging) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Console logs go to stderr so stdout stays parseable.
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().compact().with_writer(std::io::stderr).boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("install tracing subscriber: {e}"))
}

fn print_state(json: bool, snap: Snapshot, extra: Option<(&str, serde_json::Value)>) {
    if json {
        let mut obj = snap.to_json();
        if let (Some((k, v)), Some(map)) = (extra, obj.as_object_mut()) {
            map.insert(k.to_string(), v);
        }
        println!("{obj}");
    } else {
        println!("{snap}");
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    init_tracing(cli.json, level, &cfg.logging)?;
    tracing::debug!(device = %cfg.device.name, config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            iterations,
            script,
            clear_counter,
            stats,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let counter = session::make_counter(&cfg)?;
            let opts = RunOptions {
                iterations,
                script: script.as_deref(),
                clear_counter,
            };
            let (snap, loop_stats) = session::run(&cfg, counter, &opts, shutdown)?;
            if cli.json {
                let extra = stats.then(|| ("stats", stats_json(&loop_stats)));
                print_state(true, snap, extra);
            } else {
                print_state(false, snap, None);
                if stats {
                    println!(
                        "stats: iterations={} updates={} counter_errors={} events={} applied={} rejected={} invalid={}",
                        loop_stats.iterations,
                        loop_stats.updates,
                        loop_stats.counter_errors,
                        loop_stats.events,
                        loop_stats.writes_applied,
                        loop_stats.writes_rejected,
                        loop_stats.writes_invalid
                    );
                }
            }
        }
        Commands::Show => {
            let report = session::show(&cfg)?;
            if cli.json {
                let stored = serde_json::json!({
                    "numerator": report.stored_numerator,
                    "denominator": report.stored_denominator,
                });
                print_state(true, report.active, Some(("stored", stored)));
            } else {
                println!(
                    "stored: numerator={} denominator={}",
                    report.stored_numerator, report.stored_denominator
                );
                println!("active: {}", report.active);
            }
        }
        Commands::Write { attribute, value } => {
            let (done, snap) = session::write(&cfg, &attribute, &value)?;
            tracing::info!(?done, "write applied");
            print_state(cli.json, snap, None);
        }
        Commands::Attributes => {
            let table = dro_core::Dispatcher::new().table();
            if cli.json {
                let rows: Vec<_> = table
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "handle": d.id.handle(),
                            "name": d.id.name(),
                            "uuid": d.uuid_string(),
                            "description": d.description,
                            "width": d.width,
                            "read": d.access.read,
                            "write": d.access.write,
                            "notify": d.access.notify,
                            "format": d.presentation.format.code(),
                            "exponent": d.presentation.exponent,
                            "unit": d.presentation.unit.code(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::Value::Array(rows));
            } else {
                println!("service {}", dro_core::format_uuid(&dro_core::SERVICE_UUID));
                for d in table {
                    let access = format!(
                        "{}{}{}",
                        if d.access.read { "r" } else { "-" },
                        if d.access.write { "w" } else { "-" },
                        if d.access.notify { "n" } else { "-" },
                    );
                    println!(
                        "{:>2} {:<12} {} {} {}B  {}",
                        d.id.handle(),
                        d.id.name(),
                        d.uuid_string(),
                        access,
                        d.width,
                        d.description
                    );
                }
            }
        }
        Commands::SelfCheck => {
            let (count, nvm_len) = session::self_check(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "ok": true, "count": count, "nvm_bytes": nvm_len }));
            } else {
                println!("ok: count={count} nvm_bytes={nvm_len}");
            }
        }
    }
    Ok(())
}
