//! `crossroads-cli` – crossroad signal controller shell
//!
//! This binary wires the stack together and hands control to the operator:
//!
//! 1. Loads the startup layout from `~/.crossroads/config.toml` (or
//!    `$CROSSROADS_CONFIG`) and places the configured crossroads.
//! 2. Runs an in-process message bus, routing inbound traffic to the
//!    crossroad controllers and printing every commanded phase.
//! 3. Drops the user into an **interactive REPL** with slash-commands
//!    (`/place`, `/join`, `/config`, `/publish`, `/status`, `/help`).
//! 4. Intercepts **Ctrl-C** to stop every cycle before exiting.

mod config;
mod repl;

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crossroads_core::{CrossroadRegistry, HeadDiscovery};
use crossroads_middleware::{Dispatcher, MessageBus, Outbox, TopicRouter};
use crossroads_types::{topics, Phase};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (defaults to "info").  Set
    // CROSSROADS_LOG_FORMAT=json for newline-delimited JSON logs.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("CROSSROADS_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            println!(
                "  {} {} – starting with an empty layout.",
                "No config at".dimmed(),
                config::config_path().display().to_string().dimmed()
            );
            config::Config::default()
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Runtime & transport ───────────────────────────────────────────────
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    let bus = MessageBus::new(cfg.bus_capacity);
    let router = TopicRouter::new();
    let _dispatcher = Dispatcher::spawn(&bus, router.clone());
    let (outbox, _pump) = Outbox::spawn(Arc::new(bus.clone()));

    let discovery = HeadDiscovery::new();
    discovery.attach(&router);

    let mut registry = CrossroadRegistry::new(router, outbox);
    match config::apply_layout(&cfg, &mut registry) {
        Ok(created) if !created.is_empty() => {
            println!("  {} crossroad(s) placed from config.", created.len());
        }
        Ok(_) => {}
        Err(e) => println!("{}: {}", "Layout error".red(), e),
    }
    let registry = Arc::new(Mutex::new(registry));

    // ── Phase monitor ─────────────────────────────────────────────────────
    // Stands in for the hardware: print every commanded phase.
    let mut states = bus.subscribe_pattern(topics::STATE_PATTERN);
    runtime.spawn(async move {
        while let Some(message) = states.recv().await {
            let head = message.topic.rsplit('/').next().unwrap_or_default();
            let phase = message.payload.parse::<Phase>().map_or_else(
                |_| message.payload.normal(),
                repl::paint,
            );
            println!("  {} {} → {}", "●".dimmed(), head.bold(), phase);
        }
    });

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let registry_ctrlc = registry.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping all cycles …".yellow().bold());
        registry_ctrlc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop_all();
        println!("{}", "  ✓ All crossroads stopped.".green());
        shutdown_clone.store(true, Ordering::SeqCst);
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; cycles will not be stopped on Ctrl-C");
    }

    println!();
    println!(
        "  Type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let session = repl::Session {
        registry,
        bus,
        discovery,
    };
    repl::run(&session, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", "   ● ".red().bold());
    println!("{}", "   ● ".yellow().bold());
    println!("{}", "   ● ".green().bold());
    println!();
    println!(
        "  {} {}",
        "Crossroads".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Paired traffic-signal controller");
    println!();
}
