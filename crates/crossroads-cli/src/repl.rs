//! REPL – Read-Eval-Print Loop for the crossroads shell.
//!
//! Supported slash-commands:
//!   /help                          – show this list
//!   /status                        – list crossroads, heads and phases
//!   /place <head>                  – put a head in a new crossroad
//!   /join <head> <partner>         – add a head to its partner's crossroad
//!   /remove <head>                 – take a head out of its crossroad
//!   /config <head> <gA> <yA> <gB> <yB> – set pair timing and restart
//!   /start <head> | /stop <head>   – control the cycle of a head's crossroad
//!   /publish <topic> <payload>     – inject a message on the bus
//!   /found                         – heads announced on the bus
//!   /quit | /exit                  – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossroads_core::{CrossroadRegistry, HeadDiscovery};
use crossroads_middleware::MessageBus;
use crossroads_types::{CrossroadError, CrossroadId, HeadId, Phase, SignalHead, Timing};

/// Everything the REPL drives.
pub struct Session {
    pub registry: Arc<Mutex<CrossroadRegistry>>,
    pub bus: MessageBus,
    pub discovery: HeadDiscovery,
}

impl Session {
    fn registry(&self) -> MutexGuard<'_, CrossroadRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Place(HeadId),
    Join { head: HeadId, partner: HeadId },
    Remove(HeadId),
    Config { head: HeadId, timings: [Timing; 2] },
    Start(HeadId),
    Stop(HeadId),
    Publish { topic: String, payload: String },
    Found,
    Quit,
}

/// Parse one input line.  `Err` carries a usage message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let head = |i: usize, usage: &str| -> Result<HeadId, String> {
        args.get(i)
            .map(|s| HeadId::from(*s))
            .ok_or_else(|| format!("usage: {usage}"))
    };

    match name {
        "/help" => Ok(Command::Help),
        "/status" => Ok(Command::Status),
        "/place" => Ok(Command::Place(head(0, "/place <head>")?)),
        "/join" => Ok(Command::Join {
            head: head(0, "/join <head> <partner>")?,
            partner: head(1, "/join <head> <partner>")?,
        }),
        "/remove" => Ok(Command::Remove(head(0, "/remove <head>")?)),
        "/config" => {
            const USAGE: &str = "usage: /config <head> <greenA> <yellowA> <greenB> <yellowB>";
            if args.len() != 5 {
                return Err(USAGE.to_string());
            }
            let mut secs = [0u32; 4];
            for (slot, raw) in secs.iter_mut().zip(&args[1..]) {
                *slot = raw
                    .parse()
                    .map_err(|_| format!("'{raw}' is not a number of seconds; {USAGE}"))?;
            }
            Ok(Command::Config {
                head: HeadId::from(args[0]),
                timings: Timing::paired(secs[0], secs[1], secs[2], secs[3]),
            })
        }
        "/start" => Ok(Command::Start(head(0, "/start <head>")?)),
        "/stop" => Ok(Command::Stop(head(0, "/stop <head>")?)),
        "/publish" => {
            let mut parts = line.trim().splitn(3, char::is_whitespace);
            parts.next();
            match (parts.next(), parts.next()) {
                (Some(topic), payload) if !topic.is_empty() => Ok(Command::Publish {
                    topic: topic.to_string(),
                    payload: payload.unwrap_or_default().trim().to_string(),
                }),
                _ => Err("usage: /publish <topic> <payload>".to_string()),
            }
        }
        "/found" => Ok(Command::Found),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!(
            "{} '{}'. Type {} for available commands.",
            "Unknown command:".red(),
            other.yellow(),
            "/help".bold()
        )),
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(session: &Session, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "crossroads>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Quit) => {
                session.registry().stop_all();
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(command) => execute(session, command),
            Err(message) => println!("{message}"),
        }
    }
}

fn execute(session: &Session, command: Command) {
    match command {
        Command::Help => cmd_help(),
        Command::Status => cmd_status(session),
        Command::Place(head) => {
            let result = session.registry().create_solo(SignalHead::new(head.clone()));
            report(result.map(|id| format!("{head} placed in crossroad {id}")));
        }
        Command::Join { head, partner } => {
            let result = session
                .registry()
                .join(&partner, SignalHead::new(head.clone()));
            report(result.map(|id| format!("{head} joined crossroad {id}")));
        }
        Command::Remove(head) => {
            let result = session.registry().remove(&head);
            report(result.map(|h| format!("{} removed", h.id)));
        }
        Command::Config { head, timings } => {
            let registry = session.registry();
            let result = crossroad_of(&registry, &head).and_then(|id| {
                registry.configure(id, &timings)?;
                registry.stop(id)?;
                registry.start(id)?;
                Ok(id)
            });
            report(result.map(|id| format!("crossroad {id} configured and running")));
        }
        Command::Start(head) => {
            let registry = session.registry();
            let result = crossroad_of(&registry, &head).and_then(|id| {
                registry.start(id)?;
                Ok(id)
            });
            report(result.map(|id| format!("crossroad {id} running")));
        }
        Command::Stop(head) => {
            let registry = session.registry();
            let result = crossroad_of(&registry, &head).and_then(|id| {
                registry.stop(id)?;
                Ok(id)
            });
            report(result.map(|id| format!("crossroad {id} stopped")));
        }
        Command::Publish { topic, payload } => match session.bus.publish(topic.as_str(), payload) {
            Ok(n) => println!("  published to {} ({} receiver(s))", topic.bold(), n),
            Err(e) => println!("{}: {}", "Publish failed".red(), e),
        },
        Command::Found => cmd_found(session),
        Command::Quit => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Crossroads Commands".bold().underline());
    println!("  {}                          – list crossroads and phases", "/status".bold().cyan());
    println!("  {}                    – new crossroad for a head", "/place <head>".bold().cyan());
    println!("  {}           – pair a head with a placed one", "/join <head> <partner>".bold().cyan());
    println!("  {}                   – take a head out", "/remove <head>".bold().cyan());
    println!("  {} – set timing and restart", "/config <head> gA yA gB yB".bold().cyan());
    println!("  {}     – control a cycle", "/start <head>  /stop <head>".bold().cyan());
    println!("  {}       – inject a message", "/publish <topic> <payload>".bold().cyan());
    println!("  {}                           – announced heads", "/found".bold().cyan());
    println!("  {}                    – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_status(session: &Session) {
    let crossroads = session.registry().list();
    if crossroads.is_empty() {
        println!("  {}", "No crossroads placed.".dimmed());
        return;
    }
    for crossroad in crossroads {
        let state = if crossroad.running {
            "running".green()
        } else {
            "stopped".yellow()
        };
        println!("  {} {}", crossroad.id.to_string().bold(), state);
        for head in &crossroad.heads {
            let timing = head.timing.as_ref().map_or_else(
                || "no timing".dimmed().to_string(),
                |t| format!("g={} y={} r={}", t.green, t.yellow, t.red),
            );
            println!("    {:<12} {:<8} {}", head.id.as_str(), paint(head.phase), timing);
        }
    }
}

fn cmd_found(session: &Session) {
    let found = session.discovery.found();
    if found.is_empty() {
        println!("  {}", "No heads announced yet.".dimmed());
        return;
    }
    let unplaced = session.discovery.unplaced(&session.registry());
    for head in found {
        let marker = if unplaced.contains(&head) {
            "unplaced".yellow()
        } else {
            "placed".green()
        };
        println!("    {:<12} {}", head.as_str(), marker);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn crossroad_of(registry: &CrossroadRegistry, head: &HeadId) -> Result<CrossroadId, CrossroadError> {
    registry
        .crossroad_of(head)
        .ok_or_else(|| CrossroadError::UnknownHead(head.clone()))
}

fn report(result: Result<String, CrossroadError>) {
    match result {
        Ok(message) => println!("  {} {}", "✓".green().bold(), message),
        Err(e) => println!("{}: {}", "Error".red(), e),
    }
}

/// Render `phase` in its own color.
pub fn paint(phase: Phase) -> colored::ColoredString {
    match phase {
        Phase::Green => phase.as_str().green().bold(),
        Phase::Yellow => phase.as_str().yellow().bold(),
        Phase::Red => phase.as_str().red().bold(),
        Phase::Unset => phase.as_str().dimmed(),
    }
}
