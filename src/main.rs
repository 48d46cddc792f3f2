//! labelcli - terminal client for the chat-transcript labelling server
//!
//! USAGE:
//!   labelcli                        # interactive labelling (config mode)
//!   labelcli --mode image           # image-anchored example labelling
//!   labelcli --mode conversation    # message-by-message conversation labelling
//!   labelcli --server <url>         # override the server URL
//!   labelcli doctor                 # check config and server reachability
//!   labelcli stats                  # print current progress counters
//!   labelcli config set key value   # non-interactive config

use anyhow::Result;

use labelcli::api::LabelClient;
use labelcli::{config, ui};

// ═══════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════

#[derive(Debug)]
enum Command {
    Interactive {
        mode: Option<String>,
        server: Option<String>,
    },
    Doctor {
        server: Option<String>,
    },
    Stats {
        server: Option<String>,
    },
    ConfigSet {
        key: String,
        value: String,
    },
    Help,
}

fn parse_args() -> Command {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Command::Help;
    }

    let mut mode = None;
    let mut server = None;
    let mut i = 0;
    let mut rest = Vec::new();

    while i < args.len() {
        match args[i].as_str() {
            "--mode" | "-m" => {
                i += 1;
                mode = args.get(i).cloned();
            }
            "--server" | "-s" => {
                i += 1;
                server = args.get(i).cloned();
            }
            s => rest.push(s.to_string()),
        }
        i += 1;
    }

    match rest.first().map(|s| s.as_str()) {
        Some("doctor") => Command::Doctor { server },
        Some("stats") => Command::Stats { server },
        Some("config") if rest.get(1).map(|s| s.as_str()) == Some("set") => Command::ConfigSet {
            key: rest.get(2).cloned().unwrap_or_default(),
            value: rest.get(3).cloned().unwrap_or_default(),
        },
        Some(_) => Command::Help,
        None => Command::Interactive { mode, server },
    }
}

fn print_help() {
    println!(
        r#"labelcli - terminal client for the chat-transcript labelling server

USAGE:
    labelcli                        # interactive labelling (mode from config)
    labelcli --mode image           # image-anchored example labelling
    labelcli --mode conversation    # message-by-message conversation labelling
    labelcli doctor                 # check config and server reachability
    labelcli stats                  # print current progress counters
    labelcli config set key value   # set a config value

FLAGS:
    -m, --mode <mode>       image | conversation
    -s, --server <url>      Labelling server base URL
    -h, --help              Show this help

CONFIG:
    ~/.config/labelcli/config.json    server URL, default mode, poll interval
    Keys for `config set`: server, mode, poll

ENVIRONMENT:
    LABELCLI_SERVER         Override server URL from config

CONTROLS (image mode):
    Tab       Switch between user/assistant candidate panes
    Up/Down   Move cursor, Enter/Space select, 1-9 select directly
    e         Toggle free-text override for the focused pane
    a         Accept the assembled example
    s         Skip the current image
    u         Undo the last accepted example
    [ / ]     Load more context before / after
    Esc       Quit

CONTROLS (conversation mode):
    a         Add current message to the conversation
    s         Skip current message
    u         Undo last addition
    e         End and save the conversation
    Esc       Quit
"#
    );
}

// ═══════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<()> {
    match parse_args() {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Doctor { server } => run_doctor(server).await,
        Command::Stats { server } => run_stats(server).await,
        Command::ConfigSet { key, value } => run_config_set(&key, &value),
        Command::Interactive { mode, server } => run_interactive(mode, server).await,
    }
}

// ═══════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════

fn client_for(server: Option<String>, cfg: &config::Config) -> LabelClient {
    let url = server.unwrap_or_else(|| config::server_url(cfg));
    LabelClient::new(&url)
}

async fn run_doctor(server: Option<String>) -> Result<()> {
    println!("labelcli doctor\n");

    let cfg = config::Config::load()?;
    println!(
        "[{}] Config: {}",
        if config::config_path()?.exists() { "✓" } else { "-" },
        config::config_path()?.display()
    );

    let client = client_for(server, &cfg);
    println!("[?] Server: checking {} ...", client.base_url());
    match client.check_connectivity().await {
        Ok(stats) => {
            println!("\r[✓] Server: reachable            ");
            if let Some(persona) = &stats.persona {
                println!("[✓] Persona: {}", persona);
            }
            if let Some(total) = stats.total() {
                println!(
                    "[✓] Progress: {}/{} ({} labeled)",
                    stats.current_index, total, stats.labeled_conversations
                );
            }
        }
        Err(e) => println!("\r[✗] Server: {}", e),
    }

    Ok(())
}

async fn run_stats(server: Option<String>) -> Result<()> {
    let cfg = config::Config::load()?;
    let client = client_for(server, &cfg);
    let stats = client.check_connectivity().await?;

    if let Some(mode) = &stats.mode {
        println!("Mode:                  {}", mode);
    }
    if let Some(persona) = &stats.persona {
        println!("Persona:               {}", persona);
    }
    if let Some(total) = stats.total() {
        println!("Current index:         {}/{}", stats.current_index, total);
    } else {
        println!("Current index:         {}", stats.current_index);
    }
    println!("Labeled conversations: {}", stats.labeled_conversations);
    if let Some(n) = stats.labeled_messages {
        println!("Labeled messages:      {}", n);
    }
    if let Some(pct) = stats.progress_percent {
        println!("Progress:              {:.1}%", pct);
    }

    Ok(())
}

fn run_config_set(key: &str, value: &str) -> Result<()> {
    let mut cfg = config::Config::load()?;

    match key {
        "server" | "server_url" => {
            cfg.server_url = value.to_string();
            cfg.save()?;
            println!("Server URL set to: {}", value);
        }
        "mode" => {
            if value != "image" && value != "conversation" {
                anyhow::bail!("Unknown mode: {}. Valid modes: image, conversation", value);
            }
            cfg.mode = value.to_string();
            cfg.save()?;
            println!("Default mode set to: {}", value);
        }
        "poll" | "stats_poll_secs" => {
            cfg.stats_poll_secs = value
                .parse()
                .map_err(|_| anyhow::anyhow!("poll interval must be a number of seconds"))?;
            cfg.save()?;
            println!("Stats poll interval set to: {}s", value);
        }
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: server, mode, poll", key);
        }
    }
    Ok(())
}

async fn run_interactive(mode: Option<String>, server: Option<String>) -> Result<()> {
    let cfg = config::Config::load()?;
    let client = client_for(server, &cfg);
    let mode = mode.unwrap_or_else(|| cfg.mode.clone());

    match mode.as_str() {
        "image" | "vlm" => ui::run_image_mode(client, cfg.stats_poll_secs).await,
        "conversation" | "core" => ui::run_convo_mode(client, cfg.stats_poll_secs).await,
        other => anyhow::bail!("Unknown mode: {}. Valid modes: image, conversation", other),
    }
}
