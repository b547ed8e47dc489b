use clickd_core::config;
use clickd_core::ipc::{self, ClientMsg, DaemonMsg};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser)]
#[command(name = "clickctl", about = "Control the clickd daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show daemon status
    Status,
    /// Enable automatic click layer activation
    Enable,
    /// Disable automatic click layer activation
    Disable,
    /// Toggle automatic click layer activation on/off
    Toggle,
    /// Print click layer changes as they happen
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket_path = config::socket_path();
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("connecting to clickd at {}\nIs the daemon running?", socket_path.display()))?;

    let mut writer = stream.try_clone().context("cloning stream")?;
    let reader = BufReader::new(stream);

    let (msg, watch) = match cli.command {
        Command::Status => (ClientMsg::GetStatus, false),
        Command::Enable => (ClientMsg::Enable, false),
        Command::Disable => (ClientMsg::Disable, false),
        Command::Toggle => (ClientMsg::Toggle, false),
        Command::Watch => (ClientMsg::Subscribe, true),
    };

    let line = ipc::encode(&msg);
    writer
        .write_all(line.as_bytes())
        .context("sending command")?;

    for line in reader.lines() {
        let line = line.context("reading response")?;
        let Some(resp) = ipc::decode_daemon(&line) else {
            continue;
        };
        match resp {
            DaemonMsg::Status {
                enabled,
                state,
                layer,
                active,
                version,
            } => {
                println!("clickd v{}", version);
                println!("  enabled: {}", enabled);
                println!("  state:   {}", state);
                println!("  layer:   {} ({})", layer, if active { "on" } else { "off" });
            }
            DaemonMsg::LayerChanged { layer, active } => {
                println!("layer {} {}", layer, if active { "on" } else { "off" });
            }
            DaemonMsg::Ack { ok, message } => {
                if !ok {
                    eprintln!("error: {}", message);
                    std::process::exit(1);
                }
                if !watch {
                    println!("{}", message);
                }
            }
        }
        if !watch {
            break;
        }
    }

    Ok(())
}
