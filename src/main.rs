use anyhow::Context;
use clap::Parser;
use palletizer::{
    drain_events, init_logging, list_ports, AppConfig, ConsoleCommand, Controller,
    ControllerEvent, BUILD_DATE, VERSION,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Console for the palletizer master controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port of the master controller (overrides the config file)
    #[arg(long)]
    port: Option<String>,
    /// Baud rate (overrides the config file)
    #[arg(long)]
    baud: Option<u32>,
    /// Configuration file; defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// List candidate serial ports and exit
    #[arg(long, default_value_t = false)]
    list_ports: bool,
}

/// How often worker events are drained while waiting for input
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();
    tracing::info!("palletizer {} (built {})", VERSION, BUILD_DATE);

    if args.list_ports {
        for port in list_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut controller = Controller::new(&config);
    let mut events = controller.subscribe();

    let params = config.connection_params(args.port.as_deref(), args.baud);
    if params.port.is_empty() {
        println!("No port configured; use --port or set connection.port in the config file");
    } else {
        controller
            .connect(&params)
            .with_context(|| format!("connecting to {}", params.port))?;
    }

    println!("Type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ConsoleCommand::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => match command.execute(&mut controller) {
                        Ok(reply) if !reply.is_empty() => println!("{}", reply),
                        Ok(_) => {}
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ = ticker.tick() => {
                for response in controller.poll() {
                    println!("< {}", response);
                }
                for event in drain_events(&mut events) {
                    report(&event);
                }
            }
        }
    }

    controller.disconnect();
    Ok(())
}

fn report(event: &ControllerEvent) {
    match event {
        ControllerEvent::Connected(_)
        | ControllerEvent::Disconnected(_)
        | ControllerEvent::ExecutionFinished
        | ControllerEvent::Error(_) => println!("* {}", event),
        ControllerEvent::RunningRowChanged(Some(row)) => println!("* Running row {}", row + 1),
        _ => {}
    }
}
