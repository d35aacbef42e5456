use anyhow::Result;
use clap::{ArgAction, Parser};
use livestream::{ConnectionState, MjpegSink, Monitor, MonitorHandle, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn, Level};

use crate::config::Config;
use crate::console::Input;

mod config;
mod console;
mod log;
mod signal;
mod utils;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set config file path
    #[arg(short, long)]
    config: Option<String>,
    /// Stream URL, overrides the config file. e.g.: http://127.0.0.1:8000/video/stream
    #[arg(short, long)]
    url: Option<String>,
    /// Verbose mode [default: config log.level, -v "info", -vv "debug", -vvv "trace"]
    #[arg(short = 'v', action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg: Config = utils::load("livewatch", args.config);
    if let Some(url) = args.url {
        cfg.stream.url = url;
    }

    let level = match args.verbose {
        0 => cfg.log.level.clone(),
        1 => Level::INFO.to_string(),
        2 => Level::DEBUG.to_string(),
        _ => Level::TRACE.to_string(),
    };
    log::set(log::directives(&level.to_lowercase()));
    debug!("config : {:?}", cfg);
    cfg.validate()?;

    let client = reqwest::Client::builder().build()?;
    let (monitor, handle) = Monitor::new(&cfg.stream, client.clone(), MjpegSink::new(client));
    let monitor = tokio::spawn(monitor.run());

    info!("watching {}", cfg.stream.url);
    println!("{}", console::HELP);
    handle.start()?;

    tokio::select! {
        result = interact(&handle) => result?,
        signal = signal::wait_for_stop_signal() => warn!("received signal: {}", signal),
    }

    handle.shutdown()?;
    monitor.await?;
    print_snapshot(&handle.snapshot());
    Ok(())
}

async fn interact(handle: &MonitorHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = handle.subscribe();
    print_snapshot(&snapshots.borrow_and_update());

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                print_snapshot(&snapshots.borrow_and_update());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: keep watching until a stop signal.
                    return watch(snapshots).await;
                };
                match line.parse::<Input>() {
                    Ok(Input::Start) => handle.start()?,
                    Ok(Input::Stop) => handle.stop()?,
                    Ok(Input::Toggle) => match handle.snapshot().state {
                        ConnectionState::Idle | ConnectionState::Stopped => handle.start()?,
                        _ => handle.stop()?,
                    },
                    Ok(Input::Status) => print_snapshot(&handle.snapshot()),
                    Ok(Input::Quit) => return Ok(()),
                    Err(e) => println!("{}", e),
                }
            }
        }
    }
}

async fn watch(mut snapshots: tokio::sync::watch::Receiver<Snapshot>) -> Result<()> {
    while snapshots.changed().await.is_ok() {
        print_snapshot(&snapshots.borrow_and_update());
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("[{}] {}", snapshot.state, snapshot.status);
}
