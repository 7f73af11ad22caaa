//! Gateway-side frame replay tool.
//!
//! Reads hex-encoded 40-byte radio frames (one per line, optionally
//! prefixed with a per-line RSSI value) from a file or stdin and runs them
//! through the full receive pipeline: decode, reconstruct, build messages,
//! qualify. Accepted messages are printed with their publish topic, the
//! place where a real gateway would hand them to MQTT.

use ambimon_lib::processor::{self, JsonMessage, RxMetadata};
use ambimon_lib::qualifier::{Disposition, MessageQualifier};
use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Replay captured ambient-station frames through the receive pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file with one hex frame per line, "-" for stdin
    #[arg(default_value = "-")]
    input: PathBuf,
    /// RSSI to attribute to frames without a per-line value
    #[arg(long, default_value_t = -60)]
    rssi: i8,
    /// Process every message, bypassing duplicate filtering
    #[arg(long)]
    process_all: bool,
    /// Print compact telemetry lines instead of full JSON records
    #[arg(long)]
    telemetry: bool,
    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // INFO by default, DEBUG with -v, TRACE with -vv; RUST_LOG overrides
    let filter = EnvFilter::builder()
        .with_default_directive(cli.verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        error!("Replay failed: {:?}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let (tx, rx) = mpsc::channel::<(RxMetadata, Vec<u8>)>(64);

    // the qualifier's accept/reject decisions depend on processing order,
    // so all frames funnel into this one task
    let processor_task = tokio::spawn(process_frames(rx, cli.process_all, cli.telemetry));

    read_frames(&cli, tx).await?;

    let (frames, accepted) = processor_task.await?;
    info!(frames, accepted, "replay finished");
    Ok(())
}

/// Parse the input line by line and feed frames into the pipeline channel.
async fn read_frames(cli: &Cli, tx: mpsc::Sender<(RxMetadata, Vec<u8>)>) -> Result<()> {
    let mut msg_id = 0u32;

    let reader: Box<dyn tokio::io::AsyncBufRead + Unpin> = if cli.input.as_os_str() == "-" {
        Box::new(BufReader::new(tokio::io::stdin()))
    } else {
        let file = tokio::fs::File::open(&cli.input)
            .await
            .with_context(|| format!("Failed to open {}", cli.input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // either "<hex>" or "<rssi> <hex>"
        let (rssi, hex_frame) = match line.split_once(char::is_whitespace) {
            Some((first, rest)) => match first.parse::<i8>() {
                Ok(rssi) => (rssi, rest.trim()),
                Err(_) => (cli.rssi, line),
            },
            None => (cli.rssi, line),
        };

        let buf = match hex::decode(hex_frame) {
            Ok(buf) => buf,
            Err(e) => {
                warn!(line, "skipping undecodable line: {e}");
                continue;
            }
        };

        msg_id += 1;
        let meta = RxMetadata {
            msg_id,
            timestamp: chrono::Utc::now().timestamp(),
            rssi,
        };
        debug!(msg_id, bytes = hex_frame, "frame received");
        tx.send((meta, buf)).await?;
    }

    Ok(())
}

/// Decode, reconstruct, build and qualify every frame from the channel.
///
/// Returns (frames seen, messages accepted).
async fn process_frames(
    mut rx: mpsc::Receiver<(RxMetadata, Vec<u8>)>,
    process_all: bool,
    telemetry: bool,
) -> (u64, u64) {
    let mut qualifier = MessageQualifier::new();
    let mut frames = 0u64;
    let mut accepted = 0u64;

    while let Some((meta, buf)) = rx.recv().await {
        frames += 1;

        let record = match processor::gain_record(meta, &buf) {
            Ok(record) => record,
            Err(e) => {
                warn!(msg_id = meta.msg_id, "invalid frame: {e}");
                continue;
            }
        };
        info!(
            msg_id = meta.msg_id,
            dev_id = record.dev_id,
            packet_type = %record.packet_type,
            "frame classified"
        );

        let messages = match processor::build_messages(&record) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(msg_id = meta.msg_id, "no messages built: {e}");
                continue;
            }
        };

        for message in &messages {
            if !process_all {
                match qualifier.qualify(message) {
                    Ok(Disposition::Process) => {}
                    Ok(Disposition::Ignore) => {
                        debug!(
                            msg_id = message.msg_id,
                            sequ_num = message.sequ_num,
                            "duplicate ignored"
                        );
                        continue;
                    }
                    Err(e) => {
                        warn!(msg_id = message.msg_id, "qualification failed: {e}");
                        continue;
                    }
                }
            }
            accepted += 1;
            print_message(message, telemetry);
        }
    }

    (frames, accepted)
}

fn print_message(message: &JsonMessage, telemetry: bool) {
    if telemetry {
        println!("{}", processor::build_telemetry(message));
        return;
    }

    match processor::publish_topic(message) {
        Ok(topic) => println!("[{topic}]\n{}", message.json_record),
        Err(_) => println!("{}", message.json_record),
    }
}
