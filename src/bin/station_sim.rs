//! Station-side simulator.
//!
//! Drives the payload encoder the way the station firmware does: one bootup
//! frame on start, then a data frame per cycle with slowly drifting sensor
//! values. Frames are written to stdout as hex lines that the `ambimon-rs`
//! replay tool consumes; `--drop-every` leaves gaps to exercise the
//! generation-based loss recovery on the receive side.

use ambimon_lib::encoder::{DeviceConfig, PayloadEncoder, SensorReading};
use anyhow::Result;
use clap::Parser;

/// Emit synthetic ambient-station frames as hex lines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Station device id (0..=15)
    #[arg(long, default_value_t = 1)]
    dev_id: u8,
    /// Number of data frames to emit
    #[arg(long, default_value_t = 10)]
    frames: u32,
    /// Seconds of uptime between data frames
    #[arg(long, default_value_t = 180)]
    cycle: u16,
    /// Suppress every n-th data frame to simulate radio loss
    #[arg(long)]
    drop_every: Option<u32>,
    /// Skip the initial bootup frame
    #[arg(long)]
    no_bootup: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_target(false).init();

    let mut encoder = PayloadEncoder::new(cli.dev_id);

    if !cli.no_bootup {
        let config = DeviceConfig {
            firmware_version: 1,
            firmware_revision: 0,
            data_pack_cycle_tm: cli.cycle,
            cfg_oled_display: true,
            cfg_dht_sensor: true,
            cfg_sr501_sensor: true,
            cfg_adc_light_sensor: true,
            cfg_adc_car_bat_ain: true,
            lora_tx_power: 14,
            lora_spread_factor: 7,
            ..Default::default()
        };
        let frame = encoder.encode_bootup(&config);
        println!("{}", hex::encode(frame.to_bytes()));
    }

    let mut uptime = 12u32;
    for n in 1..=cli.frames {
        // slow drift plus a short motion burst every 4th reading
        let phase = (n % 8) as f32;
        let motion = n % 4 == 0;
        let reading = SensorReading {
            uptime,
            temperature: 19.0 + phase * 0.5,
            humidity: 40.0 + phase,
            motion_active: motion,
            motion_active_time: if motion { 40 } else { 0 },
            motion_active_count: (n / 4) as u16,
            light_level: 30 + (n % 3) as u8 * 20,
            car_batt_level: 12.6 - phase * 0.05,
        };

        let frame = encoder.encode_data(&reading);
        let dropped = cli.drop_every.is_some_and(|k| k > 0 && n % k == 0);
        if dropped {
            println!("# dropped frame seq={}", encoder.sequ_num());
        } else {
            println!("{}", hex::encode(frame.to_bytes()));
        }

        uptime += cli.cycle as u32;
    }

    Ok(())
}
