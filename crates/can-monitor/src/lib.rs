//! CAN Bus Monitor
//!
//! Opens one of the adapter backends behind `CanInterface`, optionally sends
//! a frame, and logs every received frame until interrupted.

mod settings;

pub use settings::{
    load_settings, Backend, LogFormat, PeakSettings, Settings, TransmitSettings, UsbCanSettings,
    DEFAULT_CONFIG_NAME, ENV_PREFIX,
};

use anyhow::Context;
use can_interface::{CanInterface, Frame, FrameType};
use std::str::FromStr;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use usb_can_analyzer::UsbCan;

/// Install the global tracing subscriber
pub fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    let level = Level::from_str(&settings.log_level)
        .with_context(|| format!("invalid log level: {}", settings.log_level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    match settings.log_format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
    .context("failed to set tracing subscriber")
}

/// Construct the configured backend (not yet opened)
pub fn build_interface(settings: &Settings) -> anyhow::Result<Box<dyn CanInterface>> {
    match settings.backend {
        Backend::UsbCan => {
            let usb = &settings.usb_can;
            let can = UsbCan::open_serial(&usb.port, usb.baud_rate, usb.adapter_config())?;
            Ok(Box::new(can))
        }
        #[cfg(feature = "peak")]
        Backend::Peak => Ok(Box::new(peak_can::PcanDevice::new(settings.peak.channel))),
        #[cfg(not(feature = "peak"))]
        Backend::Peak => anyhow::bail!("built without PCAN support; enable the `peak` feature"),
    }
}

/// One-line rendering of a frame, candump style
pub fn format_frame(frame: &Frame) -> String {
    let id = match frame.frame_type {
        FrameType::Extended => format!("{:08X}", frame.id),
        _ => format!("{:03X}", frame.id),
    };
    let bytes: Vec<String> = frame.data().iter().map(|b| format!("{:02X}", b)).collect();
    let suffix = if frame.is_error() { "  ERRORFRAME" } else { "" };
    format!("{:>8}   [{}]  {}{}", id, frame.dlc(), bytes.join(" "), suffix)
}

/// Receive and log frames until interrupted or `max_frames` is reached
pub async fn monitor(can: &mut dyn CanInterface, max_frames: Option<u64>) -> anyhow::Result<u64> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut count = 0u64;
    while max_frames.map_or(true, |max| count < max) {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
            frame = can.receive(true) => {
                if let Some(frame) = frame.context("receive failed")? {
                    count += 1;
                    info!("{}", format_frame(&frame));
                }
            }
        }
    }
    Ok(count)
}

/// Open the configured backend and monitor it
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut can = build_interface(&settings)?;
    let count = session(can.as_mut(), &settings).await?;
    info!("Received {} frames", count);
    Ok(())
}

/// Open `can`, send the optional frame, monitor, then close
///
/// A receive failure takes precedence over a close failure.
pub async fn session(can: &mut dyn CanInterface, settings: &Settings) -> anyhow::Result<u64> {
    can.open(settings.bitrate)
        .await
        .with_context(|| format!("failed to open {} at {}", can.name(), settings.bitrate))?;

    if let Some(transmit) = &settings.transmit {
        let frame = transmit.to_frame()?;
        can.send(&frame).await.context("transmit failed")?;
        info!("Sent {}", format_frame(&frame));
    }

    let result = monitor(can, settings.max_frames).await;
    let closed = can.close().await;

    match result {
        Ok(count) => {
            closed.context("failed to close interface")?;
            Ok(count)
        }
        Err(e) => {
            if let Err(close_err) = closed {
                warn!("Failed to close {}: {}", can.name(), close_err);
            }
            Err(e)
        }
    }
}
