//! Connection lifecycle and the read loop.

use std::time::Duration;

use tokio::io::{self, AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rfexplorer_protocol::{
    frame_payload, BaudRate, Command, CurrentConfig, FrameDecoder, Packet, Preset, RadioModule,
};

use crate::error::DriverError;
use crate::transport::Transport;

/// Bound on undelivered inbound packets. A consumer that stops reading
/// backpressures the read loop instead of growing memory.
const PACKET_CHANNEL_CAPACITY: usize = 16;

/// Read chunk size for the serial link.
const READ_CHUNK: usize = 1024;

/// How long the instrument needs to apply a retune before it reliably
/// accepts the next command.
const RETUNE_SETTLE: Duration = Duration::from_millis(500);

/// An open session with an RF Explorer.
///
/// [`open`](RfExplorer::open) spawns a read loop that decodes the inbound
/// byte stream and performs the opening handshake: it requests the current
/// configuration and returns once the instrument has answered. From then on
/// decoded packets are consumed with [`recv`](RfExplorer::recv) and the
/// latest configuration is always available from
/// [`config`](RfExplorer::config) without waiting.
#[derive(Debug)]
pub struct RfExplorer<T: Transport> {
    writer: WriteHalf<T>,
    packets: mpsc::Receiver<Packet>,
    config: watch::Receiver<CurrentConfig>,
    ack: mpsc::Receiver<()>,
    cancel: CancellationToken,
    read_task: Option<JoinHandle<()>>,
}

impl<T: Transport> RfExplorer<T> {
    /// Open a session over an already-configured transport.
    ///
    /// Blocks until the instrument reports its configuration. Packets of
    /// other types arriving first are discarded: an instrument already
    /// mid-stream can flood the link before answering, and stale traffic
    /// must not stall or outlive the handshake. Fails with
    /// [`DriverError::SetupFailed`] if the link closes before a
    /// configuration line arrives.
    pub async fn open(transport: T) -> Result<RfExplorer<T>, DriverError> {
        let (reader, writer) = io::split(transport);
        let (packet_tx, packet_rx) = mpsc::channel(PACKET_CHANNEL_CAPACITY);
        let (config_tx, config_rx) = watch::channel(CurrentConfig::default());
        // Single ack slot: a stale unconsumed ack must not satisfy the next
        // preset write.
        let (ack_tx, ack_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let read_task = tokio::spawn(read_loop(
            reader,
            packet_tx,
            config_tx,
            ack_tx,
            cancel.clone(),
        ));

        let mut session = RfExplorer {
            writer,
            packets: packet_rx,
            config: config_rx,
            ack: ack_rx,
            cancel,
            read_task: Some(read_task),
        };
        session.send(Command::RequestConfig).await?;
        loop {
            match session.packets.recv().await {
                Some(Packet::CurrentConfig(_)) => return Ok(session),
                Some(_) => {}
                None => {
                    session.cancel.cancel();
                    return Err(DriverError::SetupFailed);
                }
            }
        }
    }

    /// Receive the next decoded packet. Returns `None` once the read loop
    /// has exited and all buffered packets are drained.
    pub async fn recv(&mut self) -> Option<Packet> {
        self.packets.recv().await
    }

    /// The most recently reported analyzer configuration.
    pub fn config(&self) -> CurrentConfig {
        self.config.borrow().clone()
    }

    /// Encode and write a command to the instrument.
    pub async fn send(&mut self, command: Command) -> Result<(), DriverError> {
        let bytes = command.encode()?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Request a fresh configuration report. Also resumes sweep delivery
    /// after [`Command::Hold`].
    pub async fn request_config(&mut self) -> Result<(), DriverError> {
        self.send(Command::RequestConfig).await
    }

    /// Request the device serial number.
    pub async fn request_serial_number(&mut self) -> Result<(), DriverError> {
        self.send(Command::RequestSerialNumber).await
    }

    /// Request a listing of all stored presets. The listing ends with a
    /// [`Packet::EndOfPresets`].
    pub async fn request_presets(&mut self) -> Result<(), DriverError> {
        self.send(Command::RequestPresets).await
    }

    /// Request the internal calibration data availability flags.
    pub async fn request_calibration_data(&mut self) -> Result<(), DriverError> {
        self.send(Command::RequestInternalCalibrationData).await
    }

    /// Reset the instrument's internal data buffers.
    pub async fn reset_internal_buffers(&mut self) -> Result<(), DriverError> {
        self.send(Command::ResetInternalBuffers).await
    }

    /// Stop sweep delivery until the next configuration request.
    pub async fn hold(&mut self) -> Result<(), DriverError> {
        self.send(Command::Hold).await
    }

    /// Select realtime sample processing on the instrument.
    pub async fn realtime(&mut self) -> Result<(), DriverError> {
        self.send(Command::Realtime).await
    }

    /// Select max-hold sample processing on the instrument.
    pub async fn set_max_hold(&mut self) -> Result<(), DriverError> {
        self.send(Command::SetMaxHold).await
    }

    /// Power the instrument off. The link goes dead afterwards.
    pub async fn shutdown_device(&mut self) -> Result<(), DriverError> {
        self.send(Command::Shutdown).await
    }

    /// Select the active radio module. The instrument answers with a fresh
    /// configuration for the selected module.
    pub async fn switch_module(&mut self, module: RadioModule) -> Result<(), DriverError> {
        self.send(Command::SwitchModule(module)).await
    }

    /// Turn the LCD on or off.
    pub async fn set_lcd_enabled(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.send(Command::SetLcdEnabled(enabled)).await
    }

    /// Start or stop periodic screen dumps.
    pub async fn set_screen_dump_enabled(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.send(Command::SetScreenDumpEnabled(enabled)).await
    }

    /// Switch the instrument to another baud rate. The caller must
    /// reconfigure its own end of the link afterwards.
    pub async fn set_baud_rate(&mut self, rate: BaudRate) -> Result<(), DriverError> {
        self.send(Command::SetBaudRate(rate)).await
    }

    /// Set the sweep width in data points, range [16, 4096].
    pub async fn set_sweep_points(&mut self, steps: u32) -> Result<(), DriverError> {
        self.send(Command::SetSweepPoints(steps)).await
    }

    /// Set the sweep width with extended resolution, range [112, 65536].
    pub async fn set_sweep_points_ext(&mut self, steps: u32) -> Result<(), DriverError> {
        self.send(Command::SetSweepPointsExt(steps)).await
    }

    /// Write a raw command payload with the standard `'#' <length>` framing.
    /// Escape hatch for commands without a [`Command`] variant.
    pub async fn send_command(&mut self, payload: &[u8]) -> Result<(), DriverError> {
        let bytes = frame_payload(payload)?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Retune the analyzer and give the instrument time to settle.
    ///
    /// The updated configuration arrives as a [`Packet::CurrentConfig`] and
    /// is reflected by [`config`](RfExplorer::config) once decoded.
    pub async fn set_analyzer_config(
        &mut self,
        start_freq_khz: u32,
        end_freq_khz: u32,
        amp_top_dbm: i16,
        amp_bottom_dbm: i16,
        rbw_khz: u32,
    ) -> Result<(), DriverError> {
        self.send(Command::SetAnalyzerConfig {
            start_freq_khz,
            end_freq_khz,
            amp_top_dbm,
            amp_bottom_dbm,
            rbw_khz,
        })
        .await?;
        tokio::time::sleep(RETUNE_SETTLE).await;
        Ok(())
    }

    /// Overwrite a stored preset slot and wait for the instrument's `#PCK`
    /// acknowledgment.
    ///
    /// Any acknowledgment left over from earlier traffic is discarded before
    /// the write, so only a `#PCK` arriving afterwards completes the call.
    pub async fn update_preset(
        &mut self,
        preset: &Preset,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        while self.ack.try_recv().is_ok() {}
        self.send(Command::UpdatePreset(preset.clone())).await?;
        match tokio::time::timeout(timeout, self.ack.recv()).await {
            Ok(Some(())) => Ok(()),
            Ok(None) => Err(DriverError::ConnectionClosed),
            Err(_) => Err(DriverError::AckTimeout),
        }
    }

    /// Shut the session down: stop the read loop, wait for it to exit, then
    /// close the write side of the transport.
    pub async fn close(mut self) -> Result<(), DriverError> {
        self.cancel.cancel();
        if let Some(task) = self.read_task.take() {
            let _ = task.await;
        }
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl<T: Transport> Drop for RfExplorer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drain the transport, decode frames, and fan packets out.
///
/// Exits on cancellation, EOF, a read error, or when the packet consumer is
/// gone. Configuration lines additionally update the config cache and
/// `#PCK` lines fill the ack slot before normal delivery.
async fn read_loop<T: Transport>(
    mut reader: ReadHalf<T>,
    packets: mpsc::Sender<Packet>,
    config: watch::Sender<CurrentConfig>,
    ack: mpsc::Sender<()>,
    cancel: CancellationToken,
) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = reader.read(&mut buf) => {
                let n = match result {
                    Ok(0) => {
                        log::debug!("serial link closed");
                        return;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        log::warn!("serial read failed: {e}");
                        return;
                    }
                };
                decoder.push(&buf[..n]);
                while let Some(packet) = decoder.try_decode() {
                    match &packet {
                        Packet::CurrentConfig(c) => {
                            let _ = config.send(c.clone());
                        }
                        Packet::EndOfPresets => {
                            // full slot means an ack is already pending
                            let _ = ack.try_send(());
                        }
                        _ => {}
                    }
                    // a full channel backpressures; cancellation must still
                    // win while blocked here
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        result = packets.send(packet) => {
                            if result.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}
