//! Outbound command encoding.
//!
//! Every command travels as `'#' <length> <payload>` where the length byte
//! counts the two framing bytes. Parameters are validated or clamped before
//! any bytes are produced; a command either encodes fully or not at all.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::packets::Preset;
use crate::types::{BaudRate, RadioModule};

/// A request to the instrument.
///
/// [`encode`](Command::encode) yields the exact byte sequence to write to
/// the port, framing included.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Request the current configuration. Also resumes sweep delivery after
    /// [`Command::Hold`].
    RequestConfig,
    /// Request the device serial number.
    RequestSerialNumber,
    /// Request a listing of all stored presets.
    RequestPresets,
    /// Request the internal calibration data availability flags.
    RequestInternalCalibrationData,
    /// Reset the instrument's internal data buffers.
    ResetInternalBuffers,
    /// Stop sweep delivery until the next configuration request.
    Hold,
    /// Select realtime sample processing (no onboard calculator).
    Realtime,
    /// Select max-hold sample processing on the instrument.
    SetMaxHold,
    /// Power the instrument off.
    Shutdown,
    /// Select the active radio module.
    SwitchModule(RadioModule),
    /// Turn the LCD on or off.
    SetLcdEnabled(bool),
    /// Start or stop periodic `$D` screen dumps.
    SetScreenDumpEnabled(bool),
    /// Switch the serial link to another baud rate. Takes effect on the
    /// instrument immediately; the host must follow.
    SetBaudRate(BaudRate),
    /// Set the sweep width in data points, range [16, 4096] in multiples of
    /// 16. Out-of-range values are clamped.
    SetSweepPoints(u32),
    /// Set the sweep width in data points with extended resolution, range
    /// [112, 65536] in multiples of 2. Out-of-range values are clamped;
    /// 65536 is sent as a wrapped 16-bit zero.
    SetSweepPointsExt(u32),
    /// Retune the analyzer. The instrument answers with a fresh `#C2-F:`
    /// configuration line.
    SetAnalyzerConfig {
        /// Sweep start frequency in kHz, at most [`MAX_FREQ_KHZ`].
        start_freq_khz: u32,
        /// Sweep end frequency in kHz, at most [`MAX_FREQ_KHZ`].
        end_freq_khz: u32,
        /// Amplitude axis top in dBm, clamped to [-120, 0].
        amp_top_dbm: i16,
        /// Amplitude axis bottom in dBm. Forced to -120 when it does not sit
        /// below the (clamped) top.
        amp_bottom_dbm: i16,
        /// Requested resolution bandwidth in kHz, 0 to let the instrument
        /// choose. See [`analyzer_rbw_field`] for how the request is
        /// reconciled with the sweep width.
        rbw_khz: u32,
    },
    /// Overwrite a stored preset slot.
    UpdatePreset(Preset),
}

impl Command {
    /// Encode to the framed wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Command::RequestConfig => frame_payload(b"C0"),
            Command::RequestSerialNumber => frame_payload(b"Cn"),
            Command::RequestPresets => frame_payload(b"CP\x00"),
            Command::RequestInternalCalibrationData => frame_payload(b"Cq"),
            Command::ResetInternalBuffers => frame_payload(b"Cr"),
            Command::Hold => frame_payload(b"CH"),
            Command::Realtime => frame_payload(b"C+\x00"),
            Command::SetMaxHold => frame_payload(b"C+\x04"),
            Command::Shutdown => frame_payload(b"CS"),
            Command::SwitchModule(RadioModule::Mainboard) => frame_payload(b"CM\x00"),
            Command::SwitchModule(RadioModule::Expansion) => frame_payload(b"CM\x01"),
            Command::SetLcdEnabled(true) => frame_payload(b"L1"),
            Command::SetLcdEnabled(false) => frame_payload(b"L0"),
            Command::SetScreenDumpEnabled(true) => frame_payload(b"D1"),
            Command::SetScreenDumpEnabled(false) => frame_payload(b"D0"),
            Command::SetBaudRate(rate) => frame_payload(&[b'c', rate.selector()]),
            Command::SetSweepPoints(steps) => {
                let steps = (*steps).clamp(16, 4096);
                frame_payload(&[b'C', b'J', ((steps - 16) / 16) as u8])
            }
            Command::SetSweepPointsExt(steps) => {
                let steps = (*steps).clamp(MIN_SWEEP_STEPS, 65536);
                frame_payload(&[b'C', b'j', (steps >> 8) as u8, steps as u8])
            }
            Command::SetAnalyzerConfig {
                start_freq_khz,
                end_freq_khz,
                amp_top_dbm,
                amp_bottom_dbm,
                rbw_khz,
            } => {
                check_freq("start_freq_khz", *start_freq_khz)?;
                check_freq("end_freq_khz", *end_freq_khz)?;
                let top = (*amp_top_dbm).clamp(MIN_AMP_DBM, 0);
                let bottom = if *amp_bottom_dbm >= top || *amp_bottom_dbm < MIN_AMP_DBM {
                    MIN_AMP_DBM
                } else {
                    *amp_bottom_dbm
                };
                let rbw = analyzer_rbw_field(*start_freq_khz, *end_freq_khz, *rbw_khz);
                frame_payload(
                    format!("C2-F:{start_freq_khz:07},{end_freq_khz:07},{top:04},{bottom:04}{rbw}")
                        .as_bytes(),
                )
            }
            Command::UpdatePreset(preset) => Ok(preset.encode_write_frame().to_vec()),
        }
    }
}

/// Wrap a command payload in the `'#' <length>` framing.
///
/// Fails if the payload cannot be represented by the one-byte length field.
pub fn frame_payload(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_COMMAND_LEN {
        return Err(ProtocolError::CommandTooLong {
            max: MAX_COMMAND_LEN,
            actual: payload.len(),
        });
    }
    let mut buf = Vec::with_capacity(2 + payload.len());
    buf.push(TEXT_FRAME_MARKER);
    buf.push((2 + payload.len()) as u8);
    buf.extend_from_slice(payload);
    Ok(buf)
}

fn check_freq(name: &'static str, value: u32) -> Result<(), ProtocolError> {
    if value > MAX_FREQ_KHZ {
        return Err(ProtocolError::InvalidParameter {
            name,
            value: value as i64,
            min: 0,
            max: MAX_FREQ_KHZ as i64,
        });
    }
    Ok(())
}

/// Reconcile a requested RBW with the sweep width.
///
/// The instrument only honors an RBW consistent with its step count, so the
/// request is recomputed: derive the step count the request implies, clamp
/// it to the supported sweep range, then derive the RBW that step count
/// actually yields. The field is included only when the result lands in
/// `[RBW_ACCEPT_MIN_KHZ, RBW_ACCEPT_MAX_KHZ)`; otherwise it is dropped and
/// the instrument keeps its own choice.
fn analyzer_rbw_field(start_freq_khz: u32, end_freq_khz: u32, rbw_khz: u32) -> String {
    if !(RBW_REQUEST_MIN_KHZ..=RBW_REQUEST_MAX_KHZ).contains(&rbw_khz) {
        return String::new();
    }
    // Signed math: a negative span must not wrap, it just yields an
    // unacceptable RBW below.
    let span = end_freq_khz as i64 - start_freq_khz as i64;
    let rbw = rbw_khz as i64;
    let steps = ((span + rbw / 2) / rbw).clamp(MIN_SWEEP_STEPS as i64, MAX_SWEEP_STEPS as i64);
    let rbw = (span + steps / 2) / steps;
    if (RBW_ACCEPT_MIN_KHZ as i64..RBW_ACCEPT_MAX_KHZ as i64).contains(&rbw) {
        format!(",{rbw:05}")
    } else {
        log::debug!("ignoring rbw request of {rbw_khz} kHz (recomputed to {rbw} kHz)");
        String::new()
    }
}
