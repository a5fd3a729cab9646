//! Decoded reply frames from the instrument.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// One decoded reply frame.
///
/// Every variant is fully owned and independent of the decode buffer; the
/// decoder copies bytes out before compacting. Unrecognized frames are
/// surfaced as [`Packet::RawData`] or [`Packet::Unhandled`] rather than
/// dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Current spectrum analyzer configuration (`#C2-F:` line).
    CurrentConfig(CurrentConfig),
    /// Model setup and firmware version (`#C2-M:` line).
    CurrentSetup(CurrentSetup),
    /// Internal calibration availability (`#CAL:` line).
    CalibrationAvailability {
        /// Mainboard calibration data is available.
        mainboard: bool,
        /// Expansion board calibration data is available.
        expansion: bool,
    },
    /// One full sweep of amplitude samples (`$S` frame).
    SweepData(SweepData),
    /// Device serial number (`#Sn` line).
    SerialNumber(String),
    /// A stored preset record (`$P` frame).
    Preset(Preset),
    /// End of a preset listing, also the preset-write acknowledgment
    /// (`#PCK` line).
    EndOfPresets,
    /// Current sniffer configuration (`#C4-F:` line).
    CurrentSnifferConfig(CurrentSnifferConfig),
    /// LCD screen bitmap (`$D` frame).
    ScreenImage(ScreenImage),
    /// Raw sniffer payload (`$R` frame).
    RawData(Vec<u8>),
    /// A CR-LF-terminated line that matched no known decoder.
    Unhandled(Vec<u8>),
}

/// Current spectrum analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentConfig {
    /// Sweep start frequency in kHz.
    pub start_freq_khz: u32,
    /// Frequency step between samples in Hz.
    pub freq_step_hz: u32,
    /// Amplitude axis top in dBm.
    pub amp_top_dbm: i16,
    /// Amplitude axis bottom in dBm.
    pub amp_bottom_dbm: i16,
    /// Number of sample points per sweep.
    pub sweep_steps: u16,
    /// Whether the expansion module is active.
    pub exp_module_active: bool,
    /// Current operating mode.
    pub mode: Mode,
    /// Minimum tunable frequency in kHz.
    pub min_freq_khz: u32,
    /// Maximum tunable frequency in kHz.
    pub max_freq_khz: u32,
    /// Maximum span in kHz.
    pub max_span_khz: u32,
    /// Resolution bandwidth in kHz.
    pub rbw_khz: u32,
    /// Amplitude offset in dB.
    pub amp_offset_db: i16,
    /// Calculator mode.
    pub calculator_mode: CalculatorMode,
}

impl Default for CurrentConfig {
    /// The documented power-on configuration.
    fn default() -> Self {
        CurrentConfig {
            start_freq_khz: DEFAULT_START_FREQ_KHZ,
            freq_step_hz: DEFAULT_FREQ_STEP_HZ,
            amp_top_dbm: DEFAULT_AMP_TOP_DBM,
            amp_bottom_dbm: DEFAULT_AMP_BOTTOM_DBM,
            sweep_steps: 0,
            exp_module_active: false,
            mode: Mode::Unknown(255),
            min_freq_khz: 0,
            max_freq_khz: 0,
            max_span_khz: 0,
            rbw_khz: 0,
            amp_offset_db: 0,
            calculator_mode: CalculatorMode::Unknown(255),
        }
    }
}

impl CurrentConfig {
    /// Parse the comma-separated field list following `#C2-F:`.
    ///
    /// Fields carry leading zeros; an empty or missing field parses as 0.
    pub fn parse(fields: &str) -> CurrentConfig {
        let p: Vec<&str> = fields.split(',').collect();
        let f = |i: usize| p.get(i).copied().unwrap_or("");
        CurrentConfig {
            start_freq_khz: parse_decimal(f(0)) as u32,
            freq_step_hz: parse_decimal(f(1)) as u32,
            amp_top_dbm: parse_decimal(f(2)) as i16,
            amp_bottom_dbm: parse_decimal(f(3)) as i16,
            sweep_steps: parse_decimal(f(4)) as u16,
            exp_module_active: f(5) == "1",
            mode: Mode::parse_field(f(6)),
            min_freq_khz: parse_decimal(f(7)) as u32,
            max_freq_khz: parse_decimal(f(8)) as u32,
            max_span_khz: parse_decimal(f(9)) as u32,
            rbw_khz: parse_decimal(f(10)) as u32,
            amp_offset_db: parse_decimal(f(11)) as i16,
            calculator_mode: CalculatorMode::parse_field(f(12)),
        }
    }
}

/// Model setup and firmware version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSetup {
    /// Mainboard model.
    pub model: Model,
    /// Expansion board model, `Model::None` if absent.
    pub expansion_model: Model,
    /// Firmware version with leading zeros stripped.
    pub firmware_version: String,
}

impl CurrentSetup {
    /// Parse the comma-separated field list following `#C2-M:`.
    pub fn parse(fields: &str) -> CurrentSetup {
        let mut p = fields.split(',');
        let model = Model::parse_field(p.next().unwrap_or(""));
        let expansion_model = match p.next() {
            Some(field) => Model::parse_field(field),
            None => Model::None,
        };
        let firmware_version = p
            .next()
            .map(|v| v.trim_start_matches('0').to_string())
            .unwrap_or_default();
        CurrentSetup {
            model,
            expansion_model,
            firmware_version,
        }
    }
}

/// One full sweep of amplitude samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepData {
    /// Samples in dBm, negative half-dB resolution.
    pub samples: Vec<f32>,
}

impl SweepData {
    /// Convert raw sample bytes to dBm.
    ///
    /// Each byte is an unsigned magnitude: 0x11 (17) means -8.5 dBm.
    pub fn from_raw(raw: &[u8]) -> SweepData {
        SweepData {
            samples: raw.iter().map(|&b| -(b as f32) / 2.0).collect(),
        }
    }
}

/// Current sniffer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSnifferConfig {
    /// Start frequency in kHz.
    pub start_freq_khz: u32,
    /// Whether the expansion module is active.
    pub exp_module_active: bool,
    /// Current operating mode.
    pub mode: Mode,
    /// Decoder delay; the internal sample rate is `16 MHz / delay`.
    pub delay: u32,
    /// Modulation the decoder is armed for.
    pub modulation: Modulation,
    /// Resolution bandwidth in kHz.
    pub rbw_khz: u32,
    /// Detection threshold in dBm.
    pub threshold_dbm: f64,
}

impl CurrentSnifferConfig {
    /// Parse the comma-separated field list following `#C4-F:`.
    pub fn parse(fields: &str) -> CurrentSnifferConfig {
        let p: Vec<&str> = fields.split(',').collect();
        let f = |i: usize| p.get(i).copied().unwrap_or("");
        CurrentSnifferConfig {
            start_freq_khz: parse_decimal(f(0)) as u32,
            exp_module_active: f(1) == "1",
            mode: Mode::parse_field(f(2)),
            delay: parse_decimal(f(3)) as u32,
            modulation: Modulation::parse_field(f(4)),
            rbw_khz: parse_decimal(f(5)) as u32,
            threshold_dbm: -0.5 * parse_decimal(f(6)) as f64,
        }
    }
}

/// LCD screen bitmap, 128x64 at 1 bit per pixel.
///
/// Rows are packed 8 per byte: pixel `(x, y)` is bit `y % 8` of byte
/// `(y / 8) * 128 + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenImage {
    data: Box<[u8; SCREEN_IMAGE_SIZE]>,
}

impl ScreenImage {
    /// Bitmap width in pixels.
    pub const WIDTH: usize = SCREEN_WIDTH;
    /// Bitmap height in pixels.
    pub const HEIGHT: usize = SCREEN_HEIGHT;

    /// Wrap a 1024-byte bitmap.
    pub fn new(data: [u8; SCREEN_IMAGE_SIZE]) -> ScreenImage {
        ScreenImage {
            data: Box::new(data),
        }
    }

    /// Build from a slice. Fails if the slice is not exactly 1024 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<ScreenImage, ProtocolError> {
        if slice.len() != SCREEN_IMAGE_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: SCREEN_IMAGE_SIZE,
                actual: slice.len(),
            });
        }
        let mut data = [0u8; SCREEN_IMAGE_SIZE];
        data.copy_from_slice(slice);
        Ok(ScreenImage::new(data))
    }

    /// Whether the pixel at `(x, y)` is set (foreground). `(0, 0)` is the
    /// upper-left corner.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        (self.data[(y / 8) * Self::WIDTH + x] >> (y % 8)) & 1 != 0
    }

    /// The raw packed bitmap.
    pub fn as_bytes(&self) -> &[u8; SCREEN_IMAGE_SIZE] {
        &self.data
    }
}

/// A named, indexed bundle of analyzer settings stored on the instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// Preset index starting at 0 (shown as 1-based in the instrument UI).
    /// Valid range is [0, 29] on standard units and [0, 99] on Plus units.
    pub index: u8,
    /// 7-bit ASCII name, at most 12 characters; longer names are truncated
    /// on write.
    pub name: String,
    /// Minimum frequency in kHz.
    pub min_freq_khz: u32,
    /// Maximum frequency in kHz.
    pub max_freq_khz: u32,
    /// Calculator mode.
    pub calc_mode: CalculatorMode,
    /// Amplitude top in dBm, range [-110, 35]. Should be at least 10 above
    /// `amp_bottom_dbm`.
    pub amp_top_dbm: i8,
    /// Amplitude bottom in dBm, range [-120, 25].
    pub amp_bottom_dbm: i8,
    /// Calculator iteration count, range [1, 16].
    pub calc_iterations: u8,
    /// Whether the preset targets the mainboard module.
    pub mainboard: bool,
    /// Marker mode.
    pub marker_mode: MarkerMode,
}

impl Preset {
    /// Decode a `$P` preset record.
    ///
    /// The buffered length is checked against the full fixed layout before
    /// any field is read.
    pub fn decode(frame: &[u8]) -> Result<Preset, ProtocolError> {
        if frame.len() < PRESET_FRAME_LEN {
            return Err(ProtocolError::FrameTooShort {
                expected: PRESET_FRAME_LEN,
                actual: frame.len(),
            });
        }
        let mut name_bytes = &frame[5..5 + PRESET_NAME_LEN];
        if let Some(nul) = name_bytes.iter().position(|&b| b == 0) {
            name_bytes = &name_bytes[..nul];
        }
        Ok(Preset {
            index: frame[3],
            name: String::from_utf8_lossy(name_bytes).into_owned(),
            min_freq_khz: u32::from_le_bytes([frame[19], frame[20], frame[21], frame[22]]),
            max_freq_khz: u32::from_le_bytes([frame[23], frame[24], frame[25], frame[26]]),
            calc_mode: CalculatorMode::from(frame[27]),
            amp_top_dbm: frame[28] as i8,
            amp_bottom_dbm: frame[29] as i8,
            calc_iterations: frame[30],
            mainboard: frame[31] != 0,
            marker_mode: MarkerMode::from(frame[32]),
        })
    }

    /// Build the fixed 36-byte preset-write frame, `'#' length` header
    /// included. The name is truncated to 12 bytes.
    pub fn encode_write_frame(&self) -> [u8; PRESET_WRITE_FRAME_LEN] {
        let mut buf = [0u8; PRESET_WRITE_FRAME_LEN];
        buf[0] = TEXT_FRAME_MARKER;
        buf[1] = PRESET_WRITE_FRAME_LEN as u8;
        buf[2] = b'C';
        buf[3] = b'P';
        buf[4] = 0x01;
        buf[5] = self.index;
        let name = self.name.as_bytes();
        let len = name.len().min(PRESET_NAME_LEN);
        buf[6..6 + len].copy_from_slice(&name[..len]);
        buf[20..24].copy_from_slice(&self.min_freq_khz.to_le_bytes());
        buf[24..28].copy_from_slice(&self.max_freq_khz.to_le_bytes());
        buf[28] = u8::from(self.calc_mode);
        buf[29] = self.amp_top_dbm as u8;
        buf[30] = self.amp_bottom_dbm as u8;
        buf[31] = self.calc_iterations;
        buf[32] = self.mainboard as u8;
        buf[33] = u8::from(self.marker_mode);
        buf[34] = 0x42;
        buf
    }
}
