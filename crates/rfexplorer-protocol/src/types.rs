//! Common types used in the protocol.

use std::fmt;

use crate::error::ProtocolError;

/// RF Explorer hardware model, as codified in `#C2-M:` setup lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// 433 MHz band unit.
    M433,
    /// 868 MHz band unit.
    M868,
    /// 915 MHz band unit.
    M915,
    /// Wideband sub-1 GHz unit.
    WSub1G,
    /// 2.4 GHz band unit.
    M24G,
    /// Wideband sub-3 GHz unit.
    WSub3G,
    /// 6 GHz unit.
    M6G,
    /// Signal generator.
    RFGen,
    /// No module installed (code 255).
    None,
    /// Unrecognized model code.
    Unknown(u8),
}

impl From<u8> for Model {
    fn from(code: u8) -> Self {
        match code {
            0 => Model::M433,
            1 => Model::M868,
            2 => Model::M915,
            3 => Model::WSub1G,
            4 => Model::M24G,
            5 => Model::WSub3G,
            6 => Model::M6G,
            60 => Model::RFGen,
            255 => Model::None,
            other => Model::Unknown(other),
        }
    }
}

impl Model {
    /// Parse an ASCII-decimal model field. An empty field means no module.
    pub fn parse_field(s: &str) -> Model {
        if s.trim().is_empty() {
            return Model::None;
        }
        Model::from(parse_decimal(s).clamp(0, 255) as u8)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::M433 => write!(f, "433M"),
            Model::M868 => write!(f, "868M"),
            Model::M915 => write!(f, "915M"),
            Model::WSub1G => write!(f, "WSUB1G"),
            Model::M24G => write!(f, "2.4G"),
            Model::WSub3G => write!(f, "WSUB3G"),
            Model::M6G => write!(f, "6G"),
            Model::RFGen => write!(f, "RFE6GEN"),
            Model::None => write!(f, ""),
            Model::Unknown(code) => write!(f, "Model({code})"),
        }
    }
}

/// Operating mode reported in configuration frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Spectrum analyzer sweeps.
    SpectrumAnalyzer,
    /// RF signal generator.
    RFGenerator,
    /// WiFi channel analyzer.
    WifiAnalyzer,
    /// Analyzer tracking.
    AnalyzerTracking,
    /// RF sniffer / raw decoder.
    RFSniffer,
    /// CW transmitter.
    CWTransmitter,
    /// Frequency sweep (generator).
    SweepFrequency,
    /// Amplitude sweep (generator).
    SweepAmplitude,
    /// Generator tracking.
    GeneratorTracking,
    /// Unrecognized mode code.
    Unknown(u8),
}

impl From<u8> for Mode {
    fn from(code: u8) -> Self {
        match code {
            0 => Mode::SpectrumAnalyzer,
            1 => Mode::RFGenerator,
            2 => Mode::WifiAnalyzer,
            5 => Mode::AnalyzerTracking,
            6 => Mode::RFSniffer,
            60 => Mode::CWTransmitter,
            61 => Mode::SweepFrequency,
            62 => Mode::SweepAmplitude,
            63 => Mode::GeneratorTracking,
            other => Mode::Unknown(other),
        }
    }
}

impl Mode {
    /// Parse an ASCII-decimal mode field. An empty field maps to
    /// `Unknown(255)`.
    pub fn parse_field(s: &str) -> Mode {
        if s.trim().is_empty() {
            return Mode::Unknown(255);
        }
        Mode::from(parse_decimal(s).clamp(0, 255) as u8)
    }
}

/// On-instrument post-processing applied to samples before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorMode {
    /// No post-processing.
    Normal,
    /// Maximum of recent sweeps.
    Max,
    /// Average of recent sweeps.
    Avg,
    /// Overwrite.
    Overwrite,
    /// Max hold.
    MaxHold,
    /// Unrecognized calculator mode code.
    Unknown(u8),
}

impl From<u8> for CalculatorMode {
    fn from(code: u8) -> Self {
        match code {
            0 => CalculatorMode::Normal,
            1 => CalculatorMode::Max,
            2 => CalculatorMode::Avg,
            3 => CalculatorMode::Overwrite,
            4 => CalculatorMode::MaxHold,
            other => CalculatorMode::Unknown(other),
        }
    }
}

impl From<CalculatorMode> for u8 {
    fn from(mode: CalculatorMode) -> Self {
        match mode {
            CalculatorMode::Normal => 0,
            CalculatorMode::Max => 1,
            CalculatorMode::Avg => 2,
            CalculatorMode::Overwrite => 3,
            CalculatorMode::MaxHold => 4,
            CalculatorMode::Unknown(code) => code,
        }
    }
}

impl CalculatorMode {
    /// Parse an ASCII-decimal calculator mode field. An empty field maps to
    /// `Unknown(255)`.
    pub fn parse_field(s: &str) -> CalculatorMode {
        if s.trim().is_empty() {
            return CalculatorMode::Unknown(255);
        }
        CalculatorMode::from(parse_decimal(s).clamp(0, 255) as u8)
    }
}

/// Marker mode stored in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMode {
    /// Track the peak sample.
    Peak,
    /// No marker.
    None,
    /// Manually positioned marker.
    Manual,
    /// Unrecognized marker mode code.
    Unknown(u8),
}

impl From<u8> for MarkerMode {
    fn from(code: u8) -> Self {
        match code {
            0 => MarkerMode::Peak,
            1 => MarkerMode::None,
            2 => MarkerMode::Manual,
            other => MarkerMode::Unknown(other),
        }
    }
}

impl From<MarkerMode> for u8 {
    fn from(mode: MarkerMode) -> Self {
        match mode {
            MarkerMode::Peak => 0,
            MarkerMode::None => 1,
            MarkerMode::Manual => 2,
            MarkerMode::Unknown(code) => code,
        }
    }
}

/// Modulation reported in sniffer configuration frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// OOK, raw decoder.
    OokRaw,
    /// PSK, raw decoder.
    PskRaw,
    /// OOK, standard decoder.
    OokStd,
    /// PSK, standard decoder.
    PskStd,
    /// No modulation (code 255).
    None,
    /// Unrecognized modulation code.
    Unknown(u8),
}

impl From<u8> for Modulation {
    fn from(code: u8) -> Self {
        match code {
            0 => Modulation::OokRaw,
            1 => Modulation::PskRaw,
            2 => Modulation::OokStd,
            3 => Modulation::PskStd,
            255 => Modulation::None,
            other => Modulation::Unknown(other),
        }
    }
}

impl Modulation {
    /// Parse an ASCII-decimal modulation field.
    pub fn parse_field(s: &str) -> Modulation {
        Modulation::from(parse_decimal(s).clamp(0, 255) as u8)
    }
}

/// Serial baud rate configured on the instrument.
///
/// Only the nine documented rates exist on the wire; anything else fails at
/// [`BaudRate::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    /// 1200 baud.
    B1200,
    /// 2400 baud.
    B2400,
    /// 4800 baud.
    B4800,
    /// 9600 baud.
    B9600,
    /// 19200 baud.
    B19200,
    /// 38400 baud.
    B38400,
    /// 57600 baud.
    B57600,
    /// 115200 baud.
    B115200,
    /// 500000 baud, the instrument's default.
    B500000,
}

impl BaudRate {
    /// The ASCII selector digit used by the `c<digit>` command.
    pub fn selector(&self) -> u8 {
        match self {
            BaudRate::B1200 => b'1',
            BaudRate::B2400 => b'2',
            BaudRate::B4800 => b'3',
            BaudRate::B9600 => b'4',
            BaudRate::B19200 => b'5',
            BaudRate::B38400 => b'6',
            BaudRate::B57600 => b'7',
            BaudRate::B115200 => b'8',
            BaudRate::B500000 => b'0',
        }
    }

    /// The rate in bits per second.
    pub fn bits_per_second(&self) -> u32 {
        match self {
            BaudRate::B1200 => 1200,
            BaudRate::B2400 => 2400,
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
            BaudRate::B500000 => 500000,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ProtocolError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        match rate {
            1200 => Ok(BaudRate::B1200),
            2400 => Ok(BaudRate::B2400),
            4800 => Ok(BaudRate::B4800),
            9600 => Ok(BaudRate::B9600),
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            57600 => Ok(BaudRate::B57600),
            115200 => Ok(BaudRate::B115200),
            500000 => Ok(BaudRate::B500000),
            other => Err(ProtocolError::UnsupportedBaudRate(other)),
        }
    }
}

/// Which radio board a module-switch command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioModule {
    /// The mainboard module.
    Mainboard,
    /// The expansion board module.
    Expansion,
}

/// Parse an ASCII decimal field as sent by the instrument.
///
/// Fields carry leading zeros (`0000463`); an empty or malformed field
/// parses as 0.
pub(crate) fn parse_decimal(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}
