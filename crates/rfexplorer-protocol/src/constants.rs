//! Protocol constants
//!
//! These constants define the frame markers, fixed frame layouts, parameter
//! ranges, and power-on defaults of the RF Explorer UART API.

// ============================================================================
// Frame markers
// ============================================================================

/// First byte of every command frame and of textual reply frames.
pub const TEXT_FRAME_MARKER: u8 = b'#';
/// First byte of binary reply frames (screen dump, sweep data, raw data,
/// preset records).
pub const BINARY_FRAME_MARKER: u8 = b'$';
/// End-of-line marker terminating textual frames. The same byte pair can
/// legitimately occur inside binary payloads.
pub const EOL: [u8; 2] = [0x0D, 0x0A];

/// Minimum buffered bytes before the decoder attempts frame dispatch.
pub const MIN_DISPATCH_LEN: usize = 3;

// ============================================================================
// Binary frame layouts
// ============================================================================

/// LCD width in pixels.
pub const SCREEN_WIDTH: usize = 128;
/// LCD height in pixels.
pub const SCREEN_HEIGHT: usize = 64;
/// Size of a `$D` screen bitmap: 128x64 at 1 bit per pixel, 8 rows packed
/// per byte.
pub const SCREEN_IMAGE_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT / 8;
/// Total `$D` frame length excluding the trailing EOL (2-byte header plus
/// the bitmap).
pub const SCREEN_FRAME_LEN: usize = 2 + SCREEN_IMAGE_SIZE;

/// Total `$P` preset record length excluding the trailing EOL.
pub const PRESET_FRAME_LEN: usize = 35;
/// Maximum preset name length in bytes.
pub const PRESET_NAME_LEN: usize = 12;
/// Length of the outbound preset-write frame, including the `'#' length`
/// header.
pub const PRESET_WRITE_FRAME_LEN: usize = 36;

// ============================================================================
// Command framing
// ============================================================================

/// Maximum command payload length. The length byte counts the two framing
/// bytes, so it cannot represent more than 255 - 2 payload bytes.
pub const MAX_COMMAND_LEN: usize = 253;

// ============================================================================
// Decode buffer
// ============================================================================

/// Decode buffer reset threshold. If this many bytes accumulate without a
/// decodable frame boundary the buffer is discarded and decoding resumes
/// empty.
pub const DECODE_BUFFER_LIMIT: usize = 8192;

// ============================================================================
// Analyzer parameter ranges
// ============================================================================

/// Maximum start/end frequency in kHz accepted by `SetAnalyzerConfig`.
pub const MAX_FREQ_KHZ: u32 = 9_999_999;
/// Lowest amplitude the instrument reports, in dBm.
pub const MIN_AMP_DBM: i16 = -120;
/// Maximum number of sweep steps per scan.
pub const MAX_SWEEP_STEPS: u32 = 65_535;
/// Minimum number of sweep steps in extended-resolution mode.
pub const MIN_SWEEP_STEPS: u32 = 112;
/// RBW request range in kHz; values outside are ignored.
pub const RBW_REQUEST_MIN_KHZ: u32 = 3;
/// Upper bound of the RBW request range in kHz.
pub const RBW_REQUEST_MAX_KHZ: u32 = 670;
/// A recomputed RBW is included in the command only if it lands in
/// `[RBW_ACCEPT_MIN_KHZ, RBW_ACCEPT_MAX_KHZ)`.
pub const RBW_ACCEPT_MIN_KHZ: u32 = 3;
/// Exclusive upper bound for an accepted recomputed RBW, in kHz.
pub const RBW_ACCEPT_MAX_KHZ: u32 = 620;

// ============================================================================
// Power-on defaults
// ============================================================================

/// Documented power-on start frequency in kHz.
pub const DEFAULT_START_FREQ_KHZ: u32 = 0;
/// Documented power-on frequency step in Hz.
pub const DEFAULT_FREQ_STEP_HZ: u32 = 1000;
/// Documented power-on amplitude top in dBm.
pub const DEFAULT_AMP_TOP_DBM: i16 = 0;
/// Documented power-on amplitude bottom in dBm.
pub const DEFAULT_AMP_BOTTOM_DBM: i16 = -120;
