//! Inbound frame decoding.
//!
//! The reply stream is irregular: textual frames are CR-LF terminated,
//! binary frames are fixed-length or length-prefixed, and the CR-LF byte
//! pair can legitimately occur inside binary payloads. Framing is therefore
//! decided per frame type: structurally for `$` frames, by delimiter scan
//! only for `#` and unknown lines.

use bytes::{Buf, BytesMut};

use crate::constants::*;
use crate::packets::*;

/// Incremental decoder turning an append-only byte stream into [`Packet`]s.
///
/// Owned exclusively by the read loop: bytes are appended with
/// [`push`](FrameDecoder::push), complete frames drained with
/// [`try_decode`](FrameDecoder::try_decode). Every emitted packet owns its
/// bytes; nothing borrows the internal buffer.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> FrameDecoder {
        FrameDecoder {
            buffer: BytesMut::with_capacity(DECODE_BUFFER_LIMIT),
        }
    }

    /// Append received bytes to the accumulation buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered, not yet decoded bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Decode the next complete frame, or `None` if more bytes are needed.
    ///
    /// If the buffer reaches [`DECODE_BUFFER_LIMIT`] without a decodable
    /// frame boundary it is discarded and decoding resumes empty. That is a
    /// documented data-loss recovery, not a failure.
    pub fn try_decode(&mut self) -> Option<Packet> {
        match self.dispatch() {
            Some((packet, consumed)) => {
                self.buffer.advance(consumed);
                Some(packet)
            }
            None => {
                if self.buffer.len() >= DECODE_BUFFER_LIMIT {
                    log::warn!(
                        "no frame boundary in {} buffered bytes, resynchronizing",
                        self.buffer.len()
                    );
                    self.buffer.clear();
                }
                None
            }
        }
    }

    /// Find the next frame in the buffered prefix. Returns the decoded
    /// packet and the number of bytes it consumed, trailing EOL included.
    fn dispatch(&self) -> Option<(Packet, usize)> {
        let buf = &self.buffer[..];
        if buf.len() < MIN_DISPATCH_LEN {
            return None;
        }
        if buf[0] == BINARY_FRAME_MARKER {
            match buf[1] {
                b'D' => {
                    return self.binary_frame(SCREEN_FRAME_LEN, |frame| {
                        let mut data = [0u8; SCREEN_IMAGE_SIZE];
                        data.copy_from_slice(&frame[2..]);
                        Packet::ScreenImage(ScreenImage::new(data))
                    });
                }
                b'R' => {
                    if buf.len() < 4 {
                        return None;
                    }
                    let payload_len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
                    return self.binary_frame(4 + payload_len, |frame| {
                        Packet::RawData(frame[4..].to_vec())
                    });
                }
                b'S' => {
                    // The count byte is authoritative: sample bytes are never
                    // scanned for an embedded CR LF.
                    let count = buf[2] as usize;
                    return self.binary_frame(3 + count, |frame| {
                        Packet::SweepData(SweepData::from_raw(&frame[3..]))
                    });
                }
                b'P' => {
                    return self.binary_frame(PRESET_FRAME_LEN, |frame| {
                        match Preset::decode(frame) {
                            Ok(preset) => Packet::Preset(preset),
                            Err(_) => Packet::Unhandled(frame.to_vec()),
                        }
                    });
                }
                _ => {}
            }
        }
        // Everything else frames on the two-byte EOL marker. '#' lines are
        // sub-dispatched; anything unmatched is still emitted so no byte
        // range disappears silently.
        let eol = find_eol(buf)?;
        let line = &buf[..eol];
        let packet = if line.first() == Some(&TEXT_FRAME_MARKER) {
            decode_text_line(line)
        } else {
            Packet::Unhandled(line.to_vec())
        };
        Some((packet, eol + EOL.len()))
    }

    /// Frame a structurally-delimited `$` frame of `frame_len` bytes.
    ///
    /// Emission waits until the trailing EOL position is buffered too, so a
    /// byte stream split across arbitrary reads decodes identically to a
    /// single feed. The EOL is consumed with the frame when present.
    fn binary_frame<F>(&self, frame_len: usize, build: F) -> Option<(Packet, usize)>
    where
        F: FnOnce(&[u8]) -> Packet,
    {
        let buf = &self.buffer[..];
        if buf.len() < frame_len + EOL.len() {
            return None;
        }
        let consumed = if buf[frame_len..frame_len + EOL.len()] == EOL {
            frame_len + EOL.len()
        } else {
            frame_len
        };
        Some((build(&buf[..frame_len]), consumed))
    }
}

/// Offset of the first EOL marker, if any is buffered.
fn find_eol(buf: &[u8]) -> Option<usize> {
    buf.windows(EOL.len()).position(|window| window == EOL)
}

/// Sub-dispatch a complete `#` line (EOL already stripped).
fn decode_text_line(line: &[u8]) -> Packet {
    match line.get(1) {
        Some(b'C') if line.len() > 6 => match line[2] {
            b'2' if line[3] == b'-' && line[5] == b':' => {
                let fields = String::from_utf8_lossy(&line[6..]);
                match line[4] {
                    b'F' => Packet::CurrentConfig(CurrentConfig::parse(&fields)),
                    b'M' => Packet::CurrentSetup(CurrentSetup::parse(&fields)),
                    _ => Packet::Unhandled(line.to_vec()),
                }
            }
            b'4' if line[3] == b'-' && line[4] == b'F' && line[5] == b':' => {
                let fields = String::from_utf8_lossy(&line[6..]);
                Packet::CurrentSnifferConfig(CurrentSnifferConfig::parse(&fields))
            }
            b'A' if line[3] == b'L' && line[4] == b':' => Packet::CalibrationAvailability {
                mainboard: line[5] == b'1',
                expansion: line[6] == b'1',
            },
            _ => Packet::Unhandled(line.to_vec()),
        },
        Some(b'S') if line.len() >= 3 && line[2] == b'n' => {
            Packet::SerialNumber(String::from_utf8_lossy(&line[3..]).into_owned())
        }
        Some(b'P') if line.starts_with(b"#PCK") => Packet::EndOfPresets,
        _ => Packet::Unhandled(line.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CalculatorMode, Model};

    fn decode_all(decoder: &mut FrameDecoder) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Some(packet) = decoder.try_decode() {
            packets.push(packet);
        }
        packets
    }

    #[test]
    fn decodes_config_line() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#C2-F:0000463,0000464,0000,-120,0112,0,0,0000463,0000464,0001,00300,0,2\r\n");
        let packet = decoder.try_decode().unwrap();
        let Packet::CurrentConfig(config) = packet else {
            panic!("expected CurrentConfig, got {packet:?}");
        };
        assert_eq!(config.start_freq_khz, 463);
        assert_eq!(config.amp_top_dbm, 0);
        assert_eq!(config.amp_bottom_dbm, -120);
        assert_eq!(config.sweep_steps, 112);
        assert_eq!(config.calculator_mode, CalculatorMode::Avg);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn decodes_setup_and_serial_lines() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#C2-M:003,255,01.12\r\n#SnB3G42C9AAB1234\r\n");
        let packets = decode_all(&mut decoder);
        assert_eq!(packets.len(), 2);
        let Packet::CurrentSetup(setup) = &packets[0] else {
            panic!("expected CurrentSetup");
        };
        assert_eq!(setup.model, Model::WSub1G);
        assert_eq!(packets[1], Packet::SerialNumber("B3G42C9AAB1234".to_string()));
    }

    #[test]
    fn decodes_calibration_line() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#CAL:10\r\n");
        assert_eq!(
            decoder.try_decode(),
            Some(Packet::CalibrationAvailability {
                mainboard: true,
                expansion: false,
            })
        );
    }

    #[test]
    fn sweep_frame_round_trip() {
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![b'$', b'S', 5, 0x11, 0x00, 0xF0, 0x22, 0x7F];
        stream.extend_from_slice(&EOL);
        decoder.push(&stream);
        let Some(Packet::SweepData(sweep)) = decoder.try_decode() else {
            panic!("expected SweepData");
        };
        assert_eq!(sweep.samples, vec![-8.5, 0.0, -120.0, -17.0, -63.5]);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn sweep_frame_with_embedded_eol() {
        // 0x0D 0x0A inside the declared sample range must not split the
        // frame.
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![b'$', b'S', 6, 0x10, 0x0D, 0x0A, 0x0D, 0x0A, 0x30];
        stream.extend_from_slice(&EOL);
        decoder.push(&stream);
        let Some(Packet::SweepData(sweep)) = decoder.try_decode() else {
            panic!("expected SweepData");
        };
        assert_eq!(sweep.samples.len(), 6);
        assert_eq!(sweep.samples[1], -6.5);
        assert_eq!(sweep.samples[5], -24.0);
        assert!(decoder.try_decode().is_none());
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn sweep_frame_waits_for_declared_length() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[b'$', b'S', 8, 0x10, 0x20]);
        assert!(decoder.try_decode().is_none());
        decoder.push(&[0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);
        assert!(decoder.try_decode().is_none()); // trailing EOL not buffered yet
        decoder.push(&EOL);
        assert!(matches!(decoder.try_decode(), Some(Packet::SweepData(_))));
    }

    #[test]
    fn raw_data_frame_length_prefixed() {
        let mut decoder = FrameDecoder::new();
        let payload = [0xDE, 0xAD, 0x0D, 0x0A, 0xBE, 0xEF];
        let mut stream = vec![b'$', b'R', payload.len() as u8, 0];
        stream.extend_from_slice(&payload);
        stream.extend_from_slice(&EOL);
        decoder.push(&stream);
        assert_eq!(decoder.try_decode(), Some(Packet::RawData(payload.to_vec())));
    }

    #[test]
    fn screen_dump_waits_for_full_bitmap() {
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![b'$', b'D'];
        stream.extend_from_slice(&[0xAA; SCREEN_IMAGE_SIZE]);
        stream.extend_from_slice(&EOL);

        decoder.push(&stream[..stream.len() - 1]);
        assert!(decoder.try_decode().is_none());
        decoder.push(&stream[stream.len() - 1..]);
        let Some(Packet::ScreenImage(image)) = decoder.try_decode() else {
            panic!("expected ScreenImage");
        };
        // 0xAA sets odd row bits.
        assert!(image.pixel(0, 1));
        assert!(!image.pixel(0, 0));
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn preset_frame_decodes_at_fixed_width() {
        let mut decoder = FrameDecoder::new();
        let mut frame = vec![0u8; PRESET_FRAME_LEN];
        frame[0] = b'$';
        frame[1] = b'P';
        frame[2] = b' ';
        frame[3] = 7;
        frame[4] = 0x01;
        frame[5..9].copy_from_slice(b"WIFI");
        frame[19..23].copy_from_slice(&2_400_000u32.to_le_bytes());
        frame[23..27].copy_from_slice(&2_500_000u32.to_le_bytes());
        frame[27] = 1; // Max
        frame[28] = (-20i8) as u8;
        frame[29] = (-110i8) as u8;
        frame[30] = 8;
        frame[31] = 1;
        frame[32] = 0;
        frame[33] = 0x42;
        decoder.push(&frame);
        assert!(decoder.try_decode().is_none()); // fail closed on short buffer
        decoder.push(&EOL);
        let Some(Packet::Preset(preset)) = decoder.try_decode() else {
            panic!("expected Preset");
        };
        assert_eq!(preset.index, 7);
        assert_eq!(preset.name, "WIFI");
        assert_eq!(preset.min_freq_khz, 2_400_000);
        assert_eq!(preset.amp_top_dbm, -20);
        assert!(preset.mainboard);
    }

    #[test]
    fn end_of_presets_line() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#PCK\r\n");
        assert_eq!(decoder.try_decode(), Some(Packet::EndOfPresets));
    }

    #[test]
    fn unknown_line_is_unhandled() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#QA:0\r\nnoise\r\n");
        assert_eq!(decoder.try_decode(), Some(Packet::Unhandled(b"#QA:0".to_vec())));
        assert_eq!(decoder.try_decode(), Some(Packet::Unhandled(b"noise".to_vec())));
        assert!(decoder.try_decode().is_none());
    }

    #[test]
    fn partial_line_halts_until_eol() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#C2-F:0000463");
        assert!(decoder.try_decode().is_none());
        decoder.push(b",0001000,0000,-120,0112,0,0,0,0,0,0,0,0\r\n");
        assert!(matches!(decoder.try_decode(), Some(Packet::CurrentConfig(_))));
    }

    #[test]
    fn byte_at_a_time_matches_single_feed() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"#C2-F:0000463,0001000,0000,-120,0112,0,0,0,0,0,0,0,0\r\n");
        stream.extend_from_slice(&[b'$', b'S', 3, 0x0D, 0x0A, 0x40]);
        stream.extend_from_slice(&EOL);
        stream.extend_from_slice(b"#PCK\r\n");
        let mut raw = vec![b'$', b'R', 2, 0, 0x0D, 0x0A];
        raw.extend_from_slice(&EOL);
        stream.extend_from_slice(&raw);
        stream.extend_from_slice(b"#SnSN123\r\n");

        let mut whole = FrameDecoder::new();
        whole.push(&stream);
        let at_once = decode_all(&mut whole);

        let mut trickle = FrameDecoder::new();
        let mut one_by_one = Vec::new();
        for &byte in &stream {
            trickle.push(&[byte]);
            one_by_one.extend(decode_all(&mut trickle));
        }

        assert_eq!(at_once.len(), 5);
        assert_eq!(at_once, one_by_one);
    }

    #[test]
    fn overflow_resets_buffer() {
        // Lossy-reset policy: garbage without a frame boundary is discarded
        // once the buffer fills, and decoding resumes with fresh input.
        let mut decoder = FrameDecoder::new();
        decoder.push(&vec![b'x'; DECODE_BUFFER_LIMIT]);
        assert!(decoder.try_decode().is_none());
        assert_eq!(decoder.buffered_len(), 0);

        decoder.push(b"#PCK\r\n");
        assert_eq!(decoder.try_decode(), Some(Packet::EndOfPresets));
    }

    #[test]
    fn below_dispatch_threshold_waits() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"#C");
        assert!(decoder.try_decode().is_none());
        assert_eq!(decoder.buffered_len(), 2);
    }
}
