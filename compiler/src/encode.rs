// encode.rs — Transport renderings of a compiled program
//
// Comma-separated decimals (for pasting into firmware source or a serial
// console), a C array initializer, and the framed packet the uploader sends:
//
//     [0x7E][len][payload ...][checksum]
//
// where `checksum` is the payload byte sum modulo 256.

use std::fmt::Write;

use crate::error::FrameError;

/// Frame start delimiter.
pub const FRAME_START: u8 = 0x7E;

/// Largest payload a one-byte length field can describe.
pub const MAX_FRAME_PAYLOAD: usize = u8::MAX as usize;

pub fn to_csv(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 4);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        let _ = write!(s, "{b}");
    }
    s
}

/// Render as a `const uint8_t` array definition, 16 values per line.
pub fn to_c_array(name: &str, bytes: &[u8]) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "const uint8_t {name}[{}] = {{", bytes.len());
    for chunk in bytes.chunks(16) {
        let line: Vec<String> = chunk.iter().map(|b| b.to_string()).collect();
        let _ = writeln!(s, "    {},", line.join(", "));
    }
    s.push_str("};\n");
    s
}

pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

pub fn frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(FrameError::TooLong {
            len: payload.len(),
            max: MAX_FRAME_PAYLOAD,
        });
    }
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(FRAME_START);
    out.push(payload.len() as u8);
    out.extend_from_slice(payload);
    out.push(checksum(payload));
    Ok(out)
}

/// Validate a frame and return its payload.
pub fn unframe(frame: &[u8]) -> Result<&[u8], FrameError> {
    let [start, len, rest @ ..] = frame else {
        return Err(FrameError::Truncated { len: frame.len() });
    };
    let Some((&sum, payload)) = rest.split_last() else {
        return Err(FrameError::Truncated { len: frame.len() });
    };
    if *start != FRAME_START {
        return Err(FrameError::BadStart { found: *start });
    }
    if payload.len() != *len as usize {
        return Err(FrameError::LengthMismatch {
            declared: *len as usize,
            actual: payload.len(),
        });
    }
    let expected = checksum(payload);
    if sum != expected {
        return Err(FrameError::Checksum {
            expected,
            found: sum,
        });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_no_trailing_separator() {
        assert_eq!(to_csv(&[1, 16, 255]), "1,16,255");
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[200, 100]), 44);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn frame_layout() {
        assert_eq!(frame(&[2, 13, 4]).unwrap(), vec![0x7E, 3, 2, 13, 4, 19]);
        assert_eq!(frame(&[]).unwrap(), vec![0x7E, 0, 0]);
    }

    #[test]
    fn frame_rejects_long_payload() {
        let payload = vec![0u8; 256];
        assert_eq!(
            frame(&payload),
            Err(FrameError::TooLong { len: 256, max: 255 })
        );
        assert!(frame(&payload[..255]).is_ok());
    }

    #[test]
    fn unframe_returns_payload() {
        let f = frame(&[1, 2, 3]).unwrap();
        assert_eq!(unframe(&f).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn unframe_detects_corruption() {
        assert_eq!(unframe(&[0x7E, 0]), Err(FrameError::Truncated { len: 2 }));
        assert_eq!(
            unframe(&[0x7F, 0, 0]),
            Err(FrameError::BadStart { found: 0x7F })
        );
        assert_eq!(
            unframe(&[0x7E, 2, 5, 5]),
            Err(FrameError::LengthMismatch {
                declared: 2,
                actual: 1
            })
        );
        assert_eq!(
            unframe(&[0x7E, 1, 5, 6]),
            Err(FrameError::Checksum {
                expected: 5,
                found: 6
            })
        );
    }

    #[test]
    fn c_array_wraps_lines() {
        let bytes: Vec<u8> = (0..18).collect();
        let text = to_c_array("program", &bytes);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "const uint8_t program[18] = {");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "    16, 17,");
        assert_eq!(lines[3], "};");
    }
}
