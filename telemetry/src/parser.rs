use crate::snapshot::TelemetrySnapshot;
use crc_any::CRCu16;
use std::{error, fmt};

/*
 * Binary block layout (16 bytes, big-endian):
 *
 *  Type | Speed | Rpm | Power | Current | Soc | CellTemp | Err | FCS
 *  0x01 |  u16  | u16 |  i16  |   i16   | u16 |   i16    | u8  | 2B
 *
 * The six 16-bit fields are fixed-point with one decimal (value x 10).
 * FCS is CRC-16/CCITT-FALSE over bytes 0..=13, stored big-endian.
 */

/// Size of one framed SPI response block in bytes.
pub const BLOCK_LEN: usize = 16;

/// First byte of every valid telemetry block.
const BLOCK_TYPE: u8 = 0x01;

/// Canonical text schema: speed, rpm, power, current, soc, cell_temp, error.
const TEXT_FIELD_COUNT: usize = 7;

const NUMERIC_FIELDS: [&str; 6] = ["speed", "rpm", "power", "current", "soc", "cell_temp"];

#[derive(Debug, PartialEq)]
pub enum ParseError {
    FieldCount { expected: usize, found: usize },
    InvalidNumber { field: &'static str, value: String },
    OutOfRange { field: &'static str, value: f64 },
    BlockLength { expected: usize, found: usize },
    BlockType(u8),
    FcsMismatch { expected: u16, found: u16 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            ParseError::InvalidNumber { field, value } => {
                write!(f, "field '{field}' is not a number: {value:?}")
            }
            ParseError::OutOfRange { field, value } => {
                write!(f, "field '{field}' out of range: {value}")
            }
            ParseError::BlockLength { expected, found } => {
                write!(f, "expected a {expected}-byte block, found {found} bytes")
            }
            ParseError::BlockType(found) => {
                write!(f, "unknown block type {found:#04x}")
            }
            ParseError::FcsMismatch { expected, found } => {
                write!(f, "FCS mismatch: computed {expected:#06x}, block carries {found:#06x}")
            }
        }
    }
}

impl error::Error for ParseError {}

/// Parses one text-framed record into a snapshot.
///
/// The canonical line carries exactly seven fields separated by commas or
/// whitespace: `speed, rpm, power, current, soc, cell_temp, error_text`.
/// The first six parse as floats; the last is free text. Anything else,
/// including the legacy 2-field `"soc rpm"` form, is malformed.
pub fn parse_line(line: &str) -> Result<TelemetrySnapshot, ParseError> {
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    if fields.len() != TEXT_FIELD_COUNT {
        return Err(ParseError::FieldCount {
            expected: TEXT_FIELD_COUNT,
            found: fields.len(),
        });
    }

    let mut values = [0.0f64; NUMERIC_FIELDS.len()];
    for (slot, (name, raw)) in values
        .iter_mut()
        .zip(NUMERIC_FIELDS.iter().copied().zip(fields.iter().copied()))
    {
        *slot = raw.parse().map_err(|_| ParseError::InvalidNumber {
            field: name,
            value: raw.to_string(),
        })?;
    }

    let [speed, rpm, power, current, soc, cell_temp] = values;
    TelemetrySnapshot::from_fields(
        speed,
        rpm,
        power,
        current,
        soc,
        cell_temp,
        fields[TEXT_FIELD_COUNT - 1].to_string(),
    )
}

/// Parses one binary SPI response block (layout documented above).
pub fn parse_block(block: &[u8]) -> Result<TelemetrySnapshot, ParseError> {
    if block.len() != BLOCK_LEN {
        return Err(ParseError::BlockLength {
            expected: BLOCK_LEN,
            found: block.len(),
        });
    }
    if block[0] != BLOCK_TYPE {
        return Err(ParseError::BlockType(block[0]));
    }

    let expected = block_fcs(&block[..BLOCK_LEN - 2]);
    let found = u16::from_be_bytes([block[14], block[15]]);
    if expected != found {
        return Err(ParseError::FcsMismatch { expected, found });
    }

    let u16_at = |off: usize| u16::from_be_bytes([block[off], block[off + 1]]);
    let i16_at = |off: usize| i16::from_be_bytes([block[off], block[off + 1]]);

    TelemetrySnapshot::from_fields(
        f64::from(u16_at(1)) / 10.0,
        f64::from(u16_at(3)) / 10.0,
        f64::from(i16_at(5)) / 10.0,
        f64::from(i16_at(7)) / 10.0,
        f64::from(u16_at(9)) / 10.0,
        f64::from(i16_at(11)) / 10.0,
        error_code_text(block[13]),
    )
}

/// Encodes raw field values into one framed block; the inverse of
/// [`parse_block`], used by senders and test fixtures. Values are truncated
/// to the fixed-point wire resolution of 0.1.
pub fn encode_block(
    speed: f64,
    rpm: f64,
    power: f64,
    current: f64,
    soc: f64,
    cell_temp: f64,
    error_code: u8,
) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[0] = BLOCK_TYPE;
    block[1..3].copy_from_slice(&((speed * 10.0) as u16).to_be_bytes());
    block[3..5].copy_from_slice(&((rpm * 10.0) as u16).to_be_bytes());
    block[5..7].copy_from_slice(&((power * 10.0) as i16).to_be_bytes());
    block[7..9].copy_from_slice(&((current * 10.0) as i16).to_be_bytes());
    block[9..11].copy_from_slice(&((soc * 10.0) as u16).to_be_bytes());
    block[11..13].copy_from_slice(&((cell_temp * 10.0) as i16).to_be_bytes());
    block[13] = error_code;

    let fcs = block_fcs(&block[..BLOCK_LEN - 2]);
    block[14..16].copy_from_slice(&fcs.to_be_bytes());
    block
}

/// Maps a controller error code to the short status text the dashboard shows.
pub fn error_code_text(code: u8) -> String {
    match code {
        0x00 => "OK".to_string(),
        0x01 => "UNDERVOLT".to_string(),
        0x02 => "OVERTEMP".to_string(),
        0x03 => "COMM".to_string(),
        other => format!("ERR{other}"),
    }
}

fn block_fcs(data: &[u8]) -> u16 {
    let mut crc = CRCu16::crc16ccitt_false();
    crc.digest(data);
    crc.get_crc()
}
