mod parser;
mod snapshot;

pub use parser::{BLOCK_LEN, ParseError, encode_block, error_code_text, parse_block, parse_line};
pub use snapshot::TelemetrySnapshot;
