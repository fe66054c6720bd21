use thiserror::Error;

use super::scanner::ScannerState;

/// Failure of a tokenization run.
///
/// Malformed markup is never an error; this only signals a broken state-table
/// invariant, and aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// The scanner reached a state/input combination the state table does not
    /// define.
    #[error("unexpected {} at offset {offset} in {state} state", describe(*.byte))]
    UnexpectedState {
        /// The state being processed.
        state: ScannerState,
        /// Byte offset of the cursor.
        offset: usize,
        /// The byte under the cursor, `None` during end-of-input finalization.
        byte: Option<u8>,
    },
}

fn describe(byte: Option<u8>) -> String {
    match byte {
        Some(b) if b.is_ascii_graphic() => format!("byte '{}'", char::from(b)),
        Some(b) => format!("byte 0x{b:02x}"),
        None => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_state_offset_and_byte() {
        let err = TokenizeError::UnexpectedState {
            state: ScannerState::OpeningDoctype,
            offset: 11,
            byte: Some(b'x'),
        };
        assert_eq!(
            err.to_string(),
            "unexpected byte 'x' at offset 11 in OpeningDoctype state"
        );
    }

    #[test]
    fn message_for_end_of_input() {
        let err = TokenizeError::UnexpectedState {
            state: ScannerState::Literal,
            offset: 0,
            byte: None,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of input at offset 0 in Literal state"
        );
    }
}
