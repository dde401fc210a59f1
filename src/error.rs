use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Invalid Configuration: IoU threshold {} is outside [0, 1]", _0)]
    InvalidConfiguration(f32),

    #[error(display = "Dimension Mismatch: {} #{} has {} values, expected {}", kind, index, found, expected)]
    DimensionMismatch {
        kind: &'static str,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error(display = "Invalid Class Id: {} #{} has class value {}", kind, index, value)]
    InvalidClassId {
        kind: &'static str,
        index: usize,
        value: f32,
    },

    #[error(display = "Unknown Label: {:?}", _0)]
    UnknownLabel(String),
}
