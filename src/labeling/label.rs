use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

///
///   Enumeration type for the relationship between one ground truth and one
///   prediction. `Match` is the only non-error outcome.
///
///   `Missing` is never written into a cell by `ErrorLabeling::compute`. It
///   describes a ground truth whose row holds no `Match`, and is reserved for
///   callers that summarize a computed matrix (see `LabelMatrix::missing`).
///
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLabelType {
    /// The ground truth has no corresponding prediction.
    Missing,
    /// The prediction does not overlap the ground truth at all.
    Background,
    /// Right class, insufficient overlap.
    Localization,
    /// Wrong class, sufficient overlap.
    ClassName,
    /// Wrong class and insufficient overlap.
    ClassLocalization,
    /// Right class and overlap, but a more confident prediction already matched.
    DuplicateDetection,
    Match,
}

impl ErrorLabelType {
    pub const ALL: [ErrorLabelType; 7] = [
        ErrorLabelType::Missing,
        ErrorLabelType::Background,
        ErrorLabelType::Localization,
        ErrorLabelType::ClassName,
        ErrorLabelType::ClassLocalization,
        ErrorLabelType::DuplicateDetection,
        ErrorLabelType::Match,
    ];

    /// Stable identifier of the label.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorLabelType::Missing => "missing",
            ErrorLabelType::Background => "background",
            ErrorLabelType::Localization => "localization",
            ErrorLabelType::ClassName => "class_name",
            ErrorLabelType::ClassLocalization => "class_localization",
            ErrorLabelType::DuplicateDetection => "duplicate_detection",
            ErrorLabelType::Match => "match",
        }
    }

    #[inline]
    pub fn is_error(self) -> bool {
        self != ErrorLabelType::Match
    }
}

impl fmt::Display for ErrorLabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorLabelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorLabelType::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| Error::UnknownLabel(s.to_string()))
    }
}
