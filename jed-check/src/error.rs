//! Rejection reasons for candidate fuse-map files.

use std::fmt;

use thiserror::Error;

/// Structural marker the scan looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `0x02` start-of-text byte opening the fuse-map body.
    Stx,
    /// `QF` fuse-count field at the start of a line.
    Qf,
    /// `E` feature-row field at the start of a line.
    FeatureRow,
    /// `L` fuse-table field at the start of a line.
    FuseTable,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stx => "starting STX",
            Self::Qf => "Q and qualifier F",
            Self::FeatureRow => "E for feature row",
            Self::FuseTable => "L for fuse table",
        })
    }
}

/// Fixed-width bit field whose length is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// 64-bit feature row following `E`.
    FeatureRow,
    /// 16-bit feabits line following the feature row.
    Feabits,
}

impl Field {
    /// Required width in bits.
    #[must_use]
    pub fn expected_bits(self) -> usize {
        match self {
            Self::FeatureRow => crate::FEATURE_ROW_BITS,
            Self::Feabits => crate::FEABITS_BITS,
        }
    }

    /// Required width in whole bytes.
    #[must_use]
    pub fn expected_bytes(self) -> usize {
        match self {
            Self::FeatureRow => 8,
            Self::Feabits => 2,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not {} bytes", field_name(*self), self.expected_bytes())
    }
}

/// The first structural invariant a candidate file violates.
///
/// `Display` gives the short reason; [`JedecError::status_line`] gives the
/// sentence shown next to the upload button.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum JedecError {
    /// File name does not end in `.jed`.
    #[error("wrong format")]
    WrongExtension,

    /// File name is longer than [`crate::MAX_NAME_LEN`] UTF-16 code units.
    #[error("name too long")]
    NameTooLong {
        /// Length of the rejected name, in UTF-16 code units.
        len: usize,
    },

    /// A required marker was not found before end of stream.
    #[error("missing {0}")]
    MissingMarker(Marker),

    /// The `QF` address field runs into end of stream, or its `*`
    /// delimiter is the last byte of the file.
    #[error("address delimiter at end of file")]
    EndOfStream,

    /// A counted bit field has the wrong width.
    #[error("{field}")]
    MalformedField {
        field: Field,
        /// Number of `0`/`1` characters actually found.
        bits: usize,
    },

    /// Feabits bit 9 is set, which disables the SPI port.
    #[error("SPI port disabled")]
    FeatureDisabled,

    /// The fuse-table address field holds something other than `0`.
    #[error("fuse table address not zero")]
    NonZeroAddress {
        /// Byte offset of the offending character (or of end of stream).
        offset: usize,
    },
}

impl JedecError {
    /// Stable machine-readable identifier for the failure class.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::WrongExtension => "wrong_extension",
            Self::NameTooLong { .. } => "name_too_long",
            Self::MissingMarker(_) => "missing_marker",
            Self::EndOfStream => "end_of_stream",
            Self::MalformedField { .. } => "malformed_field",
            Self::FeatureDisabled => "feature_disabled",
            Self::NonZeroAddress { .. } => "non_zero_address",
        }
    }

    /// Whether the failure came from the file name rather than its content.
    #[must_use]
    pub fn is_name_error(&self) -> bool {
        matches!(self, Self::WrongExtension | Self::NameTooLong { .. })
    }

    /// Full sentence for the status line under the file picker.
    #[must_use]
    pub fn status_line(&self) -> String {
        match self {
            Self::WrongExtension => "File format must be JEDEC (.jed)".to_owned(),
            Self::NameTooLong { .. } => format!(
                "File name cannot be longer than {} characters",
                crate::MAX_NAME_LEN
            ),
            Self::MissingMarker(marker) => {
                format!("File check failed: could not find {}", marker_quoted(*marker))
            }
            Self::EndOfStream => {
                "File check failed: address delimiter is at end of file".to_owned()
            }
            Self::MalformedField { field, .. } => format!(
                "File check failed: {} is not {} bytes long",
                field_name(*field),
                field.expected_bytes()
            ),
            Self::FeatureDisabled => "File check failed: SPI port is disabled".to_owned(),
            Self::NonZeroAddress { .. } => {
                "File check failed: fuse table address is not 0".to_owned()
            }
        }
    }
}

fn marker_quoted(marker: Marker) -> &'static str {
    match marker {
        Marker::Stx => "starting STX",
        Marker::Qf => "'Q' and qualifier 'F'",
        Marker::FeatureRow => "'E' for feature row",
        Marker::FuseTable => "'L' for fuse table",
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::FeatureRow => "feature row",
        Field::Feabits => "feabits",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_match_status_reporter_text() {
        assert_eq!(JedecError::WrongExtension.to_string(), "wrong format");
        assert_eq!(JedecError::NameTooLong { len: 31 }.to_string(), "name too long");
        assert_eq!(
            JedecError::MissingMarker(Marker::Stx).to_string(),
            "missing starting STX"
        );
        assert_eq!(
            JedecError::MissingMarker(Marker::Qf).to_string(),
            "missing Q and qualifier F"
        );
        assert_eq!(
            JedecError::MissingMarker(Marker::FeatureRow).to_string(),
            "missing E for feature row"
        );
        assert_eq!(
            JedecError::MissingMarker(Marker::FuseTable).to_string(),
            "missing L for fuse table"
        );
        assert_eq!(
            JedecError::EndOfStream.to_string(),
            "address delimiter at end of file"
        );
        assert_eq!(
            JedecError::MalformedField {
                field: Field::FeatureRow,
                bits: 63
            }
            .to_string(),
            "feature row not 8 bytes"
        );
        assert_eq!(
            JedecError::MalformedField {
                field: Field::Feabits,
                bits: 15
            }
            .to_string(),
            "feabits not 2 bytes"
        );
        assert_eq!(JedecError::FeatureDisabled.to_string(), "SPI port disabled");
        assert_eq!(
            JedecError::NonZeroAddress { offset: 0 }.to_string(),
            "fuse table address not zero"
        );
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            JedecError::WrongExtension.status_line(),
            "File format must be JEDEC (.jed)"
        );
        assert_eq!(
            JedecError::NameTooLong { len: 40 }.status_line(),
            "File name cannot be longer than 30 characters"
        );
        assert_eq!(
            JedecError::MissingMarker(Marker::Qf).status_line(),
            "File check failed: could not find 'Q' and qualifier 'F'"
        );
        assert_eq!(
            JedecError::MalformedField {
                field: Field::Feabits,
                bits: 3
            }
            .status_line(),
            "File check failed: feabits is not 2 bytes long"
        );
    }

    #[test]
    fn test_name_errors_are_classified() {
        assert!(JedecError::WrongExtension.is_name_error());
        assert!(JedecError::NameTooLong { len: 31 }.is_name_error());
        assert!(!JedecError::FeatureDisabled.is_name_error());
        assert_eq!(JedecError::FeatureDisabled.code(), "feature_disabled");
    }
}
