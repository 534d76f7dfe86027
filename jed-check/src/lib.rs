//! Structural gate for JEDEC (JESD3-style) fuse-map files.
//!
//! [`validate`] decides whether a candidate file may be uploaded to the
//! device programmer. It does not decode fuses or verify checksums; it walks
//! the text once, finds the markers the programmer relies on, and reports the
//! first one that is missing or malformed.
//!
//! ```
//! use jed_check::{Accepted, JedecError, validate};
//!
//! assert_eq!(validate("index.html", ""), Ok(Accepted::Exempt));
//! assert_eq!(validate("fuses.bin", ""), Err(JedecError::WrongExtension));
//! ```
//!
//! The scan visits markers in the order they appear in a JEDEC file:
//! STX, `QF` and its address digits, the `E` feature row, the feabits line,
//! and finally the `L` fuse table, for which the cursor is rewound to STX.

mod cursor;
mod error;

pub use cursor::{Cursor, Mark};
pub use error::{Field, JedecError, Marker};

/// Start-of-text byte opening the fuse-map body.
pub const STX: u8 = 0x02;

/// File names that skip every check. These are the web assets served next
/// to the fuse maps.
pub const EXEMPT_NAMES: &[&str] = &["index.html", "styles.css", "main.js", "favicon.ico"];

/// Required file name suffix.
pub const JEDEC_EXTENSION: &str = ".jed";

/// Longest accepted file name, in UTF-16 code units (what a browser
/// reports as `File.name.length`).
pub const MAX_NAME_LEN: usize = 30;

/// Width of the `E` feature row.
pub const FEATURE_ROW_BITS: usize = 64;

/// Width of the feabits line.
pub const FEABITS_BITS: usize = 16;

/// Feabits position that, when `1`, disables the SPI port.
pub const SPI_DISABLE_BIT: usize = 9;

const QF_MARKER: &[u8] = b"\nQF";
const FEATURE_ROW_MARKER: &[u8] = b"\nE";
const FUSE_TABLE_MARKER: &[u8] = b"\nL";
const ADDRESS_DELIMITER: u8 = b'*';

/// Outcome of [`validate`].
pub type Verdict = Result<Accepted, JedecError>;

/// Why a file was let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// The name is in [`EXEMPT_NAMES`]; content was not looked at.
    Exempt,
    /// Every structural check passed.
    Checked(FuseMapSummary),
}

/// Positions the scan established while checking a file.
///
/// All offsets are byte offsets into the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuseMapSummary {
    pub stx_offset: usize,
    /// Number of characters between `QF` and `*`.
    pub address_digits: usize,
    /// First bit of the `E` feature row.
    pub feature_row_offset: usize,
    /// First bit of the feabits line.
    pub feabits_offset: usize,
    /// First character of the `L` address field.
    pub fuse_table_offset: usize,
}

/// Whether `name` bypasses all checks.
#[must_use]
pub fn is_exempt(name: &str) -> bool {
    EXEMPT_NAMES.contains(&name)
}

/// Validate a candidate file.
///
/// Holds no state between calls; the same input always gives the same
/// verdict.
///
/// # Errors
///
/// Returns the first [`JedecError`] the name or content violates.
pub fn validate(name: &str, content: &str) -> Verdict {
    if is_exempt(name) {
        return Ok(Accepted::Exempt);
    }
    check_name(name)?;
    scan(content).map(Accepted::Checked)
}

/// Name checks: extension first, then length.
///
/// # Errors
///
/// [`JedecError::WrongExtension`] or [`JedecError::NameTooLong`].
pub fn check_name(name: &str) -> Result<(), JedecError> {
    if !name.ends_with(JEDEC_EXTENSION) {
        return Err(JedecError::WrongExtension);
    }
    let len = name.encode_utf16().count();
    if len > MAX_NAME_LEN {
        return Err(JedecError::NameTooLong { len });
    }
    Ok(())
}

/// Content checks only, ignoring the file name.
///
/// # Errors
///
/// Returns the first structural violation found in `content`.
pub fn scan(content: &str) -> Result<FuseMapSummary, JedecError> {
    let mut cursor = Cursor::new(content);

    let stx = find_stx(&mut cursor)?;
    let address_digits = read_address_digits(&mut cursor)?;
    let feature_row_offset = check_feature_row(&mut cursor)?;
    let feabits_offset = check_feabits(&mut cursor)?;

    cursor.rewind(stx);
    let fuse_table_offset = check_fuse_table_address(&mut cursor, address_digits)?;

    Ok(FuseMapSummary {
        stx_offset: stx.offset(),
        address_digits,
        feature_row_offset,
        feabits_offset,
        fuse_table_offset,
    })
}

fn is_bit(b: u8) -> bool {
    b == b'0' || b == b'1'
}

fn find_stx(cursor: &mut Cursor<'_>) -> Result<Mark, JedecError> {
    cursor
        .seek_to(STX)
        .ok_or(JedecError::MissingMarker(Marker::Stx))?;
    Ok(cursor.mark())
}

/// Finds the `QF` line and counts the characters up to its `*`.
///
/// Leaves the cursor one past the `*`.
fn read_address_digits(cursor: &mut Cursor<'_>) -> Result<usize, JedecError> {
    cursor
        .seek_past(QF_MARKER)
        .ok_or(JedecError::MissingMarker(Marker::Qf))?;

    let start = cursor.pos();
    cursor
        .seek_to(ADDRESS_DELIMITER)
        .ok_or(JedecError::EndOfStream)?;
    let address_digits = cursor.chars_since(start);

    cursor.advance();
    if cursor.peek().is_none() {
        return Err(JedecError::EndOfStream);
    }
    Ok(address_digits)
}

fn check_feature_row(cursor: &mut Cursor<'_>) -> Result<usize, JedecError> {
    cursor
        .seek_past(FEATURE_ROW_MARKER)
        .ok_or(JedecError::MissingMarker(Marker::FeatureRow))?;

    let offset = cursor.pos();
    let bits = cursor.count_while(is_bit);
    if bits != FEATURE_ROW_BITS {
        return Err(JedecError::MalformedField {
            field: Field::FeatureRow,
            bits,
        });
    }
    Ok(offset)
}

/// Checks the bit run after the feature row.
///
/// Bit [`SPI_DISABLE_BIT`] is checked as it is read, so a set SPI bit wins
/// over a wrong run length.
fn check_feabits(cursor: &mut Cursor<'_>) -> Result<usize, JedecError> {
    cursor.skip_while(|b| !is_bit(b));

    let offset = cursor.pos();
    let mut bits = 0;
    while let Some(b) = cursor.peek().filter(|&b| is_bit(b)) {
        if bits == SPI_DISABLE_BIT && b == b'1' {
            return Err(JedecError::FeatureDisabled);
        }
        bits += 1;
        cursor.advance();
    }
    if bits != FEABITS_BITS {
        return Err(JedecError::MalformedField {
            field: Field::Feabits,
            bits,
        });
    }
    Ok(offset)
}

/// Expects the cursor to have been rewound to STX.
fn check_fuse_table_address(
    cursor: &mut Cursor<'_>,
    address_digits: usize,
) -> Result<usize, JedecError> {
    cursor
        .seek_past(FUSE_TABLE_MARKER)
        .ok_or(JedecError::MissingMarker(Marker::FuseTable))?;

    let offset = cursor.pos();
    for _ in 0..address_digits {
        if cursor.peek_char() != Some('0') {
            return Err(JedecError::NonZeroAddress {
                offset: cursor.pos(),
            });
        }
        cursor.advance_char();
    }
    Ok(offset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn bits(len: usize, set: &[usize]) -> String {
        (0..len)
            .map(|i| if set.contains(&i) { '1' } else { '0' })
            .collect()
    }

    fn body(feature_row: &str, feabits: &str, address: &str) -> String {
        format!(
            "\u{2}\nQF1024*\nE{feature_row}\n{feabits}*\nL{address} 0101*\n\u{3}0000\n"
        )
    }

    #[test]
    fn test_exempt_names_skip_scan() {
        for name in EXEMPT_NAMES {
            assert_eq!(validate(name, ""), Ok(Accepted::Exempt));
            assert_eq!(validate(name, "garbage"), Ok(Accepted::Exempt));
        }
    }

    #[test]
    fn test_extension_checked_before_length() {
        let long = "a".repeat(40);
        assert_eq!(validate(&long, ""), Err(JedecError::WrongExtension));
        assert_eq!(validate("fuses.JED", ""), Err(JedecError::WrongExtension));
    }

    #[test]
    fn test_name_length_boundary() {
        let ok = format!("{}.jed", "a".repeat(26));
        assert_eq!(ok.len(), 30);
        assert_eq!(check_name(&ok), Ok(()));

        let long = format!("{}.jed", "a".repeat(27));
        assert_eq!(
            validate(&long, ""),
            Err(JedecError::NameTooLong { len: 31 })
        );
    }

    #[test]
    fn test_name_length_counts_characters() {
        let name = format!("{}.jed", "\u{e9}".repeat(26));
        assert!(name.len() > MAX_NAME_LEN);
        assert_eq!(check_name(&name), Ok(()));
    }

    #[test]
    fn test_name_length_counts_utf16_units() {
        // Each emoji is two UTF-16 units: 13 of them plus ".jed" is 30.
        let ok = format!("{}.jed", "\u{1f600}".repeat(13));
        assert_eq!(check_name(&ok), Ok(()));

        let long = format!("{}.jed", "\u{1f600}".repeat(14));
        assert_eq!(long.chars().count(), 18);
        assert_eq!(check_name(&long), Err(JedecError::NameTooLong { len: 32 }));
    }

    #[test]
    fn test_address_digits_count_characters() {
        let content = format!(
            "\u{2}\nQF\u{e9}*\nE{}\n{}*\nL0X\n",
            bits(64, &[]),
            bits(16, &[])
        );
        let summary = scan(&content).unwrap();
        assert_eq!(summary.address_digits, 1);

        let content = format!(
            "\u{2}\nQF12*\nE{}\n{}*\nL\u{e9}0\n",
            bits(64, &[]),
            bits(16, &[])
        );
        let err = scan(&content).unwrap_err();
        assert!(matches!(err, JedecError::NonZeroAddress { .. }));
    }

    #[test]
    fn test_summary_offsets() {
        let content = body(&bits(64, &[]), &bits(16, &[]), "0000");
        let summary = scan(&content).unwrap();
        assert_eq!(summary.stx_offset, 0);
        assert_eq!(summary.address_digits, 4);
        assert_eq!(&content[summary.feature_row_offset - 1..][..1], "E");
        assert_eq!(summary.feabits_offset, summary.feature_row_offset + 65);
        assert_eq!(&content[summary.fuse_table_offset - 1..][..5], "L0000");
    }

    #[test]
    fn test_spi_bit_checked_before_length() {
        let content = body(&bits(64, &[]), &bits(12, &[9]), "0000");
        assert_eq!(scan(&content), Err(JedecError::FeatureDisabled));
    }

    #[test]
    fn test_other_feabits_may_be_set() {
        let set: Vec<usize> = (0..16).filter(|&i| i != SPI_DISABLE_BIT).collect();
        let content = body(&bits(64, &[]), &bits(16, &set), "0000");
        assert!(scan(&content).is_ok());
    }

    #[test]
    fn test_missing_asterisk_is_end_of_stream() {
        assert_eq!(scan("\u{2}\nQF1024"), Err(JedecError::EndOfStream));
    }

    #[test]
    fn test_asterisk_as_last_byte_is_end_of_stream() {
        assert_eq!(scan("\u{2}\nQF1024*"), Err(JedecError::EndOfStream));
    }

    #[test]
    fn test_no_feabits_after_feature_row() {
        let content = format!("\u{2}\nQF4*\nE{}\n", bits(64, &[]));
        assert_eq!(
            scan(&content),
            Err(JedecError::MalformedField {
                field: Field::Feabits,
                bits: 0
            })
        );
    }

    #[test]
    fn test_fuse_table_search_restarts_at_stx() {
        // The L line precedes QF, so it is only reachable after the rewind.
        let content = format!(
            "\u{2}\nL0000 1*\nQF1024*\nE{}\n{}*\n",
            bits(64, &[]),
            bits(16, &[])
        );
        let summary = scan(&content).unwrap();
        assert!(summary.fuse_table_offset < summary.feature_row_offset);
    }

    #[test]
    fn test_fuse_table_before_stx_is_not_seen() {
        let content = format!(
            "\nL0000\n\u{2}\nQF1024*\nE{}\n{}*\n",
            bits(64, &[]),
            bits(16, &[])
        );
        assert_eq!(
            scan(&content),
            Err(JedecError::MissingMarker(Marker::FuseTable))
        );
    }

    #[test]
    fn test_truncated_address_field() {
        let content = format!("\u{2}\nQF1024*\nE{}\n{}*\nL00", bits(64, &[]), bits(16, &[]));
        assert_eq!(
            scan(&content),
            Err(JedecError::NonZeroAddress {
                offset: content.len()
            })
        );
    }

    #[test]
    fn test_field_widths_agree() {
        for field in [Field::FeatureRow, Field::Feabits] {
            assert_eq!(field.expected_bytes() * 8, field.expected_bits());
        }
    }
}
