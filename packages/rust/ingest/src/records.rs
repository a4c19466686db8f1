//! CSV loading for the vendor export.
//!
//! The first row is a header and is skipped. Every data row must carry
//! exactly [`SourceRecord::FIELD_COUNT`] fields; one bad row fails the whole
//! load so a run never starts from a partially understood file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, instrument};

use contactsync_shared::{ContactSyncError, Result, SourceRecord};

/// Read every record from the CSV file at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<SourceRecord>> {
    let file = File::open(path).map_err(|e| ContactSyncError::io(path, e))?;
    let records = parse_records(file)?;
    debug!(count = records.len(), "loaded input records");
    Ok(records)
}

/// Parse records from any CSV source.
pub fn parse_records<R: Read>(source: R) -> Result<Vec<SourceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row_number = index + 1;
        let row = row.map_err(|e| {
            ContactSyncError::validation(format!("row {row_number} could not be read: {e}"))
        })?;

        if row.len() != SourceRecord::FIELD_COUNT {
            return Err(ContactSyncError::validation(format!(
                "row {row_number} has {} columns, expected {}",
                row.len(),
                SourceRecord::FIELD_COUNT
            )));
        }

        records.push(SourceRecord::from_fields(row.iter())?);
    }

    if records.is_empty() {
        return Err(ContactSyncError::validation(
            "CSV file is empty or has no data rows",
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str =
        "NAT,STOP,CATEGORY,ID,CONTACTS,EMAIL,WEBSITE,VENDOR,ADDRESS,IDCODE,PHONE,FAX,CITY,COUNTRY\n";

    #[test]
    fn reads_fixture_in_column_order() {
        let records = read_records(Path::new("../../../fixtures/csv/contacts.fixture.csv"))
            .expect("fixture parses");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].email, "first@example.com");
        assert_eq!(records[0].vendor_name, "Alpha Trading LLC");
        assert_eq!(records[0].category, "44100000");
        assert_eq!(records[1].phone, "+995555000222");
        assert_eq!(records[2].website, "http://");
        assert_eq!(records[2].country, "Georgia");
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let input = format!(
            "{HEADER}GE,0,T-1,1,2,a@example.com,,\"Acme, Ltd\",\"1 Main St, Apt 2\",1,+1,,Tbilisi,Georgia\n"
        );
        let records = parse_records(input.as_bytes()).expect("parses");
        assert_eq!(records[0].vendor_name, "Acme, Ltd");
        assert_eq!(records[0].address, "1 Main St, Apt 2");
    }

    #[test]
    fn wrong_arity_names_the_row() {
        let input = format!(
            "{HEADER}GE,0,T-1,1,2,a@example.com,,Acme,Addr,1,+1,,Tbilisi,Georgia\nGE,0,T-1,1,2,b@example.com\n"
        );
        let err = parse_records(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ContactSyncError::Validation { .. }));
        assert!(err.to_string().contains("row 2 has 6 columns"), "{err}");
    }

    #[test]
    fn header_only_is_rejected() {
        let err = parse_records(HEADER.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));

        let err = parse_records("".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ContactSyncError::Io { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{HEADER}GE,0,T-9,9,1,z@example.com,,Zeta,Addr,9,,,Batumi,Georgia\n"
        )
        .unwrap();

        let records = read_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].city, "Batumi");
        assert_eq!(records[0].phone, "");
    }
}
