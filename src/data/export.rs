use std::io;

use thiserror::Error;

use super::model::DatasetView;

// ---------------------------------------------------------------------------
// CSV export of a filtered view
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("exported CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Write the view as CSV: the trimmed header row, then each record's
/// original cells. Loading the output back yields the same rows.
pub fn write_csv<W: io::Write>(view: &DatasetView, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&view.dataset().headers)?;
    for record in view.records() {
        out.write_record(&record.raw)?;
    }
    out.flush()?;
    Ok(())
}

/// The view as a UTF-8 CSV string, ready for a download response.
pub fn to_csv_string(view: &DatasetView) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(view, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
