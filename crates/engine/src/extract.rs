use crate::error::ExtractError;
use connectors::source::SourceReader;
use model::{records::row::RowData, table::TableKind};
use tracing::{debug, info, warn};

/// Everything one table's extraction produced.
#[derive(Debug)]
pub struct Extraction {
    pub rows: Vec<RowData>,
    /// Page requests issued, including the reduced-size retry if taken.
    pub requests: usize,
}

/// Pulls an entire table from the source store in fixed-size pages.
///
/// Pages are requested in increasing offset order with the table's natural
/// key as an explicit sort key, so grouping is stable across reruns. Rows
/// written to the source after the cursor has passed their position are
/// missed; this is a documented consistency gap, not detected here.
pub struct Extractor<'a> {
    source: &'a dyn SourceReader,
    page_size: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a dyn SourceReader, page_size: usize) -> Self {
        Extractor {
            source,
            page_size: page_size.max(1),
        }
    }

    /// Reads every row of `table`.
    ///
    /// A timeout-class page failure is retried exactly once at half page
    /// size; the cursor then continues from the rows actually received. Any
    /// other failure, or a failed retry, discards the accumulator and fails
    /// the table.
    pub async fn extract_all(&self, table: TableKind) -> Result<Extraction, ExtractError> {
        let name = table.table_name();
        let key = table.natural_key();

        let mut rows: Vec<RowData> = Vec::new();
        let mut requests = 0usize;
        let mut page = 0usize;
        let mut offset = 0usize;

        loop {
            requests += 1;
            let (batch, requested) = match self
                .source
                .fetch_range(name, key, offset, self.page_size)
                .await
            {
                Ok(batch) => (batch, self.page_size),
                Err(err) if err.is_timeout() => {
                    let retry_size = (self.page_size / 2).max(1);
                    warn!(
                        table = name,
                        page,
                        retry_size,
                        error = %err,
                        "page timed out, retrying once at reduced size"
                    );
                    requests += 1;
                    let batch = self
                        .source
                        .fetch_range(name, key, offset, retry_size)
                        .await
                        .map_err(|source| ExtractError::RetryExhausted {
                            table: name.to_string(),
                            page,
                            retry_size,
                            source,
                        })?;
                    (batch, retry_size)
                }
                Err(source) => {
                    return Err(ExtractError::Page {
                        table: name.to_string(),
                        page,
                        source,
                    });
                }
            };

            let received = batch.len();
            debug!(table = name, page, offset, received, "page fetched");
            rows.extend(batch);
            offset += received;
            page += 1;

            // Fewer rows than requested means the source is exhausted.
            if received < requested {
                break;
            }
        }

        info!(
            table = name,
            rows = rows.len(),
            requests,
            "extraction finished"
        );
        Ok(Extraction {
            rows,
            requests,
        })
    }
}
