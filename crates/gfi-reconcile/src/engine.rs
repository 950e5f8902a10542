//! Import run driver: cleanup pre-pass, then stream, group and persist.
//!
//! Processing is strictly sequential. Each store call is awaited before the
//! next row is pulled, so grouping sees rows in source order.

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::area::AreaType;
use crate::grouper::{Grouper, RowOutcome};
use crate::location::Location;
use crate::sink::BadRecordSink;
use crate::store::{LocationStore, StoreError, StoreResult};
use crate::writer::{ReconciliationWriter, WriteOutcome};

/// Summary of one import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub fleet_id: i64,
    pub area_type: AreaType,
    pub started_at_utc: DateTime<Utc>,
    pub finished_at_utc: DateTime<Utc>,
    pub rows_read: u64,
    pub points_accepted: u64,
    pub rows_rejected: u64,
    pub locations_inserted: u64,
    pub locations_classified: u64,
    pub duplicates_ignored: u64,
    pub bad_records: u64,
    pub cleanup_deleted: u64,
    pub cleanup_cleared: u64,
    /// Names of quarantined locations, in stream order.
    pub quarantined: Vec<String>,
}

impl ImportReport {
    fn begin(run_id: Uuid, fleet_id: i64, area_type: AreaType) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            fleet_id,
            area_type,
            started_at_utc: now,
            finished_at_utc: now,
            rows_read: 0,
            points_accepted: 0,
            rows_rejected: 0,
            locations_inserted: 0,
            locations_classified: 0,
            duplicates_ignored: 0,
            bad_records: 0,
            cleanup_deleted: 0,
            cleanup_cleared: 0,
            quarantined: Vec::new(),
        }
    }

    /// Locations handed to the writer or the sink.
    pub fn locations_finalized(&self) -> u64 {
        self.locations_inserted + self.locations_classified + self.duplicates_ignored + self.bad_records
    }
}

/// Reconcile the import source for `area_type` into the fleet's destination rows.
pub async fn run_import<S>(store: &S, fleet_id: i64, area_type: AreaType) -> StoreResult<ImportReport>
where
    S: LocationStore + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("import", %run_id, fleet_id, area_type = %area_type);

    async move {
        info!("import started");
        let result = import_inner(store, run_id, fleet_id, area_type).await;
        match &result {
            Ok(r) => info!(
                rows_read = r.rows_read,
                inserted = r.locations_inserted,
                classified = r.locations_classified,
                bad_records = r.bad_records,
                "import finished"
            ),
            Err(e) => error!(error = %e, "import aborted"),
        }
        result
    }
    .instrument(span)
    .await
}

async fn import_inner<S>(
    store: &S,
    run_id: Uuid,
    fleet_id: i64,
    area_type: AreaType,
) -> StoreResult<ImportReport>
where
    S: LocationStore + ?Sized,
{
    let mut report = ImportReport::begin(run_id, fleet_id, area_type);
    let writer = ReconciliationWriter::new(store, fleet_id, area_type);
    let sink = BadRecordSink::new(store);

    let cleanup = writer.cleanup().await?;
    report.cleanup_deleted = cleanup.deleted;
    report.cleanup_cleared = cleanup.cleared;

    let mut grouper = Grouper::new(area_type);
    let mut rows = store.import_rows(area_type);

    while let Some(row) = rows.try_next().await? {
        report.rows_read += 1;
        // Out-of-range coordinates would overflow centroid arithmetic.
        row.point().check_range().map_err(|e| {
            StoreError::query(format!("validate locations_import row {}", row.id), e)
        })?;
        let name = row.location_name.clone();
        let sequence_no = row.sequence_no;

        let (outcome, finalized) = grouper.push(row);

        if let Some(done) = finalized {
            persist(&writer, &sink, done, &mut report).await?;
        }

        match outcome {
            RowOutcome::Opened => {
                report.points_accepted += 1;
                info!(location = %name, sequence_no, "started new location");
            }
            RowOutcome::Appended => {
                report.points_accepted += 1;
                let points = grouper.current().map_or(0, |l| l.number_of_points());
                debug!(location = %name, sequence_no, points, "added point");
            }
            RowOutcome::Rejected(v) => {
                report.rows_rejected += 1;
                warn!(
                    location = %name,
                    received = v.received,
                    expected = v.expected(),
                    "incorrect sequence number, point dropped"
                );
            }
        }
    }
    drop(rows);

    if let Some(last) = grouper.finish() {
        persist(&writer, &sink, last, &mut report).await?;
    }

    report.finished_at_utc = Utc::now();
    Ok(report)
}

async fn persist<S>(
    writer: &ReconciliationWriter<'_, S>,
    sink: &BadRecordSink<'_, S>,
    location: Location,
    report: &mut ImportReport,
) -> StoreResult<()>
where
    S: LocationStore + ?Sized,
{
    if location.is_bad_record() {
        sink.quarantine(&location).await?;
        report.bad_records += 1;
        report.quarantined.push(location.location_name().to_string());
        return Ok(());
    }

    match writer.write(&location).await? {
        WriteOutcome::Inserted => report.locations_inserted += 1,
        WriteOutcome::Classified { .. } => report.locations_classified += 1,
        WriteOutcome::DuplicateIgnored => report.duplicates_ignored += 1,
    }
    Ok(())
}
