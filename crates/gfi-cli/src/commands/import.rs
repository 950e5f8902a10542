//! `gfi import <FLEET_ID> <AREA_TYPE>`

use anyhow::{Context, Result};
use gfi_config::ImportSettings;
use gfi_db::PgLocationStore;
use gfi_reconcile::{run_import, AreaType, ImportReport};
use tracing::info;

pub async fn run(
    settings: &ImportSettings,
    fleet_id: i64,
    area_type: AreaType,
    json: bool,
) -> Result<()> {
    info!(fleet_id, area_type = %area_type, "starting geofence import");

    let target = settings.database.resolve()?;
    let options = gfi_db::connect_options(&target)?;
    let store = PgLocationStore::connect_with(options, settings.database.max_connections)
        .await
        .context("import aborted before any write")?;

    let report = run_import(&store, fleet_id, area_type)
        .await
        .with_context(|| format!("import of {area_type} for fleet {fleet_id} failed"))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("report serialize failed")?
        );
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// `key=value` lines, one per report field.
pub fn render_report(r: &ImportReport) -> String {
    let lines = [
        format!("run_id={}", r.run_id),
        format!("fleet_id={}", r.fleet_id),
        format!("area_type={}", r.area_type),
        format!("started_at_utc={}", r.started_at_utc.to_rfc3339()),
        format!("finished_at_utc={}", r.finished_at_utc.to_rfc3339()),
        format!("rows_read={}", r.rows_read),
        format!("points_accepted={}", r.points_accepted),
        format!("rows_rejected={}", r.rows_rejected),
        format!("cleanup_deleted={}", r.cleanup_deleted),
        format!("cleanup_cleared={}", r.cleanup_cleared),
        format!("locations_inserted={}", r.locations_inserted),
        format!("locations_classified={}", r.locations_classified),
        format!("duplicates_ignored={}", r.duplicates_ignored),
        format!("bad_records={}", r.bad_records),
        format!("quarantined={}", r.quarantined.join(",")),
    ];
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
