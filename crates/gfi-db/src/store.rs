//! Postgres implementation of [`LocationStore`].
//!
//! Source rows come from `locations_import`, destination rows live in
//! `fleet_locations`. Each method issues exactly one statement; there is no
//! transaction spanning calls.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use gfi_reconcile::{
    AreaType, AreaTypeFlags, ImportRow, ImportRowStream, LocationStore, NewFleetLocation,
    StoreError, StoreResult,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const SELECT_IMPORT_ROWS: &str = r#"
    select id, location_name, speed_limit, is_safe, sequence_no, latitude, longitude
    from locations_import
    where area_type = $1
    order by location_name, sequence_no
"#;

/// A refused connection is retried until this elapses.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a fresh pool. Failure maps to [`StoreError::Connection`].
    pub async fn connect_with(options: PgConnectOptions, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(crate::MIN_CONNECTIONS))
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(StoreError::connection)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_import_row(r: PgRow) -> StoreResult<ImportRow> {
    let decode = |e: sqlx::Error| StoreError::query("decode locations_import row", e);
    Ok(ImportRow {
        id: r.try_get::<i64, _>("id").map_err(decode)?,
        location_name: r.try_get::<String, _>("location_name").map_err(decode)?,
        speed_limit: r
            .try_get::<Option<Decimal>, _>("speed_limit")
            .map_err(decode)?,
        is_safe: r.try_get::<bool, _>("is_safe").map_err(decode)?,
        sequence_no: r.try_get::<i32, _>("sequence_no").map_err(decode)?,
        latitude: r.try_get::<Decimal, _>("latitude").map_err(decode)?,
        longitude: r.try_get::<Decimal, _>("longitude").map_err(decode)?,
    })
}

#[async_trait]
impl LocationStore for PgLocationStore {
    fn import_rows(&self, area_type: AreaType) -> ImportRowStream<'_> {
        sqlx::query(SELECT_IMPORT_ROWS)
            .bind(area_type.as_str())
            .fetch(&self.pool)
            .map(move |res| {
                res.map_err(|e| {
                    StoreError::query(
                        format!("select locations to import for area type {area_type}"),
                        e,
                    )
                })
                .and_then(decode_import_row)
            })
            .boxed()
    }

    async fn delete_imported_with_flags(
        &self,
        fleet_id: i64,
        flags: AreaTypeFlags,
    ) -> StoreResult<u64> {
        let [location, speed_area, keep_in, no_go, collection] = flags.as_array();
        let res = sqlx::query(
            r#"
            delete from fleet_locations
            where fleet = $1
              and imported
              and area_location = $2
              and area_speed_area = $3
              and area_keep_in = $4
              and area_no_go = $5
              and area_collection = $6
            "#,
        )
        .bind(fleet_id)
        .bind(location)
        .bind(speed_area)
        .bind(keep_in)
        .bind(no_go)
        .bind(collection)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StoreError::query(format!("delete fleet_locations with flags {flags}"), e)
        })?;
        Ok(res.rows_affected())
    }

    async fn clear_imported_flag(&self, fleet_id: i64, area_type: AreaType) -> StoreResult<u64> {
        // Column name comes from a closed enum, never from input.
        let sql = format!(
            "update fleet_locations set {} = false where fleet = $1 and imported",
            area_type.flag_column()
        );
        let res = sqlx::query(&sql)
            .bind(fleet_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                StoreError::query(format!("clear {area_type} flag on fleet_locations"), e)
            })?;
        Ok(res.rows_affected())
    }

    async fn find_imported(
        &self,
        fleet_id: i64,
        location_name: &str,
    ) -> StoreResult<Option<i64>> {
        let found: Option<(i64,)> = sqlx::query_as(
            r#"
            select loc_id
            from fleet_locations
            where location_name = $1 and fleet = $2 and imported
            order by loc_id
            limit 1
            "#,
        )
        .bind(location_name)
        .bind(fleet_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            StoreError::query(format!("look up fleet_location '{location_name}'"), e)
        })?;
        Ok(found.map(|(id,)| id))
    }

    async fn set_flag(&self, loc_id: i64, area_type: AreaType) -> StoreResult<()> {
        let sql = format!(
            "update fleet_locations set {} = true where loc_id = $1",
            area_type.flag_column()
        );
        sqlx::query(&sql)
            .bind(loc_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                StoreError::query(format!("set {area_type} flag on loc_id {loc_id}"), e)
            })?;
        Ok(())
    }

    async fn insert_imported(&self, l: &NewFleetLocation) -> StoreResult<bool> {
        let [location, speed_area, keep_in, no_go, collection] = l.flags.as_array();
        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            insert into fleet_locations (
              location_name, latitude, longitude,
              topleft_lat, topleft_long, bottomright_lat, bottomright_long,
              complexpoints, fleet, service_loc_flag, corridor_flag,
              speed_zone_override, speed_zone_flag, location_color, imported,
              area_location, area_speed_area, area_keep_in, area_no_go, area_collection
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, true,
              $15, $16, $17, $18, $19
            )
            on conflict (fleet, location_name) do nothing
            returning loc_id
            "#,
        )
        .bind(&l.location_name)
        .bind(l.latitude)
        .bind(l.longitude)
        .bind(l.top_left_lat)
        .bind(l.top_left_lon)
        .bind(l.bottom_right_lat)
        .bind(l.bottom_right_lon)
        .bind(&l.complex_points)
        .bind(l.fleet_id)
        .bind(l.service_loc_flag)
        .bind(l.corridor_flag)
        .bind(l.speed_zone_override)
        .bind(l.speed_zone_flag)
        .bind(&l.location_color)
        .bind(location)
        .bind(speed_area)
        .bind(keep_in)
        .bind(no_go)
        .bind(collection)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            StoreError::query(
                format!("insert fleet_location '{}'", l.location_name),
                e,
            )
        })?;
        Ok(inserted.is_some())
    }

    async fn mark_bad_record(&self, source_id: i64, reason: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            update locations_import
            set bad_record = true,
                bad_record_reason = $1
            where id = $2
            "#,
        )
        .bind(reason)
        .bind(source_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            StoreError::query(
                format!("mark locations_import id {source_id} as bad record"),
                e,
            )
        })?;
        Ok(())
    }
}
