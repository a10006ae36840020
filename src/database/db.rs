use crate::{
    database::{
        db_structs::{RatingRecord, RawResultRow},
        store::ResultStore
    },
    error::ProcessorError,
    model::structures::scope::RatingScope
};
use async_trait::async_trait;
use postgres_types::ToSql;
use std::{collections::HashMap, sync::Arc};
use tokio_postgres::{Client, Error, NoTls, Row};
use tracing::{error, info};

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, Error> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    fn raw_row_from_row(row: &Row) -> RawResultRow {
        RawResultRow {
            participation_id: row.get("p_id"),
            laps_completed: row.get("laps_completed"),
            finish_time: row.get("finish_time"),
            last_checkpoint: row.get("last_checkpoint"),
            event_id: row.get("e_id"),
            driver_id: row.get("d_id"),
            event_time: row.get("utc_timestamp")
        }
    }
}

#[async_trait]
impl ResultStore for DbClient {
    async fn ensure_rating_tables(&self, scope: RatingScope) -> Result<(), ProcessorError> {
        for table in [scope.read_table(), scope.write_table()] {
            let create_stmt = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    p_p_id      TEXT PRIMARY KEY,
                    e_value     DOUBLE PRECISION,
                    e_delta     DOUBLE PRECISION
                );",
                table
            );
            self.client.execute(create_stmt.as_str(), &[]).await?;
        }

        Ok(())
    }

    /// Latest rating per driver, taken from the participation whose event has
    /// the greatest timestamp among already-rated events in this scope.
    async fn get_latest_ratings(&self, scope: RatingScope) -> Result<HashMap<String, f64>, ProcessorError> {
        info!("Fetching latest ratings for scope '{}'...", scope);

        let sql = format!(
            "WITH last_elo AS (
                SELECT
                    p.d_d_id,
                    e_elo.e_value,
                    ev.e_timestamp,
                    ROW_NUMBER() OVER (
                        PARTITION BY p.d_d_id
                        ORDER BY ev.e_timestamp DESC
                    ) AS rn
                FROM {} AS e_elo
                JOIN base.participations p
                    ON p.p_id = e_elo.p_p_id
                JOIN base.events ev
                    ON ev.e_id = p.e_e_id
                WHERE ev.e_server = $1
            )
            SELECT d_d_id, e_value
            FROM last_elo
            WHERE rn = 1",
            scope.read_table()
        );

        let rows = self.client.query(sql.as_str(), &[&scope.server()]).await?;

        let mut ratings = HashMap::with_capacity(rows.len());
        for row in &rows {
            ratings.insert(row.get::<_, String>("d_d_id"), row.get::<_, f64>("e_value"));
        }

        info!("Loaded {} driver ratings", ratings.len());
        Ok(ratings)
    }

    /// Unrated result rows joined with their participation and event. The
    /// joins are LEFT so orphan rows reach the caller and can be reported
    /// before being excluded.
    async fn get_unrated_results(&self, scope: RatingScope) -> Result<Vec<RawResultRow>, ProcessorError> {
        info!("Fetching unrated results for scope '{}'...", scope);

        let rows = self
            .client
            .query(
                "SELECT
                    r.participation_id AS p_id,
                    r.finish_time,
                    r.laps_completed,
                    r.last_checkpoint,
                    p.event_id AS e_id,
                    p.driver_id AS d_id,
                    e.utc_timestamp,
                    e.server AS e_server
                FROM enriched.new_race_results r
                LEFT JOIN enriched.new_participations p
                    ON p.id = r.participation_id
                LEFT JOIN enriched.new_event e
                    ON e.id = p.event_id
                WHERE e.server = $1 OR p.id IS NULL OR e.id IS NULL",
                &[&scope.server()]
            )
            .await?;

        info!("Fetched {} unrated result rows", rows.len());
        Ok(rows.iter().map(Self::raw_row_from_row).collect())
    }

    async fn upsert_rating_records(
        &self,
        scope: RatingScope,
        records: &[RatingRecord]
    ) -> Result<u64, ProcessorError> {
        if records.is_empty() {
            return Ok(0);
        }

        let upsert_stmt = format!(
            "INSERT INTO {} (p_p_id, e_value, e_delta)
            VALUES ($1, $2, $3)
            ON CONFLICT (p_p_id) DO UPDATE
            SET e_value = EXCLUDED.e_value,
                e_delta = EXCLUDED.e_delta",
            scope.write_table()
        );
        let stmt = self.client.prepare(upsert_stmt.as_str()).await?;

        let mut written = 0;
        for record in records {
            let values: &[&(dyn ToSql + Sync)] = &[&record.participation_id, &record.rating, &record.delta];
            written += self.client.execute(&stmt, values).await?;
        }

        info!("Upserted {} rating records into {}", written, scope.write_table());
        Ok(written)
    }

    async fn begin(&self) -> Result<(), ProcessorError> {
        self.client.execute("BEGIN", &[]).await?;
        Ok(())
    }

    async fn commit(&self) -> Result<(), ProcessorError> {
        self.client.execute("COMMIT", &[]).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), ProcessorError> {
        self.client.execute("ROLLBACK", &[]).await?;
        Ok(())
    }
}
