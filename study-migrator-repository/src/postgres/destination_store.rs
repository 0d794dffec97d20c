//! PostgreSQL implementation of the destination store.
//!
//! Every bulk insert runs in its own transaction and is split into as many
//! multi-row `INSERT` statements as the bind parameter limit requires.
//!
//! ## Database Tables
//!
//! - `studies`, `surveys`, `device_settings`
//! - `researchers` and the `study_researchers` relation
//! - `participants`, `chunk_registries`
use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use study_migrator_shared::types::{
    EntityKind, NewChunkRegistry, NewDeviceSettings, NewParticipant, NewResearcher, NewStudy,
    NewSurvey, PrimaryKey, StudyKey, StudyResearcher, UniqueKey,
};
use tracing::debug;

use crate::errors::DestinationStoreError;
use crate::interfaces::DestinationStore;
use crate::types::TableCounts;

/// PostgreSQL caps a single statement at this many bind parameters.
const MAX_BIND_PARAMETERS: usize = 65_535;

const STUDY_COLUMNS: &[&str] = &["name", "encryption_key", "object_id", "deleted"];

const SURVEY_COLUMNS: &[&str] = &[
    "content",
    "survey_type",
    "settings",
    "timings",
    "object_id",
    "study_id",
    "deleted",
];

const DEVICE_SETTINGS_COLUMNS: &[&str] = &[
    "accelerometer",
    "gps",
    "calls",
    "texts",
    "wifi",
    "bluetooth",
    "power_state",
    "proximity",
    "gyro",
    "magnetometer",
    "devicemotion",
    "reachability",
    "allow_upload_over_cellular_data",
    "accelerometer_off_duration_seconds",
    "accelerometer_on_duration_seconds",
    "bluetooth_on_duration_seconds",
    "bluetooth_total_duration_seconds",
    "bluetooth_global_offset_seconds",
    "check_for_new_surveys_frequency_seconds",
    "create_new_data_files_frequency_seconds",
    "gps_off_duration_seconds",
    "gps_on_duration_seconds",
    "seconds_before_auto_logout",
    "upload_data_files_frequency_seconds",
    "voice_recording_max_time_length_seconds",
    "wifi_log_frequency_seconds",
    "gyro_off_duration_seconds",
    "gyro_on_duration_seconds",
    "magnetometer_off_duration_seconds",
    "magnetometer_on_duration_seconds",
    "devicemotion_off_duration_seconds",
    "devicemotion_on_duration_seconds",
    "about_page_text",
    "call_clinician_button_text",
    "consent_form_text",
    "survey_submit_success_toast_text",
    "consent_sections",
    "study_id",
    "deleted",
];

const RESEARCHER_COLUMNS: &[&str] = &[
    "username",
    "admin",
    "password",
    "salt",
    "access_key_id",
    "access_key_secret",
    "access_key_secret_salt",
    "deleted",
];

const STUDY_RESEARCHER_COLUMNS: &[&str] = &["study_id", "researcher_id"];

const PARTICIPANT_COLUMNS: &[&str] = &[
    "patient_id",
    "device_id",
    "os_type",
    "study_id",
    "password",
    "salt",
    "deleted",
];

const CHUNK_REGISTRY_COLUMNS: &[&str] = &[
    "is_chunkable",
    "chunk_path",
    "chunk_hash",
    "data_type",
    "time_bin",
    "study_id",
    "participant_id",
    "survey_id",
    "deleted",
];

fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Study => "studies",
        EntityKind::Survey => "surveys",
        EntityKind::DeviceSettings => "device_settings",
        EntityKind::Researcher => "researchers",
        EntityKind::StudyResearcher => "study_researchers",
        EntityKind::Participant => "participants",
        EntityKind::ChunkRegistry => "chunk_registries",
    }
}

/// PostgreSQL implementation of the destination store.
///
/// Holds a connection pool; all reads go straight to the pool and every
/// insert call opens its own transaction.
pub struct PostgresDestinationStore {
    pool: PgPool,
}

impl PostgresDestinationStore {
    /// Creates a new store over an existing pool.
    ///
    /// The pool is expected to point at a database whose schema is up to
    /// date; call [`PostgresDestinationStore::migrate`] otherwise.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url` and wraps it in a store.
    ///
    /// # Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound on pooled connections
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresDestinationStore)` - Store backed by a live pool
    /// * `Err(DestinationStoreError)` - The database could not be reached
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, DestinationStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), DestinationStoreError> {
        sqlx::migrate!("src/postgres/migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts `rows` into `table` in a single transaction.
    ///
    /// Rows are grouped so that no statement binds more than
    /// [`MAX_BIND_PARAMETERS`] values. `push_row` must bind exactly one value
    /// per entry of `columns`, in order.
    ///
    /// # Arguments
    ///
    /// * `table` - Destination table
    /// * `columns` - Column list of the `INSERT`
    /// * `rows` - Records to insert (empty slices are no-ops)
    /// * `push_row` - Binds the values of one record
    async fn bulk_insert<T, F>(
        &self,
        table: &'static str,
        columns: &'static [&'static str],
        rows: &[T],
        mut push_row: F,
    ) -> Result<(), DestinationStoreError>
    where
        T: Sync,
        F: FnMut(Separated<'_, 'static, Postgres, &'static str>, &T) + Send,
    {
        if rows.is_empty() {
            return Ok(());
        }

        let rows_per_statement = (MAX_BIND_PARAMETERS / columns.len()).max(1);
        let statement = format!("INSERT INTO {table} ({}) ", columns.join(", "));

        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(rows_per_statement) {
            let mut query_builder: QueryBuilder<'static, Postgres> =
                QueryBuilder::new(statement.as_str());
            query_builder.push_values(chunk, &mut push_row);
            query_builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(table, rows = rows.len(), "Bulk insert committed");
        Ok(())
    }

    async fn count_rows(&self, kind: EntityKind) -> Result<u64, DestinationStoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_name(kind));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl DestinationStore for PostgresDestinationStore {
    async fn insert_studies(&self, studies: &[NewStudy]) -> Result<(), DestinationStoreError> {
        self.bulk_insert("studies", STUDY_COLUMNS, studies, |mut b, study| {
            b.push_bind(study.name.clone())
                .push_bind(study.encryption_key.clone())
                .push_bind(study.object_id.clone())
                .push_bind(study.deleted);
        })
        .await
    }

    async fn insert_surveys(&self, surveys: &[NewSurvey]) -> Result<(), DestinationStoreError> {
        self.bulk_insert("surveys", SURVEY_COLUMNS, surveys, |mut b, survey| {
            b.push_bind(survey.content.clone())
                .push_bind(survey.survey_type.as_str())
                .push_bind(survey.settings.clone())
                .push_bind(survey.timings.clone())
                .push_bind(survey.object_id.clone())
                .push_bind(survey.study_id)
                .push_bind(survey.deleted);
        })
        .await
    }

    async fn insert_device_settings(
        &self,
        settings: &[NewDeviceSettings],
    ) -> Result<(), DestinationStoreError> {
        self.bulk_insert(
            "device_settings",
            DEVICE_SETTINGS_COLUMNS,
            settings,
            |mut b, row| {
                let fields = &row.fields;
                b.push_bind(fields.accelerometer)
                    .push_bind(fields.gps)
                    .push_bind(fields.calls)
                    .push_bind(fields.texts)
                    .push_bind(fields.wifi)
                    .push_bind(fields.bluetooth)
                    .push_bind(fields.power_state)
                    .push_bind(fields.proximity)
                    .push_bind(fields.gyro)
                    .push_bind(fields.magnetometer)
                    .push_bind(fields.devicemotion)
                    .push_bind(fields.reachability)
                    .push_bind(fields.allow_upload_over_cellular_data);
                for (_, seconds) in fields.durations() {
                    b.push_bind(seconds);
                }
                b.push_bind(fields.about_page_text.clone())
                    .push_bind(fields.call_clinician_button_text.clone())
                    .push_bind(fields.consent_form_text.clone())
                    .push_bind(fields.survey_submit_success_toast_text.clone())
                    .push_bind(row.consent_sections.clone())
                    .push_bind(row.study_id)
                    .push_bind(row.deleted);
            },
        )
        .await
    }

    async fn insert_researchers(
        &self,
        researchers: &[NewResearcher],
    ) -> Result<(), DestinationStoreError> {
        self.bulk_insert(
            "researchers",
            RESEARCHER_COLUMNS,
            researchers,
            |mut b, researcher| {
                b.push_bind(researcher.username.clone())
                    .push_bind(researcher.admin)
                    .push_bind(researcher.password.clone())
                    .push_bind(researcher.salt.clone())
                    .push_bind(researcher.access_key_id.clone())
                    .push_bind(researcher.access_key_secret.clone())
                    .push_bind(researcher.access_key_secret_salt.clone())
                    .push_bind(researcher.deleted);
            },
        )
        .await
    }

    async fn insert_study_researchers(
        &self,
        relations: &[StudyResearcher],
    ) -> Result<(), DestinationStoreError> {
        self.bulk_insert(
            "study_researchers",
            STUDY_RESEARCHER_COLUMNS,
            relations,
            |mut b, relation| {
                b.push_bind(relation.study_id)
                    .push_bind(relation.researcher_id);
            },
        )
        .await
    }

    async fn insert_participants(
        &self,
        participants: &[NewParticipant],
    ) -> Result<(), DestinationStoreError> {
        self.bulk_insert(
            "participants",
            PARTICIPANT_COLUMNS,
            participants,
            |mut b, participant| {
                b.push_bind(participant.patient_id.clone())
                    .push_bind(participant.device_id.clone())
                    .push_bind(participant.os_type.as_str())
                    .push_bind(participant.study_id)
                    .push_bind(participant.password.clone())
                    .push_bind(participant.salt.clone())
                    .push_bind(participant.deleted);
            },
        )
        .await
    }

    async fn insert_chunk_registries(
        &self,
        chunks: &[NewChunkRegistry],
    ) -> Result<(), DestinationStoreError> {
        self.bulk_insert(
            "chunk_registries",
            CHUNK_REGISTRY_COLUMNS,
            chunks,
            |mut b, chunk| {
                b.push_bind(chunk.is_chunkable)
                    .push_bind(chunk.chunk_path.clone())
                    .push_bind(chunk.chunk_hash.clone())
                    .push_bind(chunk.data_type.as_str())
                    .push_bind(chunk.time_bin)
                    .push_bind(chunk.study_id)
                    .push_bind(chunk.participant_id)
                    .push_bind(chunk.survey_id)
                    .push_bind(chunk.deleted);
            },
        )
        .await
    }

    async fn find_study_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StudyKey>, DestinationStoreError> {
        let row = sqlx::query("SELECT id, deleted FROM studies WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(StudyKey {
                pk: row.try_get("id")?,
                deleted: row.try_get("deleted")?,
            })
        })
        .transpose()
    }

    async fn study_name(&self, pk: PrimaryKey) -> Result<Option<String>, DestinationStoreError> {
        let name = sqlx::query_scalar("SELECT name FROM studies WHERE id = $1")
            .bind(pk)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn find_survey_by_object_id(
        &self,
        object_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError> {
        let pk = sqlx::query_scalar("SELECT id FROM surveys WHERE object_id = $1")
            .bind(object_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(pk)
    }

    async fn find_participant_by_patient_id(
        &self,
        patient_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError> {
        let pk = sqlx::query_scalar("SELECT id FROM participants WHERE patient_id = $1")
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(pk)
    }

    async fn researcher_ids(&self) -> Result<HashMap<String, PrimaryKey>, DestinationStoreError> {
        let rows = sqlx::query("SELECT id, username FROM researchers")
            .fetch_all(&self.pool)
            .await?;

        let mut ids = HashMap::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get("username")?, row.try_get("id")?);
        }
        Ok(ids)
    }

    async fn exists(&self, key: UniqueKey<'_>) -> Result<bool, DestinationStoreError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            table_name(key.entity()),
            key.field()
        );
        let query = sqlx::query_scalar::<_, bool>(&sql);
        let query = match key {
            UniqueKey::DeviceSettingsStudy(study_id) => query.bind(study_id),
            other => query.bind(other.value()),
        };
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn counts(&self) -> Result<TableCounts, DestinationStoreError> {
        Ok(TableCounts {
            studies: self.count_rows(EntityKind::Study).await?,
            surveys: self.count_rows(EntityKind::Survey).await?,
            device_settings: self.count_rows(EntityKind::DeviceSettings).await?,
            researchers: self.count_rows(EntityKind::Researcher).await?,
            participants: self.count_rows(EntityKind::Participant).await?,
            chunk_registries: self.count_rows(EntityKind::ChunkRegistry).await?,
        })
    }
}
