//! Test support for fitlingo.
//!
//! [`TestDb`] is a freshly migrated database on a PostgreSQL server shared
//! by the whole test binary: the server named by `FITLINGO_TEST_PG_URL`
//! when set, otherwise a testcontainers instance started on first use.
//! Databases are created and migrated through `fitlingo_db::pool`, the
//! same path `fitlingo db-init` takes.
//!
//! Fixtures ([`sample_user`], [`sample_plan`]) and the in-memory doubles
//! for the [`UserStore`] and [`Generator`] seams live here too.
//!
//! [`UserStore`]: fitlingo_core::UserStore
//! [`Generator`]: fitlingo_core::generator::Generator

mod fakes;

pub use fakes::{InMemoryUserStore, ScriptedGenerator, text_envelope};

use serde_json::{Value, json};
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use fitlingo_core::PgUserStore;
use fitlingo_db::config::DbConfig;
use fitlingo_db::models::{NewUser, User, WeightGoal};
use fitlingo_db::pool;
use fitlingo_db::queries::users;

const PG_URL_ENV: &str = "FITLINGO_TEST_PG_URL";

struct Server {
    /// Connection URL without a database name.
    url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(url) = std::env::var(PG_URL_ENV) {
        return Server {
            url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    Server {
        url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

async fn server_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.url
}

// ---------------------------------------------------------------------------
// Temporary databases
// ---------------------------------------------------------------------------

/// A uniquely named database with the `users` schema applied.
///
/// Call [`TestDb::teardown`] at the end of the test to drop it.
pub struct TestDb {
    pub pool: PgPool,
    config: DbConfig,
}

impl TestDb {
    pub async fn create() -> Self {
        let name = format!("fitlingo_test_{}", Uuid::new_v4().simple());
        let config = DbConfig::new(format!("{}/{name}", server_url().await));

        pool::ensure_database_exists(&config)
            .await
            .unwrap_or_else(|e| panic!("failed to create {name}: {e:#}"));
        let pool = pool::create_pool(&config)
            .await
            .unwrap_or_else(|e| panic!("failed to connect to {name}: {e:#}"));
        pool::run_migrations(&pool)
            .await
            .expect("migrations should succeed");

        Self { pool, config }
    }

    /// A [`PgUserStore`] over this database.
    pub fn store(&self) -> PgUserStore {
        PgUserStore::new(self.pool.clone())
    }

    /// Insert [`sample_user`] under `username`, storing `plan` for it when
    /// given.
    pub async fn seed_user(&self, username: &str, plan: Option<&Value>) -> User {
        let mut user = users::insert_user(&self.pool, &sample_user(username))
            .await
            .expect("seed insert should succeed");
        if let Some(plan) = plan {
            users::set_user_plan(&self.pool, username, plan)
                .await
                .expect("seed plan should be stored");
            user.plan = Some(plan.clone());
        }
        user
    }

    /// Close the pool and drop the database.
    pub async fn teardown(self) {
        self.pool.close().await;

        let quoted = self
            .config
            .quoted_database_name()
            .expect("test database URL carries a name");
        let maint_pool = pool::connect_maintenance(&self.config)
            .await
            .expect("maintenance connection for cleanup");
        let _ = maint_pool
            .execute(format!("DROP DATABASE IF EXISTS {quoted} WITH (FORCE)").as_str())
            .await;
        maint_pool.close().await;
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A complete registration for `username`.
pub fn sample_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_owned(),
        first_name: "Tom".to_owned(),
        last_name: "Cat".to_owned(),
        age: 25,
        weight: 70.0,
        sex: "m".to_owned(),
        height: 175.0,
        weight_goal: WeightGoal("lose".to_owned(), 5.0),
        health_conditions: vec!["asthma".to_owned()],
        machine_access: true,
        dumbbells_access: false,
        frequency: 3,
        days: 2,
        intensity: None,
        skill_level: Some("intermediate".to_owned()),
    }
}

/// Two days: two workouts on day 1, a single rest entry on day 2.
pub fn sample_plan() -> Value {
    json!({
        "days": [
            {
                "day-name": "push",
                "day-number": 1,
                "workouts": [
                    {"name": "bench press", "sets": 3, "reps": 10, "instructions": "press"},
                    {"name": "dips", "sets": 3, "reps": 12, "instructions": "dip"}
                ]
            },
            {
                "day-name": "rest",
                "day-number": 2,
                "workouts": [
                    {"name": "rest", "sets": 1, "reps": 1, "instructions": "rest today"}
                ]
            }
        ]
    })
}
