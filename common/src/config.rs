//! Global application configuration.
//!
//! `AppConfig` is a lazily initialized singleton loaded from `.env` /
//! environment variables. Module-level accessor functions return owned copies
//! of individual values; per-field setters exist so tests can override
//! settings without touching the process environment.

use std::env;
use std::sync::{OnceLock, RwLock};

use chrono::NaiveTime;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub geofence_center_lat: f64,
    pub geofence_center_lon: f64,
    pub geofence_radius_m: f64,
    /// Local time after which a successful check-in counts as late.
    /// Unset means every success is on time.
    pub checkin_late_after: Option<NaiveTime>,
    pub default_locale: String,
}

static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads configuration from `.env` and the process environment.
    ///
    /// Panics when a required variable is missing or malformed; everything
    /// else falls back to a development default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "geomark".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()
                .expect("PORT must be a valid port number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET is required"),
            jwt_duration_minutes: env::var("JWT_DURATION_MINUTES")
                .unwrap_or_else(|_| "1440".into())
                .parse()
                .expect("JWT_DURATION_MINUTES must be an integer"),
            geofence_center_lat: env::var("GEOFENCE_CENTER_LAT")
                .unwrap_or_else(|_| "45.01".into())
                .parse()
                .expect("GEOFENCE_CENTER_LAT must be a number"),
            geofence_center_lon: env::var("GEOFENCE_CENTER_LON")
                .unwrap_or_else(|_| "78.22".into())
                .parse()
                .expect("GEOFENCE_CENTER_LON must be a number"),
            geofence_radius_m: env::var("GEOFENCE_RADIUS_M")
                .unwrap_or_else(|_| "400".into())
                .parse()
                .expect("GEOFENCE_RADIUS_M must be a number"),
            checkin_late_after: env::var("CHECKIN_LATE_AFTER").ok().map(|s| {
                NaiveTime::parse_from_str(&s, "%H:%M")
                    .expect("CHECKIN_LATE_AFTER must be HH:MM")
            }),
            default_locale: env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "ru".into()),
        }
    }

    /// Shared read access to the global configuration.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Reloads the configuration from the environment, clearing overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap();
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters used by tests and tooling ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_geofence(center_lat: f64, center_lon: f64, radius_m: f64) {
        AppConfig::set_field(|cfg| {
            cfg.geofence_center_lat = center_lat;
            cfg.geofence_center_lon = center_lon;
            cfg.geofence_radius_m = radius_m;
        });
    }

    pub fn set_checkin_late_after(value: Option<NaiveTime>) {
        AppConfig::set_field(|cfg| cfg.checkin_late_after = value);
    }

    pub fn set_default_locale(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.default_locale = value.into());
    }
}

// --- Module-level accessors, one per commonly read value ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn geofence_center_lat() -> f64 {
    AppConfig::global().geofence_center_lat
}

pub fn geofence_center_lon() -> f64 {
    AppConfig::global().geofence_center_lon
}

pub fn geofence_radius_m() -> f64 {
    AppConfig::global().geofence_radius_m
}

pub fn checkin_late_after() -> Option<NaiveTime> {
    AppConfig::global().checkin_late_after
}

pub fn default_locale() -> String {
    AppConfig::global().default_locale.clone()
}
