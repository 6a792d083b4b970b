use std::time::Duration as StdDuration;

use aws_config::SdkConfig;
use aws_credential_types::{provider::SharedCredentialsProvider, Credentials};
use aws_sdk_sesv2::{Client as SesClient, Region};
use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    db::admin::ensure_admin_exists,
    mongodb::{ensure_form_id_counter_exists, ensure_indexes_exist, Coll},
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    hostname: String,
    auth_ttl: u32,
    verify_timeout: u32,
    verifier_url: String,
    sender_address: String,
    // secrets
    jwt_secret: String,
    verifier_secret: String,
    default_admin_password: String,
}

impl Config {
    /// The hostname the site is running on.
    /// Sent to the identity provider as the expected audience.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Upper bound on one identity verification call. Verification fails
    /// closed when this elapses.
    pub fn verify_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.verify_timeout.into())
    }

    /// Endpoint of the external identity provider.
    pub fn verifier_url(&self) -> &str {
        &self.verifier_url
    }

    /// Sender address for receipt emails.
    pub fn sender_address(&self) -> &str {
        &self.sender_address
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Secret presented to the identity provider.
    pub fn verifier_secret(&self) -> &str {
        &self.verifier_secret
    }

    /// Password given to the bootstrap admin account.
    pub fn default_admin_password(&self) -> &str {
        &self.default_admin_password
    }
}

/// A fairing that loads the application config and puts it in managed
/// state. This could easily be achieved using `AdHoc::config`, but is
/// written out explicitly for symmetry with the other fairings and control
/// over error messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a
/// `Database` into managed state. Depends on [`ConfigFairing`] having run.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let db_config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        let client = match MongoClient::with_uri_str(db_config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to set up database indexes: {e}");
            return Err(rocket);
        }

        // Ensure there is at least one admin user and the global form ID
        // counter exists.
        let config = match rocket.state::<Config>() {
            Some(config) => config,
            None => {
                error!("Config was not available during database setup");
                return Err(rocket);
            }
        };
        if let Err(e) = ensure_admin_exists(&Coll::from_db(&db), config).await {
            error!("Failed to bootstrap admin user: {e}");
            return Err(rocket);
        }
        if let Err(e) = ensure_form_id_counter_exists(&Coll::from_db(&db)).await {
            error!("Failed to bootstrap form ID counter: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
pub(crate) fn get_database_name() -> String {
    "formflow".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
pub(crate) fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}

/// Configuration for the AWS connection.
#[derive(Deserialize)]
struct AwsConfig {
    // non-secrets
    aws_region: String,
    aws_access_key_id: String,
    // secrets
    aws_secret_access_key: String,
}

/// A fairing that loads the AWS config and places an SES `Client` into
/// managed state, used for best-effort receipt emails.
pub struct MailerFairing;

#[rocket::async_trait]
impl Fairing for MailerFairing {
    fn info(&self) -> Info {
        Info {
            name: "AWS SES",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<AwsConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load AWS config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let aws_config = SdkConfig::builder()
            .region(Region::new(config.aws_region))
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                config.aws_access_key_id,
                config.aws_secret_access_key,
                None,
                None,
                "rocket config",
            )))
            .build();
        let client = SesClient::new(&aws_config);
        info!("Loaded Amazon SES config");

        rocket = rocket.manage(client);
        Ok(rocket)
    }
}

/// A fairing that builds the HTTP client used to call the identity
/// provider, with the configured bounded timeout. Depends on
/// [`ConfigFairing`] having run.
pub struct VerifierFairing;

#[rocket::async_trait]
impl Fairing for VerifierFairing {
    fn info(&self) -> Info {
        Info {
            name: "Identity Verifier",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let timeout = match rocket.state::<Config>() {
            Some(config) => config.verify_timeout(),
            None => {
                error!("Config was not available when building the verifier client");
                return Err(rocket);
            }
        };
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build the verifier HTTP client: {e}");
                return Err(rocket);
            }
        };

        rocket = rocket.manage(client);
        Ok(rocket)
    }
}
