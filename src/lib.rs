#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use rocket::{Build, Rocket};

/// Assemble the server: configuration, database, external collaborators,
/// logging, and the API routes. Fairing order matters: the database and
/// verifier fairings read the managed [`Config`].
pub async fn build() -> Rocket<Build> {
    rocket::build()
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(config::MailerFairing)
        .attach(config::VerifierFairing)
        .attach(logging::LoggerFairing)
        .mount("/", api::routes())
}

/// Connect to the test database server.
#[cfg(test)]
pub async fn db_client() -> mongodb::Client {
    let uri = std::env::var("ROCKET_DB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    mongodb::Client::with_uri_str(&uri)
        .await
        .expect("Failed to connect to the test database")
}

/// A fresh random database name, so tests cannot collide.
#[cfg(test)]
pub fn database() -> String {
    config::get_database_name()
}

/// Build a rocket against an existing database connection and mailer,
/// performing the same bootstrap the ignition fairings would.
/// Used by the `#[backend_test]` harness.
#[cfg(test)]
pub async fn rocket_for_db_and_mailer(
    client: mongodb::Client,
    db_name: &str,
    mailer: aws_sdk_sesv2::Client,
) -> Rocket<Build> {
    use crate::model::{
        db::admin::ensure_admin_exists,
        mongodb::{ensure_form_id_counter_exists, ensure_indexes_exist, Coll},
    };

    let db = client.database(db_name);
    let figment = rocket::Config::figment()
        .merge(("hostname", "forms.test"))
        .merge(("auth_ttl", 600))
        .merge(("verify_timeout", 5))
        .merge(("verifier_url", "http://127.0.0.1:0/verify"))
        .merge(("sender_address", "receipts@forms.test"))
        .merge(("jwt_secret", "test-jwt-secret"))
        .merge(("verifier_secret", "test-verifier-secret"))
        .merge(("default_admin_password", "insecure test password"));
    let config: Config = figment.extract().expect("Test config is complete");

    ensure_indexes_exist(&db).await.unwrap();
    ensure_admin_exists(&Coll::from_db(&db), &config)
        .await
        .unwrap();
    ensure_form_id_counter_exists(&Coll::from_db(&db))
        .await
        .unwrap();

    let http = reqwest::Client::builder()
        .timeout(config.verify_timeout())
        .build()
        .unwrap();

    rocket::custom(figment)
        .manage(config)
        .manage(client)
        .manage(db)
        .manage(mailer)
        .manage(http)
        .mount("/", api::routes())
}
