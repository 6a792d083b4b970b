pub mod admin;
pub mod auth;
pub mod public;
pub mod submission;

use rocket::Route;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(submission::routes());
    routes
}
