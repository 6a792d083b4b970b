use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::form::{FormStatus, PublicForm},
    common::form::{FormId, FormState},
    db::form::{sync_publication_state, Form},
    mongodb::{u32_id_filter, Coll},
};

pub fn routes() -> Vec<Route> {
    routes![public_form, form_status]
}

/// Fetch the respondent-facing view of a form. Drafts are hidden; closed
/// forms are served with their closure reason so the UI can show the
/// configured closed message.
#[get("/public/forms/<form_id>")]
async fn public_form(form_id: FormId, forms: Coll<Form>) -> Result<Json<PublicForm>> {
    let form = published_form_by_id(form_id, &forms).await?;
    Ok(Json(form.into()))
}

/// Fetch just the publication status of a form.
#[get("/public/forms/<form_id>/status")]
async fn form_status(form_id: FormId, forms: Coll<Form>) -> Result<Json<FormStatus>> {
    let form = published_form_by_id(form_id, &forms).await?;
    Ok(Json(form.into()))
}

/// Load a form for public consumption: re-evaluate auto-close before the
/// publication state escapes, and treat drafts as nonexistent.
pub async fn published_form_by_id(form_id: FormId, forms: &Coll<Form>) -> Result<Form> {
    let form = forms
        .find_one(u32_id_filter(form_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form with ID '{form_id}'")))?;
    let form = sync_publication_state(form, forms).await?;
    if form.metadata.state == FormState::Draft {
        return Err(Error::not_found(format!("Form with ID '{form_id}'")));
    }
    Ok(form)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, Utc};
    use mongodb::{bson::doc, Database};
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::model::{
        api::form::{FormDescription, FormSpec},
        common::autoclose::CloseReason,
    };

    use super::*;

    #[backend_test(admin)]
    async fn drafts_are_hidden_from_the_public(client: Client) {
        let form = create_form(&client, &FormSpec::example1()).await;

        let response = client.get(uri!(public_form(form.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get(uri!(form_status(form.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn published_form_exposes_derived_pages(client: Client) {
        let form = create_form(&client, &FormSpec::example1()).await;
        publish(&client, form.id).await;

        let response = client.get(uri!(public_form(form.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let public: PublicForm = serde_json::from_str(&raw_response).unwrap();
        assert_eq!(public.state, FormState::Published);
        // example1 has one section break: two pages.
        assert_eq!(public.pages.len(), 2);
        assert_eq!(public.pages[0].questions.len(), 2);
        assert_eq!(public.pages[1].title.as_deref(), Some("Your visit"));
    }

    #[backend_test(admin)]
    async fn missing_form_is_not_found(client: Client) {
        let response = client.get(uri!(public_form(4242))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn past_deadline_closes_the_form_on_read(client: Client, db: Database) {
        let form = create_form(&client, &FormSpec::example1()).await;
        publish(&client, form.id).await;

        // Push the deadline into the past behind the server's back.
        set_deadline(&db, form.id, Utc::now() - Duration::hours(1)).await;

        let response = client.get(uri!(form_status(form.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let status: FormStatus = serde_json::from_str(&raw_response).unwrap();
        assert_eq!(status.state, FormState::Closed);
        assert_eq!(status.closed_reason, Some(CloseReason::Deadline));

        // The transition was persisted, not just reported.
        let stored = Coll::<Form>::from_db(&db)
            .find_one(u32_id_filter(form.id), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.metadata.state, FormState::Closed);
        assert_eq!(stored.metadata.closed_reason, Some(CloseReason::Deadline));
    }

    #[backend_test(admin)]
    async fn future_deadline_leaves_the_form_open(client: Client, db: Database) {
        let form = create_form(&client, &FormSpec::example1()).await;
        publish(&client, form.id).await;
        set_deadline(&db, form.id, Utc::now() + Duration::hours(1)).await;

        let response = client.get(uri!(form_status(form.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let status: FormStatus = serde_json::from_str(&raw_response).unwrap();
        assert_eq!(status.state, FormState::Published);
        assert_eq!(status.closed_reason, None);
    }

    #[backend_test(admin)]
    async fn closed_form_hides_its_pages(client: Client, db: Database) {
        let form = create_form(&client, &FormSpec::example1()).await;
        publish(&client, form.id).await;
        set_deadline(&db, form.id, Utc::now() - Duration::hours(1)).await;

        let response = client.get(uri!(public_form(form.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let public: PublicForm = serde_json::from_str(&raw_response).unwrap();
        assert_eq!(public.state, FormState::Closed);
        assert!(public.pages.is_empty());
        assert!(public.closed_message.is_some());
    }

    pub(crate) async fn create_form(client: &Client, spec: &FormSpec) -> FormDescription {
        let response = client
            .post(uri!(crate::api::admin::create_form))
            .header(ContentType::JSON)
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    pub(crate) async fn publish(client: &Client, id: FormId) {
        let response = client
            .post(uri!(crate::api::admin::publish_form(id)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    pub(crate) async fn set_deadline(
        db: &Database,
        id: FormId,
        deadline: chrono::DateTime<Utc>,
    ) {
        let result = Coll::<Form>::from_db(db)
            .update_one(
                u32_id_filter(id),
                doc! {
                    "$set": {
                        "settings.response_deadline_at":
                            mongodb::bson::DateTime::from_chrono(deadline),
                    }
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.modified_count, 1);
    }
}
