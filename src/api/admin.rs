use chrono::Utc;
use mongodb::{
    bson::{doc, to_bson},
    options::FindOptions,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            form::{FormDescription, FormSpec, FormSummary, ResponseDescription},
            pagination::{Paginated, PaginationRequest},
        },
        common::form::{FormId, FormState},
        db::{
            form::{sync_publication_state, Form},
            response::Response,
        },
        mongodb::{u32_id_filter, Coll, Counter, FORM_ID_COUNTER_ID},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_forms,
        create_form,
        get_form,
        modify_form,
        publish_form,
        unpublish_form,
        delete_form,
        get_responses,
    ]
}

#[get("/forms")]
async fn get_forms(_token: AuthToken, forms: Coll<Form>) -> Result<Json<Vec<FormSummary>>> {
    let all_forms: Vec<Form> = forms.find(None, None).await?.try_collect().await?;

    // Publication state must be current before it is exposed, even in
    // summaries.
    let mut summaries = Vec::with_capacity(all_forms.len());
    for form in all_forms {
        let form = sync_publication_state(form, &forms).await?;
        summaries.push(form.into());
    }
    Ok(Json(summaries))
}

#[post("/forms", data = "<spec>", format = "json")]
pub(crate) async fn create_form(
    _token: AuthToken,
    spec: Json<FormSpec>,
    forms: Coll<Form>,
    counters: Coll<Counter>,
) -> Result<Json<FormDescription>> {
    let form_id = Counter::next(&counters, FORM_ID_COUNTER_ID).await?;
    let form = spec
        .0
        .into_form(form_id, Utc::now())
        .map_err(|e| Error::BadRequest(e.to_string()))?;
    forms.insert_one(&form, None).await?;

    // Read the stored version back so the description reflects exactly
    // what the database holds.
    let form = forms
        .find_one(u32_id_filter(form_id), None)
        .await?
        .unwrap(); // Present: just inserted.
    Ok(Json(form.into()))
}

#[get("/forms/<form_id>")]
async fn get_form(
    _token: AuthToken,
    form_id: FormId,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let form = form_by_id(form_id, &forms).await?;
    let form = sync_publication_state(form, &forms).await?;
    Ok(Json(form.into()))
}

#[put("/forms/<form_id>", data = "<spec>", format = "json")]
async fn modify_form(
    _token: AuthToken,
    form_id: FormId,
    spec: Json<FormSpec>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    // Check the form exists before deciding between 404 and 400.
    let form = form_by_id(form_id, &forms).await?;
    if form.metadata.state != FormState::Draft {
        return Err(Error::BadRequest(format!(
            "Form {} is not a draft; unpublish it before modifying",
            form_id
        )));
    }

    let (title, description, questions, settings) = spec
        .0
        .into_parts()
        .map_err(|e| Error::BadRequest(e.to_string()))?;

    let mut filter = u32_id_filter(form_id);
    filter.insert("state", FormState::Draft);
    let update = doc! {
        "$set": {
            "title": title,
            "description": description,
            "questions": to_bson(&questions).expect("Serialisation is infallible"),
            "settings": to_bson(&settings).expect("Serialisation is infallible"),
        }
    };
    let result = forms.update_one(filter, update, None).await?;
    if result.matched_count != 1 {
        return Err(Error::BadRequest(format!("Cannot modify form {}", form_id)));
    }

    let form = form_by_id(form_id, &forms).await?;
    Ok(Json(form.into()))
}

#[post("/forms/<form_id>/publish")]
pub(crate) async fn publish_form(
    _token: AuthToken,
    form_id: FormId,
    forms: Coll<Form>,
) -> Result<()> {
    let mut filter = u32_id_filter(form_id);
    filter.insert("state", FormState::Draft);
    let update = doc! {
        "$set": {
            "state": FormState::Published,
            "closed_reason": null,
        }
    };
    let result = forms.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::BadRequest(format!(
            "Form {} doesn't exist or isn't a draft; cannot publish",
            form_id
        )));
    }
    Ok(())
}

#[post("/forms/<form_id>/unpublish")]
async fn unpublish_form(_token: AuthToken, form_id: FormId, forms: Coll<Form>) -> Result<()> {
    let mut filter = u32_id_filter(form_id);
    filter.insert(
        "$or",
        vec![
            doc! { "state": FormState::Published },
            doc! { "state": FormState::Closed },
        ],
    );
    let update = doc! {
        "$set": {
            "state": FormState::Draft,
            "closed_reason": null,
        }
    };
    let result = forms.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::BadRequest(format!(
            "Form {} doesn't exist or is already a draft",
            form_id
        )));
    }
    Ok(())
}

#[delete("/forms/<form_id>")]
async fn delete_form(
    _token: AuthToken,
    form_id: FormId,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<()> {
    let form = form_by_id(form_id, &forms).await?;

    // Published forms must be unpublished first.
    if form.metadata.state == FormState::Published {
        return Err(Error::BadRequest(format!(
            "Form {} is published; unpublish it before deleting",
            form_id
        )));
    }

    // Delete the form first: if the response cleanup fails part-way, the
    // leftovers are unreachable rather than attached to a live form.
    let result = forms.delete_one(u32_id_filter(form_id), None).await?;
    assert_eq!(result.deleted_count, 1);
    responses
        .delete_many(doc! { "form_id": i64::from(form_id) }, None)
        .await?;

    Ok(())
}

#[get("/forms/<form_id>/responses?<pagination..>")]
async fn get_responses(
    _token: AuthToken,
    form_id: FormId,
    pagination: PaginationRequest,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<Paginated<ResponseDescription>>> {
    // 404 for nonexistent forms rather than an empty page.
    form_by_id(form_id, &forms).await?;

    let filter = doc! { "form_id": i64::from(form_id) };
    let options = FindOptions::builder()
        .skip(u64::from(pagination.skip()))
        .limit(i64::from(pagination.page_size))
        .sort(doc! { "submitted_at": 1, "_id": 1 })
        .build();

    let page: Vec<ResponseDescription> = responses
        .find(filter.clone(), options)
        .await?
        .map_ok(Into::into)
        .try_collect()
        .await?;
    let total = responses.count_documents(filter, None).await?;

    Ok(Json(pagination.to_paginated(total, page)))
}

/// Fetch a form or report it missing.
async fn form_by_id(form_id: FormId, forms: &Coll<Form>) -> Result<Form> {
    forms
        .find_one(u32_id_filter(form_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form with ID '{form_id}'")))
}
