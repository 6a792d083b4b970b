use aws_sdk_sesv2::Client as SesClient;
use mongodb::bson::doc;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::submission::{SubmissionReceipt, SubmissionRequest},
    common::{
        email::Email,
        form::{FormId, FormSettings, ReceiptVars},
        gate::{self, GateVerdict, SubmissionAttempt},
        validation::validate_submission,
    },
    db::{
        form::{sync_publication_state, Form},
        response::{NewResponse, Response, ResponseCore},
    },
    mongodb::{u32_id_filter, Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![submit]
}

/// Attempt to submit a response to a form.
///
/// The server re-checks everything the client may already have checked:
/// publication state (after auto-close re-evaluation), identity,
/// duplication, and answer validity, in that order. On acceptance the
/// response is persisted, the form's response count bumped, auto-close
/// re-evaluated for the benefit of the next respondent, and a best-effort
/// receipt email dispatched.
#[post("/public/forms/<form_id>/submissions", data = "<submission>", format = "json")]
async fn submit(
    form_id: FormId,
    submission: Json<SubmissionRequest>,
    forms: Coll<Form>,
    responses: Coll<Response>,
    new_responses: Coll<NewResponse>,
    config: &State<Config>,
    http: &State<reqwest::Client>,
    mailer: &State<SesClient>,
) -> Result<Json<SubmissionReceipt>> {
    let form = forms
        .find_one(u32_id_filter(form_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form with ID '{form_id}'")))?;
    let form = sync_publication_state(form, &forms).await?;

    let SubmissionRequest {
        answers,
        identity_token,
    } = submission.0;

    // Exchange the identity assertion for a verified address. The token is
    // single-use and re-presented with every attempt; its absence is only
    // an error if the form is actually open, so closure is checked first
    // via the gate below.
    let mut verified_email: Option<Email> = None;
    if form.is_published() {
        if let Some(assertion) = identity_token {
            verified_email = Some(assertion.verify(config, http).await?);
        }
    }

    // The duplicate check is keyed on the normalised verified address,
    // never on anything the client chose.
    let prior_response = match &verified_email {
        Some(email) => responses
            .find_one(
                doc! { "form_id": i64::from(form_id), "respondent_email": email.as_str() },
                None,
            )
            .await?
            .is_some(),
        None => false,
    };

    let verdict = gate::evaluate(&SubmissionAttempt {
        state: form.metadata.state,
        closed_reason: form.metadata.closed_reason,
        identity_verified: verified_email.is_some(),
        allow_multiple_responses: form.settings.allow_multiple_responses,
        prior_response,
    });
    let email = match verdict {
        GateVerdict::RejectClosed(reason) => {
            return Err(Error::FormClosed {
                reason,
                message: form.settings.closed_message.clone(),
            })
        }
        GateVerdict::RejectUnverified => {
            return Err(Error::Unverified("No identity token supplied".to_string()))
        }
        GateVerdict::RejectDuplicate => return Err(Error::DuplicateSubmission),
        // Identity was verified, or the gate would have rejected.
        GateVerdict::Accept => verified_email.unwrap(),
    };

    let outcome = validate_submission(
        &form.questions,
        &form.settings,
        &answers,
        Some(email.as_str()),
    );
    if !outcome.is_valid() {
        return Err(Error::Invalid(outcome.issues));
    }

    // Persist the response and bump the count. Deliberately
    // increment-then-recheck: the submission that reaches the cap is
    // accepted, and the re-evaluation below closes the form for the next
    // respondent. Capacity is a soft limit under concurrent writers.
    let response = ResponseCore::new(form_id, email.clone(), answers);
    let response_id: Id = new_responses
        .insert_one(&response, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Safe because the ID comes directly from the database.
        .into();
    forms
        .update_one(
            u32_id_filter(form_id),
            doc! { "$inc": { "response_count": 1 } },
            None,
        )
        .await?;

    let form = forms
        .find_one(u32_id_filter(form_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form with ID '{form_id}'")))?;
    let form = sync_publication_state(form, &forms).await?;

    send_receipt(&form.settings, &form.metadata.title, &email, &response, config, mailer).await;

    Ok(Json(SubmissionReceipt {
        response_id,
        submitted_at: response.submitted_at,
        confirmation_message: form.settings.confirmation_message.clone(),
    }))
}

/// Best-effort receipt email. Failure is logged and never rolls back or
/// fails the accepted submission.
#[cfg_attr(test, allow(unused_variables))]
async fn send_receipt(
    settings: &FormSettings,
    form_title: &str,
    email: &Email,
    response: &ResponseCore,
    config: &Config,
    mailer: &SesClient,
) {
    let notification = match &settings.email_notification {
        Some(notification) if notification.enabled => notification,
        _ => return,
    };
    let (subject, message) = notification.render(&ReceiptVars {
        email: email.as_str(),
        form_title,
        submitted_at: response.submitted_at,
    });

    #[cfg(not(test))]
    {
        use aws_sdk_sesv2::model::{Body, Content, Destination, EmailContent, Message};

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(Content::builder().data(subject).build())
                    .body(
                        Body::builder()
                            .text(Content::builder().data(message).build())
                            .build(),
                    )
                    .build(),
            )
            .build();
        let result = mailer
            .send_email()
            .from_email_address(config.sender_address())
            .destination(Destination::builder().to_addresses(email.as_str()).build())
            .content(content)
            .send()
            .await;
        if let Err(e) = result {
            warn!("Failed to send receipt email to {email}: {e}");
        }
    }
    #[cfg(test)]
    {
        debug!("Would send receipt email: {subject}");
    }
}
