use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::application::event_service::EventService;
use crate::application::queue_service::enrollment_queue::EnrollmentQueue;
use crate::common::types::EnrollmentNotice;

#[tracing::instrument(
    name = "User joined scheduled event",
    skip(enrollment_queue),
    fields(
        event_id = %notice.event_id,
        user_id = %notice.user_id
    )
)]
pub async fn user_joined(
    notice: web::Json<EnrollmentNotice>,
    enrollment_queue: web::Data<EnrollmentQueue>,
) -> HttpResponse {
    let notice = notice.into_inner();
    enrollment_queue
        .queue_enrollment(&notice.event_id, &notice.user_id)
        .await;
    HttpResponse::Created().json(json!({
        "message": "Enrollment queued"
    }))
}

#[tracing::instrument(
    name = "User left scheduled event",
    skip(event_service),
    fields(
        event_id = %notice.event_id,
        user_id = %notice.user_id
    )
)]
pub async fn user_left(
    notice: web::Json<EnrollmentNotice>,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    let notice = notice.into_inner();
    if event_service.withdraw_user(&notice).await {
        HttpResponse::Ok().json(json!({
            "message": "Enrollment withdrawn"
        }))
    } else {
        HttpResponse::InternalServerError()
            .reason("Unable to withdraw enrollment")
            .finish()
    }
}
