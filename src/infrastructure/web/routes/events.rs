use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::application::event_service::EventService;
use crate::common::types::ScheduledEventNotice;

#[tracing::instrument(
    name = "Scheduled event created",
    skip(event_service),
    fields(
        event_id = %notice.event_id,
        event_name = %notice.name
    )
)]
pub async fn event_created(
    notice: web::Json<ScheduledEventNotice>,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    let notice = notice.into_inner();
    tracing::info!("New scheduled event created: {}", notice.name);
    if event_service.process_event(&notice).await {
        HttpResponse::Created().json(json!({
            "message": "Scheduled event processed"
        }))
    } else {
        HttpResponse::InternalServerError()
            .reason("Unable to process scheduled event")
            .finish()
    }
}

#[tracing::instrument(
    name = "Scheduled event completed",
    skip(event_service),
    fields(
        event_id = %notice.event_id,
        event_name = %notice.name
    )
)]
pub async fn event_completed(
    notice: web::Json<ScheduledEventNotice>,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    retire(notice.into_inner(), event_service).await
}

#[tracing::instrument(
    name = "Scheduled event deleted",
    skip(event_service),
    fields(
        event_id = %notice.event_id,
        event_name = %notice.name
    )
)]
pub async fn event_deleted(
    notice: web::Json<ScheduledEventNotice>,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    retire(notice.into_inner(), event_service).await
}

async fn retire(
    notice: ScheduledEventNotice,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    if event_service.retire_event(&notice).await {
        HttpResponse::Ok().json(json!({
            "message": "Scheduled event retired"
        }))
    } else {
        HttpResponse::InternalServerError()
            .reason("Unable to retire scheduled event")
            .finish()
    }
}

#[tracing::instrument(name = "Syncing scheduled events", skip(notices, event_service))]
pub async fn sync_events(
    notices: web::Json<Vec<ScheduledEventNotice>>,
    event_service: web::Data<EventService>,
) -> HttpResponse {
    let outcome = event_service.batch_process_events(&notices.into_inner()).await;
    HttpResponse::Ok().json(outcome)
}
