use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{
    dev::Server,
    web::{self, Data},
    App, HttpServer,
};
use tracing_actix_web::TracingLogger;

use crate::application::event_service::EventService;
use crate::application::queue_service::enrollment_queue::{DrainLoopHandle, EnrollmentQueue};
use crate::common::configuration::QueueSettings;
use crate::infrastructure::directory::Directory;
use crate::infrastructure::persistence::Database;

use super::routes::{enrollments, events, health_check};

pub async fn run(
    listener: TcpListener,
    database: web::Data<dyn Database>,
    directory: web::Data<dyn Directory>,
    queue_settings: QueueSettings,
) -> Result<(Server, DrainLoopHandle), std::io::Error> {
    let enrollment_queue = Arc::new(EnrollmentQueue::new(
        database.clone(),
        directory.clone(),
        queue_settings,
    ));
    let drain_loop = enrollment_queue.start_drain_loop();
    let event_service = web::Data::new(EventService::new(
        database.clone(),
        directory.clone(),
        Arc::clone(&enrollment_queue),
    ));
    let enrollment_queue = web::Data::from(enrollment_queue);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/events")
                            .route("/created", web::post().to(events::event_created))
                            .route("/completed", web::post().to(events::event_completed))
                            .route("/deleted", web::post().to(events::event_deleted))
                            .route("/sync", web::post().to(events::sync_events)),
                    )
                    .service(
                        web::scope("/enrollments")
                            .route("/join", web::post().to(enrollments::user_joined))
                            .route("/leave", web::post().to(enrollments::user_left)),
                    ),
            )
            .app_data(database.clone())
            .app_data(directory.clone())
            .app_data(Data::clone(&enrollment_queue))
            .app_data(Data::clone(&event_service))
    })
    .listen(listener)?
    .run();

    Ok((server, drain_loop))
}
