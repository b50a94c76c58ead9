use actix_web::web;
use rostra::common::configuration::get_configuration;
use rostra::common::telemetry::{get_subscriber, init_tracing_subscriber};
use rostra::infrastructure::directory::http::HttpDirectory;
use rostra::infrastructure::directory::Directory;
use rostra::infrastructure::persistence::postgres::PostgresDatabase;
use rostra::infrastructure::persistence::Database;
use rostra::infrastructure::web::startup::run;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let subscriber = get_subscriber("rostra".into(), "info".into(), std::io::stdout);
    init_tracing_subscriber(subscriber);

    let configuration = get_configuration().expect("Failed to read configuration");

    let connection_pool =
        PgPool::connect_lazy(configuration.database.connection_string().expose_secret())
            .expect("Failed to connect to Postgres");
    let database: web::Data<dyn Database> =
        web::Data::from(Arc::new(PostgresDatabase::new(connection_pool)) as Arc<dyn Database>);
    let directory: web::Data<dyn Directory> =
        web::Data::from(Arc::new(HttpDirectory::new(&configuration.directory)) as Arc<dyn Directory>);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    let (server, drain_loop) = run(listener, database, directory, configuration.queue).await?;
    server.await?;
    drain_loop.stop().await;
    Ok(())
}
