use std::{io, sync::Arc};

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use event_invitations::{
    config::{Settings, StoreBackend},
    db::{self, memory::MemoryStore, PgStore, Store},
    errors::AppError,
    handlers,
    service::log::{init_logger, LoggerMiddleware},
    state::AppState,
};

fn startup_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn Store>, AppError> {
    match settings.store_backend {
        StoreBackend::Postgres => {
            let db_url = settings
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::ConfigurationError("DATABASE_URL is not set".to_string()))?;
            let pool = db::init_db_pool(db_url, settings.db_max_connections).await?;
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            Ok(store)
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store, data is lost on restart");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            Ok(store)
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    init_logger();

    let settings = Settings::from_env().map_err(startup_error)?;
    if settings.public_base_url.is_none() {
        warn!("PUBLIC_BASE_URL is not set, invitations cannot be created");
    }
    let store = build_store(&settings).await.map_err(startup_error)?;
    let bind = (settings.bind_host.clone(), settings.bind_port);
    let state = AppState::new(store, settings);

    info!("listening on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(LoggerMiddleware)
            .configure(handlers::config)
    })
    .bind(bind)?
    .run()
    .await
}
