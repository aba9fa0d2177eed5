use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{Condition, Logger};
use actix_web::{http::header, web, App, HttpServer};
use env_logger::Env;

use tasktrack::auth::{
    MemorySessionStore, RedisSessionStore, SessionGate, SessionManager, SessionStore,
};
use tasktrack::config::Config;
use tasktrack::db::{self, TaskRepository, UserRepository};
use tasktrack::routes;

fn to_io<E: std::fmt::Display>(context: &str, error: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600),
        None => Cors::default(),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| to_io("invalid configuration", e))?;

    let pool = db::connect(&config)
        .await
        .map_err(|e| to_io("failed to connect to database", e))?;
    db::migrate(&pool)
        .await
        .map_err(|e| to_io("failed to run migrations", e))?;

    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisSessionStore::connect(url)
                .await
                .map_err(|e| to_io("failed to connect to session store", e))?,
        ),
        None => {
            log::warn!("REDIS_URL is not set; sessions are kept in memory and lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let sessions = Arc::new(SessionManager::new(store, config.session_settings()));
    let users = web::Data::new(UserRepository::new(pool.clone(), config.db_timeout));
    let tasks = web::Data::new(TaskRepository::new(pool, config.db_timeout));
    let auth_settings = web::Data::new(config.auth_settings());
    let cors_origin = config.cors_allowed_origin.clone();

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(sessions.clone()))
            .app_data(users.clone())
            .app_data(tasks.clone())
            .app_data(auth_settings.clone())
            .wrap(SessionGate::new(sessions.clone()))
            .wrap(Logger::default())
            .wrap(Condition::new(
                cors_origin.is_some(),
                cors(cors_origin.as_deref()),
            ))
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
