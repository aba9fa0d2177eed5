pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::error::json_payload_error;

/// Registers every route. Which of them need a session is decided by the
/// [`SessionGate`](crate::auth::SessionGate) wrapped around the app.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_payload_error))
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
