pub mod classifiers;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers every `/api/v1` route. Token endpoints and registration are
/// public; everything else sits behind [`AuthMiddleware`].
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(users::create_jwt)
            .service(users::refresh_jwt)
            .service(users::validate_jwt)
            .service(users::register)
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(users::me)),
            ),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::update_task_status)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/classifiers")
            .wrap(AuthMiddleware)
            .service(classifiers::get_task_statuses),
    );
}
