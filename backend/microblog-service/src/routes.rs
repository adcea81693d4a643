/// Route table
///
/// Everything under `/api` except signup, login, logout and health sits
/// behind the session gate.
use crate::error::AppError;
use crate::handlers::{auth, health, notifications, posts, users};
use crate::state::AppState;
use actix_middleware::SessionAuth;
use actix_web::{web, HttpRequest};

/// Register state, extractor configuration and every route
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let gate = SessionAuth::new(state.identity_resolver());

    cfg.app_data(web::Data::new(state.clone()))
        .app_data(json_config())
        .route("/metrics", web::get().to(health::metrics))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health))
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(auth::signup))
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout))
                        .service(
                            web::resource("/me")
                                .wrap(gate.clone())
                                .route(web::get().to(auth::me)),
                        ),
                )
                .service(
                    web::scope("/users")
                        .wrap(gate.clone())
                        .route("/profile/{username}", web::get().to(users::profile))
                        .route("/suggested", web::get().to(users::suggested))
                        .route("/follow/{id}", web::post().to(users::follow))
                        .route("/update", web::post().to(users::update)),
                )
                .service(
                    web::scope("/posts")
                        .wrap(gate.clone())
                        .route("/all", web::get().to(posts::all))
                        .route("/following", web::get().to(posts::following))
                        .route("/likes/{id}", web::get().to(posts::liked))
                        .route("/user/{username}", web::get().to(posts::by_user))
                        .route("/create", web::post().to(posts::create))
                        .route("/like/{id}", web::post().to(posts::like))
                        .route("/comment/{id}", web::post().to(posts::comment))
                        .route("/{id}", web::delete().to(posts::delete)),
                )
                .service(
                    web::scope("/notifications")
                        .wrap(gate)
                        .service(
                            web::resource("")
                                .route(web::get().to(notifications::list))
                                .route(web::delete().to(notifications::delete_all)),
                        )
                        .route("/{id}", web::delete().to(notifications::delete_one)),
                ),
        );
}

/// Malformed JSON bodies are reported as `400 {"error": ...}`
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(|err, _req: &HttpRequest| {
            AppError::Validation(format!("Invalid request body: {err}")).into()
        })
}
