//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::handlers::{gradebooks, kindergartens};
use crate::middleware::auth::auth_guard;

// O núcleo (bimestres, aulas, chamada, registro anual) é o mesmo para as
// duas modalidades — estas rotas são aninhadas tanto em /api/gradebooks
// quanto em /api/kindergartens.
fn aggregate_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{gradebook_id}",
            get(gradebooks::get_gradebook).put(gradebooks::update_gradebook),
        )
        .route("/teacher/{teacher_id}", get(gradebooks::list_by_teacher))
        .route("/school/{school_id}", get(gradebooks::list_by_school))
        .route("/{gradebook_id}/term", post(gradebooks::create_term))
        .route(
            "/{gradebook_id}/term/{term_id}",
            put(gradebooks::update_term).delete(gradebooks::delete_term),
        )
        .route(
            "/{gradebook_id}/term/{term_id}/lesson",
            post(gradebooks::create_lesson),
        )
        .route(
            "/{gradebook_id}/term/{term_id}/lesson/{lesson_id}",
            put(gradebooks::update_lesson).delete(gradebooks::delete_lesson),
        )
        .route(
            "/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance",
            post(gradebooks::create_attendance)
                .put(gradebooks::update_attendance)
                .get(gradebooks::get_attendance),
        )
        .route(
            "/{gradebook_id}/learning-record",
            get(gradebooks::learning_record),
        )
}

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas da caderneta do ensino regular (aprovação e notas numéricas
    // só existem aqui)
    let gradebook_routes = aggregate_routes()
        .route("/", post(gradebooks::create_gradebook))
        .route(
            "/{gradebook_id}/term/{term_id}/approval",
            post(gradebooks::toggle_term_approval),
        )
        .route(
            "/{gradebook_id}/term/{term_id}/evaluations",
            get(gradebooks::get_evaluations).put(gradebooks::put_evaluations),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas do diário da educação infantil (avaliação qualitativa por campo
    // de experiência + registro geral)
    let kindergarten_routes = aggregate_routes()
        .route("/", post(kindergartens::create_kindergarten))
        .route(
            "/{gradebook_id}/term/{term_id}/evaluations",
            get(kindergartens::get_evaluations).put(kindergartens::put_evaluations),
        )
        .route(
            "/{gradebook_id}/general-record",
            get(kindergartens::general_record),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/gradebooks", gradebook_routes)
        .nest("/api/kindergartens", kindergarten_routes)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
