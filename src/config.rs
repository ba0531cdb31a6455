// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::db::{ClassroomRepository, ExperienceFieldRepository, GradebookRepository};
use crate::services::{auth::AuthService, EvaluationService, GradebookService};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub gradebook_service: GradebookService,
    pub evaluation_service: EvaluationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Política da média anual (questão em aberto do modelo): por padrão,
        // bimestre sem média conta como 0 — compatível com o sistema antigo.
        let annual_average_ignore_missing = env::var("ANNUAL_AVERAGE_IGNORE_MISSING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let gradebook_repo = GradebookRepository::new(db_pool.clone());
        let classroom_repo = ClassroomRepository::new(db_pool.clone());
        let experience_field_repo = ExperienceFieldRepository::new(db_pool.clone());

        let auth_service = AuthService::new(jwt_secret);
        let gradebook_service =
            GradebookService::new(gradebook_repo.clone(), classroom_repo.clone());
        let evaluation_service = EvaluationService::new(
            gradebook_repo,
            classroom_repo,
            experience_field_repo,
            annual_average_ignore_missing,
        );

        Ok(Self {
            db_pool,
            auth_service,
            gradebook_service,
            evaluation_service,
        })
    }
}
