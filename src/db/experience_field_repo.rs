use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::school::ExperienceField};

// Provedor do catálogo de campos de experiência da escola (educação
// infantil). O cadastro dos campos é colaborador externo; aqui só lemos para
// completar a grade de avaliações.
#[derive(Clone)]
pub struct ExperienceFieldRepository {
    pool: PgPool,
}

impl ExperienceFieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_school(&self, school_id: Uuid) -> Result<Vec<ExperienceField>, AppError> {
        let fields = sqlx::query_as::<_, ExperienceField>(
            "SELECT id, school_id, name, description FROM experience_fields
             WHERE school_id = $1
             ORDER BY name",
        )
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }
}
