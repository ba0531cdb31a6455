use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::gradebook::{Gradebook, Term},
};

// O repositório de cadernetas. O agregado é um documento: colunas escalares
// para busca/listagem e a árvore de bimestres inteira na coluna JSONB
// `terms`. Toda mutação de bimestre/aula/avaliação passa por `save_terms`.
#[derive(Clone)]
pub struct GradebookRepository {
    pool: PgPool,
}

impl GradebookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, gradebook: &Gradebook) -> Result<Gradebook, AppError> {
        let saved = sqlx::query_as::<_, Gradebook>(
            r#"
            INSERT INTO gradebooks
                (id, track, academic_year, skill, subject_id, classroom_id,
                 teacher_id, school_id, terms, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(gradebook.id)
        .bind(gradebook.track)
        .bind(gradebook.academic_year)
        .bind(&gradebook.skill)
        .bind(gradebook.subject_id)
        .bind(gradebook.classroom_id)
        .bind(gradebook.teacher_id)
        .bind(gradebook.school_id)
        .bind(Json(&gradebook.terms))
        .bind(gradebook.version)
        .bind(gradebook.created_at)
        .bind(gradebook.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Gradebook>, AppError> {
        let gradebook = sqlx::query_as::<_, Gradebook>("SELECT * FROM gradebooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gradebook)
    }

    pub async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<Gradebook>, AppError> {
        let gradebooks = sqlx::query_as::<_, Gradebook>(
            "SELECT * FROM gradebooks WHERE teacher_id = $1
             ORDER BY academic_year DESC, created_at",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(gradebooks)
    }

    pub async fn list_by_school(&self, school_id: Uuid) -> Result<Vec<Gradebook>, AppError> {
        let gradebooks = sqlx::query_as::<_, Gradebook>(
            "SELECT * FROM gradebooks WHERE school_id = $1
             ORDER BY academic_year DESC, created_at",
        )
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(gradebooks)
    }

    // Atualização parcial dos campos escalares (o PUT da caderneta).
    pub async fn update_header(
        &self,
        id: Uuid,
        academic_year: Option<i32>,
        skill: Option<&str>,
        subject_id: Option<Uuid>,
        classroom_id: Option<Uuid>,
        teacher_id: Option<Uuid>,
        school_id: Option<Uuid>,
    ) -> Result<Gradebook, AppError> {
        sqlx::query_as::<_, Gradebook>(
            r#"
            UPDATE gradebooks SET
                academic_year = COALESCE($2, academic_year),
                skill         = COALESCE($3, skill),
                subject_id    = COALESCE($4, subject_id),
                classroom_id  = COALESCE($5, classroom_id),
                teacher_id    = COALESCE($6, teacher_id),
                school_id     = COALESCE($7, school_id),
                updated_at    = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(academic_year)
        .bind(skill)
        .bind(subject_id)
        .bind(classroom_id)
        .bind(teacher_id)
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::GradebookNotFound)
    }

    // Grava o documento de bimestres com verificação otimista de versão:
    // a escrita só passa se ninguém gravou desde a nossa leitura. Zero linhas
    // afetadas em caderneta existente = escrita obsoleta (409).
    pub async fn save_terms(
        &self,
        id: Uuid,
        expected_version: i64,
        terms: &[Term],
    ) -> Result<Gradebook, AppError> {
        let updated = sqlx::query_as::<_, Gradebook>(
            r#"
            UPDATE gradebooks
            SET terms = $3, version = version + 1, updated_at = now()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(Json(terms))
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(gradebook) => Ok(gradebook),
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM gradebooks WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
                if exists {
                    Err(AppError::StaleWrite)
                } else {
                    Err(AppError::GradebookNotFound)
                }
            }
        }
    }
}
