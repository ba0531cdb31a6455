// src/handlers/kindergartens.rs
//
// O diário da educação infantil compartilha o núcleo (bimestres, aulas,
// chamada) com a caderneta regular — essas rotas reutilizam os handlers de
// `gradebooks`. Aqui ficam só as pontas específicas da modalidade: criação
// sem matéria, avaliação qualitativa por campo de experiência e o registro
// geral.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::gradebook::{GradebookTrack, QualitativeEvaluationInput},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateKindergartenPayload {
    #[validate(range(min = 2000, max = 2100, message = "Ano letivo inválido"))]
    #[schema(example = 2025)]
    pub academic_year: i32,
    pub school: Uuid,
    pub classroom: Uuid,
    pub teacher: Uuid,
}

// POST /api/kindergartens
#[utoipa::path(
    post,
    path = "/api/kindergartens",
    tag = "Kindergartens",
    request_body = CreateKindergartenPayload,
    responses(
        (status = 201, description = "Diário infantil criado"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_kindergarten(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateKindergartenPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let gradebook = app_state
        .gradebook_service
        .create(
            GradebookTrack::Kindergarten,
            payload.academic_year,
            payload.school,
            payload.classroom,
            payload.teacher,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(gradebook)))
}

// GET /api/kindergartens/{gradebook_id}/term/{term_id}/evaluations
// Cruza o roster atual com o catálogo de campos de experiência da escola:
// campo sem avaliação aparece como "not-yet" (apenas na resposta).
#[utoipa::path(
    get,
    path = "/api/kindergartens/{gradebook_id}/term/{term_id}/evaluations",
    operation_id = "get_qualitative_evaluations",
    tag = "Kindergartens",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID do diário"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    responses(
        (status = 200, description = "Planilha qualitativa do bimestre"),
        (status = 400, description = "Diário não é da educação infantil"),
        (status = 404, description = "Diário ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_evaluations(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state
        .evaluation_service
        .qualitative_sheet(gradebook_id, term_id)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "evaluations": evaluations }))))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeEvaluationsPayload {
    pub evaluations: Vec<QualitativeEvaluationInput>,
}

// PUT /api/kindergartens/{gradebook_id}/term/{term_id}/evaluations
// Por aluno: cada campo do payload sobrescreve o status existente ou é
// acrescentado. Faltas não são aceitas por aqui — são sempre derivadas.
#[utoipa::path(
    put,
    path = "/api/kindergartens/{gradebook_id}/term/{term_id}/evaluations",
    operation_id = "put_qualitative_evaluations",
    tag = "Kindergartens",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID do diário"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    request_body = QualitativeEvaluationsPayload,
    responses(
        (status = 200, description = "Avaliações atualizadas"),
        (status = 400, description = "Diário não é da educação infantil"),
        (status = 404, description = "Diário ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_evaluations(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QualitativeEvaluationsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state
        .evaluation_service
        .put_qualitative(gradebook_id, term_id, &payload.evaluations)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Avaliações atualizadas com sucesso.",
            "evaluations": evaluations
        })),
    ))
}

// GET /api/kindergartens/{gradebook_id}/general-record
// Melhor estágio já alcançado por campo de experiência, ano todo, com as
// faltas somadas sobre todos os bimestres.
#[utoipa::path(
    get,
    path = "/api/kindergartens/{gradebook_id}/general-record",
    tag = "Kindergartens",
    params(("gradebook_id" = Uuid, Path, description = "ID do diário")),
    responses(
        (status = 200, description = "Registro geral da turma"),
        (status = 400, description = "Diário não é da educação infantil"),
        (status = 404, description = "Diário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn general_record(
    State(app_state): State<AppState>,
    Path(gradebook_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = app_state
        .evaluation_service
        .general_record(gradebook_id)
        .await?;
    Ok((StatusCode::OK, Json(record)))
}
