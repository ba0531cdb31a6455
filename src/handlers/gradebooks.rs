// src/handlers/gradebooks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::gradebook::{AttendanceEntry, GradebookTrack, NumericEvaluationInput},
};

// =============================================================================
//  ÁREA 1: CRUD DA CADERNETA
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradebookPayload {
    #[validate(range(min = 2000, max = 2100, message = "Ano letivo inválido"))]
    #[schema(example = 2025)]
    pub academic_year: i32,
    pub school: Uuid,
    pub classroom: Uuid,
    pub teacher: Uuid,
    pub subject: Uuid,
}

// POST /api/gradebooks
#[utoipa::path(
    post,
    path = "/api/gradebooks",
    tag = "Gradebooks",
    request_body = CreateGradebookPayload,
    responses(
        (status = 201, description = "Caderneta criada"),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_gradebook(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateGradebookPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let gradebook = app_state
        .gradebook_service
        .create(
            GradebookTrack::Regular,
            payload.academic_year,
            payload.school,
            payload.classroom,
            payload.teacher,
            Some(payload.subject),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(gradebook)))
}

// GET /api/gradebooks/{gradebook_id}
#[utoipa::path(
    get,
    path = "/api/gradebooks/{gradebook_id}",
    tag = "Gradebooks",
    params(("gradebook_id" = Uuid, Path, description = "ID da caderneta")),
    responses(
        (status = 200, description = "Caderneta encontrada"),
        (status = 404, description = "Caderneta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_gradebook(
    State(app_state): State<AppState>,
    Path(gradebook_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state.gradebook_service.get(gradebook_id).await?;
    Ok((StatusCode::OK, Json(gradebook)))
}

// GET /api/gradebooks/teacher/{teacher_id}
#[utoipa::path(
    get,
    path = "/api/gradebooks/teacher/{teacher_id}",
    tag = "Gradebooks",
    params(("teacher_id" = Uuid, Path, description = "ID do professor")),
    responses((status = 200, description = "Cadernetas do professor")),
    security(("api_jwt" = []))
)]
pub async fn list_by_teacher(
    State(app_state): State<AppState>,
    Path(teacher_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let gradebooks = app_state
        .gradebook_service
        .list_by_teacher(teacher_id)
        .await?;
    Ok((StatusCode::OK, Json(gradebooks)))
}

// GET /api/gradebooks/school/{school_id}
#[utoipa::path(
    get,
    path = "/api/gradebooks/school/{school_id}",
    tag = "Gradebooks",
    params(("school_id" = Uuid, Path, description = "ID da escola")),
    responses((status = 200, description = "Cadernetas da escola")),
    security(("api_jwt" = []))
)]
pub async fn list_by_school(
    State(app_state): State<AppState>,
    Path(school_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let gradebooks = app_state
        .gradebook_service
        .list_by_school(school_id)
        .await?;
    Ok((StatusCode::OK, Json(gradebooks)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGradebookPayload {
    #[validate(range(min = 2000, max = 2100, message = "Ano letivo inválido"))]
    pub academic_year: Option<i32>,
    pub skill: Option<String>,
    pub school: Option<Uuid>,
    pub classroom: Option<Uuid>,
    pub teacher: Option<Uuid>,
    pub subject: Option<Uuid>,
}

// PUT /api/gradebooks/{gradebook_id}
#[utoipa::path(
    put,
    path = "/api/gradebooks/{gradebook_id}",
    tag = "Gradebooks",
    params(("gradebook_id" = Uuid, Path, description = "ID da caderneta")),
    request_body = UpdateGradebookPayload,
    responses(
        (status = 200, description = "Caderneta atualizada"),
        (status = 404, description = "Caderneta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_gradebook(
    State(app_state): State<AppState>,
    Path(gradebook_id): Path<Uuid>,
    Json(payload): Json<UpdateGradebookPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let gradebook = app_state
        .gradebook_service
        .update_header(
            gradebook_id,
            payload.academic_year,
            payload.skill.as_deref(),
            payload.subject,
            payload.classroom,
            payload.teacher,
            payload.school,
        )
        .await?;

    Ok((StatusCode::OK, Json(gradebook)))
}

// =============================================================================
//  ÁREA 2: BIMESTRES
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermPayload {
    #[schema(example = "1º Bimestre")]
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// POST /api/gradebooks/{gradebook_id}/term
#[utoipa::path(
    post,
    path = "/api/gradebooks/{gradebook_id}/term",
    tag = "Terms",
    params(("gradebook_id" = Uuid, Path, description = "ID da caderneta")),
    request_body = CreateTermPayload,
    responses(
        (status = 201, description = "Bimestre adicionado"),
        (status = 400, description = "Data de término anterior à de início"),
        (status = 404, description = "Caderneta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_term(
    State(app_state): State<AppState>,
    Path(gradebook_id): Path<Uuid>,
    Json(payload): Json<CreateTermPayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .add_term(
            gradebook_id,
            payload.name,
            payload.start_date,
            payload.end_date,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Bimestre adicionado com sucesso!", "gradebook": gradebook })),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTermPayload {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// PUT /api/gradebooks/{gradebook_id}/term/{term_id}
#[utoipa::path(
    put,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}",
    tag = "Terms",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    request_body = UpdateTermPayload,
    responses(
        (status = 200, description = "Bimestre atualizado"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_term(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTermPayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .update_term(
            gradebook_id,
            term_id,
            payload.name,
            payload.start_date,
            payload.end_date,
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Bimestre atualizado com sucesso!", "gradebook": gradebook })),
    ))
}

// DELETE /api/gradebooks/{gradebook_id}/term/{term_id}
#[utoipa::path(
    delete,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}",
    tag = "Terms",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    responses(
        (status = 200, description = "Bimestre removido (aulas e avaliações descartadas)"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_term(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .delete_term(gradebook_id, term_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Bimestre removido com sucesso.", "gradebook": gradebook })),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPayload {
    pub comments: Option<String>,
}

// POST /api/gradebooks/{gradebook_id}/term/{term_id}/approval
// Alterna a aprovação da coordenação, registrando o aprovador autenticado.
#[utoipa::path(
    post,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/approval",
    tag = "Terms",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    request_body = ApprovalPayload,
    responses(
        (status = 200, description = "Aprovação alternada"),
        (status = 400, description = "Caderneta não é do ensino regular"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_term_approval(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ApprovalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .toggle_approval(gradebook_id, term_id, principal.id, payload.comments)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Aprovação atualizada com sucesso.", "gradebook": gradebook })),
    ))
}

// =============================================================================
//  ÁREA 3: AULAS E CHAMADA
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonPayload {
    #[schema(example = "Frações")]
    pub topic: Option<String>,
    pub date: Option<NaiveDate>,
    // Carga horária em horas-aula.
    #[schema(example = 2.0)]
    pub workload: Option<f64>,
}

// POST /api/gradebooks/{gradebook_id}/term/{term_id}/lesson
// Se a turma tiver alunos, a chamada já é criada com todos presentes.
#[utoipa::path(
    post,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson",
    tag = "Lessons",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    request_body = CreateLessonPayload,
    responses(
        (status = 201, description = "Aula adicionada"),
        (status = 400, description = "Assunto, data ou carga horária ausentes"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lesson(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateLessonPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(topic), Some(date), Some(workload)) =
        (payload.topic, payload.date, payload.workload)
    else {
        return Err(AppError::MissingFields(
            "Assunto, data e carga horária são obrigatórios",
        ));
    };
    if workload <= 0.0 {
        return Err(AppError::MissingFields("A carga horária deve ser positiva"));
    }

    let gradebook = app_state
        .gradebook_service
        .add_lesson(gradebook_id, term_id, topic, date, workload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Aula adicionada com sucesso", "gradebook": gradebook })),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonPayload {
    pub topic: Option<String>,
    pub date: Option<NaiveDate>,
    pub workload: Option<f64>,
}

// PUT /api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}
// Após a mescla, as aulas do bimestre são reordenadas por data.
#[utoipa::path(
    put,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}",
    tag = "Lessons",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre"),
        ("lesson_id" = Uuid, Path, description = "ID da aula")
    ),
    request_body = UpdateLessonPayload,
    responses(
        (status = 200, description = "Aula atualizada"),
        (status = 404, description = "Caderneta, bimestre ou aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lesson(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateLessonPayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .update_lesson(
            gradebook_id,
            term_id,
            lesson_id,
            payload.topic,
            payload.date,
            payload.workload,
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Aula atualizada com sucesso.", "gradebook": gradebook })),
    ))
}

// DELETE /api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}
#[utoipa::path(
    delete,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}",
    tag = "Lessons",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre"),
        ("lesson_id" = Uuid, Path, description = "ID da aula")
    ),
    responses(
        (status = 200, description = "Aula removida"),
        (status = 404, description = "Caderneta, bimestre ou aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lesson(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .delete_lesson(gradebook_id, term_id, lesson_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Aula removida com sucesso.", "gradebook": gradebook })),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    // Cada entrada precisa carregar o studentId.
    pub attendance: Vec<AttendanceEntry>,
}

// POST /api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance
#[utoipa::path(
    post,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance",
    tag = "Attendance",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre"),
        ("lesson_id" = Uuid, Path, description = "ID da aula")
    ),
    request_body = AttendancePayload,
    responses(
        (status = 201, description = "Chamada criada"),
        (status = 404, description = "Caderneta, bimestre ou aula não encontrada"),
        (status = 409, description = "Já existe uma chamada para essa aula")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_attendance(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<AttendancePayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .create_attendance(gradebook_id, term_id, lesson_id, payload.attendance)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Chamada criada com sucesso", "gradebook": gradebook })),
    ))
}

// PUT /api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance
// Sobrescrita incondicional da chamada.
#[utoipa::path(
    put,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance",
    tag = "Attendance",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre"),
        ("lesson_id" = Uuid, Path, description = "ID da aula")
    ),
    request_body = AttendancePayload,
    responses(
        (status = 200, description = "Chamada atualizada"),
        (status = 404, description = "Caderneta, bimestre ou aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_attendance(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<AttendancePayload>,
) -> Result<impl IntoResponse, AppError> {
    let gradebook = app_state
        .gradebook_service
        .update_attendance(gradebook_id, term_id, lesson_id, payload.attendance)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Chamada atualizada com sucesso.", "gradebook": gradebook })),
    ))
}

// GET /api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance
#[utoipa::path(
    get,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/lesson/{lesson_id}/attendance",
    tag = "Attendance",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre"),
        ("lesson_id" = Uuid, Path, description = "ID da aula")
    ),
    responses(
        (status = 200, description = "Aula com a chamada"),
        (status = 404, description = "Caderneta, bimestre ou aula não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_attendance(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = app_state
        .gradebook_service
        .get_lesson(gradebook_id, term_id, lesson_id)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "lesson": lesson }))))
}

// =============================================================================
//  ÁREA 4: AVALIAÇÕES (ENSINO REGULAR) E REGISTRO ANUAL
// =============================================================================

// GET /api/gradebooks/{gradebook_id}/term/{term_id}/evaluations
// Uma linha por aluno do roster ATUAL da turma, com placeholder zerado para
// quem ainda não tem registro e faltas sempre recalculadas da chamada.
#[utoipa::path(
    get,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/evaluations",
    tag = "Evaluations",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    responses(
        (status = 200, description = "Planilha de avaliações do bimestre"),
        (status = 400, description = "Caderneta não é do ensino regular"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_evaluations(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state
        .evaluation_service
        .numeric_sheet(gradebook_id, term_id)
        .await?;
    Ok((StatusCode::OK, Json(evaluations)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericEvaluationsPayload {
    pub evaluations: Vec<NumericEvaluationInput>,
}

// PUT /api/gradebooks/{gradebook_id}/term/{term_id}/evaluations
// Upsert em lote; o documento só é gravado se algum valor mudou.
#[utoipa::path(
    put,
    path = "/api/gradebooks/{gradebook_id}/term/{term_id}/evaluations",
    tag = "Evaluations",
    params(
        ("gradebook_id" = Uuid, Path, description = "ID da caderneta"),
        ("term_id" = Uuid, Path, description = "ID do bimestre")
    ),
    request_body = NumericEvaluationsPayload,
    responses(
        (status = 200, description = "Avaliações atualizadas"),
        (status = 400, description = "Caderneta não é do ensino regular"),
        (status = 404, description = "Caderneta ou bimestre não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_evaluations(
    State(app_state): State<AppState>,
    Path((gradebook_id, term_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<NumericEvaluationsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state
        .evaluation_service
        .put_numeric(gradebook_id, term_id, &payload.evaluations)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Avaliações atualizadas com sucesso.",
            "evaluations": evaluations
        })),
    ))
}

// GET /api/gradebooks/{gradebook_id}/learning-record
#[utoipa::path(
    get,
    path = "/api/gradebooks/{gradebook_id}/learning-record",
    tag = "Records",
    params(("gradebook_id" = Uuid, Path, description = "ID da caderneta")),
    responses(
        (status = 200, description = "Registro anual de aprendizagem"),
        (status = 404, description = "Caderneta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn learning_record(
    State(app_state): State<AppState>,
    Path(gradebook_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = app_state
        .evaluation_service
        .learning_record(gradebook_id)
        .await?;
    Ok((StatusCode::OK, Json(record)))
}
