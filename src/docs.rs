// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Gradebooks ---
        handlers::gradebooks::create_gradebook,
        handlers::gradebooks::get_gradebook,
        handlers::gradebooks::list_by_teacher,
        handlers::gradebooks::list_by_school,
        handlers::gradebooks::update_gradebook,

        // --- Terms ---
        handlers::gradebooks::create_term,
        handlers::gradebooks::update_term,
        handlers::gradebooks::delete_term,
        handlers::gradebooks::toggle_term_approval,

        // --- Lessons / Attendance ---
        handlers::gradebooks::create_lesson,
        handlers::gradebooks::update_lesson,
        handlers::gradebooks::delete_lesson,
        handlers::gradebooks::create_attendance,
        handlers::gradebooks::update_attendance,
        handlers::gradebooks::get_attendance,

        // --- Evaluations / Records ---
        handlers::gradebooks::get_evaluations,
        handlers::gradebooks::put_evaluations,
        handlers::gradebooks::learning_record,

        // --- Kindergartens ---
        handlers::kindergartens::create_kindergarten,
        handlers::kindergartens::get_evaluations,
        handlers::kindergartens::put_evaluations,
        handlers::kindergartens::general_record,
    ),
    components(
        schemas(
            // --- Agregado ---
            models::gradebook::GradebookTrack,
            models::gradebook::Gradebook,
            models::gradebook::Term,
            models::gradebook::Lesson,
            models::gradebook::AttendanceEntry,
            models::gradebook::CoordinatorApproval,
            models::gradebook::StudentSnapshot,
            models::gradebook::StudentEvaluation,
            models::gradebook::EvaluationScores,
            models::gradebook::NumericScores,
            models::gradebook::QualitativeScores,
            models::gradebook::FieldStatus,
            models::gradebook::DevelopmentStatus,
            models::gradebook::NumericEvaluationInput,
            models::gradebook::QualitativeEvaluationInput,

            // --- Leituras derivadas ---
            models::records::NumericEvaluationRow,
            models::records::QualitativeEvaluationRow,
            models::records::TermAverage,
            models::records::LearningRecordRow,
            models::records::GeneralRecordRow,

            // --- Colaboradores ---
            models::school::StudentRef,
            models::school::ExperienceField,

            // --- Payloads ---
            handlers::gradebooks::CreateGradebookPayload,
            handlers::gradebooks::UpdateGradebookPayload,
            handlers::gradebooks::CreateTermPayload,
            handlers::gradebooks::UpdateTermPayload,
            handlers::gradebooks::ApprovalPayload,
            handlers::gradebooks::CreateLessonPayload,
            handlers::gradebooks::UpdateLessonPayload,
            handlers::gradebooks::AttendancePayload,
            handlers::gradebooks::NumericEvaluationsPayload,
            handlers::kindergartens::CreateKindergartenPayload,
            handlers::kindergartens::QualitativeEvaluationsPayload,
        )
    ),
    tags(
        (name = "Gradebooks", description = "Cadernetas do ensino regular"),
        (name = "Terms", description = "Bimestres e aprovação da coordenação"),
        (name = "Lessons", description = "Aulas do bimestre"),
        (name = "Attendance", description = "Chamada por aula"),
        (name = "Evaluations", description = "Avaliações bimestrais (notas)"),
        (name = "Records", description = "Registros anuais derivados"),
        (name = "Kindergartens", description = "Diários da educação infantil")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
