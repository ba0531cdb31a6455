// src/services/evaluation_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClassroomRepository, ExperienceFieldRepository, GradebookRepository},
    models::gradebook::{
        Gradebook, GradebookTrack, NumericEvaluationInput, QualitativeEvaluationInput,
        StudentEvaluation,
    },
    models::records::{
        GeneralRecordRow, LearningRecordRow, NumericEvaluationRow, QualitativeEvaluationRow,
    },
    services::aggregation,
};

// Fluxos de avaliação das duas modalidades + registros anuais. As leituras
// resolvem o roster (e o catálogo de campos, na educação infantil) na hora e
// delegam a conta para o motor de agregação; as escritas só persistem o
// documento quando o lote mudou alguma coisa.
#[derive(Clone)]
pub struct EvaluationService {
    gradebooks: GradebookRepository,
    classrooms: ClassroomRepository,
    experience_fields: ExperienceFieldRepository,
    // Política da média anual: false = bimestre sem média conta como 0
    // (comportamento de compatibilidade); true = sai do denominador.
    annual_average_ignore_missing: bool,
}

impl EvaluationService {
    pub fn new(
        gradebooks: GradebookRepository,
        classrooms: ClassroomRepository,
        experience_fields: ExperienceFieldRepository,
        annual_average_ignore_missing: bool,
    ) -> Self {
        Self {
            gradebooks,
            classrooms,
            experience_fields,
            annual_average_ignore_missing,
        }
    }

    async fn load(&self, gradebook_id: Uuid) -> Result<Gradebook, AppError> {
        self.gradebooks
            .find_by_id(gradebook_id)
            .await?
            .ok_or(AppError::GradebookNotFound)
    }

    fn expect_track(gradebook: &Gradebook, track: GradebookTrack) -> Result<(), AppError> {
        if gradebook.track != track {
            return Err(AppError::WrongTrack);
        }
        Ok(())
    }

    // --- Ensino regular ---

    pub async fn numeric_sheet(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
    ) -> Result<Vec<NumericEvaluationRow>, AppError> {
        let gradebook = self.load(gradebook_id).await?;
        Self::expect_track(&gradebook, GradebookTrack::Regular)?;
        let term = gradebook.term(term_id)?;
        let roster = self.classrooms.roster(gradebook.classroom_id).await?;
        Ok(aggregation::numeric_evaluation_sheet(term, &roster))
    }

    pub async fn put_numeric(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        batch: &[NumericEvaluationInput],
    ) -> Result<Vec<StudentEvaluation>, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        Self::expect_track(&gradebook, GradebookTrack::Regular)?;

        let changed = gradebook.term_mut(term_id)?.upsert_numeric_evaluations(batch);
        if changed {
            gradebook = self
                .gradebooks
                .save_terms(gradebook.id, gradebook.version, &gradebook.terms)
                .await?;
        }
        Ok(gradebook.term(term_id)?.evaluations.clone())
    }

    // --- Educação infantil ---

    pub async fn qualitative_sheet(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
    ) -> Result<Vec<QualitativeEvaluationRow>, AppError> {
        let gradebook = self.load(gradebook_id).await?;
        Self::expect_track(&gradebook, GradebookTrack::Kindergarten)?;
        let term = gradebook.term(term_id)?;
        let roster = self.classrooms.roster(gradebook.classroom_id).await?;
        let catalog = self.experience_fields.for_school(gradebook.school_id).await?;
        Ok(aggregation::qualitative_evaluation_sheet(
            term, &roster, &catalog,
        ))
    }

    pub async fn put_qualitative(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        batch: &[QualitativeEvaluationInput],
    ) -> Result<Vec<StudentEvaluation>, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        Self::expect_track(&gradebook, GradebookTrack::Kindergarten)?;

        let changed = gradebook
            .term_mut(term_id)?
            .upsert_qualitative_evaluations(batch);
        if changed {
            gradebook = self
                .gradebooks
                .save_terms(gradebook.id, gradebook.version, &gradebook.terms)
                .await?;
        }
        Ok(gradebook.term(term_id)?.evaluations.clone())
    }

    // --- Registros anuais ---

    // Registro anual de aprendizagem (as duas modalidades).
    pub async fn learning_record(
        &self,
        gradebook_id: Uuid,
    ) -> Result<Vec<LearningRecordRow>, AppError> {
        let gradebook = self.load(gradebook_id).await?;
        let roster = self.classrooms.roster(gradebook.classroom_id).await?;
        Ok(aggregation::learning_record(
            &gradebook,
            &roster,
            self.annual_average_ignore_missing,
        ))
    }

    // Registro geral (educação infantil): melhor estágio por campo, ano todo.
    pub async fn general_record(
        &self,
        gradebook_id: Uuid,
    ) -> Result<Vec<GeneralRecordRow>, AppError> {
        let gradebook = self.load(gradebook_id).await?;
        Self::expect_track(&gradebook, GradebookTrack::Kindergarten)?;
        let roster = self.classrooms.roster(gradebook.classroom_id).await?;
        Ok(aggregation::general_record(&gradebook.terms, &roster))
    }
}
