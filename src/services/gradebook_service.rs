// src/services/gradebook_service.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClassroomRepository, GradebookRepository},
    models::gradebook::{AttendanceEntry, Gradebook, GradebookTrack, Lesson},
};

// Orquestra o ciclo carregar → mutar → gravar do agregado. As regras de
// consistência ficam nos métodos do modelo; aqui resolvemos colaboradores
// (roster) e a persistência com versão otimista.
#[derive(Clone)]
pub struct GradebookService {
    gradebooks: GradebookRepository,
    classrooms: ClassroomRepository,
}

impl GradebookService {
    pub fn new(gradebooks: GradebookRepository, classrooms: ClassroomRepository) -> Self {
        Self {
            gradebooks,
            classrooms,
        }
    }

    async fn load(&self, gradebook_id: Uuid) -> Result<Gradebook, AppError> {
        self.gradebooks
            .find_by_id(gradebook_id)
            .await?
            .ok_or(AppError::GradebookNotFound)
    }

    // --- CRUD da caderneta ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        track: GradebookTrack,
        academic_year: i32,
        school_id: Uuid,
        classroom_id: Uuid,
        teacher_id: Uuid,
        subject_id: Option<Uuid>,
    ) -> Result<Gradebook, AppError> {
        let gradebook = Gradebook::new(
            track,
            academic_year,
            school_id,
            classroom_id,
            teacher_id,
            subject_id,
        );
        self.gradebooks.insert(&gradebook).await
    }

    pub async fn get(&self, gradebook_id: Uuid) -> Result<Gradebook, AppError> {
        self.load(gradebook_id).await
    }

    pub async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<Gradebook>, AppError> {
        self.gradebooks.list_by_teacher(teacher_id).await
    }

    pub async fn list_by_school(&self, school_id: Uuid) -> Result<Vec<Gradebook>, AppError> {
        self.gradebooks.list_by_school(school_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_header(
        &self,
        gradebook_id: Uuid,
        academic_year: Option<i32>,
        skill: Option<&str>,
        subject_id: Option<Uuid>,
        classroom_id: Option<Uuid>,
        teacher_id: Option<Uuid>,
        school_id: Option<Uuid>,
    ) -> Result<Gradebook, AppError> {
        self.gradebooks
            .update_header(
                gradebook_id,
                academic_year,
                skill,
                subject_id,
                classroom_id,
                teacher_id,
                school_id,
            )
            .await
    }

    // --- Ciclo de vida do bimestre ---

    pub async fn add_term(
        &self,
        gradebook_id: Uuid,
        name: Option<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook.add_term(name, start_date, end_date)?;
        self.save(gradebook).await
    }

    pub async fn update_term(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        name: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook
            .term_mut(term_id)?
            .update_details(name, start_date, end_date)?;
        self.save(gradebook).await
    }

    pub async fn delete_term(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook.remove_term(term_id)?;
        self.save(gradebook).await
    }

    // Alterna a aprovação da coordenação — só existe no ensino regular.
    pub async fn toggle_approval(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        approved_by: Uuid,
        comments: Option<String>,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        if gradebook.track != GradebookTrack::Regular {
            return Err(AppError::WrongTrack);
        }
        gradebook
            .term_mut(term_id)?
            .toggle_approval(approved_by, comments);
        self.save(gradebook).await
    }

    // --- Aulas e chamada ---

    // Cria a aula lendo o roster NA HORA: se a turma tem alunos, a chamada já
    // nasce com todo mundo presente.
    pub async fn add_lesson(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        topic: String,
        date: NaiveDate,
        workload: f64,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        let roster = self.classrooms.roster(gradebook.classroom_id).await?;
        gradebook
            .term_mut(term_id)?
            .add_lesson(topic, date, workload, &roster);
        self.save(gradebook).await
    }

    pub async fn update_lesson(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        lesson_id: Uuid,
        topic: Option<String>,
        date: Option<NaiveDate>,
        workload: Option<f64>,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook
            .term_mut(term_id)?
            .update_lesson(lesson_id, topic, date, workload)?;
        self.save(gradebook).await
    }

    pub async fn delete_lesson(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook.term_mut(term_id)?.remove_lesson(lesson_id)?;
        self.save(gradebook).await
    }

    pub async fn create_attendance(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        lesson_id: Uuid,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook
            .term_mut(term_id)?
            .lesson_mut(lesson_id)?
            .create_attendance(entries)?;
        self.save(gradebook).await
    }

    pub async fn update_attendance(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        lesson_id: Uuid,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Gradebook, AppError> {
        let mut gradebook = self.load(gradebook_id).await?;
        gradebook
            .term_mut(term_id)?
            .lesson_mut(lesson_id)?
            .replace_attendance(entries);
        self.save(gradebook).await
    }

    pub async fn get_lesson(
        &self,
        gradebook_id: Uuid,
        term_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Lesson, AppError> {
        let gradebook = self.load(gradebook_id).await?;
        Ok(gradebook.term(term_id)?.lesson(lesson_id)?.clone())
    }

    async fn save(&self, gradebook: Gradebook) -> Result<Gradebook, AppError> {
        self.gradebooks
            .save_terms(gradebook.id, gradebook.version, &gradebook.terms)
            .await
    }
}
