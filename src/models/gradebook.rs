// src/models/gradebook.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::school::StudentRef;

// --- ENUMS ---

// Mapeia o CREATE TYPE gradebook_track do banco.
// 'regular' é o ensino fundamental/médio (notas numéricas);
// 'kindergarten' é a educação infantil (avaliação qualitativa por campo de experiência).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gradebook_track", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GradebookTrack {
    Regular,
    Kindergarten,
}

// Estágio de desenvolvimento de um campo de experiência (BNCC).
// A ordem das variantes É a ordem de progressão: o derive de `Ord` é usado
// pelo registro geral para guardar o melhor estágio já alcançado.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum DevelopmentStatus {
    NotYet,
    UnderDevelopment,
    Developed,
}

// --- O AGREGADO ---

// A caderneta é carregada e gravada como um documento único: colunas
// escalares + a coluna JSONB `terms` com toda a árvore de bimestres.
// `version` é o token de concorrência otimista (ver GradebookRepository).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Gradebook {
    pub id: Uuid,
    pub track: GradebookTrack,
    pub academic_year: i32,
    pub skill: Option<String>,

    // Referências (nunca posse): validadas pelos CRUDs externos.
    // `subject_id` só existe no ensino regular.
    pub subject_id: Option<Uuid>,
    pub classroom_id: Uuid,
    pub teacher_id: Uuid,
    pub school_id: Uuid,

    #[sqlx(json)]
    pub terms: Vec<Term>,

    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: Uuid,
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub evaluations: Vec<StudentEvaluation>,
    // Aprovação da coordenação — somente ensino regular.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<CoordinatorApproval>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub topic: String,
    pub date: NaiveDate,
    // Carga horária em horas-aula.
    pub workload: f64,
    #[serde(default)]
    pub attendance: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorApproval {
    pub approved: bool,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

// Snapshot do aluno copiado no momento da escrita da avaliação — tolerante a
// drift por decisão de projeto: a avaliação reflete o nome da época da nota.
// A referência "viva" continua sendo o `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    pub id: Uuid,
    pub name: String,
    pub cpf: Option<String>,
}

// Uma avaliação por (bimestre, aluno). O payload de notas é uma união
// etiquetada pela modalidade — o núcleo Term/Lesson/Attendance é o mesmo
// para as duas cadernetas, só a avaliação diverge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentEvaluation {
    pub student: StudentSnapshot,
    #[serde(flatten)]
    pub scores: EvaluationScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "track")]
pub enum EvaluationScores {
    #[serde(rename = "regular")]
    Numeric(NumericScores),
    #[serde(rename = "kindergarten")]
    Qualitative(QualitativeScores),
}

// Notas do ensino regular. Todas opcionais: o professor preenche ao longo do
// bimestre. Faltas NÃO moram aqui — são sempre derivadas da chamada.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericScores {
    pub monthly_exam: Option<f64>,
    pub bimonthly_exam: Option<f64>,
    pub qualitative_assessment: Option<f64>,
    pub bimonthly_grade: Option<f64>,
    pub bimonthly_recovery: Option<f64>,
    pub bimonthly_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeScores {
    // No máximo uma entrada por campo de experiência.
    #[serde(default)]
    pub fields: Vec<FieldStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldStatus {
    pub field_name: String,
    pub status: DevelopmentStatus,
}

// --- ENTRADAS DE LOTE (upsert de avaliações) ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericEvaluationInput {
    pub student: StudentSnapshot,
    #[serde(flatten)]
    pub scores: NumericScores,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeEvaluationInput {
    pub student: StudentSnapshot,
    #[serde(default)]
    pub evaluations: Vec<FieldStatus>,
}

// --- MUTAÇÕES DO AGREGADO ---
//
// As regras de consistência vivem aqui, em memória, para serem testáveis sem
// banco. Os services só orquestram carregar → mutar → gravar.

impl Gradebook {
    pub fn new(
        track: GradebookTrack,
        academic_year: i32,
        school_id: Uuid,
        classroom_id: Uuid,
        teacher_id: Uuid,
        subject_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            track,
            academic_year,
            skill: None,
            subject_id,
            classroom_id,
            teacher_id,
            school_id,
            terms: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn term(&self, term_id: Uuid) -> Result<&Term, AppError> {
        self.terms
            .iter()
            .find(|t| t.id == term_id)
            .ok_or(AppError::TermNotFound)
    }

    pub fn term_mut(&mut self, term_id: Uuid) -> Result<&mut Term, AppError> {
        self.terms
            .iter_mut()
            .find(|t| t.id == term_id)
            .ok_or(AppError::TermNotFound)
    }

    // Acrescenta um bimestre vazio. `endDate >= startDate` é verificado aqui
    // (e em qualquer atualização) — invariante do período letivo.
    pub fn add_term(
        &mut self,
        name: Option<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Uuid, AppError> {
        if end_date < start_date {
            return Err(AppError::InvalidTermDates);
        }
        let term = Term {
            id: Uuid::new_v4(),
            name,
            start_date,
            end_date,
            lessons: Vec::new(),
            evaluations: Vec::new(),
            approval: None,
        };
        let id = term.id;
        self.terms.push(term);
        Ok(id)
    }

    // Remove o bimestre e TUDO que ele possui (aulas, chamadas, avaliações).
    // Descarte irrecuperável, sem guarda de cascata.
    pub fn remove_term(&mut self, term_id: Uuid) -> Result<(), AppError> {
        let before = self.terms.len();
        self.terms.retain(|t| t.id != term_id);
        if self.terms.len() == before {
            return Err(AppError::TermNotFound);
        }
        Ok(())
    }
}

impl Term {
    // Atualização parcial: só os campos enviados são mesclados; o invariante
    // de datas é reavaliado sobre o resultado da mescla.
    pub fn update_details(
        &mut self,
        name: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<(), AppError> {
        let merged_start = start_date.unwrap_or(self.start_date);
        let merged_end = end_date.unwrap_or(self.end_date);
        if merged_end < merged_start {
            return Err(AppError::InvalidTermDates);
        }
        if let Some(name) = name {
            self.name = Some(name);
        }
        self.start_date = merged_start;
        self.end_date = merged_end;
        Ok(())
    }

    pub fn lesson(&self, lesson_id: Uuid) -> Result<&Lesson, AppError> {
        self.lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .ok_or(AppError::LessonNotFound)
    }

    pub fn lesson_mut(&mut self, lesson_id: Uuid) -> Result<&mut Lesson, AppError> {
        self.lessons
            .iter_mut()
            .find(|l| l.id == lesson_id)
            .ok_or(AppError::LessonNotFound)
    }

    // Cria a aula e, se a turma tiver alunos, já abre a chamada com todo
    // mundo presente — "criar aula" e "fazer chamada" viram um passo só.
    pub fn add_lesson(
        &mut self,
        topic: String,
        date: NaiveDate,
        workload: f64,
        roster: &[StudentRef],
    ) -> Uuid {
        let attendance = roster
            .iter()
            .map(|student| AttendanceEntry {
                student_id: student.id,
                present: true,
            })
            .collect();

        let lesson = Lesson {
            id: Uuid::new_v4(),
            topic,
            date,
            workload,
            attendance,
        };
        let id = lesson.id;
        self.lessons.push(lesson);
        self.sort_lessons();
        id
    }

    // Mescla parcial e reordena por data: a posição da aula na lista é uma
    // propriedade derivada, recalculada a cada mutação, nunca armazenada.
    pub fn update_lesson(
        &mut self,
        lesson_id: Uuid,
        topic: Option<String>,
        date: Option<NaiveDate>,
        workload: Option<f64>,
    ) -> Result<(), AppError> {
        let lesson = self.lesson_mut(lesson_id)?;
        if let Some(topic) = topic {
            lesson.topic = topic;
        }
        if let Some(date) = date {
            lesson.date = date;
        }
        if let Some(workload) = workload {
            lesson.workload = workload;
        }
        self.sort_lessons();
        Ok(())
    }

    pub fn remove_lesson(&mut self, lesson_id: Uuid) -> Result<(), AppError> {
        let before = self.lessons.len();
        self.lessons.retain(|l| l.id != lesson_id);
        if self.lessons.len() == before {
            return Err(AppError::LessonNotFound);
        }
        Ok(())
    }

    fn sort_lessons(&mut self) {
        self.lessons.sort_by_key(|l| l.date);
    }

    // Alterna a aprovação da coordenação (flip idempotente, não é transição
    // de mão única) registrando quem mexeu e quando.
    pub fn toggle_approval(&mut self, approved_by: Uuid, comments: Option<String>) -> bool {
        let now = Utc::now();
        match &mut self.approval {
            Some(approval) => {
                approval.approved = !approval.approved;
                approval.approved_by = Some(approved_by);
                approval.approved_at = Some(now);
                if comments.is_some() {
                    approval.comments = comments;
                }
                approval.approved
            }
            None => {
                self.approval = Some(CoordinatorApproval {
                    approved: true,
                    approved_by: Some(approved_by),
                    approved_at: Some(now),
                    comments,
                });
                true
            }
        }
    }

    // Upsert do ensino regular. Cria o registro (com snapshot do aluno) quando
    // não existe; quando existe, só grava se algum valor realmente mudou.
    // Retorna `true` se o lote alterou alguma coisa — o service só persiste
    // o documento nesse caso.
    pub fn upsert_numeric_evaluations(&mut self, batch: &[NumericEvaluationInput]) -> bool {
        let mut changed = false;

        for input in batch {
            match self
                .evaluations
                .iter_mut()
                .find(|e| e.student.id == input.student.id)
            {
                None => {
                    self.evaluations.push(StudentEvaluation {
                        student: input.student.clone(),
                        scores: EvaluationScores::Numeric(input.scores.clone()),
                    });
                    changed = true;
                }
                Some(existing) => match &mut existing.scores {
                    EvaluationScores::Numeric(current) => {
                        if *current != input.scores {
                            *current = input.scores.clone();
                            changed = true;
                        }
                    }
                    // Registro gravado na modalidade errada: sobrescreve.
                    other => {
                        *other = EvaluationScores::Numeric(input.scores.clone());
                        changed = true;
                    }
                },
            }
        }

        changed
    }

    // Upsert da educação infantil: por aluno, cada campo de experiência do
    // payload sobrescreve o status existente ou é acrescentado. Campos não
    // mencionados permanecem como estão (o "not-yet" sintético do GET nunca
    // é persistido por aqui).
    pub fn upsert_qualitative_evaluations(
        &mut self,
        batch: &[QualitativeEvaluationInput],
    ) -> bool {
        let mut changed = false;

        for input in batch {
            match self
                .evaluations
                .iter_mut()
                .find(|e| e.student.id == input.student.id)
            {
                None => {
                    self.evaluations.push(StudentEvaluation {
                        student: input.student.clone(),
                        scores: EvaluationScores::Qualitative(QualitativeScores {
                            fields: input.evaluations.clone(),
                        }),
                    });
                    changed = true;
                }
                Some(existing) => {
                    let current = match &mut existing.scores {
                        EvaluationScores::Qualitative(q) => q,
                        other => {
                            *other =
                                EvaluationScores::Qualitative(QualitativeScores::default());
                            changed = true;
                            match other {
                                EvaluationScores::Qualitative(q) => q,
                                _ => unreachable!(),
                            }
                        }
                    };

                    for incoming in &input.evaluations {
                        match current
                            .fields
                            .iter_mut()
                            .find(|f| f.field_name == incoming.field_name)
                        {
                            Some(field) => {
                                if field.status != incoming.status {
                                    field.status = incoming.status;
                                    changed = true;
                                }
                            }
                            None => {
                                current.fields.push(incoming.clone());
                                changed = true;
                            }
                        }
                    }
                }
            }
        }

        changed
    }
}

impl Lesson {
    // A chamada só pode ser CRIADA uma vez: se já existe uma não-vazia, a
    // segunda tentativa é rejeitada independentemente do payload. Edição é
    // outra operação (`replace_attendance`).
    pub fn create_attendance(&mut self, entries: Vec<AttendanceEntry>) -> Result<(), AppError> {
        if !self.attendance.is_empty() {
            return Err(AppError::AttendanceAlreadyExists);
        }
        self.attendance = entries;
        Ok(())
    }

    // Sobrescrita incondicional.
    pub fn replace_attendance(&mut self, entries: Vec<AttendanceEntry>) {
        self.attendance = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn student(name: &str) -> StudentRef {
        StudentRef {
            id: Uuid::new_v4(),
            name: name.to_string(),
            cpf: None,
        }
    }

    fn gradebook() -> Gradebook {
        Gradebook::new(
            GradebookTrack::Regular,
            2025,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
        )
    }

    #[test]
    fn add_term_rejects_end_before_start() {
        let mut gb = gradebook();
        let err = gb
            .add_term(None, date(2025, 4, 30), date(2025, 2, 1))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTermDates));
        assert!(gb.terms.is_empty());
    }

    #[test]
    fn update_term_checks_dates_after_merge() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let term = gb.term_mut(term_id).unwrap();

        // Só mover o início para depois do fim deve falhar.
        let err = term
            .update_details(None, Some(date(2025, 5, 10)), None)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTermDates));

        // Mescla válida: só o nome.
        term.update_details(Some("1º Bimestre".to_string()), None, None)
            .unwrap();
        assert_eq!(term.name.as_deref(), Some("1º Bimestre"));
        assert_eq!(term.start_date, date(2025, 2, 1));
    }

    #[test]
    fn add_lesson_bootstraps_attendance_with_roster_present() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let roster = vec![student("Ana"), student("Bruno")];

        let term = gb.term_mut(term_id).unwrap();
        let lesson_id =
            term.add_lesson("Frações".to_string(), date(2025, 2, 10), 2.0, &roster);

        let lesson = term.lesson(lesson_id).unwrap();
        assert_eq!(lesson.attendance.len(), 2);
        assert!(lesson.attendance.iter().all(|a| a.present));
    }

    #[test]
    fn add_lesson_with_empty_roster_leaves_ledger_empty() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let term = gb.term_mut(term_id).unwrap();
        let lesson_id = term.add_lesson("Frações".to_string(), date(2025, 2, 10), 2.0, &[]);
        assert!(term.lesson(lesson_id).unwrap().attendance.is_empty());
    }

    #[test]
    fn create_attendance_conflicts_when_ledger_not_empty() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let roster = vec![student("Ana")];
        let term = gb.term_mut(term_id).unwrap();
        let lesson_id = term.add_lesson("Frações".to_string(), date(2025, 2, 10), 2.0, &roster);

        let lesson = term.lesson_mut(lesson_id).unwrap();
        let err = lesson
            .create_attendance(vec![AttendanceEntry {
                student_id: roster[0].id,
                present: false,
            }])
            .unwrap_err();
        assert!(matches!(err, AppError::AttendanceAlreadyExists));

        // A edição continua permitida.
        lesson.replace_attendance(vec![AttendanceEntry {
            student_id: roster[0].id,
            present: false,
        }]);
        assert!(!lesson.attendance[0].present);
    }

    #[test]
    fn update_lesson_resorts_by_date() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let term = gb.term_mut(term_id).unwrap();
        let first = term.add_lesson("A".to_string(), date(2025, 2, 10), 1.0, &[]);
        let _second = term.add_lesson("B".to_string(), date(2025, 2, 20), 1.0, &[]);

        // Move a primeira aula para depois da segunda.
        term.update_lesson(first, None, Some(date(2025, 3, 1)), None)
            .unwrap();
        assert_eq!(term.lessons[0].topic, "B");
        assert_eq!(term.lessons[1].topic, "A");
    }

    #[test]
    fn approval_toggles_and_stamps_approver() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let coordinator = Uuid::new_v4();

        let term = gb.term_mut(term_id).unwrap();
        assert!(term.toggle_approval(coordinator, Some("ok".to_string())));
        let approval = term.approval.as_ref().unwrap();
        assert!(approval.approved);
        assert_eq!(approval.approved_by, Some(coordinator));

        // Flip de volta: bidirecional na prática.
        assert!(!term.toggle_approval(coordinator, None));
        assert!(!term.approval.as_ref().unwrap().approved);
        assert_eq!(
            term.approval.as_ref().unwrap().comments.as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn numeric_upsert_creates_then_detects_noop() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let term = gb.term_mut(term_id).unwrap();

        let input = NumericEvaluationInput {
            student: StudentSnapshot {
                id: Uuid::new_v4(),
                name: "Ana".to_string(),
                cpf: Some("111.222.333-44".to_string()),
            },
            scores: NumericScores {
                monthly_exam: Some(8.0),
                bimonthly_average: Some(7.5),
                ..Default::default()
            },
        };

        assert!(term.upsert_numeric_evaluations(std::slice::from_ref(&input)));
        assert_eq!(term.evaluations.len(), 1);

        // Mesmos valores: nada muda, nada a persistir.
        assert!(!term.upsert_numeric_evaluations(std::slice::from_ref(&input)));

        // Um campo diferente: muda.
        let mut dirty = input.clone();
        dirty.scores.bimonthly_recovery = Some(6.0);
        assert!(term.upsert_numeric_evaluations(&[dirty]));
    }

    #[test]
    fn qualitative_upsert_overwrites_or_appends_fields() {
        let mut gb = Gradebook::new(
            GradebookTrack::Kindergarten,
            2025,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
        );
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        let term = gb.term_mut(term_id).unwrap();

        let snapshot = StudentSnapshot {
            id: Uuid::new_v4(),
            name: "Lia".to_string(),
            cpf: None,
        };

        let input = QualitativeEvaluationInput {
            student: snapshot.clone(),
            evaluations: vec![FieldStatus {
                field_name: "Linguagem".to_string(),
                status: DevelopmentStatus::UnderDevelopment,
            }],
        };
        assert!(term.upsert_qualitative_evaluations(std::slice::from_ref(&input)));

        // Sobrescreve o campo existente e acrescenta um novo.
        let input = QualitativeEvaluationInput {
            student: snapshot,
            evaluations: vec![
                FieldStatus {
                    field_name: "Linguagem".to_string(),
                    status: DevelopmentStatus::Developed,
                },
                FieldStatus {
                    field_name: "Movimento".to_string(),
                    status: DevelopmentStatus::NotYet,
                },
            ],
        };
        assert!(term.upsert_qualitative_evaluations(std::slice::from_ref(&input)));

        let fields = match &term.evaluations[0].scores {
            EvaluationScores::Qualitative(q) => &q.fields,
            _ => panic!("modalidade errada"),
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].status, DevelopmentStatus::Developed);

        // Reenvio idêntico: no-op.
        assert!(!term.upsert_qualitative_evaluations(std::slice::from_ref(&input)));
    }

    #[test]
    fn remove_term_discards_nested_data() {
        let mut gb = gradebook();
        let term_id = gb
            .add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap();
        gb.term_mut(term_id)
            .unwrap()
            .add_lesson("A".to_string(), date(2025, 2, 10), 1.0, &[]);

        gb.remove_term(term_id).unwrap();
        assert!(gb.terms.is_empty());
        assert!(matches!(
            gb.remove_term(term_id).unwrap_err(),
            AppError::TermNotFound
        ));
    }
}
