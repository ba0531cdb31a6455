// src/services/aggregation.rs
//
// O motor de agregação: funções puras que, dadas a caderneta e o roster da
// turma, derivam contagens de falta, planilhas de avaliação e os registros
// anuais. Nenhuma delas toca o banco — os services resolvem roster/catálogo
// e chamam daqui.

use uuid::Uuid;

use crate::models::gradebook::{
    DevelopmentStatus, EvaluationScores, FieldStatus, Gradebook, NumericScores, StudentSnapshot,
    Term,
};
use crate::models::records::{
    GeneralRecordRow, LearningRecordRow, NumericEvaluationRow, QualitativeEvaluationRow,
    TermAverage,
};
use crate::models::school::{ExperienceField, StudentRef};

// Faltas de um aluno em um bimestre: conta SOMENTE registros explícitos de
// `present == false`. Aluno sem registro em uma aula não conta como falta.
pub fn absences_in_term(term: &Term, student_id: Uuid) -> u32 {
    term.lessons
        .iter()
        .filter(|lesson| {
            lesson
                .attendance
                .iter()
                .any(|entry| entry.student_id == student_id && !entry.present)
        })
        .count() as u32
}

pub fn total_absences(terms: &[Term], student_id: Uuid) -> u32 {
    terms
        .iter()
        .map(|term| absences_in_term(term, student_id))
        .sum()
}

// Arredondamento em 2 casas, compatível com o `toFixed(2)` do front.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Média anual. Comportamento padrão (compatibilidade): bimestre sem média
// registrada entra como 0 no numerador E no denominador. Com
// `ignore_missing`, bimestres sem média saem do denominador.
pub fn annual_average(term_averages: &[Option<f64>], ignore_missing: bool) -> f64 {
    if term_averages.is_empty() {
        return 0.0;
    }
    if ignore_missing {
        let recorded: Vec<f64> = term_averages.iter().filter_map(|a| *a).collect();
        if recorded.is_empty() {
            return 0.0;
        }
        round2(recorded.iter().sum::<f64>() / recorded.len() as f64)
    } else {
        let sum: f64 = term_averages.iter().map(|a| a.unwrap_or(0.0)).sum();
        round2(sum / term_averages.len() as f64)
    }
}

// Aproximação do localeCompare: compara os nomes dobrados para minúsculas.
fn name_key(name: &str) -> String {
    name.to_lowercase()
}

fn snapshot_of(student: &StudentRef) -> StudentSnapshot {
    StudentSnapshot {
        id: student.id,
        name: student.name.clone(),
        cpf: student.cpf.clone(),
    }
}

fn numeric_scores_of(term: &Term, student_id: Uuid) -> Option<&NumericScores> {
    term.evaluations
        .iter()
        .find(|e| e.student.id == student_id)
        .and_then(|e| match &e.scores {
            EvaluationScores::Numeric(scores) => Some(scores),
            EvaluationScores::Qualitative(_) => None,
        })
}

fn qualitative_fields_of<'a>(term: &'a Term, student_id: Uuid) -> Option<&'a [FieldStatus]> {
    term.evaluations
        .iter()
        .find(|e| e.student.id == student_id)
        .and_then(|e| match &e.scores {
            EvaluationScores::Qualitative(q) => Some(q.fields.as_slice()),
            EvaluationScores::Numeric(_) => None,
        })
}

// Planilha do bimestre (ensino regular): uma linha por aluno do roster atual,
// com o registro armazenado ou um placeholder zerado (nunca persistido) e as
// faltas SEMPRE recalculadas da chamada. Saída em ordem alfabética.
pub fn numeric_evaluation_sheet(term: &Term, roster: &[StudentRef]) -> Vec<NumericEvaluationRow> {
    let mut rows: Vec<NumericEvaluationRow> = roster
        .iter()
        .map(|student| NumericEvaluationRow {
            student: snapshot_of(student),
            scores: numeric_scores_of(term, student.id).cloned().unwrap_or_default(),
            total_absences: absences_in_term(term, student.id),
        })
        .collect();
    rows.sort_by_key(|row| name_key(&row.student.name));
    rows
}

// Planilha do bimestre (educação infantil): cruza o roster com o catálogo de
// campos de experiência da escola. Campo sem avaliação vira "not-yet" só na
// resposta; campos avaliados fora do catálogo são preservados ao final.
pub fn qualitative_evaluation_sheet(
    term: &Term,
    roster: &[StudentRef],
    catalog: &[ExperienceField],
) -> Vec<QualitativeEvaluationRow> {
    let mut rows: Vec<QualitativeEvaluationRow> = roster
        .iter()
        .map(|student| {
            let stored = qualitative_fields_of(term, student.id).unwrap_or(&[]);

            let mut evaluations: Vec<FieldStatus> = catalog
                .iter()
                .map(|field| FieldStatus {
                    field_name: field.name.clone(),
                    status: stored
                        .iter()
                        .find(|f| f.field_name == field.name)
                        .map(|f| f.status)
                        .unwrap_or(DevelopmentStatus::NotYet),
                })
                .collect();

            for field in stored {
                if !catalog.iter().any(|c| c.name == field.field_name) {
                    evaluations.push(field.clone());
                }
            }

            QualitativeEvaluationRow {
                student: snapshot_of(student),
                evaluations,
                total_absences: absences_in_term(term, student.id),
            }
        })
        .collect();
    rows.sort_by_key(|row| name_key(&row.student.name));
    rows
}

// Registro anual de aprendizagem, por aluno do roster: faltas somadas sobre
// todos os bimestres e média anual sobre as médias bimestrais.
pub fn learning_record(
    gradebook: &Gradebook,
    roster: &[StudentRef],
    ignore_missing: bool,
) -> Vec<LearningRecordRow> {
    let mut rows: Vec<LearningRecordRow> = roster
        .iter()
        .map(|student| {
            let averages: Vec<Option<f64>> = gradebook
                .terms
                .iter()
                .map(|term| numeric_scores_of(term, student.id).and_then(|s| s.bimonthly_average))
                .collect();

            let bimonthly_averages = gradebook
                .terms
                .iter()
                .zip(&averages)
                .map(|(term, average)| TermAverage {
                    term: term.name.clone(),
                    average: average.unwrap_or(0.0),
                })
                .collect();

            LearningRecordRow {
                student: snapshot_of(student),
                bimonthly_averages,
                annual_average: annual_average(&averages, ignore_missing),
                total_absences: total_absences(&gradebook.terms, student.id),
            }
        })
        .collect();
    rows.sort_by_key(|row| name_key(&row.student.name));
    rows
}

// Registro geral (educação infantil): para cada campo de experiência, o
// melhor estágio já alcançado em qualquer bimestre, pela ordem de progressão
// not-yet < under-development < developed. Faltas somadas sobre o ano.
pub fn general_record(terms: &[Term], roster: &[StudentRef]) -> Vec<GeneralRecordRow> {
    let mut rows: Vec<GeneralRecordRow> = roster
        .iter()
        .map(|student| {
            let mut fields: Vec<FieldStatus> = Vec::new();
            for term in terms {
                for field in qualitative_fields_of(term, student.id).unwrap_or(&[]) {
                    match fields.iter_mut().find(|f| f.field_name == field.field_name) {
                        Some(best) => {
                            if field.status > best.status {
                                best.status = field.status;
                            }
                        }
                        None => fields.push(field.clone()),
                    }
                }
            }

            GeneralRecordRow {
                student: snapshot_of(student),
                fields,
                total_absences: total_absences(terms, student.id),
            }
        })
        .collect();
    rows.sort_by_key(|row| name_key(&row.student.name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gradebook::{
        GradebookTrack, NumericEvaluationInput, QualitativeEvaluationInput,
    };
    use chrono::NaiveDate;

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

    fn regular_gradebook() -> Gradebook {
        Gradebook::new(
            GradebookTrack::Regular,
            2025,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
        )
    }

    fn term_with_dates(gb: &mut Gradebook) -> Uuid {
        gb.add_term(None, date(2025, 2, 1), date(2025, 4, 30))
            .unwrap()
    }

    fn numeric_input(student: &StudentRef, average: Option<f64>) -> NumericEvaluationInput {
        NumericEvaluationInput {
            student: StudentSnapshot {
                id: student.id,
                name: student.name.clone(),
                cpf: student.cpf.clone(),
            },
            scores: NumericScores {
                bimonthly_average: average,
                ..Default::default()
            },
        }
    }

    #[test]
    fn absence_requires_explicit_false_record() {
        let mut gb = regular_gradebook();
        let term_id = term_with_dates(&mut gb);
        let ana = student("Ana");
        let bruno = student("Bruno");

        let term = gb.term_mut(term_id).unwrap();
        // Aula com chamada só para a Ana (presente) — Bruno sem registro.
        let lesson_id = term.add_lesson(
            "Frações".to_string(),
            date(2025, 2, 10),
            2.0,
            std::slice::from_ref(&ana),
        );
        // Segunda aula: Ana faltou.
        term.add_lesson("Decimais".to_string(), date(2025, 2, 17), 2.0, &[]);
        term.lesson_mut(lesson_id).unwrap().replace_attendance(vec![
            crate::models::gradebook::AttendanceEntry {
                student_id: ana.id,
                present: false,
            },
        ]);

        let term = gb.term(term_id).unwrap();
        assert_eq!(absences_in_term(term, ana.id), 1);
        // Ausência de registro não é falta.
        assert_eq!(absences_in_term(term, bruno.id), 0);
    }

    #[test]
    fn annual_average_zero_fills_missing_terms() {
        // [7.0, sem registro, 9.0] → (7 + 0 + 9) / 3 = 5.33
        let averages = [Some(7.0), None, Some(9.0)];
        assert_eq!(annual_average(&averages, false), 5.33);
        // Com ignore_missing, o denominador cai para 2.
        assert_eq!(annual_average(&averages, true), 8.0);
        // Nenhum bimestre: 0 nas duas políticas.
        assert_eq!(annual_average(&[], false), 0.0);
        assert_eq!(annual_average(&[None, None], true), 0.0);
    }

    #[test]
    fn numeric_sheet_synthesizes_placeholder_and_sorts_by_name() {
        let mut gb = regular_gradebook();
        let term_id = term_with_dates(&mut gb);
        let zeca = student("Zeca");
        let ana = student("Ana");

        gb.term_mut(term_id)
            .unwrap()
            .upsert_numeric_evaluations(&[numeric_input(&zeca, Some(6.5))]);

        let term = gb.term(term_id).unwrap();
        let sheet = numeric_evaluation_sheet(term, &[zeca.clone(), ana.clone()]);

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet[0].student.name, "Ana");
        // Placeholder zerado, não persistido.
        assert_eq!(sheet[0].scores, NumericScores::default());
        assert_eq!(term.evaluations.len(), 1);
        assert_eq!(sheet[1].scores.bimonthly_average, Some(6.5));
    }

    #[test]
    fn sheet_recomputes_absences_from_ledgers() {
        let mut gb = regular_gradebook();
        let term_id = term_with_dates(&mut gb);
        let ana = student("Ana");
        let roster = vec![ana.clone()];

        let term = gb.term_mut(term_id).unwrap();
        let l1 = term.add_lesson("A".to_string(), date(2025, 2, 10), 2.0, &roster);
        let l2 = term.add_lesson("B".to_string(), date(2025, 2, 17), 2.0, &roster);
        for id in [l1, l2] {
            term.lesson_mut(id).unwrap().replace_attendance(vec![
                crate::models::gradebook::AttendanceEntry {
                    student_id: ana.id,
                    present: false,
                },
            ]);
        }

        let sheet = numeric_evaluation_sheet(gb.term(term_id).unwrap(), &roster);
        assert_eq!(sheet[0].total_absences, 2);
    }

    #[test]
    fn qualitative_sheet_fills_catalog_gaps_with_not_yet() {
        let mut gb = Gradebook::new(
            GradebookTrack::Kindergarten,
            2025,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
        );
        let term_id = term_with_dates(&mut gb);
        let lia = student("Lia");

        gb.term_mut(term_id).unwrap().upsert_qualitative_evaluations(&[
            QualitativeEvaluationInput {
                student: StudentSnapshot {
                    id: lia.id,
                    name: lia.name.clone(),
                    cpf: None,
                },
                evaluations: vec![FieldStatus {
                    field_name: "Linguagem".to_string(),
                    status: DevelopmentStatus::Developed,
                }],
            },
        ]);

        let catalog = vec![
            ExperienceField {
                id: Uuid::new_v4(),
                school_id: gb.school_id,
                name: "Linguagem".to_string(),
                description: None,
            },
            ExperienceField {
                id: Uuid::new_v4(),
                school_id: gb.school_id,
                name: "Movimento".to_string(),
                description: None,
            },
        ];

        let term = gb.term(term_id).unwrap();
        let sheet = qualitative_evaluation_sheet(term, std::slice::from_ref(&lia), &catalog);

        assert_eq!(sheet[0].evaluations.len(), 2);
        assert_eq!(sheet[0].evaluations[0].status, DevelopmentStatus::Developed);
        assert_eq!(sheet[0].evaluations[1].status, DevelopmentStatus::NotYet);
        // O "not-yet" sintético não foi persistido.
        let stored = match &term.evaluations[0].scores {
            EvaluationScores::Qualitative(q) => &q.fields,
            _ => unreachable!(),
        };
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn general_record_keeps_best_status_and_sums_absences() {
        let mut gb = Gradebook::new(
            GradebookTrack::Kindergarten,
            2025,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
        );
        let lia = student("Lia");
        let statuses = [
            DevelopmentStatus::NotYet,
            DevelopmentStatus::Developed,
            DevelopmentStatus::UnderDevelopment,
        ];

        for (i, status) in statuses.iter().enumerate() {
            let term_id = gb
                .add_term(
                    Some(format!("{}º Bimestre", i + 1)),
                    date(2025, (1 + 2 * i) as u32, 1),
                    date(2025, (2 + 2 * i) as u32, 28),
                )
                .unwrap();
            let term = gb.term_mut(term_id).unwrap();
            term.upsert_qualitative_evaluations(&[QualitativeEvaluationInput {
                student: StudentSnapshot {
                    id: lia.id,
                    name: lia.name.clone(),
                    cpf: None,
                },
                evaluations: vec![FieldStatus {
                    field_name: "Linguagem".to_string(),
                    status: *status,
                }],
            }]);
            // Uma falta por bimestre.
            let lesson_id = term.add_lesson(
                "Roda".to_string(),
                date(2025, (1 + 2 * i) as u32, 5),
                1.0,
                std::slice::from_ref(&lia),
            );
            term.lesson_mut(lesson_id).unwrap().replace_attendance(vec![
                crate::models::gradebook::AttendanceEntry {
                    student_id: lia.id,
                    present: false,
                },
            ]);
        }

        let record = general_record(&gb.terms, std::slice::from_ref(&lia));
        assert_eq!(record[0].fields.len(), 1);
        // Melhor estágio já alcançado, mesmo que um bimestre posterior regrida.
        assert_eq!(record[0].fields[0].status, DevelopmentStatus::Developed);
        assert_eq!(record[0].total_absences, 3);
    }

    #[test]
    fn learning_record_zero_fills_terms_without_average() {
        let mut gb = regular_gradebook();
        let ana = student("Ana");

        for (i, avg) in [Some(7.0), None, Some(9.0)].iter().enumerate() {
            let term_id = gb
                .add_term(
                    Some(format!("{}º Bimestre", i + 1)),
                    date(2025, (1 + 2 * i) as u32, 1),
                    date(2025, (2 + 2 * i) as u32, 28),
                )
                .unwrap();
            if let Some(avg) = avg {
                gb.term_mut(term_id)
                    .unwrap()
                    .upsert_numeric_evaluations(&[numeric_input(&ana, Some(*avg))]);
            }
        }

        let record = learning_record(&gb, std::slice::from_ref(&ana), false);
        assert_eq!(record[0].annual_average, 5.33);
        assert_eq!(record[0].bimonthly_averages.len(), 3);
        assert_eq!(record[0].bimonthly_averages[1].average, 0.0);

        let record = learning_record(&gb, std::slice::from_ref(&ana), true);
        assert_eq!(record[0].annual_average, 8.0);
    }

    // O fluxo completo de um bimestre, em memória: aula criada com a chamada
    // já aberta para a turma inteira, um aluno marcado como ausente na
    // edição, e a planilha refletindo a falta.
    #[test]
    fn lesson_bootstrap_then_absence_shows_up_in_sheet() {
        let mut gb = regular_gradebook();
        let term_id = term_with_dates(&mut gb);
        let ana = student("Ana");
        let bruno = student("Bruno");
        let roster = vec![ana.clone(), bruno.clone()];

        let term = gb.term_mut(term_id).unwrap();
        let lesson_id = term.add_lesson("Frações".to_string(), date(2025, 2, 10), 2.0, &roster);
        assert_eq!(term.lesson(lesson_id).unwrap().attendance.len(), 2);

        term.lesson_mut(lesson_id).unwrap().replace_attendance(vec![
            crate::models::gradebook::AttendanceEntry {
                student_id: ana.id,
                present: false,
            },
            crate::models::gradebook::AttendanceEntry {
                student_id: bruno.id,
                present: true,
            },
        ]);

        let sheet = numeric_evaluation_sheet(gb.term(term_id).unwrap(), &roster);
        assert_eq!(sheet[0].student.name, "Ana");
        assert_eq!(sheet[0].total_absences, 1);
        assert_eq!(sheet[1].total_absences, 0);
    }

    #[test]
    fn round2_matches_to_fixed() {
        assert_eq!(round2(5.333333), 5.33);
        assert_eq!(round2(5.335), 5.34);
        assert_eq!(round2(0.0), 0.0);
    }
}
