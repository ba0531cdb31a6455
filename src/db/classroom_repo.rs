use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::school::StudentRef};

// Provedor de roster: devolve a lista de alunos atualmente matriculados na
// turma. A caderneta só referencia a turma — quem é dono dos alunos é o CRUD
// de turmas/alunos (colaborador externo). Leitura sempre fresca: o roster
// nunca é cacheado dentro do bimestre.
#[derive(Clone)]
pub struct ClassroomRepository {
    pool: PgPool,
}

impl ClassroomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn roster(&self, classroom_id: Uuid) -> Result<Vec<StudentRef>, AppError> {
        let students = sqlx::query_as::<_, StudentRef>(
            "SELECT id, name, cpf FROM students
             WHERE classroom_id = $1
             ORDER BY lower(name)",
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }
}
