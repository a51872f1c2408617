use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Category, Student};

/// A student paired with its merit position inside its own category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedStudent {
    pub student: Student,
    pub rank: u32,
}

/// Rank every student within its category, highest merit first.
///
/// Equal scores fall back to the student identifier, which the repository hands out in
/// insertion order, so the earlier registration ranks higher. The output is grouped by
/// category in declaration order with ranks ascending inside each group.
pub fn rank_by_category(students: &[Student]) -> Vec<RankedStudent> {
    let mut partitions: BTreeMap<Category, Vec<&Student>> = BTreeMap::new();
    for student in students {
        partitions.entry(student.category).or_default().push(student);
    }

    let mut ranked = Vec::with_capacity(students.len());
    for (_, mut members) in partitions {
        members.sort_by(|left, right| {
            right
                .merit_score
                .cmp(&left.merit_score)
                .then_with(|| left.id.cmp(&right.id))
        });

        ranked.extend(members.into_iter().zip(1u32..).map(|(student, rank)| {
            RankedStudent {
                student: student.clone(),
                rank,
            }
        }));
    }

    ranked
}
