use std::io::Write;

use crate::models::{Submission, User};

/// Student roster as csv, one row per user.
pub fn write_students_csv<W: Write>(students: &[User], writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["id", "first_name", "last_name", "email", "role"])?;
    for student in students {
        csv_writer.write_record([
            student.id.to_string(),
            student.first_name.clone(),
            student.last_name.clone(),
            student.email.clone(),
            student.role.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Submission sheet for one assessment, for offline review.
pub fn write_submissions_csv<W: Write>(
    submissions: &[Submission],
    writer: W,
) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "id",
        "student_id",
        "assessment_id",
        "marks_obtained",
        "status",
        "submitted_at",
        "feedback",
    ])?;
    for submission in submissions {
        csv_writer.write_record([
            submission.id.map_or_else(String::new, |id| id.to_string()),
            submission.student_id.to_string(),
            submission.assessment_id.to_string(),
            format!("{:.1}", submission.marks_obtained),
            submission.submission_status.to_string(),
            submission
                .submitted_at
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            submission.feedback.clone().unwrap_or_default(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SubmissionStatus};
    use time::macros::datetime;

    #[test]
    fn students_csv_shape() {
        let students = vec![User {
            id: 4,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Student,
            city: None,
            education: None,
            bio: None,
        }];
        let mut buffer = Vec::new();
        write_students_csv(&students, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,first_name,last_name,email,role"));
        assert_eq!(lines.next(), Some("4,Ada,Lovelace,ada@example.com,STUDENT"));
    }

    #[test]
    fn submissions_csv_shape() {
        let submissions = vec![Submission {
            id: Some(11),
            student_id: 4,
            assessment_id: 9,
            marks_obtained: 15.0,
            submission_status: SubmissionStatus::Graded,
            submitted_at: datetime!(2026-02-01 10:00 UTC),
            graded_at: None,
            feedback: Some("Bien".to_string()),
            answers: String::new(),
        }];
        let mut buffer = Vec::new();
        write_submissions_csv(&submissions, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("11,4,9,15.0,GRADED,2026-02-01T10:00:00Z,Bien"));
    }
}
