use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::warn;

use lms_sync::config::Config;
use lms_sync::enrollment::EnrollmentReconciler;
use lms_sync::export::{write_students_csv, write_submissions_csv};
use lms_sync::grading::{ensure_complete, grade};
use lms_sync::models::{AnswerValue, GradingUpdate, ProfileUpdate, SubmissionStatus};
use lms_sync::progress::ProgressTracker;
use lms_sync::services::activity::ActivityClient;
use lms_sync::services::analytics::AnalyticsClient;
use lms_sync::services::assessment::AssessmentClient;
use lms_sync::services::course::{CourseClient, CourseUpsert};
use lms_sync::services::user::UserClient;
use lms_sync::stats::activity_stats;
use lms_sync::store::LocalStore;
use lms_sync::utils::init_log;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "./lms-sync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to the gateway and persist the session token
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List the courses the current user is enrolled in
    MyCourses,
    /// Enroll the current user into a course
    Enroll { course_id: i64 },
    /// Show completion state for a course
    Progress { course_id: i64 },
    /// Toggle completion of one material of a course
    Toggle { course_id: i64, material_id: i64 },
    /// Answer an assessment and submit the auto-graded attempt.
    /// Answers are option indices in question order, e.g. `0 2 1` for
    /// single-answer questions and `0+2` for a multi-answer question.
    TakeAssessment {
        assessment_id: i64,
        answers: Vec<String>,
    },
    /// List the assessments of a course
    Assessments { course_id: i64 },
    /// List the current user's submissions
    MySubmissions,
    /// Manually grade a submission (admin)
    GradeSubmission {
        submission_id: i64,
        marks: f64,
        #[arg(long, default_value = "")]
        feedback: String,
    },
    /// Show a user profile (the current user's without an id)
    UserInfo { user_id: Option<i64> },
    /// Update the editable fields of the current user's profile
    UpdateProfile {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        education: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Create a course (admin)
    CreateCourse {
        #[command(flatten)]
        form: CourseForm,
    },
    /// Update a course (admin)
    UpdateCourse {
        course_id: i64,
        #[command(flatten)]
        form: CourseForm,
    },
    /// Delete a course (admin)
    DeleteCourse { course_id: i64 },
    /// Aggregated click statistics over the whole activity log
    ActivityStats,
    /// Export the student roster to csv
    ExportStudents { path: PathBuf },
    /// Export the submissions of one assessment to csv
    ExportSubmissions { assessment_id: i64, path: PathBuf },
    /// AI success prediction for the current user in a module
    Predict { module_code: String },
    /// AI study recommendations for the current user in a module
    Recommend { module_code: String },
    /// Check whether the AI service is reachable
    AiHealth,
}

/// Fields shared by the course create and update forms.
#[derive(Args)]
struct CourseForm {
    title: String,
    course_code: String,
    module_code: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    length: Option<String>,
}

impl CourseForm {
    fn into_upsert(self) -> CourseUpsert {
        CourseUpsert {
            title: self.title,
            course_code: self.course_code,
            module_code: self.module_code,
            description: self.description,
            presentation_length: self.length,
        }
    }
}

/// `"2"` is a single option index, `"0+2"` a multi-answer selection.
fn parse_answers(raw: &[String]) -> anyhow::Result<BTreeMap<usize, AnswerValue>> {
    let mut answers = BTreeMap::new();
    for (index, token) in raw.iter().enumerate() {
        let value = if token.contains('+') {
            let indices = token
                .split('+')
                .map(|part| part.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()?;
            AnswerValue::Many(indices)
        } else {
            AnswerValue::One(token.trim().parse()?)
        };
        answers.insert(index, value);
    }
    Ok(answers)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_log(None);
    let args = Cli::parse();
    let config = Config::load(&args.config)?;

    let store = LocalStore::connect(&config.store_url()).await?;
    let token = match &config.token {
        Some(token) => Some(token.clone()),
        None => store.get("token").await?,
    };
    let token = token.as_deref();

    let users = UserClient::new(&config.gateway_url, token);
    let courses = CourseClient::new(&config.gateway_url, token);
    let activities = ActivityClient::new(&config.gateway_url, token);
    let assessments = AssessmentClient::new(&config.gateway_url, token);
    let analytics = AnalyticsClient::new(&config.ai_url);

    match args.command {
        Command::Login { email, password } => {
            let response = users.login(&email, &password).await?;
            store.set("token", &response.token).await?;
            println!("logged in as {email}");
        }
        Command::MyCourses => {
            let user = users.get_me().await.ok();
            let reconciler = EnrollmentReconciler::new(&courses, &activities, &store);
            let enrolled = reconciler
                .resolve_enrollments(user.as_ref().map(|u| u.id))
                .await?;
            if enrolled.is_empty() {
                println!("no active enrollments");
            }
            let tracker = ProgressTracker::new(&store);
            for course in enrolled {
                let percentage = match &user {
                    Some(user) => tracker.percentage(user.id, course.id).await?,
                    None => 0,
                };
                println!(
                    "{:>4}  {:<10} {:<40} {percentage:>3}%",
                    course.id, course.course_code, course.title
                );
            }
        }
        Command::Enroll { course_id } => {
            let user = users.get_me().await?;
            let reconciler = EnrollmentReconciler::new(&courses, &activities, &store);
            reconciler.enroll_with_follow(user.id, course_id).await?;
            println!("enrolled in course {course_id}");
        }
        Command::Progress { course_id } => {
            let user = users.get_me().await?;
            let tracker = ProgressTracker::new(&store);
            let percentage = tracker.percentage(user.id, course_id).await?;
            let completed = tracker.completed(user.id, course_id).await?;
            println!("{percentage}% ({} material(s) completed)", completed.len());
        }
        Command::Toggle {
            course_id,
            material_id,
        } => {
            let (user, course, materials) = tokio::try_join!(
                users.get_me(),
                courses.get_course(course_id),
                courses.list_materials(course_id),
            )?;
            // click signal for later enrollment inference; never blocks
            // the toggle itself
            if let Some(material) = materials.iter().find(|m| m.id == material_id) {
                let today = OffsetDateTime::now_utc()
                    .date()
                    .format(&format_description!("[year]-[month]-[day]"))
                    .unwrap_or_default();
                if let Err(e) = activities
                    .increment_clicks(
                        user.id,
                        &course.course_code,
                        &material.week_number.to_string(),
                        &today,
                    )
                    .await
                {
                    warn!("click tracking failed: {e}");
                }
            }
            let tracker = ProgressTracker::new(&store);
            let percentage = tracker
                .toggle(user.id, course_id, material_id, materials.len())
                .await?;
            println!("course {course_id}: {percentage}%");
        }
        Command::TakeAssessment {
            assessment_id,
            answers,
        } => {
            let (assessment, user) =
                tokio::try_join!(assessments.get_assessment(assessment_id), users.get_me())?;
            let answers = parse_answers(&answers)?;
            ensure_complete(&assessment.questions, &answers)?;
            let report = grade(&assessment.questions, &answers, assessment.max_marks);
            if report.ungraded {
                println!("ungraded: this assessment has no questions yet");
                return Ok(());
            }
            println!(
                "{}/{} correct, score {}/{}, {:.0}%: {} ({})",
                report.correct_count,
                report.total_questions,
                report.score,
                assessment.max_marks,
                report.percentage,
                if report.passed { "validé" } else { "non validé" },
                report.tier
            );
            println!("{}", report.feedback());
            let submission = report.into_submission(user.id, assessment_id);
            assessments.submit(&submission).await?;
        }
        Command::Assessments { course_id } => {
            let list = assessments.list_for_course(course_id).await?;
            if list.is_empty() {
                println!("no assessments for course {course_id}");
            }
            for assessment in list {
                println!(
                    "{:>4}  {:<30} {} question(s), {} marks",
                    assessment.id,
                    assessment.title,
                    assessment.questions.len(),
                    assessment.max_marks
                );
            }
        }
        Command::MySubmissions => {
            let user = users.get_me().await?;
            let submissions = assessments.list_for_student(user.id).await?;
            if submissions.is_empty() {
                println!("no submissions");
            }
            for submission in submissions {
                println!(
                    "{:>4}  assessment {:>4}  {:>6.1}  {}",
                    submission.id.unwrap_or_default(),
                    submission.assessment_id,
                    submission.marks_obtained,
                    submission.submission_status
                );
            }
        }
        Command::GradeSubmission {
            submission_id,
            marks,
            feedback,
        } => {
            let update = GradingUpdate {
                marks_obtained: marks,
                feedback,
                submission_status: SubmissionStatus::Graded,
                graded_at: OffsetDateTime::now_utc(),
            };
            let submission = assessments.grade(submission_id, &update).await?;
            println!(
                "submission {submission_id}: {} ({})",
                submission.marks_obtained, submission.submission_status
            );
        }
        Command::UserInfo { user_id } => {
            let user = match user_id {
                Some(id) => users.get_user(id).await?,
                None => users.get_me().await?,
            };
            println!(
                "#{} {} {} <{}> {}",
                user.id, user.first_name, user.last_name, user.email, user.role
            );
            if let Some(city) = &user.city {
                println!("city: {city}");
            }
            if let Some(education) = &user.education {
                println!("education: {education}");
            }
            if let Some(bio) = &user.bio {
                println!("bio: {bio}");
            }
        }
        Command::UpdateProfile {
            city,
            education,
            bio,
        } => {
            let user = users.get_me().await?;
            let update = ProfileUpdate {
                city,
                education,
                bio,
            };
            let user = users.update_profile(user.id, &update).await?;
            println!("profile updated for {}", user.email);
        }
        Command::CreateCourse { form } => {
            let course = courses.create_course(&form.into_upsert()).await?;
            println!("created course {} ({})", course.id, course.course_code);
        }
        Command::UpdateCourse { course_id, form } => {
            let course = courses.update_course(course_id, &form.into_upsert()).await?;
            println!("updated course {} ({})", course.id, course.course_code);
        }
        Command::DeleteCourse { course_id } => {
            courses.delete_course(course_id).await?;
            println!("deleted course {course_id}");
        }
        Command::ActivityStats => {
            let log = activities.list_all().await?;
            let stats = activity_stats(&log);
            println!("total clicks: {}", stats.total_clicks);
            println!("active students: {}", stats.active_students);
            match &stats.most_popular_course {
                Some((code, clicks)) => println!("most popular course: {code} ({clicks} clicks)"),
                None => println!("most popular course: N/A"),
            }
            for activity in &stats.recent {
                println!(
                    "  {} clicked {}x on {} (module {})",
                    activity.student_id,
                    activity.sum_clicks,
                    activity.course_code,
                    activity.module_code
                );
            }
        }
        Command::ExportStudents { path } => {
            let students = users.list_students().await;
            let file = std::fs::File::create(&path)?;
            write_students_csv(&students, file)?;
            println!("wrote {} student(s) to {}", students.len(), path.display());
        }
        Command::ExportSubmissions {
            assessment_id,
            path,
        } => {
            let submissions = assessments.list_for_assessment(assessment_id).await?;
            let file = std::fs::File::create(&path)?;
            write_submissions_csv(&submissions, file)?;
            println!(
                "wrote {} submission(s) to {}",
                submissions.len(),
                path.display()
            );
        }
        Command::Predict { module_code } => {
            let user = users.get_me().await?;
            match analytics.predict(user.id, &module_code).await {
                Ok(prediction) => println!(
                    "success probability {:.0}%, risk {}: {}",
                    prediction.success_proba * 100.0,
                    prediction.risk_level,
                    prediction.message
                ),
                Err(e) => {
                    // enhancement only, never fatal
                    warn!("prediction unavailable: {e}");
                    println!("AI service unavailable (mode démo)");
                }
            }
        }
        Command::Recommend { module_code } => {
            let user = users.get_me().await?;
            match analytics.recommendations(user.id, &module_code).await {
                Ok(recommendations) => {
                    if recommendations.is_empty() {
                        println!("no recommendations for module {module_code}");
                    }
                    for reco in recommendations {
                        println!("[{}] {}: {}", reco.kind, reco.title, reco.reason);
                        if !reco.url.is_empty() {
                            println!("      {}", reco.url);
                        }
                    }
                }
                Err(e) => {
                    warn!("recommendations unavailable: {e}");
                    println!("AI service unavailable (mode démo)");
                }
            }
        }
        Command::AiHealth => {
            let health = analytics.health().await;
            println!("AI service: {}", health.status);
        }
    }

    Ok(())
}
