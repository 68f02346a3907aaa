use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    CareerOnly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    Associate,
    Bachelor,
    Master,
    Doctor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EducationStatus {
    Enrolled,
    Leave,
    Graduated,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    Contract,
    Intern,
    Freelance,
    PartTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub school: String,
    pub major: String,
    pub degree: Degree,
    pub status: EducationStatus,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkExperience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_current: bool,
    pub company: String,
    pub position: String,
    pub employment_type: EmploymentType,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub period: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MentorQnA {
    pub targeted_capital: Option<bool>,
    pub reason_for_local: Option<String>,
    pub helpful_organizations: Option<String>,
    pub local_advantages: Option<String>,
    pub local_disadvantages: Option<String>,
    pub advice_for_juniors: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerProfile {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub skill_tags: Vec<String>,
    pub is_mentor: bool,
    #[serde(default)]
    pub educations: Vec<Education>,
    #[serde(default)]
    pub works: Vec<WorkExperience>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub mentor_qna: Option<MentorQnA>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerContactUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerEducationsUpdate {
    pub educations: Vec<Education>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerWorksUpdate {
    pub works: Vec<WorkExperience>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerSkillsUpdate {
    pub skill_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerCertificationsUpdate {
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerActivitiesUpdate {
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CareerMentorQnAUpdate {
    pub mentor_qna: MentorQnA,
}
