//! Project data model and language/template mapping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Seed code stored when a project is created with an unrecognised language.
pub const UNSUPPORTED_LANGUAGE_TEMPLATE: &str = "Language not supported";

/// Validation errors returned by [`ProjectName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    EmptyName,
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "project name must not be empty"),
        }
    }
}

impl std::error::Error for ProjectValidationError {}

/// Stable project identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Generate a new random [`ProjectId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its canonical string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ProjectId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Validate a project name (non-empty once trimmed).
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProjectValidationError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ProjectName {
    type Error = ProjectValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(value: ProjectName) -> Self {
        value.0
    }
}

/// Target language of a project.
///
/// The supported set is closed and exhaustively matched; creation with an
/// unknown language string is still accepted and carried as [`Language::Other`]
/// so the project seeds the [`UNSUPPORTED_LANGUAGE_TEMPLATE`] instead of
/// failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    Java,
    JavaScript,
    Cpp,
    C,
    Go,
    Bash,
    /// Unrecognised language tag, kept verbatim (lowercased).
    Other(String),
}

impl Language {
    /// Parse a language tag; input is lowercased first.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "python" => Self::Python,
            "java" => Self::Java,
            "javascript" => Self::JavaScript,
            "cpp" => Self::Cpp,
            "c" => Self::C,
            "go" => Self::Go,
            "bash" => Self::Bash,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Go => "go",
            Self::Bash => "bash",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Starter snippet seeded into newly created projects.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Python => r#"print("Hello World")"#,
            Self::Java => {
                "public class Main {\n  public static void main(String[] args) {\n    System.out.println(\"Hello World\");\n  }\n}"
            }
            Self::JavaScript => r#"console.log("Hello World");"#,
            Self::Cpp => {
                "#include<iostream>\nusing namespace std;\nint main() {\n  cout << \"Hello World\";\n  return 0;\n}"
            }
            Self::C => {
                "#include<stdio.h>\nint main() {\n  printf(\"Hello World\");\n  return 0;\n}"
            }
            Self::Go => {
                "package main\nimport \"fmt\"\nfunc main() {\n  fmt.Println(\"Hello World\")\n}"
            }
            Self::Bash => r#"echo "Hello World""#,
            Self::Other(_) => UNSUPPORTED_LANGUAGE_TEMPLATE,
        }
    }

    /// File extension sent to the execution API.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::Java => ".java",
            Self::JavaScript => ".js",
            Self::Cpp => ".cpp",
            Self::C => ".c",
            Self::Go => ".go",
            Self::Bash => ".sh",
            Self::Other(_) => ".txt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.as_str().to_owned()
    }
}

/// A named, language-tagged code buffer owned by a user.
///
/// Saves overwrite `code` in place: last write wins, with no optimistic
/// concurrency token.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: ProjectName,
    pub language: Language,
    pub owner: UserId,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a project seeded with the template for its language.
    pub fn seeded(name: ProjectName, language: Language, owner: UserId) -> Self {
        let now = Utc::now();
        let code = language.template().to_owned();
        Self {
            id: ProjectId::random(),
            name,
            language,
            owner,
            code,
            created_at: now,
            updated_at: now,
        }
    }

    /// File name submitted to the execution API (`name` + extension).
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name.as_str(), self.language.file_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("python", Language::Python)]
    #[case("PYTHON", Language::Python)]
    #[case("  bash ", Language::Bash)]
    #[case("cpp", Language::Cpp)]
    fn parses_known_tags_case_insensitively(#[case] raw: &str, #[case] expected: Language) {
        assert_eq!(Language::parse(raw), expected);
    }

    #[test]
    fn unknown_tag_is_carried_verbatim() {
        let lang = Language::parse("Brainfuck");
        assert_eq!(lang, Language::Other("brainfuck".to_owned()));
        assert_eq!(lang.template(), UNSUPPORTED_LANGUAGE_TEMPLATE);
        assert_eq!(lang.file_extension(), ".txt");
    }

    #[test]
    fn python_template_is_exact() {
        assert_eq!(Language::Python.template(), "print(\"Hello World\")");
    }

    #[test]
    fn seeded_project_carries_template_code() {
        let name = ProjectName::new("solver").expect("valid name");
        let project = Project::seeded(name, Language::Go, UserId::random());
        assert!(project.code.starts_with("package main"));
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn file_name_appends_extension() {
        let name = ProjectName::new("Main").expect("valid name");
        let project = Project::seeded(name, Language::Java, UserId::random());
        assert_eq!(project.file_name(), "Main.java");
    }
}
