use path_store::LearningPath;
use serde::Serialize;

/// One learning path as exposed over HTTP: ids travel as strings.
#[derive(Debug, Serialize)]
pub struct LearningPathDoc {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl From<LearningPath> for LearningPathDoc {
    fn from(path: LearningPath) -> Self {
        Self {
            id: path.id.to_string(),
            title: path.title,
            description: path.description,
        }
    }
}
