use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

const DEFAULT_SKILLS: [&str; 11] = [
    "Python",
    "Machine Learning",
    "Deep Learning",
    "Data Analysis",
    "SQL",
    "C++",
    "Communication",
    "Problem Solving",
    "HTML",
    "CSS",
    "JavaScript",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    /// Lowercase, whitespace-collapsed form used for matching.
    pub key: String,
    pub label: String,
}

/// Known skills, keyed and ordered by their lowercase form.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    skills: BTreeMap<String, Skill>,
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::from_labels(DEFAULT_SKILLS)
    }
}

impl SkillVocabulary {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut skills = BTreeMap::new();
        for raw in labels {
            let label = raw.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
            if label.is_empty() {
                continue;
            }

            let key = label.to_lowercase();
            let label = if label == key { title_case(&label) } else { label };
            skills.entry(key.clone()).or_insert(Skill { key, label });
        }

        Self { skills }
    }

    /// Loads a `.json` array of strings, or a plain list with one skill per line.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read skills file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|v| v.to_str())
            .is_some_and(|v| v.eq_ignore_ascii_case("json"));

        let vocabulary = if is_json {
            let labels = serde_json::from_str::<Vec<String>>(&content).with_context(|| {
                format!("invalid JSON in skills file {}", path.display())
            })?;
            Self::from_labels(labels)
        } else {
            Self::from_labels(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.starts_with('#')),
            )
        };

        if vocabulary.is_empty() {
            anyhow::bail!("skills file {} contains no skills", path.display());
        }

        Ok(vocabulary)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
