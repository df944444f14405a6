//! Decides which files of a project are message sources.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::I18nSettings;
use crate::classify::{
    SourceFileKind,
    classify,
};

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Classifies project files, honoring `excludePatterns`.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Root every pattern is relative to.
    project_root: PathBuf,
    /// Compiled `excludePatterns`.
    exclude_set: GlobSet,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(project_root: PathBuf, settings: &I18nSettings) -> Result<Self, MatcherError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidExcludePattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        Ok(Self { project_root, exclude_set: builder.build()? })
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Path of a file relative to the project root, with `/` separators.
    ///
    /// This is the path files are ingested under. `None` outside the project.
    #[must_use]
    pub fn relative_path(&self, absolute_path: &Path) -> Option<String> {
        let relative_path = absolute_path.strip_prefix(&self.project_root).ok()?;
        let parts: Vec<_> =
            relative_path.components().map(|part| part.as_os_str().to_string_lossy()).collect();
        Some(parts.join("/"))
    }

    /// Kind of a file under the project root, or `None` if it is excluded or not a source.
    #[must_use]
    pub fn classify(&self, absolute_path: &Path) -> Option<SourceFileKind> {
        self.classify_relative(&self.relative_path(absolute_path)?)
    }

    /// Same as [`Self::classify`] for a path relative to the project root.
    #[must_use]
    pub fn classify_relative(&self, relative_path: &str) -> Option<SourceFileKind> {
        if self.exclude_set.is_match(relative_path) {
            return None;
        }
        classify(relative_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn matcher(exclude: &[&str]) -> FileMatcher {
        let settings = I18nSettings {
            exclude_patterns: exclude.iter().copied().map(String::from).collect(),
            ..I18nSettings::default()
        };
        FileMatcher::new(PathBuf::from("/project"), &settings).expect("valid patterns")
    }

    #[rstest]
    #[case::definitions("/project/src/App.messages.ts", Some(SourceFileKind::Definitions))]
    #[case::translations("/project/src/messages/fr.messages.json", Some(SourceFileKind::Translations))]
    #[case::other("/project/src/App.ts", None)]
    #[case::node_modules("/project/node_modules/lib/App.messages.js", None)]
    #[case::outside_project("/other/src/App.messages.ts", None)]
    fn classify_with_default_patterns(
        #[case] path: &str,
        #[case] expected: Option<SourceFileKind>,
    ) {
        assert_eq!(matcher(&["node_modules/**"]).classify(Path::new(path)), expected);
    }

    #[rstest]
    fn classify_with_exclude_patterns() {
        let matcher = matcher(&["**/dist/**", "legacy/*.messages.json"]);

        assert_eq!(matcher.classify_relative("dist/App.messages.js"), None);
        assert_eq!(matcher.classify_relative("legacy/fr.messages.json"), None);
        assert_eq!(
            matcher.classify_relative("legacy/nested/fr.messages.json"),
            Some(SourceFileKind::Translations)
        );
    }

    #[rstest]
    fn relative_path_uses_forward_slashes() {
        let matcher = matcher(&[]);

        assert_eq!(
            matcher.relative_path(Path::new("/project/src/messages/fr.messages.json")).as_deref(),
            Some("src/messages/fr.messages.json")
        );
        assert_eq!(matcher.relative_path(Path::new("/elsewhere/a.messages.js")), None);
    }

    #[rstest]
    fn new_with_invalid_exclude_pattern() {
        let settings =
            I18nSettings { exclude_patterns: vec!["[invalid".to_string()], ..I18nSettings::default() };

        let result = FileMatcher::new(PathBuf::from("/project"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidExcludePattern { .. })));
    }

    #[rstest]
    fn project_root_accessor() {
        assert_eq!(matcher(&[]).project_root(), Path::new("/project"));
    }
}
