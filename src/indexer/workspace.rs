//! Walks a project, feeds its message files to a database and writes the outputs.

use std::path::{
    Path,
    PathBuf,
};

use ignore::WalkBuilder;

use super::types::{
    FileChange,
    IndexSummary,
    IndexerError,
};
use crate::classify::{
    SourceFileKind,
    classify,
};
use crate::config::{
    FileMatcher,
    I18nSettings,
};
use crate::database::{
    IngestOutcome,
    MessagesDatabase,
    TranslationsInput,
};
use crate::error::DatabaseResult;

/// A message file found in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FoundFile {
    /// Path on disk.
    absolute_path: PathBuf,
    /// Path relative to the project root, used as the ingestion key.
    path: String,
    /// Definitions or translations.
    kind: SourceFileKind,
}

/// Indexes the message files of one project.
#[derive(Clone, Debug)]
pub struct WorkspaceIndexer {
    /// Decides which files are indexed.
    matcher: FileMatcher,
}

impl WorkspaceIndexer {
    #[must_use]
    pub const fn new(matcher: FileMatcher) -> Self {
        Self { matcher }
    }

    #[must_use]
    pub const fn matcher(&self) -> &FileMatcher {
        &self.matcher
    }

    /// Ingests every message file of the project.
    ///
    /// Definitions are ingested first, in path order, so translations can resolve their keys.
    /// Unreadable or rejected files are recorded in the summary and skipped.
    pub fn index_workspace(&self, db: &MessagesDatabase) -> IndexSummary {
        let root = self.matcher.project_root();
        tracing::debug!(project_root = %root.display(), "Indexing project");

        let mut summary = IndexSummary::default();
        let mut translations = Vec::new();
        for file in self.find_source_files() {
            let content = match std::fs::read_to_string(&file.absolute_path) {
                Ok(content) => content,
                Err(source) => {
                    tracing::warn!("Failed to read file {:?}: {}", file.absolute_path, source);
                    summary
                        .failures
                        .push((file.path, IndexerError::Read { path: file.absolute_path, source }));
                    continue;
                }
            };
            match file.kind {
                SourceFileKind::Definitions => match db.ingest_definitions(&file.path, &content, None) {
                    Ok(_) => summary.definitions += 1,
                    Err(error) => summary.failures.push((file.path, error.into())),
                },
                SourceFileKind::Translations => {
                    translations.push(TranslationsInput { path: file.path, locale: None, content });
                }
            }
        }

        let results = db.ingest_translations_batch(&translations);
        for (input, result) in translations.into_iter().zip(results) {
            match result {
                Ok(_) => summary.translations += 1,
                Err(error) => summary.failures.push((input.path, error.into())),
            }
        }

        tracing::info!(
            definitions = summary.definitions,
            translations = summary.translations,
            failures = summary.failures.len(),
            "Indexed project"
        );
        summary
    }

    /// Builds the change event for a file that changed on disk.
    ///
    /// Returns `None` for files that are not message files.
    ///
    /// # Errors
    /// `Read` if the file exists but can't be read.
    pub fn file_change(
        &self,
        db: &MessagesDatabase,
        absolute_path: &Path,
    ) -> Result<Option<FileChange>, IndexerError> {
        let Some(path) = self.matcher.relative_path(absolute_path) else {
            return Ok(None);
        };
        if self.matcher.classify_relative(&path).is_none() {
            return Ok(None);
        }
        if !absolute_path.exists() {
            return Ok(Some(FileChange::Deleted { path }));
        }

        let content = std::fs::read_to_string(absolute_path)
            .map_err(|source| IndexerError::Read { path: absolute_path.to_path_buf(), source })?;
        let is_known = db.get_source_file(&path).is_ok();
        Ok(Some(if is_known {
            FileChange::Modified { path, content }
        } else {
            FileChange::Created { path, content }
        }))
    }

    /// Writes compiled messages for every known locale and type declarations for every
    /// definitions file, as configured in `settings.output`. Returns the written paths.
    ///
    /// # Errors
    /// The first compile or write failure.
    pub fn write_outputs(
        &self,
        db: &MessagesDatabase,
        settings: &I18nSettings,
    ) -> Result<Vec<PathBuf>, IndexerError> {
        let root = self.matcher.project_root();
        let compile_options = settings.compile_options();
        let locales = db.get_known_locales();
        let mut written = Vec::new();

        for path in db.get_all_source_file_paths() {
            if classify(&path) != Some(SourceFileKind::Definitions) {
                continue;
            }

            if let Some(dir) = &settings.output.dir {
                let output_dir = root.join(dir).join(strip_script_extension(&path));
                for locale in &locales {
                    let output = output_dir.join(format!("{locale}.json"));
                    db.precompile_to_path(&path, locale, &output, &compile_options)?;
                    written.push(output);
                }
            }

            if settings.output.generate_types {
                let output = root.join(declaration_path(&path));
                db.generate_types(&path, &output, settings.output.allow_nullability)?;
                written.push(output);
            }
        }

        tracing::info!(files = written.len(), "Wrote outputs");
        Ok(written)
    }

    /// Message files of the project, sorted by path.
    fn find_source_files(&self) -> Vec<FoundFile> {
        let mut found_files = Vec::new();

        for result in WalkBuilder::new(self.matcher.project_root())
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let absolute_path = entry.path();
            let Some(path) = self.matcher.relative_path(absolute_path) else {
                continue;
            };
            let Some(kind) = self.matcher.classify_relative(&path) else {
                continue;
            };
            found_files.push(FoundFile { absolute_path: absolute_path.to_path_buf(), path, kind });
        }

        found_files.sort_by(|a, b| a.path.cmp(&b.path));
        found_files
    }
}

/// Applies a file-system event to the database.
///
/// Returns the ingestion outcome for created or modified message files, `None` for deletions
/// and for files that are not message files.
///
/// # Errors
/// Whatever the ingestion returns. The database keeps the previous contribution of the file.
pub fn apply_file_change(
    db: &MessagesDatabase,
    change: &FileChange,
) -> DatabaseResult<Option<IngestOutcome>> {
    let (path, content) = match change {
        FileChange::Deleted { path } => {
            db.retire_source_file(path);
            return Ok(None);
        }
        FileChange::Created { path, content } | FileChange::Modified { path, content } => {
            (path, content)
        }
    };

    let outcome = match classify(path) {
        Some(SourceFileKind::Definitions) => db.ingest_definitions(path, content, None)?,
        Some(SourceFileKind::Translations) => db.ingest_translations(path, None, content)?,
        None => return Ok(None),
    };
    Ok(Some(outcome))
}

/// Path of the `.d.ts` generated for a definitions file (`App.messages.ts` ->
/// `App.messages.d.ts`).
#[must_use]
pub fn declaration_path(path: &str) -> String {
    format!("{}.d.ts", strip_script_extension(path))
}

/// Drops the `.js`/`.jsx`/`.ts`/`.tsx` extension of a definitions file path.
fn strip_script_extension(path: &str) -> &str {
    [".js", ".jsx", ".ts", ".tsx"]
        .iter()
        .find_map(|extension| path.strip_suffix(extension))
        .unwrap_or(path)
}
