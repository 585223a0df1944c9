use super::{editor, StageContext};
use crate::form::{Field, Form, FormAction, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_protocol::{Record, RecordType};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PATH: usize = 0;
const DESCRIPTION: usize = 1;

const DEFAULT_DESCRIPTION: &str = "Файл";
const TO_LIST: &str = "На список";

/// Uploads a local file. Opening an existing file record downloads it instead.
pub struct FileForm {
    form: FormState,
    record_id: String,
}

impl FileForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new(
                vec![
                    Field::new("Путь к файлу").unlimited(),
                    Field::new("Описание").with_value(DEFAULT_DESCRIPTION),
                ],
                StageName::RecordList,
                editor::SAVE_LABEL,
            ),
            record_id: String::new(),
        }
    }

    pub async fn prepare(&mut self, ctx: &StageContext<'_>) -> Outcome {
        self.record_id = ctx.session.record_id.clone();
        match editor::load(ctx, RecordType::File).await {
            Ok(Some(record)) => download(&ctx.services.download_dir, &record).await,
            Ok(None) => Outcome::None,
            Err(outcome) => outcome,
        }
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        let action = match key {
            Key::Ctrl('s') => FormAction::Submit,
            Key::Ctrl('b') => FormAction::Back,
            key => self.form.handle_key(key),
        };
        match action {
            FormAction::Submit => self.save(ctx).await,
            FormAction::Back => Outcome::SwitchStage(self.form.back()),
            FormAction::None => Outcome::None,
        }
    }

    async fn save(&self, ctx: &StageContext<'_>) -> Outcome {
        let path = PathBuf::from(self.form.value(PATH).trim());
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Outcome::info("Укажите путь к файлу", StageName::File, editor::BACK_BUTTON),
        };

        // Size comes from metadata so oversized files are never read.
        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) | Err(_) => {
                warn!(path = %path.display(), "file is not readable");
                return Outcome::info("Ошибка при чтении файла", StageName::File, editor::BACK_BUTTON);
            }
        };
        if let Err(e) = ctx.services.limits.check_size(size) {
            return Outcome::info(e.user_message(), StageName::File, editor::BACK_BUTTON);
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), "failed to read file: {e}");
                return Outcome::info("Ошибка при чтении файла", StageName::File, editor::BACK_BUTTON);
            }
        };

        let record = editor::template(
            RecordType::File,
            &self.record_id,
            &name,
            self.form.value(DESCRIPTION),
        );
        editor::save(ctx, StageName::File, &record, &bytes).await
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Файл\n\n");
        self.form.render(&mut out);
        out.push('\n');
        out.push_str(editor::FOOTER);
        out
    }
}

/// Writes a fetched file record into `dir` under its own file name.
async fn download(dir: &Path, record: &Record) -> Outcome {
    let name = record.name_lossy();
    let file_name = Path::new(&name)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| format!("file-{}", record.id).into());
    let target = dir.join(file_name);

    let written: std::io::Result<()> = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&target, &record.body).await
    }
    .await;

    match written {
        Ok(()) => {
            info!(path = %target.display(), bytes = record.body.len(), "file downloaded");
            Outcome::info(
                format!("Файл был скачан в папку {}", dir.display()),
                StageName::RecordList,
                TO_LIST,
            )
        }
        Err(e) => {
            warn!(path = %target.display(), "failed to write download: {e}");
            Outcome::info(
                format!("Не удалось сохранить файл {}: {e}", target.display()),
                StageName::RecordList,
                TO_LIST,
            )
        }
    }
}

impl Default for FileForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Form for FileForm {
    fn form(&self) -> &FormState {
        &self.form
    }
}
