//! Custom characters defined by a name and a source PDF.

use std::path::{Path, PathBuf};

use crate::error::CharacterError;
use crate::figure::{Figure, Roster};
use crate::responder::Responder;

/// The "create a custom character" form.
#[derive(Debug, Clone, Default)]
pub struct CharacterDraft {
    pub name: String,
    pub pdf: Option<PathBuf>,
}

impl CharacterDraft {
    pub fn new(name: &str, pdf: Option<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            pdf,
        }
    }

    /// Returns the trimmed name and the PDF path if the draft is complete.
    pub fn validate(&self) -> Result<(&str, &Path), CharacterError> {
        let name = self.name.trim();
        let pdf = match &self.pdf {
            Some(path) if !name.is_empty() && !path.as_os_str().is_empty() => path.as_path(),
            _ => return Err(CharacterError::Incomplete),
        };

        let is_pdf = pdf
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(CharacterError::NotPdf(pdf.to_path_buf()));
        }
        if !pdf.is_file() {
            return Err(CharacterError::Missing(pdf.to_path_buf()));
        }

        Ok((name, pdf))
    }

    pub fn pdf_file_name(&self) -> Option<String> {
        self.pdf
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn into_figure(&self, id: i64) -> Result<Figure, CharacterError> {
        let (name, _) = self.validate()?;
        let source = self.pdf_file_name().unwrap_or_default();
        Ok(Figure::new(
            id,
            name,
            &format!("Custom character trained on {}", source),
            "",
        ))
    }
}

/// Validates `draft`, hands its PDF to the responder and adds the new figure
/// to `roster`.
pub async fn create_character(
    draft: &CharacterDraft,
    roster: &mut Roster,
    responder: &dyn Responder,
) -> Result<Figure, CharacterError> {
    let (name, pdf) = draft.validate()?;
    log::info!("creating custom character {} from {}", name, pdf.display());

    let remote_id = responder.upload_pdf(pdf).await?;
    add_character(draft, roster, remote_id)
}

/// Adds the figure for an already uploaded `draft` to `roster`.
///
/// The figure always takes the roster's next free id. A backend id, when
/// there is one, is kept as the figure's chat id.
pub fn add_character(
    draft: &CharacterDraft,
    roster: &mut Roster,
    remote_id: Option<i64>,
) -> Result<Figure, CharacterError> {
    let mut figure = draft.into_figure(roster.next_id())?;
    if let Some(remote_id) = remote_id {
        figure = figure.with_remote_id(remote_id);
    }
    roster.add(figure.clone())?;
    log::debug!("added {} as figure {} (chat id {})", figure.name, figure.id, figure.chat_id());
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::{MockResponder, RemoteResponder};
    use crate::session::ChatSession;
    use crate::state::Message;
    use crate::test_support::serve_once;
    use std::io::Write;
    use std::sync::Arc;

    fn pdf_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("lecture")
            .suffix(".pdf")
            .tempfile()
            .unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        file
    }

    #[test]
    fn test_incomplete_draft_message() {
        let draft = CharacterDraft::new("   ", None);
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, CharacterError::Incomplete));
        assert_eq!(err.to_string(), "Please provide a character name and select a PDF.");

        let file = pdf_file();
        let draft = CharacterDraft::new("", Some(file.path().to_path_buf()));
        assert!(matches!(draft.validate(), Err(CharacterError::Incomplete)));
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let draft = CharacterDraft::new("Ada", Some(PathBuf::from("notes.txt")));
        assert!(matches!(draft.validate(), Err(CharacterError::NotPdf(_))));
    }

    #[test]
    fn test_missing_pdf_is_rejected() {
        let draft = CharacterDraft::new("Ada", Some(PathBuf::from("/nonexistent/ada.pdf")));
        assert!(matches!(draft.validate(), Err(CharacterError::Missing(_))));
    }

    #[tokio::test]
    async fn test_create_character_adds_to_roster() {
        let file = pdf_file();
        let draft = CharacterDraft::new("  Ada Lovelace ", Some(file.path().to_path_buf()));
        let mut roster = Roster::default();
        let responder = MockResponder::placeholder();

        let figure = create_character(&draft, &mut roster, &responder).await.unwrap();

        assert_eq!(figure.id, 4);
        assert_eq!(figure.name, "Ada Lovelace");
        assert!(figure.description.ends_with(".pdf"));
        assert_eq!(roster.get(4), Some(&figure));
    }

    #[tokio::test]
    async fn test_backend_id_does_not_collide_with_roster() {
        let (base, _server) = serve_once("201 Created", r#"{"id": 1}"#).await;
        let responder = RemoteResponder::new(&base);
        let file = pdf_file();
        let draft = CharacterDraft::new("Ada Lovelace", Some(file.path().to_path_buf()));
        let mut roster = Roster::default();

        let figure = create_character(&draft, &mut roster, &responder).await.unwrap();

        assert_eq!(figure.id, 4);
        assert_eq!(figure.chat_id(), 1);
        assert_eq!(roster.len(), 4);
        assert_eq!(roster.get(1).map(|f| f.name.as_str()), Some("Albert Einstein"));
    }

    #[test]
    fn test_add_character_without_backend_id_chats_as_itself() {
        let file = pdf_file();
        let draft = CharacterDraft::new("Ada Lovelace", Some(file.path().to_path_buf()));
        let mut roster = Roster::default();

        let figure = add_character(&draft, &mut roster, None).unwrap();

        assert_eq!(figure.id, 4);
        assert_eq!(figure.chat_id(), 4);
    }

    #[tokio::test]
    async fn test_offline_character_answers_by_name() {
        let file = pdf_file();
        let draft = CharacterDraft::new("Ada Lovelace", Some(file.path().to_path_buf()));
        let mut roster = Roster::default();
        let responder = Arc::new(MockResponder::placeholder());

        let figure = create_character(&draft, &mut roster, responder.as_ref()).await.unwrap();

        let mut session = ChatSession::new(responder);
        session.select_figure(figure);
        session.set_pending_input("Who are you?");
        session.submit().await.unwrap();

        assert_eq!(
            session.messages().last(),
            Some(&Message::figure("Ada Lovelace", "(Ada Lovelace responds with a placeholder answer)"))
        );
    }
}
