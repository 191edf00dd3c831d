use base64::Engine;

use crate::editor::Editor;

/// A file carried by a paste or drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl FilePayload {
    pub fn new(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.split('/').next() == Some("image")
    }
}

/// The two channels of a paste/drop the editor reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataTransfer {
    pub html: Option<String>,
    pub files: Vec<FilePayload>,
}

impl DataTransfer {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            files: Vec::new(),
        }
    }

    pub fn file(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self {
            html: None,
            files: vec![FilePayload::new(bytes, mime)],
        }
    }
}

/// Turns image bytes into a URL an image element can display.
pub trait ImageEncoder {
    fn encode(&self, bytes: &[u8], mime: &str) -> String;
}

/// Embeds the bytes as a base64 `data:` URL.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataUrlEncoder;

impl ImageEncoder for DataUrlEncoder {
    fn encode(&self, bytes: &[u8], mime: &str) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{mime};base64,{encoded}")
    }
}

/// Insert a paste/drop payload. HTML wins when present; otherwise every image
/// file becomes an image element. Returns false when nothing was consumed.
pub fn insert_data(editor: &mut Editor, data: &DataTransfer, encoder: &dyn ImageEncoder) -> bool {
    if editor.selection().is_none() {
        return false;
    }
    if let Some(html) = &data.html {
        return editor.paste_html(html);
    }
    let mut handled = false;
    for file in &data.files {
        if !file.is_image() {
            tracing::debug!(mime = %file.mime, "ignoring non-image payload");
            continue;
        }
        let url = encoder.encode(&file.bytes, &file.mime);
        handled |= editor.insert_image(&url);
    }
    handled
}

#[cfg(test)]
#[path = "clipboard_tests.rs"]
mod clipboard_tests;
