use std::borrow::Borrow;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::common::{CommentPayload, Recipient, UploadFile};

use super::previews::{PreviewRegistry, PreviewUrl};

/// Caps applied to the pending attachment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_count: usize,
    pub max_total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error("Write a subject, a message or attach a file before sending")]
    EmptyMessage,
    #[error("Select at least one recipient for the new thread")]
    NoRecipients,
    #[error("You can attach at most {max} files")]
    TooManyFiles { max: usize },
    #[error("Attachments exceed the {} limit", format_size(.max_bytes))]
    TooLarge { max_bytes: u64 },
    #[error("A message is already being sent")]
    Busy,
}

/// File chosen by the user, before it joins the pending list.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl FileCandidate {
    /// Stat a local file; `None` if it cannot be read as a regular file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Cannot attach {}: {err}", path.display());
                return None;
            }
        };
        if !metadata.is_file() {
            log::warn!("Cannot attach {}: not a regular file", path.display());
            return None;
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Some(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }
}

/// A file waiting to be sent, with its live preview URL.
#[derive(Debug)]
pub struct PendingAttachment {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub preview: PreviewUrl,
}

impl PendingAttachment {
    fn to_upload(&self) -> UploadFile {
        UploadFile {
            path: self.path.clone(),
            file_name: self.name.clone(),
            mime: self.mime.clone(),
        }
    }
}

/// Validated contents of the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub payload: CommentPayload,
    pub attachments: Vec<UploadFile>,
    pub recipient_ids: Vec<i64>,
}

/// Composer draft: subject, message, pending files and recipient selection.
pub struct Composer {
    pub subject: String,
    pub message: String,
    files: Vec<PendingAttachment>,
    recipients: Vec<Recipient>,
    limits: AttachmentLimits,
    previews: PreviewRegistry,
}

impl Composer {
    pub fn new(limits: AttachmentLimits, previews: PreviewRegistry) -> Self {
        Self {
            subject: String::new(),
            message: String::new(),
            files: Vec::new(),
            recipients: Vec::new(),
            limits,
            previews,
        }
    }

    pub fn files(&self) -> &[PendingAttachment] {
        &self.files
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }

    /// Replace the candidate list, keeping the selection of recipients that remain.
    pub fn set_recipients(&mut self, candidates: Vec<Recipient>) {
        let selected: Vec<i64> = self.selected_recipient_ids();
        self.recipients = candidates
            .into_iter()
            .map(|mut recipient| {
                recipient.selected = selected.contains(&recipient.id);
                recipient
            })
            .collect();
    }

    pub fn toggle_recipient(&mut self, id: i64) {
        if let Some(recipient) = self.recipients.iter_mut().find(|r| r.id == id) {
            recipient.selected = !recipient.selected;
        }
    }

    pub fn selected_recipient_ids(&self) -> Vec<i64> {
        self.recipients
            .iter()
            .filter(|recipient| recipient.selected)
            .map(|recipient| recipient.id)
            .collect()
    }

    /// Add files, all or nothing: over either cap the selection is unchanged.
    pub fn add_files(&mut self, candidates: Vec<FileCandidate>) -> Result<(), ComposerError> {
        if candidates.is_empty() {
            return Ok(());
        }
        if self.files.len() + candidates.len() > self.limits.max_count {
            return Err(ComposerError::TooManyFiles {
                max: self.limits.max_count,
            });
        }
        let added: u64 = candidates.iter().map(|candidate| candidate.size).sum();
        if self.total_bytes().saturating_add(added) > self.limits.max_total_bytes {
            return Err(ComposerError::TooLarge {
                max_bytes: self.limits.max_total_bytes,
            });
        }

        for candidate in candidates {
            let mime = mime_guess::from_path(&candidate.path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            let preview = self.previews.create(&candidate.name);
            self.files.push(PendingAttachment {
                path: candidate.path,
                name: candidate.name,
                size: candidate.size,
                mime,
                preview,
            });
        }
        Ok(())
    }

    /// Remove one pending file; its preview is revoked.
    pub fn remove_file(&mut self, index: usize) {
        if index < self.files.len() {
            self.files.remove(index);
        }
    }

    /// Check the draft can be sent. `new_thread` also requires recipients.
    pub fn validate(&self, new_thread: bool) -> Result<Draft, ComposerError> {
        let subject = non_empty(&self.subject);
        let message = non_empty(&self.message);
        if subject.is_none() && message.is_none() && self.files.is_empty() {
            return Err(ComposerError::EmptyMessage);
        }

        let recipient_ids = self.selected_recipient_ids();
        if new_thread && recipient_ids.is_empty() {
            return Err(ComposerError::NoRecipients);
        }

        Ok(Draft {
            payload: CommentPayload { subject, message },
            attachments: self.files.iter().map(PendingAttachment::to_upload).collect(),
            recipient_ids,
        })
    }

    /// Empty subject, message and files. Recipients stay selected.
    pub fn clear(&mut self) {
        self.subject.clear();
        self.message.clear();
        self.files.clear();
    }
}

/// Human-readable byte size, e.g. `2.5 MB`.
pub fn format_size<B: Borrow<u64>>(bytes: B) -> String {
    let bytes = *bytes.borrow();
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
