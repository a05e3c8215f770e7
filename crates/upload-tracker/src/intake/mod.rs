//! Turns raw dropped or picked files into pending upload records.

pub mod file;

pub use file::{FileHandle, FileOrigin};

use serde::Serialize;
use thiserror::Error;

use crate::config::IntakePolicy;
use crate::format::format_file_size;
use crate::record::{UploadId, UploadRecord};

/// Why a file was refused before it became a record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("Unsupported file type{}", extension_suffix(.extension))]
    UnsupportedType { extension: Option<String> },

    #[error(
        "File is too large ({}, limit {})",
        human_size(.size_bytes),
        human_size(.max_size_bytes)
    )]
    TooLarge { size_bytes: u64, max_size_bytes: u64 },
}

fn human_size(bytes: &u64) -> String {
    format_file_size(*bytes)
}

fn extension_suffix(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!(" '.{}'", ext),
        None => String::new(),
    }
}

/// A file refused by the intake policy. No worker ever runs for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub name: String,
    pub size_bytes: u64,
    pub reason: RejectionReason,
}

/// A freshly created record and the file it tracks.
#[derive(Debug, Clone)]
pub struct IntakeItem {
    pub record: UploadRecord,
    pub file: FileHandle,
}

/// Output of one intake pass, in input order.
#[derive(Debug, Clone, Default)]
pub struct IntakeBatch {
    pub accepted: Vec<IntakeItem>,
    pub rejected: Vec<Rejection>,
}

impl IntakeBatch {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.rejected.is_empty()
    }
}

/// Applies the intake policy and mints records. Performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct FileIntake {
    policy: IntakePolicy,
}

impl FileIntake {
    pub fn new(policy: IntakePolicy) -> Self {
        Self {
            policy: policy.normalized(),
        }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Checks one file against the policy. Type is checked before size.
    pub fn check(&self, file: &FileHandle) -> Result<(), RejectionReason> {
        let extension = file.extension();
        if !self.policy.accepts_extension(extension.as_deref()) {
            return Err(RejectionReason::UnsupportedType { extension });
        }

        if file.size_bytes > self.policy.max_size_bytes {
            return Err(RejectionReason::TooLarge {
                size_bytes: file.size_bytes,
                max_size_bytes: self.policy.max_size_bytes,
            });
        }

        Ok(())
    }

    /// Splits a batch of raw files into pending records and rejections.
    pub fn accept<I>(&self, files: I) -> IntakeBatch
    where
        I: IntoIterator<Item = FileHandle>,
    {
        let mut batch = IntakeBatch::default();

        for file in files {
            match self.check(&file) {
                Ok(()) => {
                    let record = UploadRecord::pending(
                        &file.name,
                        file.size_bytes,
                        &file.resolved_mime_type(),
                    );
                    batch.accepted.push(IntakeItem { record, file });
                }
                Err(reason) => {
                    log::info!("Rejected '{}': {}", file.name, reason);
                    batch.rejected.push(Rejection {
                        name: file.name,
                        size_bytes: file.size_bytes,
                        reason,
                    });
                }
            }
        }

        batch
    }

    /// Creates a new pending record for a file that already failed once.
    pub fn readmit(&self, file: &FileHandle, retry_of: UploadId) -> IntakeItem {
        let mut record =
            UploadRecord::pending(&file.name, file.size_bytes, &file.resolved_mime_type());
        record.retry_of = Some(retry_of);
        IntakeItem {
            record,
            file: file.clone(),
        }
    }
}
