use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::encode;
use crate::error::{ThiepError, ThiepResult};
use crate::surface::Surface;

/// Title shown on the native share sheet.
pub const SHARE_TITLE: &str = "Thiệp Mời Đám Cưới";

/// Delivery method reported in an [`ExportResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportMethod {
    Share,
    Download,
    None,
}

/// Why an export did not deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportErrorKind {
    /// The user dismissed the share sheet. A neutral outcome, not a failure.
    Cancelled,
    /// PNG serialization failed; nothing reached any channel.
    Encode,
}

/// Outcome handed back to the embedding UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportResult {
    pub success: bool,
    pub method: ExportMethod,
    pub error_kind: Option<ExportErrorKind>,
}

impl ExportResult {
    pub fn delivered(method: ExportMethod) -> Self {
        Self {
            success: true,
            method,
            error_kind: None,
        }
    }

    pub fn cancelled(method: ExportMethod) -> Self {
        Self {
            success: false,
            method,
            error_kind: Some(ExportErrorKind::Cancelled),
        }
    }

    pub fn encode_failed() -> Self {
        Self {
            success: false,
            method: ExportMethod::None,
            error_kind: Some(ExportErrorKind::Encode),
        }
    }
}

/// Encoded artifact plus the metadata a channel needs to deliver it.
#[derive(Clone, Debug)]
pub struct ExportPayload {
    /// Finished PNG byte stream.
    pub bytes: Vec<u8>,
    pub file_name: String,
    /// Share-sheet title.
    pub title: String,
    /// Share-sheet message body.
    pub text: String,
}

/// What a channel did with a payload it accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    Cancelled,
}

/// One platform delivery mechanism for a finished invitation.
///
/// The exporter probes channels in preference order and delivers through the
/// first capable one, so platform branching lives behind this trait instead
/// of being scattered through the pipeline.
pub trait ExportChannel {
    fn method(&self) -> ExportMethod;

    /// Capability probe: can this channel deliver this exact payload?
    fn can_deliver(&self, payload: &ExportPayload) -> bool;

    /// Deliver the payload. User cancellation is an outcome, not an error;
    /// `Err` is reserved for channel I/O failures.
    fn deliver(&mut self, payload: &ExportPayload) -> ThiepResult<ChannelOutcome>;
}

/// Forced file download: binds the payload to a transient `.part` file, then
/// renames it into place so no partial file is ever offered.
#[derive(Debug)]
pub struct DownloadChannel {
    dir: PathBuf,
}

impl DownloadChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportChannel for DownloadChannel {
    fn method(&self) -> ExportMethod {
        ExportMethod::Download
    }

    fn can_deliver(&self, _payload: &ExportPayload) -> bool {
        // Always-available fallback.
        true
    }

    fn deliver(&mut self, payload: &ExportPayload) -> ThiepResult<ChannelOutcome> {
        let target = self.dir.join(&payload.file_name);
        let transient = self.dir.join(format!("{}.part", payload.file_name));

        fs::write(&transient, &payload.bytes).map_err(|e| {
            ThiepError::export(format!("write download '{}': {e}", transient.display()))
        })?;
        fs::rename(&transient, &target).map_err(|e| {
            let _ = fs::remove_file(&transient);
            ThiepError::export(format!("finalize download '{}': {e}", target.display()))
        })?;
        Ok(ChannelOutcome::Delivered)
    }
}

/// In-memory share channel for tests and for embedders without a native
/// sheet. Capability and cancellation are scripted at construction; the
/// delivery log stays readable through [`InMemoryShare::deliveries`] after
/// the channel is boxed into an [`Exporter`].
#[derive(Debug, Default)]
pub struct InMemoryShare {
    capable: bool,
    cancel: bool,
    delivered: Arc<Mutex<Vec<ExportPayload>>>,
}

impl InMemoryShare {
    /// A capable share channel that delivers every payload.
    pub fn new() -> Self {
        Self {
            capable: true,
            ..Self::default()
        }
    }

    /// A share channel whose capability probe always declines.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A capable share channel whose user dismisses every sheet.
    pub fn cancelling() -> Self {
        Self {
            capable: true,
            cancel: true,
            ..Self::default()
        }
    }

    /// Shared handle to the payloads delivered so far, in order.
    pub fn deliveries(&self) -> Arc<Mutex<Vec<ExportPayload>>> {
        Arc::clone(&self.delivered)
    }
}

impl ExportChannel for InMemoryShare {
    fn method(&self) -> ExportMethod {
        ExportMethod::Share
    }

    fn can_deliver(&self, _payload: &ExportPayload) -> bool {
        self.capable
    }

    fn deliver(&mut self, payload: &ExportPayload) -> ThiepResult<ChannelOutcome> {
        if self.cancel {
            return Ok(ChannelOutcome::Cancelled);
        }
        self.delivered
            .lock()
            .map_err(|_| ThiepError::export("share delivery log poisoned"))?
            .push(payload.clone());
        Ok(ChannelOutcome::Delivered)
    }
}

/// `thiep_<name>.png` with whitespace runs collapsed to single underscores.
pub fn suggested_file_name(guest_name: &str) -> String {
    let joined = guest_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("thiep_{joined}.png")
}

/// Per-guest share-sheet message body.
pub fn share_message(guest_name: &str) -> String {
    format!("Gửi {guest_name} thiệp mời đám cưới!")
}

/// Routes finished surfaces through the best available export channel.
pub struct Exporter {
    channels: Vec<Box<dyn ExportChannel>>,
}

impl Exporter {
    /// Channels in preference order; the first whose probe accepts the
    /// payload delivers it.
    pub fn new(channels: Vec<Box<dyn ExportChannel>>) -> Self {
        Self { channels }
    }

    /// Serialize `surface` and deliver it under `suggested_file_name`.
    ///
    /// Encode failure and user cancellation are reported in-band via
    /// [`ExportResult`]; `Err` means a channel I/O failure.
    pub fn export(
        &mut self,
        surface: &Surface,
        suggested_file_name: &str,
    ) -> ThiepResult<ExportResult> {
        self.export_inner(surface, suggested_file_name, SHARE_TITLE.to_string())
    }

    /// [`Self::export`] with the filename and share message derived from the
    /// guest name.
    pub fn export_for_guest(
        &mut self,
        surface: &Surface,
        guest_name: &str,
    ) -> ThiepResult<ExportResult> {
        self.export_inner(
            surface,
            &suggested_file_name(guest_name),
            share_message(guest_name),
        )
    }

    #[tracing::instrument(skip(self, surface, text))]
    fn export_inner(
        &mut self,
        surface: &Surface,
        suggested_file_name: &str,
        text: String,
    ) -> ThiepResult<ExportResult> {
        let bytes = match encode::encode_png(surface) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(%err, "png encode failed, nothing delivered");
                return Ok(ExportResult::encode_failed());
            }
        };

        let payload = ExportPayload {
            bytes,
            file_name: suggested_file_name.to_string(),
            title: SHARE_TITLE.to_string(),
            text,
        };

        // Resolve the channel once per export call.
        let Some(channel) = self.channels.iter_mut().find(|c| {
            let capable = c.can_deliver(&payload);
            if !capable {
                tracing::debug!(declined = ?c.method(), "export channel declined, falling back");
            }
            capable
        }) else {
            return Err(ThiepError::export("no export channel accepted the payload"));
        };

        match channel.deliver(&payload)? {
            ChannelOutcome::Delivered => Ok(ExportResult::delivered(channel.method())),
            ChannelOutcome::Cancelled => {
                // Dismissed sheet: neutral terminal state, not a failure.
                tracing::debug!("share sheet dismissed by user");
                Ok(ExportResult::cancelled(channel.method()))
            }
        }
    }
}
