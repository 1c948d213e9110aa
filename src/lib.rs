//! Personalized wedding-invitation rendering.
//!
//! The pipeline is: resolve a [`TemplateDescriptor`] from the
//! [`TemplateRegistry`], decode its template art, rasterize the guest name
//! onto it with the [`Compositor`], and hand the finished [`Surface`] to the
//! [`Exporter`], which PNG-encodes it and routes the bytes through the best
//! available [`ExportChannel`]. The [`PreviewController`] coordinates
//! re-composition as inputs change and guarantees only the newest result is
//! published.

#![forbid(unsafe_code)]

pub mod asset;
pub mod color;
pub mod compose;
pub mod encode;
pub mod error;
pub mod export;
pub mod preview;
pub mod surface;
pub mod template;
pub mod text;

pub use asset::PreparedImage;
pub use color::Rgba8;
pub use compose::Compositor;
pub use encode::{decode_png, encode_png};
pub use error::{ThiepError, ThiepResult};
pub use export::{
    ChannelOutcome, DownloadChannel, ExportChannel, ExportErrorKind, ExportMethod, ExportPayload,
    ExportResult, Exporter, InMemoryShare, share_message, suggested_file_name,
};
pub use preview::{CompositionRequest, CompositionTicket, PreviewController, PreviewState};
pub use surface::Surface;
pub use template::{
    FontSpec, FontStyle, TemplateDescriptor, TemplateRegistry, TextAlign, TextAnchor, TextBaseline,
    XAnchor,
};
pub use text::LoadedFont;
