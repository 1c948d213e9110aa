use std::path::PathBuf;
use std::sync::Arc;

use crate::asset;
use crate::compose::Compositor;
use crate::error::{ThiepError, ThiepResult};
use crate::export::{ExportResult, Exporter};
use crate::surface::Surface;
use crate::template::TemplateRegistry;

/// A validated submission from the input boundary.
///
/// Construction trims the guest name and rejects empty inputs, so nothing
/// past this point has to re-check them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionRequest {
    template_id: String,
    guest_name: String,
}

impl CompositionRequest {
    pub fn new(template_id: impl Into<String>, guest_name: &str) -> ThiepResult<Self> {
        let template_id = template_id.into();
        if template_id.trim().is_empty() {
            return Err(ThiepError::validation("template id must be non-empty"));
        }
        let guest_name = guest_name.trim();
        if guest_name.is_empty() {
            return Err(ThiepError::validation("guest name must be non-empty"));
        }
        Ok(Self {
            template_id,
            guest_name: guest_name.to_string(),
        })
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }
}

/// Observable controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewState {
    /// No valid request seen yet (or reset).
    Idle,
    /// A composition newer than the published surface is in flight.
    Composing,
    /// The newest composition is published and exportable.
    Ready,
}

/// Identifies one issued composition; only the newest may publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionTicket(u64);

struct Published {
    generation: u64,
    surface: Arc<Surface>,
    guest_name: String,
}

/// Coordinates re-composition as inputs change and holds the published
/// surface for both on-screen preview and export.
///
/// Every new input supersedes any in-flight composition: results are
/// generation-stamped and stale ones are discarded unpublished
/// (last-write-wins). Published surfaces are immutable snapshots behind
/// `Arc`, so an export that races a newer composition still operates safely
/// on the surface it was handed.
pub struct PreviewController {
    registry: TemplateRegistry,
    compositor: Compositor,
    assets_root: PathBuf,
    latest_issued: u64,
    published: Option<Published>,
}

impl PreviewController {
    pub fn new(
        registry: TemplateRegistry,
        compositor: Compositor,
        assets_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            compositor,
            assets_root: assets_root.into(),
            latest_issued: 0,
            published: None,
        }
    }

    pub fn state(&self) -> PreviewState {
        match (&self.published, self.latest_issued) {
            (None, 0) => PreviewState::Idle,
            (Some(p), g) if p.generation == g => PreviewState::Ready,
            _ => PreviewState::Composing,
        }
    }

    /// Issue a new composition generation, superseding anything in flight.
    pub fn begin_composition(&mut self) -> CompositionTicket {
        self.latest_issued += 1;
        CompositionTicket(self.latest_issued)
    }

    /// Publish a finished surface if its ticket is still the newest.
    ///
    /// Returns `false` for superseded results, which are discarded; no
    /// ordering guarantee is made about them.
    pub fn publish(
        &mut self,
        ticket: CompositionTicket,
        surface: Surface,
        guest_name: impl Into<String>,
    ) -> bool {
        self.publish_arc(ticket, Arc::new(surface), guest_name)
    }

    fn publish_arc(
        &mut self,
        ticket: CompositionTicket,
        surface: Arc<Surface>,
        guest_name: impl Into<String>,
    ) -> bool {
        if ticket.0 != self.latest_issued {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_issued,
                "discarding superseded composition"
            );
            return false;
        }
        self.published = Some(Published {
            generation: ticket.0,
            surface,
            guest_name: guest_name.into(),
        });
        true
    }

    /// Roll back a failed composition so the controller returns to its
    /// previous observable state (Ready if something is published, else
    /// Idle). No-op if the ticket was already superseded.
    pub fn mark_failed(&mut self, ticket: CompositionTicket) {
        if ticket.0 == self.latest_issued {
            self.latest_issued = self.published.as_ref().map(|p| p.generation).unwrap_or(0);
        }
    }

    /// Recompose for a changed input and publish the result.
    pub fn on_input_changed(&mut self, request: &CompositionRequest) -> ThiepResult<Arc<Surface>> {
        let ticket = self.begin_composition();
        match self.compose_once(request) {
            Ok(surface) => {
                let surface = Arc::new(surface);
                self.publish_arc(ticket, Arc::clone(&surface), request.guest_name());
                Ok(surface)
            }
            Err(err) => {
                self.mark_failed(ticket);
                Err(err)
            }
        }
    }

    fn compose_once(&self, request: &CompositionRequest) -> ThiepResult<Surface> {
        let descriptor = self.registry.resolve(request.template_id())?;
        let prepared = asset::load_image(&self.assets_root, &descriptor.asset_ref)?;
        self.compositor
            .compose(&prepared, descriptor, request.guest_name())
    }

    /// The most recently published surface, if any.
    pub fn published_surface(&self) -> Option<Arc<Surface>> {
        self.published.as_ref().map(|p| Arc::clone(&p.surface))
    }

    /// Hand the newest published surface to the exporter.
    ///
    /// Stays Ready afterwards, so repeat downloads of the same surface work.
    pub fn on_export_requested(&self, exporter: &mut Exporter) -> ThiepResult<ExportResult> {
        let Some(published) = &self.published else {
            return Err(ThiepError::validation("no composed surface to export"));
        };
        exporter.export_for_guest(&published.surface, &published.guest_name)
    }

    /// Back to Idle, dropping any published surface (the "new invitation"
    /// action).
    pub fn reset(&mut self) {
        self.latest_issued = 0;
        self.published = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::text::LoadedFont;

    fn controller() -> PreviewController {
        let font = LoadedFont::from_path(
            "DejaVu Serif",
            Path::new("assets/fonts/DejaVuSerif-Italic.ttf"),
        )
        .unwrap();
        PreviewController::new(
            TemplateRegistry::builtin(),
            Compositor::new(font),
            "assets/templates",
        )
    }

    fn surface(w: u32, h: u32) -> Surface {
        Surface::from_rgba8(w, h, vec![0u8; (w * h * 4) as usize]).unwrap()
    }

    #[test]
    fn request_validation_rejects_empty_inputs() {
        assert!(CompositionRequest::new("hanoi", "").is_err());
        assert!(CompositionRequest::new("hanoi", "   \t").is_err());
        assert!(CompositionRequest::new("", "Nguyễn Văn A").is_err());

        let req = CompositionRequest::new("hanoi", "  Nguyễn Văn A  ").unwrap();
        assert_eq!(req.guest_name(), "Nguyễn Văn A");
    }

    #[test]
    fn only_the_newest_ticket_publishes() {
        let mut c = controller();
        let first = c.begin_composition();
        let second = c.begin_composition();
        assert_eq!(c.state(), PreviewState::Composing);

        assert!(!c.publish(first, surface(2, 2), "stale"));
        assert!(c.published_surface().is_none());

        assert!(c.publish(second, surface(3, 3), "fresh"));
        assert_eq!(c.state(), PreviewState::Ready);
        assert_eq!(c.published_surface().unwrap().width(), 3);
    }

    #[test]
    fn failed_composition_rolls_back_to_previous_state() {
        let mut c = controller();
        assert_eq!(c.state(), PreviewState::Idle);

        let t = c.begin_composition();
        c.mark_failed(t);
        assert_eq!(c.state(), PreviewState::Idle);

        let t = c.begin_composition();
        assert!(c.publish(t, surface(2, 2), "ok"));
        let t = c.begin_composition();
        c.mark_failed(t);
        assert_eq!(c.state(), PreviewState::Ready);
    }

    #[test]
    fn unknown_template_fails_and_state_recovers() {
        let mut c = controller();
        let req = CompositionRequest::new("saigon", "Nguyễn Văn A").unwrap();
        let err = c.on_input_changed(&req).unwrap_err();
        assert!(matches!(err, ThiepError::TemplateNotFound(_)));
        assert_eq!(c.state(), PreviewState::Idle);
    }

    #[test]
    fn export_without_a_surface_is_a_validation_error() {
        let c = controller();
        let mut exporter = Exporter::new(vec![Box::new(crate::export::InMemoryShare::new())]);
        let err = c.on_export_requested(&mut exporter).unwrap_err();
        assert!(matches!(err, ThiepError::Validation(_)));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut c = controller();
        let t = c.begin_composition();
        assert!(c.publish(t, surface(2, 2), "x"));
        assert_eq!(c.state(), PreviewState::Ready);

        c.reset();
        assert_eq!(c.state(), PreviewState::Idle);
        assert!(c.published_surface().is_none());
    }
}
