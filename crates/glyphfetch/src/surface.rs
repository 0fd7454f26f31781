//! The render surface collaborator.
//!
//! The engine never touches a DOM or a scene graph. It hands sanitized
//! markup and loading/error flags to a [`RenderSurface`] owned by the
//! embedding UI layer, which is responsible for injecting the markup safely
//! and for showing a fallback indicator on terminal failure.

/// The place a loaded icon goes.
///
/// Implementations are called from async context and should be cheap;
/// anything expensive belongs on the UI layer's own scheduler.
pub trait RenderSurface: Send + Sync {
    /// Toggle the loading indicator.
    fn set_loading(&self, loading: bool);

    /// Toggle the error/fallback indicator.
    fn set_error(&self, error: bool);

    /// Inject sanitized SVG markup.
    fn set_content(&self, sanitized_svg: &str);
}

/// A surface that discards every update.
///
/// Used when no widget is attached, e.g. for cache warming.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn set_loading(&self, _loading: bool) {}

    fn set_error(&self, _error: bool) {}

    fn set_content(&self, _sanitized_svg: &str) {}
}
