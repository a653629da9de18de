//! Output surface and color-space negotiation.
//!
//! Wraps the platform surface handle and the lazily built window surface.
//! The window surface is rebuilt exactly when the handle identity changes or
//! the requested color space differs from the one it was built with. An HDR
//! color space is applied only when both the surface and the display/driver
//! support it; otherwise presentation silently falls back to the default
//! (untagged) color space.

use std::sync::Arc;

use tracing::debug;

use hdrplay_common::{
    ColorSpace, DisplayCapabilities, GpuBackend, RenderError, SurfaceColorSpace, SurfaceHandle,
    WindowSurfaceId,
};

#[derive(Default)]
pub struct OutputSurface {
    handle: Option<Arc<dyn SurfaceHandle>>,
    window: Option<WindowSurfaceId>,
    /// Identity of the handle the window surface was built from.
    window_handle_id: u64,
    /// Color space the window surface was last built for.
    last_color_space: Option<ColorSpace>,
}

impl OutputSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new platform surface (or detach with `None`). The window
    /// surface of a removed/invalid handle is released immediately.
    pub fn set_surface(&mut self, backend: &dyn GpuBackend, handle: Option<Arc<dyn SurfaceHandle>>) {
        let invalid = handle.as_ref().map(|h| !h.is_valid()).unwrap_or(true);
        self.handle = handle;
        if invalid {
            self.release(backend);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_valid()).unwrap_or(false)
    }

    pub fn release(&mut self, backend: &dyn GpuBackend) {
        if let Some(window) = self.window.take() {
            backend.destroy_window_surface(window);
            self.last_color_space = None;
        }
    }

    /// Resolve the window surface for the requested color space, rebuilding
    /// if and only if the handle identity or the requested color space
    /// changed since the last build. `None` (soft, not an error) when no
    /// valid surface is attached.
    pub fn window_surface(
        &mut self,
        backend: &dyn GpuBackend,
        display: &DisplayCapabilities,
        requested: ColorSpace,
    ) -> Result<Option<WindowSurfaceId>, RenderError> {
        let Some(handle) = self.handle.clone() else {
            self.release(backend);
            return Ok(None);
        };

        let rebuild = match self.window {
            None => true,
            Some(_) => {
                handle.id() != self.window_handle_id || self.last_color_space != Some(requested)
            }
        };
        if rebuild {
            self.release(backend);
            let tag = negotiated_color_space(handle.as_ref(), display, requested);
            debug!(surface = handle.id(), ?requested, ?tag, "building window surface");
            let window = backend.create_window_surface(handle.as_ref(), tag)?;
            self.window = Some(window);
            self.window_handle_id = handle.id();
            self.last_color_space = Some(requested);
        }

        let window = self.window.expect("window surface just resolved");
        if !backend.is_window_surface_valid(window) {
            self.release(backend);
            return Ok(None);
        }
        Ok(Some(window))
    }
}

/// The color-space tag the window surface should carry, if any.
fn negotiated_color_space(
    handle: &dyn SurfaceHandle,
    display: &DisplayCapabilities,
    requested: ColorSpace,
) -> Option<SurfaceColorSpace> {
    let tag = SurfaceColorSpace::from_color_space(requested)?;
    if !surface_supports_hdr(handle, display) {
        return None;
    }
    if !display.supports_surface_color_space(requested) {
        return None;
    }
    Some(tag)
}

/// Whether the surface itself can carry an HDR color space.
///
/// Unconditionally true on recent platforms. On older ones the platform gave
/// no direct signal, so it is inferred from the debug description: only
/// non-texture-backed surfaces — which stringify as `Surface(name=null)` —
/// honor an HDR tag.
fn surface_supports_hdr(handle: &dyn SurfaceHandle, display: &DisplayCapabilities) -> bool {
    if !handle.is_valid() {
        return false;
    }
    if display.api_level >= DisplayCapabilities::HDR_SURFACE_API_LEVEL {
        return true;
    }
    matches!(surface_name(&handle.description()), Some("null"))
}

/// Extract `<name>` from a `Surface(name=<name>)` description.
fn surface_name(description: &str) -> Option<&str> {
    const PREFIX: &str = "Surface(name=";
    let start = description.find(PREFIX)? + PREFIX.len();
    let rest = &description[start..];
    let end = rest.find(')')?;
    Some(&rest[..end])
}
