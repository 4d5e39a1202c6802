//! Re-rendering after Livewire DOM updates
//!
//! Livewire patches the page in place, so math that arrives with an update
//! is never seen by the initial `renderMathInElement` call. The script built
//! here hooks Livewire's morph and component-initialization events and runs
//! auto-render again on the touched element.

use crate::{Error, Result};

/// Produces the client-side script that re-renders math after live updates
pub trait LiveUpdateIntegration: Send + Sync {
    /// Build the `<script>` block. `json_options` must already be HTML-safe
    /// JSON (see `markup::encode_options`).
    fn generate_script(&self, json_options: &str) -> Result<String>;
}

/// Livewire integration.
///
/// Whether Livewire is part of the host application cannot be discovered
/// from here, so the host states it when constructing the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivewireIntegrator {
    installed: bool,
}

impl LivewireIntegrator {
    /// Integrator for a host that ships Livewire
    pub fn installed() -> Self {
        Self { installed: true }
    }

    /// Integrator for a host without Livewire; every call fails
    pub fn missing() -> Self {
        Self { installed: false }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl LiveUpdateIntegration for LivewireIntegrator {
    fn generate_script(&self, json_options: &str) -> Result<String> {
        if !self.installed {
            return Err(Error::DependencyMissing("Livewire is not installed.".into()));
        }

        Ok(format!(
            r#"<script>
document.addEventListener("DOMContentLoaded", function () {{
    if (typeof Livewire === 'undefined') {{
        console.warn('KaTeX Livewire integration is enabled but Livewire is not detected.');
        return;
    }}

    const reRenderMath = (el) => {{
        if (!el) return;
        renderMathInElement(el, {json_options});
    }};

    if (Livewire.hook) {{
        Livewire.hook('morph.updated', ({{ el }}) => reRenderMath(el));
        Livewire.hook('element.initialized', ({{ el }}) => reRenderMath(el));
    }} else if (window.livewire && window.livewire.hook) {{
        window.livewire.hook('message.processed', (message, component) => reRenderMath(component.el));
    }}
}});
</script>"#
        ))
    }
}
