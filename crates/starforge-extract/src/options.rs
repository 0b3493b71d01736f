//! Extraction options and host-supplied hooks.

use starforge_forge::{DEFAULT_ARRAY_CAP, DEFAULT_MAX_DEPTH};

/// Extraction phase identifiers, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Central-directory scan
    Directory,
    /// Component pass
    Components,
    /// Ship pass
    Ships,
    /// Paint pass
    Paints,
    /// Shop pass
    Shops,
    /// FPS item pass
    Items,
    /// Commodity pass
    Commodities,
}

impl Phase {
    /// Stable lowercase label, also used as the sink table prefix.
    pub fn label(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Components => "components",
            Self::Ships => "ships",
            Self::Paints => "paints",
            Self::Shops => "shops",
            Self::Items => "items",
            Self::Commodities => "commodities",
        }
    }
}

/// One progress event: `(phase, done, total)`.
///
/// `total` is zero when the phase cannot know its size up front.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Reporting phase
    pub phase: Phase,
    /// Units completed so far
    pub done: u64,
    /// Expected units, or zero when unknown
    pub total: u64,
}

/// Progress callback.
pub type ProgressFn = Box<dyn Fn(Progress) + Send + Sync>;

/// Optional localisation hook.
///
/// Consulted only when a decoded display name is still a placeholder
/// token (leading `@` or `LOC_`); everything else passes through.
pub trait Localisation: Send + Sync {
    /// Resolve a class name to a display name, if known.
    fn resolve_class_name(&self, class_name: &str) -> Option<String>;
}

/// Knobs shared by every extraction pass.
pub struct ExtractOptions {
    /// Depth bound for class / strong-pointer recursion
    pub max_instance_depth: usize,
    /// Per-property array truncation
    pub array_element_cap: usize,
    /// Row-count drop fraction below which a caller should reject the run.
    /// The session only exposes counters; enforcement is the caller's.
    pub sanity_drop_threshold: f64,
    /// Progress callback
    pub progress: Option<ProgressFn>,
    /// Localisation hook
    pub localisation: Option<Box<dyn Localisation>>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_instance_depth: DEFAULT_MAX_DEPTH,
            array_element_cap: DEFAULT_ARRAY_CAP,
            sanity_drop_threshold: 0.5,
            progress: None,
            localisation: None,
        }
    }
}

impl ExtractOptions {
    /// Report progress, if a callback was supplied.
    pub(crate) fn report(&self, phase: Phase, done: u64, total: u64) {
        if let Some(report) = &self.progress {
            report(Progress { phase, done, total });
        }
    }

    /// Run a decoded name through the localisation hook when it is still a
    /// placeholder token.
    pub(crate) fn localise(&self, class_name: &str, decoded: &str) -> String {
        if decoded.starts_with('@') || decoded.starts_with("LOC_") {
            if let Some(hook) = &self.localisation {
                if let Some(resolved) = hook.resolve_class_name(class_name) {
                    return resolved;
                }
            }
        }
        decoded.to_string()
    }
}

impl std::fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("max_instance_depth", &self.max_instance_depth)
            .field("array_element_cap", &self.array_element_cap)
            .field("sanity_drop_threshold", &self.sanity_drop_threshold)
            .field("progress", &self.progress.is_some())
            .field("localisation", &self.localisation.is_some())
            .finish()
    }
}
