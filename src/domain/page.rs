// Graph page domain model
use super::cache_key::ImageRef;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Image(ImageRef),
    Separator,
}

/// Counters for one orchestration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub hits: usize,
    pub rendered: usize,
    pub failed: usize,
    pub backed_off: usize,
    pub skipped_categories: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GraphPage {
    pub fragments: Vec<Fragment>,
    pub stats: RenderStats,
}

impl GraphPage {
    /// Appends an image, preceded by a separator unless it is the first one.
    pub fn push_image(&mut self, image: ImageRef) {
        if !self.fragments.is_empty() {
            self.fragments.push(Fragment::Separator);
        }
        self.fragments.push(Fragment::Image(image));
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Image(image) => Some(image),
            Fragment::Separator => None,
        })
    }
}
