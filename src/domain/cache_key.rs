// Cache key scheme for rendered chart images
use super::chart::{Category, ChartMode, ChartSpan, split_mode_span};
use super::session::RenderGroupId;
use serde::Serialize;

const FILE_PREFIX: &str = "graph-";
const FILE_SUFFIX: &str = ".png";
const COMBINED_TAG: &str = "x";

/// What a key renders: one series of a category, or the single combined image of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    Series(Category),
    Combined,
}

impl KeyScope {
    pub fn tag(self) -> &'static str {
        match self {
            KeyScope::Series(category) => category.tag(),
            KeyScope::Combined => COMBINED_TAG,
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            KeyScope::Series(category) => Some(category),
            KeyScope::Combined => None,
        }
    }
}

/// Identifies one cache entry. Keys are only built through the constructors below,
/// so every key maps to exactly one file name and back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: KeyScope,
    mode: ChartMode,
    span: ChartSpan,
    group_id: RenderGroupId,
    index: u32,
}

impl CacheKey {
    /// Default-mode series image: mode and span are pinned to `default`.
    pub fn default_series(category: Category, group_id: RenderGroupId, index: u32) -> Self {
        Self {
            scope: KeyScope::Series(category),
            mode: ChartMode::Default,
            span: ChartSpan::Default,
            group_id,
            index,
        }
    }

    pub fn separate_series(
        category: Category,
        span: ChartSpan,
        group_id: RenderGroupId,
        index: u32,
    ) -> Self {
        Self {
            scope: KeyScope::Series(category),
            mode: ChartMode::Separate,
            span,
            group_id,
            index,
        }
    }

    /// The single merged image of a batch; always occupies index slot 0.
    pub fn combined(span: ChartSpan, group_id: RenderGroupId) -> Self {
        Self {
            scope: KeyScope::Combined,
            mode: ChartMode::Combined,
            span,
            group_id,
            index: 0,
        }
    }

    pub fn scope(&self) -> KeyScope {
        self.scope
    }

    pub fn mode(&self) -> ChartMode {
        self.mode
    }

    pub fn span(&self) -> ChartSpan {
        self.span
    }

    pub fn group_id(&self) -> &RenderGroupId {
        &self.group_id
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// `graph-{tag}{mode}{span}-{groupId}-{index}.png`
    pub fn file_name(&self) -> String {
        format!(
            "{}{}{}{}-{}-{}{}",
            FILE_PREFIX,
            self.scope.tag(),
            self.mode.as_str(),
            self.span.as_str(),
            self.group_id,
            self.index,
            FILE_SUFFIX
        )
    }

    /// Parses an image file name back into its key. Names that would not be
    /// produced by `file_name` are rejected.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        let mut parts = stem.rsplitn(3, '-');
        let index: u32 = parts.next()?.parse().ok()?;
        let group_id = RenderGroupId::parse(parts.next()?)?;
        let head = parts.next()?;

        let key = if let Some(rest) = head.strip_prefix(COMBINED_TAG) {
            let (mode, span) = split_mode_span(rest)?;
            if mode != ChartMode::Combined {
                return None;
            }
            Self::combined(span, group_id)
        } else {
            let (category, mode, span) = Category::ALL.into_iter().find_map(|category| {
                let rest = head.strip_prefix(category.tag())?;
                let (mode, span) = split_mode_span(rest)?;
                Some((category, mode, span))
            })?;
            match mode {
                ChartMode::Default => Self::default_series(category, group_id, index),
                ChartMode::Separate => Self::separate_series(category, span, group_id, index),
                ChartMode::Combined => return None,
            }
        };

        (key.file_name() == name).then_some(key)
    }

    /// True when this key belongs to the given render group namespace.
    pub fn in_namespace(&self, group_id: &RenderGroupId) -> bool {
        &self.group_id == group_id
    }
}

/// Caller-visible description of one rendered image, enough to build a retrieval URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub category: Option<Category>,
    pub index: u32,
    pub mode: ChartMode,
    pub span: ChartSpan,
    pub group_id: RenderGroupId,
    pub file_name: String,
}

impl ImageRef {
    pub fn from_key(key: &CacheKey) -> Self {
        Self {
            category: key.scope.category(),
            index: key.index,
            mode: key.mode,
            span: key.span,
            group_id: key.group_id.clone(),
            file_name: key.file_name(),
        }
    }
}
