// Session preference store - Client-held tokens with server-side validation
use crate::domain::chart::{ChartMode, ChartSpan};
use crate::domain::session::{RenderGroupId, SessionPreferences};

pub const GROUP_ID_TOKEN: &str = "graph_id";
pub const MODE_TOKEN: &str = "graph_type";
pub const SPAN_TOKEN: &str = "graph_span";

/// Transport for the per-visitor tokens. The client holds the state; the
/// implementation only reads what was sent and records what must be sent back.
pub trait TokenStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Id,
    Type,
    Span,
}

pub struct PreferenceStore<T> {
    tokens: T,
}

impl<T: TokenStore> PreferenceStore<T> {
    pub fn new(tokens: T) -> Self {
        Self { tokens }
    }

    pub fn into_inner(self) -> T {
        self.tokens
    }

    /// Raw string form of one preference. `refresh` only affects `Preference::Id`.
    pub fn get(&mut self, preference: Preference, refresh: bool) -> String {
        match preference {
            Preference::Id => self.group_id(refresh).to_string(),
            Preference::Type => self.mode().to_string(),
            Preference::Span => self.span().to_string(),
        }
    }

    /// Reuses a valid held id unless a refresh was requested; otherwise mints and stores a new one.
    pub fn group_id(&mut self, refresh: bool) -> RenderGroupId {
        if !refresh {
            if let Some(id) = self
                .tokens
                .get(GROUP_ID_TOKEN)
                .and_then(|held| RenderGroupId::parse(&held))
            {
                return id;
            }
        }
        self.mint_group_id()
    }

    pub fn mode(&mut self) -> ChartMode {
        match self.tokens.get(MODE_TOKEN).and_then(|held| ChartMode::from_token(&held)) {
            Some(mode) => mode,
            None => {
                self.tokens.set(MODE_TOKEN, ChartMode::Default.as_str());
                ChartMode::Default
            }
        }
    }

    pub fn span(&mut self) -> ChartSpan {
        match self.tokens.get(SPAN_TOKEN).and_then(|held| ChartSpan::from_token(&held)) {
            Some(span) => span,
            None => {
                self.tokens.set(SPAN_TOKEN, ChartSpan::Default.as_str());
                ChartSpan::Default
            }
        }
    }

    pub fn resolve(&mut self, refresh: bool) -> SessionPreferences {
        let group_id = self.group_id(refresh);
        let mode = self.mode();
        let span = self.span();
        SessionPreferences::new(group_id, mode, span)
    }

    /// Stores an explicit mode/span choice and starts a fresh render group so
    /// the next pass does not reuse images from the previous choice.
    pub fn change(&mut self, mode: &str, span: &str) -> SessionPreferences {
        let mode = ChartMode::from_token(mode).unwrap_or_default();
        let span = ChartSpan::from_token(span).unwrap_or_default();
        self.tokens.set(MODE_TOKEN, mode.as_str());
        self.tokens.set(SPAN_TOKEN, span.as_str());
        let group_id = self.mint_group_id();
        tracing::debug!(%group_id, %mode, %span, "Graph preferences changed");
        SessionPreferences::new(group_id, mode, span)
    }

    fn mint_group_id(&mut self) -> RenderGroupId {
        let id = RenderGroupId::generate();
        self.tokens.set(GROUP_ID_TOKEN, id.as_str());
        id
    }
}
