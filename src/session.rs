//! A popup session bound to one anchor field, and the single slot holding the open one.

use crate::config::{ResolvedField, SessionConfig};
use crate::getter::DataTarget;
use crate::navigator::{Cycle, PathNavigator, PopupView};
use crate::{AipError, DataValue};
use std::ops::Range;
use tracing::debug;

/// The text input a reference gets inserted into.
/// Offsets are byte offsets into [`AnchorField::text`].
pub trait AnchorField {
    fn text(&self) -> &str;

    fn selection(&self) -> Range<usize>;

    fn splice(&mut self, range: Range<usize>, insert: &str);
}

/// An owned text buffer with a selection, for hosts that keep field text themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextAnchor {
    pub text: String,
    pub selection: Range<usize>,
}

impl TextAnchor {
    /// A buffer with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        Self {
            text,
            selection: end..end,
        }
    }
}

impl AnchorField for TextAnchor {
    fn text(&self) -> &str {
        &self.text
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn splice(&mut self, range: Range<usize>, insert: &str) {
        self.text.replace_range(range.clone(), insert);
        let cursor = range.start + insert.len();
        self.selection = cursor..cursor;
    }
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Replaces the anchor's selection with `reference`, padding it with a space on either side
/// unless it already borders whitespace or the end of the text. Returns the inserted text.
pub fn splice_reference<A: AnchorField + ?Sized>(anchor: &mut A, reference: &str) -> String {
    let text = anchor.text();
    let selection = anchor.selection();
    let start = floor_boundary(text, selection.start);
    let end = floor_boundary(text, selection.end).max(start);

    let (before, after) = (&text[..start], &text[end..]);
    let pre = if before.is_empty() || before.ends_with(char::is_whitespace) {
        ""
    } else {
        " "
    };
    let post = if after.is_empty() || after.starts_with(char::is_whitespace) {
        ""
    } else {
        " "
    };

    let insert = format!("{pre}{reference}{post}");
    anchor.splice(start..end, &insert);
    insert
}

/// One open popup: a navigator plus the identity of the field it was opened for.
#[derive(Debug, Clone)]
pub struct Session {
    target_key: String,
    navigator: PathNavigator,
}

impl Session {
    pub fn activate(
        data: DataValue,
        initial_path: &str,
        target_key: impl Into<String>,
        config: &SessionConfig,
    ) -> Self {
        let target_key = target_key.into();
        let navigator = PathNavigator::new(
            data,
            config.key_prefix(),
            config.exclusion_filters.clone(),
        )
        .with_initial_path(initial_path);

        debug!(%target_key, mode = %config.data_mode, path = %navigator.raw_path(), "session opened");
        Self {
            target_key,
            navigator,
        }
    }

    /// Runs the field's getter against `target` and opens a session on the result.
    /// Returns `None` when the getter has nothing for this target.
    pub fn open(
        target: &dyn DataTarget,
        target_key: impl Into<String>,
        field: &ResolvedField,
    ) -> Option<Self> {
        let target_key = target_key.into();
        let Some(data) = field.getter.get(target) else {
            debug!(%target_key, mode = %field.getter.mode(), "no data for field");
            return None;
        };
        Some(Self::activate(
            data,
            &field.default_path,
            target_key,
            &field.session,
        ))
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    pub fn navigator(&self) -> &PathNavigator {
        &self.navigator
    }

    pub fn view(&self) -> PopupView {
        self.navigator.view()
    }

    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.navigator.set_raw_path(text);
    }

    pub fn on_cycle(&mut self, direction: Cycle) -> Option<usize> {
        self.navigator.cycle(direction)
    }

    pub fn on_descend(&mut self) -> Result<(), AipError> {
        self.navigator.descend()
    }

    pub fn on_ascend(&mut self) {
        self.navigator.ascend();
    }

    pub fn on_choose(&mut self, key: &str) {
        self.navigator.choose_key(key);
    }

    pub fn on_confirm(&self) -> String {
        self.navigator.confirm()
    }

    /// Confirms and writes the reference into `anchor`, ending the session.
    pub fn confirm_into<A: AnchorField + ?Sized>(self, anchor: &mut A) -> String {
        let reference = self.on_confirm();
        debug!(target_key = %self.target_key, %reference, "session confirmed");
        splice_reference(anchor, &reference)
    }

    pub fn on_cancel(self) {
        debug!(target_key = %self.target_key, "session closed");
    }
}

/// Holds the one open session. Opening another closes the current one first.
#[derive(Debug, Default)]
pub struct ActiveSlot {
    current: Option<Session>,
}

impl ActiveSlot {
    pub fn activate(&mut self, session: Session) -> &mut Session {
        if let Some(previous) = self.current.take() {
            previous.on_cancel();
        }
        self.current.insert(session)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Session> {
        self.current.as_mut()
    }

    pub fn close(&mut self) {
        if let Some(session) = self.current.take() {
            session.on_cancel();
        }
    }

    /// Keeps the open session when its field was re-created under the same key (e.g. the
    /// sheet re-rendered). Only the selection is dropped.
    pub fn retarget(&mut self, target_key: &str) -> bool {
        match self.current.as_mut() {
            Some(session) if session.target_key == target_key => {
                session.navigator.clear_selection();
                true
            }
            _ => false,
        }
    }

    pub fn confirm_into<A: AnchorField + ?Sized>(&mut self, anchor: &mut A) -> Option<String> {
        let session = self.current.take()?;
        Some(session.confirm_into(anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveSlot, AnchorField, Session, TextAnchor, splice_reference};
    use crate::DataValue;
    use crate::config::SessionConfig;
    use crate::getter::DataMode;

    fn roll_config() -> SessionConfig {
        SessionConfig {
            data_mode: DataMode::Roll,
            ..Default::default()
        }
    }

    fn session(key: &str) -> Session {
        let data = DataValue::parse_json5("{ hp: { value: 7, max: 10 } }").unwrap();
        Session::activate(data, "hp", key, &roll_config())
    }

    #[test]
    fn splice_pads_only_where_needed() {
        let mut a = TextAnchor::new("1d20+");
        assert_eq!(splice_reference(&mut a, "@str"), " @str");
        assert_eq!(a.text(), "1d20+ @str");

        let mut a = TextAnchor::new("");
        splice_reference(&mut a, "@str");
        assert_eq!(a.text, "@str");

        let mut a = TextAnchor {
            text: "a b".to_string(),
            selection: 2..2,
        };
        splice_reference(&mut a, "@x");
        assert_eq!(a.text, "a @x b");
        assert_eq!(a.selection, 5..5);

        let mut a = TextAnchor {
            text: "ab".to_string(),
            selection: 1..1,
        };
        splice_reference(&mut a, "@x");
        assert_eq!(a.text, "a @x b");
    }

    #[test]
    fn splice_clamps_to_char_boundaries() {
        let mut a = TextAnchor {
            text: "é".to_string(),
            selection: 1..1,
        };
        splice_reference(&mut a, "@x");
        assert_eq!(a.text, "@x é");

        let mut a = TextAnchor {
            text: "é".to_string(),
            selection: 1..9,
        };
        splice_reference(&mut a, "@x");
        assert_eq!(a.text, "@x");
    }

    #[test]
    fn activation_seeds_default_path() {
        let s = session("sheet-1.formula");
        assert_eq!(s.navigator().raw_path(), "hp.");
        assert_eq!(s.view().key_prefix, "@");
        assert_eq!(s.on_confirm(), "@hp.max");
    }

    #[test]
    fn confirm_into_writes_reference() {
        let mut s = session("k");
        s.on_text_changed("hp.v");
        let mut anchor = TextAnchor::new("2 *");
        assert_eq!(s.confirm_into(&mut anchor), " @hp.value");
        assert_eq!(anchor.text, "2 * @hp.value");
    }

    #[test]
    fn slot_replaces_and_retargets() {
        let mut slot = ActiveSlot::default();
        assert!(!slot.is_open());

        slot.activate(session("a"));
        slot.activate(session("b"));
        assert_eq!(slot.current().map(Session::target_key), Some("b"));

        slot.current_mut().unwrap().on_cycle(crate::Cycle::Forward);
        assert!(slot.retarget("b"));
        assert_eq!(slot.current().unwrap().navigator().selected_index(), None);
        assert!(!slot.retarget("a"));

        let mut anchor = TextAnchor::new("");
        assert_eq!(slot.confirm_into(&mut anchor).as_deref(), Some("@hp.max"));
        assert!(!slot.is_open());
        assert_eq!(slot.confirm_into(&mut anchor), None);

        slot.activate(session("c"));
        slot.close();
        assert!(!slot.is_open());
    }
}
