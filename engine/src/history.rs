use crate::commands::Command;
use crate::objects::{EditorState, ObjectId};

/// Undo/redo stacks over an initial state. Undo replays the remaining commands from
/// `initial` rather than calling `revert`, so the current state is always the fold
/// of the undo stack.
#[derive(Clone, Debug)]
pub struct History {
    initial: EditorState,
    current: EditorState,
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
}

impl History {
    pub fn new(initial: EditorState) -> Self {
        History {
            current: initial.clone(),
            initial,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &EditorState {
        &self.current
    }

    pub fn initial(&self) -> &EditorState {
        &self.initial
    }

    pub fn dispatch(&mut self, cmd: Command) {
        let next = cmd.apply(&self.current);
        if next.objects == self.current.objects && next.background == self.current.background {
            log::warn!("{} (id {}) did not change the document", cmd.label(), cmd.id());
        }
        log::debug!("dispatch {} (id {})", cmd.label(), cmd.id());
        self.current = next;
        self.undo_stack.push(cmd);
        self.redo_stack.clear();
    }

    /// Returns the command that was undone, if any.
    pub fn undo(&mut self) -> Option<&Command> {
        let cmd = self.undo_stack.pop()?;
        let selected = std::mem::take(&mut self.current.selected);
        self.current = self.replay();
        self.keep_selection(selected);
        self.redo_stack.push(cmd);
        self.redo_stack.last()
    }

    pub fn redo(&mut self) -> Option<&Command> {
        let cmd = self.redo_stack.pop()?;
        let selected = std::mem::take(&mut self.current.selected);
        self.current = cmd.apply(&self.current);
        self.keep_selection(selected);
        self.undo_stack.push(cmd);
        self.undo_stack.last()
    }

    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = self.initial.clone();
    }

    /// Selection is view state: it never produces a history entry.
    pub fn select(&mut self, ids: Vec<ObjectId>) {
        self.current.selected = ids;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn can_reset(&self) -> bool {
        !self.current.objects.is_empty() || self.current.background.is_some()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.undo_stack.iter().map(|c| c.label()).collect()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    // Undo and redo move the document, not the selection: keep what the user had
    // selected, minus texts that no longer exist.
    fn keep_selection(&mut self, selected: Vec<ObjectId>) {
        let current = &self.current;
        let kept: Vec<ObjectId> = selected.into_iter().filter(|id| current.find_text(*id).is_some()).collect();
        self.current.selected = kept;
    }

    fn replay(&self) -> EditorState {
        self.undo_stack.iter().fold(self.initial.clone(), |state, cmd| cmd.apply(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{CanvasObject, DrawingObject};
    use crate::types::{FilterValues, Tool};
    use kurbo::Point;

    fn pen(id: ObjectId) -> Command {
        Command::add_drawing(DrawingObject {
            id,
            tool: Tool::Pen,
            points: vec![Point::new(id as f64, 0.0)],
            color: "#000000".to_string(),
            brush_size: 3.0,
            erase: false,
        })
    }

    fn ids(history: &History) -> Vec<ObjectId> {
        history.current().objects.iter().map(CanvasObject::id).collect()
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut h = History::new(EditorState::default());
        h.dispatch(pen(1));
        h.dispatch(pen(2));
        let before = h.current().clone();

        assert_eq!(h.undo().map(Command::id), Some(2));
        assert_eq!(ids(&h), vec![1]);
        assert!(h.can_redo());

        h.redo();
        assert_eq!(h.current(), &before);
        assert!(!h.can_redo());
    }

    #[test]
    fn dispatch_truncates_redo() {
        let mut h = History::new(EditorState::default());
        h.dispatch(pen(1));
        h.dispatch(pen(2));
        h.undo();
        h.dispatch(pen(3));
        assert!(!h.can_redo());
        assert_eq!(h.redo().map(Command::id), None);
        assert_eq!(ids(&h), vec![1, 3]);
        assert_eq!(h.labels(), vec!["add-drawing", "add-drawing"]);
    }

    #[test]
    fn underflow_is_a_no_op() {
        let mut h = History::new(EditorState::default());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.current(), &EditorState::default());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut h = History::new(EditorState::default());
        h.dispatch(pen(1));
        h.dispatch(Command::update_filters(2, FilterValues { grayscale: 100.0, ..FilterValues::default() }));
        assert!(h.can_reset());
        h.reset();
        let once = h.current().clone();
        h.reset();
        assert_eq!(h.current(), &once);
        assert!(!h.can_undo() && !h.can_redo() && !h.can_reset());
    }

    fn add_text(id: ObjectId) -> Command {
        Command::add_text(crate::objects::TextObject {
            id,
            text: "note".to_string(),
            position: Point::new(0.0, 0.0),
            font: "Arial".to_string(),
            font_size: 16.0,
            color: "#000000".to_string(),
            rotation: 0.0,
            scale: 1.0,
        })
    }

    #[test]
    fn undo_and_redo_keep_a_cleared_selection() {
        let mut h = History::new(EditorState::default());
        h.dispatch(add_text(1));
        h.dispatch(pen(2));
        h.select(vec![]);

        h.undo();
        assert!(h.current().selected.is_empty());
        h.redo();
        assert!(h.current().selected.is_empty());

        // a selected text that an undo removes drops out of the selection
        h.select(vec![1]);
        h.undo();
        h.undo();
        assert!(h.current().selected.is_empty());
        h.redo();
        assert!(h.current().selected.is_empty());
    }

    #[test]
    fn selection_has_no_history_entry() {
        let mut h = History::new(EditorState::default());
        h.dispatch(pen(1));
        h.select(vec![1]);
        assert_eq!(h.undo_len(), 1);
        assert_eq!(h.current().selected, vec![1]);
    }
}
