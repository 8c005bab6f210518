use crate::objects::{
    BackgroundImage, CanvasObject, DrawingObject, EditorState, FilterObject, ObjectId, ScaleObject, TextObject,
};
use crate::types::{FilterValues, LayerSet, ScaleValues};

/// A recorded edit. Commands are plain data; `apply` and `revert` are pure.
#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    AddObject(CanvasObject),
    UpdateText { before: TextObject, after: TextObject },
    SetBackground { before: Option<BackgroundImage>, after: Option<BackgroundImage> },
}

impl Command {
    pub fn add_drawing(drawing: DrawingObject) -> Command {
        Command::AddObject(CanvasObject::Drawing(drawing))
    }

    pub fn add_text(text: TextObject) -> Command {
        Command::AddObject(CanvasObject::Text(text))
    }

    pub fn update_filters(id: ObjectId, values: FilterValues) -> Command {
        Command::AddObject(CanvasObject::Filter(FilterObject { id, values }))
    }

    pub fn update_scales(id: ObjectId, values: ScaleValues) -> Command {
        Command::AddObject(CanvasObject::Scale(ScaleObject { id, values }))
    }

    pub fn update_text(before: TextObject, after: TextObject) -> Command {
        debug_assert_eq!(before.id, after.id, "update-text must keep the object id");
        Command::UpdateText { before, after }
    }

    pub fn set_background(before: Option<BackgroundImage>, after: Option<BackgroundImage>) -> Command {
        Command::SetBackground { before, after }
    }

    /// Id of the object this command touches. Background swaps use the image id.
    pub fn id(&self) -> ObjectId {
        match self {
            Command::AddObject(obj) => obj.id(),
            Command::UpdateText { after, .. } => after.id,
            Command::SetBackground { after, before } => {
                after.as_ref().or(before.as_ref()).map(|b| b.id).unwrap_or(0)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::AddObject(CanvasObject::Drawing(_)) => "add-drawing",
            Command::AddObject(CanvasObject::Text(_)) => "add-text",
            Command::AddObject(CanvasObject::Filter(_)) => "update-filters",
            Command::AddObject(CanvasObject::Scale(_)) => "update-scales",
            Command::UpdateText { .. } => "update-text",
            Command::SetBackground { .. } => "set-background",
        }
    }

    pub fn affected_layers(&self) -> LayerSet {
        match self {
            Command::AddObject(obj) => obj.layer().map(LayerSet::only).unwrap_or_else(LayerSet::all),
            Command::UpdateText { .. } => LayerSet::only(crate::types::Layer::Texts),
            Command::SetBackground { .. } => LayerSet::all(),
        }
    }

    pub fn apply(&self, state: &EditorState) -> EditorState {
        let mut next = state.clone();
        match self {
            Command::AddObject(obj) => {
                next.objects.push(obj.clone());
                if let CanvasObject::Text(text) = obj {
                    next.selected = vec![text.id];
                }
            }
            Command::UpdateText { after, .. } => replace_text(&mut next, after),
            Command::SetBackground { after, .. } => next.background = after.clone(),
        }
        next
    }

    pub fn revert(&self, state: &EditorState) -> EditorState {
        let mut prev = state.clone();
        match self {
            Command::AddObject(obj) => {
                let id = obj.id();
                if let Some(pos) = prev.objects.iter().rposition(|o| o.id() == id) {
                    prev.objects.remove(pos);
                }
                prev.selected.retain(|s| *s != id);
            }
            Command::UpdateText { before, .. } => replace_text(&mut prev, before),
            Command::SetBackground { before, .. } => prev.background = before.clone(),
        }
        prev
    }
}

fn replace_text(state: &mut EditorState, text: &TextObject) {
    for obj in state.objects.iter_mut() {
        if let CanvasObject::Text(existing) = obj {
            if existing.id == text.id {
                *existing = text.clone();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Layer, Tool};
    use image::RgbaImage;
    use kurbo::Point;

    fn line(id: ObjectId) -> DrawingObject {
        DrawingObject {
            id,
            tool: Tool::Line,
            points: vec![Point::new(10.0, 10.0), Point::new(20.0, 20.0)],
            color: "#ff0000".to_string(),
            brush_size: 2.0,
            erase: false,
        }
    }

    fn text(id: ObjectId, body: &str) -> TextObject {
        TextObject {
            id,
            text: body.to_string(),
            position: Point::new(5.0, 5.0),
            font: "Arial".to_string(),
            font_size: 16.0,
            color: "#000000".to_string(),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    #[test]
    fn revert_undoes_apply() {
        let mut base = EditorState::default();
        base.objects.push(CanvasObject::Text(text(1, "a")));
        base.background = Some(BackgroundImage::new(9, RgbaImage::new(2, 2)));

        let commands = vec![
            Command::add_drawing(line(2)),
            Command::add_text(text(3, "b")),
            Command::update_filters(4, FilterValues { contrast: 150.0, ..FilterValues::default() }),
            Command::update_text(text(1, "a"), text(1, "changed")),
            Command::set_background(base.background.clone(), Some(BackgroundImage::new(10, RgbaImage::new(3, 3)))),
            Command::set_background(base.background.clone(), None),
        ];
        for cmd in commands {
            let after = cmd.apply(&base);
            assert_ne!((&after.objects, &after.background), (&base.objects, &base.background), "{}", cmd.label());
            let back = cmd.revert(&after);
            assert_eq!(back.objects, base.objects, "{}", cmd.label());
            assert_eq!(back.background, base.background, "{}", cmd.label());
        }
    }

    #[test]
    fn labels_and_layers() {
        assert_eq!(Command::add_drawing(line(1)).label(), "add-drawing");
        assert_eq!(Command::add_drawing(line(1)).affected_layers(), LayerSet::only(Layer::Drawings));
        assert_eq!(Command::add_text(text(1, "x")).affected_layers(), LayerSet::only(Layer::Texts));
        let filters = Command::update_filters(1, FilterValues::default());
        assert_eq!(filters.label(), "update-filters");
        assert_eq!(filters.affected_layers(), LayerSet::only(Layer::Background));
        let scales = Command::update_scales(1, ScaleValues::default());
        assert_eq!(scales.label(), "update-scales");
        assert!(scales.affected_layers().is_all());
        assert!(Command::set_background(None, None).affected_layers().is_all());
    }

    #[test]
    fn adding_text_selects_it() {
        let state = Command::add_text(text(4, "hi")).apply(&EditorState::default());
        assert_eq!(state.selected, vec![4]);
        let reverted = Command::add_text(text(4, "hi")).revert(&state);
        assert!(reverted.selected.is_empty());
    }
}
