use kurbo::Point;
use crate::objects::{EditorState, ObjectId, TextObject};
use crate::text::{hit_test, TextMeasure};

/// Topmost text whose wrapped box contains `point`.
pub fn text_at<'a>(
    state: &'a EditorState,
    point: Point,
    measure: &dyn TextMeasure,
    wrap_width: f64,
) -> Option<&'a TextObject> {
    let texts: Vec<&TextObject> = state.texts().collect();
    texts.into_iter().rev().find(|t| hit_test(measure, point, t, wrap_width))
}

/// Selected text, if exactly one text is selected.
pub fn selected_text(state: &EditorState) -> Option<&TextObject> {
    match state.selected.as_slice() {
        [id] => state.find_text(*id),
        _ => None,
    }
}

pub fn selection_after_click(hit: Option<&TextObject>) -> Vec<ObjectId> {
    hit.map(|t| vec![t.id]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::text::MonospaceMeasure;

    fn text(id: ObjectId, x: f64) -> TextObject {
        TextObject {
            id,
            text: "label".to_string(),
            position: Point::new(x, 0.0),
            font: "Arial".to_string(),
            font_size: 10.0,
            color: "#000".to_string(),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    #[test]
    fn picks_the_topmost_text() {
        let mut state = EditorState::default();
        state = Command::add_text(text(1, 0.0)).apply(&state);
        state = Command::add_text(text(2, 10.0)).apply(&state);
        let m = MonospaceMeasure::default();

        // both boxes (0..30 and 10..40) contain x = 15; the later one wins
        assert_eq!(text_at(&state, Point::new(15.0, 5.0), &m, 200.0).map(|t| t.id), Some(2));
        assert_eq!(text_at(&state, Point::new(5.0, 5.0), &m, 200.0).map(|t| t.id), Some(1));
        assert!(text_at(&state, Point::new(100.0, 5.0), &m, 200.0).is_none());

        assert_eq!(selected_text(&state).map(|t| t.id), Some(2));
        assert_eq!(selection_after_click(None), Vec::<ObjectId>::new());
    }
}
