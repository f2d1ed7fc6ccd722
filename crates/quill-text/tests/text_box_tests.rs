//! The text box facade end to end with approximate fonts.

use std::rc::Rc;

use quill_text::{
    ApproximateFontResolver, ElementIds, HorizontalAlignment, Surface, TextBox, TextBoxResources,
    Theme,
};

fn resources(theme: Theme) -> TextBoxResources {
    TextBoxResources::new(Rc::new(theme), Rc::new(ApproximateFontResolver::new()))
}

fn text_box(markup: &str, width: f32) -> TextBox {
    TextBox::new(
        markup,
        width,
        None,
        resources(Theme::default()),
        ElementIds::element("text_box"),
    )
}

// 14px approximate glyphs are 6px wide boxes on an 8px advance, sitting
// 4..14px below the row top.
fn letter_drawn(text_box: &TextBox, letter: u32) -> bool {
    text_box.surface().pixel(letter * 8 + 4, 9).a > 0
}

#[test]
fn reveal_draws_a_prefix() {
    let mut text_box = text_box("abcdefghij", 200.0);
    assert!(letter_drawn(&text_box, 9));

    text_box.set_reveal(Some(5));
    assert!(letter_drawn(&text_box, 4));
    assert!(!letter_drawn(&text_box, 5));

    text_box.set_reveal(Some(10));
    assert!(letter_drawn(&text_box, 9));

    text_box.set_reveal(Some(0));
    assert!(!letter_drawn(&text_box, 0));
    assert_eq!(text_box.layout().rows().len(), 1);
    assert_eq!(text_box.layout().letter_count(), 10);
}

#[test]
fn links_are_hit_tested() {
    let text_box = text_box("see <a href='docs'>the docs</a> here", 400.0);
    assert_eq!(text_box.link_at(40.0, 5.0), Some("docs"));
    assert_eq!(text_box.link_at(4.0, 5.0), None);
}

#[test]
fn cursor_is_drawn_and_moves_with_typing() {
    let mut text_box = text_box("abc", 100.0);
    text_box.toggle_cursor();
    text_box.set_cursor_position(3);
    // Cursor sits after three 8px letters.
    assert_eq!(text_box.surface().pixel(24, 5).a, 255);

    text_box.insert_text_at_cursor("de").unwrap();
    assert_eq!(text_box.layout().cursor_letter(), 5);
    assert_eq!(text_box.surface().pixel(40, 5).a, 255);
}

#[test]
fn click_places_cursor() {
    let mut text_box = text_box("hello<br>world", 200.0);
    let letter = text_box.set_cursor_from_click(17.0, 25.0);
    assert_eq!(letter, 7);
    assert_eq!(text_box.layout().cursor_row(), 1);
}

#[test]
fn theme_alignment_is_applied() {
    let theme = Theme::from_json_str(
        r#"{"text_box": {"misc": {"text_horiz_alignment": "right"}}}"#,
    )
    .unwrap();
    let text_box = TextBox::new(
        "abc",
        100.0,
        None,
        resources(theme),
        ElementIds::element("text_box"),
    );
    assert_eq!(
        text_box.config().horizontal_alignment,
        HorizontalAlignment::Right
    );
    assert!((text_box.layout().rows()[0].rect.x - 76.0).abs() < f32::EPSILON);
}

#[test]
fn fade_is_reversible() {
    let mut text_box = text_box("solid", 100.0);
    let opaque = text_box.surface().clone();
    text_box.set_alpha(0);
    assert!(text_box.surface().pixels().all(|pixel| pixel.0[3] == 0));
    text_box.set_alpha(255);
    assert_eq!(text_box.surface(), &opaque);
}

#[test]
fn markup_issues_are_reported() {
    let text_box = text_box("<blink>x</blink>", 100.0);
    assert_eq!(text_box.issues().len(), 1);
    assert_eq!(text_box.layout().letter_count(), 1);
}
