//! Parser and layout engine working together.

use std::rc::Rc;

use quill_text::{
    ApproximateFontMetrics, ApproximateFontResolver, BlockContent, Colour, DefaultStyle,
    ElementIds, FloatSide, FontKey, HorizontalAlignment, LayoutConstraints, LayoutWarning,
    MarkupParser, Primitive, PrimitiveKind, StyleAttribute, StyleStack, StyleValue, TextBoxLayout,
    TextRun, Theme,
};

fn parse(markup: &str) -> Vec<Primitive> {
    let theme = Theme::default();
    let fonts = ApproximateFontResolver::new();
    let ids = ElementIds::element("text_box");
    let output = MarkupParser::new(&theme, &fonts, &ids, DefaultStyle::default()).parse(markup);
    output.queue.into_iter().collect()
}

fn lay_out(markup: &str, width: f32) -> TextBoxLayout {
    TextBoxLayout::new(
        parse(markup),
        LayoutConstraints::new(width, 1.25),
        HorizontalAlignment::Left,
    )
}

/// 10px approximate font: 6px per letter, 12px line height.
fn text(text: &str) -> Primitive {
    Primitive::text(TextRun {
        text: text.to_string(),
        font: Rc::new(ApproximateFontMetrics::new(10)),
        font_key: FontKey::new("fira_code", 10, false, false),
        colour: Colour::WHITE.into(),
        bg_colour: Colour::TRANSPARENT.into(),
        underline: false,
        link_href: None,
    })
}

#[test]
fn bold_and_normal_share_a_row() {
    let layout = lay_out("<b>bold</b> normal", 500.0);
    let rows = layout.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].items.len(), 2);
    assert_eq!(rows[0].letter_count, "bold".len() + " normal".len());
}

#[test]
fn one_word_per_row() {
    // 14px approximate font: 8px per letter, so exactly one word fits.
    let layout = lay_out("aaa bbb", 24.0);
    let rows = layout.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].items.len(), 1);
    assert_eq!(rows[1].items.len(), 1);
    assert!((rows[1].rect.y - rows[0].rect.height).abs() < f32::EPSILON);
    assert!((rows[0].rect.height - 17.0 * 1.25).abs() < f32::EPSILON);
    assert!(layout.warnings().is_empty());
}

#[test]
fn row_width_and_height_follow_items() {
    let layout = lay_out("<font size='6'>big</font> small text that wraps around", 120.0);
    for row in layout.rows().iter().filter(|row| !row.items.is_empty()) {
        let widths: f32 = row.items.iter().map(|item| item.rect.width).sum();
        assert!((widths - row.rect.width).abs() < 0.001);
        let tallest = row
            .items
            .iter()
            .map(|item| item.rect.height)
            .fold(0.0_f32, f32::max);
        assert!((tallest * 1.25 - row.rect.height).abs() < 0.001);
    }
}

#[test]
fn unbreakable_run_warns_and_terminates() {
    let layout = lay_out("abcdefghijklmnopqrstuvwxyz", 40.0);
    assert_eq!(layout.rows().len(), 1);
    assert!(matches!(
        layout.warnings(),
        [LayoutWarning::NarrowContainer { row: 0, .. }]
    ));
}

#[test]
fn reprocess_twice_gives_identical_rows() {
    let mut layout = lay_out(
        "The <b>quick</b> brown fox <i>jumps</i> over<br>the lazy dog",
        300.0,
    );
    layout.reprocess(90.0);
    let first: Vec<_> = layout.rows().iter().map(|row| row.rect).collect();
    layout.reprocess(90.0);
    let second: Vec<_> = layout.rows().iter().map(|row| row.rect).collect();
    assert_eq!(first, second);

    layout.reprocess(300.0);
    assert!(layout.rows().len() < first.len());
}

#[test]
fn left_float_after_three_rows() {
    let float = Primitive::block(
        PrimitiveKind::Float {
            side: FloatSide::Left,
            content: BlockContent::Fill(Colour::WHITE.into()),
        },
        12.0,
        30.0,
    );
    let layout = TextBoxLayout::new(
        vec![text("aaa bbb ccc ddd"), float, text("eee fff ggg")],
        LayoutConstraints::new(30.0, 1.0),
        HorizontalAlignment::Left,
    );

    let rows = layout.rows();
    assert!(layout.warnings().is_empty());
    assert_eq!(layout.floats()[0].row_index, 3);
    assert!((layout.floats()[0].primitive.rect.y - 36.0).abs() < f32::EPSILON);

    for (index, row) in rows.iter().enumerate().take(3) {
        assert!(row.rect.x.abs() < f32::EPSILON);
        #[allow(clippy::cast_precision_loss)]
        let expected_y = index as f32 * 12.0;
        assert!((row.rect.y - expected_y).abs() < f32::EPSILON);
    }
    for row in &rows[3..6] {
        assert!((row.rect.x - 12.0).abs() < f32::EPSILON);
    }
    assert!(rows[6].rect.x.abs() < f32::EPSILON);
}

#[test]
fn float_inserted_at_fourth_row_leaves_earlier_rows() {
    let mut layout = TextBoxLayout::new(
        vec![text("aaa bbb ccc ddd eee fff ggg")],
        LayoutConstraints::new(30.0, 1.0),
        HorizontalAlignment::Left,
    );
    assert_eq!(layout.rows().len(), 7);
    let before: Vec<_> = layout.rows()[..3].iter().map(|row| row.rect).collect();

    let float = Primitive::block(
        PrimitiveKind::Float {
            side: FloatSide::Left,
            content: BlockContent::Fill(Colour::WHITE.into()),
        },
        12.0,
        30.0,
    );
    layout.insert_primitives(vec![float], 3, 0, 0).unwrap();

    let rows = layout.rows();
    let after: Vec<_> = rows[..3].iter().map(|row| row.rect).collect();
    assert_eq!(before, after);
    assert!(layout.warnings().is_empty());
    assert_eq!(layout.floats().len(), 1);
    assert_eq!(layout.floats()[0].row_index, 3);
    assert!((layout.floats()[0].primitive.rect.y - 36.0).abs() < f32::EPSILON);
    for row in &rows[3..6] {
        assert!((row.rect.x - 12.0).abs() < f32::EPSILON);
    }
    assert!(rows[6].rect.x.abs() < f32::EPSILON);
}

#[test]
fn styles_restore_in_any_close_order() {
    let base = DefaultStyle::default().to_style_state();
    let orders = [
        ["b", "i", "u"],
        ["b", "u", "i"],
        ["i", "b", "u"],
        ["i", "u", "b"],
        ["u", "b", "i"],
        ["u", "i", "b"],
    ];
    for order in orders {
        let mut stack = StyleStack::new(base.clone());
        stack.push("b", vec![(StyleAttribute::Bold, StyleValue::Flag(true))]);
        stack.push("i", vec![(StyleAttribute::Italic, StyleValue::Flag(true))]);
        stack.push("u", vec![(StyleAttribute::Underline, StyleValue::Flag(true))]);
        for key in order {
            let _ = stack.pop(key);
        }
        assert_eq!(stack.current(), &base);
        assert_eq!(stack.depth(), 0);
    }
}

#[test]
fn edits_leave_earlier_rows_alone() {
    let mut layout = lay_out("aaa bbb ccc ddd", 32.0);
    let before: Vec<_> = layout.rows()[..2].iter().map(|row| row.rect).collect();
    let last = layout.rows().len() - 1;
    layout.insert_text("eee ", last, 0, 0).unwrap();
    let after: Vec<_> = layout.rows()[..2].iter().map(|row| row.rect).collect();
    assert_eq!(before, after);
    assert_eq!(layout.letter_count(), 19);
}
