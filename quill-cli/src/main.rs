//! Quill command line renderer
//!
//! Lays out a piece of text box markup and writes the result as a PNG, or
//! prints the row geometry the layout engine produced.
//!
//! - `quill notes.html -o notes.png`
//! - `quill --html '<b>hi</b>' --rows`

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use quill_render::{build_text_box, save_png};
use quill_text::{FloatSide, LayoutRow, Primitive, PrimitiveKind, TextBox, Theme};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Quill: lay out rich text markup and render it to an image
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render a file
    quill story.html -o story.png

    # Render inline markup into a 200px wide box
    quill --html '<b>bold</b> and <i>italic</i>' --width 200 -o out.png

    # Typewriter frame: only the first 12 letters
    quill story.html --reveal 12 -o frame.png

    # Print row geometry
    quill --html 'some long text that wraps' --width 80 --rows
"#)]
struct Cli {
    /// Path to a markup file
    #[arg(value_name = "FILE", conflicts_with = "html")]
    path: Option<PathBuf>,

    /// Markup string to render instead of a file
    #[arg(long, value_name = "MARKUP")]
    html: Option<String>,

    /// Box width in pixels
    #[arg(long, default_value = "400")]
    width: f32,

    /// Fixed box height in pixels (default: fit the content)
    #[arg(long)]
    height: Option<f32>,

    /// Theme JSON file
    #[arg(long, value_name = "FILE")]
    theme: Option<PathBuf>,

    /// Draw only the first N letters
    #[arg(long, value_name = "N")]
    reveal: Option<usize>,

    /// Fade the whole box to this alpha (0-255)
    #[arg(long)]
    alpha: Option<u8>,

    /// Write the rendered box to this PNG file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the laid-out rows, floats and warnings
    #[arg(long)]
    rows: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!(path = ?cli.path, width = cli.width, height = ?cli.height, "Starting render");
    let markup = load_markup(&cli)?;
    let theme = match &cli.theme {
        Some(path) => Theme::load(path)?,
        None => Theme::default(),
    };

    let mut text_box = build_text_box(&markup, cli.width, cli.height, Rc::new(theme))?;
    if cli.reveal.is_some() {
        text_box.set_reveal(cli.reveal);
    }
    if let Some(alpha) = cli.alpha {
        text_box.set_alpha(alpha);
    }

    if !text_box.issues().is_empty() {
        eprintln!("{}", "Markup issues:".yellow().bold());
        for issue in text_box.issues() {
            eprintln!("  - {issue}");
        }
    }

    if cli.rows {
        print_rows(&text_box);
    }

    if let Some(output) = &cli.output {
        save_png(text_box.surface(), output)?;
        println!("Saved to: {}", output.display());
    } else if !cli.rows {
        let (width, height) = text_box.surface().dimensions();
        println!(
            "{} rows, {width}x{height} pixels (use -o to save)",
            text_box.layout().rows().len()
        );
    }
    Ok(())
}

/// Markup from `--html` or the file argument.
fn load_markup(cli: &Cli) -> anyhow::Result<String> {
    if let Some(markup) = &cli.html {
        Ok(markup.clone())
    } else if let Some(path) = &cli.path {
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
    } else {
        anyhow::bail!("Nothing to render: pass a FILE or --html")
    }
}

fn print_rows(text_box: &TextBox) {
    let layout = text_box.layout();
    let content = layout.content_rect();
    println!(
        "{} {:.1}x{:.1}, {} letters",
        "=== Layout ===".bold(),
        content.width,
        content.height,
        layout.letter_count()
    );

    for row in layout.rows() {
        print_row(row);
    }

    if !layout.floats().is_empty() {
        println!("\n{}", "=== Floats ===".bold());
        for float in layout.floats() {
            println!(
                "  {} from row {}",
                describe_item(&float.primitive).magenta(),
                float.row_index
            );
        }
    }

    if !layout.links().is_empty() {
        println!("\n{}", "=== Links ===".bold());
        for link in layout.links() {
            let rect = link.rect;
            println!(
                "  {} at x={:.1} y={:.1} w={:.1} h={:.1}",
                link.href.blue().underline(),
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
        }
    }

    if !layout.warnings().is_empty() {
        println!("\n{}", "=== Warnings ===".bold());
        for warning in layout.warnings() {
            println!("  {}", warning.to_string().yellow());
        }
    }
}

fn print_row(row: &LayoutRow) {
    println!(
        "{} x={:.1} y={:.1} w={:.1} h={:.1} baseline={:.1} letters={}",
        format!("row {}", row.index).cyan().bold(),
        row.rect.x,
        row.rect.y,
        row.rect.width,
        row.rect.height,
        row.baseline,
        row.letter_count
    );
    for item in &row.items {
        println!(
            "    {} {}",
            describe_item(item),
            format!("x={:.1} w={:.1} h={:.1}", item.rect.x, item.rect.width, item.rect.height)
                .dimmed()
        );
    }
}

/// One-line label for a primitive.
fn describe_item(item: &Primitive) -> String {
    match &item.kind {
        PrimitiveKind::Text(run) => {
            let preview: String = run.text.chars().take(30).collect();
            let suffix = if run.text.chars().count() > 30 { "..." } else { "" };
            format!("Text(\"{preview}{suffix}\") [{}]", run.font_key)
        }
        PrimitiveKind::LineBreak => "LineBreak".to_string(),
        PrimitiveKind::Float { side, .. } => match side {
            FloatSide::Left => "Float(left)".to_string(),
            FloatSide::Right => "Float(right)".to_string(),
        },
        PrimitiveKind::Span { .. } => "Span".to_string(),
        PrimitiveKind::Inline { .. } => "Inline".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_text::{Colour, ColourOrGradient, FontKey, TextRun};

    #[test]
    fn file_and_html_conflict() {
        assert!(Cli::try_parse_from(["quill", "a.html", "--html", "<b>x</b>"]).is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["quill", "--html", "x"]).unwrap();
        assert!((cli.width - 400.0).abs() < f32::EPSILON);
        assert_eq!(cli.height, None);
        assert!(!cli.rows);
        assert_eq!(load_markup(&cli).unwrap(), "x");
    }

    #[test]
    fn nothing_to_render() {
        let cli = Cli::try_parse_from(["quill"]).unwrap();
        assert!(load_markup(&cli).is_err());
    }

    #[test]
    fn text_items_are_previewed() {
        let run = TextRun {
            text: "a".repeat(40),
            font: Rc::new(quill_text::ApproximateFontMetrics::new(10)),
            font_key: FontKey::new("fira_code", 10, true, false),
            colour: Colour::WHITE.into(),
            bg_colour: ColourOrGradient::default(),
            underline: false,
            link_href: None,
        };
        let label = describe_item(&Primitive::text(run));
        assert_eq!(label, format!("Text(\"{}...\") [fira_code 10px bold]", "a".repeat(30)));
        assert_eq!(describe_item(&Primitive::line_break(12.0)), "LineBreak");
    }
}
