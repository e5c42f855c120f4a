use styled_markup::{
    Color, Emphasis, Fractions, MediaAttachment, NumberCase, RichText, StyleNode, StyleTable,
    TextAlignment, TextRun, Tracking,
};

pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

/// Table used by the cascade and error tests.
pub fn article_table() -> StyleTable {
    StyleTable::new()
        .with_root(StyleNode::new().line_spacing(2.0))
        .with("a", StyleNode::new().color(RED))
        .with("b", StyleNode::new().emphasis(Emphasis::Bold))
        .with("i", StyleNode::new().emphasis(Emphasis::Italic))
        .with(
            "h1",
            StyleNode::new()
                .alignment(TextAlignment::Center)
                .tracking(Tracking::Adobe(40.0))
                .number_case(NumberCase::Upper),
        )
        .with("num", StyleNode::new().fractions(Fractions::Diagonal))
        .with("link", StyleNode::new().color(BLUE).underline(1, Some(BLUE)))
        .with(
            "sig",
            RichText::from_runs([TextRun::plain("-- "), TextRun::plain("signed")]),
        )
        .with(
            "icon",
            MediaAttachment::new("icon.png", 12.0, 12.0)
                .template(true)
                .style(StyleNode::new().color(RED).baseline_offset(-2.0)),
        )
}

/// Markup with `paragraphs` repetitions of a mixed paragraph.
pub fn article_markup(paragraphs: usize) -> String {
    let mut out = String::with_capacity(paragraphs * 160);
    for idx in 0..paragraphs {
        out.push_str("<h1>Chapter ");
        out.push_str(&idx.to_string());
        out.push_str("</h1>\n");
        out.push_str("Plain text with <a>red <b>bold red</b> and <i>italic red</i></a>, ");
        out.push_str("a <link href=\"https://example.com\">link</link>, ");
        out.push_str("<num>1/2</num> cup &amp; an <icon/> icon.\n");
    }
    out.push_str("<sig></sig>");
    out
}

/// `depth` nested `<b>` tags around a single word.
pub fn nested_markup(depth: usize) -> String {
    let mut out = String::with_capacity(depth * 7 + 4);
    for _ in 0..depth {
        out.push_str("<b>");
    }
    out.push_str("deep");
    for _ in 0..depth {
        out.push_str("</b>");
    }
    out
}
