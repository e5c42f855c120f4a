mod common;

use common::fixtures::{article_markup, article_table, BLUE, RED};
use styled_markup::features::FRACTIONS_TYPE;
use styled_markup::{
    AttributeKey, AttributeValue, Emphasis, EmphasisFlags, FeatureFlag, FeatureSetting, Fractions,
    MarkupStyler,
    NumberCase, ParsingOptions, RichText, SmallCaps, StyleNode, StyleTable, SymbolicTraits,
    TextAlignment, TextRun, Tracking, ATTACHMENT_CHARACTER,
};

fn no_wrap() -> ParsingOptions {
    ParsingOptions {
        do_not_wrap: true,
        ..ParsingOptions::default()
    }
}

fn color_of(run: &TextRun) -> Option<styled_markup::Color> {
    run.attributes
        .get(&AttributeKey::ForegroundColor)
        .and_then(AttributeValue::as_color)
}

fn is_bold(run: &TextRun) -> bool {
    run.attributes
        .font()
        .is_some_and(|font| font.traits.contains(SymbolicTraits::BOLD))
}

fn sample_nodes() -> Vec<StyleNode> {
    vec![
        StyleNode::new(),
        StyleNode::new().color(RED).emphasis(Emphasis::Bold),
        StyleNode::new()
            .alignment(TextAlignment::Right)
            .tracking(Tracking::Point(0.5))
            .number_case(NumberCase::Lower)
            .small_caps(SmallCaps::Disabled),
        StyleNode::new()
            .color(BLUE)
            .line_height_multiple(1.2)
            .emphasis(Emphasis::Italic)
            .emphasis(Emphasis::Monospace)
            .fractions(Fractions::Vertical),
    ]
}

#[test]
fn combine_is_idempotent() {
    for node in sample_nodes() {
        assert_eq!(StyleNode::combine(&node, &node), node);
    }
}

#[test]
fn combine_inherits_and_overrides_per_field() {
    let parent = StyleNode::new()
        .color(RED)
        .alignment(TextAlignment::Center)
        .head_indent(3.0);
    let child = StyleNode::new().color(BLUE).alignment(TextAlignment::Left);
    let out = StyleNode::combine(&parent, &child);

    assert_eq!(out.typography.head_indent, Some(3.0));
    assert_eq!(out.typography.alignment, Some(TextAlignment::Left));
    assert_eq!(
        out.attributes
            .get(&AttributeKey::ForegroundColor)
            .and_then(AttributeValue::as_color),
        Some(BLUE)
    );
}

#[test]
fn combine_unions_emphasis_for_every_pair() {
    let nodes = sample_nodes();
    for parent in &nodes {
        for child in &nodes {
            let out = StyleNode::combine(parent, child);
            assert_eq!(out.emphasis, parent.emphasis.union(child.emphasis));
        }
    }
}

#[test]
fn combine_is_not_commutative() {
    let a = StyleNode::new().color(RED);
    let b = StyleNode::new().color(BLUE);
    assert_ne!(StyleNode::combine(&a, &b), StyleNode::combine(&b, &a));
}

#[test]
fn feature_lists_keep_parent_then_child_order() {
    let parent = StyleNode::new().number_case(NumberCase::Upper);
    let child = StyleNode::new().fractions(Fractions::Diagonal);
    let out = StyleNode::combine(&parent, &child);
    assert_eq!(
        out.features,
        vec![
            FeatureFlag::NumberCase(NumberCase::Upper),
            FeatureFlag::Fractions(Fractions::Diagonal)
        ]
    );
}

#[test]
fn nested_tags_yield_three_runs() {
    let table = StyleTable::new()
        .with("a", StyleNode::new().color(RED))
        .with("b", StyleNode::new().emphasis(Emphasis::Bold));
    let styler = MarkupStyler::new(table).with_parsing(no_wrap());
    let out = styler
        .resolve("<r><a>X<b>Y</b>Z</a></r>")
        .expect("resolve");

    let runs = out.runs();
    assert_eq!(runs.len(), 3);
    assert_eq!(
        runs.iter().map(|r| r.text.as_str()).collect::<Vec<_>>(),
        vec!["X", "Y", "Z"]
    );
    for run in runs {
        assert_eq!(color_of(run), Some(RED));
    }
    assert!(!is_bold(&runs[0]));
    assert!(is_bold(&runs[1]));
    assert!(!is_bold(&runs[2]));
}

#[test]
fn root_style_reaches_every_run() {
    let table = StyleTable::new()
        .with_root(StyleNode::new().emphasis(Emphasis::Italic))
        .with("b", StyleNode::new().emphasis(Emphasis::Bold));
    let out = MarkupStyler::new(table)
        .resolve("x<b>y</b>")
        .expect("resolve");
    let traits: Vec<_> = out
        .runs()
        .iter()
        .map(|run| run.attributes.font().expect("font").traits)
        .collect();
    assert!(traits[0].contains(SymbolicTraits::ITALIC));
    assert!(!traits[0].contains(SymbolicTraits::BOLD));
    assert!(traits[1].contains(SymbolicTraits::ITALIC | SymbolicTraits::BOLD));
}

#[test]
fn literal_entry_returns_exactly_the_literal() {
    let literal = RichText::from_runs([TextRun::plain("[image]")]);
    let table = StyleTable::new().with("img", literal.clone());
    let out = MarkupStyler::new(table).resolve("<img/>").expect("resolve");
    assert_eq!(out.runs(), literal.runs());
}

#[test]
fn attachment_entry_substitutes_a_single_character() {
    let out = MarkupStyler::new(article_table())
        .resolve("<icon/>")
        .expect("resolve");
    let runs = out.runs();
    // The root style sets line spacing, but attachments are not cascaded.
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, ATTACHMENT_CHARACTER.to_string());
    match runs[0].attributes.get(&AttributeKey::Attachment) {
        Some(AttributeValue::Attachment(attachment)) => {
            assert_eq!(attachment.bounds.y, -2.0);
            assert_eq!(attachment.tint, Some(RED));
        }
        other => panic!("expected an attachment, got {other:?}"),
    }
}

#[test]
fn tag_attributes_are_enumerated_with_output_ranges() {
    let out = MarkupStyler::new(article_table())
        .resolve("go <link href=\"https://example.com\" rel=\"next\">here</link>")
        .expect("resolve");
    let mut seen = Vec::new();
    out.enumerate_tag_attributes(|tag, key, value| {
        seen.push((tag.name.clone(), key.to_string(), value.to_string(), tag.range.clone()));
    });
    assert_eq!(
        seen,
        vec![
            (
                "link".to_string(),
                "href".to_string(),
                "https://example.com".to_string(),
                3..7
            ),
            ("link".to_string(), "rel".to_string(), "next".to_string(), 3..7),
        ]
    );
}

#[test]
fn article_resolves_end_to_end() {
    let styler = MarkupStyler::new(article_table());
    let out = styler.resolve(&article_markup(3)).expect("resolve");
    let text = out.text();
    assert!(text.starts_with("Chapter 0\n"));
    assert!(text.contains("bold red"));
    assert!(text.contains("1/2 cup & an"));
    assert!(text.ends_with("-- signed"));
    assert_eq!(text.matches(ATTACHMENT_CHARACTER).count(), 3);

    let heading = &out.runs()[0];
    assert_eq!(heading.text, "Chapter 0");
    assert!(heading.attributes.contains_key(&AttributeKey::Kern));
    assert!(heading.attributes.contains_key(&AttributeKey::FeatureSettings));
    assert!(heading.attributes.contains_key(&AttributeKey::ParagraphStyle));

    let emphasis: EmphasisFlags = [Emphasis::Bold].into_iter().collect();
    let bold_runs = out
        .runs()
        .iter()
        .filter(|run| {
            run.attributes
                .font()
                .is_some_and(|font| font.traits.contains(emphasis.symbolic_traits()))
        })
        .count();
    assert_eq!(bold_runs, 3);
}

#[test]
fn feature_settings_reach_runs_only_when_flags_are_set() {
    let out = MarkupStyler::new(article_table())
        .resolve("x<num>1/2</num>")
        .expect("resolve");
    let runs = out.runs();
    assert!(!runs[0].attributes.contains_key(&AttributeKey::FeatureSettings));
    match runs[1].attributes.get(&AttributeKey::FeatureSettings) {
        Some(AttributeValue::FeatureSettings(settings)) => {
            assert_eq!(
                settings.decode(),
                &[FeatureSetting::new(FRACTIONS_TYPE, 2)][..]
            );
        }
        other => panic!("expected feature settings, got {other:?}"),
    }
}

#[test]
fn resolve_into_appends_after_existing_content() {
    let styler = MarkupStyler::new(article_table());
    let mut out = RichText::plain("head ");
    styler.resolve_into("<a>tail</a>", &mut out).expect("resolve");
    assert_eq!(out.text(), "head tail");
    assert_eq!(out.tags()[0].range, 5..9);
}
