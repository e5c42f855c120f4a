//! DHAT heap profiler for styled-markup.
//!
//! Profiles allocation patterns across the resolve pipeline:
//! tokenize -> cascade -> encode.
//!
//! Usage:
//!   cargo run -p styled-markup-heap-profile --release -- [OPTIONS] [MARKUP_FILES...]
//!
//! Outputs dhat-<phase>.json files in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::Command;

use styled_markup::{
    Color, EncodeDefaults, Emphasis, Fractions, MarkupStyler, MediaAttachment, NumberCase,
    ParsingOptions, PreparedMarkup, RichText, StyleNode, StyleTable, SystemFonts, TextAlignment,
    TextRun, Tracking,
};

const BUILTIN_PARAGRAPHS: usize = 200;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tokenize,
    Resolve,
    Encode,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "tokenize" => Some(Self::Tokenize),
            "resolve" => Some(Self::Resolve),
            "encode" => Some(Self::Encode),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Tokenize => "tokenize",
            Self::Resolve => "resolve",
            Self::Encode => "encode",
            Self::Full => "full",
        }
    }
}

/// Markup source: a file on disk or the generated article.
enum Input {
    File(PathBuf),
    Builtin,
}

impl Input {
    fn name(&self) -> String {
        match self {
            Self::File(path) => short_name(path),
            Self::Builtin => "builtin".to_string(),
        }
    }

    fn load(&self) -> String {
        match self {
            Self::File(path) => std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("read {}: {}", path.display(), e)),
            Self::Builtin => builtin_markup(BUILTIN_PARAGRAPHS),
        }
    }
}

fn table() -> StyleTable {
    let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
    StyleTable::new()
        .with_root(StyleNode::new().line_spacing(2.0))
        .with("a", StyleNode::new().color(red))
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
        .with("link", StyleNode::new().underline(1, Some(red)))
        .with("sig", RichText::from_runs([TextRun::plain("-- signed")]))
        .with(
            "icon",
            MediaAttachment::new("icon.png", 12.0, 12.0)
                .template(true)
                .style(StyleNode::new().color(red)),
        )
}

fn builtin_markup(paragraphs: usize) -> String {
    let mut out = String::with_capacity(paragraphs * 160);
    for idx in 0..paragraphs {
        out.push_str("<h1>Chapter ");
        out.push_str(&idx.to_string());
        out.push_str("</h1>\nPlain text with <a>red <b>bold red</b> and <i>italic</i></a>, ");
        out.push_str("a <link href=\"https://example.com\">link</link>, ");
        out.push_str("<num>1/2</num> cup &amp; an <icon/> icon.\n");
    }
    out.push_str("<sig/>");
    out
}

fn profile_input(input: &Input, phase: Phase) {
    let name = input.name();
    let markup = input.load();
    let styler = MarkupStyler::new(table());

    match phase {
        Phase::Tokenize => {
            let prepared = PreparedMarkup::new(&markup, &ParsingOptions::default());
            let count = prepared
                .events(usize::MAX)
                .map(|event| event.unwrap_or_else(|e| panic!("tokenize {}: {}", name, e)))
                .count();
            if count == 0 {
                panic!("tokenize {} produced zero events", name);
            }
        }
        Phase::Resolve => {
            let _text = styler
                .resolve(&markup)
                .unwrap_or_else(|e| panic!("resolve {}: {}", name, e));
        }
        Phase::Encode => {
            let fonts = SystemFonts::default();
            let defaults = EncodeDefaults::default();
            let table = styler.table();
            let mut node = StyleNode::new();
            for tag in ["a", "b", "i", "h1", "num", "link"] {
                if let Some(styled_markup::StyleEntry::Style(child)) = table.get(tag) {
                    node = StyleNode::combine(&node, child);
                    let _ = node.encode(&fonts, &defaults);
                }
            }
        }
        Phase::Full => {
            // Reuse one output buffer across passes, the way a paginating caller would.
            let mut out = RichText::new();
            for _pass in 0..3 {
                styler
                    .resolve_into(&markup, &mut out)
                    .unwrap_or_else(|e| panic!("resolve {}: {}", name, e));
            }
            let broken = format!("{}<unknown/>", markup);
            let fallback = styler.resolve_or_plain(&broken);
            if fallback.runs().len() != 1 {
                panic!("fallback for {} was not a single plain run", name);
            }
        }
    }
}

/// Extract a short name from a file path for use in output filenames.
fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [MARKUP_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --phase <tokenize|resolve|encode|full>  Pipeline phase to profile (default: resolve)"
    );
    eprintln!("  --out-dir <DIR>                      Output directory for dhat JSON (default: target/memory)");
    eprintln!(
        "  --aggregate                          Single profile for all files (default: per-file)"
    );
    eprintln!();
    eprintln!("By default, each file gets its own clean DHAT profile (separate process).");
    eprintln!("With --aggregate, all files share one profile.");
    eprintln!();
    eprintln!("If no files are given, profiles a generated {BUILTIN_PARAGRAPHS}-paragraph article.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Resolve;
    let mut out_dir = PathBuf::from("target/memory");
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);
    let mut aggregate = false;
    // Internal flag: when set, we're a child process profiling a single input.
    let mut single_input_mode = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                let value = args.get(i).map(String::as_str).unwrap_or("");
                phase = Phase::from_str(value).unwrap_or_else(|| {
                    eprintln!("Unknown phase: {}", value);
                    usage();
                    std::process::exit(1);
                });
            }
            "--out-dir" => {
                i += 1;
                out_dir = PathBuf::from(args.get(i).map(String::as_str).unwrap_or("."));
            }
            "--aggregate" => {
                aggregate = true;
            }
            "--single-input" => {
                single_input_mode = true;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => {
                files.push(PathBuf::from(other));
            }
        }
        i += 1;
    }

    let inputs: Vec<Input> = if files.is_empty() {
        vec![Input::Builtin]
    } else {
        files.into_iter().map(Input::File).collect()
    };

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();

    // Child process mode: profile exactly one input with DHAT active.
    if single_input_mode {
        assert!(inputs.len() == 1, "--single-input expects exactly one input");
        let input = &inputs[0];
        let json_path = out_dir.join(format!("dhat-{phase_name}-{}.json", input.name()));

        let _profiler = dhat::Profiler::builder().file_name(json_path).build();

        profile_input(input, phase);
        return;
    }

    // Aggregate mode, or nothing worth spawning for: one DHAT session.
    if aggregate || matches!(inputs.as_slice(), [Input::Builtin]) {
        let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
        eprintln!(
            "heap-profile: phase={}, inputs={} (aggregate), out={}",
            phase_name,
            inputs.len(),
            out_dir.display()
        );

        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();

        for input in &inputs {
            eprintln!("  profiling: {}", input.name());
            profile_input(input, phase);
        }

        eprintln!(
            "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
            json_path.display()
        );
        return;
    }

    // Per-file mode (default): spawn a child process per file for clean DHAT sessions.
    let self_exe = std::env::current_exe().unwrap_or_else(|e| {
        eprintln!("Failed to determine own executable path: {}", e);
        std::process::exit(1);
    });

    eprintln!(
        "heap-profile: phase={}, inputs={} (per-file), out={}",
        phase_name,
        inputs.len(),
        out_dir.display()
    );

    let mut any_failed = false;
    for input in &inputs {
        let Input::File(path) = input else { continue };
        let name = input.name();
        eprintln!(
            "  profiling: {} -> dhat-{}-{}.json",
            path.display(),
            phase_name,
            name
        );

        let status = Command::new(&self_exe)
            .arg("--single-input")
            .arg("--phase")
            .arg(phase_name)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg(path)
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                eprintln!("    FAILED (exit {})", s.code().unwrap_or(-1));
                any_failed = true;
            }
            Err(e) => {
                eprintln!("    FAILED to spawn: {}", e);
                any_failed = true;
            }
        }
    }

    eprintln!();
    eprintln!("Profiles saved to {}:", out_dir.display());
    for input in &inputs {
        let json_path = out_dir.join(format!("dhat-{phase_name}-{}.json", input.name()));
        if json_path.exists() {
            eprintln!("  {}", json_path.display());
        }
    }
    eprintln!();
    eprintln!("Open in https://nnethercote.github.io/dh_view/dh_view.html");

    if any_failed {
        std::process::exit(1);
    }
}
