use notewise::document::{Document, Element, ElementKind, Mark, Node, Text};
use notewise::editor::{self, Editor, Point, Selection};
use notewise::render;
use std::time::{Duration, Instant};

/// Performance benchmark suite for notewise editing operations
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Document rendering performance
/// - Typing into large notes
/// - Mark toggling and paste conversion
/// - JSON persistence
const SMALL_DOC_BLOCKS: usize = 10;
const MEDIUM_DOC_BLOCKS: usize = 100;
const LARGE_DOC_BLOCKS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 20] = [
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "organelle",
];

fn sample_text(words: usize) -> String {
    (0..words)
        .map(|idx| SAMPLE_WORDS[idx % SAMPLE_WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Create a note mixing headings, paragraphs, lists and code blocks
fn create_test_document(num_blocks: usize, avg_words_per_block: usize) -> Document {
    let children: Vec<Node> = (0..num_blocks)
        .map(|idx| -> Node {
            let text = sample_text(avg_words_per_block);
            let kind = match idx % 5 {
                0 => ElementKind::Heading1,
                1 => ElementKind::Heading2,
                2 => ElementKind::Code,
                3 => {
                    return Element::new(
                        ElementKind::UnorderedList,
                        vec![
                            Element::new(ElementKind::ListItem, vec![Node::text(text.clone())])
                                .into(),
                            Element::new(ElementKind::ListItem, vec![Node::text(text)]).into(),
                        ],
                    )
                    .into();
                }
                _ => ElementKind::Paragraph,
            };
            Element::new(kind, vec![Node::text(text)]).into()
        })
        .collect();
    Document::new().with_children(children)
}

/// Create a note where every paragraph carries marks and a link
fn create_styled_document(num_blocks: usize) -> Document {
    let children: Vec<Node> = (0..num_blocks)
        .map(|idx| -> Node {
            let mark = Mark::ALL[idx % Mark::ALL.len()];
            Element::paragraph(vec![
                Node::text(format!("This is paragraph {idx} with ")),
                Text::new("some marked text").with_mark(mark).into(),
                Node::text(" and "),
                Element::link("https://example.com", "a link").into(),
                Node::text("."),
            ])
            .into()
        })
        .collect();
    Document::new().with_children(children)
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sized_documents() -> Vec<(&'static str, Document)> {
    vec![
        ("Small (10 blocks)", create_test_document(SMALL_DOC_BLOCKS, 20)),
        ("Medium (100 blocks)", create_test_document(MEDIUM_DOC_BLOCKS, 20)),
        ("Large (1000 blocks)", create_test_document(LARGE_DOC_BLOCKS, 20)),
    ]
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let result = benchmark(&format!("render_document - {name}"), ITERATIONS, || {
            let _ = render::render_document(&doc, None, 80, None);
        });
        result.print();
    }
}

#[test]
fn bench_rendering_with_highlights() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║        RENDERING WITH MARKS AND HIGHLIGHTS BENCHMARKS          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let doc = create_styled_document(MEDIUM_DOC_BLOCKS);
    let highlight = |text: &str| {
        text.match_indices("organelle")
            .map(|(start, word)| start..start + word.len())
            .collect::<Vec<_>>()
    };

    let plain = benchmark("render_document - highlights OFF", ITERATIONS, || {
        let _ = render::render_document(&doc, None, 80, None);
    });
    plain.print();

    let highlighted = benchmark("render_document - highlights ON", ITERATIONS, || {
        let _ = render::render_document(&doc, None, 80, Some(&highlight));
    });
    highlighted.print();
}

#[test]
fn bench_typing_at_end_of_note() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           TYPING BENCHMARKS                                    ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let mut editor = Editor::new(doc);
        editor.move_to_end();
        let result = benchmark(&format!("insert_text - {name}"), ITERATIONS, || {
            editor.insert_text("x");
        });
        result.print();

        println!("\n💡 NOTE: This operation runs on EVERY keystroke!");
    }
}

#[test]
fn bench_toggle_mark() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           MARK TOGGLE BENCHMARKS                               ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let mut editor = Editor::new(create_test_document(MEDIUM_DOC_BLOCKS, 20));
    editor.set_selection(Selection::new(
        Point::new([4, 0], 6),
        Point::new([4, 0], 40),
    ));

    let result = benchmark("toggle_mark - Medium (100 blocks)", ITERATIONS, || {
        editor.toggle_mark(Mark::Bold);
    });
    result.print();
}

#[test]
fn bench_paste_html() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           PASTE CONVERSION BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let mut html = String::new();
    for idx in 0..50 {
        html.push_str(&format!(
            "<p>Row {idx} <b>bold</b> <a href=\"https://example.com/{idx}\">link</a></p>\n"
        ));
    }
    html.push_str("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>");

    let result = benchmark("html::deserialize - 50 paragraphs + table", ITERATIONS, || {
        let _ = notewise::html::deserialize(&html);
    });
    result.print();
}

#[test]
fn bench_json_persistence() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           JSON PERSISTENCE BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let json = doc.to_json().unwrap();
        let save = benchmark(&format!("to_json - {name}"), ITERATIONS, || {
            let _ = doc.to_json();
        });
        save.print();

        let load = benchmark(&format!("from_json - {name}"), ITERATIONS, || {
            let _ = Document::from_json(&json);
        });
        load.print();
    }
}

#[test]
fn bench_char_to_byte_conversion() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║         CHAR-TO-BYTE CONVERSION BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let text_samples = vec![
        ("Short ASCII (50 chars)", "a".repeat(50)),
        ("Long ASCII (5000 chars)", "a".repeat(5000)),
        ("Medium Unicode (500 chars)", "🔥".repeat(500)),
    ];

    for (name, text) in text_samples {
        let mid_point = text.chars().count() / 2;
        let result = benchmark(
            &format!("char_to_byte_idx - {name}"),
            ITERATIONS * 10,
            || {
                let _ = editor::char_to_byte_idx(&text, mid_point);
            },
        );
        result.print();
    }
}
