//! Integration tests for extract_records() end-to-end pipeline.
//!
//! Uses a MockExtractor that returns pre-built PageContent without
//! invoking poppler, so these tests run without poppler-utils.

use blotter_core::config::{parse_config_str, EngineConfig};
use blotter_core::error::{BlotterError, PageFault};
use blotter_core::extract_records;
use blotter_core::extraction::{PageContent, PageExtraction, PdfExtractor};
use blotter_core::model::{ImageRegion, Token};
use blotter_core::sink::{RecordNotifier, TextNotifier};
use blotter_core::{PageRange, RecordEngine};

struct MockExtractor {
    pages: Vec<PageExtraction>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, BlotterError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct BrokenExtractor;

impl PdfExtractor for BrokenExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, BlotterError> {
        Err(BlotterError::Extraction("not a PDF".into()))
    }

    fn backend_name(&self) -> &str {
        "broken"
    }
}

/// Build word tokens for rows of text, one row every 18 units from `start`,
/// with a little baseline jitter between words of the same row.
fn tokens(start: f32, rows: &[&str]) -> Vec<Token> {
    let mut out = Vec::new();
    for (row, text) in rows.iter().enumerate() {
        let top = start + row as f32 * 18.0;
        for (col, word) in text.split_whitespace().enumerate() {
            let jitter = if col % 2 == 0 { 0.0 } else { 1.2 };
            out.push(Token::new(word, top + jitter, 36.0 + col as f32 * 40.0));
        }
    }
    out
}

fn page(number: usize, tokens: Vec<Token>, images: Vec<ImageRegion>) -> PageExtraction {
    Ok(PageContent {
        page_number: number,
        tokens,
        fallback_text: String::new(),
        images,
    })
}

fn engine() -> RecordEngine {
    RecordEngine::new(&EngineConfig::default()).unwrap()
}

const SMITH: &str = "SMITH, JOHN A 01/02/2024 03:15:00 PM 01/02/1990 M COUNTY PD";
const DOE: &str = "DOE, JANE MARIE 01/02/2024 04:40:12 PM 11/23/1979 F GRAND JUNCTION PD";
const ROE: &str = "ROE, RICHARD 01/03/2024 01:05:44 AM 3/9/2001 M MESA COUNTY SHERIFF";

// ---------------------------------------------------------------------------
// Test 1: Two records on one page, positioned mugshots
// ---------------------------------------------------------------------------
#[test]
fn positioned_mugshots_follow_their_rows() {
    let extractor = MockExtractor {
        pages: vec![page(
            1,
            tokens(
                100.0,
                &[
                    "Mesa County Sheriff's Office",
                    "Name Booking Date DOB Gender Arresting Agency",
                    SMITH,
                    "Charge Description",
                    "State Theft $300-$1000",
                    "2700 NORTH AVE",
                    "State Criminal Mischief",
                    DOE,
                    "State DUI",
                    "Page 1 of 2",
                ],
            ),
            // listed bottom image first
            vec![
                ImageRegion::positioned(b"doe".to_vec(), 230.0),
                ImageRegion::positioned(b"smith".to_vec(), 140.0),
            ],
        )],
    };

    let doc = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();

    assert_eq!(doc.pairs.len(), 2);
    assert!(doc.faults.is_empty());

    let smith = &doc.pairs[0];
    assert_eq!(smith.record.name, "SMITH, JOHN A");
    assert_eq!(
        smith.record.charges,
        vec!["State Theft $300-$1000", "State Criminal Mischief"]
    );
    assert_eq!(smith.image.as_deref(), Some(&b"smith"[..]));

    let doe = &doc.pairs[1];
    assert_eq!(doe.record.name, "DOE, JANE MARIE");
    assert_eq!(doe.record.brought_by, "GRAND JUNCTION PD");
    assert_eq!(doe.record.charges, vec!["State DUI"]);
    assert_eq!(doe.image.as_deref(), Some(&b"doe"[..]));
}

// ---------------------------------------------------------------------------
// Test 2: Unpositioned images pair by index, in page order across pages
// ---------------------------------------------------------------------------
#[test]
fn unpositioned_images_pair_in_sequence() {
    let extractor = MockExtractor {
        pages: vec![
            page(
                1,
                tokens(80.0, &[SMITH, DOE]),
                vec![
                    ImageRegion::unpositioned(b"first".to_vec()),
                    ImageRegion::positioned(b"second".to_vec(), 80.0),
                ],
            ),
            page(2, tokens(80.0, &[ROE, "State Trespass"]), vec![]),
        ],
    };

    let doc = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();

    let summary: Vec<(usize, &str, Option<&[u8]>)> = doc
        .pairs
        .iter()
        .map(|p| (p.page_number, p.record.name.as_str(), p.image.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "SMITH, JOHN A", Some(&b"first"[..])),
            (1, "DOE, JANE MARIE", Some(&b"second"[..])),
            (2, "ROE, RICHARD", None),
        ]
    );
    assert!(doc.pairs[0].record.charges.is_empty());
    assert_eq!(doc.pairs[2].record.charges, vec!["State Trespass"]);
}

// ---------------------------------------------------------------------------
// Test 3: Plain-text fallback when a page has no word tokens
// ---------------------------------------------------------------------------
#[test]
fn fallback_text_page_still_yields_records() {
    let extractor = MockExtractor {
        pages: vec![Ok(PageContent {
            page_number: 1,
            tokens: vec![],
            fallback_text: format!("{SMITH}\nState Theft\n\n123 MAIN ST\n{ROE}\n"),
            images: vec![ImageRegion::positioned(b"img".to_vec(), 500.0)],
        })],
    };

    let doc = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();

    assert_eq!(doc.pairs.len(), 2);
    assert_eq!(doc.pairs[0].record.charges, vec!["State Theft"]);
    assert!(doc.pairs[1].record.charges.is_empty());
    // all rows sit at 0, so the first record claims the only image
    assert_eq!(doc.pairs[0].image.as_deref(), Some(&b"img"[..]));
    assert_eq!(doc.pairs[1].image, None);
}

// ---------------------------------------------------------------------------
// Test 4: A faulty page is reported and skipped
// ---------------------------------------------------------------------------
#[test]
fn page_fault_is_reported_and_skipped() {
    let extractor = MockExtractor {
        pages: vec![
            page(1, tokens(100.0, &[SMITH]), vec![]),
            Err(PageFault::new(2, "malformed word data")),
            page(3, tokens(100.0, &[ROE]), vec![]),
        ],
    };

    let doc = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();

    assert_eq!(doc.pairs.len(), 2);
    assert_eq!(doc.pages_processed, 2);
    assert_eq!(doc.faults.len(), 1);
    assert_eq!(doc.faults[0].page_number, 2);
    assert_eq!(doc.faults[0].to_string(), "page 2: malformed word data");
}

// ---------------------------------------------------------------------------
// Test 5: Document-level failure is an error
// ---------------------------------------------------------------------------
#[test]
fn document_failure_is_an_error() {
    let result = extract_records(&[], &BrokenExtractor, &engine(), PageRange::all());
    assert!(matches!(result, Err(BlotterError::Extraction(_))));
}

// ---------------------------------------------------------------------------
// Test 6: Bounded page range keeps earlier output intact
// ---------------------------------------------------------------------------
#[test]
fn page_range_stops_early() {
    let pages = vec![
        page(1, tokens(100.0, &[SMITH]), vec![]),
        page(2, tokens(100.0, &[DOE]), vec![]),
        page(3, tokens(100.0, &[ROE]), vec![]),
    ];
    let extractor = MockExtractor { pages };

    let full = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();
    let partial =
        extract_records(&[], &extractor, &engine(), PageRange::new(None, Some(2))).unwrap();

    assert_eq!(partial.pairs.len(), 2);
    assert_eq!(partial.pairs[..], full.pairs[..2]);
}

// ---------------------------------------------------------------------------
// Test 7: Re-running on unchanged input gives identical output
// ---------------------------------------------------------------------------
#[test]
fn pipeline_is_idempotent() {
    let extractor = MockExtractor {
        pages: vec![page(
            1,
            tokens(100.0, &[SMITH, "State Theft", DOE, ROE]),
            vec![
                ImageRegion::positioned(b"a".to_vec(), 300.0),
                ImageRegion::positioned(b"b".to_vec(), 90.0),
                ImageRegion::positioned(b"c".to_vec(), 150.0),
            ],
        )],
    };
    let e = engine();

    let first = extract_records(&[], &extractor, &e, PageRange::all()).unwrap();
    let second = extract_records(&[], &extractor, &e, PageRange::all()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Test 8: Config-driven grammar and tolerance
// ---------------------------------------------------------------------------
#[test]
fn custom_config_changes_grammar() {
    let config = parse_config_str(
        r#"{
            "line_tolerance": 0.5,
            "grammar": { "charge_prefix": "Municipal " }
        }"#,
    )
    .unwrap();
    let e = RecordEngine::new(&config).unwrap();

    let extractor = MockExtractor {
        pages: vec![page(
            1,
            tokens(100.0, &[SMITH, "State Theft", "Municipal Trespass"]),
            vec![],
        )],
    };
    let doc = extract_records(&[], &extractor, &e, PageRange::all()).unwrap();

    // 1.2 jitter splits rows at tolerance 0.5, so no row matches the grammar
    assert!(doc.pairs.is_empty());

    let flat = MockExtractor {
        pages: vec![page(
            1,
            vec![
                Token::new(SMITH, 100.0, 36.0),
                Token::new("State Theft", 118.0, 36.0),
                Token::new("Municipal Trespass", 136.0, 36.0),
            ],
            vec![],
        )],
    };
    let doc = extract_records(&[], &flat, &e, PageRange::all()).unwrap();
    assert_eq!(doc.pairs.len(), 1);
    assert_eq!(doc.pairs[0].record.charges, vec!["Municipal Trespass"]);
}

// ---------------------------------------------------------------------------
// Test 9: A configured pattern without anchors still matches whole lines only
// ---------------------------------------------------------------------------
#[test]
fn unanchored_record_pattern_matches_whole_lines() {
    let pattern = concat!(
        r"(?P<name>[A-Z ,]+)\s+(?P<booked>\S+ \S+ [AP]M)\s+",
        r"(?P<dob>\S+)\s+(?P<gender>[A-Z])\s+(?P<brought>.+)"
    );
    let json = serde_json::json!({ "grammar": { "record_start": pattern } });
    let config = parse_config_str(&json.to_string()).unwrap();
    let e = RecordEngine::new(&config).unwrap();

    let flat = MockExtractor {
        pages: vec![page(
            1,
            vec![
                Token::new(format!("Previously held: {SMITH}"), 100.0, 36.0),
                Token::new(DOE, 118.0, 36.0),
            ],
            vec![],
        )],
    };
    let doc = extract_records(&[], &flat, &e, PageRange::all()).unwrap();
    assert_eq!(doc.pairs.len(), 1);
    assert_eq!(doc.pairs[0].record.name, "DOE, JANE MARIE");
}

// ---------------------------------------------------------------------------
// Test 10: Records stream to a notifier in output order
// ---------------------------------------------------------------------------
#[test]
fn notifier_receives_records_in_order() {
    let extractor = MockExtractor {
        pages: vec![page(1, tokens(100.0, &[SMITH, DOE]), vec![])],
    };
    let doc = extract_records(&[], &extractor, &engine(), PageRange::all()).unwrap();

    let mut notifier = TextNotifier::new(Vec::new());
    for pair in &doc.pairs {
        notifier.notify(pair).unwrap();
    }
    let text = String::from_utf8(notifier.into_inner()).unwrap();
    let smith = text.find("== SMITH, JOHN A ==").unwrap();
    let doe = text.find("== DOE, JANE MARIE ==").unwrap();
    assert!(smith < doe);
}
