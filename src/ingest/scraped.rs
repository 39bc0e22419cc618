/// Scraped source: one global figure pulled out of a news page.
///
/// The page carries a sentence of the form
///
///   "There are currently 1,200 confirmed cases worldwide, including 34 fatalities."
///
/// in the first bold child of a paragraph somewhere under a container with
/// a known attribute (the "landmark"). The document is searched depth-first
/// and the first matching paragraph wins.
///
/// A page without the landmark is not an error: `collect` succeeds and
/// `records()` is empty, which the poll loop treats as "no update".

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DataSource, Fetch, HttpFetcher, LastKnown};
use crate::error::FetchError;
use crate::model::{Fingerprint, Record, Snapshot, MAX_COUNT};

pub const DEFAULT_SCRAPED_URL: &str =
    "https://bnonews.com/index.php/2020/01/the-latest-coronavirus-cases/";

/// Country name given to the single aggregate record.
pub const GLOBAL_COUNTRY: &str = "Global";

static SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"There are currently ([\d,]+) confirmed cases worldwide, including ([\d,]+) fatalities",
    )
    .expect("sentence pattern is valid")
});

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// Where in the markup the aggregate sentence lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Landmark {
    /// Attribute identifying the container, e.g. `id` or `class`.
    pub container_attribute: String,
    pub container_value: String,
    pub paragraph_tag: String,
    /// Inline tags considered "notable" inside the paragraph.
    pub inline_tags: Vec<String>,
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            container_attribute: "id".to_string(),
            container_value: "mvp-content-main".to_string(),
            paragraph_tag: "p".to_string(),
            inline_tags: vec!["strong".to_string(), "b".to_string()],
        }
    }
}

impl Landmark {
    fn is_container(&self, element: &ElementRef<'_>) -> bool {
        let Some(value) = element.value().attr(&self.container_attribute) else {
            return false;
        };
        if self.container_attribute == "class" {
            value.split_whitespace().any(|class| class == self.container_value)
        } else {
            value == self.container_value
        }
    }

    fn is_notable_inline(&self, element: &ElementRef<'_>) -> bool {
        let name = element.value().name();
        self.inline_tags.iter().any(|tag| tag == name)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Confirmed cases and deaths from the aggregate sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateCounts {
    pub confirmed_cases: u64,
    pub deaths: u64,
}

/// Pulls the two figures out of the sentence. Thousands separators are
/// stripped; a figure that still fails to parse, or exceeds `MAX_COUNT`,
/// degrades to 0.
pub fn extract_counts(text: &str) -> Option<AggregateCounts> {
    let captures = SENTENCE.captures(text)?;
    let number = |idx: usize| {
        captures
            .get(idx)
            .map(|m| m.as_str().replace(',', ""))
            .and_then(|digits| digits.parse::<u64>().ok())
            .filter(|count| *count <= MAX_COUNT)
            .unwrap_or(0)
    };

    Some(AggregateCounts {
        confirmed_cases: number(1),
        deaths: number(2),
    })
}

/// Depth-first search for the landmark paragraph. Returns the counts from
/// the first paragraph whose notable inline child holds the sentence.
pub fn find_counts(document: &Html, landmark: &Landmark) -> Option<AggregateCounts> {
    search(document.root_element(), landmark, false)
}

fn search(
    element: ElementRef<'_>,
    landmark: &Landmark,
    inside_container: bool,
) -> Option<AggregateCounts> {
    let inside_container = inside_container || landmark.is_container(&element);

    if inside_container && element.value().name() == landmark.paragraph_tag {
        let counts = element
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| landmark.is_notable_inline(child))
            .and_then(|inline| extract_counts(&inline.text().collect::<String>()));
        if counts.is_some() {
            return counts;
        }
    }

    element
        .children()
        .filter_map(ElementRef::wrap)
        .find_map(|child| search(child, landmark, inside_container))
}

fn aggregate_record(counts: AggregateCounts, stamped: bool) -> Record {
    Record {
        province: String::new(),
        country: GLOBAL_COUNTRY.to_string(),
        last_updated: stamped.then(Utc::now),
        confirmed_cases: counts.confirmed_cases,
        deaths: counts.deaths,
        recovered: None,
    }
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Aggregate source backed by a news page.
pub struct ScrapedSource<F: Fetch = HttpFetcher> {
    fetcher: F,
    url: String,
    landmark: Landmark,
    records: Snapshot,
}

impl ScrapedSource<HttpFetcher> {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(
            HttpFetcher::new()?,
            DEFAULT_SCRAPED_URL,
            Landmark::default(),
        ))
    }
}

impl<F: Fetch> ScrapedSource<F> {
    pub fn with_fetcher(fetcher: F, url: impl Into<String>, landmark: Landmark) -> Self {
        Self {
            fetcher,
            url: url.into(),
            landmark,
            records: Vec::new(),
        }
    }

    fn counts(&self) -> Option<AggregateCounts> {
        self.records.first().map(|r| AggregateCounts {
            confirmed_cases: r.confirmed_cases,
            deaths: r.deaths,
        })
    }
}

impl<F: Fetch> DataSource for ScrapedSource<F> {
    fn collect(&mut self) -> Result<(), FetchError> {
        let body = self.fetcher.get(&self.url)?;
        let document = Html::parse_document(&String::from_utf8_lossy(&body));

        self.records = match find_counts(&document, &self.landmark) {
            Some(counts) => {
                debug!(
                    url = %self.url,
                    cases = counts.confirmed_cases,
                    deaths = counts.deaths,
                    "extracted aggregate"
                );
                vec![aggregate_record(counts, true)]
            }
            None => {
                warn!(url = %self.url, "landmark not found in page");
                Vec::new()
            }
        };
        Ok(())
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        self.counts().map(|c| Fingerprint::Aggregate {
            confirmed_cases: c.confirmed_cases,
            deaths: c.deaths,
        })
    }

    fn persisted_state(&self) -> Option<Vec<u8>> {
        self.counts()
            .map(|c| format!("{},{}\n", c.confirmed_cases, c.deaths).into_bytes())
    }

    fn restore(&self, blob: &[u8]) -> Option<LastKnown> {
        let text = String::from_utf8_lossy(blob);
        let (cases, deaths) = text.trim().split_once(',')?;
        let counts = AggregateCounts {
            confirmed_cases: cases.trim().parse().ok()?,
            deaths: deaths.trim().parse().ok()?,
        };

        Some(LastKnown {
            fingerprint: Fingerprint::Aggregate {
                confirmed_cases: counts.confirmed_cases,
                deaths: counts.deaths,
            },
            snapshot: vec![aggregate_record(counts, false)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    struct PageFetch(Result<&'static str, u16>);

    impl Fetch for PageFetch {
        fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            match self.0 {
                Ok(page) => Ok(page.as_bytes().to_vec()),
                Err(status) => Err(FetchError::Status { url: url.to_string(), status }),
            }
        }
    }

    fn source(page: Result<&'static str, u16>) -> ScrapedSource<PageFetch> {
        ScrapedSource::with_fetcher(
            PageFetch(page),
            "http://example.test/news",
            Landmark::default(),
        )
    }

    #[test]
    fn test_extract_counts_strips_separators() {
        let counts = extract_counts(
            "There are currently 1,200 confirmed cases worldwide, including 34 fatalities.",
        )
        .unwrap();
        assert_eq!(counts, AggregateCounts { confirmed_cases: 1200, deaths: 34 });
    }

    #[test]
    fn test_extract_counts_no_sentence() {
        assert!(extract_counts("Cases are rising worldwide.").is_none());
    }

    #[test]
    fn test_extract_counts_degrades_to_zero() {
        let counts = extract_counts(
            "There are currently , confirmed cases worldwide, including 7 fatalities.",
        )
        .unwrap();
        assert_eq!(counts.confirmed_cases, 0);
        assert_eq!(counts.deaths, 7);
    }

    #[test]
    fn test_extract_counts_beyond_i64_are_zero() {
        let counts = extract_counts(
            "There are currently 10,000,000,000,000,000,000 confirmed cases worldwide, \
             including 9,223,372,036,854,775,807 fatalities.",
        )
        .unwrap();
        assert_eq!(counts.confirmed_cases, 0);
        assert_eq!(counts.deaths, MAX_COUNT);
    }

    #[test]
    fn test_first_match_wins() {
        let document = Html::parse_document(fixture_news_page_html());
        let counts = find_counts(&document, &Landmark::default()).unwrap();
        assert_eq!(counts.confirmed_cases, 1200);
        assert_eq!(counts.deaths, 34);
    }

    #[test]
    fn test_sentence_outside_container_is_ignored() {
        let document = Html::parse_document(fixture_news_page_without_landmark_html());
        assert!(find_counts(&document, &Landmark::default()).is_none());
    }

    #[test]
    fn test_nested_landmark_with_bold_tag() {
        let document = Html::parse_document(fixture_nested_landmark_html());
        let counts = find_counts(&document, &Landmark::default()).unwrap();
        assert_eq!(counts, AggregateCounts { confirmed_cases: 1_234_567, deaths: 67_890 });
    }

    #[test]
    fn test_class_landmark() {
        let html = concat!(
            r#"<div class="post entry"><p><strong>"#,
            "There are currently 3 confirmed cases worldwide, including 0 fatalities.",
            "</strong></p></div>",
        );
        let landmark = Landmark {
            container_attribute: "class".to_string(),
            container_value: "entry".to_string(),
            ..Landmark::default()
        };
        let counts = find_counts(&Html::parse_document(html), &landmark).unwrap();
        assert_eq!(counts.confirmed_cases, 3);
    }

    #[test]
    fn test_collect_builds_global_record() {
        let mut source = source(Ok(fixture_news_page_html()));
        source.collect().unwrap();

        let records = source.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country, GLOBAL_COUNTRY);
        assert_eq!(records[0].province, "");
        assert_eq!(records[0].confirmed_cases, 1200);
        assert_eq!(records[0].deaths, 34);
        assert_eq!(records[0].recovered, None);
        assert!(records[0].last_updated.is_some());
        assert_eq!(
            source.fingerprint(),
            Some(Fingerprint::Aggregate { confirmed_cases: 1200, deaths: 34 })
        );
    }

    #[test]
    fn test_missing_landmark_is_empty_success() {
        let mut source = source(Ok(fixture_news_page_without_landmark_html()));
        assert!(source.collect().is_ok());
        assert!(source.records().is_empty());
        assert!(source.fingerprint().is_none());
        assert!(source.persisted_state().is_none());
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let mut source = source(Err(502));
        assert!(matches!(source.collect(), Err(FetchError::Status { status: 502, .. })));
    }

    #[test]
    fn test_persisted_state_round_trips_through_restore() {
        let mut source = source(Ok(fixture_news_page_html()));
        source.collect().unwrap();

        let blob = source.persisted_state().unwrap();
        assert_eq!(blob, b"1200,34\n");

        let restored = source.restore(&blob).unwrap();
        assert_eq!(restored.fingerprint, source.fingerprint().unwrap());
        assert_eq!(restored.snapshot[0].confirmed_cases, 1200);
        assert!(restored.snapshot[0].last_updated.is_none());
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let source = source(Ok(""));
        assert!(source.restore(b"not counts").is_none());
        assert!(source.restore(b"12,x").is_none());
    }
}
