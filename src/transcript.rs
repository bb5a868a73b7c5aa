use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::fetch::PageFetcher;
use crate::{Error, TranscriptFragment};

const DEFAULT_TIMING: &str = "0";

/// Fetch a caption track and parse it into fragments
pub async fn fetch_fragments(fetcher: &dyn PageFetcher, source_url: &str) -> Result<Vec<TranscriptFragment>, Error> {
    let caption_xml = fetcher.fetch_text(source_url).await?;
    let fragments = parse_timed_text(&caption_xml)?;
    debug!("Parsed {} caption fragments from {source_url}", fragments.len());
    Ok(fragments)
}

/// A `<text>` element whose closing tag has not been seen yet
struct OpenFragment {
    start: String,
    duration: String,
    text: String,
    depth: usize,
}

impl OpenFragment {
    fn finish(self) -> TranscriptFragment {
        TranscriptFragment::new(self.start, self.duration, sanitize(&self.text))
    }
}

/// Parse a timed-text document. Every `<text>` element becomes one fragment, in document order.
pub fn parse_timed_text(xml: &str) -> Result<Vec<TranscriptFragment>, Error> {
    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();
    let mut open: Option<OpenFragment> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match open.as_mut() {
                Some(fragment) => fragment.depth += 1,
                None if e.name().as_ref() == b"text" => {
                    let (start, duration) = timing(e);
                    open = Some(OpenFragment {
                        start,
                        duration,
                        text: String::new(),
                        depth: 0,
                    });
                }
                None => {}
            },
            Ok(Event::Empty(ref e)) if open.is_none() && e.name().as_ref() == b"text" => {
                let (start, duration) = timing(e);
                fragments.push(TranscriptFragment::new(start, duration, ""));
            }
            Ok(Event::Text(ref e)) => {
                if let Some(fragment) = open.as_mut() {
                    let raw_text = e
                        .unescape()
                        .map_err(|err| Error::Parse(format!("bad caption text: {err}")))?;
                    fragment.text.push_str(&raw_text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(fragment) = open.as_mut() {
                    fragment.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => match open.take() {
                Some(fragment) if fragment.depth == 0 => fragments.push(fragment.finish()),
                Some(mut fragment) => {
                    fragment.depth -= 1;
                    open = Some(fragment);
                }
                None => {}
            },
            Ok(Event::Eof) => break,
            Err(e) if fragments.is_empty() && open.is_none() => {
                debug!("Caption document has no timed text: {e}");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::Parse(format!(
                    "caption XML broke after {} fragments: {e}",
                    fragments.len()
                )));
            }
            _ => {}
        }
    }

    Ok(fragments)
}

fn timing(element: &BytesStart<'_>) -> (String, String) {
    let mut start = None;
    let mut duration = None;
    for attr in element.attributes().flatten() {
        match attr.key.as_ref() {
            b"start" => start = Some(String::from_utf8_lossy(&attr.value).to_string()),
            b"dur" => duration = Some(String::from_utf8_lossy(&attr.value).to_string()),
            _ => {}
        }
    }
    (
        start.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_TIMING.to_string()),
        duration.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_TIMING.to_string()),
    )
}

/// Captions double-encode entities; newlines become spaces so each fragment fits on one line.
fn sanitize(raw: &str) -> String {
    html_escape::decode_html_entities(raw)
        .replace('\n', " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;

    #[test]
    fn test_parse_timed_text_basic() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">Hello world</text>
    <text start="2.55" dur="1.50">This is a test</text>
</transcript>"#;

        let fragments = parse_timed_text(xml).unwrap();
        assert_eq!(
            fragments,
            vec![
                TranscriptFragment::new("0.21", "2.34", "Hello world"),
                TranscriptFragment::new("2.55", "1.50", "This is a test"),
            ]
        );
    }

    #[test]
    fn test_parse_timed_text_html_entities() {
        let xml = r#"<transcript><text start="0.0" dur="1.0">it&amp;#39;s a &amp;quot;test&amp;quot;</text></transcript>"#;

        let fragments = parse_timed_text(xml).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "it's a \"test\"");
    }

    #[test]
    fn test_newlines_become_spaces() {
        let xml = "<transcript><text start=\"1\" dur=\"2\">\n  two\nlines  \n</text></transcript>";
        let fragments = parse_timed_text(xml).unwrap();
        assert_eq!(fragments[0].text, "two lines");
    }

    #[test]
    fn test_missing_attributes_and_text_default() {
        let xml = r#"<transcript><text>no timing</text><text start="4"/><text dur="2"></text></transcript>"#;
        let fragments = parse_timed_text(xml).unwrap();
        assert_eq!(
            fragments,
            vec![
                TranscriptFragment::new("0", "0", "no timing"),
                TranscriptFragment::new("4", "0", ""),
                TranscriptFragment::new("0", "2", ""),
            ]
        );
    }

    #[test]
    fn test_nested_markup_is_part_of_text() {
        let xml = r##"<transcript><text start="0" dur="1">a <font color="#fff">loud</font> word</text></transcript>"##;
        let fragments = parse_timed_text(xml).unwrap();
        assert_eq!(fragments, vec![TranscriptFragment::new("0", "1", "a loud word")]);
    }

    #[test]
    fn test_parse_timed_text_empty() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript></transcript>"#;
        assert!(parse_timed_text(xml).unwrap().is_empty());
    }

    #[test]
    fn test_non_caption_document_is_empty() {
        assert!(parse_timed_text("Service unavailable").unwrap().is_empty());
        assert!(parse_timed_text("<html><body>oops</body></html>").unwrap().is_empty());
    }

    #[test]
    fn test_document_broken_mid_transcript_is_error() {
        let xml = r#"<transcript><text start="0" dur="1">Hi</text><text start="1" dur="1">there</wrong></transcript>"#;
        assert!(matches!(parse_timed_text(xml), Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_fragments() {
        let fetcher = FakeFetcher::default().with(
            "https://x/y",
            r#"<transcript><text start="0" dur="3">Hello</text><text start="3" dur="2">World</text></transcript>"#,
        );
        let fragments = fetch_fragments(&fetcher, "https://x/y").await.unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].text, "World");
    }

    #[tokio::test]
    async fn test_fetch_fragments_missing_track() {
        let fetcher = FakeFetcher::default();
        let result = fetch_fragments(&fetcher, "https://x/missing").await;
        assert!(matches!(result, Err(Error::Fetch { .. })));
    }
}
