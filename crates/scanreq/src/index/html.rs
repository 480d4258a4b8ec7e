//! Parsing of PEP 503 "simple" project pages
use crate::artifacts::Location;
use crate::types::{ArchiveLink, Yanked};
use tl::HTMLTag;
use url::Url;

fn into_archive_link(base: &Url, tag: &HTMLTag) -> Option<ArchiveLink> {
    let attributes = tag.attributes();
    let href = attributes.get("href").flatten()?.as_utf8_str();

    let url = base.join(href.as_ref()).ok()?;
    let filename = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty())?;
    let filename = percent_decode(filename);

    let requires_python = attributes
        .get("data-requires-python")
        .flatten()
        .map(|a| html_escape::decode_html_entities(a.as_utf8_str().as_ref()).into_owned())
        .filter(|a| !a.trim().is_empty());

    // `data-yanked` without a value still marks the file as yanked
    let yanked = match attributes.get("data-yanked") {
        None => Yanked::default(),
        Some(reason) => Yanked {
            yanked: true,
            reason: reason
                .map(|a| html_escape::decode_html_entities(a.as_utf8_str().as_ref()).into_owned())
                .filter(|r| !r.is_empty()),
        },
    };

    Some(ArchiveLink {
        filename,
        url: Location::from(url),
        requires_python,
        yanked,
    })
}

fn percent_decode(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned()
}

/// Parses every `<a href>` of a project page into an [`ArchiveLink`]. Relative links are joined
/// against the page's `<base href>` if it has one, otherwise against `base`.
pub fn parse_archive_links(base: &Url, body: &str) -> Result<Vec<ArchiveLink>, tl::ParseError> {
    let dom = tl::parse(body, tl::ParserOptions::default())?;

    let base = dom
        .query_selector("base")
        .and_then(|mut v| v.next())
        .and_then(|v| v.get(dom.parser()))
        .and_then(|v| v.as_tag())
        .and_then(|v| v.attributes().get("href"))
        .and_then(|v| v.map(|v| v.as_utf8_str().to_string()))
        .and_then(|v| base.join(&v).ok())
        .unwrap_or_else(|| base.clone());

    let Some(anchors) = dom.query_selector("a") else {
        return Ok(Vec::new());
    };

    Ok(anchors
        .filter_map(|a| a.get(dom.parser()))
        .filter_map(|h| h.as_tag())
        .filter_map(|a| into_archive_link(&base, a))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_simple_page() {
        let links = parse_archive_links(
            &Url::parse("https://example.com/old-base/link/").unwrap(),
            r#"<html>
                <head>
                  <meta name="pypi:repository-version" content="1.0">
                  <base href="https://example.com/new-base/">
                </head>
                <body>
                  <a href="link-1.0.tar.gz#sha256=0000000000000000000000000000000000000000000000000000000000000000">link1</a>
                  <a href="/elsewhere/link-2.0.zip" data-yanked="some reason">link2</a>
                  <a href="link-3.0-py3-none-any.whl" data-requires-python="&gt;= 3.17">link3</a>
                  <a href="link-4.0.tar.gz" data-requires-python="" data-yanked>link4</a>
                  <a href="link-1.0%2Blocal.tar.gz">link5</a>
                  <a>no href</a>
                </body>
              </html>
            "#,
        )
        .unwrap();

        let summary = links
            .iter()
            .map(|l| {
                (
                    l.filename.as_str(),
                    l.url.to_string(),
                    l.requires_python.as_deref(),
                    l.yanked.yanked,
                    l.yanked.reason.as_deref(),
                )
            })
            .collect::<Vec<_>>();
        insta::assert_debug_snapshot!(summary, @r###"
        [
            (
                "link-1.0.tar.gz",
                "https://example.com/new-base/link-1.0.tar.gz#sha256=0000000000000000000000000000000000000000000000000000000000000000",
                None,
                false,
                None,
            ),
            (
                "link-2.0.zip",
                "https://example.com/elsewhere/link-2.0.zip",
                None,
                true,
                Some(
                    "some reason",
                ),
            ),
            (
                "link-3.0-py3-none-any.whl",
                "https://example.com/new-base/link-3.0-py3-none-any.whl",
                Some(
                    ">= 3.17",
                ),
                false,
                None,
            ),
            (
                "link-4.0.tar.gz",
                "https://example.com/new-base/link-4.0.tar.gz",
                None,
                true,
                None,
            ),
            (
                "link-1.0+local.tar.gz",
                "https://example.com/new-base/link-1.0%2Blocal.tar.gz",
                None,
                false,
                None,
            ),
        ]
        "###);
    }

    #[test]
    fn filenames_are_percent_decoded() {
        let links = parse_archive_links(
            &Url::parse("https://example.com/simple/torch/").unwrap(),
            r#"<a href="torch-2.1.0+cpu-cp311-cp311-linux_x86_64.whl">a</a>
               <a href="my%20pkg-1.0.tar.gz">b</a>"#,
        )
        .unwrap();
        let filenames: Vec<_> = links.iter().map(|l| l.filename.as_str()).collect();
        assert_eq!(
            filenames,
            ["torch-2.1.0+cpu-cp311-cp311-linux_x86_64.whl", "my pkg-1.0.tar.gz"]
        );
    }

    #[test]
    fn page_without_links() {
        let links = parse_archive_links(
            &Url::parse("https://example.com/simple/empty/").unwrap(),
            "<html><body><p>nothing here</p></body></html>",
        )
        .unwrap();
        assert!(links.is_empty());
    }
}
