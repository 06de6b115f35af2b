use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::PageError;
use crate::wikitext;

/// Raw `<page>` entity as it appears in a MediaWiki dump. Only the fields the
/// pipeline consumes are modeled; the decoder ignores everything else.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Page {
    pub title: String,
    pub ns: String,
    pub redirect: Redirect,
    pub revision: Revision,
}

/// `<redirect title="..."/>`; absent on regular articles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Redirect {
    #[serde(rename = "@title")]
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Revision {
    pub text: RevisionText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevisionText {
    #[serde(rename = "$text")]
    pub body: String,
}

/// A page that survived the article filter: namespace 0 and not a redirect.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub abstract_: String,
    pub body: String,
}

impl Page {
    /// Decodes one raw `<page>…</page>` block.
    pub fn from_xml(raw: &str) -> Result<Page, PageError> {
        Ok(quick_xml::de::from_str(raw)?)
    }

    /// Renders the revision wikitext to `(abstract, body)`. An empty body falls
    /// back to the abstract so downstream scoring always has text to work with.
    pub fn render(&self) -> (String, String) {
        let (abstract_, mut body) = wikitext::render(&self.title, &self.revision.text.body);
        if body.is_empty() {
            body = abstract_.clone();
        }
        (abstract_, body)
    }

    /// Applies the article filter. Pages outside namespace 0 and redirects
    /// yield `None`.
    pub fn into_article(self) -> Option<Article> {
        if self.ns != "0" || !self.redirect.title.is_empty() {
            return None;
        }
        let (abstract_, body) = self.render();
        Some(Article {
            title: self.title,
            abstract_,
            body,
        })
    }
}

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new("[^a-zA-Z0-9]+").expect("valid regex");
}

/// Canonical filename form of a title: lowercased, runs of non-alphanumerics
/// collapsed to a dash, leading and trailing dashes stripped.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = NON_ALNUM.replace_all(&lowered, "-");
    dashed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_XML: &str = r#"<page>
    <title>Rust (programming language)</title>
    <ns>0</ns>
    <id>123</id>
    <revision>
      <id>456</id>
      <text bytes="40" xml:space="preserve">Rust is a systems language.</text>
    </revision>
  </page>"#;

    #[test]
    fn decodes_article_fields() {
        let page = Page::from_xml(ARTICLE_XML).unwrap();
        assert_eq!(page.title, "Rust (programming language)");
        assert_eq!(page.ns, "0");
        assert!(page.redirect.title.is_empty());
        assert_eq!(page.revision.text.body, "Rust is a systems language.");
    }

    #[test]
    fn article_filter_accepts_namespace_zero() {
        let article = Page::from_xml(ARTICLE_XML).unwrap().into_article().unwrap();
        assert_eq!(article.title, "Rust (programming language)");
        assert!(article.body.contains("systems language"));
    }

    #[test]
    fn redirects_are_filtered() {
        let raw = r#"<page>
        <title>Rustlang</title>
        <ns>0</ns>
        <redirect title="Rust (programming language)"/>
        <revision><text>#REDIRECT [[Rust (programming language)]]</text></revision>
      </page>"#;
        assert!(Page::from_xml(raw).unwrap().into_article().is_none());
    }

    #[test]
    fn non_zero_namespaces_are_filtered() {
        let raw = r#"<page>
        <title>Category:Programming</title>
        <ns>14</ns>
        <revision><text>category text</text></revision>
      </page>"#;
        assert!(Page::from_xml(raw).unwrap().into_article().is_none());
    }

    #[test]
    fn empty_body_falls_back_to_abstract() {
        let page = Page {
            title: "T".into(),
            ns: "0".into(),
            ..Page::default()
        };
        let article = page.into_article().unwrap();
        assert_eq!(article.body, article.abstract_);
    }

    #[test]
    fn truncated_xml_is_an_error() {
        assert!(Page::from_xml("<page><title>half a page").is_err());
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Rust (programming language)"), "rust-programming-language");
        assert_eq!(slugify("  --Weird--  Title!?  "), "weird-title");
        assert_eq!(slugify("C++"), "c");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in ["Ada Lovelace", "A/B testing", "!!!", "caf\u{00e9} au lait"] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }
}
