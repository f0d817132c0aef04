//! Typed element index over a COLLADA document.
//!
//! The raw markup is tokenized once with `nom` and stored in an arena of
//! [`Element`]s. Lookups by tag name, by attribute and by `#id` reference go
//! through the index instead of re-walking the text.

use std::borrow::Cow;
use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::map,
    multi::many0,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{ColladaError, ColladaResult};

/// Handle to an element inside the [`Document`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

/// One markup element: tag, attributes, children and its own text content.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ElementId>,
    text: String,
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text directly inside this element, entities decoded.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// Parsed document with tag and id indexes.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
    roots: Vec<ElementId>,
    ids: HashMap<String, ElementId>,
    tags: HashMap<String, Vec<ElementId>>,
}

impl Document {
    /// Build the index from raw markup.
    pub fn parse(text: &str) -> ColladaResult<Self> {
        let mut document = Self::default();
        let mut open: Vec<ElementId> = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let offset = text.len() - rest.len();
            let (next, parsed) = token(rest).map_err(|_| ColladaError::Markup { offset })?;
            rest = next;

            match parsed {
                Token::Open {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let id = document.push(name, &attributes, open.last().copied());
                    if !self_closing {
                        open.push(id);
                    }
                }
                Token::Close(name) => {
                    let Some(current) = open.pop() else {
                        return Err(ColladaError::UnbalancedTag {
                            expected: String::new(),
                            found: name.to_string(),
                        });
                    };
                    let expected = &document.elements[current.0].tag;
                    if expected != name {
                        return Err(ColladaError::UnbalancedTag {
                            expected: expected.clone(),
                            found: name.to_string(),
                        });
                    }
                }
                Token::Text(raw) => {
                    if let Some(&current) = open.last() {
                        document.elements[current.0]
                            .text
                            .push_str(&decode_entities(raw));
                    }
                }
                Token::CData(raw) => {
                    if let Some(&current) = open.last() {
                        document.elements[current.0].text.push_str(raw);
                    }
                }
                Token::Skip => {}
            }
        }

        if let Some(&unclosed) = open.last() {
            return Err(ColladaError::UnbalancedTag {
                expected: document.elements[unclosed.0].tag.clone(),
                found: "end of document".to_string(),
            });
        }

        Ok(document)
    }

    fn push(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        parent: Option<ElementId>,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        let attributes: Vec<(String, String)> = attributes
            .iter()
            .map(|(key, value)| (key.to_string(), decode_entities(value).into_owned()))
            .collect();

        if let Some((_, value)) = attributes.iter().find(|(key, _)| key == "id") {
            self.ids.entry(value.clone()).or_insert(id);
        }
        self.tags.entry(name.to_string()).or_default().push(id);

        self.elements.push(Element {
            tag: name.to_string(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        });
        match parent {
            Some(parent) => self.elements[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// The first top-level element, if any.
    pub fn root(&self) -> Option<ElementId> {
        self.roots.first().copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Panics if `id` was produced by a different document.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    /// Every element with this tag anywhere in the document, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> &[ElementId] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct children of `parent` with this tag, in document order.
    pub fn children_by_tag(&self, parent: ElementId, tag: &str) -> Vec<ElementId> {
        self.children_where(parent, tag, &[])
    }

    /// Direct children of `parent` with this tag whose attributes match every
    /// `(name, value)` pair in `filter`.
    pub fn children_where(
        &self,
        parent: ElementId,
        tag: &str,
        filter: &[(&str, &str)],
    ) -> Vec<ElementId> {
        self.element(parent)
            .children
            .iter()
            .copied()
            .filter(|&child| {
                let element = self.element(child);
                element.tag == tag
                    && filter
                        .iter()
                        .all(|(name, value)| element.attribute(name) == Some(*value))
            })
            .collect()
    }

    pub fn first_child(&self, parent: ElementId, tag: &str) -> Option<ElementId> {
        self.element(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.element(child).tag == tag)
    }

    /// Look up an element by `id`, accepting both `name` and `#name`.
    pub fn resolve_ref(&self, reference: &str) -> Option<ElementId> {
        self.ids.get(strip_ref(reference)).copied()
    }
}

/// Drop the `#` of a URL fragment reference.
pub fn strip_ref(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}

#[derive(Debug)]
enum Token<'a> {
    Open {
        name: &'a str,
        attributes: Vec<(&'a str, &'a str)>,
        self_closing: bool,
    },
    Close(&'a str),
    Text(&'a str),
    CData(&'a str),
    Skip,
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((comment, cdata, declaration, close_tag, open_tag, text))(input)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
    ))(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = preceded(multispace1, name)(input)?;
    let (input, _) = delimited(multispace0, char('='), multispace0)(input)?;
    let (input, value) = quoted(input)?;
    Ok((input, (key, value)))
}

fn open_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (input, name) = preceded(char('<'), name)(input)?;
    let (input, attributes) = many0(attribute)(input)?;
    let (input, end) = preceded(multispace0, alt((tag("/>"), tag(">"))))(input)?;
    Ok((
        input,
        Token::Open {
            name,
            attributes,
            self_closing: end == "/>",
        },
    ))
}

fn close_tag(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("</"), name, preceded(multispace0, char('>'))),
        Token::Close,
    )(input)
}

fn comment(input: &str) -> IResult<&str, Token<'_>> {
    map(tuple((tag("<!--"), take_until("-->"), tag("-->"))), |_| {
        Token::Skip
    })(input)
}

fn cdata(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("<![CDATA["), take_until("]]>"), tag("]]>")),
        Token::CData,
    )(input)
}

// Processing instructions and DOCTYPE.
fn declaration(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(tuple((tag("<?"), take_until("?>"), tag("?>"))), |_| {
            Token::Skip
        }),
        map(tuple((tag("<!"), take_until(">"), tag(">"))), |_| {
            Token::Skip
        }),
    ))(input)
}

fn text(input: &str) -> IResult<&str, Token<'_>> {
    map(take_till1(|c: char| c == '<'), Token::Text)(input)
}

fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => entity.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- exported -->
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
  <library_geometries>
    <geometry id="cube" name='Cube'>
      <mesh/>
    </geometry>
    <geometry id="plane"><mesh></mesh></geometry>
  </library_geometries>
  <asset><title>a &amp; b &#x41;</title></asset>
</COLLADA>"#;

    #[test]
    fn test_parse_builds_tree() {
        let doc = Document::parse(SAMPLE).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.element(root).tag(), "COLLADA");
        assert_eq!(doc.element(root).attribute("version"), Some("1.4.1"));

        let libraries = doc.children_by_tag(root, "library_geometries");
        assert_eq!(libraries.len(), 1);
        let geometries = doc.children_by_tag(libraries[0], "geometry");
        assert_eq!(geometries.len(), 2);
        assert_eq!(doc.element(geometries[0]).attribute("name"), Some("Cube"));
        assert!(doc.first_child(geometries[0], "mesh").is_some());
    }

    #[test]
    fn test_children_where_filters_by_attribute() {
        let doc = Document::parse(SAMPLE).unwrap();
        let library = doc.elements_by_tag("library_geometries")[0];
        let plane = doc.children_where(library, "geometry", &[("id", "plane")]);
        assert_eq!(plane.len(), 1);
        assert!(doc
            .children_where(library, "geometry", &[("id", "missing")])
            .is_empty());
    }

    #[test]
    fn test_absent_tag_is_empty() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert!(doc.elements_by_tag("scene").is_empty());
        let root = doc.root().unwrap();
        assert!(doc.children_by_tag(root, "scene").is_empty());
    }

    #[test]
    fn test_resolve_ref() {
        let doc = Document::parse(SAMPLE).unwrap();
        let by_hash = doc.resolve_ref("#cube").unwrap();
        let by_name = doc.resolve_ref("cube").unwrap();
        assert_eq!(by_hash, by_name);
        assert_eq!(doc.element(by_hash).tag(), "geometry");
        assert!(doc.resolve_ref("#nothing").is_none());
    }

    #[test]
    fn test_entities_and_comments() {
        let doc = Document::parse(SAMPLE).unwrap();
        let title = doc.elements_by_tag("title")[0];
        assert_eq!(doc.element(title).text(), "a & b A");
    }

    #[test]
    fn test_cdata_kept_verbatim() {
        let doc = Document::parse("<a><![CDATA[1 < 2]]></a>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.element(root).text(), "1 < 2");
    }

    #[test]
    fn test_unbalanced_tag() {
        let err = Document::parse("<a><b></a>").unwrap_err();
        assert_eq!(
            err,
            ColladaError::UnbalancedTag {
                expected: "b".to_string(),
                found: "a".to_string(),
            }
        );
        assert!(matches!(
            Document::parse("<a>").unwrap_err(),
            ColladaError::UnbalancedTag { .. }
        ));
    }

    #[test]
    fn test_malformed_markup_offset() {
        let err = Document::parse("<a>< b</a>").unwrap_err();
        assert_eq!(err, ColladaError::Markup { offset: 3 });
    }

    #[test]
    fn test_empty_text() {
        let doc = Document::parse("").unwrap();
        assert!(doc.is_empty());
        assert!(doc.root().is_none());
    }
}
