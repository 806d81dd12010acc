//! A small owned element tree, parsed in one pass with quick-xml.
//!
//! Import builds the whole tree before touching the Document, so a parse
//! failure anywhere leaves the Document as it was.

use super::CodecError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// An element with its concatenated text and child elements. Attributes are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse an XML string into its root element
pub fn parse(xml: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(malformed(position, "more than one root element"));
                }
                stack.push(Element::new(element_name(e)));
            }
            Ok(Event::Empty(ref e)) => {
                attach(&mut stack, &mut root, Element::new(element_name(e)), position)?;
            }
            Ok(Event::End(_)) => match stack.pop() {
                Some(element) => attach(&mut stack, &mut root, element, position)?,
                None => return Err(malformed(position, "unexpected closing tag")),
            },
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| malformed(position, &err.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed(position, "text outside the root element")),
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&String::from_utf8_lossy(&bytes)),
                    None => return Err(malformed(position, "CDATA outside the root element")),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {
                // Declarations, comments, processing instructions, doctype
            }
            Err(e) => {
                return Err(malformed(reader.buffer_position() as u64, &e.to_string()));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            reader.buffer_position() as u64,
            &format!("unclosed element <{}>", open.name),
        ));
    }

    root.ok_or(CodecError::Empty)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(malformed(position, "more than one root element")),
    }
}

fn malformed(position: u64, message: &str) -> CodecError {
    CodecError::Malformed {
        position,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let root = parse(
            r#"<?xml version="1.0"?>
<journal>
   <title>A &amp; B</title>
   <empty/>
   <article>
      <abstract><![CDATA[x < y]]></abstract>
   </article>
</journal>"#,
        )
        .unwrap();

        assert_eq!(root.name, "journal");
        assert_eq!(root.child("title").unwrap().text, "A & B");
        assert_eq!(root.child("empty").unwrap().text, "");
        let article = root.child("article").unwrap();
        assert_eq!(article.child("abstract").unwrap().text, "x < y");
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn test_children_named_keeps_order() {
        let root = parse("<a><b>1</b><c/><b>2</b><b>3</b></a>").unwrap();
        let texts: Vec<_> = root
            .children_named("b")
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_text_is_verbatim() {
        let root = parse("<a><b>  padded  </b></a>").unwrap();
        assert_eq!(root.child("b").unwrap().text, "  padded  ");
    }

    #[test]
    fn test_malformed_inputs() {
        for bad in [
            "<journal><title></journal>",
            "<journal>",
            "<a/><b/>",
            "text",
            "<journal><title>x</title></journal></extra>",
        ] {
            assert!(
                matches!(parse(bad), Err(CodecError::Malformed { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse(""), Err(CodecError::Empty)));
        assert!(matches!(
            parse("<?xml version=\"1.0\"?>\n<!-- nothing -->\n"),
            Err(CodecError::Empty)
        ));
    }
}
