//! quick-xml reader and writer for the suppression file format.

use std::{borrow::Cow, fmt::Display, str::FromStr};

use quick_xml::{
    escape::partial_escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::{
    comparing::DifferenceType,
    suppressions::{Comparison, Suppression, SuppressionFile},
    Error, Result,
};

const ROOT: &str = "ArCompatSuppressions";
const COMPARISON: &str = "Comparison";
const SUPPRESSION: &str = "Suppression";
const LEFT: &str = "Left";
const RIGHT: &str = "Right";
const DIFFERENCE_TYPE: &str = "DifferenceType";
const TYPE_NAME: &str = "TypeName";
const MESSAGE: &str = "Message";

fn writer_error(error: impl Display) -> Error {
    Error::Error(format!("Failed to write suppression XML: {}", error))
}

fn reader_error(error: impl Display) -> Error {
    malformed_error!("Invalid suppression XML: {}", error)
}

/// Serialize `file` as-is; callers sort first.
pub(super) fn write(file: &SuppressionFile) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(writer_error)?;

    if file.comparisons.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(ROOT)))
            .map_err(writer_error)?;
    } else {
        writer
            .write_event(Event::Start(BytesStart::new(ROOT)))
            .map_err(writer_error)?;
        for comparison in &file.comparisons {
            write_comparison(&mut writer, comparison)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(ROOT)))
            .map_err(writer_error)?;
    }

    let mut text = String::from_utf8(writer.into_inner()).map_err(writer_error)?;
    text.push('\n');
    Ok(text)
}

fn write_comparison(writer: &mut Writer<Vec<u8>>, comparison: &Comparison) -> Result<()> {
    let start = BytesStart::new(COMPARISON).with_attributes([
        (LEFT, comparison.left.as_str()),
        (RIGHT, comparison.right.as_str()),
    ]);

    if comparison.suppressions.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(writer_error);
    }

    writer.write_event(Event::Start(start)).map_err(writer_error)?;
    for suppression in &comparison.suppressions {
        write_suppression(writer, suppression)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(COMPARISON)))
        .map_err(writer_error)
}

fn write_suppression(writer: &mut Writer<Vec<u8>>, suppression: &Suppression) -> Result<()> {
    let kind = suppression.difference_type.to_string();
    let start = BytesStart::new(SUPPRESSION).with_attributes([(DIFFERENCE_TYPE, kind.as_str())]);

    if suppression.type_name.is_none() && suppression.message.is_none() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(writer_error);
    }

    writer.write_event(Event::Start(start)).map_err(writer_error)?;
    if let Some(type_name) = &suppression.type_name {
        write_text_element(writer, TYPE_NAME, type_name)?;
    }
    if let Some(message) = &suppression.message {
        write_text_element(writer, MESSAGE, message)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(SUPPRESSION)))
        .map_err(writer_error)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        return writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(writer_error);
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(writer_error)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
        .map_err(writer_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(writer_error)
}

/// Parse a suppression document.
pub(super) fn read(text: &str) -> Result<SuppressionFile> {
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event().map_err(reader_error)? {
            Event::Start(start) => {
                expect_name(&start, ROOT)?;
                return read_root(&mut reader);
            }
            Event::Empty(start) => {
                expect_name(&start, ROOT)?;
                return Ok(SuppressionFile::new());
            }
            Event::Text(text) => expect_whitespace(&text, "before root element")?,
            Event::CData(_) => {
                return Err(malformed_error!("Unexpected character data before root element"))
            }
            Event::End(_) => return Err(malformed_error!("Unexpected closing tag before root element")),
            Event::Eof => {
                return Err(malformed_error!(
                    "Suppression file has no '{}' root element",
                    ROOT
                ))
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

fn read_root(reader: &mut Reader<&[u8]>) -> Result<SuppressionFile> {
    let mut file = SuppressionFile::new();

    loop {
        match reader.read_event().map_err(reader_error)? {
            Event::Start(start) => {
                expect_name(&start, COMPARISON)?;
                let mut comparison = comparison_from(&start)?;
                read_comparison(reader, &mut comparison)?;
                file.comparisons.push(comparison);
            }
            Event::Empty(start) => {
                expect_name(&start, COMPARISON)?;
                file.comparisons.push(comparison_from(&start)?);
            }
            Event::Text(text) => expect_whitespace(&text, ROOT)?,
            Event::CData(_) => {
                return Err(malformed_error!("Unexpected character data inside '{}'", ROOT))
            }
            Event::End(_) => return Ok(file),
            Event::Eof => return Err(malformed_error!("Unexpected end of file inside '{}'", ROOT)),
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

fn comparison_from(start: &BytesStart<'_>) -> Result<Comparison> {
    Ok(Comparison::new(
        required_attribute(start, LEFT)?,
        required_attribute(start, RIGHT)?,
    ))
}

fn read_comparison(reader: &mut Reader<&[u8]>, comparison: &mut Comparison) -> Result<()> {
    loop {
        match reader.read_event().map_err(reader_error)? {
            Event::Start(start) => {
                expect_name(&start, SUPPRESSION)?;
                let mut suppression = suppression_from(&start)?;
                read_suppression(reader, &mut suppression)?;
                comparison.suppressions.push(suppression);
            }
            Event::Empty(start) => {
                expect_name(&start, SUPPRESSION)?;
                comparison.suppressions.push(suppression_from(&start)?);
            }
            Event::Text(text) => expect_whitespace(&text, COMPARISON)?,
            Event::CData(_) => {
                return Err(malformed_error!(
                    "Unexpected character data inside '{}'",
                    COMPARISON
                ))
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(malformed_error!(
                    "Unexpected end of file inside '{}'",
                    COMPARISON
                ))
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

fn suppression_from(start: &BytesStart<'_>) -> Result<Suppression> {
    let kind = required_attribute(start, DIFFERENCE_TYPE)?;
    let difference_type = DifferenceType::from_str(&kind)
        .map_err(|_| malformed_error!("Unknown {} '{}'", DIFFERENCE_TYPE, kind))?;

    Ok(Suppression {
        difference_type,
        type_name: None,
        message: None,
    })
}

/// Reads `TypeName` and `Message`; the first occurrence wins, unknown children are skipped.
fn read_suppression(reader: &mut Reader<&[u8]>, suppression: &mut Suppression) -> Result<()> {
    loop {
        match reader.read_event().map_err(reader_error)? {
            Event::Start(start) => {
                let name = start.name();
                if name.as_ref() == TYPE_NAME.as_bytes() {
                    let text = read_text(reader, TYPE_NAME)?;
                    suppression.type_name.get_or_insert(text);
                } else if name.as_ref() == MESSAGE.as_bytes() {
                    let text = read_text(reader, MESSAGE)?;
                    suppression.message.get_or_insert(text);
                } else {
                    reader.read_to_end(name).map_err(reader_error)?;
                }
            }
            Event::Empty(start) => {
                let name = start.name();
                if name.as_ref() == TYPE_NAME.as_bytes() {
                    suppression.type_name.get_or_insert_with(String::new);
                } else if name.as_ref() == MESSAGE.as_bytes() {
                    suppression.message.get_or_insert_with(String::new);
                }
            }
            Event::Text(text) => expect_whitespace(&text, SUPPRESSION)?,
            Event::CData(_) => {
                return Err(malformed_error!(
                    "Unexpected character data inside '{}'",
                    SUPPRESSION
                ))
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(malformed_error!(
                    "Unexpected end of file inside '{}'",
                    SUPPRESSION
                ))
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>, element: &str) -> Result<String> {
    let mut value = String::new();

    loop {
        match reader.read_event().map_err(reader_error)? {
            Event::Text(text) => value.push_str(&text.unescape().map_err(reader_error)?),
            Event::CData(data) => {
                let data = data.into_inner();
                value.push_str(&String::from_utf8_lossy(&data));
            }
            Event::Start(_) | Event::Empty(_) => {
                return Err(malformed_error!("Unexpected element inside '{}'", element))
            }
            Event::End(_) => return Ok(value),
            Event::Eof => {
                return Err(malformed_error!("Unexpected end of file inside '{}'", element))
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }
}

fn expect_name(start: &BytesStart<'_>, expected: &str) -> Result<()> {
    if start.name().as_ref() == expected.as_bytes() {
        Ok(())
    } else {
        Err(malformed_error!(
            "Expected element '{}', found '{}'",
            expected,
            String::from_utf8_lossy(start.name().as_ref())
        ))
    }
}

fn expect_whitespace(text: &BytesText<'_>, location: &str) -> Result<()> {
    if text.iter().all(u8::is_ascii_whitespace) {
        Ok(())
    } else {
        Err(malformed_error!("Unexpected text inside '{}'", location))
    }
}

fn required_attribute(start: &BytesStart<'_>, name: &str) -> Result<String> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(reader_error)?;
        if attribute.key.as_ref() == name.as_bytes() {
            let value: Cow<'_, str> = attribute.unescape_value().map_err(reader_error)?;
            return Ok(value.into_owned());
        }
    }

    Err(malformed_error!(
        "Element '{}' is missing the required '{}' attribute",
        String::from_utf8_lossy(start.name().as_ref()),
        name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_layout() {
        let mut comparison = Comparison::new("v1/Lib.dll", "v2/Lib.dll");
        comparison.suppressions.push(Suppression::new(
            DifferenceType::Changed,
            "Tag",
            "Type 'A<T>' & \"B\"",
        ));
        let file = SuppressionFile {
            comparisons: vec![comparison],
        };

        let xml = write(&file).unwrap();
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
            "<ArCompatSuppressions>\n",
            "  <Comparison Left=\"v1/Lib.dll\" Right=\"v2/Lib.dll\">\n",
            "    <Suppression DifferenceType=\"Changed\">\n",
            "      <TypeName>Tag</TypeName>\n",
            "      <Message>Type 'A&lt;T&gt;' &amp; \"B\"</Message>\n",
            "    </Suppression>\n",
            "  </Comparison>\n",
            "</ArCompatSuppressions>\n",
        );
        assert_eq!(xml, expected);
        assert_eq!(read(&xml).unwrap(), file);
    }

    #[test]
    fn test_write_empty() {
        let xml = write(&SuppressionFile::new()).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<ArCompatSuppressions/>\n"
        );
        assert!(read(&xml).unwrap().comparisons.is_empty());
    }

    #[test]
    fn test_read_tolerates_comments_and_unknown_children() {
        let xml = r#"<?xml version="1.0"?>
<!-- reviewed -->
<ArCompatSuppressions>
  <Comparison Left="a" Right="b">
    <Suppression DifferenceType="Removed">
      <Note>ignored</Note>
      <TypeName>  spaced  </TypeName>
      <Message/>
    </Suppression>
    <Suppression DifferenceType="Added" />
  </Comparison>
</ArCompatSuppressions>"#;

        let file = read(xml).unwrap();
        let suppressions = &file.comparisons[0].suppressions;
        assert_eq!(suppressions.len(), 2);
        assert_eq!(suppressions[0].type_name.as_deref(), Some("  spaced  "));
        assert_eq!(suppressions[0].message.as_deref(), Some(""));
        assert_eq!(suppressions[1].difference_type, DifferenceType::Added);
        assert!(suppressions[1].type_name.is_none());
    }

    #[test]
    fn test_read_rejects_schema_violations() {
        let cases = [
            "",
            "<Other/>",
            "<ArCompatSuppressions><Comparison Left=\"a\"/></ArCompatSuppressions>",
            "<ArCompatSuppressions><Other/></ArCompatSuppressions>",
            "<ArCompatSuppressions><Comparison Left=\"a\" Right=\"b\"><Suppression/></Comparison></ArCompatSuppressions>",
            "<ArCompatSuppressions><Comparison Left=\"a\" Right=\"b\"><Suppression DifferenceType=\"Moved\"/></Comparison></ArCompatSuppressions>",
            "<ArCompatSuppressions>text</ArCompatSuppressions>",
            "<ArCompatSuppressions><Comparison Left=\"a\" Right=\"b\">",
        ];

        for case in cases {
            assert!(
                matches!(read(case), Err(Error::Malformed { .. })),
                "accepted: {case}"
            );
        }
    }
}
