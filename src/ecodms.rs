//! EcoDMS export model and XML parser.
//!
//! Deserializes the export document tree into a typed in-memory model.
//! Parsing is purely structural: required attributes must be present
//! (their absence is a [`MigrationError::MalformedSource`] that aborts the
//! whole run), while missing optional text elements yield `None`. An element
//! that is present but empty yields `Some("")`: the distinction matters for
//! the empty-name guard in the resolver. Text is kept verbatim; XML entities
//! are unescaped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::MigrationError;

/// The parsed export: root attributes plus documents in order of appearance.
#[derive(Debug, Clone)]
pub struct Export {
    pub user: String,
    pub start_id: String,
    pub end_id: String,
    pub documents: Vec<SourceDocument>,
}

/// One `<document>` element.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub docid: String,
    pub files: Vec<SourceFile>,
    pub classifications: Vec<ClassificationRecord>,
}

/// One `<files>` element: a binary file referenced by the export.
///
/// `file_path` is relative to the directory containing the export file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: String,
    pub orig_name: String,
    pub file_path: String,
}

/// One `<classifyInfo>` element with its ordered `<Version>` children.
#[derive(Debug, Clone)]
pub struct ClassificationRecord {
    pub catalog_id: String,
    pub revision_count: String,
    pub trashed: bool,
    pub versions: Vec<SourceVersion>,
}

/// One `<Version>` element: sixteen optional descriptive fields.
///
/// Only a handful are mapped to destination metadata; the rest pass through
/// as opaque optional strings. The export format permits absence for every
/// field, so none of them may be assumed present.
#[derive(Debug, Clone, Default)]
pub struct SourceVersion {
    /// `<ordner>`: folder name.
    pub folder: Option<String>,
    /// `<hauptordner>`: parent-folder name.
    pub parent_folder: Option<String>,
    /// `<bemerkung>`: free-text note, used as the destination title.
    pub note: Option<String>,
    /// `<status>`: workflow status.
    pub status: Option<String>,
    /// `<revision>`: revision label.
    pub revision: Option<String>,
    /// `<dokumentenart>`: document-kind label.
    pub document_kind: Option<String>,
    /// `<letzte-änderung>`: last-modification stamp.
    pub last_modified: Option<String>,
    /// `<datum>`: creation date.
    pub created: Option<String>,
    /// `<bearbeitet-von>`: assigned editor.
    pub edited_by: Option<String>,
    /// `<zurückgestellt-bis>`: deferred-until date.
    pub deferred_until: Option<String>,
    /// `<zu-bearbeiten>`: to-be-processed flag.
    pub to_process: Option<String>,
    /// `<zur-ansicht>`: to-be-reviewed flag.
    pub to_review: Option<String>,
    /// `<typ>`: type code.
    pub type_code: Option<String>,
    /// `<laufende-nummer>`: running/serial number, possibly the literal
    /// string "null".
    pub running_number: Option<String>,
    /// `<steuerrelevant>`: tax-relevance code.
    pub tax_code: Option<String>,
    /// `<ordner-extkey>`: external folder key.
    pub folder_ext_key: Option<String>,
}

/// Parse a complete export document.
pub fn parse_export(xml: &str) -> Result<Export, MigrationError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    loop {
        match read(&mut reader, &mut buf)? {
            Event::Start(e) => return parse_root(&mut reader, &e),
            Event::Empty(e) => {
                return Ok(Export {
                    user: required_attr(&e, "user", "export root")?,
                    start_id: required_attr(&e, "startid", "export root")?,
                    end_id: required_attr(&e, "endid", "export root")?,
                    documents: Vec::new(),
                });
            }
            Event::Eof => {
                return Err(MigrationError::MalformedSource(
                    "export has no root element".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

fn parse_root(reader: &mut Reader<&[u8]>, root: &BytesStart) -> Result<Export, MigrationError> {
    let user = required_attr(root, "user", "export root")?;
    let start_id = required_attr(root, "startid", "export root")?;
    let end_id = required_attr(root, "endid", "export root")?;

    let mut documents = Vec::new();
    let mut buf = Vec::new();
    loop {
        match read(reader, &mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"document" => {
                documents.push(parse_document(reader, &e)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"document" => {
                documents.push(SourceDocument {
                    docid: required_attr(&e, "docid", "document")?,
                    files: Vec::new(),
                    classifications: Vec::new(),
                });
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(MigrationError::MalformedSource(
                    "unexpected end of export before the root element closed".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(Export {
        user,
        start_id,
        end_id,
        documents,
    })
}

fn parse_document(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
) -> Result<SourceDocument, MigrationError> {
    let docid = required_attr(start, "docid", "document")?;
    let mut files = Vec::new();
    let mut classifications = Vec::new();

    let mut buf = Vec::new();
    loop {
        match read(reader, &mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"files" => files.push(parse_file(&e)?),
                b"classifyInfo" => classifications.push(parse_classify_info(reader, &e)?),
                // <classifyInfos> is only a container; its children are
                // handled above, its end tag below.
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"files" => files.push(parse_file(&e)?),
                b"classifyInfo" => classifications.push(classification_header(&e)?),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"document" => break,
            Event::Eof => {
                return Err(MigrationError::MalformedSource(format!(
                    "unexpected end of export inside <document docid=\"{}\">",
                    docid
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(SourceDocument {
        docid,
        files,
        classifications,
    })
}

fn parse_file(e: &BytesStart) -> Result<SourceFile, MigrationError> {
    Ok(SourceFile {
        id: required_attr(e, "id", "files")?,
        orig_name: required_attr(e, "origname", "files")?,
        file_path: required_attr(e, "filePath", "files")?,
    })
}

fn classification_header(e: &BytesStart) -> Result<ClassificationRecord, MigrationError> {
    // Only the exact literal "true" marks a record as trashed; "false",
    // "TRUE", or anything else does not.
    let trashed = required_attr(e, "trashed", "classifyInfo")? == "true";
    Ok(ClassificationRecord {
        catalog_id: required_attr(e, "cla_docs_id", "classifyInfo")?,
        revision_count: required_attr(e, "revision_count", "classifyInfo")?,
        trashed,
        versions: Vec::new(),
    })
}

fn parse_classify_info(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
) -> Result<ClassificationRecord, MigrationError> {
    let mut record = classification_header(start)?;

    let mut buf = Vec::new();
    loop {
        match read(reader, &mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"Version" => {
                record.versions.push(parse_version(reader)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"Version" => {
                record.versions.push(SourceVersion::default());
            }
            Event::End(e) if e.local_name().as_ref() == b"classifyInfo" => break,
            Event::Eof => {
                return Err(MigrationError::MalformedSource(
                    "unexpected end of export inside <classifyInfo>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(record)
}

fn parse_version(reader: &mut Reader<&[u8]>) -> Result<SourceVersion, MigrationError> {
    let mut version = SourceVersion::default();
    let mut field: Option<String> = None;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match read(reader, &mut buf)? {
            Event::Start(e) => {
                field = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();
            }
            Event::Empty(e) => {
                set_field(
                    &mut version,
                    &String::from_utf8_lossy(e.local_name().as_ref()),
                    String::new(),
                );
            }
            Event::Text(t) if field.is_some() => {
                let unescaped = t
                    .unescape()
                    .map_err(|err| MigrationError::MalformedSource(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"Version" {
                    break;
                }
                if let Some(name) = field.take() {
                    if e.local_name().as_ref() == name.as_bytes() {
                        set_field(&mut version, &name, std::mem::take(&mut text));
                    }
                }
            }
            Event::Eof => {
                return Err(MigrationError::MalformedSource(
                    "unexpected end of export inside <Version>".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(version)
}

fn set_field(version: &mut SourceVersion, name: &str, value: String) {
    let slot = match name {
        "ordner" => &mut version.folder,
        "hauptordner" => &mut version.parent_folder,
        "bemerkung" => &mut version.note,
        "status" => &mut version.status,
        "revision" => &mut version.revision,
        "dokumentenart" => &mut version.document_kind,
        "letzte-änderung" => &mut version.last_modified,
        "datum" => &mut version.created,
        "bearbeitet-von" => &mut version.edited_by,
        "zurückgestellt-bis" => &mut version.deferred_until,
        "zu-bearbeiten" => &mut version.to_process,
        "zur-ansicht" => &mut version.to_review,
        "typ" => &mut version.type_code,
        "laufende-nummer" => &mut version.running_number,
        "steuerrelevant" => &mut version.tax_code,
        "ordner-extkey" => &mut version.folder_ext_key,
        _ => return,
    };
    *slot = Some(value);
}

fn required_attr(e: &BytesStart, name: &str, element: &str) -> Result<String, MigrationError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MigrationError::MalformedSource(err.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| MigrationError::MalformedSource(err.to_string()))?;
            return Ok(value.into_owned());
        }
    }
    Err(MigrationError::MalformedSource(format!(
        "<{}> is missing required attribute '{}'",
        element, name
    )))
}

fn read<'b>(
    reader: &mut Reader<&[u8]>,
    buf: &'b mut Vec<u8>,
) -> Result<Event<'b>, MigrationError> {
    reader
        .read_event_into(buf)
        .map_err(|err| MigrationError::MalformedSource(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<documents user="archiv" startid="1" endid="1">
  <document docid="1">
    <files id="10" origname="a.pdf" filePath="data/a.pdf"/>
    <classifyInfos>
      <classifyInfo cla_docs_id="7" revision_count="1" trashed="false">
        <Version/>
      </classifyInfo>
    </classifyInfos>
  </document>
</documents>"#;

    #[test]
    fn minimal_export_parses_with_all_fields_absent() {
        let export = parse_export(MINIMAL).unwrap();
        assert_eq!(export.user, "archiv");
        assert_eq!(export.start_id, "1");
        assert_eq!(export.end_id, "1");
        assert_eq!(export.documents.len(), 1);

        let doc = &export.documents[0];
        assert_eq!(doc.docid, "1");
        assert_eq!(doc.files[0].orig_name, "a.pdf");
        assert_eq!(doc.files[0].file_path, "data/a.pdf");

        let record = &doc.classifications[0];
        assert_eq!(record.catalog_id, "7");
        assert!(!record.trashed);

        let version = &record.versions[0];
        assert_eq!(version.folder, None);
        assert_eq!(version.parent_folder, None);
        assert_eq!(version.note, None);
        assert_eq!(version.status, None);
        assert_eq!(version.last_modified, None);
        assert_eq!(version.deferred_until, None);
        assert_eq!(version.running_number, None);
        assert_eq!(version.tax_code, None);
        assert_eq!(version.folder_ext_key, None);
    }

    #[test]
    fn version_fields_are_captured_verbatim() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="5">
    <files id="1" origname="b.pdf" filePath="b.pdf"/>
    <classifyInfos>
      <classifyInfo cla_docs_id="2" revision_count="3" trashed="false">
        <Version>
          <ordner>2019</ordner>
          <hauptordner>Invoices</hauptordner>
          <bemerkung>Invoice 42 &amp; attachments</bemerkung>
          <letzte-änderung>2019-05-04 12:00</letzte-änderung>
          <datum>2019-05-04</datum>
          <zurückgestellt-bis>2020-01-01</zurückgestellt-bis>
          <laufende-nummer>7.0</laufende-nummer>
          <steuerrelevant>0</steuerrelevant>
        </Version>
      </classifyInfo>
    </classifyInfos>
  </document>
</documents>"#;

        let export = parse_export(xml).unwrap();
        let version = &export.documents[0].classifications[0].versions[0];
        assert_eq!(version.folder.as_deref(), Some("2019"));
        assert_eq!(version.parent_folder.as_deref(), Some("Invoices"));
        assert_eq!(version.note.as_deref(), Some("Invoice 42 & attachments"));
        assert_eq!(version.last_modified.as_deref(), Some("2019-05-04 12:00"));
        assert_eq!(version.created.as_deref(), Some("2019-05-04"));
        assert_eq!(version.deferred_until.as_deref(), Some("2020-01-01"));
        assert_eq!(version.running_number.as_deref(), Some("7.0"));
        assert_eq!(version.tax_code.as_deref(), Some("0"));
    }

    #[test]
    fn empty_element_is_present_but_empty() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="1">
    <classifyInfos>
      <classifyInfo cla_docs_id="2" revision_count="1" trashed="false">
        <Version>
          <bemerkung/>
          <ordner></ordner>
        </Version>
      </classifyInfo>
    </classifyInfos>
  </document>
</documents>"#;

        let export = parse_export(xml).unwrap();
        let version = &export.documents[0].classifications[0].versions[0];
        assert_eq!(version.note.as_deref(), Some(""));
        assert_eq!(version.folder.as_deref(), Some(""));
        assert_eq!(version.parent_folder, None);
    }

    #[test]
    fn trashed_is_the_literal_string_true() {
        let xml = |trashed: &str| {
            format!(
                r#"<documents user="u" startid="1" endid="1">
  <document docid="1">
    <classifyInfos>
      <classifyInfo cla_docs_id="2" revision_count="1" trashed="{}"><Version/></classifyInfo>
    </classifyInfos>
  </document>
</documents>"#,
                trashed
            )
        };

        for (value, expected) in [("true", true), ("false", false), ("TRUE", false), ("1", false)]
        {
            let export = parse_export(&xml(value)).unwrap();
            assert_eq!(
                export.documents[0].classifications[0].trashed, expected,
                "trashed=\"{}\"",
                value
            );
        }
    }

    #[test]
    fn version_order_is_order_of_appearance() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="1">
    <classifyInfos>
      <classifyInfo cla_docs_id="2" revision_count="2" trashed="false">
        <Version><revision>first</revision></Version>
        <Version><revision>second</revision></Version>
      </classifyInfo>
    </classifyInfos>
  </document>
</documents>"#;

        let export = parse_export(xml).unwrap();
        let versions = &export.documents[0].classifications[0].versions;
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].revision.as_deref(), Some("first"));
        assert_eq!(versions[1].revision.as_deref(), Some("second"));
    }

    #[test]
    fn unknown_version_fields_are_ignored() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="1">
    <classifyInfos>
      <classifyInfo cla_docs_id="2" revision_count="1" trashed="false">
        <Version>
          <unbekannt>whatever</unbekannt>
          <ordner>A</ordner>
        </Version>
      </classifyInfo>
    </classifyInfos>
  </document>
</documents>"#;

        let export = parse_export(xml).unwrap();
        let version = &export.documents[0].classifications[0].versions[0];
        assert_eq!(version.folder.as_deref(), Some("A"));
    }

    #[test]
    fn missing_docid_is_a_malformed_source_error() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document><classifyInfos/></document>
</documents>"#;

        let err = parse_export(xml).unwrap_err();
        assert!(matches!(err, MigrationError::MalformedSource(_)));
        assert!(err.to_string().contains("docid"));
    }

    #[test]
    fn missing_file_attribute_is_a_malformed_source_error() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="1">
    <files id="10" origname="a.pdf"/>
  </document>
</documents>"#;

        let err = parse_export(xml).unwrap_err();
        assert!(matches!(err, MigrationError::MalformedSource(_)));
        assert!(err.to_string().contains("filePath"));
    }

    #[test]
    fn missing_root_attribute_is_a_malformed_source_error() {
        let err = parse_export(r#"<documents user="u" startid="1"/>"#).unwrap_err();
        assert!(matches!(err, MigrationError::MalformedSource(_)));
        assert!(err.to_string().contains("endid"));
    }

    #[test]
    fn empty_input_is_a_malformed_source_error() {
        let err = parse_export("").unwrap_err();
        assert!(matches!(err, MigrationError::MalformedSource(_)));
    }

    #[test]
    fn document_without_classifications_parses() {
        let xml = r#"<documents user="u" startid="1" endid="1">
  <document docid="9">
    <files id="1" origname="c.pdf" filePath="c.pdf"/>
  </document>
</documents>"#;

        let export = parse_export(xml).unwrap();
        assert!(export.documents[0].classifications.is_empty());
    }
}
