//! テキスト抽出器 - 基盤層
//!
//! Word / Excel の中身をプレーンテキストとして取り出す能力だけを提供する。
//! 書類種別や検証ルールは知らない。

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{AppError, AppResult, ExtractionError};
use crate::models::ContainerFormat;

const DOCUMENT_PART: &str = "word/document.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

/// 1 パーツあたりの展開後サイズ上限
pub(crate) const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

/// テキスト抽出能力
pub trait TextExtractor {
    /// 全文を抽出する
    ///
    /// Word は段落ごとに改行区切り、Excel は全シートのテキストを連結する。
    fn extract_text(&self, bytes: &[u8], format: ContainerFormat) -> AppResult<String>;
}

/// OOXML (.docx / .xlsx) 用の抽出器
#[derive(Debug, Clone, Copy, Default)]
pub struct OoxmlTextExtractor;

impl OoxmlTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for OoxmlTextExtractor {
    fn extract_text(&self, bytes: &[u8], format: ContainerFormat) -> AppResult<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(ExtractionError::from)?;

        let text = match format {
            ContainerFormat::WordDocument => {
                let xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
                    ExtractionError::MissingPart {
                        part: DOCUMENT_PART.to_string(),
                    }
                })?;
                docx_text(&xml)?
            }
            ContainerFormat::Spreadsheet => xlsx_text(&mut archive)?,
            ContainerFormat::Pdf => {
                return Err(ExtractionError::UnsupportedFormat {
                    extension: ".pdf".to_string(),
                }
                .into())
            }
        };

        debug!("抽出完了: {:?} {} 文字", format, text.chars().count());
        Ok(text)
    }
}

/// zip 内のパーツを読む（存在しなければ None）
pub(crate) fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> AppResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let declared = file.size();
    read_bounded(&mut file, declared, name).map(Some)
}

/// パーツを上限付きで読む
///
/// ヘッダの申告サイズは改ざんされ得るので、確保量の根拠にはしない。
pub(crate) fn read_bounded<R: Read>(entry: R, declared_size: u64, name: &str) -> AppResult<Vec<u8>> {
    let too_large = || ExtractionError::PartTooLarge {
        part: name.to_string(),
        limit: MAX_PART_BYTES,
    };
    if declared_size > MAX_PART_BYTES {
        return Err(too_large().into());
    }

    let mut buf = Vec::new();
    entry
        .take(MAX_PART_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| AppError::malformed_xml(name, e))?;
    if buf.len() as u64 > MAX_PART_BYTES {
        return Err(too_large().into());
    }
    Ok(buf)
}

/// document.xml の段落テキストを改行で連結する
fn docx_text(xml: &[u8]) -> AppResult<String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?
        {
            Event::Eof => break,
            Event::Start(e) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
                current.push_str(&text);
            }
            _ => {}
        }
        buf.clear();
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

/// 全シートのテキストをシート番号順に連結する
fn xlsx_text<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> AppResult<String> {
    let shared = match read_part(archive, SHARED_STRINGS_PART)? {
        Some(xml) => shared_strings(&xml)?,
        None => Vec::new(),
    };

    let mut sheets: BTreeMap<u32, String> = BTreeMap::new();
    for name in archive.file_names() {
        if let Some(number) = sheet_number(name) {
            sheets.insert(number, name.to_string());
        }
    }

    if sheets.is_empty() {
        return Err(ExtractionError::MissingPart {
            part: format!("{}*.xml", WORKSHEET_PREFIX),
        }
        .into());
    }

    let mut full_text = String::new();
    for part in sheets.values() {
        if let Some(xml) = read_part(archive, part)? {
            full_text.push_str(&sheet_text(&xml, &shared, part)?);
            full_text.push('\n');
        }
    }
    Ok(full_text)
}

fn sheet_number(name: &str) -> Option<u32> {
    name.strip_prefix(WORKSHEET_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// 共有文字列表。ふりがな（rPh）は除外する。
fn shared_strings(xml: &[u8]) -> AppResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed_xml(SHARED_STRINGS_PART, e))?
        {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = phonetic_depth == 0,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::malformed_xml(SHARED_STRINGS_PART, e))?;
                current.push_str(&text);
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// セルの型
#[derive(Clone, Copy, PartialEq, Eq)]
enum CellType {
    Shared,
    Inline,
    Boolean,
    Plain,
}

/// 1 シート分: 行は改行、セルはタブ区切り
fn sheet_text(xml: &[u8], shared: &[String], part: &str) -> AppResult<String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut rows: Vec<String> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell_type = CellType::Plain;
    let mut value = String::new();
    let mut capture = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed_xml(part, e))?
        {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => {
                    value.clear();
                    cell_type = match e
                        .try_get_attribute("t")
                        .map_err(|err| AppError::malformed_xml(part, err))?
                    {
                        Some(attr) => match attr.value.as_ref() {
                            b"s" => CellType::Shared,
                            b"inlineStr" => CellType::Inline,
                            b"b" => CellType::Boolean,
                            _ => CellType::Plain,
                        },
                        None => CellType::Plain,
                    };
                }
                b"v" => capture = cell_type != CellType::Inline,
                b"t" => capture = cell_type == CellType::Inline,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    let text = resolve_cell(cell_type, &value, shared);
                    if !text.is_empty() {
                        cells.push(text);
                    }
                }
                b"row" => rows.push(std::mem::take(&mut cells).join("\t")),
                _ => {}
            },
            Event::Text(t) if capture => {
                let text = t.unescape().map_err(|e| AppError::malformed_xml(part, e))?;
                value.push_str(&text);
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(rows.join("\n"))
}

fn resolve_cell(cell_type: CellType, raw: &str, shared: &[String]) -> String {
    match cell_type {
        CellType::Shared => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .cloned()
            .unwrap_or_default(),
        CellType::Boolean => match raw.trim() {
            "1" => "TRUE".to_string(),
            "0" => "FALSE".to_string(),
            other => other.to_string(),
        },
        CellType::Inline | CellType::Plain => raw.to_string(),
    }
}

/// zip64 拡張フィールドの展開後サイズを 2^64 近くに書き換えた .docx
#[cfg(test)]
pub(crate) fn forged_zip64_docx(body: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .large_file(true);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // ローカルヘッダと中央ディレクトリの両方にある zip64 フィールド (ID 0x0001)
    let real_size = (body.len() as u64).to_le_bytes();
    let forged = 0xFFFF_FFFF_FFFF_FF00u64.to_le_bytes();
    let mut patched = 0;
    let mut i = 0;
    while i + 12 <= bytes.len() {
        if bytes[i..i + 2] == [0x01, 0x00] && bytes[i + 4..i + 12] == real_size {
            bytes[i + 4..i + 12].copy_from_slice(&forged);
            patched += 1;
            i += 12;
        } else {
            i += 1;
        }
    }
    assert!(patched > 0, "zip64 フィールドが見つかりません");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_joined_by_newline() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>第1条</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">目的 &amp; 範囲</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>別紙２</w:t></w:r></w:p>
</w:body></w:document>"#;
        let bytes = package(&[("word/document.xml", xml)]);

        let text = OoxmlTextExtractor::new()
            .extract_text(&bytes, ContainerFormat::WordDocument)
            .unwrap();

        assert_eq!(text, "第1条\t目的 & 範囲\n\n別紙２");
    }

    #[test]
    fn test_docx_without_document_part_fails() {
        let bytes = package(&[("word/styles.xml", "<w:styles/>")]);
        let err = OoxmlTextExtractor::new()
            .extract_text(&bytes, ContainerFormat::WordDocument)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::MissingPart { .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = OoxmlTextExtractor::new()
            .extract_text(b"not a zip", ContainerFormat::Spreadsheet)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::UnreadableContainer { .. })
        ));
    }

    #[test]
    fn test_xlsx_resolves_shared_and_inline_strings() {
        let shared = r#"<sst><si><t>会社名</t></si><si><r><t>株式会社</t></r><r><t>テスト</t></r><rPh><t>カブシキガイシャ</t></rPh></si></sst>"#;
        let sheet1 = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2"><v>1200</v></c><c r="B2" t="inlineStr"><is><t>チェック</t></is></c></row>
</sheetData></worksheet>"#;
        let sheet2 = r#"<worksheet><sheetData><row r="1"><c r="A1" t="b"><v>1</v></c></row></sheetData></worksheet>"#;
        let bytes = package(&[
            ("xl/sharedStrings.xml", shared),
            ("xl/worksheets/sheet2.xml", sheet2),
            ("xl/worksheets/sheet1.xml", sheet1),
        ]);

        let text = OoxmlTextExtractor::new()
            .extract_text(&bytes, ContainerFormat::Spreadsheet)
            .unwrap();

        assert_eq!(text, "会社名\t株式会社テスト\n1200\tチェック\nTRUE\n");
    }

    #[test]
    fn test_forged_zip64_size_is_extraction_error() {
        let body = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>本文</w:t></w:r></w:p></w:body></w:document>"#;
        let bytes = forged_zip64_docx(body);

        let err = OoxmlTextExtractor::new()
            .extract_text(&bytes, ContainerFormat::WordDocument)
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_read_bounded_rejects_oversized_part() {
        let err = read_bounded(&b"abc"[..], MAX_PART_BYTES + 1, "word/document.xml").unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::PartTooLarge { .. })
        ));

        let data = read_bounded(&b"abc"[..], 3, "word/document.xml").unwrap();
        assert_eq!(data, b"abc");
    }

    #[test]
    fn test_sheet_number_parsing() {
        assert_eq!(sheet_number("xl/worksheets/sheet12.xml"), Some(12));
        assert_eq!(sheet_number("xl/worksheets/_rels/sheet1.xml.rels"), None);
    }
}
