//! テスト用の書類フィクスチャ

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const S_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

fn package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// 段落ごとに 1 行の .docx
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    docx_with_body(&body)
}

/// 本文 XML をそのまま指定した .docx
pub fn docx_with_body(body: &str) -> Vec<u8> {
    package(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
        ),
        (
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
                W_NS, body
            ),
        ),
    ])
}

/// word/document.xml の展開後サイズを zip64 拡張フィールドで 2^64 近くと偽った .docx
pub fn forged_size_docx(paragraph: &str) -> Vec<u8> {
    let body = format!(
        r#"<w:document xmlns:w="{}"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
        W_NS, paragraph
    );
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .large_file(true);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

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
    assert!(patched > 0);
    bytes
}

/// 1 シートの .xlsx（セルはすべてインライン文字列）
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let rows_xml: String = rows
        .iter()
        .map(|cells| {
            let cells_xml: String = cells
                .iter()
                .map(|c| format!(r#"<c t="inlineStr"><is><t>{}</t></is></c>"#, c))
                .collect();
            format!("<row>{}</row>", cells_xml)
        })
        .collect();

    package(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{}"><sheetData>{}</sheetData></worksheet>"#,
                S_NS, rows_xml
            ),
        ),
    ])
}

/// アーカイブ内の 1 エントリを読む
pub fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

/// 格納順にエントリ名を並べる
pub fn ordered_entry_names(archive: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// .docx 内の word/document.xml
pub fn document_xml(docx: &[u8]) -> String {
    String::from_utf8(read_entry(docx, "word/document.xml")).unwrap()
}
