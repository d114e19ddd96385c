//! Word 文書の整形 - 基盤層
//!
//! 本文 XML をイベント単位で読み、注釈と強調書式を部分木ごと落として書き戻す。
//! 表セルや段落の網掛けなど他の構造はそのまま残る。
//! 段落単位の編集（段落を空にする・文字列置換）は呼び出し側が [`DocxEdits`] で指定する。

use quick_xml::events::{BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use regex::{NoExpand, Regex};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{AppError, AppResult, ArchiveError, ExtractionError};
use crate::infrastructure::text_extractor::read_bounded;

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// 段落単位の編集指示
#[derive(Debug, Clone, Default)]
pub struct DocxEdits {
    /// この文言を含む段落は中身を空にする（段落書式は残す）
    pub clear_paragraphs_containing: Option<String>,
    /// 最初に書き換えが起きた段落だけ置換する
    pub replace_first: Option<TextReplacement>,
}

/// ラン単位の文字列置換
#[derive(Debug, Clone)]
pub struct TextReplacement {
    pub patterns: Vec<Regex>,
    pub replacement: String,
}

impl TextReplacement {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    fn apply(&self, text: &str) -> Option<String> {
        if !self.matches(text) {
            return None;
        }
        let mut out = text.to_string();
        for pattern in &self.patterns {
            out = pattern
                .replace_all(&out, NoExpand(&self.replacement))
                .into_owned();
        }
        Some(out)
    }
}

/// 整形結果
#[derive(Debug, Default)]
pub struct SanitizedDocx {
    pub bytes: Vec<u8>,
    /// 削除した注釈・書式要素の数
    pub removed_elements: usize,
    pub cleared_paragraphs: usize,
    /// 置換した段落の置換前テキスト
    pub replaced_paragraph: Option<String>,
    pub removed_parts: Vec<String>,
}

/// .docx を整形した新しい .docx を返す
///
/// - 本文: 蛍光ペン・文字網掛け・太字・文字色・コメント範囲を削除し、`edits` を適用
/// - `word/comments*.xml` と、それを指すリレーションシップ・コンテンツタイプを削除
/// - その他のパーツは順序・内容とも元のまま
pub fn sanitize_docx(docx: &[u8], edits: &DocxEdits) -> AppResult<SanitizedDocx> {
    let mut archive = ZipArchive::new(Cursor::new(docx)).map_err(ExtractionError::from)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut result = SanitizedDocx::default();
    let mut found_document = false;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(ExtractionError::from)?;
        let name = file.name().to_string();
        let options = SimpleFileOptions::default().compression_method(file.compression());

        if file.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| entry_failed(&name, e))?;
            continue;
        }

        if is_comments_part(&name) {
            result.removed_parts.push(name);
            continue;
        }

        let declared = file.size();
        let mut content = read_bounded(&mut file, declared, &name)?;

        match name.as_str() {
            DOCUMENT_PART => {
                let rewrite = rewrite_document(&content, edits)?;
                debug!(
                    "本文整形: 要素削除 {} / 段落消去 {}",
                    rewrite.removed, rewrite.cleared
                );
                result.removed_elements = rewrite.removed;
                result.cleared_paragraphs = rewrite.cleared;
                result.replaced_paragraph = rewrite.replaced;
                content = rewrite.xml;
                found_document = true;
            }
            DOCUMENT_RELS_PART => {
                content = drop_elements(&content, &name, b"Relationship", "Target", |target| {
                    is_comments_file(target)
                })?;
            }
            CONTENT_TYPES_PART => {
                content = drop_elements(&content, &name, b"Override", "PartName", |part| {
                    is_comments_part(part.trim_start_matches('/'))
                })?;
            }
            _ => {}
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| entry_failed(&name, e))?;
        writer
            .write_all(&content)
            .map_err(|e| entry_failed(&name, e))?;
    }

    if !found_document {
        return Err(ExtractionError::MissingPart {
            part: DOCUMENT_PART.to_string(),
        }
        .into());
    }

    let cursor = writer
        .finish()
        .map_err(|source| ArchiveError::FinishFailed { source })?;
    result.bytes = cursor.into_inner();
    Ok(result)
}

fn entry_failed(path: &str, err: impl std::fmt::Display) -> AppError {
    ArchiveError::EntryWriteFailed {
        path: path.to_string(),
        message: err.to_string(),
    }
    .into()
}

/// word/comments.xml, word/commentsExtended.xml など
fn is_comments_part(name: &str) -> bool {
    name.strip_prefix("word/")
        .is_some_and(|rest| !rest.contains('/') && is_comments_file(rest))
}

fn is_comments_file(target: &str) -> bool {
    let file = target.rsplit('/').next().unwrap_or(target);
    file.starts_with("comments") && file.ends_with(".xml")
}

/// 除去対象か（shd・太字・文字色は文字書式 rPr 内のものだけ）
fn is_dropped(local_name: &[u8], in_run_props: bool) -> bool {
    matches!(
        local_name,
        b"highlight" | b"commentRangeStart" | b"commentRangeEnd" | b"commentReference"
    ) || (in_run_props && matches!(local_name, b"shd" | b"b" | b"bCs" | b"color"))
}

struct DocumentRewrite {
    xml: Vec<u8>,
    removed: usize,
    cleared: usize,
    replaced: Option<String>,
}

/// document.xml を変換する
///
/// 段落（最外の `w:p`）は閉じるまでイベントを溜め、段落テキストを見てから書き出す。
fn rewrite_document(xml: &[u8], edits: &DocxEdits) -> AppResult<DocumentRewrite> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    // 削除中の部分木の深さ
    let mut skip_depth = 0usize;
    let mut run_props_depth = 0usize;
    let mut removed = 0usize;

    let mut paragraph_depth = 0usize;
    let mut pending: Vec<Event<'static>> = Vec::new();
    let mut paragraph_text = String::new();
    let mut in_text = false;
    let mut cleared = 0usize;
    let mut replaced: Option<String> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;

        let keep = match &event {
            Event::Eof => break,
            Event::Start(e) => {
                let local = e.local_name();
                if skip_depth > 0 {
                    skip_depth += 1;
                    false
                } else if is_dropped(local.as_ref(), run_props_depth > 0) {
                    skip_depth = 1;
                    removed += 1;
                    false
                } else {
                    if local.as_ref() == b"rPr" {
                        run_props_depth += 1;
                    }
                    true
                }
            }
            Event::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    false
                } else {
                    if e.local_name().as_ref() == b"rPr" {
                        run_props_depth = run_props_depth.saturating_sub(1);
                    }
                    true
                }
            }
            Event::Empty(e) => {
                if skip_depth > 0 {
                    false
                } else if is_dropped(e.local_name().as_ref(), run_props_depth > 0) {
                    removed += 1;
                    false
                } else {
                    true
                }
            }
            _ => skip_depth == 0,
        };

        if !keep {
            buf.clear();
            continue;
        }

        let opens_paragraph = matches!(&event, Event::Start(e) if e.local_name().as_ref() == b"p");
        let closes_paragraph = matches!(&event, Event::End(e) if e.local_name().as_ref() == b"p");
        if opens_paragraph {
            paragraph_depth += 1;
        }

        if paragraph_depth == 0 {
            writer
                .write_event(event)
                .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
        } else {
            match &event {
                Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
                Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
                Event::Text(t) if in_text => {
                    let text = t
                        .unescape()
                        .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
                    paragraph_text.push_str(&text);
                }
                _ => {}
            }
            pending.push(event.into_owned());

            if closes_paragraph {
                paragraph_depth -= 1;
                if paragraph_depth == 0 {
                    let events = std::mem::take(&mut pending);
                    let text = std::mem::take(&mut paragraph_text);
                    let events = edit_paragraph(events, &text, edits, &mut cleared, &mut replaced)?;
                    for event in events {
                        writer
                            .write_event(event)
                            .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
                    }
                }
            }
        }
        buf.clear();
    }

    // 閉じていない段落はそのまま書き戻す
    for event in pending {
        writer
            .write_event(event)
            .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
    }

    Ok(DocumentRewrite {
        xml: writer.into_inner().into_inner(),
        removed,
        cleared,
        replaced,
    })
}

fn edit_paragraph(
    events: Vec<Event<'static>>,
    text: &str,
    edits: &DocxEdits,
    cleared: &mut usize,
    replaced: &mut Option<String>,
) -> AppResult<Vec<Event<'static>>> {
    if let Some(needle) = edits.clear_paragraphs_containing.as_deref() {
        if !needle.is_empty() && text.contains(needle) {
            *cleared += 1;
            return Ok(paragraph_shell(events));
        }
    }

    if let Some(replacement) = &edits.replace_first {
        if replaced.is_none() && replacement.matches(text) {
            let (events, changed) = replace_in_runs(events, replacement)?;
            if changed {
                *replaced = Some(text.trim().to_string());
            }
            return Ok(events);
        }
    }

    Ok(events)
}

/// 段落の開始・終了タグと段落書式 (pPr) だけを残す
fn paragraph_shell(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let last = events.len().saturating_sub(1);
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_props = false;

    for (i, event) in events.into_iter().enumerate() {
        if i == 0 || i == last {
            out.push(event);
            continue;
        }
        match &event {
            Event::Start(e) => {
                if depth == 0 {
                    in_props = e.local_name().as_ref() == b"pPr";
                }
                depth += 1;
                if in_props {
                    out.push(event);
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                let keep = in_props;
                if depth == 0 {
                    in_props = false;
                }
                if keep {
                    out.push(event);
                }
            }
            Event::Empty(e) if depth == 0 => {
                if e.local_name().as_ref() == b"pPr" {
                    out.push(event);
                }
            }
            _ => {
                if in_props {
                    out.push(event);
                }
            }
        }
    }
    out
}

/// 各 `w:t` の中身に置換を適用する（ランをまたぐ一致は対象外）
fn replace_in_runs(
    events: Vec<Event<'static>>,
    replacement: &TextReplacement,
) -> AppResult<(Vec<Event<'static>>, bool)> {
    let mut out = Vec::with_capacity(events.len());
    let mut in_text = false;
    let mut changed = false;

    for event in events {
        match &event {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::malformed_xml(DOCUMENT_PART, e))?;
                if let Some(new_text) = replacement.apply(&text) {
                    changed = true;
                    out.push(Event::Text(BytesText::new(&new_text).into_owned()));
                    continue;
                }
            }
            _ => {}
        }
        out.push(event);
    }
    Ok((out, changed))
}

/// 条件に合う属性を持つ要素を部分木ごと削除する
fn drop_elements(
    xml: &[u8],
    part: &str,
    element: &[u8],
    attribute: &str,
    matches: impl Fn(&str) -> bool,
) -> AppResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut skip_depth = 0usize;

    let targeted = |e: &quick_xml::events::BytesStart| -> AppResult<bool> {
        if e.local_name().as_ref() != element {
            return Ok(false);
        }
        let value = e
            .try_get_attribute(attribute)
            .map_err(|err| AppError::malformed_xml(part, err))?;
        match value {
            Some(attr) => {
                let value = attr
                    .unescape_value()
                    .map_err(|err| AppError::malformed_xml(part, err))?;
                Ok(matches(&value))
            }
            None => Ok(false),
        }
    };

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed_xml(part, e))?;

        let keep = match &event {
            Event::Eof => break,
            Event::Start(e) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    false
                } else if targeted(e)? {
                    skip_depth = 1;
                    false
                } else {
                    true
                }
            }
            Event::End(_) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    false
                } else {
                    true
                }
            }
            Event::Empty(e) => skip_depth == 0 && !targeted(e)?,
            _ => skip_depth == 0,
        };

        if keep {
            writer
                .write_event(event)
                .map_err(|e| AppError::malformed_xml(part, e))?;
        }
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}
