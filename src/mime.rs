//! Content type detection.
//!
//! The extension table comes first. When it has nothing to say (an odd
//! extension, or none at all) the leading bytes of the file are sniffed,
//! following the signatures browsers use. Fonts are the usual reason: a
//! `.woff2` served with the wrong type is rejected by the browser.

/// How many leading bytes the sniffer looks at.
const SNIFF_LEN: usize = 512;

/// Detects the mime type of a file from its extension, falling back to its
/// content. `None` means neither approach recognised it.
pub(crate) fn detect(ext: Option<&str>, bytes: &[u8]) -> Option<&'static str> {
    ext.and_then(by_extension).or_else(|| sniff(bytes))
}

pub(crate) fn by_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",

        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        "json" => "application/json",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        _ => return None,
    };
    Some(mime)
}

/// Tags that mark a document as html when they open it.
const HTML_TAGS: &[&[u8]] = &[
    b"<!doctype html", b"<html", b"<head", b"<script", b"<iframe", b"<h1",
    b"<div", b"<font", b"<table", b"<a", b"<style", b"<title", b"<b",
    b"<body", b"<br", b"<p", b"<!--",
];

pub(crate) fn sniff(bytes: &[u8]) -> Option<&'static str> {
    let data = &bytes[..bytes.len().min(SNIFF_LEN)];

    let magic: &[(&[u8], &'static str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
        (b"wOFF", "font/woff"),
        (b"wOF2", "font/woff2"),
        (b"\x00\x01\x00\x00", "font/ttf"),
        (b"OTTO", "font/otf"),
        (b"ID3", "audio/mpeg"),
        (b"OggS", "audio/ogg"),
        (b"\x1a\x45\xdf\xa3", "video/webm"),
        (b"%PDF-", "application/pdf"),
    ];
    if let Some((_, mime)) = magic.iter().find(|(sig, _)| data.starts_with(sig)) {
        return Some(mime);
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") {
        match &data[8..12] {
            b"WEBP" => return Some("image/webp"),
            b"WAVE" => return Some("audio/wav"),
            _ => {}
        }
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some("video/mp4");
    }

    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let text = &data[start..];
    let is_html = HTML_TAGS.iter().any(|tag| {
        text.len() > tag.len()
            && text[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(text[tag.len()], b' ' | b'>')
    });
    is_html.then_some("text/html; charset=utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_wins_over_content() {
        assert_eq!(detect(Some("css"), b"<html>"), Some("text/css; charset=utf-8"));
        assert_eq!(detect(Some("JS"), b""), Some("text/javascript; charset=utf-8"));
    }

    #[test]
    fn falls_back_to_sniffing() {
        assert_eq!(detect(Some("weird"), b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(detect(None, b"wOF2\x00\x01"), Some("font/woff2"));
        assert_eq!(detect(None, b"  \n<!DOCTYPE html><p>hi</p>"), Some("text/html; charset=utf-8"));
        assert_eq!(detect(None, b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
    }

    #[test]
    fn unknown_content_is_none() {
        assert_eq!(detect(Some("bin"), b"\x00\x13\x37 nothing here"), None);
        assert_eq!(detect(None, b""), None);
        assert_eq!(sniff(b"<article>"), None);
    }
}
